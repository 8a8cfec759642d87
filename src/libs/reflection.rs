use crate::libs::error::{AppError, Result};
use crate::libs::messages::Message;
use crate::libs::task::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    pub id: String,
    pub task_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReflection {
    pub task_id: String,
    pub content: String,
}

impl NewReflection {
    pub fn new(task_id: &str, content: &str) -> Self {
        NewReflection {
            task_id: task_id.to_string(),
            content: content.to_string(),
        }
    }
}

/// A task joined with its reflection, if it has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithReflection {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<Reflection>,
}

impl TaskWithReflection {
    pub fn new(task: Task, reflection: Option<Reflection>) -> Self {
        TaskWithReflection { task, reflection }
    }
}

pub fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(AppError::validation(Message::ReflectionContentRequired));
    }
    Ok(())
}
