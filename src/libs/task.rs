//! Task records and their create input.
//!
//! [`Task`] is the stored shape. It serializes with camelCase field names and
//! ISO-8601 dates, which is also the shape of the `tasks` array in a JSON
//! backup. [`NewTask`] carries everything a caller chooses when creating a
//! task; the repository assigns the id and both timestamps.

use crate::libs::error::AppError;
use crate::libs::formatter::truncate_millis;
use crate::libs::messages::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Important,
    Urgent,
    Trivial,
}

impl Priority {
    /// Group order used by day queries.
    pub const ALL: [Priority; 3] = [Priority::Important, Priority::Urgent, Priority::Trivial];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Important => "important",
            Priority::Urgent => "urgent",
            Priority::Trivial => "trivial",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "important" => Ok(Priority::Important),
            "urgent" => Ok(Priority::Urgent),
            "trivial" => Ok(Priority::Trivial),
            _ => Err(AppError::validation(Message::InvalidPriority(s.to_string()))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl SubTask {
    pub fn new(title: &str) -> Self {
        SubTask {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
    pub due_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub archived: bool,
}

impl Task {
    /// Restores `completed_at` iff `completed`, stamping `at` when a completed
    /// task has no completion time.
    pub fn normalize_completion(&mut self, at: DateTime<Utc>) {
        if self.completed {
            if self.completed_at.is_none() {
                self.completed_at = Some(at);
            }
        } else {
            self.completed_at = None;
        }
    }

    /// Cuts every timestamp down to whole milliseconds, so the record equals
    /// what a later read returns.
    pub fn truncate_timestamps(&mut self) {
        self.due_date = truncate_millis(self.due_date);
        self.reminder_time = self.reminder_time.map(truncate_millis);
        self.completed_at = self.completed_at.map(truncate_millis);
        self.created_at = truncate_millis(self.created_at);
        self.updated_at = truncate_millis(self.updated_at);
    }

    pub fn has_pending_reminder(&self) -> bool {
        self.reminder_time.is_some() && !self.completed
    }

    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        (done, self.subtasks.len())
    }
}

/// Create input for [`Tasks::create`](crate::db::tasks::Tasks::create).
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub subtasks: Vec<SubTask>,
    pub due_date: DateTime<Utc>,
    pub reminder_time: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub order: i64,
    pub archived: bool,
}

impl NewTask {
    pub fn new(title: &str, priority: Priority, due_date: DateTime<Utc>) -> Self {
        NewTask {
            title: title.to_string(),
            description: None,
            priority,
            tags: Vec::new(),
            subtasks: Vec::new(),
            due_date,
            reminder_time: None,
            completed: false,
            completed_at: None,
            order: 0,
            archived: false,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn subtasks(mut self, subtasks: Vec<SubTask>) -> Self {
        self.subtasks = subtasks;
        self
    }

    pub fn reminder(mut self, at: DateTime<Utc>) -> Self {
        self.reminder_time = Some(at);
        self
    }

    pub fn order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed = true;
        self.completed_at = Some(at);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }
}

/// One entry of a reorder batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOrder {
    pub id: String,
    pub order: i64,
}

impl TaskOrder {
    pub fn new(id: &str, order: i64) -> Self {
        TaskOrder { id: id.to_string(), order }
    }
}

/// Trims tags, drops empty ones and removes duplicates keeping the first
/// occurrence.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Splits a comma separated CLI tag list.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    normalize_tags(&input.split(',').map(str::to_string).collect::<Vec<_>>())
}

pub fn validate_title(title: &str) -> crate::libs::error::Result<()> {
    if title.trim().is_empty() {
        return Err(AppError::validation(Message::TaskTitleRequired));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("Important".parse::<Priority>().unwrap(), Priority::Important);
        assert_eq!(" trivial ".parse::<Priority>().unwrap(), Priority::Trivial);
        let err = "someday".parse::<Priority>().unwrap_err();
        assert!(err.to_string().contains("someday"));
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = vec![" work ".to_string(), "".to_string(), "home".to_string(), "work".to_string()];
        assert_eq!(normalize_tags(&tags), vec!["work", "home"]);
        assert_eq!(parse_tag_list("a, b,,a"), vec!["a", "b"]);
    }

    #[test]
    fn completion_is_normalized_both_ways() {
        let at = crate::libs::formatter::now();
        let mut task = Task {
            id: "t".into(),
            title: "x".into(),
            description: None,
            priority: Priority::Urgent,
            tags: vec![],
            subtasks: vec![],
            due_date: at,
            reminder_time: None,
            completed: true,
            completed_at: None,
            created_at: at,
            updated_at: at,
            order: 0,
            archived: false,
        };
        task.normalize_completion(at);
        assert_eq!(task.completed_at, Some(at));

        task.completed = false;
        task.normalize_completion(at);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let at = crate::libs::formatter::now();
        let task = NewTask::new("Draft", Priority::Important, at);
        assert!(task.tags.is_empty());
        let json = serde_json::to_value(Priority::Urgent).unwrap();
        assert_eq!(json, "urgent");
        assert!(validate_title("   ").is_err());
    }
}
