//! Restores a JSON backup written by [`Exporter`](crate::libs::export::Exporter).
//!
//! Import is tolerant per record. The document shape is checked first; if it
//! is wrong nothing is written and the problems come back in
//! [`ImportResult::errors`]. Otherwise every task, then every reflection, is
//! upserted by id inside one transaction. Each record gets its own savepoint,
//! so a malformed or conflicting record only rolls back its own statements and
//! is reported by title or id.

use crate::db::db::Db;
use crate::db::{reflections, tasks};
use crate::libs::access::{GrantedAccess, StorageAccess};
use crate::libs::error::{AppError, OperationContext, Result};
use crate::libs::export::ensure_access;
use crate::libs::formatter::{from_millis, now, truncate_millis};
use crate::libs::messages::Message;
use crate::libs::reflection::Reflection;
use crate::libs::task::{normalize_tags, Priority, SubTask, Task};
use crate::{msg_debug, msg_warning};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    /// The document was accepted and the import transaction committed.
    pub success: bool,
    pub tasks_imported: usize,
    pub reflections_imported: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Importer {
    db: Db,
    access: Arc<dyn StorageAccess>,
}

impl Importer {
    pub fn new(db: &Db) -> Self {
        Importer {
            db: db.clone(),
            access: Arc::new(GrantedAccess),
        }
    }

    pub fn with_access(mut self, access: Arc<dyn StorageAccess>) -> Self {
        self.access = access;
        self
    }

    pub async fn import_json(&self, path: &Path) -> Result<ImportResult> {
        ensure_access(self.access.as_ref())?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::io(Message::ImportFailed, e))?;
        self.import_str(&content)
    }

    pub fn import_str(&self, json: &str) -> Result<ImportResult> {
        let json = json.trim_start_matches('\u{feff}');
        let document: Value =
            serde_json::from_str(json).map_err(|e| AppError::validation(Message::ImportInvalidJson(e.to_string())))?;

        let mut result = ImportResult::default();
        let (task_values, reflection_values) = match validate_document(&document) {
            Ok(parts) => parts,
            Err(errors) => {
                result.errors = errors;
                return Ok(result);
            }
        };

        self.db
            .transaction(|tx| {
                for value in task_values {
                    match import_record(tx, value, parse_task, tasks::upsert_row) {
                        Ok(()) => result.tasks_imported += 1,
                        Err(reason) => {
                            let error = Message::ImportTaskFailed(task_label(value), reason).to_string();
                            msg_warning!(error);
                            result.errors.push(error);
                        }
                    }
                }

                for value in reflection_values {
                    match import_record(tx, value, parse_reflection, reflections::upsert_row) {
                        Ok(()) => result.reflections_imported += 1,
                        Err(reason) => {
                            let error = Message::ImportReflectionFailed(reflection_label(value), reason).to_string();
                            msg_warning!(error);
                            result.errors.push(error);
                        }
                    }
                }
                Ok(())
            })
            .operation(Message::ImportFailed)?;

        result.success = true;
        msg_debug!(Message::ImportCompleted {
            tasks: result.tasks_imported,
            reflections: result.reflections_imported,
            errors: result.errors.len(),
        });
        Ok(result)
    }
}

/// Parses and writes one record inside its own savepoint.
fn import_record<T, R, P, W>(tx: &mut rusqlite::Transaction, value: &Value, parse: P, write: W) -> std::result::Result<(), String>
where
    P: FnOnce(&Value) -> Result<T>,
    W: FnOnce(&Connection, &T) -> Result<R>,
{
    let record = parse(value).map_err(|e| reason(&e))?;
    let savepoint = tx.savepoint().map_err(|e| e.to_string())?;
    write(&savepoint, &record).map_err(|e| reason(&e))?;
    savepoint.commit().map_err(|e| e.to_string())
}

fn reason(error: &AppError) -> String {
    match error {
        AppError::Storage { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

/// Checks the top-level shape and returns the task and reflection arrays.
fn validate_document(document: &Value) -> std::result::Result<(&Vec<Value>, &Vec<Value>), Vec<String>> {
    let Some(object) = document.as_object().filter(|o| !o.is_empty()) else {
        return Err(vec![Message::ImportEmptyDocument.to_string()]);
    };

    let mut errors = Vec::new();
    let has_version = match object.get("version") {
        Some(Value::String(v)) => !v.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    };
    if !has_version {
        errors.push(Message::ImportMissingVersion.to_string());
    }

    let tasks = object.get("tasks").and_then(Value::as_array);
    if tasks.is_none() {
        errors.push(Message::ImportTasksNotArray.to_string());
    }
    let reflections = object.get("reflections").and_then(Value::as_array);
    if reflections.is_none() {
        errors.push(Message::ImportReflectionsNotArray.to_string());
    }

    match (tasks, reflections) {
        (Some(tasks), Some(reflections)) if errors.is_empty() => Ok((tasks, reflections)),
        _ => Err(errors),
    }
}

fn task_label(value: &Value) -> String {
    let field = |name: &str| value.get(name).and_then(Value::as_str).filter(|s| !s.trim().is_empty());
    field("title").or_else(|| field("id")).unwrap_or("<unknown>").to_string()
}

fn reflection_label(value: &Value) -> String {
    value.get("id").and_then(Value::as_str).unwrap_or("<unknown>").to_string()
}

fn as_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| AppError::validation(Message::FieldMissing("record".to_string())))
}

fn required_str<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a str> {
    object
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation(Message::FieldMissing(field.to_string())))
}

fn optional_str(object: &Map<String, Value>, field: &str) -> Option<String> {
    object
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// ISO-8601 string or epoch milliseconds. Missing and `null` give `None`.
fn optional_timestamp(object: &Map<String, Value>, field: &str) -> Result<Option<DateTime<Utc>>> {
    let invalid = |v: &Value| AppError::validation(Message::InvalidTimestamp(format!("{}: {}", field, v)));
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(v @ Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|_| invalid(v)),
        Some(v @ Value::Number(n)) => n.as_i64().and_then(from_millis).map(Some).ok_or_else(|| invalid(v)),
        Some(v) => Err(invalid(v)),
    }
}

fn required_timestamp(object: &Map<String, Value>, field: &str) -> Result<DateTime<Utc>> {
    optional_timestamp(object, field)?.ok_or_else(|| AppError::validation(Message::FieldMissing(field.to_string())))
}

fn bool_field(object: &Map<String, Value>, field: &str) -> bool {
    object.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn parse_task(value: &Value) -> Result<Task> {
    let object = as_object(value)?;
    let priority: Priority = required_str(object, "priority")?.parse()?;

    let tags: Vec<String> = object
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    let subtasks: Vec<SubTask> = object
        .get("subtasks")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    let created_at = optional_timestamp(object, "createdAt")?.unwrap_or_else(now);
    let updated_at = optional_timestamp(object, "updatedAt")?.unwrap_or(created_at);

    let mut task = Task {
        id: required_str(object, "id")?.to_string(),
        title: required_str(object, "title")?.to_string(),
        description: optional_str(object, "description"),
        priority,
        tags: normalize_tags(&tags),
        subtasks,
        due_date: required_timestamp(object, "dueDate")?,
        reminder_time: optional_timestamp(object, "reminderTime")?,
        completed: bool_field(object, "completed"),
        completed_at: optional_timestamp(object, "completedAt")?,
        created_at,
        updated_at,
        order: object.get("order").and_then(Value::as_i64).unwrap_or(0),
        archived: bool_field(object, "archived"),
    };
    task.truncate_timestamps();
    task.normalize_completion(task.updated_at);
    Ok(task)
}

fn parse_reflection(value: &Value) -> Result<Reflection> {
    let object = as_object(value)?;
    let created_at = truncate_millis(optional_timestamp(object, "createdAt")?.unwrap_or_else(now));
    Ok(Reflection {
        id: required_str(object, "id")?.to_string(),
        task_id: required_str(object, "taskId")?.to_string(),
        content: required_str(object, "content")?.to_string(),
        created_at,
        updated_at: optional_timestamp(object, "updatedAt")?.map(truncate_millis).unwrap_or(created_at),
    })
}
