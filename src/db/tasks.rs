//! Task repository: persistence and state transitions for [`Task`] records.
//!
//! Day queries use the inclusive local-day window from
//! [`formatter::day_bounds`](crate::libs::formatter::day_bounds) and skip
//! archived tasks. Within a day, tasks come back grouped by priority
//! (important, urgent, trivial) and sorted by their `order` inside each group.
//!
//! Reminders are delegated to a [`ReminderScheduler`]. Scheduler failures are
//! logged as warnings and never fail the task operation.

use super::db::{json_at, optional_timestamp_at, timestamp_at, Db};
use crate::libs::error::{AppError, OperationContext, Result, StorageContext};
use crate::libs::filter::{normalize_keyword, task_matches_keyword};
use crate::libs::formatter::{day_bounds, from_millis, local_date, now, to_millis};
use crate::libs::messages::Message;
use crate::libs::reminder::{NoopReminders, ReminderScheduler};
use crate::libs::task::{normalize_tags, validate_title, NewTask, Priority, Task, TaskOrder};
use crate::{msg_debug, msg_warning};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

pub(crate) const TASK_COLUMNS: &str = "id, title, description, priority, tags, subtasks, due_date, reminder_time, \
     completed, completed_at, created_at, updated_at, task_order, archived";

const PRIORITY_RANK: &str = "CASE priority WHEN 'important' THEN 0 WHEN 'urgent' THEN 1 ELSE 2 END";

const INSERT_TASK: &str = "INSERT INTO tasks (id, title, description, priority, tags, subtasks, due_date, reminder_time, \
     completed, completed_at, created_at, updated_at, task_order, archived) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";
const UPDATE_TASK: &str = "UPDATE tasks SET title = ?2, description = ?3, priority = ?4, tags = ?5, subtasks = ?6, \
     due_date = ?7, reminder_time = ?8, completed = ?9, completed_at = ?10, created_at = ?11, updated_at = ?12, \
     task_order = ?13, archived = ?14 WHERE id = ?1";
const UPDATE_ORDER: &str = "UPDATE tasks SET task_order = ?2, updated_at = ?3 WHERE id = ?1";
const RENUMBER_ORDER: &str = "UPDATE tasks SET task_order = ?2, updated_at = ?3 WHERE id = ?1 AND task_order != ?2";
const COMPLETE_TASK: &str = "UPDATE tasks SET completed = 1, completed_at = ?2, updated_at = ?2 WHERE id = ?1";
const UNCOMPLETE_TASK: &str = "UPDATE tasks SET completed = 0, completed_at = NULL, updated_at = ?2 WHERE id = ?1";
const ARCHIVE_TASK: &str = "UPDATE tasks SET archived = 1, updated_at = ?2 WHERE id = ?1";
const DELETE_TASK_REFLECTIONS: &str = "DELETE FROM reflections WHERE task_id = ?1";
const DELETE_TASK: &str = "DELETE FROM tasks WHERE id = ?1";
const SELECT_TASK_EXISTS: &str = "SELECT 1 FROM tasks WHERE id = ?1";
const SELECT_TASK_GROUP: &str = "SELECT due_date, priority FROM tasks WHERE id = ?1";
const SELECT_GROUP_IDS: &str = "SELECT id FROM tasks \
     WHERE due_date BETWEEN ?1 AND ?2 AND priority = ?3 AND archived = 0 ORDER BY task_order, created_at, id";
const SELECT_NEXT_ORDER: &str = "SELECT COALESCE(MAX(task_order) + 1, 0) FROM tasks \
     WHERE due_date BETWEEN ?1 AND ?2 AND priority = ?3 AND archived = 0";
const SELECT_ACTIVE_TAGS: &str = "SELECT tags FROM tasks WHERE archived = 0";

fn select_by_id() -> String {
    format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS)
}

fn select_by_date() -> String {
    format!(
        "SELECT {} FROM tasks WHERE due_date BETWEEN ?1 AND ?2 AND archived = 0 ORDER BY {}, task_order, created_at",
        TASK_COLUMNS, PRIORITY_RANK
    )
}

fn select_by_priority() -> String {
    format!(
        "SELECT {} FROM tasks WHERE due_date BETWEEN ?1 AND ?2 AND priority = ?3 AND archived = 0 ORDER BY task_order, created_at",
        TASK_COLUMNS
    )
}

fn select_all() -> String {
    format!("SELECT {} FROM tasks ORDER BY created_at DESC", TASK_COLUMNS)
}

fn select_completed() -> String {
    format!("SELECT {} FROM tasks WHERE completed = 1 ORDER BY completed_at DESC LIMIT ?1", TASK_COLUMNS)
}

fn select_active() -> String {
    format!("SELECT {} FROM tasks WHERE archived = 0 ORDER BY created_at DESC", TASK_COLUMNS)
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e: AppError| FromSqlError::Other(Box::new(e)))
    }
}

/// Maps a row selected with [`TASK_COLUMNS`] starting at `offset`.
pub(crate) fn task_from_row(row: &Row, offset: usize) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(offset)?,
        title: row.get(offset + 1)?,
        description: row.get(offset + 2)?,
        priority: row.get(offset + 3)?,
        tags: json_at(row, offset + 4)?,
        subtasks: json_at(row, offset + 5)?,
        due_date: timestamp_at(row, offset + 6)?,
        reminder_time: optional_timestamp_at(row, offset + 7)?,
        completed: row.get(offset + 8)?,
        completed_at: optional_timestamp_at(row, offset + 9)?,
        created_at: timestamp_at(row, offset + 10)?,
        updated_at: timestamp_at(row, offset + 11)?,
        order: row.get(offset + 12)?,
        archived: row.get(offset + 13)?,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| AppError::unknown(Message::DbStatementFailed, e))
}

fn optional_millis(ts: Option<DateTime<Utc>>) -> Option<i64> {
    ts.map(to_millis)
}

/// Writes every column of `task`. Inserts when the id is new, otherwise
/// replaces the stored row. Returns `true` when a row was inserted.
pub(crate) fn upsert_row(conn: &Connection, task: &Task) -> Result<bool> {
    let tags = to_json(&task.tags)?;
    let subtasks = to_json(&task.subtasks)?;
    let due_date = to_millis(task.due_date);
    let reminder_time = optional_millis(task.reminder_time);
    let completed_at = optional_millis(task.completed_at);
    let created_at = to_millis(task.created_at);
    let updated_at = to_millis(task.updated_at);
    let values: [&dyn ToSql; 14] = [
        &task.id,
        &task.title,
        &task.description,
        &task.priority,
        &tags,
        &subtasks,
        &due_date,
        &reminder_time,
        &task.completed,
        &completed_at,
        &created_at,
        &updated_at,
        &task.order,
        &task.archived,
    ];

    let exists = conn
        .query_row(SELECT_TASK_EXISTS, params![task.id], |_| Ok(()))
        .optional()
        .with_statement(SELECT_TASK_EXISTS, &[&task.id])?
        .is_some();

    let sql = if exists { UPDATE_TASK } else { INSERT_TASK };
    conn.execute(sql, &values[..]).with_statement(sql, &values)?;
    Ok(!exists)
}

fn query_tasks(conn: &Connection, sql: &str, values: &[&dyn ToSql]) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(sql).with_statement(sql, values)?;
    let rows = stmt.query_map(values, |row| task_from_row(row, 0)).with_statement(sql, values)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().with_statement(sql, values)
}

fn group_ids(conn: &Connection, date: NaiveDate, priority: Priority) -> Result<Vec<String>> {
    let (start, end) = day_bounds(date);
    let values: [&dyn ToSql; 3] = [&start, &end, &priority];
    let mut stmt = conn.prepare(SELECT_GROUP_IDS).with_statement(SELECT_GROUP_IDS, &values)?;
    let rows = stmt.query_map(&values[..], |row| row.get(0)).with_statement(SELECT_GROUP_IDS, &values)?;
    rows.collect::<rusqlite::Result<Vec<String>>>().with_statement(SELECT_GROUP_IDS, &values)
}

/// Rewrites `ids` to the dense sequence `0..N-1`. Only rows whose order
/// actually changes get a new `updated_at`.
fn renumber(conn: &Connection, ids: &[String], at: i64) -> Result<()> {
    for (position, id) in ids.iter().enumerate() {
        let position = position as i64;
        conn.execute(RENUMBER_ORDER, params![id, position, at])
            .with_statement(RENUMBER_ORDER, &[id, &position, &at])?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Tasks {
    db: Db,
    reminders: Arc<dyn ReminderScheduler>,
}

impl Tasks {
    pub fn new(db: &Db) -> Self {
        Self::with_reminders(db, Arc::new(NoopReminders))
    }

    pub fn with_reminders(db: &Db, reminders: Arc<dyn ReminderScheduler>) -> Self {
        Tasks { db: db.clone(), reminders }
    }

    /// Persists a new task with a fresh id and `created_at == updated_at`.
    pub fn create(&self, input: NewTask) -> Result<Task> {
        validate_title(&input.title)?;
        let at = now();
        let mut task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            description: input.description.filter(|d| !d.trim().is_empty()),
            priority: input.priority,
            tags: normalize_tags(&input.tags),
            subtasks: input.subtasks,
            due_date: input.due_date,
            reminder_time: input.reminder_time,
            completed: input.completed,
            completed_at: input.completed_at,
            created_at: at,
            updated_at: at,
            order: input.order,
            archived: input.archived,
        };
        task.truncate_timestamps();
        task.normalize_completion(at);

        self.db
            .transaction(|tx| upsert_row(tx, &task).map(|_| ()))
            .operation(Message::TaskCreateFailed)?;
        msg_debug!(Message::TaskCreated(task.id.clone()));

        if task.has_pending_reminder() {
            self.schedule(&task);
        }
        Ok(task)
    }

    pub fn get_by_date(&self, date: NaiveDate) -> Result<Vec<Task>> {
        let (start, end) = day_bounds(date);
        let tasks = self
            .db
            .with_conn(|conn| query_tasks(conn, &select_by_date(), &[&start, &end]))
            .operation(Message::TaskQueryFailed)?;
        msg_debug!(Message::TasksFoundForDate(tasks.len(), date.to_string()));
        Ok(tasks)
    }

    pub fn get_by_priority(&self, date: NaiveDate, priority: Priority) -> Result<Vec<Task>> {
        let (start, end) = day_bounds(date);
        self.db
            .with_conn(|conn| query_tasks(conn, &select_by_priority(), &[&start, &end, &priority]))
            .operation(Message::TaskQueryFailed)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Task>> {
        let sql = select_by_id();
        self.db
            .with_conn(|conn| {
                conn.query_row(&sql, params![id], |row| task_from_row(row, 0))
                    .optional()
                    .with_statement(&sql, &[&id])
            })
            .operation(Message::TaskQueryFailed)
    }

    /// Every task, archived ones included, newest first.
    pub fn get_all(&self) -> Result<Vec<Task>> {
        let tasks = self
            .db
            .with_conn(|conn| query_tasks(conn, &select_all(), &[]))
            .operation(Message::TaskQueryFailed)?;
        msg_debug!(Message::AllTasksFound(tasks.len()));
        Ok(tasks)
    }

    /// Completed tasks, most recently completed first.
    pub fn get_completed(&self, limit: Option<usize>) -> Result<Vec<Task>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let tasks = self
            .db
            .with_conn(|conn| query_tasks(conn, &select_completed(), &[&limit]))
            .operation(Message::TaskQueryFailed)?;
        msg_debug!(Message::CompletedTasksFound(tasks.len()));
        Ok(tasks)
    }

    /// Replaces the stored record with `task`.
    ///
    /// `updated_at` is always set to now. The completion pair is re-derived
    /// from `completed`, and tags are normalized. Returns `None` when no task
    /// has this id.
    pub fn update(&self, task: &Task) -> Result<Option<Task>> {
        validate_title(&task.title)?;
        let at = now();
        let mut task = task.clone();
        task.title = task.title.trim().to_string();
        task.tags = normalize_tags(&task.tags);
        task.updated_at = at;
        task.truncate_timestamps();
        task.normalize_completion(at);

        let found = self
            .db
            .transaction(|tx| {
                let exists = tx
                    .query_row(SELECT_TASK_EXISTS, params![task.id], |_| Ok(()))
                    .optional()
                    .with_statement(SELECT_TASK_EXISTS, &[&task.id])?
                    .is_some();
                if exists {
                    upsert_row(tx, &task)?;
                }
                Ok(exists)
            })
            .operation(Message::TaskUpdateFailed)?;

        if !found {
            return Ok(None);
        }
        msg_debug!(Message::TaskUpdated(task.id.clone()));

        self.cancel(&task.id);
        if task.has_pending_reminder() {
            self.schedule(&task);
        }
        Ok(Some(task))
    }

    /// Applies a batch of order changes, then rewrites every touched
    /// (day, priority) group to a dense `0..N-1` sequence. One transaction.
    pub fn update_orders(&self, orders: &[TaskOrder]) -> Result<()> {
        let at = to_millis(now());
        self.db
            .transaction(|tx| {
                let mut groups: Vec<(NaiveDate, Priority)> = Vec::new();
                for entry in orders {
                    let changed = tx
                        .execute(UPDATE_ORDER, params![entry.id, entry.order, at])
                        .with_statement(UPDATE_ORDER, &[&entry.id, &entry.order, &at])?;
                    if changed == 0 {
                        continue;
                    }

                    let (due, priority): (i64, Priority) = tx
                        .query_row(SELECT_TASK_GROUP, params![entry.id], |row| Ok((row.get(0)?, row.get(1)?)))
                        .with_statement(SELECT_TASK_GROUP, &[&entry.id])?;
                    if let Some(due) = from_millis(due) {
                        let key = (local_date(due), priority);
                        if !groups.contains(&key) {
                            groups.push(key);
                        }
                    }
                }

                for (date, priority) in groups {
                    let ids = group_ids(tx, date, priority)?;
                    renumber(tx, &ids, at)?;
                }
                Ok(())
            })
            .operation(Message::TaskReorderFailed)?;

        msg_debug!(Message::TaskOrdersUpdated(orders.len()));
        Ok(())
    }

    /// Rewrites the (date, priority) group in the order given by `ids`. Group
    /// members missing from `ids` keep their relative order after the listed
    /// ones; ids outside the group are ignored.
    pub fn reorder(&self, date: NaiveDate, priority: Priority, ids: &[String]) -> Result<()> {
        let at = to_millis(now());
        let count = self
            .db
            .transaction(|tx| {
                let current = group_ids(tx, date, priority)?;
                let members: HashSet<&String> = current.iter().collect();

                let mut seen: HashSet<&String> = HashSet::new();
                let mut sequence: Vec<String> = Vec::with_capacity(current.len());
                for id in ids.iter().filter(|id| members.contains(id)) {
                    if seen.insert(id) {
                        sequence.push(id.clone());
                    }
                }
                sequence.extend(current.iter().filter(|id| !seen.contains(id)).cloned());

                renumber(tx, &sequence, at)?;
                Ok(sequence.len())
            })
            .operation(Message::TaskReorderFailed)?;

        msg_debug!(Message::TaskOrdersUpdated(count));
        Ok(())
    }

    /// Order a new task should take to land at the end of its group.
    pub fn next_order(&self, date: NaiveDate, priority: Priority) -> Result<i64> {
        let (start, end) = day_bounds(date);
        self.db
            .with_conn(|conn| {
                conn.query_row(SELECT_NEXT_ORDER, params![start, end, priority], |row| row.get(0))
                    .with_statement(SELECT_NEXT_ORDER, &[&start, &end, &priority])
            })
            .operation(Message::TaskQueryFailed)
    }

    /// Marks the task done and cancels its reminder. Returns `false` when no
    /// task has this id.
    pub fn complete(&self, id: &str) -> Result<bool> {
        let at = to_millis(now());
        let changed = self
            .db
            .execute(COMPLETE_TASK, &[&id, &at])
            .operation(Message::TaskCompleteFailed)?;
        if changed == 0 {
            return Ok(false);
        }

        msg_debug!(Message::TaskCompleted(id.to_string()));
        self.cancel(id);
        Ok(true)
    }

    pub fn uncomplete(&self, id: &str) -> Result<bool> {
        let at = to_millis(now());
        let changed = self
            .db
            .execute(UNCOMPLETE_TASK, &[&id, &at])
            .operation(Message::TaskUncompleteFailed)?;
        if changed > 0 {
            msg_debug!(Message::TaskUncompleted(id.to_string()));
        }
        Ok(changed > 0)
    }

    pub fn archive(&self, id: &str) -> Result<bool> {
        let at = to_millis(now());
        let changed = self
            .db
            .execute(ARCHIVE_TASK, &[&id, &at])
            .operation(Message::TaskArchiveFailed)?;
        if changed > 0 {
            msg_debug!(Message::TaskArchived(id.to_string()));
        }
        Ok(changed > 0)
    }

    /// Deletes the task and its reflection in one transaction.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self
            .db
            .transaction(|tx| {
                tx.execute(DELETE_TASK_REFLECTIONS, params![id])
                    .with_statement(DELETE_TASK_REFLECTIONS, &[&id])?;
                tx.execute(DELETE_TASK, params![id]).with_statement(DELETE_TASK, &[&id])
            })
            .operation(Message::TaskDeleteFailed)?;
        if deleted == 0 {
            return Ok(false);
        }

        msg_debug!(Message::TaskDeleted(id.to_string()));
        self.cancel(id);
        Ok(true)
    }

    /// Case-insensitive substring search over title, description and each tag
    /// of non-archived tasks, newest first. SQLite's `LOWER` only folds ASCII,
    /// so matching happens on the loaded rows.
    pub fn search(&self, keyword: &str) -> Result<Vec<Task>> {
        let needle = normalize_keyword(keyword);
        let mut tasks = self
            .db
            .with_conn(|conn| query_tasks(conn, &select_active(), &[]))
            .operation(Message::TaskSearchFailed)?;
        tasks.retain(|task| task_matches_keyword(task, &needle));
        msg_debug!(Message::TasksFoundForKeyword(tasks.len(), keyword.to_string()));
        Ok(tasks)
    }

    /// Sorted, deduplicated tags of all non-archived tasks.
    pub fn get_all_tags(&self) -> Result<Vec<String>> {
        let tags = self
            .db
            .with_conn(|conn| {
                let mut stmt = conn.prepare(SELECT_ACTIVE_TAGS).with_statement(SELECT_ACTIVE_TAGS, &[])?;
                let rows = stmt
                    .query_map([], |row| json_at::<Vec<String>>(row, 0))
                    .with_statement(SELECT_ACTIVE_TAGS, &[])?;
                let mut tags = BTreeSet::new();
                for row in rows {
                    tags.extend(row.with_statement(SELECT_ACTIVE_TAGS, &[])?);
                }
                Ok(tags)
            })
            .operation(Message::TagsQueryFailed)?;
        msg_debug!(Message::UniqueTagsFound(tags.len()));
        Ok(tags.into_iter().collect())
    }

    /// Flips one sub-task's completed flag. Returns `None` when the task does
    /// not exist.
    pub fn toggle_subtask(&self, task_id: &str, subtask_id: &str) -> Result<Option<Task>> {
        let Some(mut task) = self.get_by_id(task_id)? else {
            return Ok(None);
        };
        let subtask = task
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| AppError::validation(Message::SubtaskNotFound(subtask_id.to_string())))?;
        subtask.completed = !subtask.completed;
        self.update(&task)
    }

    fn schedule(&self, task: &Task) {
        if let Some(time) = task.reminder_time {
            if let Err(e) = self.reminders.schedule_reminder(&task.id, &task.title, time) {
                msg_warning!(Message::ReminderScheduleFailed(task.id.clone(), e));
            }
        }
    }

    fn cancel(&self, id: &str) {
        if let Err(e) = self.reminders.cancel_reminder(id) {
            msg_warning!(Message::ReminderCancelFailed(id.to_string(), e));
        }
    }
}
