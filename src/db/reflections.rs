use super::db::{timestamp_at, Db};
use super::tasks::{task_from_row, TASK_COLUMNS};
use crate::libs::error::{OperationContext, Result, StorageContext};
use crate::libs::filter::{contains_keyword, normalize_keyword};
use crate::libs::formatter::{now, to_millis};
use crate::libs::messages::Message;
use crate::libs::reflection::{validate_content, NewReflection, Reflection, TaskWithReflection};
use crate::msg_debug;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

const REFLECTION_COLUMNS: &str = "id, task_id, content, created_at, updated_at";

const INSERT_REFLECTION: &str = "INSERT INTO reflections (id, task_id, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)";
const UPDATE_REFLECTION: &str = "UPDATE reflections SET content = ?2, updated_at = ?3 WHERE id = ?1";
const UPSERT_REFLECTION: &str = "INSERT INTO reflections (id, task_id, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5) \
     ON CONFLICT(id) DO UPDATE SET task_id = excluded.task_id, content = excluded.content, \
     created_at = excluded.created_at, updated_at = excluded.updated_at";
const DELETE_REFLECTION: &str = "DELETE FROM reflections WHERE id = ?1";
const DELETE_REFLECTIONS_FOR_TASK: &str = "DELETE FROM reflections WHERE task_id = ?1";
const DELETE_OTHER_REFLECTIONS: &str = "DELETE FROM reflections WHERE task_id = ?1 AND id != ?2";
const COUNT_REFLECTIONS: &str = "SELECT COUNT(*) FROM reflections";

fn select_by_task_id() -> String {
    format!("SELECT {} FROM reflections WHERE task_id = ?1", REFLECTION_COLUMNS)
}

fn select_by_id() -> String {
    format!("SELECT {} FROM reflections WHERE id = ?1", REFLECTION_COLUMNS)
}

fn select_all() -> String {
    format!("SELECT {} FROM reflections ORDER BY created_at DESC", REFLECTION_COLUMNS)
}

/// Task columns first, then the (possibly NULL) reflection columns.
fn select_joined(join: &str, filter: &str, order: &str) -> String {
    format!(
        "SELECT {}, r.id, r.task_id, r.content, r.created_at, r.updated_at \
         FROM tasks t {} reflections r ON r.task_id = t.id WHERE {} ORDER BY {}",
        TASK_COLUMNS.split(", ").map(|c| format!("t.{}", c)).collect::<Vec<_>>().join(", "),
        join,
        filter,
        order
    )
}

fn select_completed_with_reflections() -> String {
    select_joined("LEFT JOIN", "t.completed = 1", "t.completed_at DESC LIMIT ?1")
}

fn select_task_with_reflection() -> String {
    select_joined("LEFT JOIN", "t.id = ?1", "t.id")
}

fn select_reflected() -> String {
    select_joined("INNER JOIN", "r.id IS NOT NULL", "r.created_at DESC")
}

pub(crate) fn reflection_from_row(row: &Row, offset: usize) -> rusqlite::Result<Reflection> {
    Ok(Reflection {
        id: row.get(offset)?,
        task_id: row.get(offset + 1)?,
        content: row.get(offset + 2)?,
        created_at: timestamp_at(row, offset + 3)?,
        updated_at: timestamp_at(row, offset + 4)?,
    })
}

const JOINED_REFLECTION_OFFSET: usize = 14;

fn joined_from_row(row: &Row) -> rusqlite::Result<TaskWithReflection> {
    let task = task_from_row(row, 0)?;
    let reflection = match row.get::<_, Option<String>>(JOINED_REFLECTION_OFFSET)? {
        Some(_) => Some(reflection_from_row(row, JOINED_REFLECTION_OFFSET)?),
        None => None,
    };
    Ok(TaskWithReflection::new(task, reflection))
}

fn query_joined(conn: &Connection, sql: &str, values: &[&dyn ToSql]) -> Result<Vec<TaskWithReflection>> {
    let mut stmt = conn.prepare(sql).with_statement(sql, values)?;
    let rows = stmt.query_map(values, joined_from_row).with_statement(sql, values)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().with_statement(sql, values)
}

fn find_one(conn: &Connection, sql: &str, key: &str) -> Result<Option<Reflection>> {
    conn.query_row(sql, params![key], |row| reflection_from_row(row, 0))
        .optional()
        .with_statement(sql, &[&key])
}

/// Writes every column of `reflection`, inserting or replacing by id. Any
/// other reflection of the same task is removed first.
pub(crate) fn upsert_row(conn: &Connection, reflection: &Reflection) -> Result<()> {
    conn.execute(DELETE_OTHER_REFLECTIONS, params![reflection.task_id, reflection.id])
        .with_statement(DELETE_OTHER_REFLECTIONS, &[&reflection.task_id, &reflection.id])?;

    let created_at = to_millis(reflection.created_at);
    let updated_at = to_millis(reflection.updated_at);
    let values: [&dyn ToSql; 5] = [&reflection.id, &reflection.task_id, &reflection.content, &created_at, &updated_at];
    conn.execute(UPSERT_REFLECTION, &values[..])
        .with_statement(UPSERT_REFLECTION, &values)?;
    Ok(())
}

/// Reflection repository. A task has at most one reflection.
#[derive(Debug, Clone)]
pub struct Reflections {
    db: Db,
}

impl Reflections {
    pub fn new(db: &Db) -> Self {
        Reflections { db: db.clone() }
    }

    /// Saves the reflection for `input.task_id`.
    ///
    /// When the task already has one, its content is replaced and the existing
    /// record (same id and `created_at`) is returned. Fails with a storage
    /// error when the task does not exist.
    pub fn create(&self, input: NewReflection) -> Result<Reflection> {
        validate_content(&input.content)?;
        let at = now();
        let content = input.content.trim().to_string();
        let by_task = select_by_task_id();

        let (reflection, replaced) = self
            .db
            .transaction(|tx| {
                if let Some(mut existing) = find_one(tx, &by_task, &input.task_id)? {
                    let at_ms = to_millis(at);
                    tx.execute(UPDATE_REFLECTION, params![existing.id, content, at_ms])
                        .with_statement(UPDATE_REFLECTION, &[&existing.id, &content, &at_ms])?;
                    existing.content = content.clone();
                    existing.updated_at = at;
                    return Ok((existing, true));
                }

                let reflection = Reflection {
                    id: uuid::Uuid::new_v4().to_string(),
                    task_id: input.task_id.clone(),
                    content: content.clone(),
                    created_at: at,
                    updated_at: at,
                };
                let at_ms = to_millis(at);
                let values: [&dyn ToSql; 5] = [&reflection.id, &reflection.task_id, &reflection.content, &at_ms, &at_ms];
                tx.execute(INSERT_REFLECTION, &values[..])
                    .with_statement(INSERT_REFLECTION, &values)?;
                Ok((reflection, false))
            })
            .operation(Message::ReflectionCreateFailed)?;

        if replaced {
            msg_debug!(Message::ReflectionReplaced(reflection.task_id.clone()));
        } else {
            msg_debug!(Message::ReflectionCreated(reflection.id.clone()));
        }
        Ok(reflection)
    }

    pub fn get_by_task_id(&self, task_id: &str) -> Result<Option<Reflection>> {
        let sql = select_by_task_id();
        self.db
            .with_conn(|conn| find_one(conn, &sql, task_id))
            .operation(Message::ReflectionQueryFailed)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Reflection>> {
        let sql = select_by_id();
        self.db
            .with_conn(|conn| find_one(conn, &sql, id))
            .operation(Message::ReflectionQueryFailed)
    }

    /// Replaces the content and refreshes `updated_at`. Returns `None` when
    /// no reflection has this id.
    pub fn update(&self, reflection: &Reflection) -> Result<Option<Reflection>> {
        validate_content(&reflection.content)?;
        let at = now();
        let at_ms = to_millis(at);
        let content = reflection.content.trim().to_string();

        let changed = self
            .db
            .execute(UPDATE_REFLECTION, &[&reflection.id, &content, &at_ms])
            .operation(Message::ReflectionUpdateFailed)?;
        if changed == 0 {
            return Ok(None);
        }

        msg_debug!(Message::ReflectionUpdated(reflection.id.clone()));
        Ok(Some(Reflection {
            content,
            updated_at: at,
            ..reflection.clone()
        }))
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let changed = self
            .db
            .execute(DELETE_REFLECTION, &[&id])
            .operation(Message::ReflectionDeleteFailed)?;
        if changed > 0 {
            msg_debug!(Message::ReflectionDeleted(id.to_string()));
        }
        Ok(changed > 0)
    }

    /// Removes the reflection of a task that is already gone. Deleting a task
    /// through [`Tasks::delete`](crate::db::tasks::Tasks::delete) cascades on
    /// its own.
    pub fn delete_by_task_id(&self, task_id: &str) -> Result<usize> {
        let changed = self
            .db
            .execute(DELETE_REFLECTIONS_FOR_TASK, &[&task_id])
            .operation(Message::ReflectionDeleteFailed)?;
        msg_debug!(Message::ReflectionsDeletedForTask(task_id.to_string()));
        Ok(changed)
    }

    pub fn get_all(&self) -> Result<Vec<Reflection>> {
        let sql = select_all();
        let reflections = self
            .db
            .with_conn(|conn| {
                let mut stmt = conn.prepare(&sql).with_statement(&sql, &[])?;
                let rows = stmt
                    .query_map([], |row| reflection_from_row(row, 0))
                    .with_statement(&sql, &[])?;
                rows.collect::<rusqlite::Result<Vec<_>>>().with_statement(&sql, &[])
            })
            .operation(Message::ReflectionQueryFailed)?;
        msg_debug!(Message::ReflectionsFound(reflections.len()));
        Ok(reflections)
    }

    /// Completed tasks with their reflection, if any, most recently completed
    /// first.
    pub fn get_completed_tasks_with_reflections(&self, limit: Option<usize>) -> Result<Vec<TaskWithReflection>> {
        let sql = select_completed_with_reflections();
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        self.db
            .with_conn(|conn| query_joined(conn, &sql, &[&limit]))
            .operation(Message::ReflectionQueryFailed)
    }

    pub fn get_task_with_reflection(&self, task_id: &str) -> Result<Option<TaskWithReflection>> {
        let sql = select_task_with_reflection();
        let rows = self
            .db
            .with_conn(|conn| query_joined(conn, &sql, &[&task_id]))
            .operation(Message::ReflectionQueryFailed)?;
        Ok(rows.into_iter().next())
    }

    /// Tasks whose reflection content contains `keyword`, case-insensitive,
    /// newest reflection first.
    pub fn search(&self, keyword: &str) -> Result<Vec<TaskWithReflection>> {
        let sql = select_reflected();
        let needle = normalize_keyword(keyword);
        let mut rows = self
            .db
            .with_conn(|conn| query_joined(conn, &sql, &[]))
            .operation(Message::ReflectionSearchFailed)?;
        rows.retain(|row| row.reflection.as_ref().is_some_and(|r| contains_keyword(&r.content, &needle)));
        msg_debug!(Message::ReflectionsFoundForKeyword(rows.len(), keyword.to_string()));
        Ok(rows)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .db
            .with_conn(|conn| {
                conn.query_row(COUNT_REFLECTIONS, [], |row| row.get(0))
                    .with_statement(COUNT_REFLECTIONS, &[])
            })
            .operation(Message::ReflectionCountFailed)?;
        Ok(count as usize)
    }
}
