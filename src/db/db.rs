//! Storage engine: the single SQLite connection shared by every repository.
//!
//! A [`Db`] is a cheap, cloneable handle. All clones share one lazily opened
//! connection behind a mutex, so statements and transactions from any
//! repository run one at a time in submission order.
//!
//! ```rust,no_run
//! use detter::db::db::Db;
//! use detter::db::tasks::Tasks;
//!
//! let db = Db::new()?;
//! db.init()?;
//! let tasks = Tasks::new(&db);
//! # Ok::<(), detter::libs::error::AppError>(())
//! ```

use super::schema::{self, Schema};
use crate::libs::data_storage::DataStorage;
use crate::libs::error::{AppError, OperationContext, Result, StorageContext};
use crate::libs::formatter::from_millis;
use crate::libs::messages::Message;
use crate::msg_debug;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::{FromSqlError, ToSql, Type};
use rusqlite::{Connection, Row, Transaction};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DB_FILE_NAME: &str = "detter.db";

const DELETE_ALL_REFLECTIONS: &str = "DELETE FROM reflections";
const DELETE_ALL_TASKS: &str = "DELETE FROM tasks";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone)]
pub struct Db {
    location: Location,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl Db {
    /// Handle for `detter.db` in the platform data directory. Not opened yet.
    pub fn new() -> Result<Db> {
        let path = DataStorage::new()
            .get_path(DB_FILE_NAME)
            .map_err(|e| AppError::io(Message::DbInitFailed, e))?;
        Ok(Self::open(path))
    }

    pub fn open(path: impl Into<PathBuf>) -> Db {
        Db {
            location: Location::File(path.into()),
            conn: Arc::new(Mutex::new(None)),
        }
    }

    pub fn in_memory() -> Db {
        Db {
            location: Location::Memory,
            conn: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.conn.lock().is_some()
    }

    /// Opens the connection and brings the schema up to date.
    ///
    /// Calling it on an open handle does nothing.
    pub fn init(&self) -> Result<()> {
        let mut guard = self.conn.lock();
        if guard.is_some() {
            msg_debug!(Message::DatabaseAlreadyOpen);
            return Ok(());
        }

        let mut conn = match &self.location {
            Location::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| AppError::io(Message::DbInitFailed, e))?;
                }
                Connection::open(path)
            }
            Location::Memory => Connection::open_in_memory(),
        }
        .map_err(|e| AppError::storage(Message::DbInitFailed, e))?;

        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| AppError::storage(Message::DbInitFailed, e))?;
        Schema::new().apply(&mut conn).operation(Message::DbInitFailed)?;

        msg_debug!(Message::DatabaseOpened(self.describe()));
        *guard = Some(conn);
        Ok(())
    }

    /// Runs `f` against the open connection.
    pub fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(AppError::NotInitialized)?;
        f(conn)
    }

    /// Runs `f` inside a transaction. Commits when `f` succeeds; any error
    /// rolls the whole unit back.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction) -> Result<T>,
    {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or(AppError::NotInitialized)?;
        let mut tx = conn
            .transaction()
            .map_err(|e| AppError::storage(Message::DbTransactionFailed, e))?;
        let value = f(&mut tx)?;
        tx.commit().map_err(|e| AppError::storage(Message::DbTransactionFailed, e))?;
        Ok(value)
    }

    /// Runs one statement outside an explicit transaction and returns the
    /// number of affected rows.
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize> {
        self.with_conn(|conn| conn.execute(sql, params).with_statement(sql, params))
    }

    /// Deletes every reflection and task. Reflections go first because of the
    /// foreign key.
    pub fn clear_all_data(&self) -> Result<()> {
        self.transaction(|tx| {
            tx.execute(DELETE_ALL_REFLECTIONS, []).with_statement(DELETE_ALL_REFLECTIONS, &[])?;
            tx.execute(DELETE_ALL_TASKS, []).with_statement(DELETE_ALL_TASKS, &[])?;
            Ok(())
        })
        .operation(Message::ClearDataFailed)?;

        msg_debug!(Message::AllDataCleared);
        Ok(())
    }

    /// Closes the connection. Every clone of this handle sees it closed.
    pub fn close(&self) -> Result<()> {
        let conn = self.conn.lock().take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, e)| AppError::storage(Message::DbCloseFailed, e))?;
            msg_debug!(Message::DatabaseClosed);
        }
        Ok(())
    }

    /// Closes the connection and removes the database file.
    pub fn delete_database(&self) -> Result<()> {
        self.close()?;
        if let Location::File(path) = &self.location {
            for file in [path.clone(), sidecar(path, "-wal"), sidecar(path, "-shm"), sidecar(path, "-journal")] {
                if file.exists() {
                    fs::remove_file(&file).map_err(|e| AppError::io(Message::DbDeleteFailed, e))?;
                }
            }
        }
        msg_debug!(Message::DatabaseDeleted(self.describe()));
        Ok(())
    }

    pub fn schema_version(&self) -> Result<u32> {
        self.with_conn(schema::current_version)
    }

    fn describe(&self) -> String {
        match &self.location {
            Location::File(path) => path.display().to_string(),
            Location::Memory => ":memory:".to_string(),
        }
    }
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

// Row helpers shared by the repositories.

pub(crate) fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    from_millis(ms).ok_or_else(|| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(FromSqlError::OutOfRange(ms))))
}

pub(crate) fn optional_timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<i64>>(idx)? {
        Some(_) => timestamp_at(row, idx).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn json_at<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_handle_reports_not_initialized() {
        let db = Db::in_memory();
        assert!(matches!(db.execute("SELECT 1", &[]), Err(AppError::NotInitialized)));

        db.init().unwrap();
        db.init().unwrap();
        assert!(db.is_open());

        db.close().unwrap();
        assert!(matches!(db.schema_version(), Err(AppError::NotInitialized)));
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let db = Db::in_memory();
        db.init().unwrap();
        let result: Result<()> = db.transaction(|tx| {
            tx.execute(
                "INSERT INTO tasks (id, title, priority, due_date, created_at, updated_at) VALUES ('a', 'x', 'urgent', 0, 0, 0)",
                [],
            )?;
            tx.execute("INSERT INTO no_such_table VALUES (1)", [])?;
            Ok(())
        });
        assert!(result.is_err());

        let count: i64 = db.with_conn(|c| Ok(c.query_row("SELECT COUNT(*) FROM tasks", [], |r| r.get(0))?)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn statement_failures_name_the_statement() {
        let db = Db::in_memory();
        db.init().unwrap();
        let err = db.execute("DELETE FROM nowhere WHERE id = ?1", &[&"x"]).unwrap_err();
        assert_eq!(err.statement_text(), Some("DELETE FROM nowhere WHERE id = ?1"));
        assert!(err.is_retryable());
    }
}
