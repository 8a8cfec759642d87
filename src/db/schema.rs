//! Versioned schema for the detter database.
//!
//! Works like a small migration manager: every schema step has a version and
//! a name, applied steps are recorded in the `migrations` table, and all
//! pending steps run inside one transaction during [`Db::init`].
//!
//! ## Tables
//!
//! - `tasks`: one row per task. Tags and sub-tasks are JSON arrays in TEXT
//!   columns, every timestamp is epoch milliseconds and the display order is
//!   stored as `task_order`.
//! - `reflections`: at most one note per task, `task_id` references
//!   `tasks(id)`.
//!
//! [`Db::init`]: crate::db::db::Db::init

use crate::libs::error::Result;
use crate::libs::messages::Message;
use crate::msg_debug;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL
)";

const SCHEMA_TASKS: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    priority TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    subtasks TEXT NOT NULL DEFAULT '[]',
    due_date INTEGER NOT NULL,
    reminder_time INTEGER,
    completed INTEGER NOT NULL DEFAULT 0,
    completed_at INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    task_order INTEGER NOT NULL DEFAULT 0,
    archived INTEGER NOT NULL DEFAULT 0
)";

const SCHEMA_REFLECTIONS: &str = "CREATE TABLE IF NOT EXISTS reflections (
    id TEXT PRIMARY KEY NOT NULL,
    task_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
)";

// Keeps the newest reflection of every task before the unique index goes in.
const DEDUPE_REFLECTIONS: &str = "DELETE FROM reflections
    WHERE id NOT IN (
        SELECT id FROM (
            SELECT id, ROW_NUMBER() OVER (PARTITION BY task_id ORDER BY updated_at DESC, id) AS pos
            FROM reflections
        ) WHERE pos = 1
    )";

const SELECT_VERSION: &str = "SELECT MAX(version) FROM migrations";
const INSERT_MIGRATION: &str = "INSERT INTO migrations (version, name, applied_at) VALUES (?1, ?2, ?3)";

struct Migration {
    version: u32,
    name: &'static str,
    up: fn(&Transaction) -> rusqlite::Result<()>,
}

pub struct Schema {
    migrations: Vec<Migration>,
}

impl Schema {
    pub fn new() -> Self {
        let mut schema = Self { migrations: Vec::new() };
        schema.register();
        schema
    }

    fn register(&mut self) {
        self.add(1, "create_tasks_and_reflections", |tx| {
            tx.execute(SCHEMA_TASKS, [])?;
            tx.execute(SCHEMA_REFLECTIONS, [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_tasks_completed ON tasks(completed)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks(priority)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_reflections_task_id ON reflections(task_id)", [])?;
            Ok(())
        });

        self.add(2, "unique_reflection_per_task", |tx| {
            tx.execute(DEDUPE_REFLECTIONS, [])?;
            tx.execute("DROP INDEX IF EXISTS idx_reflections_task_id", [])?;
            tx.execute("CREATE UNIQUE INDEX IF NOT EXISTS idx_reflections_task_id ON reflections(task_id)", [])?;
            Ok(())
        });
    }

    fn add(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> rusqlite::Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    /// Highest version this build knows about.
    pub fn latest_version(&self) -> u32 {
        self.migrations.iter().map(|m| m.version).max().unwrap_or(0)
    }

    /// Applies every pending step in one transaction.
    pub fn apply(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;
        let current = current_version(conn)?;

        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current).collect();
        if pending.is_empty() {
            msg_debug!(Message::SchemaUpToDate(current));
            return Ok(());
        }

        let tx = conn.transaction()?;
        for migration in pending {
            msg_debug!(Message::ApplyingSchema(migration.version, migration.name.to_string()));
            (migration.up)(&tx)?;
            tx.execute(
                INSERT_MIGRATION,
                params![migration.version, migration.name, crate::libs::formatter::now().timestamp_millis()],
            )?;
        }
        tx.commit()?;

        msg_debug!(Message::SchemaApplied(self.latest_version()));
        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// Applied schema version, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> Result<u32> {
    let version: Option<Option<u32>> = conn.query_row(SELECT_VERSION, [], |row| row.get(0)).optional()?;
    Ok(version.flatten().unwrap_or(0))
}
