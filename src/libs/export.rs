//! Backup export: versioned JSON snapshots and a flat CSV of tasks.
//!
//! The JSON snapshot holds every task (archived ones included) and every
//! reflection, with camelCase field names and ISO-8601 dates:
//!
//! ```json
//! { "version": "1.0", "exportDate": "...", "tasks": [...], "reflections": [...] }
//! ```
//!
//! The CSV is for spreadsheets. It covers tasks only, starts with a UTF-8 byte
//! order mark and writes local `YYYY-MM-DD HH:MM:SS` timestamps.
//!
//! Both file exports ask the [`StorageAccess`] gate first and write a file
//! named after the current local time into the export directory:
//! `detter_backup_YYYYMMDD_HHMMSS.json` or `detter_tasks_YYYYMMDD_HHMMSS.csv`.
//!
//! ```rust,no_run
//! use detter::db::db::Db;
//! use detter::libs::export::Exporter;
//!
//! # async fn run() -> detter::libs::error::Result<()> {
//! let db = Db::new()?;
//! db.init()?;
//! let path = Exporter::new(&db, "/tmp/detter").export_json().await?;
//! println!("{}", path.display());
//! # Ok(())
//! # }
//! ```

use crate::db::db::Db;
use crate::db::reflections::Reflections;
use crate::db::tasks::Tasks;
use crate::libs::access::{GrantedAccess, StorageAccess};
use crate::libs::config::DEFAULT_TAG_DELIMITER;
use crate::libs::error::{AppError, Result};
use crate::libs::formatter::{format_local, now};
use crate::libs::messages::Message;
use crate::libs::reflection::Reflection;
use crate::libs::task::Task;
use crate::msg_debug;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const EXPORT_VERSION: &str = "1.0";
pub const JSON_FILE_PREFIX: &str = "detter_backup_";
pub const CSV_FILE_PREFIX: &str = "detter_tasks_";

const BOM: &str = "\u{feff}";

pub const CSV_HEADERS: [&str; 10] = [
    "ID",
    "Title",
    "Description",
    "Priority",
    "Tags",
    "Due Date",
    "Reminder",
    "Status",
    "Completed At",
    "Created At",
];

/// Full backup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub tasks: Vec<Task>,
    pub reflections: Vec<Reflection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    fn prefix(&self) -> &'static str {
        match self {
            ExportFormat::Json => JSON_FILE_PREFIX,
            ExportFormat::Csv => CSV_FILE_PREFIX,
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Exporter {
    tasks: Tasks,
    reflections: Reflections,
    access: Arc<dyn StorageAccess>,
    export_dir: PathBuf,
    tag_delimiter: String,
}

impl Exporter {
    pub fn new(db: &Db, export_dir: impl Into<PathBuf>) -> Self {
        Exporter {
            tasks: Tasks::new(db),
            reflections: Reflections::new(db),
            access: Arc::new(GrantedAccess),
            export_dir: export_dir.into(),
            tag_delimiter: DEFAULT_TAG_DELIMITER.to_string(),
        }
    }

    pub fn with_access(mut self, access: Arc<dyn StorageAccess>) -> Self {
        self.access = access;
        self
    }

    pub fn with_tag_delimiter(mut self, delimiter: &str) -> Self {
        self.tag_delimiter = delimiter.to_string();
        self
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            version: EXPORT_VERSION.to_string(),
            export_date: now(),
            tasks: self.tasks.get_all()?,
            reflections: self.reflections.get_all()?,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        let snapshot = self.snapshot()?;
        serde_json::to_string_pretty(&snapshot).map_err(|e| AppError::unknown(Message::ExportFailed, e))
    }

    /// Tasks as CSV text, byte order mark included.
    pub fn to_csv(&self) -> Result<String> {
        let tasks = self.tasks.get_all()?;

        let mut writer = csv::Writer::from_writer(BOM.as_bytes().to_vec());
        writer
            .write_record(CSV_HEADERS)
            .map_err(|e| AppError::unknown(Message::ExportFailed, e))?;
        for task in &tasks {
            writer
                .write_record(self.csv_row(task))
                .map_err(|e| AppError::unknown(Message::ExportFailed, e))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::unknown(Message::ExportFailed, e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| AppError::unknown(Message::ExportFailed, e))
    }

    fn csv_row(&self, task: &Task) -> [String; 10] {
        [
            task.id.clone(),
            task.title.clone(),
            task.description.clone().unwrap_or_default(),
            task.priority.to_string(),
            task.tags.join(&self.tag_delimiter),
            format_local(task.due_date),
            task.reminder_time.map(format_local).unwrap_or_default(),
            if task.completed { "completed" } else { "pending" }.to_string(),
            task.completed_at.map(format_local).unwrap_or_default(),
            format_local(task.created_at),
        ]
    }

    pub async fn export_json(&self) -> Result<PathBuf> {
        self.ensure_access()?;
        let content = self.to_json()?;
        self.write(ExportFormat::Json, content).await
    }

    pub async fn export_csv(&self) -> Result<PathBuf> {
        self.ensure_access()?;
        let content = self.to_csv()?;
        self.write(ExportFormat::Csv, content).await
    }

    async fn write(&self, format: ExportFormat, content: String) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.export_dir)
            .await
            .map_err(|e| AppError::io(Message::ExportFailed, e))?;

        let path = self.unique_path(format);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| AppError::io(Message::ExportFailed, e))?;

        msg_debug!(Message::ExportCompleted(path.display().to_string()));
        Ok(path)
    }

    fn unique_path(&self, format: ExportFormat) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let base = format!("{}{}", format.prefix(), stamp);
        let mut path = self.export_dir.join(format!("{}.{}", base, format.extension()));
        let mut n = 1;
        while path.exists() {
            path = self.export_dir.join(format!("{}_{}.{}", base, n, format.extension()));
            n += 1;
        }
        path
    }

    /// Backups previously written to the export directory, newest first.
    pub fn exported_files(&self) -> Result<Vec<PathBuf>> {
        self.ensure_access()?;
        if !self.export_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.export_dir).map_err(|e| AppError::io(Message::ExportFailed, e))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_export_file(path))
            .collect();
        files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
        Ok(files)
    }

    /// Removes one exported file. Paths outside the export directory are
    /// rejected.
    pub fn delete_file(&self, path: &Path) -> Result<()> {
        self.ensure_access()?;
        let inside = path.parent().map(|parent| parent == self.export_dir).unwrap_or(false);
        if !inside || !is_export_file(path) {
            return Err(AppError::validation(Message::ExportFileOutsideDir(path.display().to_string())));
        }

        fs::remove_file(path).map_err(|e| AppError::io(Message::ExportFailed, e))?;
        msg_debug!(Message::ExportFileDeleted(path.display().to_string()));
        Ok(())
    }

    fn ensure_access(&self) -> Result<()> {
        ensure_access(self.access.as_ref())
    }
}

/// Checks the gate, asking for access once when it is not granted yet.
pub(crate) fn ensure_access(access: &dyn StorageAccess) -> Result<()> {
    if access.has_storage_access() || access.request_storage_access() {
        Ok(())
    } else {
        Err(AppError::permission(Message::StoragePermissionRequired))
    }
}

fn is_export_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    (name.starts_with(JSON_FILE_PREFIX) && name.ends_with(".json")) || (name.starts_with(CSV_FILE_PREFIX) && name.ends_with(".csv"))
}
