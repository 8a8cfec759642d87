pub mod clear;
pub mod export;
pub mod import;
pub mod init;
pub mod reflect;
pub mod stats;
pub mod task;

use crate::db::db::Db;
use crate::db::tasks::Tasks;
use crate::libs::config::Config;
use crate::libs::formatter::parse_date;
use crate::libs::messages::Message;
use crate::libs::reminder::LogReminders;
use crate::libs::task::Task;
use crate::msg_error_anyhow;
use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Manage tasks")]
    Task(task::TaskArgs),
    #[command(about = "Write and browse reflections on completed tasks")]
    Reflect(reflect::ReflectArgs),
    #[command(about = "Show completion statistics")]
    Stats(stats::StatsArgs),
    #[command(about = "Export tasks and reflections")]
    Export(export::ExportArgs),
    #[command(about = "Import a JSON backup")]
    Import(import::ImportArgs),
    #[command(about = "Delete all tasks and reflections")]
    Clear(clear::ClearArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Task(args) => task::cmd(args),
            Commands::Reflect(args) => reflect::cmd(args),
            Commands::Stats(args) => stats::cmd(args),
            Commands::Export(args) => export::cmd(args).await,
            Commands::Import(args) => import::cmd(args).await,
            Commands::Clear(args) => clear::cmd(args),
        }
    }
}

/// Opens the database in the data directory, migrating it if needed.
pub(crate) fn open_db() -> Result<Db> {
    let db = Db::new()?;
    db.init()?;
    Ok(db)
}

/// Task repository wired to the reminder backend chosen in the config.
pub(crate) fn task_repository(db: &Db, config: &Config) -> Tasks {
    if config.reminders_enabled {
        Tasks::with_reminders(db, Arc::new(LogReminders))
    } else {
        Tasks::new(db)
    }
}

pub(crate) fn date_arg(input: &str) -> Result<NaiveDate> {
    parse_date(input).ok_or_else(|| msg_error_anyhow!(Message::InvalidDate(input.to_string())))
}

/// Finds a task by full id or by a unique id prefix, as printed in tables.
pub(crate) fn resolve_task(tasks: &Tasks, id: &str) -> Result<Task> {
    if let Some(task) = tasks.get_by_id(id)? {
        return Ok(task);
    }

    let mut matches = tasks.get_all()?.into_iter().filter(|t| t.id.starts_with(id));
    match (matches.next(), matches.next()) {
        (Some(task), None) if !id.is_empty() => Ok(task),
        (Some(_), Some(_)) => Err(msg_error_anyhow!(Message::AmbiguousTaskId(id.to_string()))),
        _ => Err(msg_error_anyhow!(Message::TaskNotFound(id.to_string()))),
    }
}
