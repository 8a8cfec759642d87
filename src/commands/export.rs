//! Backup export command.
//!
//! Writes JSON backups and CSV task lists into the configured export
//! directory, and lists or deletes what was written there before.

use super::open_db;
use crate::libs::access::DirectoryAccess;
use crate::libs::config::Config;
use crate::libs::export::Exporter;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::{msg_info, msg_print, msg_success};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(subcommand)]
    command: Option<ExportCommand>,
}

#[derive(Debug, Subcommand)]
enum ExportCommand {
    /// Full backup of tasks and reflections (default)
    Json,
    /// Tasks as CSV for spreadsheets
    Csv,
    /// Files in the export directory, newest first
    List,
    /// Delete an exported file
    Delete {
        /// File name or path inside the export directory
        file: PathBuf,
    },
}

pub async fn cmd(args: ExportArgs) -> Result<()> {
    let config = Config::read()?;
    let export_dir = config.export_dir();
    let db = open_db()?;
    let exporter = Exporter::new(&db, &export_dir)
        .with_access(Arc::new(DirectoryAccess::new(&export_dir)))
        .with_tag_delimiter(&config.tag_delimiter);

    match args.command.unwrap_or(ExportCommand::Json) {
        ExportCommand::Json => {
            let path = exporter.export_json().await?;
            msg_success!(Message::ExportCompleted(path.display().to_string()));
        }
        ExportCommand::Csv => {
            let path = exporter.export_csv().await?;
            msg_success!(Message::ExportCompleted(path.display().to_string()));
        }
        ExportCommand::List => {
            let files = exporter.exported_files()?;
            if files.is_empty() {
                msg_info!(Message::NoExportedFiles);
                return Ok(());
            }
            msg_print!(Message::ExportedFilesHeader, true);
            View::files(&files)?;
        }
        ExportCommand::Delete { file } => {
            let path = if file.is_relative() && file.parent().map_or(true, |p| p.as_os_str().is_empty()) {
                export_dir.join(&file)
            } else {
                file
            };
            exporter.delete_file(&path)?;
            msg_success!(Message::ExportFileDeleted(path.display().to_string()));
        }
    }
    Ok(())
}
