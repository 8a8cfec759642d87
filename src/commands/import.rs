use super::open_db;
use crate::libs::access::DirectoryAccess;
use crate::libs::config::Config;
use crate::libs::import::Importer;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_print, msg_success, msg_warning};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// JSON backup written by `detter export`
    file: PathBuf,
}

pub async fn cmd(args: ImportArgs) -> Result<()> {
    let config = Config::read()?;
    let db = open_db()?;
    let importer = Importer::new(&db).with_access(Arc::new(DirectoryAccess::new(config.export_dir())));

    let result = importer.import_json(&args.file).await?;
    if !result.success {
        for error in &result.errors {
            msg_warning!(error);
        }
        msg_bail_anyhow!(Message::ImportRejected);
    }

    msg_success!(Message::ImportResultSummary {
        tasks: result.tasks_imported,
        reflections: result.reflections_imported,
    });
    if !result.errors.is_empty() {
        msg_print!(Message::ImportErrorsHeader, true);
        for error in &result.errors {
            msg_warning!(error);
        }
    }
    Ok(())
}
