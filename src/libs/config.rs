//! Configuration for the detter CLI.
//!
//! Settings are stored as pretty-printed JSON in `config.json` inside the
//! data directory (see [`DataStorage`]). A missing file means defaults, so the
//! application runs without any setup.
//!
//! ## Sections
//!
//! - **export**: where backups are written and how CSV tags are joined
//! - **reminders**: whether task reminders are reported by the CLI
//! - **stats**: how many buckets each completion-rate series shows
//!
//! ```rust,no_run
//! use detter::libs::config::Config;
//!
//! let config = Config::read()?;
//! println!("exports go to {}", config.export_dir().display());
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::db::statistics::{DEFAULT_DAYS, DEFAULT_MONTHS, DEFAULT_WEEKS};
use crate::libs::messages::Message;
use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const EXPORT_DIR_NAME: &str = "exports";
pub const DEFAULT_TAG_DELIMITER: &str = ";";

/// Bucket counts for the completion-rate charts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StatsConfig {
    pub daily_days: usize,
    pub weekly_weeks: usize,
    pub monthly_months: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            daily_days: DEFAULT_DAYS,
            weekly_weeks: DEFAULT_WEEKS,
            monthly_months: DEFAULT_MONTHS,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Backup directory. `None` means `exports/` in the data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,

    /// Separator placed between tags in the CSV `Tags` column.
    pub tag_delimiter: String,

    pub reminders_enabled: bool,

    pub stats: StatsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            export_dir: None,
            tag_delimiter: DEFAULT_TAG_DELIMITER.to_string(),
            reminders_enabled: false,
            stats: StatsConfig::default(),
        }
    }
}

impl Config {
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        Self::read_from(&config_file_path)
    }

    pub fn read_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_str).context(Message::ConfigParseError.to_string())?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        self.save_to(&config_file_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let config_file = File::create(path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Configured export directory, or `exports/` under the data directory.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| DataStorage::new().base_path().join(EXPORT_DIR_NAME))
    }

    /// Interactive setup, pre-filled with the current values.
    pub fn init() -> Result<Self> {
        let current = Self::read().unwrap_or_default();
        let theme = ColorfulTheme::default();

        let export_dir: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptExportDir.to_string())
            .default(current.export_dir().display().to_string())
            .interact_text()?;

        let tag_delimiter: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptTagDelimiter.to_string())
            .default(current.tag_delimiter.clone())
            .interact_text()?;

        let reminders_enabled = Confirm::with_theme(&theme)
            .with_prompt(Message::PromptRemindersEnabled.to_string())
            .default(current.reminders_enabled)
            .interact()?;

        let stats = StatsConfig {
            daily_days: Input::with_theme(&theme)
                .with_prompt(Message::PromptDailyDays.to_string())
                .default(current.stats.daily_days)
                .interact_text()?,
            weekly_weeks: Input::with_theme(&theme)
                .with_prompt(Message::PromptWeeklyWeeks.to_string())
                .default(current.stats.weekly_weeks)
                .interact_text()?,
            monthly_months: Input::with_theme(&theme)
                .with_prompt(Message::PromptMonthlyMonths.to_string())
                .default(current.stats.monthly_months)
                .interact_text()?,
        };

        Ok(Config {
            export_dir: Some(PathBuf::from(export_dir)),
            tag_delimiter,
            reminders_enabled,
            stats,
        })
    }
}
