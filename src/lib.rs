//! # Detter - daily tasks and reflections
//!
//! A command-line planner that keeps prioritized daily tasks and a short
//! reflection per completed task in a local SQLite database.
//!
//! ## Features
//!
//! - **Tasks**: priorities, tags, sub-tasks, reminders, manual ordering
//! - **Reflections**: one note per task, searchable
//! - **Statistics**: daily, weekly and monthly completion rates
//! - **Backup**: JSON export and import, CSV export for spreadsheets
//!
//! ## Usage
//!
//! ```rust,no_run
//! use detter::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
