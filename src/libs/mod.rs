//! Library modules shared by the repositories and the CLI.
//!
//! ## Features
//!
//! - **Domain types**: tasks, sub-tasks, reflections
//! - **Infrastructure**: configuration, data storage location, errors, messaging
//! - **Data exchange**: JSON and CSV export, tolerant JSON import
//! - **Presentation**: in-memory filtering, console tables, date formatting
//! - **Platform seams**: reminder scheduling and storage access gates
//!
//! ## Usage
//!
//! ```rust,no_run
//! use detter::db::{db::Db, tasks::Tasks};
//! use detter::libs::formatter::local_noon;
//! use detter::libs::task::{NewTask, Priority};
//!
//! let db = Db::new()?;
//! db.init()?;
//! let due = local_noon(chrono::Local::now().date_naive());
//! Tasks::new(&db).create(NewTask::new("Write weekly notes", Priority::Urgent, due))?;
//! # Ok::<(), detter::libs::error::AppError>(())
//! ```

pub mod access;
pub mod config;
pub mod data_storage;
pub mod error;
pub mod export;
pub mod filter;
pub mod formatter;
pub mod import;
pub mod messages;
pub mod reflection;
pub mod reminder;
pub mod task;
pub mod view;
