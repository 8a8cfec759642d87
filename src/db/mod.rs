//! Persistence layer built on SQLite.
//!
//! One [`db::Db`] handle owns the connection. The repositories borrow it:
//!
//! - [`tasks::Tasks`]: task CRUD, ordering, completion, search and tags
//! - [`reflections::Reflections`]: one reflection per task, joined views
//! - [`statistics::Statistics`]: completion rates and distributions
//!
//! Schema changes are versioned in [`schema`] and applied by [`db::Db::init`].
//!
//! ```rust
//! use detter::db::{db::Db, reflections::Reflections, tasks::Tasks};
//! use detter::libs::formatter::{local_noon, today};
//! use detter::libs::reflection::NewReflection;
//! use detter::libs::task::{NewTask, Priority};
//!
//! let db = Db::in_memory();
//! db.init()?;
//! let task = Tasks::new(&db).create(NewTask::new("Review PR", Priority::Important, local_noon(today())))?;
//! Reflections::new(&db).create(NewReflection::new(&task.id, "Went smoothly"))?;
//! # Ok::<(), detter::libs::error::AppError>(())
//! ```

/// Connection handle, transactions and shared row helpers.
pub mod db;

/// Reflection repository.
pub mod reflections;

/// Versioned schema migrations.
pub mod schema;

/// Read-only aggregates for the statistics views.
pub mod statistics;

/// Task repository.
pub mod tasks;
