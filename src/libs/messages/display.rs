//! Display implementation for detter messages.
//!
//! Single source of truth for the wording of every [`Message`]. Parameters
//! are interpolated here so call sites only carry typed data.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === DATABASE MESSAGES ===
            Message::DatabaseOpened(path) => format!("Database opened: {}", path),
            Message::DatabaseAlreadyOpen => "Database already initialized".to_string(),
            Message::DatabaseClosed => "Database closed".to_string(),
            Message::DatabaseDeleted(path) => format!("Database deleted: {}", path),
            Message::DatabaseNotInitialized => "Database is not initialized".to_string(),
            Message::DbInitFailed => "Failed to initialize database".to_string(),
            Message::DbCloseFailed => "Failed to close database".to_string(),
            Message::DbDeleteFailed => "Failed to delete database".to_string(),
            Message::DbStatementFailed => "SQL statement failed".to_string(),
            Message::DbTransactionFailed => "Database transaction failed".to_string(),
            Message::AllDataCleared => "All tasks and reflections have been cleared".to_string(),
            Message::ClearDataFailed => "Failed to clear data".to_string(),

            // === SCHEMA MESSAGES ===
            Message::SchemaUpToDate(version) => format!("Database schema is up to date (v{})", version),
            Message::ApplyingSchema(version, name) => format!("Applying schema v{}: {}", version, name),
            Message::SchemaApplied(version) => format!("Schema v{} applied", version),

            // === TASK MESSAGES ===
            Message::TaskCreated(id) => format!("Task created: {}", id),
            Message::TaskUpdated(id) => format!("Task updated: {}", id),
            Message::TaskDeleted(id) => format!("Task deleted: {}", id),
            Message::TaskCompleted(id) => format!("Task completed: {}", id),
            Message::TaskAlreadyCompleted(title) => format!("Task already completed: {}", title),
            Message::TaskUncompleted(id) => format!("Task marked as not completed: {}", id),
            Message::TaskArchived(id) => format!("Task archived: {}", id),
            Message::TaskNotFound(id) => format!("Task with ID {} not found", id),
            Message::AmbiguousTaskId(prefix) => format!("More than one task ID starts with '{}', use a longer prefix", prefix),
            Message::TaskOrdersUpdated(count) => format!("Updated order for {} task(s)", count),
            Message::TasksFoundForDate(count, date) => format!("Found {} task(s) for {}", count, date),
            Message::TasksFoundForKeyword(count, keyword) => format!("Found {} task(s) matching '{}'", count, keyword),
            Message::CompletedTasksFound(count) => format!("Found {} completed task(s)", count),
            Message::AllTasksFound(count) => format!("Found {} task(s) in total", count),
            Message::UniqueTagsFound(count) => format!("Found {} unique tag(s)", count),
            Message::TaskTitleRequired => "Task title must not be empty".to_string(),
            Message::SubtaskNotFound(id) => format!("Sub-task with ID {} not found", id),
            Message::TaskCreateFailed => "Failed to create task".to_string(),
            Message::TaskUpdateFailed => "Failed to update task".to_string(),
            Message::TaskDeleteFailed => "Failed to delete task".to_string(),
            Message::TaskQueryFailed => "Failed to load tasks".to_string(),
            Message::TaskCompleteFailed => "Failed to complete task".to_string(),
            Message::TaskUncompleteFailed => "Failed to mark task as not completed".to_string(),
            Message::TaskArchiveFailed => "Failed to archive task".to_string(),
            Message::TaskReorderFailed => "Failed to update task order".to_string(),
            Message::TaskSearchFailed => "Failed to search tasks".to_string(),
            Message::TagsQueryFailed => "Failed to load tags".to_string(),
            Message::TasksHeader(date) => format!("Tasks for {}:", date),
            Message::NoTasksForDate(date) => format!("No tasks for {}.", date),
            Message::NoTasksFound => "No tasks found.".to_string(),
            Message::TagListHeader => "Tags:".to_string(),
            Message::NoTagsFound => "No tags found.".to_string(),
            Message::ConfirmDeleteTask(title) => format!("Delete task '{}' and its reflection?", title),

            // === REMINDER MESSAGES ===
            Message::ReminderScheduled(id, time) => format!("Reminder for task {} scheduled at {}", id, time),
            Message::ReminderCancelled(id) => format!("Reminder for task {} cancelled", id),
            Message::ReminderScheduleFailed(id, error) => format!("Could not schedule reminder for task {}: {}", id, error),
            Message::ReminderCancelFailed(id, error) => format!("Could not cancel reminder for task {}: {}", id, error),

            // === REFLECTION MESSAGES ===
            Message::ReflectionCreated(id) => format!("Reflection created: {}", id),
            Message::ReflectionReplaced(task_id) => format!("Reflection for task {} replaced", task_id),
            Message::ReflectionUpdated(id) => format!("Reflection updated: {}", id),
            Message::ReflectionDeleted(id) => format!("Reflection deleted: {}", id),
            Message::ReflectionsDeletedForTask(task_id) => format!("Reflection deleted for task: {}", task_id),
            Message::ReflectionNotFound(id) => format!("No reflection found for {}", id),
            Message::ReflectionContentRequired => "Reflection content must not be empty".to_string(),
            Message::ReflectionsFound(count) => format!("Found {} reflection(s)", count),
            Message::ReflectionsFoundForKeyword(count, keyword) => format!("Found {} reflection(s) matching '{}'", count, keyword),
            Message::NoReflectionsFound => "No reflections found.".to_string(),
            Message::ReflectionSaved(title) => format!("Reflection saved for '{}'", title),
            Message::TagsInResults(tags) => format!("Tags: {}", tags),
            Message::ReflectionCreateFailed => "Failed to create reflection".to_string(),
            Message::ReflectionUpdateFailed => "Failed to update reflection".to_string(),
            Message::ReflectionDeleteFailed => "Failed to delete reflection".to_string(),
            Message::ReflectionQueryFailed => "Failed to load reflections".to_string(),
            Message::ReflectionSearchFailed => "Failed to search reflections".to_string(),
            Message::ReflectionCountFailed => "Failed to count reflections".to_string(),
            Message::PromptReflection => "How did it go? (leave empty to skip)".to_string(),

            // === STATISTICS MESSAGES ===
            Message::StatsQueryFailed => "Failed to calculate statistics".to_string(),
            Message::CompletionRateHeader(period) => format!("Completion rate ({})", period),
            Message::DistributionHeader => "Task distribution by priority".to_string(),
            Message::OverallStatsHeader => "Overview".to_string(),

            // === EXPORT / IMPORT MESSAGES ===
            Message::ExportCompleted(path) => format!("Data exported to {}", path),
            Message::ExportFailed => "Failed to export data".to_string(),
            Message::ExportedFilesHeader => "Exported files:".to_string(),
            Message::NoExportedFiles => "No exported files found.".to_string(),
            Message::ExportFileDeleted(path) => format!("Deleted {}", path),
            Message::ExportFileOutsideDir(path) => format!("'{}' is not an exported file in the export directory", path),
            Message::ImportResultSummary { tasks, reflections } => {
                format!("Imported {} task(s) and {} reflection(s)", tasks, reflections)
            }
            Message::ImportRejected => "Backup file was rejected, nothing was imported".to_string(),
            Message::StoragePermissionRequired => "Storage access is required to import or export data".to_string(),
            Message::ImportCompleted { tasks, reflections, errors } => format!(
                "Imported {} task(s) and {} reflection(s) with {} error(s)",
                tasks, reflections, errors
            ),
            Message::ImportEmptyDocument => "Import data is empty".to_string(),
            Message::ImportMissingVersion => "Import data has no version".to_string(),
            Message::ImportTasksNotArray => "Import data 'tasks' must be an array".to_string(),
            Message::ImportReflectionsNotArray => "Import data 'reflections' must be an array".to_string(),
            Message::ImportInvalidJson(error) => format!("Import file is not valid JSON: {}", error),
            Message::ImportTaskFailed(label, reason) => format!("Failed to import task {}: {}", label, reason),
            Message::ImportReflectionFailed(label, reason) => format!("Failed to import reflection {}: {}", label, reason),
            Message::ImportFailed => "Failed to import data".to_string(),
            Message::ImportErrorsHeader => "Records that could not be imported:".to_string(),

            // === VALIDATION MESSAGES ===
            Message::FieldMissing(field) => format!("missing field '{}'", field),
            Message::InvalidPriority(value) => format!("invalid priority '{}' (expected important, urgent or trivial)", value),
            Message::InvalidDate(value) => format!("invalid date '{}' (expected YYYY-MM-DD or 'today')", value),
            Message::InvalidTimestamp(value) => format!("invalid timestamp '{}'", value),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration removed, defaults will be used".to_string(),
            Message::ConfigParseError => "Failed to parse configuration".to_string(),
            Message::PromptExportDir => "Export directory".to_string(),
            Message::PromptTagDelimiter => "Tag delimiter for CSV export".to_string(),
            Message::PromptRemindersEnabled => "Enable reminders".to_string(),
            Message::PromptDailyDays => "Days in the daily completion chart".to_string(),
            Message::PromptWeeklyWeeks => "Weeks in the weekly completion chart".to_string(),
            Message::PromptMonthlyMonths => "Months in the monthly completion chart".to_string(),

            // === GENERIC MESSAGES ===
            Message::ConfirmClearAllData => "Delete ALL tasks and reflections? This cannot be undone.".to_string(),
            Message::OperationCancelled => "Operation cancelled.".to_string(),
            Message::UserStorageError => "Data operation failed, please try again".to_string(),
            Message::UserPermissionError => "A required permission is missing, please grant it and try again".to_string(),
            Message::UserUnknownError => "Something went wrong, please try again".to_string(),
        };

        write!(f, "{}", text)
    }
}
