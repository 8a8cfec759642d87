//! Boundary to the reminder (notification) scheduler.
//!
//! The task repository calls into a [`ReminderScheduler`] after writes. A
//! failure on this side is logged and never fails the task operation.

use crate::libs::messages::Message;
use crate::{msg_debug, msg_info};
use chrono::{DateTime, Utc};
use std::fmt::Debug;

pub type ReminderResult = std::result::Result<(), String>;

pub trait ReminderScheduler: Send + Sync + Debug {
    fn schedule_reminder(&self, task_id: &str, title: &str, time: DateTime<Utc>) -> ReminderResult;
    fn cancel_reminder(&self, task_id: &str) -> ReminderResult;
}

/// Accepts every call and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReminders;

impl ReminderScheduler for NoopReminders {
    fn schedule_reminder(&self, _task_id: &str, _title: &str, _time: DateTime<Utc>) -> ReminderResult {
        Ok(())
    }

    fn cancel_reminder(&self, _task_id: &str) -> ReminderResult {
        Ok(())
    }
}

/// Reports reminder changes through the message macros. Used by the CLI when
/// reminders are enabled in the config.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReminders;

impl ReminderScheduler for LogReminders {
    fn schedule_reminder(&self, task_id: &str, _title: &str, time: DateTime<Utc>) -> ReminderResult {
        msg_info!(Message::ReminderScheduled(task_id.to_string(), crate::libs::formatter::format_local(time)));
        Ok(())
    }

    fn cancel_reminder(&self, task_id: &str) -> ReminderResult {
        msg_debug!(Message::ReminderCancelled(task_id.to_string()));
        Ok(())
    }
}
