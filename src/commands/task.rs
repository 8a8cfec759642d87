//! Task management command.
//!
//! Every subcommand takes task ids either in full or as the eight-character
//! prefix shown in the tables.

use super::{date_arg, open_db, resolve_task, task_repository};
use crate::db::reflections::Reflections;
use crate::db::tasks::Tasks;
use crate::libs::config::Config;
use crate::libs::formatter::{local_noon, parse_local_datetime};
use crate::libs::messages::Message;
use crate::libs::reflection::NewReflection;
use crate::libs::task::{parse_tag_list, NewTask, Priority, SubTask, Task};
use crate::libs::view::View;
use crate::{msg_error_anyhow, msg_info, msg_print, msg_success};
use anyhow::Result;
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    command: TaskCommand,
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    /// Create a task
    Add {
        /// Task title
        title: String,
        /// important, urgent or trivial
        #[arg(short, long, default_value = "urgent")]
        priority: String,
        /// Due day (YYYY-MM-DD, today, tomorrow or yesterday)
        #[arg(short, long, default_value = "today")]
        date: String,
        #[arg(long)]
        description: Option<String>,
        /// Comma separated tags
        #[arg(short, long)]
        tags: Option<String>,
        /// Reminder time (YYYY-MM-DD HH:MM, local)
        #[arg(short, long)]
        remind: Option<String>,
        /// Sub-task title, may be repeated
        #[arg(short, long = "subtask")]
        subtasks: Vec<String>,
    },
    /// List tasks for a day, or every task with --all
    List {
        #[arg(short, long, default_value = "today")]
        date: String,
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short, long, conflicts_with_all = ["date", "priority", "completed"])]
        all: bool,
        /// Completed tasks, most recent first
        #[arg(short, long, conflicts_with_all = ["date", "priority"])]
        completed: bool,
        #[arg(short, long, requires = "completed")]
        limit: Option<usize>,
    },
    /// Show one task with its sub-tasks and reflection
    Show { id: String },
    /// Change task fields
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
        /// Comma separated tags, replaces the current ones
        #[arg(short, long)]
        tags: Option<String>,
        #[arg(short, long, conflicts_with = "no_reminder")]
        remind: Option<String>,
        /// Remove the reminder
        #[arg(long)]
        no_reminder: bool,
    },
    /// Mark a task as completed
    Done {
        id: String,
        /// Reflection to save with the completion
        #[arg(short, long, conflicts_with = "skip_reflection")]
        reflection: Option<String>,
        /// Do not ask for a reflection
        #[arg(long)]
        skip_reflection: bool,
    },
    /// Mark a completed task as pending again
    Undo { id: String },
    /// Hide a task from day lists and statistics
    Archive { id: String },
    /// Delete a task and its reflection
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Set the order of a priority group, first id first
    Reorder {
        #[arg(short, long, default_value = "today")]
        date: String,
        #[arg(short, long)]
        priority: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Find tasks by title or description
    Search { keyword: String },
    /// List every tag in use
    Tags,
    /// Add a sub-task, or toggle one when an id is given
    Subtask {
        task_id: String,
        #[arg(short, long, conflicts_with = "toggle")]
        add: Option<String>,
        /// Sub-task id to toggle
        #[arg(short, long)]
        toggle: Option<String>,
    },
}

pub fn cmd(args: TaskArgs) -> Result<()> {
    let db = open_db()?;
    let config = Config::read()?;
    let tasks = task_repository(&db, &config);

    match args.command {
        TaskCommand::Add {
            title,
            priority,
            date,
            description,
            tags,
            remind,
            subtasks,
        } => {
            let priority: Priority = priority.parse()?;
            let date = date_arg(&date)?;
            let mut input = NewTask::new(&title, priority, local_noon(date))
                .order(tasks.next_order(date, priority)?)
                .subtasks(subtasks.iter().map(|s| SubTask::new(s)).collect());
            if let Some(description) = description {
                input = input.description(&description);
            }
            if let Some(tags) = tags {
                input = input.tags(parse_tag_list(&tags));
            }
            if let Some(remind) = remind {
                input = input.reminder(reminder_arg(&remind)?);
            }

            let task = tasks.create(input)?;
            msg_success!(Message::TaskCreated(task.id));
            Ok(())
        }
        TaskCommand::List {
            date,
            priority,
            all,
            completed,
            limit,
        } => {
            let (list, empty) = if all {
                (tasks.get_all()?, Message::NoTasksFound)
            } else if completed {
                (tasks.get_completed(limit)?, Message::NoTasksFound)
            } else {
                let date = date_arg(&date)?;
                let list = match priority {
                    Some(p) => tasks.get_by_priority(date, p.parse()?)?,
                    None => tasks.get_by_date(date)?,
                };
                msg_print!(Message::TasksHeader(date.to_string()), true);
                (list, Message::NoTasksForDate(date.to_string()))
            };

            if list.is_empty() {
                msg_info!(empty);
                return Ok(());
            }
            View::tasks(&list)
        }
        TaskCommand::Show { id } => {
            let task = resolve_task(&tasks, &id)?;
            let reflection = Reflections::new(&db).get_by_task_id(&task.id)?;
            View::task(&task, reflection.as_ref())
        }
        TaskCommand::Edit {
            id,
            title,
            description,
            priority,
            date,
            tags,
            remind,
            no_reminder,
        } => {
            let mut task = resolve_task(&tasks, &id)?;
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(description) = description {
                task.description = Some(description).filter(|d| !d.trim().is_empty());
            }
            if let Some(priority) = priority {
                task.priority = priority.parse()?;
            }
            if let Some(date) = date {
                task.due_date = local_noon(date_arg(&date)?);
            }
            if let Some(tags) = tags {
                task.tags = parse_tag_list(&tags);
            }
            if let Some(remind) = remind {
                task.reminder_time = Some(reminder_arg(&remind)?);
            }
            if no_reminder {
                task.reminder_time = None;
            }

            match tasks.update(&task)? {
                Some(task) => msg_success!(Message::TaskUpdated(task.id)),
                None => msg_info!(Message::TaskNotFound(id)),
            }
            Ok(())
        }
        TaskCommand::Done {
            id,
            reflection,
            skip_reflection,
        } => {
            let task = resolve_task(&tasks, &id)?;
            if !complete_once(&tasks, &task)? {
                msg_info!(Message::TaskAlreadyCompleted(task.title));
                return Ok(());
            }
            msg_success!(Message::TaskCompleted(task.title.clone()));

            let content = match reflection {
                Some(content) => content,
                None if skip_reflection => String::new(),
                None => Input::with_theme(&ColorfulTheme::default())
                    .with_prompt(Message::PromptReflection.to_string())
                    .allow_empty(true)
                    .interact_text()?,
            };
            if !content.trim().is_empty() {
                Reflections::new(&db).create(NewReflection::new(&task.id, &content))?;
                msg_success!(Message::ReflectionSaved(task.title));
            }
            Ok(())
        }
        TaskCommand::Undo { id } => {
            let task = resolve_task(&tasks, &id)?;
            tasks.uncomplete(&task.id)?;
            msg_success!(Message::TaskUncompleted(task.title));
            Ok(())
        }
        TaskCommand::Archive { id } => {
            let task = resolve_task(&tasks, &id)?;
            tasks.archive(&task.id)?;
            msg_success!(Message::TaskArchived(task.title));
            Ok(())
        }
        TaskCommand::Delete { id, yes } => {
            let task = resolve_task(&tasks, &id)?;
            let confirmed = yes
                || Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(Message::ConfirmDeleteTask(task.title.clone()).to_string())
                    .default(false)
                    .interact()?;
            if !confirmed {
                msg_info!(Message::OperationCancelled);
                return Ok(());
            }

            tasks.delete(&task.id)?;
            msg_success!(Message::TaskDeleted(task.title));
            Ok(())
        }
        TaskCommand::Reorder { date, priority, ids } => {
            let ids = ids
                .iter()
                .map(|id| resolve_task(&tasks, id).map(|t| t.id))
                .collect::<Result<Vec<_>>>()?;
            tasks.reorder(date_arg(&date)?, priority.parse()?, &ids)?;
            msg_success!(Message::TaskOrdersUpdated(ids.len()));
            Ok(())
        }
        TaskCommand::Search { keyword } => {
            let found = tasks.search(&keyword)?;
            if found.is_empty() {
                msg_info!(Message::NoTasksFound);
                return Ok(());
            }
            View::tasks(&found)
        }
        TaskCommand::Tags => {
            let tags = tasks.get_all_tags()?;
            if tags.is_empty() {
                msg_info!(Message::NoTagsFound);
                return Ok(());
            }
            msg_print!(Message::TagListHeader, true);
            View::tags(&tags)
        }
        TaskCommand::Subtask { task_id, add, toggle } => subtask(&tasks, &task_id, add, toggle),
    }
}

fn subtask(tasks: &Tasks, task_id: &str, add: Option<String>, toggle: Option<String>) -> Result<()> {
    let mut task = resolve_task(tasks, task_id)?;

    if let Some(title) = add {
        task.subtasks.push(SubTask::new(&title));
        if let Some(task) = tasks.update(&task)? {
            View::task(&task, None)?;
        }
        return Ok(());
    }

    if let Some(prefix) = toggle {
        let subtask_id = task
            .subtasks
            .iter()
            .find(|s| s.id.starts_with(&prefix))
            .map(|s| s.id.clone())
            .ok_or_else(|| msg_error_anyhow!(Message::SubtaskNotFound(prefix.clone())))?;
        if let Some(task) = tasks.toggle_subtask(&task.id, &subtask_id)? {
            View::task(&task, None)?;
        }
        return Ok(());
    }

    View::task(&task, None)
}

fn reminder_arg(input: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    parse_local_datetime(input).ok_or_else(|| msg_error_anyhow!(Message::InvalidTimestamp(input.to_string())))
}

/// Completes `task` unless it is already done, keeping the first completion
/// time. Returns whether anything changed.
fn complete_once(tasks: &Tasks, task: &Task) -> Result<bool> {
    if task.completed {
        return Ok(false);
    }
    Ok(tasks.complete(&task.id)?)
}
