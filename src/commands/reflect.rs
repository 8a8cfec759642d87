use super::{date_arg, open_db, resolve_task};
use crate::db::reflections::Reflections;
use crate::db::tasks::Tasks;
use crate::libs::filter::{extract_unique_tags, has_active_filters, search_and_filter_tasks, DateRange, FilterOptions};
use crate::libs::messages::Message;
use crate::libs::reflection::NewReflection;
use crate::libs::task::parse_tag_list;
use crate::libs::view::View;
use crate::{msg_info, msg_print, msg_success};
use anyhow::Result;
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Input};

#[derive(Debug, Args)]
pub struct ReflectArgs {
    #[command(subcommand)]
    command: ReflectCommand,
}

#[derive(Debug, Subcommand)]
enum ReflectCommand {
    /// Write or replace the reflection of a task
    Add {
        task_id: String,
        /// Reflection text, prompted for when omitted
        content: Option<String>,
    },
    /// Show a task together with its reflection
    Show { task_id: String },
    /// Completed tasks with their reflections
    List {
        /// Keyword matched against title, description and reflection
        #[arg(short, long)]
        keyword: Option<String>,
        /// Comma separated tags, any of them matches
        #[arg(short, long)]
        tags: Option<String>,
        /// First completion day (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Last completion day (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Only tasks that have a reflection
        #[arg(long, conflicts_with = "without")]
        with: bool,
        /// Only tasks without a reflection
        #[arg(long)]
        without: bool,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Find reflections containing a keyword
    Search { keyword: String },
    /// Delete the reflection of a task
    Delete { task_id: String },
}

pub fn cmd(args: ReflectArgs) -> Result<()> {
    let db = open_db()?;
    let tasks = Tasks::new(&db);
    let reflections = Reflections::new(&db);

    match args.command {
        ReflectCommand::Add { task_id, content } => {
            let task = resolve_task(&tasks, &task_id)?;
            let content = match content {
                Some(content) => content,
                None => Input::with_theme(&ColorfulTheme::default())
                    .with_prompt(Message::PromptReflection.to_string())
                    .interact_text()?,
            };
            reflections.create(NewReflection::new(&task.id, &content))?;
            msg_success!(Message::ReflectionSaved(task.title));
            Ok(())
        }
        ReflectCommand::Show { task_id } => {
            let task = resolve_task(&tasks, &task_id)?;
            match reflections.get_task_with_reflection(&task.id)? {
                Some(item) => View::task(&item.task, item.reflection.as_ref()),
                None => {
                    msg_info!(Message::ReflectionNotFound(task_id));
                    Ok(())
                }
            }
        }
        ReflectCommand::List {
            keyword,
            tags,
            from,
            to,
            with,
            without,
            limit,
        } => {
            let date_range = match (from, to) {
                (Some(from), Some(to)) => Some(DateRange::new(date_arg(&from)?, date_arg(&to)?)),
                _ => None,
            };
            let filters = FilterOptions {
                date_range,
                tags: tags.map(|t| parse_tag_list(&t)),
                has_reflection: match (with, without) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            };

            let all = reflections.get_completed_tasks_with_reflections(None)?;
            let mut items = if has_active_filters(&filters) || keyword.is_some() {
                search_and_filter_tasks(&all, keyword.as_deref().unwrap_or_default(), &filters)
            } else {
                all
            };
            if let Some(limit) = limit {
                items.truncate(limit);
            }

            if items.is_empty() {
                msg_info!(Message::NoReflectionsFound);
                return Ok(());
            }
            View::reflections(&items)?;

            let tags = extract_unique_tags(&items);
            if !tags.is_empty() {
                msg_print!(Message::TagsInResults(tags.join(", ")));
            }
            Ok(())
        }
        ReflectCommand::Search { keyword } => {
            let found = reflections.search(&keyword)?;
            if found.is_empty() {
                msg_info!(Message::NoReflectionsFound);
                return Ok(());
            }
            View::reflections(&found)
        }
        ReflectCommand::Delete { task_id } => {
            let task = resolve_task(&tasks, &task_id)?;
            match reflections.get_by_task_id(&task.id)? {
                Some(reflection) => {
                    reflections.delete(&reflection.id)?;
                    msg_success!(Message::ReflectionDeleted(task.title));
                }
                None => msg_info!(Message::ReflectionNotFound(task_id)),
            }
            Ok(())
        }
    }
}
