use super::formatter::{format_local, format_rate};
use super::reflection::{Reflection, TaskWithReflection};
use super::task::Task;
use crate::db::statistics::{CompletionRate, OverallStats, ReflectionStats, TaskDistribution};
use crate::libs::task::Priority;
use anyhow::Result;
use prettytable::{row, Table};
use std::path::PathBuf;

const PREVIEW_LEN: usize = 60;

pub struct View {}

impl View {
    pub fn tasks(tasks: &[Task]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "TITLE", "PRIORITY", "DUE", "TAGS", "SUBTASKS", "STATUS"]);
        for task in tasks {
            let (done, total) = task.subtask_progress();
            table.add_row(row![
                short_id(&task.id),
                task.title,
                task.priority,
                format_local(task.due_date),
                task.tags.join(", "),
                if total > 0 { format!("{}/{}", done, total) } else { String::new() },
                status(task)
            ]);
        }
        table.printstd();

        Ok(())
    }

    pub fn task(task: &Task, reflection: Option<&Reflection>) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", task.id]);
        table.add_row(row!["TITLE", task.title]);
        table.add_row(row!["DESCRIPTION", task.description.clone().unwrap_or_default()]);
        table.add_row(row!["PRIORITY", task.priority]);
        table.add_row(row!["TAGS", task.tags.join(", ")]);
        table.add_row(row!["DUE", format_local(task.due_date)]);
        table.add_row(row!["REMINDER", task.reminder_time.map(format_local).unwrap_or_default()]);
        table.add_row(row!["STATUS", status(task)]);
        table.add_row(row!["COMPLETED AT", task.completed_at.map(format_local).unwrap_or_default()]);
        table.add_row(row!["ORDER", task.order]);
        for subtask in &task.subtasks {
            let mark = if subtask.completed { "[x]" } else { "[ ]" };
            table.add_row(row![format!("SUBTASK {}", short_id(&subtask.id)), format!("{} {}", mark, subtask.title)]);
        }
        if let Some(reflection) = reflection {
            table.add_row(row!["REFLECTION", reflection.content]);
        }
        table.printstd();

        Ok(())
    }

    pub fn reflections(items: &[TaskWithReflection]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["TASK ID", "TASK", "COMPLETED AT", "REFLECTION"]);
        for item in items {
            let preview = item.reflection.as_ref().map(|r| preview(&r.content)).unwrap_or_default();
            table.add_row(row![
                short_id(&item.task.id),
                item.task.title,
                item.task.completed_at.map(format_local).unwrap_or_default(),
                preview
            ]);
        }
        table.printstd();

        Ok(())
    }

    pub fn completion_rates(rates: &[CompletionRate]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["PERIOD", "COMPLETED", "TOTAL", "RATE"]);
        for rate in rates {
            table.add_row(row![rate.label, rate.completed, rate.total, format_rate(rate.rate)]);
        }
        table.printstd();

        Ok(())
    }

    pub fn distribution(distribution: &TaskDistribution) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["PRIORITY", "TASKS"]);
        for priority in Priority::ALL {
            table.add_row(row![priority, distribution.get(priority)]);
        }
        table.printstd();

        Ok(())
    }

    pub fn overview(overall: &OverallStats, reflections: &ReflectionStats) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["Total tasks", overall.total_tasks]);
        table.add_row(row!["Completed", overall.completed_tasks]);
        table.add_row(row!["Due today", overall.today_tasks]);
        table.add_row(row!["Completed today", overall.today_completed]);
        table.add_row(row![
            "Reflected",
            format!("{}/{} ({})", reflections.with_reflection, reflections.completed, format_rate(reflections.rate))
        ]);
        table.printstd();

        Ok(())
    }

    pub fn tags(tags: &[String]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["TAG"]);
        for tag in tags {
            table.add_row(row![tag]);
        }
        table.printstd();

        Ok(())
    }

    pub fn files(files: &[PathBuf]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["#", "FILE"]);
        for (i, file) in files.iter().enumerate() {
            table.add_row(row![i + 1, file.display()]);
        }
        table.printstd();

        Ok(())
    }
}

fn status(task: &Task) -> &'static str {
    match (task.archived, task.completed) {
        (true, _) => "archived",
        (false, true) => "done",
        (false, false) => "pending",
    }
}

/// First eight characters of a UUID, enough to pick a row by eye.
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn preview(content: &str) -> String {
    let line = content.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_LEN {
        format!("{}…", line.chars().take(PREVIEW_LEN).collect::<String>())
    } else {
        line.to_string()
    }
}
