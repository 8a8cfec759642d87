//! Read-only aggregates over tasks and reflections.
//!
//! Completion-rate series are built from consecutive buckets that end at the
//! reference day (today by default). Each bucket counts non-archived tasks
//! whose due date falls inside it with a single `COUNT(*)`/`SUM(completed)`
//! query. A bucket with no tasks reports a rate of `0.0`.
//!
//! | Series  | Bucket            | Label             | Default count |
//! |---------|-------------------|-------------------|---------------|
//! | daily   | local day         | `MM/dd`           | 7             |
//! | weekly  | Monday to Sunday  | `MM/dd` of Monday | 4             |
//! | monthly | calendar month    | `yyyy/MM`         | 6             |

use super::db::Db;
use crate::libs::error::{OperationContext, Result, StorageContext};
use crate::libs::formatter::{day_bounds, end_of_day, end_of_month, end_of_week, start_of_day, start_of_month, start_of_week, today};
use crate::libs::messages::Message;
use crate::libs::task::Priority;
use chrono::{Days, Months, NaiveDate};
use rusqlite::{params, Connection};
use serde::Serialize;

const BUCKET_COUNTS: &str = "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM tasks \
     WHERE due_date BETWEEN ?1 AND ?2 AND archived = 0";
const PRIORITY_COUNTS: &str = "SELECT priority, COUNT(*) FROM tasks WHERE archived = 0 GROUP BY priority";
const COMPLETED_COUNT: &str = "SELECT COUNT(*) FROM tasks WHERE completed = 1";
const REFLECTED_TASKS_COUNT: &str = "SELECT COUNT(DISTINCT task_id) FROM reflections";
const OVERALL_COUNTS: &str = "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM tasks WHERE archived = 0";

pub const DEFAULT_DAYS: usize = 7;
pub const DEFAULT_WEEKS: usize = 4;
pub const DEFAULT_MONTHS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRate {
    pub label: String,
    pub completed: usize,
    pub total: usize,
    pub rate: f64,
}

impl CompletionRate {
    fn new(label: String, completed: usize, total: usize) -> Self {
        let rate = if total > 0 { completed as f64 / total as f64 } else { 0.0 };
        CompletionRate { label, completed, total, rate }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskDistribution {
    pub important: usize,
    pub urgent: usize,
    pub trivial: usize,
}

impl TaskDistribution {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Important => self.important,
            Priority::Urgent => self.urgent,
            Priority::Trivial => self.trivial,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReflectionStats {
    pub with_reflection: usize,
    pub completed: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverallStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub today_tasks: usize,
    pub today_completed: usize,
}

fn count_window(conn: &Connection, start: i64, end: i64) -> Result<(usize, usize)> {
    let (total, completed): (i64, i64) = conn
        .query_row(BUCKET_COUNTS, params![start, end], |row| Ok((row.get(0)?, row.get(1)?)))
        .with_statement(BUCKET_COUNTS, &[&start, &end])?;
    Ok((total as usize, completed as usize))
}

fn count(conn: &Connection, sql: &str) -> Result<usize> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0)).with_statement(sql, &[])?;
    Ok(n as usize)
}

#[derive(Debug, Clone)]
pub struct Statistics {
    db: Db,
}

impl Statistics {
    pub fn new(db: &Db) -> Self {
        Statistics { db: db.clone() }
    }

    pub fn daily_completion_rate(&self, days: usize) -> Result<Vec<CompletionRate>> {
        self.daily_completion_rate_at(today(), days)
    }

    /// `days` buckets, oldest first, the last one being `today`.
    pub fn daily_completion_rate_at(&self, today: NaiveDate, days: usize) -> Result<Vec<CompletionRate>> {
        let buckets: Vec<(String, i64, i64)> = (0..days)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back as u64)))
            .map(|day| {
                let (start, end) = day_bounds(day);
                (day.format("%m/%d").to_string(), start, end)
            })
            .collect();
        self.rates(&buckets)
    }

    pub fn weekly_completion_rate(&self, weeks: usize) -> Result<Vec<CompletionRate>> {
        self.weekly_completion_rate_at(today(), weeks)
    }

    /// `weeks` Monday-based weeks, oldest first, the last one containing `today`.
    pub fn weekly_completion_rate_at(&self, today: NaiveDate, weeks: usize) -> Result<Vec<CompletionRate>> {
        let buckets: Vec<(String, i64, i64)> = (0..weeks)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back as u64 * 7)))
            .map(|day| {
                let monday = start_of_week(day);
                (monday.format("%m/%d").to_string(), start_of_day(monday), end_of_day(end_of_week(day)))
            })
            .collect();
        self.rates(&buckets)
    }

    pub fn monthly_completion_rate(&self, months: usize) -> Result<Vec<CompletionRate>> {
        self.monthly_completion_rate_at(today(), months)
    }

    /// `months` calendar months, oldest first, the last one containing `today`.
    pub fn monthly_completion_rate_at(&self, today: NaiveDate, months: usize) -> Result<Vec<CompletionRate>> {
        let current = start_of_month(today);
        let buckets: Vec<(String, i64, i64)> = (0..months)
            .rev()
            .filter_map(|back| current.checked_sub_months(Months::new(back as u32)))
            .map(|first| (first.format("%Y/%m").to_string(), start_of_day(first), end_of_day(end_of_month(first))))
            .collect();
        self.rates(&buckets)
    }

    fn rates(&self, buckets: &[(String, i64, i64)]) -> Result<Vec<CompletionRate>> {
        self.db
            .with_conn(|conn| {
                buckets
                    .iter()
                    .map(|(label, start, end)| -> Result<CompletionRate> {
                        let (total, completed) = count_window(conn, *start, *end)?;
                        Ok(CompletionRate::new(label.clone(), completed, total))
                    })
                    .collect()
            })
            .operation(Message::StatsQueryFailed)
    }

    /// Non-archived tasks per priority. Every priority is present.
    pub fn task_distribution(&self) -> Result<TaskDistribution> {
        self.db
            .with_conn(|conn| {
                let mut stmt = conn.prepare(PRIORITY_COUNTS).with_statement(PRIORITY_COUNTS, &[])?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get::<_, Priority>(0)?, row.get::<_, i64>(1)?)))
                    .with_statement(PRIORITY_COUNTS, &[])?;

                let mut distribution = TaskDistribution::default();
                for row in rows {
                    let (priority, n) = row.with_statement(PRIORITY_COUNTS, &[])?;
                    let n = n as usize;
                    match priority {
                        Priority::Important => distribution.important = n,
                        Priority::Urgent => distribution.urgent = n,
                        Priority::Trivial => distribution.trivial = n,
                    }
                }
                Ok(distribution)
            })
            .operation(Message::StatsQueryFailed)
    }

    /// Share of completed tasks (archived included) that have a reflection.
    pub fn reflection_stats(&self) -> Result<ReflectionStats> {
        self.db
            .with_conn(|conn| {
                let completed = count(conn, COMPLETED_COUNT)?;
                let with_reflection = count(conn, REFLECTED_TASKS_COUNT)?;
                let rate = if completed > 0 { with_reflection as f64 / completed as f64 } else { 0.0 };
                Ok(ReflectionStats {
                    with_reflection,
                    completed,
                    rate,
                })
            })
            .operation(Message::StatsQueryFailed)
    }

    pub fn overall_stats(&self) -> Result<OverallStats> {
        self.overall_stats_at(today())
    }

    pub fn overall_stats_at(&self, today: NaiveDate) -> Result<OverallStats> {
        let (start, end) = day_bounds(today);
        self.db
            .with_conn(|conn| {
                let (total_tasks, completed_tasks): (i64, i64) = conn
                    .query_row(OVERALL_COUNTS, [], |row| Ok((row.get(0)?, row.get(1)?)))
                    .with_statement(OVERALL_COUNTS, &[])?;
                let (today_tasks, today_completed) = count_window(conn, start, end)?;
                Ok(OverallStats {
                    total_tasks: total_tasks as usize,
                    completed_tasks: completed_tasks as usize,
                    today_tasks,
                    today_completed,
                })
            })
            .operation(Message::StatsQueryFailed)
    }
}
