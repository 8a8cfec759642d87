//! In-memory keyword search and structured filtering over joined task lists.
//!
//! Nothing here touches storage. Callers fetch
//! [`TaskWithReflection`] rows first (usually through
//! `Reflections::get_completed_tasks_with_reflections`) and then narrow them:
//!
//! 1. keyword stage: case-insensitive substring over title, description, tags
//!    and reflection content
//! 2. filter stage: completion date range, match-any tags and reflection
//!    presence, all ANDed
//!
//! ```rust
//! use detter::libs::filter::{search_and_filter_tasks, FilterOptions};
//! use detter::libs::reflection::TaskWithReflection;
//!
//! let rows: Vec<TaskWithReflection> = Vec::new();
//! assert!(search_and_filter_tasks(&rows, "", &FilterOptions::default()).is_empty());
//! ```

use crate::libs::formatter::{end_of_day, start_of_day, to_millis};
use crate::libs::reflection::TaskWithReflection;
use crate::libs::task::Task;
use chrono::NaiveDate;

/// Closed range of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// True when `ms` lies in `[start-of-start-day, end-of-end-day]`.
    pub fn contains_millis(&self, ms: i64) -> bool {
        ms >= start_of_day(self.start) && ms <= end_of_day(self.end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub date_range: Option<DateRange>,
    /// Match-any; an empty list applies no tag filter.
    pub tags: Option<Vec<String>>,
    pub has_reflection: Option<bool>,
}

pub fn search_tasks(tasks: &[TaskWithReflection], keyword: &str) -> Vec<TaskWithReflection> {
    let keyword = normalize_keyword(keyword);
    if keyword.is_empty() {
        return tasks.to_vec();
    }

    tasks.iter().filter(|row| matches_keyword(row, &keyword)).cloned().collect()
}

/// Trimmed and lowercased with full Unicode case folding.
pub(crate) fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

/// `keyword` must already be normalized.
pub(crate) fn contains_keyword(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(keyword)
}

/// Title, description or any single tag contains `keyword`.
pub(crate) fn task_matches_keyword(task: &Task, keyword: &str) -> bool {
    contains_keyword(&task.title, keyword)
        || task.description.as_deref().is_some_and(|d| contains_keyword(d, keyword))
        || task.tags.iter().any(|tag| contains_keyword(tag, keyword))
}

fn matches_keyword(row: &TaskWithReflection, keyword: &str) -> bool {
    task_matches_keyword(&row.task, keyword) || row.reflection.as_ref().is_some_and(|r| contains_keyword(&r.content, keyword))
}

pub fn filter_tasks(tasks: &[TaskWithReflection], filters: &FilterOptions) -> Vec<TaskWithReflection> {
    tasks.iter().filter(|row| matches_filters(row, filters)).cloned().collect()
}

fn matches_filters(row: &TaskWithReflection, filters: &FilterOptions) -> bool {
    if let Some(range) = &filters.date_range {
        match row.task.completed_at {
            Some(at) if range.contains_millis(to_millis(at)) => {}
            _ => return false,
        }
    }

    if let Some(tags) = filters.tags.as_ref().filter(|t| !t.is_empty()) {
        if !tags.iter().any(|wanted| row.task.tags.contains(wanted)) {
            return false;
        }
    }

    if let Some(wanted) = filters.has_reflection {
        if row.reflection.is_some() != wanted {
            return false;
        }
    }

    true
}

pub fn search_and_filter_tasks(tasks: &[TaskWithReflection], keyword: &str, filters: &FilterOptions) -> Vec<TaskWithReflection> {
    filter_tasks(&search_tasks(tasks, keyword), filters)
}

/// Trimmed, non-empty, sorted and deduplicated tags across `tasks`.
pub fn extract_unique_tags(tasks: &[TaskWithReflection]) -> Vec<String> {
    let mut tags: Vec<String> = tasks
        .iter()
        .flat_map(|row| row.task.tags.iter())
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

pub fn has_active_filters(filters: &FilterOptions) -> bool {
    filters.date_range.is_some() || filters.tags.as_ref().is_some_and(|t| !t.is_empty()) || filters.has_reflection.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::formatter::{from_millis, local_noon};
    use crate::libs::reflection::Reflection;
    use crate::libs::task::{Priority, Task};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn row(id: &str, title: &str, tags: &[&str], completed_on: Option<u32>, reflection: Option<&str>) -> TaskWithReflection {
        let at = local_noon(day(10));
        let task = Task {
            id: id.to_string(),
            title: title.to_string(),
            description: Some(format!("{} details", title)),
            priority: Priority::Urgent,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            subtasks: vec![],
            due_date: at,
            reminder_time: None,
            completed: completed_on.is_some(),
            completed_at: completed_on.map(|d| local_noon(day(d))),
            created_at: at,
            updated_at: at,
            order: 0,
            archived: false,
        };
        let reflection = reflection.map(|content| Reflection {
            id: format!("r-{}", id),
            task_id: id.to_string(),
            content: content.to_string(),
            created_at: at,
            updated_at: at,
        });
        TaskWithReflection::new(task, reflection)
    }

    fn sample() -> Vec<TaskWithReflection> {
        vec![
            row("1", "Draft report", &["work"], Some(15), Some("Went well")),
            row("2", "Buy milk", &["home", "errand"], Some(16), None),
            row("3", "Call mom", &["home"], None, None),
        ]
    }

    fn ids(rows: &[TaskWithReflection]) -> Vec<&str> {
        rows.iter().map(|r| r.task.id.as_str()).collect()
    }

    #[test]
    fn empty_criteria_is_identity() {
        let rows = sample();
        assert_eq!(search_and_filter_tasks(&rows, "   ", &FilterOptions::default()), rows);
        assert!(!has_active_filters(&FilterOptions::default()));
    }

    #[test]
    fn keyword_matches_every_text_field() {
        let rows = sample();
        assert_eq!(ids(&search_tasks(&rows, "REPORT")), vec!["1"]);
        assert_eq!(ids(&search_tasks(&rows, "errand")), vec!["2"]);
        assert_eq!(ids(&search_tasks(&rows, "went")), vec!["1"]);
        assert_eq!(ids(&search_tasks(&rows, "mom details")), vec!["3"]);
    }

    #[test]
    fn date_range_excludes_tasks_without_completion() {
        let rows = sample();
        let filters = FilterOptions {
            date_range: Some(DateRange::new(day(15), day(15))),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&rows, &filters)), vec!["1"]);
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let range = DateRange::new(day(15), day(16));
        assert!(range.contains_millis(start_of_day(day(15))));
        assert!(range.contains_millis(end_of_day(day(16))));
        assert!(!range.contains_millis(end_of_day(day(16)) + 1));
        assert!(from_millis(start_of_day(day(15))).is_some());
    }

    #[test]
    fn tags_match_any_and_unknown_tag_matches_nothing() {
        let rows = sample();
        let home = FilterOptions {
            tags: Some(vec!["home".to_string(), "nothing".to_string()]),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&rows, &home)), vec!["2", "3"]);

        let missing = FilterOptions {
            tags: Some(vec!["nope".to_string()]),
            ..Default::default()
        };
        assert!(filter_tasks(&rows, &missing).is_empty());

        let empty = FilterOptions {
            tags: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(filter_tasks(&rows, &empty).len(), 3);
        assert!(!has_active_filters(&empty));
    }

    #[test]
    fn reflection_presence_is_tri_state() {
        let rows = sample();
        let with = FilterOptions {
            has_reflection: Some(true),
            ..Default::default()
        };
        let without = FilterOptions {
            has_reflection: Some(false),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&rows, &with)), vec!["1"]);
        assert_eq!(ids(&filter_tasks(&rows, &without)), vec!["2", "3"]);
        assert!(has_active_filters(&with));
    }

    #[test]
    fn keyword_and_filters_compose() {
        let rows = sample();
        let filters = FilterOptions {
            tags: Some(vec!["home".to_string()]),
            ..Default::default()
        };
        assert_eq!(ids(&search_and_filter_tasks(&rows, "milk", &filters)), vec!["2"]);
        assert!(search_and_filter_tasks(&rows, "report", &filters).is_empty());
    }

    #[test]
    fn unique_tags_are_sorted() {
        let mut rows = sample();
        rows[2].task.tags.push("  ".to_string());
        rows[2].task.tags.push(" work ".to_string());
        assert_eq!(extract_unique_tags(&rows), vec!["errand", "home", "work"]);
    }
}
