#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use detter::db::db::Db;
    use detter::db::reflections::Reflections;
    use detter::db::tasks::Tasks;
    use detter::libs::error::ErrorKind;
    use detter::libs::formatter::{day_bounds, from_millis, local_noon};
    use detter::libs::reflection::NewReflection;
    use detter::libs::reminder::{ReminderResult, ReminderScheduler};
    use detter::libs::task::{NewTask, Priority, SubTask, TaskOrder};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct TaskTestContext {
        _temp_dir: TempDir,
        db: Db,
    }

    impl TestContext for TaskTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db = Db::open(temp_dir.path().join("detter.db"));
            db.init().unwrap();
            TaskTestContext { _temp_dir: temp_dir, db }
        }

        fn teardown(self) {
            self.db.close().unwrap();
        }
    }

    #[derive(Debug, Default)]
    struct RecordingReminders {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingReminders {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ReminderScheduler for RecordingReminders {
        fn schedule_reminder(&self, task_id: &str, _title: &str, _time: chrono::DateTime<chrono::Utc>) -> ReminderResult {
            self.calls.lock().unwrap().push(format!("schedule:{}", task_id));
            Ok(())
        }

        fn cancel_reminder(&self, task_id: &str) -> ReminderResult {
            self.calls.lock().unwrap().push(format!("cancel:{}", task_id));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct BrokenReminders;

    impl ReminderScheduler for BrokenReminders {
        fn schedule_reminder(&self, _: &str, _: &str, _: chrono::DateTime<chrono::Utc>) -> ReminderResult {
            Err("notifications disabled".to_string())
        }

        fn cancel_reminder(&self, _: &str) -> ReminderResult {
            Err("notifications disabled".to_string())
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_create_round_trip(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let input = NewTask::new("  Draft report ", Priority::Important, local_noon(day()))
            .description("Quarterly numbers")
            .tags(["work", " work", "finance", ""])
            .subtasks(vec![SubTask::new("Collect data"), SubTask::new("Write summary")])
            .order(3);

        let created = tasks.create(input).unwrap();
        assert_eq!(created.title, "Draft report");
        assert_eq!(created.tags, vec!["work", "finance"]);
        assert_eq!(created.created_at, created.updated_at);
        assert!(!created.completed);
        assert!(created.completed_at.is_none());

        let stored = tasks.get_by_id(&created.id).unwrap().unwrap();
        assert_eq!(stored, created);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_round_trip_keeps_millisecond_precision(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let due = local_noon(day()) + Duration::microseconds(1_234);
        let created = tasks
            .create(
                NewTask::new("Precise", Priority::Urgent, due)
                    .reminder(due + Duration::nanoseconds(999))
                    .completed_at(due + Duration::microseconds(5)),
            )
            .unwrap();

        assert_eq!(created.due_date, local_noon(day()) + Duration::milliseconds(1));
        assert_eq!(tasks.get_by_id(&created.id).unwrap().unwrap(), created);

        let mut edited = created.clone();
        edited.due_date = due + Duration::microseconds(777);
        let updated = tasks.update(&edited).unwrap().unwrap();
        assert_eq!(tasks.get_by_id(&created.id).unwrap().unwrap(), updated);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_create_rejects_blank_title(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let err = tasks.create(NewTask::new("   ", Priority::Trivial, local_noon(day()))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(tasks.get_all().unwrap().is_empty());
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_completion_invariant(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let task = tasks.create(NewTask::new("Pay rent", Priority::Urgent, local_noon(day()))).unwrap();

        assert!(tasks.complete(&task.id).unwrap());
        let done = tasks.get_by_id(&task.id).unwrap().unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());

        assert!(tasks.uncomplete(&task.id).unwrap());
        let pending = tasks.get_by_id(&task.id).unwrap().unwrap();
        assert!(!pending.completed);
        assert!(pending.completed_at.is_none());

        let mut edited = pending.clone();
        edited.completed = true;
        let updated = tasks.update(&edited).unwrap().unwrap();
        assert!(updated.completed_at.is_some());

        let mut reopened = updated.clone();
        reopened.completed = false;
        let updated = tasks.update(&reopened).unwrap().unwrap();
        assert!(updated.completed_at.is_none());
        assert_eq!(tasks.get_by_id(&task.id).unwrap().unwrap(), updated);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_missing_ids_are_not_errors(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let ghost = tasks.create(NewTask::new("Ghost", Priority::Trivial, local_noon(day()))).unwrap();
        assert!(tasks.delete(&ghost.id).unwrap());

        assert!(tasks.get_by_id(&ghost.id).unwrap().is_none());
        assert!(tasks.update(&ghost).unwrap().is_none());
        assert!(!tasks.complete(&ghost.id).unwrap());
        assert!(!tasks.uncomplete(&ghost.id).unwrap());
        assert!(!tasks.archive(&ghost.id).unwrap());
        assert!(!tasks.delete(&ghost.id).unwrap());
        assert!(tasks.toggle_subtask(&ghost.id, "nope").unwrap().is_none());
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_day_window_is_inclusive(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let (start, end) = day_bounds(day());
        let at = |ms: i64| from_millis(ms).unwrap();

        let first = tasks.create(NewTask::new("Midnight", Priority::Urgent, at(start)).order(0)).unwrap();
        let last = tasks.create(NewTask::new("Last ms", Priority::Urgent, at(end)).order(1)).unwrap();
        tasks.create(NewTask::new("Day before", Priority::Urgent, at(start - 1))).unwrap();
        tasks.create(NewTask::new("Day after", Priority::Urgent, at(end + 1))).unwrap();
        tasks
            .create(NewTask::new("Archived", Priority::Urgent, local_noon(day())).archived(true))
            .unwrap();

        let ids: Vec<String> = tasks.get_by_date(day()).unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first.id, last.id]);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_day_groups_by_priority_then_order(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let due = local_noon(day());
        tasks.create(NewTask::new("t1", Priority::Trivial, due).order(0)).unwrap();
        tasks.create(NewTask::new("u2", Priority::Urgent, due).order(2)).unwrap();
        tasks.create(NewTask::new("i1", Priority::Important, due).order(1)).unwrap();
        tasks.create(NewTask::new("u1", Priority::Urgent, due).order(1)).unwrap();
        tasks.create(NewTask::new("i0", Priority::Important, due).order(0)).unwrap();

        let titles: Vec<String> = tasks.get_by_date(day()).unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["i0", "i1", "u1", "u2", "t1"]);

        let urgent: Vec<String> = tasks
            .get_by_priority(day(), Priority::Urgent)
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(urgent, vec!["u1", "u2"]);
        assert_eq!(tasks.next_order(day(), Priority::Urgent).unwrap(), 3);
        assert_eq!(tasks.next_order(day(), Priority::Important).unwrap(), 2);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_reorder_renumbers_group_densely(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let due = local_noon(day());
        let a = tasks.create(NewTask::new("a", Priority::Urgent, due).order(5)).unwrap();
        let b = tasks.create(NewTask::new("b", Priority::Urgent, due).order(9)).unwrap();
        let c = tasks.create(NewTask::new("c", Priority::Urgent, due).order(20)).unwrap();
        let hidden = tasks
            .create(NewTask::new("hidden", Priority::Urgent, due).order(1).archived(true))
            .unwrap();
        let other = tasks.create(NewTask::new("other", Priority::Important, due).order(7)).unwrap();

        tasks
            .reorder(day(), Priority::Urgent, &[c.id.clone(), a.id.clone(), "missing".to_string()])
            .unwrap();

        let group: Vec<(String, i64)> = tasks
            .get_by_priority(day(), Priority::Urgent)
            .unwrap()
            .into_iter()
            .map(|t| (t.id, t.order))
            .collect();
        assert_eq!(group, vec![(c.id.clone(), 0), (a.id.clone(), 1), (b.id.clone(), 2)]);
        assert_eq!(tasks.get_by_id(&hidden.id).unwrap().unwrap().order, 1);
        assert_eq!(tasks.get_by_id(&other.id).unwrap().unwrap().order, 7);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_update_orders_moves_and_compacts(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let due = local_noon(day());
        let a = tasks.create(NewTask::new("a", Priority::Trivial, due).order(0)).unwrap();
        tasks.create(NewTask::new("b", Priority::Trivial, due).order(1)).unwrap();
        tasks.create(NewTask::new("c", Priority::Trivial, due).order(2)).unwrap();

        tasks
            .update_orders(&[TaskOrder::new(&a.id, 10), TaskOrder::new("missing", 0)])
            .unwrap();

        let order: Vec<(String, i64)> = tasks
            .get_by_priority(day(), Priority::Trivial)
            .unwrap()
            .into_iter()
            .map(|t| (t.title, t.order))
            .collect();
        assert_eq!(order, vec![("b".to_string(), 0), ("c".to_string(), 1), ("a".to_string(), 2)]);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_delete_cascades_to_reflection(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let reflections = Reflections::new(&ctx.db);
        let task = tasks
            .create(NewTask::new("Ship release", Priority::Important, local_noon(day())))
            .unwrap();
        tasks.complete(&task.id).unwrap();
        reflections.create(NewReflection::new(&task.id, "Smooth rollout")).unwrap();

        assert!(tasks.delete(&task.id).unwrap());
        assert!(reflections.get_by_task_id(&task.id).unwrap().is_none());
        assert_eq!(reflections.count().unwrap(), 0);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_search_is_literal_and_case_insensitive(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let due = local_noon(day());
        tasks.create(NewTask::new("Claim 50% discount", Priority::Trivial, due)).unwrap();
        tasks.create(NewTask::new("Claim 500 points", Priority::Trivial, due)).unwrap();
        tasks
            .create(NewTask::new("Call bank", Priority::Urgent, due).description("Ask about the MORTGAGE"))
            .unwrap();
        tasks
            .create(NewTask::new("Garden", Priority::Trivial, due).tags(["Outdoor"]))
            .unwrap();
        tasks
            .create(NewTask::new("Old mortgage notes", Priority::Trivial, due).archived(true))
            .unwrap();

        let titles = |keyword: &str| -> Vec<String> { tasks.search(keyword).unwrap().into_iter().map(|t| t.title).collect() };
        assert_eq!(titles("50%"), vec!["Claim 50% discount"]);
        assert_eq!(titles("mortgage"), vec!["Call bank"]);
        assert_eq!(titles("outdoor"), vec!["Garden"]);
        assert!(titles("nothing like this").is_empty());
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_search_folds_non_ascii_case(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let due = local_noon(day());
        tasks.create(NewTask::new("Übung", Priority::Urgent, due)).unwrap();
        tasks
            .create(NewTask::new("Groceries", Priority::Trivial, due).description("ÄPFEL und Birnen"))
            .unwrap();
        tasks.create(NewTask::new("Trip", Priority::Trivial, due).tags(["Ωmega"])).unwrap();

        let titles = |keyword: &str| -> Vec<String> { tasks.search(keyword).unwrap().into_iter().map(|t| t.title).collect() };
        assert_eq!(titles("Übung"), vec!["Übung"]);
        assert_eq!(titles("übung"), vec!["Übung"]);
        assert_eq!(titles("äpfel"), vec!["Groceries"]);
        assert_eq!(titles("ωMEGA"), vec!["Trip"]);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_search_matches_tags_one_by_one(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let due = local_noon(day());
        tasks
            .create(NewTask::new("Tagged", Priority::Urgent, due).tags(["work", "home"]))
            .unwrap();

        assert!(tasks.search("\",\"").unwrap().is_empty());
        assert!(tasks.search("\"").unwrap().is_empty());
        assert!(tasks.search("work\",\"home").unwrap().is_empty());
        assert_eq!(tasks.search("HOME").unwrap().len(), 1);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_all_tags_skip_archived(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let due = local_noon(day());
        tasks.create(NewTask::new("a", Priority::Urgent, due).tags(["work", " home "])).unwrap();
        tasks.create(NewTask::new("b", Priority::Urgent, due).tags(["work", "errand"])).unwrap();
        tasks
            .create(NewTask::new("c", Priority::Urgent, due).tags(["secret"]).archived(true))
            .unwrap();

        assert_eq!(tasks.get_all_tags().unwrap(), vec!["errand", "home", "work"]);
        assert_eq!(tasks.get_all().unwrap().len(), 3);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_archive_hides_from_day_lists(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let task = tasks.create(NewTask::new("Old chore", Priority::Trivial, local_noon(day()))).unwrap();

        assert!(tasks.archive(&task.id).unwrap());
        assert!(tasks.get_by_date(day()).unwrap().is_empty());
        assert!(tasks.get_by_id(&task.id).unwrap().unwrap().archived);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_completed_list_is_newest_first(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let due = local_noon(day());
        let earlier = from_millis(1_736_900_000_000).unwrap();
        let later = from_millis(1_736_990_000_000).unwrap();
        tasks.create(NewTask::new("first", Priority::Urgent, due).completed_at(earlier)).unwrap();
        tasks.create(NewTask::new("second", Priority::Urgent, due).completed_at(later)).unwrap();
        tasks.create(NewTask::new("open", Priority::Urgent, due)).unwrap();

        let titles: Vec<String> = tasks.get_completed(None).unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(tasks.get_completed(Some(1)).unwrap().len(), 1);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_toggle_subtask(ctx: &mut TaskTestContext) {
        let tasks = Tasks::new(&ctx.db);
        let task = tasks
            .create(NewTask::new("Move", Priority::Important, local_noon(day())).subtasks(vec![SubTask::new("Pack")]))
            .unwrap();
        let subtask_id = task.subtasks[0].id.clone();

        let toggled = tasks.toggle_subtask(&task.id, &subtask_id).unwrap().unwrap();
        assert!(toggled.subtasks[0].completed);
        assert_eq!(toggled.subtask_progress(), (1, 1));

        let err = tasks.toggle_subtask(&task.id, "missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_reminders_follow_task_lifecycle(ctx: &mut TaskTestContext) {
        let recorder = Arc::new(RecordingReminders::default());
        let tasks = Tasks::with_reminders(&ctx.db, recorder.clone());
        let due = local_noon(day());

        tasks.create(NewTask::new("No reminder", Priority::Trivial, due)).unwrap();
        assert!(recorder.calls().is_empty());

        let task = tasks.create(NewTask::new("Call mom", Priority::Urgent, due).reminder(due)).unwrap();
        tasks.update(&task).unwrap();
        tasks.complete(&task.id).unwrap();

        let id = &task.id;
        assert_eq!(
            recorder.calls(),
            vec![
                format!("schedule:{}", id),
                format!("cancel:{}", id),
                format!("schedule:{}", id),
                format!("cancel:{}", id),
            ]
        );
    }

    #[test_context(TaskTestContext)]
    #[test]
    fn test_reminder_failures_do_not_fail_writes(ctx: &mut TaskTestContext) {
        let tasks = Tasks::with_reminders(&ctx.db, Arc::new(BrokenReminders));
        let due = local_noon(day());
        let task = tasks.create(NewTask::new("Dentist", Priority::Urgent, due).reminder(due)).unwrap();

        assert!(tasks.complete(&task.id).unwrap());
        assert!(tasks.delete(&task.id).unwrap());
    }
}
