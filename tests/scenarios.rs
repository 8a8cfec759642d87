#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use detter::db::db::Db;
    use detter::db::reflections::Reflections;
    use detter::db::tasks::Tasks;
    use detter::libs::filter::{search_and_filter_tasks, DateRange, FilterOptions};
    use detter::libs::formatter::{local_date, local_noon};
    use detter::libs::reflection::NewReflection;
    use detter::libs::task::{NewTask, Priority};
    use test_context::{test_context, TestContext};

    struct ScenarioContext {
        db: Db,
    }

    impl TestContext for ScenarioContext {
        fn setup() -> Self {
            let db = Db::in_memory();
            db.init().unwrap();
            ScenarioContext { db }
        }
    }

    #[test_context(ScenarioContext)]
    #[test]
    fn test_complete_then_reflect(ctx: &mut ScenarioContext) {
        let tasks = Tasks::new(&ctx.db);
        let reflections = Reflections::new(&ctx.db);
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        let task = tasks.create(NewTask::new("Draft report", Priority::Important, local_noon(day))).unwrap();
        assert!(tasks.complete(&task.id).unwrap());

        let done = tasks.get_by_id(&task.id).unwrap().unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());
        assert_eq!(local_date(done.due_date), day);

        reflections.create(NewReflection::new(&task.id, "went well")).unwrap();
        let joined = reflections.get_task_with_reflection(&task.id).unwrap().unwrap();
        assert_eq!(joined.task, done);
        assert_eq!(joined.reflection.unwrap().content, "went well");
    }

    #[test_context(ScenarioContext)]
    #[test]
    fn test_filtering_completed_history(ctx: &mut ScenarioContext) {
        let tasks = Tasks::new(&ctx.db);
        let reflections = Reflections::new(&ctx.db);
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        let gym = tasks
            .create(NewTask::new("Gym", Priority::Urgent, local_noon(day)).tags(["health"]))
            .unwrap();
        let report = tasks
            .create(NewTask::new("Report", Priority::Important, local_noon(day)).tags(["work"]))
            .unwrap();
        tasks.complete(&gym.id).unwrap();
        tasks.complete(&report.id).unwrap();
        reflections.create(NewReflection::new(&gym.id, "Leg day")).unwrap();

        let history = reflections.get_completed_tasks_with_reflections(None).unwrap();
        assert_eq!(search_and_filter_tasks(&history, "", &FilterOptions::default()), history);

        let health = FilterOptions {
            tags: Some(vec!["health".to_string()]),
            ..FilterOptions::default()
        };
        let found = search_and_filter_tasks(&history, "leg", &health);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task.id, gym.id);

        let unknown_tag = FilterOptions {
            tags: Some(vec!["travel".to_string()]),
            ..FilterOptions::default()
        };
        assert!(search_and_filter_tasks(&history, "", &unknown_tag).is_empty());

        let long_ago = FilterOptions {
            date_range: Some(DateRange::new(
                NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2000, 1, 2).unwrap(),
            )),
            ..FilterOptions::default()
        };
        assert!(search_and_filter_tasks(&history, "", &long_ago).is_empty());

        let without = FilterOptions {
            has_reflection: Some(false),
            ..FilterOptions::default()
        };
        let found = search_and_filter_tasks(&history, "", &without);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task.id, report.id);
    }
}
