#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use detter::db::db::Db;
    use detter::db::reflections::Reflections;
    use detter::db::tasks::Tasks;
    use detter::libs::error::ErrorKind;
    use detter::libs::formatter::{from_millis, local_noon};
    use detter::libs::reflection::NewReflection;
    use detter::libs::task::{NewTask, Priority, Task};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct ReflectionTestContext {
        _temp_dir: TempDir,
        db: Db,
    }

    impl TestContext for ReflectionTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db = Db::open(temp_dir.path().join("detter.db"));
            db.init().unwrap();
            ReflectionTestContext { _temp_dir: temp_dir, db }
        }

        fn teardown(self) {
            self.db.close().unwrap();
        }
    }

    impl ReflectionTestContext {
        fn completed_task(&self, title: &str, completed_ms: i64) -> Task {
            let due = local_noon(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
            Tasks::new(&self.db)
                .create(NewTask::new(title, Priority::Urgent, due).completed_at(from_millis(completed_ms).unwrap()))
                .unwrap()
        }
    }

    #[test_context(ReflectionTestContext)]
    #[test]
    fn test_create_and_read(ctx: &mut ReflectionTestContext) {
        let task = ctx.completed_task("Write tests", 1_736_935_200_000);
        let reflections = Reflections::new(&ctx.db);

        let created = reflections.create(NewReflection::new(&task.id, "  Caught two bugs ")).unwrap();
        assert_eq!(created.content, "Caught two bugs");
        assert_eq!(created.created_at, created.updated_at);

        assert_eq!(reflections.get_by_task_id(&task.id).unwrap(), Some(created.clone()));
        assert_eq!(reflections.get_by_id(&created.id).unwrap(), Some(created));
        assert!(reflections.get_by_id("missing").unwrap().is_none());
    }

    #[test_context(ReflectionTestContext)]
    #[test]
    fn test_second_create_replaces_content(ctx: &mut ReflectionTestContext) {
        let task = ctx.completed_task("Refactor parser", 1_736_935_200_000);
        let reflections = Reflections::new(&ctx.db);

        let first = reflections.create(NewReflection::new(&task.id, "Too slow")).unwrap();
        let second = reflections.create(NewReflection::new(&task.id, "Faster after caching")).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.content, "Faster after caching");
        assert_eq!(reflections.count().unwrap(), 1);
        assert_eq!(reflections.get_by_task_id(&task.id).unwrap().unwrap().content, "Faster after caching");
    }

    #[test_context(ReflectionTestContext)]
    #[test]
    fn test_create_validates_input(ctx: &mut ReflectionTestContext) {
        let task = ctx.completed_task("Plan sprint", 1_736_935_200_000);
        let reflections = Reflections::new(&ctx.db);

        let blank = reflections.create(NewReflection::new(&task.id, " \n ")).unwrap_err();
        assert_eq!(blank.kind(), ErrorKind::Validation);

        let orphan = reflections.create(NewReflection::new("no-such-task", "text")).unwrap_err();
        assert_eq!(orphan.kind(), ErrorKind::Storage);
        assert_eq!(reflections.count().unwrap(), 0);
    }

    #[test_context(ReflectionTestContext)]
    #[test]
    fn test_update_and_delete(ctx: &mut ReflectionTestContext) {
        let task = ctx.completed_task("Read book", 1_736_935_200_000);
        let reflections = Reflections::new(&ctx.db);
        let mut reflection = reflections.create(NewReflection::new(&task.id, "Chapter 1")).unwrap();

        reflection.content = "Chapters 1-3".to_string();
        let updated = reflections.update(&reflection).unwrap().unwrap();
        assert_eq!(updated.content, "Chapters 1-3");
        assert_eq!(reflections.get_by_id(&reflection.id).unwrap(), Some(updated.clone()));

        assert!(reflections.delete(&reflection.id).unwrap());
        assert!(!reflections.delete(&reflection.id).unwrap());
        assert!(reflections.update(&updated).unwrap().is_none());
    }

    #[test_context(ReflectionTestContext)]
    #[test]
    fn test_delete_by_task_id(ctx: &mut ReflectionTestContext) {
        let task = ctx.completed_task("Cook dinner", 1_736_935_200_000);
        let reflections = Reflections::new(&ctx.db);
        reflections.create(NewReflection::new(&task.id, "Too salty")).unwrap();

        assert_eq!(reflections.delete_by_task_id(&task.id).unwrap(), 1);
        assert_eq!(reflections.delete_by_task_id(&task.id).unwrap(), 0);
        assert!(reflections.get_by_task_id(&task.id).unwrap().is_none());
    }

    #[test_context(ReflectionTestContext)]
    #[test]
    fn test_completed_tasks_with_reflections(ctx: &mut ReflectionTestContext) {
        let oldest = ctx.completed_task("oldest", 1_736_900_000_000);
        let middle = ctx.completed_task("middle", 1_736_950_000_000);
        let newest = ctx.completed_task("newest", 1_736_990_000_000);
        let due = local_noon(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        Tasks::new(&ctx.db).create(NewTask::new("open", Priority::Urgent, due)).unwrap();

        let reflections = Reflections::new(&ctx.db);
        reflections.create(NewReflection::new(&middle.id, "Halfway")).unwrap();

        let rows = reflections.get_completed_tasks_with_reflections(None).unwrap();
        let summary: Vec<(String, Option<String>)> = rows
            .iter()
            .map(|r| (r.task.id.clone(), r.reflection.as_ref().map(|x| x.content.clone())))
            .collect();
        assert_eq!(
            summary,
            vec![
                (newest.id.clone(), None),
                (middle.id.clone(), Some("Halfway".to_string())),
                (oldest.id.clone(), None),
            ]
        );
        assert_eq!(rows[1].task, middle);

        assert_eq!(reflections.get_completed_tasks_with_reflections(Some(2)).unwrap().len(), 2);
    }

    #[test_context(ReflectionTestContext)]
    #[test]
    fn test_task_with_reflection(ctx: &mut ReflectionTestContext) {
        let task = ctx.completed_task("Run 5k", 1_736_935_200_000);
        let reflections = Reflections::new(&ctx.db);

        let bare = reflections.get_task_with_reflection(&task.id).unwrap().unwrap();
        assert_eq!(bare.task, task);
        assert!(bare.reflection.is_none());

        reflections.create(NewReflection::new(&task.id, "Legs hurt")).unwrap();
        let joined = reflections.get_task_with_reflection(&task.id).unwrap().unwrap();
        assert_eq!(joined.reflection.unwrap().content, "Legs hurt");

        assert!(reflections.get_task_with_reflection("missing").unwrap().is_none());
    }

    #[test_context(ReflectionTestContext)]
    #[test]
    fn test_search_matches_content_only(ctx: &mut ReflectionTestContext) {
        let garden = ctx.completed_task("Garden", 1_736_935_200_000);
        let taxes = ctx.completed_task("Taxes", 1_736_935_300_000);
        ctx.completed_task("Tomatoes without notes", 1_736_935_400_000);
        let reflections = Reflections::new(&ctx.db);
        reflections.create(NewReflection::new(&garden.id, "Planted TOMATOES early")).unwrap();
        reflections.create(NewReflection::new(&taxes.id, "Receipts were 100% sorted")).unwrap();

        let hits = reflections.search("tomatoes").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task.id, garden.id);

        let hits = reflections.search("100%").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task.id, taxes.id);

        assert_eq!(reflections.get_all().unwrap().len(), 2);
    }

    #[test_context(ReflectionTestContext)]
    #[test]
    fn test_search_folds_non_ascii_case(ctx: &mut ReflectionTestContext) {
        let task = ctx.completed_task("Lesson", 1_736_935_200_000);
        let reflections = Reflections::new(&ctx.db);
        reflections.create(NewReflection::new(&task.id, "Die ÜBUNG war schwer")).unwrap();

        assert_eq!(reflections.search("übung").unwrap().len(), 1);
        assert_eq!(reflections.search("Übung").unwrap().len(), 1);
        assert!(reflections.search("uebung").unwrap().is_empty());
    }
}
