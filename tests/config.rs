#[cfg(test)]
mod tests {
    use detter::libs::config::{Config, StatsConfig, CONFIG_FILE_NAME, DEFAULT_TAG_DELIMITER};
    use detter::libs::data_storage::DataStorage;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct ConfigTestContext {
        _temp_dir: TempDir,
        path: PathBuf,
    }

    impl TestContext for ConfigTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let path = DataStorage::at(temp_dir.path().join("detter")).get_path(CONFIG_FILE_NAME).unwrap();
            ConfigTestContext { _temp_dir: temp_dir, path }
        }
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_missing_file_gives_defaults(ctx: &mut ConfigTestContext) {
        let config = Config::read_from(&ctx.path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tag_delimiter, DEFAULT_TAG_DELIMITER);
        assert_eq!(config.stats, StatsConfig::default());
        assert!(!config.reminders_enabled);
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_save_and_read_back(ctx: &mut ConfigTestContext) {
        let config = Config {
            export_dir: Some(PathBuf::from("/tmp/detter-backups")),
            tag_delimiter: "|".to_string(),
            reminders_enabled: true,
            stats: StatsConfig {
                daily_days: 14,
                weekly_weeks: 8,
                monthly_months: 12,
            },
        };
        config.save_to(&ctx.path).unwrap();

        assert_eq!(Config::read_from(&ctx.path).unwrap(), config);
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/detter-backups"));
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_partial_file_fills_in_defaults(ctx: &mut ConfigTestContext) {
        fs::write(&ctx.path, r#"{ "reminders_enabled": true }"#).unwrap();

        let config = Config::read_from(&ctx.path).unwrap();
        assert!(config.reminders_enabled);
        assert_eq!(config.tag_delimiter, DEFAULT_TAG_DELIMITER);
        assert_eq!(config.stats.daily_days, 7);
        assert!(config.export_dir.is_none());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_invalid_file_is_an_error(ctx: &mut ConfigTestContext) {
        fs::write(&ctx.path, "{ reminders: yes").unwrap();
        assert!(Config::read_from(&ctx.path).is_err());
    }
}
