#[derive(Debug, Clone)]
pub enum Message {
    // === DATABASE MESSAGES ===
    DatabaseOpened(String), // path
    DatabaseAlreadyOpen,
    DatabaseClosed,
    DatabaseDeleted(String), // path
    DatabaseNotInitialized,
    DbInitFailed,
    DbCloseFailed,
    DbDeleteFailed,
    DbStatementFailed,
    DbTransactionFailed,
    AllDataCleared,
    ClearDataFailed,

    // === SCHEMA MESSAGES ===
    SchemaUpToDate(u32),
    ApplyingSchema(u32, String), // version, name
    SchemaApplied(u32),

    // === TASK MESSAGES ===
    TaskCreated(String), // id
    TaskUpdated(String),
    TaskDeleted(String),
    TaskCompleted(String),
    TaskAlreadyCompleted(String),
    TaskUncompleted(String),
    TaskArchived(String),
    TaskNotFound(String),
    AmbiguousTaskId(String), // prefix
    TaskOrdersUpdated(usize),
    TasksFoundForDate(usize, String), // count, date
    TasksFoundForKeyword(usize, String),
    CompletedTasksFound(usize),
    AllTasksFound(usize),
    UniqueTagsFound(usize),
    TaskTitleRequired,
    SubtaskNotFound(String),
    TaskCreateFailed,
    TaskUpdateFailed,
    TaskDeleteFailed,
    TaskQueryFailed,
    TaskCompleteFailed,
    TaskUncompleteFailed,
    TaskArchiveFailed,
    TaskReorderFailed,
    TaskSearchFailed,
    TagsQueryFailed,
    TasksHeader(String), // date
    NoTasksForDate(String),
    NoTasksFound,
    TagListHeader,
    NoTagsFound,
    ConfirmDeleteTask(String), // title

    // === REMINDER MESSAGES ===
    ReminderScheduled(String, String), // task id, time
    ReminderCancelled(String),
    ReminderScheduleFailed(String, String), // task id, error
    ReminderCancelFailed(String, String),

    // === REFLECTION MESSAGES ===
    ReflectionCreated(String), // id
    ReflectionReplaced(String), // task id
    ReflectionUpdated(String),
    ReflectionDeleted(String),
    ReflectionsDeletedForTask(String),
    ReflectionNotFound(String),
    ReflectionContentRequired,
    ReflectionsFound(usize),
    ReflectionsFoundForKeyword(usize, String),
    NoReflectionsFound,
    ReflectionSaved(String), // task title
    TagsInResults(String),
    ReflectionCreateFailed,
    ReflectionUpdateFailed,
    ReflectionDeleteFailed,
    ReflectionQueryFailed,
    ReflectionSearchFailed,
    ReflectionCountFailed,
    PromptReflection,

    // === STATISTICS MESSAGES ===
    StatsQueryFailed,
    CompletionRateHeader(String), // period
    DistributionHeader,
    OverallStatsHeader,

    // === EXPORT / IMPORT MESSAGES ===
    ExportCompleted(String), // path
    ExportFailed,
    ExportedFilesHeader,
    NoExportedFiles,
    ExportFileDeleted(String),
    ExportFileOutsideDir(String),
    ImportResultSummary {
        tasks: usize,
        reflections: usize,
    },
    ImportRejected,
    StoragePermissionRequired,
    ImportCompleted {
        tasks: usize,
        reflections: usize,
        errors: usize,
    },
    ImportEmptyDocument,
    ImportMissingVersion,
    ImportTasksNotArray,
    ImportReflectionsNotArray,
    ImportInvalidJson(String),
    ImportTaskFailed(String, String), // title or id, reason
    ImportReflectionFailed(String, String),
    ImportFailed,
    ImportErrorsHeader,

    // === VALIDATION MESSAGES ===
    FieldMissing(String),
    InvalidPriority(String),
    InvalidDate(String),
    InvalidTimestamp(String),

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigParseError,
    PromptExportDir,
    PromptTagDelimiter,
    PromptRemindersEnabled,
    PromptDailyDays,
    PromptWeeklyWeeks,
    PromptMonthlyMonths,

    // === GENERIC MESSAGES ===
    ConfirmClearAllData,
    OperationCancelled,
    UserStorageError,
    UserPermissionError,
    UserUnknownError,
}
