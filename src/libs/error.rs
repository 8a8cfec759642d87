//! Error taxonomy shared by the storage, repository and import/export layers.
//!
//! Every public library operation returns [`Result`]. Failures fall into four
//! kinds (see [`ErrorKind`]); absent records on read paths are not errors and
//! come back as `Ok(None)`.

use crate::libs::messages::Message;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Coarse classification used by callers to decide whether to offer a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Storage,
    Validation,
    Permission,
    Unknown,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Connection, schema or statement failure.
    ///
    /// `statement` and `params` are filled in when a specific SQL statement
    /// failed, for diagnostics only.
    #[error("{message}")]
    Storage {
        message: String,
        statement: Option<String>,
        params: Vec<String>,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{}", Message::DatabaseNotInitialized)]
    NotInitialized,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Permission(String),

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Unknown {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AppError {
    pub fn storage(message: Message, source: rusqlite::Error) -> Self {
        AppError::Storage {
            message: message.to_string(),
            statement: None,
            params: Vec::new(),
            source,
        }
    }

    /// Storage error for a specific failing statement.
    pub fn statement(sql: &str, params: &[&dyn ToSql], source: rusqlite::Error) -> Self {
        AppError::Storage {
            message: Message::DbStatementFailed.to_string(),
            statement: Some(normalize_sql(sql)),
            params: params.iter().map(|p| render_param(*p)).collect(),
            source,
        }
    }

    pub fn validation(message: Message) -> Self {
        AppError::Validation(message.to_string())
    }

    pub fn permission(message: Message) -> Self {
        AppError::Permission(message.to_string())
    }

    pub fn io(message: Message, source: std::io::Error) -> Self {
        AppError::Io {
            message: message.to_string(),
            source,
        }
    }

    pub fn unknown(message: Message, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Unknown {
            message: message.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Storage { .. } | AppError::NotInitialized => ErrorKind::Storage,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Permission(_) => ErrorKind::Permission,
            AppError::Io { .. } | AppError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Storage and unknown failures may succeed on a second attempt; validation
    /// and permission failures need the user to act first.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Storage | ErrorKind::Unknown)
    }

    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Storage => Message::UserStorageError.to_string(),
            ErrorKind::Validation => self.to_string(),
            ErrorKind::Permission => Message::UserPermissionError.to_string(),
            ErrorKind::Unknown => Message::UserUnknownError.to_string(),
        }
    }

    /// Prefixes a storage failure with the repository operation that hit it.
    pub fn in_operation(self, operation: Message) -> Self {
        match self {
            AppError::Storage {
                message,
                statement,
                params,
                source,
            } => AppError::Storage {
                message: format!("{}: {}", operation, message),
                statement,
                params,
                source,
            },
            other => other,
        }
    }

    /// The failing SQL statement, when one is known.
    pub fn statement_text(&self) -> Option<&str> {
        match self {
            AppError::Storage { statement, .. } => statement.as_deref(),
            _ => None,
        }
    }
}

/// Attaches operation context to storage failures on the way out of a repository.
pub trait OperationContext<T> {
    fn operation(self, operation: Message) -> Result<T>;
}

impl<T> OperationContext<T> for Result<T> {
    fn operation(self, operation: Message) -> Result<T> {
        self.map_err(|e| e.in_operation(operation))
    }
}

/// Wraps a rusqlite failure with the statement and parameters that caused it.
pub trait StorageContext<T> {
    fn with_statement(self, sql: &str, params: &[&dyn ToSql]) -> Result<T>;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
    fn with_statement(self, sql: &str, params: &[&dyn ToSql]) -> Result<T> {
        self.map_err(|e| AppError::statement(sql, params, e))
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(source: rusqlite::Error) -> Self {
        AppError::storage(Message::DbStatementFailed, source)
    }
}

fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn render_param(param: &dyn ToSql) -> String {
    match param.to_sql() {
        Ok(ToSqlOutput::Borrowed(value)) => render_value_ref(value),
        Ok(ToSqlOutput::Owned(value)) => render_value_ref((&value).into()),
        Ok(_) => "<blob>".to_string(),
        Err(e) => format!("<unrenderable: {}>", e),
    }
}

fn render_value_ref(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) => format!("'{}'", String::from_utf8_lossy(t)),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
