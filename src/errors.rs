//! Top-level error type returned by database and session operations
//!
//! Wraps every subsystem error and keeps its code and severity.

use thiserror::Error;

use crate::config::ConfigError;
use crate::index::IndexError;
use crate::query::QueryError;
use crate::storage::{Severity, StorageError};

/// Database error type
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Index(#[from] IndexError),

    /// Table name that cannot map to a snapshot file
    #[error("invalid table name '{0}'")]
    InvalidTableName(String),
}

impl DbError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DbError::Storage(e) => e.code(),
            DbError::Query(e) => e.code(),
            DbError::Config(e) => e.code(),
            DbError::Index(e) => e.code(),
            DbError::InvalidTableName(_) => "JSONSQL_INVALID_TABLE_NAME",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            DbError::Storage(e) => e.severity(),
            DbError::Query(e) => e.severity(),
            _ => Severity::Error,
        }
    }

    /// True for errors after which persisted state cannot be trusted
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_codes_pass_through() {
        let err: DbError = StorageError::malformed(Path::new("users.json"), "eof").into();
        assert_eq!(err.code(), "JSONSQL_MALFORMED_SNAPSHOT");
        assert!(err.is_fatal());

        let err: DbError = IndexError::UnknownIndex("email".into()).into();
        assert_eq!(err.code(), "JSONSQL_UNKNOWN_INDEX");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_invalid_table_name() {
        let err = DbError::InvalidTableName("../etc".into());
        assert_eq!(err.code(), "JSONSQL_INVALID_TABLE_NAME");
        assert!(err.to_string().contains("../etc"));
    }
}
