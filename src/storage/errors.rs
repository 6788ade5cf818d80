//! Storage error types
//!
//! Error codes:
//! - JSONSQL_STORAGE_IO_ERROR (ERROR)
//! - JSONSQL_MALFORMED_SNAPSHOT (FATAL)
//! - JSONSQL_TRANSFORM_FAILED (ERROR)
//! - JSONSQL_SERIALIZE_FAILED (ERROR)

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Severity levels shared by every jsonsql error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed but the session is usable
    Error,
    /// Persisted state cannot be trusted; the caller must stop
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    /// Disk I/O failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Persisted JSON could not be parsed as an array of records
    #[error("malformed snapshot at {}: {reason}", path.display())]
    MalformedSnapshot { path: PathBuf, reason: String },

    /// At-rest transform failed (bad secret, tampered payload, bad encoding)
    #[error("record transform failed: {0}")]
    Transform(String),

    /// Records could not be serialized
    #[error("failed to serialize records: {0}")]
    Serialize(String),
}

impl StorageError {
    /// I/O error with context
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        StorageError::Io {
            context: context.into(),
            source,
        }
    }

    /// Malformed snapshot at `path`
    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        StorageError::MalformedSnapshot {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "JSONSQL_STORAGE_IO_ERROR",
            StorageError::MalformedSnapshot { .. } => "JSONSQL_MALFORMED_SNAPSHOT",
            StorageError::Transform(_) => "JSONSQL_TRANSFORM_FAILED",
            StorageError::Serialize(_) => "JSONSQL_SERIALIZE_FAILED",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            StorageError::MalformedSnapshot { .. } => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
