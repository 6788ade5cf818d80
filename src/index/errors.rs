//! Index error types
//!
//! Error codes:
//! - JSONSQL_UNKNOWN_INDEX (ERROR)

use thiserror::Error;

/// Index error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Lookup on a field that has no index in this session
    #[error("no index on field '{0}'")]
    UnknownIndex(String),
}

impl IndexError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::UnknownIndex(_) => "JSONSQL_UNKNOWN_INDEX",
        }
    }
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_index_display() {
        let err = IndexError::UnknownIndex("email".into());
        assert_eq!(err.code(), "JSONSQL_UNKNOWN_INDEX");
        assert!(err.to_string().contains("email"));
    }
}
