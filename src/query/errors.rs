//! Query error types
//!
//! Error codes:
//! - JSONSQL_INVALID_OPERATOR (ERROR)
//! - JSONSQL_INVALID_OPERAND (ERROR)
//! - JSONSQL_INVALID_FIELD (ERROR)
//! - JSONSQL_EMPTY_AGGREGATE (ERROR)
//!
//! Builder calls never fail. Bad operators, operands and field names are
//! reported here when the query executes, tagged with the stage that
//! rejected them.

use std::fmt;

use thiserror::Error;

use crate::storage::{Severity, StorageError};

/// Pipeline stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Filter,
    Join,
    GroupBy,
    OrderBy,
    Distinct,
    Having,
    Projection,
    Aggregate,
    Mutation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Filter => "filter",
            Stage::Join => "join",
            Stage::GroupBy => "group_by",
            Stage::OrderBy => "order_by",
            Stage::Distinct => "distinct",
            Stage::Having => "having",
            Stage::Projection => "projection",
            Stage::Aggregate => "aggregate",
            Stage::Mutation => "mutation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query error type
#[derive(Debug, Error)]
pub enum QueryError {
    /// Unrecognized comparison operator
    #[error("[{stage}] invalid operator '{operator}'")]
    InvalidOperator { operator: String, stage: Stage },

    /// Operator recognized but its operand has the wrong shape
    #[error("[{stage}] invalid operand for '{operator}': {reason}")]
    InvalidOperand {
        operator: String,
        reason: String,
        stage: Stage,
    },

    /// Empty or otherwise unusable field name
    #[error("[{stage}] invalid field: {reason}")]
    InvalidField { reason: String, stage: Stage },

    /// avg/min/max/stats over zero values
    #[error("aggregate over zero values of field '{field}'")]
    EmptyAggregate { field: String },

    /// Loading a joined table failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QueryError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidOperator { .. } => "JSONSQL_INVALID_OPERATOR",
            QueryError::InvalidOperand { .. } => "JSONSQL_INVALID_OPERAND",
            QueryError::InvalidField { .. } => "JSONSQL_INVALID_FIELD",
            QueryError::EmptyAggregate { .. } => "JSONSQL_EMPTY_AGGREGATE",
            QueryError::Storage(e) => e.code(),
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            QueryError::Storage(e) => e.severity(),
            _ => Severity::Error,
        }
    }

    /// Returns the stage that failed, when the error came from a stage
    pub fn stage(&self) -> Option<Stage> {
        match self {
            QueryError::InvalidOperator { stage, .. }
            | QueryError::InvalidOperand { stage, .. }
            | QueryError::InvalidField { stage, .. } => Some(*stage),
            QueryError::EmptyAggregate { .. } => Some(Stage::Aggregate),
            QueryError::Storage(_) => None,
        }
    }

    pub(crate) fn invalid_field(stage: Stage, reason: impl Into<String>) -> Self {
        QueryError::InvalidField {
            reason: reason.into(),
            stage,
        }
    }

    pub(crate) fn empty_aggregate(field: &str) -> Self {
        QueryError::EmptyAggregate {
            field: field.to_string(),
        }
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Rejects empty field names.
pub(crate) fn check_field(stage: Stage, field: &str) -> QueryResult<()> {
    if field.is_empty() {
        return Err(QueryError::invalid_field(stage, "field name is empty"));
    }
    Ok(())
}
