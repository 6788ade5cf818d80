//! Observable events for jsonsql
//!
//! Events are explicit and typed; the logger only ever sees their
//! string forms.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Database opened on a data directory
    DatabaseOpened,
    /// Configuration loaded from file
    ConfigLoaded,

    // Tables
    /// Empty snapshot created for a new table
    TableCreated,
    /// Table snapshot loaded into a session
    TableLoaded,
    /// Persisted snapshot could not be parsed (FATAL)
    MalformedSnapshot,

    // Writes
    /// Working copy written as the table snapshot
    SnapshotPersisted,

    // Queries
    /// Pipeline executed
    QueryExecuted,
    /// Query rejected (bad operator, operand or field)
    QueryRejected,

    // Index
    /// Secondary index built
    IndexBuilt,

    // Files
    /// Working copy written to a backup path
    BackupComplete,
    /// Working copy replaced from a backup path
    RestoreComplete,
    /// Working copy exported
    ExportComplete,
    /// Working copy imported
    ImportComplete,

    // At-rest transform
    /// Records sealed
    Sealed,
    /// Records opened
    Unsealed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::DatabaseOpened => "DATABASE_OPENED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::TableCreated => "TABLE_CREATED",
            Event::TableLoaded => "TABLE_LOADED",
            Event::MalformedSnapshot => "MALFORMED_SNAPSHOT",
            Event::SnapshotPersisted => "SNAPSHOT_PERSISTED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::IndexBuilt => "INDEX_BUILT",
            Event::BackupComplete => "BACKUP_COMPLETE",
            Event::RestoreComplete => "RESTORE_COMPLETE",
            Event::ExportComplete => "EXPORT_COMPLETE",
            Event::ImportComplete => "IMPORT_COMPLETE",
            Event::Sealed => "RECORDS_SEALED",
            Event::Unsealed => "RECORDS_UNSEALED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::MalformedSnapshot => Severity::Fatal,
            Event::QueryRejected => Severity::Warn,
            Event::QueryExecuted | Event::TableLoaded => Severity::Trace,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
