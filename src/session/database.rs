//! Database handle: a snapshot store plus the equality policy every table
//! session inherits.

use std::path::Path;

use crate::condition::EqualityPolicy;
use crate::config::DbConfig;
use crate::errors::{DbError, DbResult};
use crate::index::IndexManager;
use crate::observability::{log_event_with_fields, Event};
use crate::record::Table;
use crate::storage::{JsonFileStore, SnapshotStore, StorageError};

use super::table::TableSession;

/// Entry point for selecting and creating tables
#[derive(Debug)]
pub struct Database<S: SnapshotStore = JsonFileStore> {
    store: S,
    policy: EqualityPolicy,
}

impl Database<JsonFileStore> {
    /// Opens the data directory named by `config`, creating it if missing.
    pub fn open(config: &DbConfig) -> DbResult<Self> {
        config.validate()?;

        let store = JsonFileStore::open(&config.data_dir)?
            .with_pretty(config.pretty_print)
            .with_atomic_writes(config.atomic_writes);

        let data_dir = config.data_dir.display().to_string();
        log_event_with_fields(
            Event::DatabaseOpened,
            &[
                ("data_dir", &data_dir),
                ("equality", equality_name(config.equality)),
            ],
        );

        Ok(Self::with_store(store, config.equality))
    }

    /// Data directory holding the table snapshots
    pub fn data_dir(&self) -> &Path {
        self.store.data_dir()
    }
}

impl<S: SnapshotStore> Database<S> {
    /// Wraps an existing store
    pub fn with_store(store: S, policy: EqualityPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> EqualityPolicy {
        self.policy
    }

    /// Writes an empty snapshot for `name` unless one exists.
    ///
    /// Returns `false` if the table already existed; it is never
    /// overwritten.
    pub fn create_table(&self, name: &str) -> DbResult<bool> {
        validate_table_name(name)?;
        let created = self.store.create_table(name)?;
        if created {
            log_event_with_fields(Event::TableCreated, &[("table", name)]);
        }
        Ok(created)
    }

    /// Selects a table, loading its snapshot into a fresh session.
    ///
    /// A missing snapshot is an empty table. A snapshot that cannot be
    /// parsed is a fatal error and is never treated as empty.
    pub fn table(&self, name: &str) -> DbResult<TableSession<'_, S>> {
        validate_table_name(name)?;

        let records = self.store.load_table(name).map_err(|e| {
            report_malformed(name, &e);
            e
        })?;

        let count = records.len().to_string();
        log_event_with_fields(Event::TableLoaded, &[("table", name), ("records", &count)]);

        Ok(TableSession {
            store: &self.store,
            policy: self.policy,
            table: Table::with_records(name, records),
            indexes: IndexManager::new(),
            version: 0,
        })
    }
}

/// Logs MALFORMED_SNAPSHOT for `err` if that is what it is
pub(super) fn report_malformed(table: &str, err: &StorageError) {
    if let StorageError::MalformedSnapshot { path, reason } = err {
        let path = path.display().to_string();
        log_event_with_fields(
            Event::MalformedSnapshot,
            &[("table", table), ("path", &path), ("reason", reason)],
        );
    }
}

/// Table names become file names: no separators, no dot-prefixed names.
fn validate_table_name(name: &str) -> DbResult<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.contains("..");
    if bad {
        return Err(DbError::InvalidTableName(name.to_string()));
    }
    Ok(())
}

fn equality_name(policy: EqualityPolicy) -> &'static str {
    match policy {
        EqualityPolicy::Strict => "strict",
        EqualityPolicy::Loose => "loose",
    }
}
