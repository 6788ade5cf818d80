//! Whole-snapshot file operations on a table session
//!
//! - `persist`: working copy → table snapshot
//! - `backup` / `export`: working copy → caller path
//! - `restore` / `import`: caller path → working copy (not persisted)
//! - `seal` / `unseal`: per-record at-rest transform of the working copy
//!
//! A missing backup or import path is an error, unlike a missing table.

use std::path::Path;

use crate::errors::DbResult;
use crate::observability::{log_event_with_fields, Event, ObservationScope, Severity};
use crate::record::Record;
use crate::storage::{RecordTransform, SealedTable, SnapshotStore, StorageError};

use super::database::report_malformed;
use super::table::TableSession;

impl<S: SnapshotStore> TableSession<'_, S> {
    /// Writes the working copy as the table snapshot.
    pub fn persist(&self) -> DbResult<()> {
        self.write_snapshot(self.table.records(), self.version)
    }

    /// Saves `records` as the table snapshot without touching the
    /// working copy.
    pub(super) fn write_snapshot(&self, records: &[Record], version: u64) -> DbResult<()> {
        let name = self.table.name();
        let version = version.to_string();
        let scope = ObservationScope::with_fields("PERSIST", &[("table", name)]);

        if let Err(e) = self.store.save_table(name, records) {
            scope.fail(Severity::Error, &e.to_string());
            return Err(e.into());
        }
        scope.complete();

        let count = records.len().to_string();
        log_event_with_fields(
            Event::SnapshotPersisted,
            &[("table", name), ("records", &count), ("version", &version)],
        );
        Ok(())
    }

    /// Writes the working copy to `path`.
    pub fn backup(&self, path: &Path) -> DbResult<()> {
        self.write_copy(path, "BACKUP", Event::BackupComplete)
    }

    /// Writes the working copy to `path`.
    pub fn export(&self, path: &Path) -> DbResult<()> {
        self.write_copy(path, "EXPORT", Event::ExportComplete)
    }

    /// Replaces the working copy from `path`. Returns the record count.
    pub fn restore(&mut self, path: &Path) -> DbResult<usize> {
        self.read_copy(path, "RESTORE", Event::RestoreComplete)
    }

    /// Replaces the working copy from `path`. Returns the record count.
    pub fn import(&mut self, path: &Path) -> DbResult<usize> {
        self.read_copy(path, "IMPORT", Event::ImportComplete)
    }

    fn write_copy(&self, path: &Path, scope_name: &str, done: Event) -> DbResult<()> {
        let name = self.table.name();
        let target = path.display().to_string();
        let scope = ObservationScope::with_fields(scope_name, &[("table", name), ("path", &target)]);

        if let Err(e) = self.store.write_records(path, self.table.records()) {
            scope.fail(Severity::Error, &e.to_string());
            return Err(e.into());
        }
        scope.complete();

        let records = self.table.len().to_string();
        log_event_with_fields(
            done,
            &[("table", name), ("path", &target), ("records", &records)],
        );
        Ok(())
    }

    fn read_copy(&mut self, path: &Path, scope_name: &str, done: Event) -> DbResult<usize> {
        let source = path.display().to_string();
        let scope = ObservationScope::with_fields(
            scope_name,
            &[("table", self.table.name()), ("path", &source)],
        );

        let records = match self.store.read_records(path) {
            Ok(records) => records,
            Err(e) => {
                report_malformed(self.table.name(), &e);
                let severity = if e.is_fatal() { Severity::Fatal } else { Severity::Error };
                scope.fail(severity, &e.to_string());
                return Err(e.into());
            }
        };
        scope.complete();

        let count = records.len();
        self.table.replace(records);
        self.touch();

        let count_text = count.to_string();
        log_event_with_fields(
            done,
            &[("table", self.table.name()), ("path", &source), ("records", &count_text)],
        );
        Ok(count)
    }

    // ==================
    // At-rest transform
    // ==================

    /// Seals every record of the working copy with `transform`.
    pub fn seal<T>(&self, transform: &T) -> DbResult<SealedTable>
    where
        T: RecordTransform + ?Sized,
    {
        let entries = self
            .table
            .records()
            .iter()
            .map(|rec| transform.seal(rec))
            .collect::<Result<Vec<_>, _>>()?;

        let count = entries.len().to_string();
        log_event_with_fields(
            Event::Sealed,
            &[
                ("table", self.table.name()),
                ("transform", transform.transform_id()),
                ("records", &count),
            ],
        );

        Ok(SealedTable {
            table: self.table.name().to_string(),
            transform_id: transform.transform_id().to_string(),
            entries,
        })
    }

    /// Replaces the working copy with the opened records of `sealed`.
    ///
    /// All entries must open; on any failure the working copy is left
    /// untouched.
    pub fn unseal<T>(&mut self, sealed: &SealedTable, transform: &T) -> DbResult<usize>
    where
        T: RecordTransform + ?Sized,
    {
        if sealed.transform_id != transform.transform_id() {
            return Err(StorageError::Transform(format!(
                "entries were sealed with '{}', not '{}'",
                sealed.transform_id,
                transform.transform_id()
            ))
            .into());
        }

        let records = sealed
            .entries
            .iter()
            .map(|entry| transform.open(entry))
            .collect::<Result<Vec<Record>, _>>()?;

        let count = records.len();
        self.table.replace(records);
        self.touch();

        let count_text = count.to_string();
        log_event_with_fields(
            Event::Unsealed,
            &[
                ("table", self.table.name()),
                ("transform", transform.transform_id()),
                ("records", &count_text),
            ],
        );
        Ok(count)
    }

    /// Writes sealed entries to `path` as a JSON array of strings.
    pub fn write_sealed(&self, sealed: &SealedTable, path: &Path) -> DbResult<()> {
        Ok(self.store.write_sealed(path, &sealed.entries)?)
    }

    /// Reads sealed entries written by `write_sealed`.
    ///
    /// The file does not record the transform; `transform_id` names the
    /// one the caller intends to open it with.
    pub fn read_sealed(&self, path: &Path, transform_id: &str) -> DbResult<SealedTable> {
        let entries = self.store.read_sealed(path)?;
        Ok(SealedTable {
            table: self.table.name().to_string(),
            transform_id: transform_id.to_string(),
            entries,
        })
    }
}
