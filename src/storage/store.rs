//! Snapshot stores
//!
//! The core needs two storage capabilities: a whole-snapshot read/write
//! for a named table, and the same for an arbitrary path (backup, restore,
//! export, import, sealed snapshots). Both are expressed by `SnapshotStore`
//! on top of two byte-level primitives, so a store only has to say how
//! bytes reach a path.
//!
//! # Limitations
//!
//! - Every save rewrites the whole snapshot. There is no append, no
//!   batching across calls, and no multi-table transaction.
//! - There is no locking. Two sessions saving the same table race on the
//!   file and the last writer wins.
//! - With `atomic_writes` off, a crash mid-write can leave a truncated
//!   snapshot, which the next load reports as malformed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::codec;
use super::errors::{StorageError, StorageResult};
use crate::record::Record;

/// Whole-snapshot persistence for tables and caller-chosen paths.
pub trait SnapshotStore {
    /// Path of the snapshot backing `table`
    fn table_path(&self, table: &str) -> PathBuf;

    /// Reads the bytes at `path`; `Ok(None)` if nothing exists there.
    fn read_bytes(&self, path: &Path) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces whatever is at `path` with `bytes`.
    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> StorageResult<()>;

    /// Whether snapshots are pretty-printed
    fn pretty(&self) -> bool {
        true
    }

    /// Loads a table snapshot. A missing snapshot is an empty table.
    fn load_table(&self, table: &str) -> StorageResult<Vec<Record>> {
        let path = self.table_path(table);
        match self.read_bytes(&path)? {
            Some(bytes) => codec::decode_records(&bytes, &path),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrites a table snapshot with `records`.
    fn save_table(&self, table: &str, records: &[Record]) -> StorageResult<()> {
        let bytes = codec::encode(records, self.pretty())?;
        self.write_bytes(&self.table_path(table), &bytes)
    }

    /// Writes an empty snapshot if none exists. Returns false if the table
    /// already existed.
    fn create_table(&self, table: &str) -> StorageResult<bool> {
        let path = self.table_path(table);
        if self.read_bytes(&path)?.is_some() {
            return Ok(false);
        }
        let empty: [Record; 0] = [];
        self.write_bytes(&path, &codec::encode(&empty, false)?)?;
        Ok(true)
    }

    /// Reads an array of records from a caller path. Unlike table loads,
    /// a missing file here is an error.
    fn read_records(&self, path: &Path) -> StorageResult<Vec<Record>> {
        let bytes = self.read_bytes(path)?.ok_or_else(|| not_found(path))?;
        codec::decode_records(&bytes, path)
    }

    /// Writes an array of records to a caller path.
    fn write_records(&self, path: &Path, records: &[Record]) -> StorageResult<()> {
        let bytes = codec::encode(records, self.pretty())?;
        self.write_bytes(path, &bytes)
    }

    /// Reads an array of sealed records from a caller path.
    fn read_sealed(&self, path: &Path) -> StorageResult<Vec<String>> {
        let bytes = self.read_bytes(path)?.ok_or_else(|| not_found(path))?;
        codec::decode_sealed(&bytes, path)
    }

    /// Writes an array of sealed records to a caller path.
    fn write_sealed(&self, path: &Path, sealed: &[String]) -> StorageResult<()> {
        let bytes = codec::encode(sealed, self.pretty())?;
        self.write_bytes(path, &bytes)
    }
}

fn not_found(path: &Path) -> StorageError {
    StorageError::io(
        format!("No snapshot at {}", path.display()),
        io::Error::from(io::ErrorKind::NotFound),
    )
}

/// File-per-table store rooted at a data directory.
///
/// Table `users` lives at `<data_dir>/users.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    pretty: bool,
    atomic_writes: bool,
}

impl JsonFileStore {
    /// Opens a store, creating the data directory if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|e| {
            StorageError::io(
                format!("Failed to create data directory {}", data_dir.display()),
                e,
            )
        })?;

        Ok(Self {
            data_dir,
            pretty: true,
            atomic_writes: false,
        })
    }

    /// Sets whether snapshots are pretty-printed
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// When set, writes go to a sibling temp file which is then renamed
    /// over the target.
    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }

    /// Returns the data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl SnapshotStore for JsonFileStore {
    fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", table))
    }

    fn read_bytes(&self, path: &Path) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(
                format!("Failed to read {}", path.display()),
                e,
            )),
        }
    }

    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        if !self.atomic_writes {
            return fs::write(path, bytes).map_err(|e| {
                StorageError::io(format!("Failed to write {}", path.display()), e)
            });
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, bytes)
            .map_err(|e| StorageError::io(format!("Failed to write {}", tmp.display()), e))?;
        fs::rename(&tmp, path).map_err(|e| {
            StorageError::io(
                format!("Failed to rename {} over {}", tmp.display(), path.display()),
                e,
            )
        })
    }

    fn pretty(&self) -> bool {
        self.pretty
    }
}

/// In-memory store keyed by path. Nothing touches the disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Places raw bytes at a path, bypassing encoding
    pub fn put_raw(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(path.into(), bytes.into());
    }
}

impl SnapshotStore for MemoryStore {
    fn table_path(&self, table: &str) -> PathBuf {
        PathBuf::from(format!("{}.json", table))
    }

    fn read_bytes(&self, path: &Path) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.files.borrow().get(path).cloned())
    }

    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}
