//! Persistence façade for jsonsql
//!
//! The query core depends on storage only through this module:
//!
//! - `SnapshotStore`: whole-snapshot read/write for a named table and for
//!   caller-chosen paths (backup, restore, export, import)
//! - `RecordTransform`: reversible per-record transform for at-rest
//!   protection
//!
//! # Snapshot Format
//!
//! One JSON array per file. A missing table snapshot is an empty table;
//! an unparsable one is a FATAL `MalformedSnapshot`.

mod codec;
mod errors;
mod store;
mod transform;

pub use errors::{Severity, StorageError, StorageResult};
pub use store::{JsonFileStore, MemoryStore, SnapshotStore};
pub use transform::{AesGcmTransform, RecordTransform, SealedTable};
