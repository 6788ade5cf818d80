//! jsonsql - an embedded, file-backed JSON document store
//!
//! Each table is a JSON array of schemaless records, loaded whole into a
//! working copy and persisted back as a whole snapshot.
//!
//! - `record`: records, tables and value identity
//! - `condition`: comparison rules and left-fold condition chains
//! - `query`: query descriptors, the fixed-order pipeline, aggregates
//! - `index`: on-demand secondary indexes with a staleness contract
//! - `storage`: snapshot stores and the at-rest record transform
//! - `session`: table selection, mutations and file operations
//!
//! Not provided: multi-table transactions, crash-consistent writes
//! (beyond optional rename-on-write), concurrent-writer coordination and
//! schema enforcement.

pub mod cli;
pub mod condition;
pub mod config;
pub mod errors;
pub mod index;
pub mod observability;
pub mod query;
pub mod record;
pub mod session;
pub mod storage;

pub use config::DbConfig;
pub use errors::{DbError, DbResult};
pub use session::{Database, TableSession};
