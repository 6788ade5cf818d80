//! Index Manager for jsonsql
//!
//! Holds the secondary indexes of one table session, keyed by field.
//!
//! # API
//!
//! - `build(table, field, version, policy)` - Build or rebuild one index
//! - `lookup(field, value)` - Equality lookup under the build policy
//! - `is_stale(field, version)` - Whether the table moved on since the build
//!
//! Indexes are session-private and never persisted.

use std::collections::HashMap;

use serde_json::Value;

use super::errors::{IndexError, IndexResult};
use super::secondary::SecondaryIndex;
use crate::condition::EqualityPolicy;
use crate::observability::{log_event_with_fields, Event};
use crate::record::{Record, Table};

/// Secondary indexes of one session
#[derive(Debug, Default)]
pub struct IndexManager {
    indexes: HashMap<String, SecondaryIndex>,
}

impl IndexManager {
    /// Creates an empty index manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds (or rebuilds) the index on `field` from `table`.
    pub fn build(
        &mut self,
        table: &Table,
        field: &str,
        version: u64,
        policy: EqualityPolicy,
    ) -> &SecondaryIndex {
        let index = SecondaryIndex::build(table, field, version, policy);

        let values = index.distinct_values().to_string();
        let records = index.indexed_records().to_string();
        let version_text = version.to_string();
        log_event_with_fields(
            Event::IndexBuilt,
            &[
                ("table", table.name()),
                ("field", field),
                ("distinct_values", &values),
                ("records", &records),
                ("version", &version_text),
            ],
        );

        self.indexes.insert(field.to_string(), index);
        &self.indexes[field]
    }

    /// Equality lookup on an indexed field
    pub fn lookup(&self, field: &str, value: &Value) -> IndexResult<Vec<&Record>> {
        self.get(field).map(|index| index.lookup(value))
    }

    /// Returns the index on `field`
    pub fn get(&self, field: &str) -> IndexResult<&SecondaryIndex> {
        self.indexes
            .get(field)
            .ok_or_else(|| IndexError::UnknownIndex(field.to_string()))
    }

    /// Whether the index on `field` predates `current_version`
    pub fn is_stale(&self, field: &str, current_version: u64) -> IndexResult<bool> {
        self.get(field).map(|index| index.is_stale(current_version))
    }

    /// Drops the index on `field`; returns whether one existed
    pub fn remove(&mut self, field: &str) -> bool {
        self.indexes.remove(field).is_some()
    }

    /// Indexed fields, sorted
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.indexes.keys().map(String::as_str).collect();
        fields.sort_unstable();
        fields
    }
}
