//! Record and table model for jsonsql
//!
//! A record is an ordered, schemaless mapping from field name to JSON value.
//! A table is a named, ordered sequence of records held as a working copy.
//!
//! # Field Access
//!
//! Field lookup never fails. A field that is not present in a record is
//! reported as `None`, which is distinct from a present `null`
//! (`Some(&Value::Null)`). Comparison, projection, grouping and indexing
//! all handle the two cases separately.

mod key;

pub use key::ValueKey;

use serde_json::{Map, Value};

/// A single schemaless document.
///
/// Key order is preserved (insertion order) through load, mutation and
/// persistence.
pub type Record = Map<String, Value>;

/// Returns the value of `field` in `record`, or `None` if the field is absent.
pub fn field<'r>(record: &'r Record, field: &str) -> Option<&'r Value> {
    record.get(field)
}

/// Merges `values` over `target` field by field.
///
/// New keys are appended, existing keys are overwritten in place so the
/// record keeps its original key order.
pub fn merge_into(target: &mut Record, values: &Record) {
    for (key, value) in values {
        target.insert(key.clone(), value.clone());
    }
}

/// Reduces a record to the listed fields, in the record's own key order.
///
/// Fields absent from the record are simply omitted.
pub fn project(record: &Record, fields: &[String]) -> Record {
    record
        .iter()
        .filter(|(key, _)| fields.iter().any(|f| f == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// A named, ordered sequence of records.
///
/// The in-memory table is a working copy; the persisted snapshot stays
/// authoritative until the working copy is explicitly persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    name: String,
    records: Vec<Record>,
}

impl Table {
    /// Creates an empty table
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    /// Creates a table from existing records
    pub fn with_records(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Returns the table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the records in table order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns mutable access to the working copy
    pub fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    /// Replaces the working copy wholesale
    pub fn replace(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the table holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the table, returning its records
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Converts a `json!` object literal into a record.
///
/// Returns `None` if the value is not a JSON object.
pub fn record_from_value(value: Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
