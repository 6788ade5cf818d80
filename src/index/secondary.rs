//! Secondary index over one field of a table snapshot
//!
//! Records carrying the field are kept in table order; buckets map each
//! distinct `ValueKey` to positions in that list. Records lacking the
//! field appear in no bucket; a present `null` is indexed under the null
//! key.
//!
//! A lookup answers exactly what a `field = value` scan under the build
//! policy would. Strict lookups hit one bucket. Loose equality can join
//! values with different keys (`1`, `"1"`, `true`), so a loose lookup
//! tests each bucket's value and merges the matching buckets back into
//! table order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::condition::EqualityPolicy;
use crate::record::{self, Record, Table, ValueKey};

/// Snapshot-derived value → records lookup.
///
/// Built from the table as it was at `built_from_version`. It is never
/// refreshed on its own; after a mutation it is stale until rebuilt.
#[derive(Debug, Clone)]
pub struct SecondaryIndex {
    field: String,
    policy: EqualityPolicy,
    records: Vec<Record>,
    buckets: BTreeMap<ValueKey, Vec<usize>>,
    built_from_version: u64,
    built_at: DateTime<Utc>,
}

impl SecondaryIndex {
    /// Single pass over `table`.
    pub fn build(
        table: &Table,
        field: impl Into<String>,
        version: u64,
        policy: EqualityPolicy,
    ) -> Self {
        let field = field.into();
        let mut records = Vec::new();
        let mut buckets: BTreeMap<ValueKey, Vec<usize>> = BTreeMap::new();

        for rec in table.records() {
            if let Some(value) = record::field(rec, &field) {
                buckets
                    .entry(ValueKey::from_json(value))
                    .or_default()
                    .push(records.len());
                records.push(rec.clone());
            }
        }

        Self {
            field,
            policy,
            records,
            buckets,
            built_from_version: version,
            built_at: Utc::now(),
        }
    }

    /// Records whose field equals `value` under the build policy, in
    /// table order; empty if none
    pub fn lookup(&self, value: &Value) -> Vec<&Record> {
        match self.policy {
            EqualityPolicy::Strict => self
                .buckets
                .get(&ValueKey::from_json(value))
                .map(|positions| self.at(positions.iter().copied()))
                .unwrap_or_default(),
            EqualityPolicy::Loose => {
                let mut positions: Vec<usize> = self
                    .buckets
                    .values()
                    .filter(|positions| self.bucket_matches(positions, value))
                    .flatten()
                    .copied()
                    .collect();
                positions.sort_unstable();
                self.at(positions.into_iter())
            }
        }
    }

    fn bucket_matches(&self, positions: &[usize], value: &Value) -> bool {
        positions
            .first()
            .and_then(|&i| record::field(&self.records[i], &self.field))
            .map(|have| self.policy.equals(have, value))
            .unwrap_or(false)
    }

    fn at(&self, positions: impl Iterator<Item = usize>) -> Vec<&Record> {
        positions.map(|i| &self.records[i]).collect()
    }

    /// Indexed field
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Equality policy lookups follow
    pub fn policy(&self) -> EqualityPolicy {
        self.policy
    }

    /// Number of distinct values
    pub fn distinct_values(&self) -> usize {
        self.buckets.len()
    }

    /// Number of indexed records
    pub fn indexed_records(&self) -> usize {
        self.records.len()
    }

    /// Table version this index was built from
    pub fn built_from_version(&self) -> u64 {
        self.built_from_version
    }

    /// Build time
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// True if the table has been mutated since the build
    pub fn is_stale(&self, current_version: u64) -> bool {
        current_version != self.built_from_version
    }
}
