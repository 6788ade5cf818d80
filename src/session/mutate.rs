//! Mutations and working-copy transforms
//!
//! Mutations (`insert`, `update`, `delete`, `merge`, `upsert`,
//! `truncate`) rewrite the whole snapshot before returning. The new
//! record list is saved first and only then becomes the working copy, so
//! a failed write leaves the session as it was. There is no batching
//! across calls and no transaction spanning two calls.
//!
//! Transforms (`remove_duplicates`, `clean_empty`, ...) only touch the
//! working copy; call `persist` to keep the result.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde_json::Value;

use crate::condition::{truthy, ConditionSet, Filter};
use crate::errors::DbResult;
use crate::query::{check_field, Stage};
use crate::record::{self, Record, ValueKey};
use crate::storage::SnapshotStore;

use super::table::TableSession;

/// Outcome of `merge` / `upsert`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    /// Existing records merged in place
    pub updated: usize,
    /// Incoming records appended
    pub inserted: usize,
}

impl<S: SnapshotStore> TableSession<'_, S> {
    pub(super) fn touch(&mut self) {
        self.version += 1;
    }

    /// Saves `records` and swaps them in as the working copy.
    fn commit(&mut self, records: Vec<Record>) -> DbResult<()> {
        self.write_snapshot(&records, self.version + 1)?;
        self.table.replace(records);
        self.touch();
        Ok(())
    }

    /// Appends `records` and persists.
    pub fn insert(&mut self, records: impl IntoIterator<Item = Record>) -> DbResult<usize> {
        let mut next = self.table.records().to_vec();
        let before = next.len();
        next.extend(records);
        let inserted = next.len() - before;

        self.commit(next)?;
        Ok(inserted)
    }

    /// Merges `values` over every record matching `conditions` and persists.
    ///
    /// Returns the number of records updated.
    pub fn update(&mut self, conditions: &ConditionSet, values: &Record) -> DbResult<usize> {
        let filter = Filter::compile(conditions, Stage::Mutation)?;
        let policy = self.policy;

        let mut next = self.table.records().to_vec();
        let mut updated = 0;
        for rec in next.iter_mut() {
            if filter.matches(rec, policy) {
                record::merge_into(rec, values);
                updated += 1;
            }
        }

        self.commit(next)?;
        Ok(updated)
    }

    /// Removes every record matching `conditions` and persists.
    ///
    /// Survivors keep their order. Returns the number removed.
    pub fn delete(&mut self, conditions: &ConditionSet) -> DbResult<usize> {
        let filter = Filter::compile(conditions, Stage::Mutation)?;
        let policy = self.policy;

        let next: Vec<Record> = self
            .table
            .records()
            .iter()
            .filter(|rec| !filter.matches(rec, policy))
            .cloned()
            .collect();
        let removed = self.table.len() - next.len();

        self.commit(next)?;
        Ok(removed)
    }

    /// Merges each incoming record into the first record with an equal
    /// `key`, or appends it. Persists once for the whole batch.
    ///
    /// An incoming record without `key` is always appended. Records
    /// appended earlier in the batch can be matched by later ones.
    pub fn merge(&mut self, incoming: Vec<Record>, key: &str) -> DbResult<MergeSummary> {
        check_field(Stage::Mutation, key)?;
        let policy = self.policy;
        let mut next = self.table.records().to_vec();
        let mut summary = MergeSummary::default();

        for new in incoming {
            let position = record::field(&new, key).and_then(|wanted| {
                next.iter().position(|existing| {
                    record::field(existing, key)
                        .map(|have| policy.equals(have, wanted))
                        .unwrap_or(false)
                })
            });

            match position {
                Some(i) => {
                    record::merge_into(&mut next[i], &new);
                    summary.updated += 1;
                }
                None => {
                    next.push(new);
                    summary.inserted += 1;
                }
            }
        }

        self.commit(next)?;
        Ok(summary)
    }

    /// `merge` of a single record
    pub fn upsert(&mut self, record: Record, key: &str) -> DbResult<MergeSummary> {
        self.merge(vec![record], key)
    }

    /// Empties the table and persists.
    pub fn truncate(&mut self) -> DbResult<usize> {
        let removed = self.table.len();
        self.commit(Vec::new())?;
        Ok(removed)
    }

    // ==================
    // Working-copy transforms
    // ==================

    /// Keeps the first record per distinct `field` value.
    ///
    /// Records without the field are kept. Returns the number removed.
    pub fn remove_duplicates(&mut self, field: &str) -> usize {
        let mut seen = HashSet::new();
        let before = self.table.len();
        self.table.records_mut().retain(|rec| match record::field(rec, field) {
            Some(value) => seen.insert(ValueKey::from_json(value)),
            None => true,
        });
        self.touch();
        before - self.table.len()
    }

    /// Drops records whose `field` is absent or empty
    /// (`null`, `false`, `0`, `""`, `"0"`, `[]`).
    pub fn clean_empty(&mut self, field: &str) -> usize {
        let before = self.table.len();
        self.table
            .records_mut()
            .retain(|rec| record::field(rec, field).map(truthy).unwrap_or(false));
        self.touch();
        before - self.table.len()
    }

    /// Replaces present `null` values of `field` with `default`.
    pub fn replace_nulls(&mut self, field: &str, default: Value) -> usize {
        let mut replaced = 0;
        for rec in self.table.records_mut().iter_mut() {
            if let Some(value) = rec.get_mut(field) {
                if value.is_null() {
                    *value = default.clone();
                    replaced += 1;
                }
            }
        }
        self.touch();
        replaced
    }

    /// Rewrites every present value of `field` through `f`.
    pub fn normalize<F>(&mut self, field: &str, mut f: F) -> usize
    where
        F: FnMut(&Value) -> Value,
    {
        let mut changed = 0;
        for rec in self.table.records_mut().iter_mut() {
            if let Some(value) = rec.get_mut(field) {
                *value = f(value);
                changed += 1;
            }
        }
        self.touch();
        changed
    }

    /// Keeps records with `start <= field <= end` (inclusive).
    ///
    /// Records without the field, or with a value not comparable to the
    /// bounds, are dropped. Returns the number removed.
    pub fn filter_by_range(&mut self, field: &str, start: &Value, end: &Value) -> usize {
        let policy = self.policy;
        let before = self.table.len();
        self.table.records_mut().retain(|rec| {
            record::field(rec, field)
                .map(|v| {
                    matches!(policy.compare(v, start), Some(Ordering::Greater | Ordering::Equal))
                        && matches!(policy.compare(v, end), Some(Ordering::Less | Ordering::Equal))
                })
                .unwrap_or(false)
        });
        self.touch();
        before - self.table.len()
    }

    /// Hands the working copy to `f` and returns what it computes.
    pub fn select_raw<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&[Record]) -> T,
    {
        f(self.table.records())
    }

    /// Replaces the working copy with `f(working copy)`.
    pub fn order_by_raw<F>(&mut self, f: F)
    where
        F: FnOnce(Vec<Record>) -> Vec<Record>,
    {
        let records = std::mem::take(self.table.records_mut());
        self.table.replace(f(records));
        self.touch();
    }
}
