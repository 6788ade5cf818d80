//! Query pipeline
//!
//! Execution flow (fixed order, each stage consumes the previous output):
//! 1. Filter by the condition chain
//! 2. Inner join with a second table
//! 3. Group by one field
//! 4. Order by one field (stable)
//! 5. Offset, then limit
//! 6. Distinct (first occurrence wins)
//! 7. Having
//! 8. Projection
//!
//! Once grouped, stages 4-8 run on each group's list independently.
//! Having runs after pagination and does not see aggregates.
//!
//! The pipeline never mutates the table it reads. All operators, operands
//! and field names are validated before the first record is touched, so a
//! bad query fails even against an empty table.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::condition::{sort_order, EqualityPolicy, Filter, Predicate};
use crate::observability::{log_event_with_fields, Event};
use crate::record::{self, Record, Table, ValueKey};
use crate::storage::SnapshotStore;

use super::descriptor::{JoinSpec, Projection, QueryDescriptor, SortDirection, SortSpec};
use super::errors::{check_field, QueryResult, Stage};
use super::output::{Group, QueryOutput};

/// Validated per-list stages (4-8)
struct Shaping<'q> {
    order_by: Option<&'q SortSpec>,
    offset: Option<usize>,
    limit: Option<usize>,
    distinct: Option<&'q [String]>,
    having: Vec<Predicate>,
    projection: &'q Projection,
}

/// Executes query descriptors against tables
pub struct Pipeline<'a> {
    store: &'a dyn SnapshotStore,
    policy: EqualityPolicy,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline; `store` is only read, for joins
    pub fn new(store: &'a dyn SnapshotStore, policy: EqualityPolicy) -> Self {
        Self { store, policy }
    }

    /// Returns the equality policy in use
    pub fn policy(&self) -> EqualityPolicy {
        self.policy
    }

    /// Runs every stage over `table`.
    pub fn execute(&self, table: &Table, query: &QueryDescriptor) -> QueryResult<QueryOutput> {
        let result = self.run(table, query);

        match &result {
            Ok(output) => {
                let scanned = table.len().to_string();
                let returned = output.len().to_string();
                log_event_with_fields(
                    Event::QueryExecuted,
                    &[
                        ("table", table.name()),
                        ("scanned", &scanned),
                        ("returned", &returned),
                    ],
                );
            }
            Err(e) => {
                let reason = e.to_string();
                log_event_with_fields(
                    Event::QueryRejected,
                    &[("table", table.name()), ("code", e.code()), ("reason", &reason)],
                );
            }
        }

        result
    }

    fn run(&self, table: &Table, query: &QueryDescriptor) -> QueryResult<QueryOutput> {
        let filter = Filter::compile(&query.conditions, Stage::Filter)?;
        let shaping = Self::validate_shaping(query)?;
        if let Some(join) = &query.join {
            check_field(Stage::Join, &join.local_key)?;
            check_field(Stage::Join, &join.foreign_key)?;
        }
        if let Some(field) = &query.group_by {
            check_field(Stage::GroupBy, field)?;
        }

        // Stage 1: filter
        let mut rows: Vec<Record> = table
            .records()
            .iter()
            .filter(|r| filter.matches(r, self.policy))
            .cloned()
            .collect();

        // Stage 2: join
        if let Some(join) = &query.join {
            rows = self.join(rows, join)?;
        }

        // Stage 3: group
        match &query.group_by {
            Some(field) => {
                let groups = group_by(rows, field)
                    .into_iter()
                    .map(|group| Group {
                        key: group.key,
                        records: self.shape(group.records, &shaping),
                    })
                    .collect();
                Ok(QueryOutput::Groups(groups))
            }
            None => Ok(QueryOutput::Rows(self.shape(rows, &shaping))),
        }
    }

    fn validate_shaping(query: &QueryDescriptor) -> QueryResult<Shaping<'_>> {
        if let Some(sort) = &query.order_by {
            check_field(Stage::OrderBy, &sort.field)?;
        }
        if let Some(fields) = &query.distinct {
            for field in fields {
                check_field(Stage::Distinct, field)?;
            }
        }
        if let Projection::Fields(fields) = &query.projection {
            for field in fields {
                check_field(Stage::Projection, field)?;
            }
        }
        let having = query
            .having
            .iter()
            .map(|c| Predicate::compile(c, Stage::Having))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(Shaping {
            order_by: query.order_by.as_ref(),
            offset: query.offset,
            limit: query.limit,
            distinct: query.distinct.as_deref(),
            having,
            projection: &query.projection,
        })
    }

    /// Inner join. A pair matches when both keys are present and equal;
    /// a missing key on either side is a non-match, not an error.
    fn join(&self, left: Vec<Record>, spec: &JoinSpec) -> QueryResult<Vec<Record>> {
        let right = self.store.load_table(&spec.table)?;
        let mut joined = Vec::new();

        for base in &left {
            let Some(local) = record::field(base, &spec.local_key) else {
                continue;
            };
            for other in &right {
                let Some(foreign) = record::field(other, &spec.foreign_key) else {
                    continue;
                };
                if self.policy.equals(local, foreign) {
                    let mut merged = base.clone();
                    record::merge_into(&mut merged, other);
                    joined.push(merged);
                }
            }
        }

        Ok(joined)
    }

    /// Stages 4-8 on one list
    fn shape(&self, mut rows: Vec<Record>, shaping: &Shaping<'_>) -> Vec<Record> {
        if let Some(sort) = shaping.order_by {
            sort_records(&mut rows, sort);
        }

        let skip = shaping.offset.unwrap_or(0);
        let take = shaping.limit.unwrap_or(usize::MAX);
        let mut rows: Vec<Record> = rows.into_iter().skip(skip).take(take).collect();

        if let Some(fields) = shaping.distinct {
            rows = distinct(rows, fields);
        }

        if !shaping.having.is_empty() {
            rows.retain(|r| shaping.having.iter().all(|p| p.matches(r, self.policy)));
        }

        match shaping.projection {
            Projection::All => rows,
            Projection::Fields(fields) => rows.iter().map(|r| record::project(r, fields)).collect(),
        }
    }
}

/// Stable sort by one field. Equal keys keep their input order in both
/// directions.
pub fn sort_records(rows: &mut [Record], sort: &SortSpec) {
    rows.sort_by(|a, b| {
        let ordering = sort_order(record::field(a, &sort.field), record::field(b, &sort.field));
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Dedupes by a structured key over `fields` (the whole record when
/// `fields` is empty). First occurrence wins; survivors keep their order.
pub fn distinct(rows: Vec<Record>, fields: &[String]) -> Vec<Record> {
    let mut seen: HashSet<Vec<Option<ValueKey>>> = HashSet::new();

    rows.into_iter()
        .filter(|r| {
            let key: Vec<Option<ValueKey>> = if fields.is_empty() {
                vec![Some(ValueKey::from_json(&Value::Object(r.clone())))]
            } else {
                fields
                    .iter()
                    .map(|f| ValueKey::from_field(record::field(r, f)))
                    .collect()
            };
            seen.insert(key)
        })
        .collect()
}

/// Partitions records by the value of `field`, groups in first-appearance
/// order. Records lacking the field share the `None` group.
pub fn group_by(rows: Vec<Record>, field: &str) -> Vec<Group> {
    let mut positions: HashMap<Option<ValueKey>, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for row in rows {
        let value = record::field(&row, field).cloned();
        let key = ValueKey::from_field(value.as_ref());
        let position = *positions.entry(key).or_insert_with(|| {
            groups.push(Group {
                key: value,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].records.push(row);
    }

    groups
}
