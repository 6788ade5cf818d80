//! Table session: one selected table's working copy
//!
//! Reads go through the query pipeline and never change the working copy.
//! Conditions live in the caller's `QueryDescriptor`, so nothing carries
//! over from one query to the next.

use rand::seq::SliceRandom;
use serde_json::Value;

use crate::condition::{EqualityPolicy, Expr};
use crate::errors::DbResult;
use crate::index::{IndexManager, SecondaryIndex};
use crate::query::{aggregate, check_field, ColumnStats, Pipeline, QueryDescriptor, QueryOutput, Stage};
use crate::record::{Record, Table};
use crate::storage::{JsonFileStore, SnapshotStore};

/// Working copy of one table plus its session-private indexes.
///
/// `version` increases on every change to the working copy, whether or
/// not it was persisted. Indexes remember the version they were built
/// from.
///
/// Sessions are single-threaded and hold no lock on the snapshot: two
/// sessions persisting the same table race, and the last writer wins.
#[derive(Debug)]
pub struct TableSession<'db, S: SnapshotStore = JsonFileStore> {
    pub(super) store: &'db S,
    pub(super) policy: EqualityPolicy,
    pub(super) table: Table,
    pub(super) indexes: IndexManager,
    pub(super) version: u64,
}

impl<'db, S: SnapshotStore> TableSession<'db, S> {
    pub fn name(&self) -> &str {
        self.table.name()
    }

    /// Current working copy, in table order
    pub fn records(&self) -> &[Record] {
        self.table.records()
    }

    /// Mutation version of the working copy
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn policy(&self) -> EqualityPolicy {
        self.policy
    }

    /// Re-reads the persisted snapshot, ignoring unpersisted changes
    pub fn persisted_records(&self) -> DbResult<Vec<Record>> {
        let name = self.table.name();
        self.store.load_table(name).map_err(|e| {
            super::database::report_malformed(name, &e);
            e.into()
        })
    }

    fn pipeline(&self) -> Pipeline<'db> {
        Pipeline::new(self.store, self.policy)
    }

    // ==================
    // Query helpers
    // ==================

    /// Executes `query` against the working copy
    pub fn get(&self, query: &QueryDescriptor) -> DbResult<QueryOutput> {
        Ok(self.pipeline().execute(&self.table, query)?)
    }

    /// Executes `query`; grouped output is flattened in group order
    pub fn rows(&self, query: &QueryDescriptor) -> DbResult<Vec<Record>> {
        Ok(self.get(query)?.into_records())
    }

    pub fn count(&self, query: &QueryDescriptor) -> DbResult<usize> {
        Ok(self.rows(query)?.len())
    }

    pub fn exists(&self, query: &QueryDescriptor) -> DbResult<bool> {
        Ok(!self.rows(query)?.is_empty())
    }

    pub fn first(&self, query: &QueryDescriptor) -> DbResult<Option<Record>> {
        Ok(self.rows(query)?.into_iter().next())
    }

    pub fn last(&self, query: &QueryDescriptor) -> DbResult<Option<Record>> {
        Ok(self.rows(query)?.pop())
    }

    /// First record whose `field` equals `value`
    pub fn find(&self, field: &str, value: Value) -> DbResult<Option<Record>> {
        self.first(&QueryDescriptor::new().and_where(field, "=", value))
    }

    /// Records whose `field` equals any of `values`, in table order
    pub fn find_many(&self, field: &str, values: &[Value]) -> DbResult<Vec<Record>> {
        let any = Expr::any(values.iter().map(|v| Expr::eq(field, v.clone())));
        self.rows(&QueryDescriptor::new().and_expr(any))
    }

    /// Up to `n` records of the result, sampled uniformly
    pub fn random(&self, query: &QueryDescriptor, n: usize) -> DbResult<Vec<Record>> {
        let mut rows = self.rows(query)?;
        rows.shuffle(&mut rand::thread_rng());
        rows.truncate(n);
        Ok(rows)
    }

    // ==================
    // Aggregates
    // ==================

    fn column(&self, query: &QueryDescriptor, field: &str) -> DbResult<Vec<Record>> {
        check_field(Stage::Aggregate, field)?;
        self.rows(query)
    }

    pub fn sum(&self, query: &QueryDescriptor, field: &str) -> DbResult<f64> {
        let rows = self.column(query, field)?;
        Ok(aggregate::sum(&rows, field, self.policy))
    }

    pub fn avg(&self, query: &QueryDescriptor, field: &str) -> DbResult<f64> {
        let rows = self.column(query, field)?;
        Ok(aggregate::avg(&rows, field, self.policy)?)
    }

    pub fn min(&self, query: &QueryDescriptor, field: &str) -> DbResult<Value> {
        let rows = self.column(query, field)?;
        Ok(aggregate::min(&rows, field)?)
    }

    pub fn max(&self, query: &QueryDescriptor, field: &str) -> DbResult<Value> {
        let rows = self.column(query, field)?;
        Ok(aggregate::max(&rows, field)?)
    }

    pub fn pluck(&self, query: &QueryDescriptor, field: &str) -> DbResult<Vec<Value>> {
        let rows = self.column(query, field)?;
        Ok(aggregate::pluck(&rows, field))
    }

    pub fn pluck_distinct(&self, query: &QueryDescriptor, field: &str) -> DbResult<Vec<Value>> {
        let rows = self.column(query, field)?;
        Ok(aggregate::pluck_distinct(&rows, field))
    }

    pub fn pluck_where(
        &self,
        query: &QueryDescriptor,
        field: &str,
        condition_field: &str,
        condition_value: &Value,
    ) -> DbResult<Vec<Value>> {
        check_field(Stage::Aggregate, condition_field)?;
        let rows = self.column(query, field)?;
        Ok(aggregate::pluck_where(
            &rows,
            field,
            condition_field,
            condition_value,
            self.policy,
        ))
    }

    pub fn stats(&self, query: &QueryDescriptor, field: &str) -> DbResult<ColumnStats> {
        let rows = self.column(query, field)?;
        Ok(aggregate::stats(&rows, field, self.policy)?)
    }

    // ==================
    // Index
    // ==================

    /// Builds (or rebuilds) the index on `field` from the working copy
    pub fn create_index(&mut self, field: &str) -> &SecondaryIndex {
        self.indexes
            .build(&self.table, field, self.version, self.policy)
    }

    /// Records whose `field` equals `value` under the session policy.
    /// Stale indexes answer from their build snapshot.
    pub fn query_index(&self, field: &str, value: &Value) -> DbResult<Vec<Record>> {
        let hits = self.indexes.lookup(field, value)?;
        Ok(hits.into_iter().cloned().collect())
    }

    /// Whether the working copy changed since the index on `field` was built
    pub fn index_is_stale(&self, field: &str) -> DbResult<bool> {
        Ok(self.indexes.is_stale(field, self.version)?)
    }

    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DbError;
    use crate::query::{QueryError, SortDirection};
    use crate::session::Database;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn database() -> Database<MemoryStore> {
        let store = MemoryStore::new();
        store
            .save_table(
                "users",
                &[
                    rec(json!({"id": 1, "name": "John", "age": 30})),
                    rec(json!({"id": 2, "name": "Jane", "age": 25})),
                    rec(json!({"id": 3, "name": "Alice", "age": 28})),
                ],
            )
            .unwrap();
        Database::with_store(store, EqualityPolicy::Strict)
    }

    #[test]
    fn test_first_last_exists() {
        let db = database();
        let users = db.table("users").unwrap();
        let by_age = QueryDescriptor::new().order_by("age", SortDirection::Asc);

        assert_eq!(users.first(&by_age).unwrap().unwrap()["name"], json!("Jane"));
        assert_eq!(users.last(&by_age).unwrap().unwrap()["name"], json!("John"));
        assert!(users.exists(&QueryDescriptor::new()).unwrap());
        assert!(!users
            .exists(&QueryDescriptor::new().and_where("age", ">", json!(99)))
            .unwrap());
    }

    #[test]
    fn test_find_and_find_many() {
        let db = database();
        let users = db.table("users").unwrap();

        assert_eq!(users.find("id", json!(2)).unwrap().unwrap()["name"], json!("Jane"));
        assert!(users.find("id", json!(9)).unwrap().is_none());

        let many = users.find_many("id", &[json!(3), json!(1)]).unwrap();
        let names: Vec<_> = many.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("John"), json!("Alice")]);

        assert!(users.find_many("id", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_random_sample() {
        let db = database();
        let users = db.table("users").unwrap();

        let sample = users.random(&QueryDescriptor::new(), 2).unwrap();
        assert_eq!(sample.len(), 2);
        assert!(sample.iter().all(|r| users.records().contains(r)));
        assert_eq!(users.random(&QueryDescriptor::new(), 10).unwrap().len(), 3);
    }

    #[test]
    fn test_aggregates_follow_result_set() {
        let db = database();
        let users = db.table("users").unwrap();
        let older = QueryDescriptor::new().and_where("age", ">", json!(26));

        assert_eq!(users.count(&older).unwrap(), 2);
        assert_eq!(users.sum(&older, "age").unwrap(), 58.0);
        assert_eq!(users.avg(&older, "age").unwrap(), 29.0);
        assert_eq!(users.min(&QueryDescriptor::new(), "age").unwrap(), json!(25));
        assert_eq!(users.max(&QueryDescriptor::new(), "name").unwrap(), json!("John"));
        assert_eq!(
            users.pluck_where(&QueryDescriptor::new(), "name", "age", &json!(25)).unwrap(),
            vec![json!("Jane")]
        );
    }

    #[test]
    fn test_avg_over_nothing_fails() {
        let db = database();
        let users = db.table("users").unwrap();
        let none = QueryDescriptor::new().and_where("age", ">", json!(99));

        let err = users.avg(&none, "age").unwrap_err();
        assert!(matches!(
            err,
            DbError::Query(QueryError::EmptyAggregate { .. })
        ));
        assert_eq!(users.sum(&none, "age").unwrap(), 0.0);
        assert!(users.stats(&none, "age").is_err());
    }

    #[test]
    fn test_empty_aggregate_field_rejected() {
        let db = database();
        let users = db.table("users").unwrap();
        let err = users.sum(&QueryDescriptor::new(), "").unwrap_err();
        assert_eq!(err.code(), "JSONSQL_INVALID_FIELD");
    }

    #[test]
    fn test_index_lookup_and_staleness() {
        let db = database();
        let mut users = db.table("users").unwrap();

        assert!(users.query_index("age", &json!(25)).is_err());

        users.create_index("age");
        assert_eq!(users.query_index("age", &json!(25)).unwrap().len(), 1);
        assert!(!users.index_is_stale("age").unwrap());

        users.insert(vec![rec(json!({"id": 4, "age": 25}))]).unwrap();
        assert!(users.index_is_stale("age").unwrap());
        assert_eq!(users.query_index("age", &json!(25)).unwrap().len(), 1);

        users.create_index("age");
        assert_eq!(users.query_index("age", &json!(25)).unwrap().len(), 2);
    }
}
