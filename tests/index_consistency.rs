//! Index Consistency Tests
//!
//! Tests for index invariants:
//! - Lookup returns exactly the records a linear `field = value` scan finds,
//!   under either equality policy
//! - Records missing the field are in no bucket
//! - Indexes are never refreshed automatically

use std::collections::HashSet;

use jsonsql::condition::EqualityPolicy;
use jsonsql::index::SecondaryIndex;
use jsonsql::query::QueryDescriptor;
use jsonsql::record::{Record, Table};
use jsonsql::storage::MemoryStore;
use jsonsql::Database;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn rec(value: Value) -> Record {
    value.as_object().unwrap().clone()
}

fn mixed_table() -> Table {
    Table::with_records(
        "things",
        vec![
            rec(json!({"id": 1, "k": "a"})),
            rec(json!({"id": 2, "k": 1})),
            rec(json!({"id": 3, "k": 1.0})),
            rec(json!({"id": 4, "k": "1"})),
            rec(json!({"id": 5, "k": null})),
            rec(json!({"id": 6})),
            rec(json!({"id": 7, "k": [1, 2]})),
            rec(json!({"id": 8, "k": "a"})),
            rec(json!({"id": 9, "k": true})),
        ],
    )
}

fn id_set(records: &[Record]) -> HashSet<i64> {
    records.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

// =============================================================================
// Lookup Equivalence Tests
// =============================================================================

/// For every value and both policies, lookup == linear scan with `=`.
#[test]
fn test_lookup_equals_linear_scan() {
    let values = [
        json!("a"),
        json!(1),
        json!(1.0),
        json!("1"),
        json!("1.0"),
        json!(null),
        json!(""),
        json!(0),
        json!([1, 2]),
        json!(true),
        json!(false),
        json!("zzz"),
    ];

    for policy in [EqualityPolicy::Strict, EqualityPolicy::Loose] {
        let db = Database::with_store(MemoryStore::new(), policy);
        let mut session = db.table("things").unwrap();
        session.insert(mixed_table().into_records()).unwrap();
        session.create_index("k");

        for value in &values {
            let scanned = session
                .rows(&QueryDescriptor::new().and_where("k", "=", value.clone()))
                .unwrap();
            let indexed = session.query_index("k", value).unwrap();
            assert_eq!(indexed, scanned, "{:?} value {}", policy, value);
        }
    }
}

/// Loose lookups gather every bucket the value equals, in table order.
#[test]
fn test_loose_lookup_spans_types() {
    let db = Database::with_store(MemoryStore::new(), EqualityPolicy::Loose);
    let mut session = db.table("things").unwrap();
    session
        .insert(vec![
            rec(json!({"id": 1, "k": 1})),
            rec(json!({"id": 2, "k": "1"})),
            rec(json!({"id": 3, "k": true})),
        ])
        .unwrap();
    session.create_index("k");

    let hits = session.query_index("k", &json!(1)).unwrap();
    assert_eq!(id_set(&hits), HashSet::from([1, 2, 3]));
}

/// Records without the field are excluded from every bucket.
#[test]
fn test_missing_field_excluded() {
    let index = SecondaryIndex::build(&mixed_table(), "k", 0, EqualityPolicy::Strict);
    assert_eq!(index.indexed_records(), 8);
    assert_eq!(index.field(), "k");
}

// =============================================================================
// Staleness Tests
// =============================================================================

/// A mutation leaves the index stale until it is rebuilt.
#[test]
fn test_index_is_not_auto_refreshed() {
    let db = Database::with_store(MemoryStore::new(), EqualityPolicy::Strict);
    let mut session = db.table("things").unwrap();
    session.insert(mixed_table().into_records()).unwrap();

    let built_from = session.create_index("k").built_from_version();
    assert_eq!(built_from, session.version());

    session.upsert(rec(json!({"id": 10, "k": "a"})), "id").unwrap();
    assert!(session.index_is_stale("k").unwrap());
    assert_eq!(session.query_index("k", &json!("a")).unwrap().len(), 2);

    session.create_index("k");
    assert!(!session.index_is_stale("k").unwrap());
    assert_eq!(session.query_index("k", &json!("a")).unwrap().len(), 3);
}

/// Working-copy transforms also advance the version.
#[test]
fn test_transform_makes_index_stale() {
    let db = Database::with_store(MemoryStore::new(), EqualityPolicy::Strict);
    let mut session = db.table("things").unwrap();
    session.insert(mixed_table().into_records()).unwrap();
    session.create_index("k");

    session.remove_duplicates("k");
    assert!(session.index_is_stale("k").unwrap());
}

/// Lookup on a field with no index is an error, not an empty result.
#[test]
fn test_unknown_index() {
    let db = Database::with_store(MemoryStore::new(), EqualityPolicy::Strict);
    let session = db.table("things").unwrap();
    let err = session.query_index("k", &json!(1)).unwrap_err();
    assert_eq!(err.code(), "JSONSQL_UNKNOWN_INDEX");
}
