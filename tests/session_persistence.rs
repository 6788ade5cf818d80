//! Session Persistence Tests
//!
//! Tests for mutation and snapshot invariants on a real data directory:
//! - Missing table is empty, malformed snapshot is fatal
//! - update/delete touch exactly the matching subset
//! - upsert merges in place without adding a record
//! - Every mutation is persisted before it returns
//! - A failed write leaves the working copy and version untouched
//! - Sealed records open to the exact original

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jsonsql::condition::{ConditionSet, EqualityPolicy};
use jsonsql::query::QueryDescriptor;
use jsonsql::record::Record;
use jsonsql::session::MergeSummary;
use jsonsql::storage::{
    AesGcmTransform, MemoryStore, RecordTransform, SnapshotStore, StorageError, StorageResult,
};
use jsonsql::{Database, DbConfig, DbError};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn rec(value: Value) -> Record {
    value.as_object().unwrap().clone()
}

fn open(dir: &TempDir) -> Database {
    Database::open(&DbConfig::new(dir.path().join("data"))).unwrap()
}

fn seed_users(db: &Database) {
    db.create_table("users").unwrap();
    db.table("users")
        .unwrap()
        .insert(vec![
            rec(json!({"id": 1, "name": "John", "email": "john@example.com", "age": 30})),
            rec(json!({"id": 2, "name": "Jane", "email": "jane@example.com", "age": 25})),
            rec(json!({"id": 3, "name": "Alice", "email": "alice@example.com", "age": 28})),
        ])
        .unwrap();
}

/// Memory store whose writes can be switched off
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    reject_writes: Cell<bool>,
}

impl SnapshotStore for FlakyStore {
    fn table_path(&self, table: &str) -> PathBuf {
        self.inner.table_path(table)
    }

    fn read_bytes(&self, path: &Path) -> StorageResult<Option<Vec<u8>>> {
        self.inner.read_bytes(path)
    }

    fn write_bytes(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        if self.reject_writes.get() {
            return Err(StorageError::io(
                format!("write {}", path.display()),
                io::Error::new(io::ErrorKind::Other, "disk full"),
            ));
        }
        self.inner.write_bytes(path, bytes)
    }
}

fn snapshot_text(dir: &TempDir, table: &str) -> String {
    fs::read_to_string(dir.path().join("data").join(format!("{}.json", table))).unwrap()
}

// =============================================================================
// Snapshot Loading Tests
// =============================================================================

/// A table with no snapshot file loads as empty.
#[test]
fn test_missing_table_is_empty() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);

    let table = db.table("never_created").unwrap();
    assert!(table.records().is_empty());
    assert_eq!(table.count(&QueryDescriptor::new()).unwrap(), 0);
}

/// An unparsable snapshot is surfaced as fatal, never as empty.
#[test]
fn test_malformed_snapshot_is_fatal() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    fs::write(dir.path().join("data").join("users.json"), "[{\"id\": 1,").unwrap();

    match db.table("users") {
        Err(err @ DbError::Storage(_)) => {
            assert_eq!(err.code(), "JSONSQL_MALFORMED_SNAPSHOT");
            assert!(err.is_fatal());
        }
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("malformed snapshot loaded"),
    }
}

/// create_table writes `[]` and never overwrites an existing snapshot.
#[test]
fn test_create_table_keeps_existing_data() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    seed_users(&db);

    assert!(!db.create_table("users").unwrap());
    assert_eq!(db.table("users").unwrap().records().len(), 3);

    assert!(db.create_table("empty").unwrap());
    let text = snapshot_text(&dir, "empty");
    assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), json!([]));
}

// =============================================================================
// Mutation Tests
// =============================================================================

/// update under `id = 1` leaves every other record byte-for-byte unchanged.
#[test]
fn test_update_changes_only_matching() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    seed_users(&db);
    let before = db.table("users").unwrap().records().to_vec();

    let updated = db
        .table("users")
        .unwrap()
        .update(
            &ConditionSet::new().and_where("id", "=", json!(1)),
            &rec(json!({"age": 31})),
        )
        .unwrap();
    assert_eq!(updated, 1);

    let after = db.table("users").unwrap().records().to_vec();
    assert_eq!(after[0]["age"], json!(31));
    for i in 1..3 {
        assert_eq!(
            serde_json::to_string(&after[i]).unwrap(),
            serde_json::to_string(&before[i]).unwrap()
        );
    }
}

/// delete removes exactly the matching subset.
#[test]
fn test_delete_count() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    seed_users(&db);

    let conditions = ConditionSet::new().and_where("age", "<", json!(29));
    let matched = db
        .table("users")
        .unwrap()
        .count(&QueryDescriptor::with_conditions(conditions.clone()))
        .unwrap();

    let removed = db.table("users").unwrap().delete(&conditions).unwrap();
    assert_eq!(removed, matched);
    assert_eq!(db.table("users").unwrap().records().len(), 3 - matched);
}

/// upsert({id: 2, age: 99}) keeps name and email and adds no record.
#[test]
fn test_upsert_preserves_other_fields() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    seed_users(&db);

    let summary = db
        .table("users")
        .unwrap()
        .upsert(rec(json!({"id": 2, "age": 99})), "id")
        .unwrap();
    assert_eq!(summary, MergeSummary { updated: 1, inserted: 0 });

    let table = db.table("users").unwrap();
    assert_eq!(table.records().len(), 3);
    let jane = table.find("id", json!(2)).unwrap().unwrap();
    assert_eq!(
        jane,
        rec(json!({"id": 2, "name": "Jane", "email": "jane@example.com", "age": 99}))
    );
}

/// A mutation is on disk before the call returns.
#[test]
fn test_insert_persists_immediately() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);

    let mut table = db.table("events").unwrap();
    table.insert(vec![rec(json!({"kind": "start"}))]).unwrap();

    let on_disk: Value = serde_json::from_str(&snapshot_text(&dir, "events")).unwrap();
    assert_eq!(on_disk, json!([{"kind": "start"}]));
}

/// When the snapshot write fails, every mutation leaves the session as it
/// was: same records, same version, nothing to be persisted later.
#[test]
fn test_failed_write_keeps_working_copy() {
    let db = Database::with_store(FlakyStore::default(), EqualityPolicy::Strict);
    let mut users = db.table("users").unwrap();
    users
        .insert(vec![
            rec(json!({"id": 1, "name": "John", "age": 30})),
            rec(json!({"id": 2, "name": "Jane", "age": 25})),
        ])
        .unwrap();
    let records = users.records().to_vec();
    let version = users.version();

    db.store().reject_writes.set(true);
    let by_id = ConditionSet::new().and_where("id", "=", json!(1));
    assert!(users.update(&by_id, &rec(json!({"age": 99}))).is_err());
    assert!(users.insert(vec![rec(json!({"id": 3}))]).is_err());
    assert!(users.delete(&by_id).is_err());
    assert!(users.upsert(rec(json!({"id": 2, "age": 1})), "id").is_err());
    assert!(users.truncate().is_err());

    assert_eq!(users.records(), records.as_slice());
    assert_eq!(users.version(), version);

    db.store().reject_writes.set(false);
    users.insert(vec![rec(json!({"id": 4}))]).unwrap();
    let persisted = users.persisted_records().unwrap();
    assert_eq!(persisted.len(), 3);
    assert_eq!(persisted[0]["age"], json!(30));
}

/// Atomic writes leave no temp files behind.
#[test]
fn test_atomic_writes() {
    let dir = TempDir::new().unwrap();
    let config = DbConfig::new(dir.path().join("data")).with_atomic_writes(true);
    let db = Database::open(&config).unwrap();
    seed_users(&db);

    let names: Vec<String> = fs::read_dir(dir.path().join("data"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["users.json".to_string()]);
    assert_eq!(db.table("users").unwrap().records().len(), 3);
}

/// Loose equality matches numeric strings; strict does not.
#[test]
fn test_equality_policy_from_config() {
    let dir = TempDir::new().unwrap();
    let strict = open(&dir);
    seed_users(&strict);

    let query = QueryDescriptor::new().and_where("id", "=", json!("2"));
    assert_eq!(strict.table("users").unwrap().count(&query).unwrap(), 0);

    let loose = Database::open(
        &DbConfig::new(dir.path().join("data")).with_equality(EqualityPolicy::Loose),
    )
    .unwrap();
    assert_eq!(loose.table("users").unwrap().count(&query).unwrap(), 1);
}

// =============================================================================
// File Operation Tests
// =============================================================================

/// Backup then restore reproduces the working copy; restore is not a persist.
#[test]
fn test_backup_restore_round_trip() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    seed_users(&db);
    let backup = dir.path().join("users.backup.json");

    let mut table = db.table("users").unwrap();
    table.backup(&backup).unwrap();
    table.truncate().unwrap();

    table.restore(&backup).unwrap();
    assert_eq!(table.records().len(), 3);
    assert!(db.table("users").unwrap().records().is_empty());
    assert!(table.persisted_records().unwrap().is_empty());

    table.persist().unwrap();
    assert_eq!(db.table("users").unwrap().records().len(), 3);
}

/// Seal then open with the same secret reproduces every record exactly.
#[test]
fn test_seal_round_trip() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let mut table = db.table("mixed").unwrap();
    let original = vec![
        rec(json!({"id": 1, "nested": [1, [2, 3]], "f": 0.1, "n": null})),
        rec(json!({"unicode": "héllo", "big": 9007199254740993u64, "neg": -5})),
    ];
    table.insert(original.clone()).unwrap();

    let transform = AesGcmTransform::from_secret("K").unwrap();
    let sealed = table.seal(&transform).unwrap();
    let path = dir.path().join("mixed.sealed.json");
    table.write_sealed(&sealed, &path).unwrap();

    let mut other = db.table("restored").unwrap();
    let read = other.read_sealed(&path, transform.transform_id()).unwrap();
    other.unseal(&read, &transform).unwrap();
    assert_eq!(other.records(), original.as_slice());
}
