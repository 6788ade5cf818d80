//! CLI command implementations
//!
//! Each command loads the configuration, opens the database and calls the
//! programmatic API; nothing here has behavior of its own.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use crate::condition::ConditionSet;
use crate::config::DbConfig;
use crate::errors::DbError;
use crate::query::{QueryDescriptor, SortDirection};
use crate::record::{self, Record};
use crate::session::Database;
use crate::storage::AesGcmTransform;

use super::args::{Cli, Command};
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{write_error, write_response, write_step};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = run_command(&cli.config, cli.command);
    if let Err(e) = &result {
        // Best effort; the error is also returned to main
        let _ = write_error(e.code_str(), e.message());
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(config_path: &Path, cmd: Command) -> CliResult<()> {
    let config = load_config(config_path)?;
    match cmd {
        Command::Init => init(&config),
        Command::CreateTable { name } => create_table(&config, &name),
        Command::Dump { table } => dump(&config, &table),
        Command::Backup { table, path } => backup(&config, &table, &path),
        Command::Restore { table, path } => restore(&config, &table, &path),
        Command::Demo { table, secret } => demo(&config, &table, &secret),
    }
}

fn load_config(path: &Path) -> CliResult<DbConfig> {
    let config = DbConfig::load(path)?;
    config.apply_logging();
    Ok(config)
}

fn records_json(records: Vec<Record>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}

fn rec(value: Value) -> CliResult<Record> {
    let kind = match &value {
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "bool",
        Value::Null => "null",
        Value::Object(_) => "object",
    };
    record::record_from_value(value).ok_or_else(|| {
        CliError::new(
            CliErrorCode::DatabaseError,
            format!("record must be a JSON object, got {}", kind),
        )
    })
}

/// Create the data directory
pub fn init(config: &DbConfig) -> CliResult<()> {
    let existed = config.data_dir.is_dir();
    fs::create_dir_all(&config.data_dir).map_err(|e| {
        CliError::io_error(format!(
            "Failed to create data directory {}: {}",
            config.data_dir.display(),
            e
        ))
    })?;

    write_response(json!({
        "data_dir": config.data_dir.display().to_string(),
        "created": !existed,
    }))
}

/// Create an empty table snapshot
pub fn create_table(config: &DbConfig, name: &str) -> CliResult<()> {
    let db = Database::open(config)?;
    let created = db.create_table(name)?;
    write_response(json!({"table": name, "created": created}))
}

/// Print a table snapshot
pub fn dump(config: &DbConfig, table: &str) -> CliResult<()> {
    let db = Database::open(config)?;
    let session = db.table(table)?;
    write_response(records_json(session.records().to_vec()))
}

/// Copy a table snapshot to `path`
pub fn backup(config: &DbConfig, table: &str, path: &Path) -> CliResult<()> {
    let db = Database::open(config)?;
    let session = db.table(table)?;
    session.backup(path)?;
    write_response(json!({
        "table": table,
        "path": path.display().to_string(),
        "records": session.records().len(),
    }))
}

/// Replace a table from `path` and persist it
pub fn restore(config: &DbConfig, table: &str, path: &Path) -> CliResult<()> {
    let db = Database::open(config)?;
    let mut session = db.table(table)?;
    let records = session.restore(path)?;
    session.persist()?;
    write_response(json!({
        "table": table,
        "path": path.display().to_string(),
        "records": records,
    }))
}

/// Users walkthrough: insert, query, update, delete, index, backup,
/// seal, truncate. Each step prints one line.
pub fn demo(config: &DbConfig, table: &str, secret: &str) -> CliResult<()> {
    let db = Database::open(config)?;
    db.create_table(table)?;
    let mut users = db.table(table)?;

    users.insert(vec![
        rec(json!({"id": 1, "name": "John Doe", "email": "john@example.com", "age": 30}))?,
        rec(json!({"id": 2, "name": "Jane Smith", "email": "jane@example.com", "age": 25}))?,
        rec(json!({"id": 3, "name": "Alice Johnson", "email": "alice@example.com", "age": 28}))?,
    ])?;
    write_step("insert", records_json(users.rows(&QueryDescriptor::new())?))?;

    let updated = users.update(
        &ConditionSet::new().and_where("id", "=", json!(1)),
        &rec(json!({"age": 31}))?,
    )?;
    let deleted = users.delete(&ConditionSet::new().and_where("id", "=", json!(2)))?;
    users.insert(vec![rec(
        json!({"id": 4, "name": "Bob Brown", "email": "bob@example.com", "age": 22}),
    )?])?;
    write_step(
        "update_delete",
        json!({
            "updated": updated,
            "deleted": deleted,
            "records": records_json(users.rows(&QueryDescriptor::new())?),
        }),
    )?;

    let query = QueryDescriptor::new()
        .and_where("age", ">", json!(20))
        .or_like("name", "Alice%")
        .order_by("age", SortDirection::Desc)
        .limit(2);
    write_step("query", records_json(users.rows(&query)?))?;

    users.create_index("email");
    let hits = users.query_index("email", &json!("alice@example.com"))?;
    write_step("index", records_json(hits))?;

    let backup_path = config.data_dir.join(format!("{}.backup.json", table));
    users.backup(&backup_path)?;
    let restored = users.restore(&backup_path)?;
    write_step(
        "backup_restore",
        json!({"path": backup_path.display().to_string(), "records": restored}),
    )?;

    let transform = AesGcmTransform::from_secret(secret).map_err(DbError::from)?;
    let sealed = users.seal(&transform)?;
    let opened = users.unseal(&sealed, &transform)?;
    write_step(
        "seal",
        json!({"transform": sealed.transform_id, "sealed": sealed.entries.len(), "opened": opened}),
    )?;

    let removed = users.truncate()?;
    write_step("truncate", json!({"removed": removed}))
}
