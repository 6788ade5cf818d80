//! JSON output for the CLI
//!
//! Every command writes one JSON object per line to stdout:
//! `{"status": "ok", "data": ...}` or
//! `{"status": "error", "code": ..., "message": ...}`.

use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::CliResult;

fn emit(line: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, line)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    emit(&json!({"status": "ok", "data": data}))
}

/// Write a success response tagged with the demo step that produced it
pub fn write_step(step: &str, data: Value) -> CliResult<()> {
    emit(&json!({"status": "ok", "step": step, "data": data}))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    emit(&json!({"status": "error", "code": code, "message": message}))
}
