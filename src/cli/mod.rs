//! CLI module for jsonsql
//!
//! Provides command-line access to:
//! - init: Create the data directory
//! - create-table: Write an empty table snapshot
//! - dump: Print a table snapshot
//! - backup / restore: Copy a snapshot out or back in
//! - demo: Walk through the query API on a scratch table

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{backup, create_table, demo, dump, init, restore, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
