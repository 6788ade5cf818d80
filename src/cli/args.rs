//! CLI argument definitions using clap
//!
//! Commands:
//! - jsonsql --config <path> init
//! - jsonsql --config <path> create-table <name>
//! - jsonsql --config <path> dump <table>
//! - jsonsql --config <path> backup <table> <path>
//! - jsonsql --config <path> restore <table> <path>
//! - jsonsql --config <path> demo

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// jsonsql - an embedded, file-backed JSON document store
#[derive(Parser, Debug)]
#[command(name = "jsonsql")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./jsonsql.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory
    Init,

    /// Create an empty table (never overwrites)
    CreateTable {
        /// Table name
        name: String,
    },

    /// Print a table snapshot
    Dump {
        /// Table name
        table: String,
    },

    /// Copy a table snapshot to a file
    Backup {
        /// Table name
        table: String,
        /// Backup file
        path: PathBuf,
    },

    /// Replace a table from a backup file and persist it
    Restore {
        /// Table name
        table: String,
        /// Backup file
        path: PathBuf,
    },

    /// Walk through inserts, queries, an index, a backup and sealing
    Demo {
        /// Table the walkthrough writes to (truncated at the end)
        #[arg(long, default_value = "demo_users")]
        table: String,

        /// Secret for the sealing step
        #[arg(long, default_value = "secret-key")]
        secret: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
