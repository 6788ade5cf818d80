//! Database configuration
//!
//! Loaded from a JSON file:
//!
//! ```json
//! {
//!   "data_dir": "./data",
//!   "pretty_print": true,
//!   "equality": "strict",
//!   "atomic_writes": false,
//!   "log_level": "info"
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::condition::EqualityPolicy;
use crate::observability::{log_event_with_fields, Event, Logger, Severity};

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for `DbConfig`
    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Config parsed but a value is unusable
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "JSONSQL_CONFIG_READ",
            ConfigError::Parse { .. } => "JSONSQL_CONFIG_PARSE",
            ConfigError::Invalid(_) => "JSONSQL_CONFIG_INVALID",
        }
    }
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Directory holding one `<table>.json` snapshot per table
    pub data_dir: PathBuf,

    /// Pretty-print snapshots (cosmetic only)
    #[serde(default = "default_pretty_print")]
    pub pretty_print: bool,

    /// Equality policy for conditions and key matching
    #[serde(default)]
    pub equality: EqualityPolicy,

    /// Write snapshots to a temp file and rename over the target
    #[serde(default)]
    pub atomic_writes: bool,

    /// Minimum log severity
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_pretty_print() -> bool {
    true
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl DbConfig {
    /// Defaults rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            pretty_print: default_pretty_print(),
            equality: EqualityPolicy::default(),
            atomic_writes: false,
            log_level: default_log_level(),
        }
    }

    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: DbConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        config.validate()?;

        let data_dir = config.data_dir.display().to_string();
        log_event_with_fields(Event::ConfigLoaded, &[("data_dir", &data_dir)]);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }
        Ok(())
    }

    pub fn with_equality(mut self, equality: EqualityPolicy) -> Self {
        self.equality = equality;
        self
    }

    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }

    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Apply `log_level` to the process-wide logger
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.log_level);
    }
}
