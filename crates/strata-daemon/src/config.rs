// crates/strata-daemon/src/config.rs
//
// Runtime configuration for the Strata daemon.
// Loaded from a TOML file or populated with sensible defaults. Nothing here
// changes deterministic behavior: consensus-relevant settings live in the
// store's config groups.

use serde::Deserialize;
use std::fs;

use strata_engine::Genesis;

use crate::error::DaemonError;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Directory for local data storage (RocksDB).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// JSON-lines file of blocks or operations to process.
    #[serde(default = "default_feed_path")]
    pub feed_path: String,

    /// TOML genesis file, applied once on an empty store.
    #[serde(default)]
    pub genesis_path: Option<String>,

    /// Log level used when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Keep polling the feed for new lines instead of exiting at its end.
    #[serde(default)]
    pub follow: bool,

    /// How long to wait between polls of an exhausted feed in follow mode.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Stop after processing this block.
    #[serde(default)]
    pub stop_at_block: Option<u64>,

    /// Log a progress summary every this many blocks.
    #[serde(default = "default_block_batch_log_interval")]
    pub block_batch_log_interval: u64,
}

fn default_data_dir() -> String {
    "~/.strata/data".to_string()
}

fn default_feed_path() -> String {
    "~/.strata/feed.jsonl".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_block_batch_log_interval() -> u64 {
    1000
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            feed_path: default_feed_path(),
            genesis_path: None,
            log_level: default_log_level(),
            follow: false,
            poll_interval_ms: default_poll_interval_ms(),
            stop_at_block: None,
            block_batch_log_interval: default_block_batch_log_interval(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, DaemonError> {
        let contents = fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&contents)
            .map_err(|e| DaemonError::Config(format!("{}: {}", path, e)))?;
        Ok(config)
    }
}

/// Parse a TOML genesis file.
pub fn load_genesis(path: &str) -> Result<Genesis, DaemonError> {
    let contents = fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|e| DaemonError::Config(format!("genesis {}: {}", path, e)))
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
