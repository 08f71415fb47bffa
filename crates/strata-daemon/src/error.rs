// crates/strata-daemon/src/error.rs

use thiserror::Error;

use strata_core::error::StrataError;

/// Errors that stop the daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed error at line {line}: {message}")]
    Feed { line: u64, message: String },

    #[error("Invalid state transition: {0}")]
    State(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Engine(#[from] StrataError),
}
