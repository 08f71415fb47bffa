use thiserror::Error;

use crate::amount::AmountParseError;

/// Engine-wide error types for Strata.
///
/// The first three variants follow the three error classes of block
/// processing: a rejected operation is expected and never stops the block,
/// an invariant violation stops the node, and a configuration error is
/// raised at registration or startup.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Operation-level rejection (malformed payload, failed auth,
    /// insufficient balance, routing miss).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// A ledger or accumulator invariant would have been broken.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Route windows, transition points or other static configuration are inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Storage layer error (RocksDB, in-memory store).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl StrataError {
    /// Shorthand for building a rejection.
    pub fn rejected(msg: impl Into<String>) -> Self {
        StrataError::Rejected(msg.into())
    }

    /// Shorthand for building an invariant violation.
    pub fn invariant(msg: impl Into<String>) -> Self {
        StrataError::InvariantViolation(msg.into())
    }

    /// True for errors that only discard the current operation.
    pub fn is_rejection(&self) -> bool {
        matches!(self, StrataError::Rejected(_))
    }

    /// True for errors that must stop block processing.
    pub fn is_fatal(&self) -> bool {
        !self.is_rejection()
    }
}

impl From<serde_json::Error> for StrataError {
    fn from(e: serde_json::Error) -> Self {
        StrataError::Serialization(e.to_string())
    }
}

impl From<AmountParseError> for StrataError {
    fn from(e: AmountParseError) -> Self {
        StrataError::Rejected(e.to_string())
    }
}
