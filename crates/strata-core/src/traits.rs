// crates/strata-core/src/traits.rs

use crate::error::StrataError;

/// A single staged write: a put or a delete of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

impl KvWrite {
    pub fn key(&self) -> &[u8] {
        match self {
            KvWrite::Put(k, _) | KvWrite::Delete(k) => k,
        }
    }
}

/// Trait for the persistent key-value store behind the ledger.
///
/// Implemented by strata-store (RocksDB and in-memory backends). Writes are
/// only ever applied as a whole batch, which is what makes a transaction
/// commit atomic.
pub trait KvStore: Send + Sync {
    /// Read a single key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StrataError>;

    /// Return every `(key, value)` whose key starts with `prefix`, in
    /// ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StrataError>;

    /// Apply all writes atomically.
    fn write_batch(&self, writes: &[KvWrite]) -> Result<(), StrataError>;
}
