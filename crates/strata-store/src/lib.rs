// crates/strata-store/src/lib.rs
//
// strata-store: State storage for the Strata engine.
//
// Provides RocksDB-backed and in-memory `KvStore` implementations, the
// `StoreTx` write overlay that makes an operation's writes atomic, the
// `BlockOverlay` that stages a whole block for one batch write, the
// generation-tagged `ConfigSnapshot` cache, and the `Transaction` type that
// binds the two together for the lifetime of one operation.

pub mod keys;
pub mod memory;
pub mod overlay;
pub mod rocks;
pub mod snapshot;
pub mod transaction;
pub mod tx;

// Re-export key types for ergonomic access from downstream crates.
pub use memory::MemoryStore;
pub use overlay::BlockOverlay;
pub use rocks::RocksStore;
pub use snapshot::{ConfigSnapshot, PriceEntry, SnapshotState, SnapshotTx};
pub use transaction::Transaction;
pub use tx::StoreTx;
