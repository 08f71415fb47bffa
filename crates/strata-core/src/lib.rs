// crates/strata-core/src/lib.rs
//
// strata-core: Core types, fixed-point amounts, errors and store traits for
// the Strata state-transition engine.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the inbound operation shapes, the event records produced by
// state changes, the engine-wide error type, and the key-value store trait
// implemented by strata-store.

pub mod account;
pub mod amount;
pub mod error;
pub mod event;
pub mod operation;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use strata_core::Amount;`

pub use amount::{Amount, AmountParseError, DECIMALS, UNITS_PER_TOKEN};
pub use error::StrataError;
pub use event::{EventKind, EventRecord};
pub use operation::{AuthLevel, Block, BlockContext, BlockHeader, Operation};
pub use traits::{KvStore, KvWrite};
