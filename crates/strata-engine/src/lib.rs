// crates/strata-engine/src/lib.rs
//
// strata-engine: routes each operation to the handler version active at its
// height, runs governance-scheduled transitions exactly once, and applies
// blocks against the ledger inside per-operation transactions.
//
// The engine is synchronous and single-writer. Determinism comes from the
// total order of the chain, not from locking.

pub mod action;
pub mod actions;
pub mod genesis;
pub mod handler;
pub mod processor;
pub mod route;
pub mod transition;

// Re-export key types for ergonomic access from downstream crates.
pub use action::Action;
pub use genesis::{apply_genesis, Genesis, GenesisBalance};
pub use handler::HandlerVersion;
pub use processor::{BlockOutcome, BlockProcessor, OpStatus, OperationOutcome};
pub use route::{standard_routes, BlockBound, Route, RouteTable};
pub use transition::{TransitionDef, TransitionManager, VirtualOp};
