// crates/strata-engine/src/actions/mod.rs
//
// Built-in operation handlers.

pub mod config_update;
pub mod price_feed;
pub mod staking;
pub mod token_transfer;
pub mod transitions;
