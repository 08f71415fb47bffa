// crates/strata-economics/src/lib.rs
//
// strata-economics: the balance ledger and the staking economy built on it.
//
// Every function here works inside a `strata_store::Transaction` and returns
// the `EventRecord`s it produced. Nothing in this crate commits, logs, or
// reads the clock: the caller owns the transaction and the block context.

pub mod accumulator;
pub mod emission;
pub mod ledger;
pub mod pool;
pub mod replay;
pub mod staking;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export key types for ergonomic access from downstream crates.
pub use accumulator::{claim_all, AccumulatorState, ShareRate, StakerPosition, SHARE_SCALE};
pub use emission::{emission_for, BLOCKS_PER_MONTH};
pub use ledger::{
    get_balance, token_supply, transfer, update_balance, BalanceHistory, BalanceRecord,
};
pub use pool::{EmissionRule, StakingPoolConfig};
pub use replay::ReplayRecord;
pub use staking::UnstakeRecord;
