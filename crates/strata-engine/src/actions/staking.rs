// crates/strata-engine/src/actions/staking.rs
//
// `stake_tokens`, `unstake_tokens`, `cancel_unstake_tokens` and
// `claim_staking_rewards`. Thin wrappers over `strata_economics::staking`;
// routing gates them on `staking.reward_start_block`.

use serde::Deserialize;

use strata_core::amount::Amount;
use strata_core::error::StrataError;
use strata_core::event::EventRecord;
use strata_core::operation::{AuthLevel, Operation};
use strata_economics::pool::pools_for_staked_token;
use strata_economics::staking;
use strata_store::Transaction;

use crate::action::{parse_payload, Action};

#[derive(Debug, Clone, Deserialize)]
pub struct QtyPayload {
    pub token: String,
    pub qty: Amount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPayload {
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingOp {
    Stake,
    Unstake,
    CancelUnstake,
    Claim,
}

impl StakingOp {
    pub fn op_name(self) -> &'static str {
        match self {
            StakingOp::Stake => "stake_tokens",
            StakingOp::Unstake => "unstake_tokens",
            StakingOp::CancelUnstake => "cancel_unstake_tokens",
            StakingOp::Claim => "claim_staking_rewards",
        }
    }
}

pub struct StakingAction {
    op: StakingOp,
    account: String,
    auth: AuthLevel,
    token: String,
    qty: Amount,
}

impl StakingAction {
    pub fn new(op: StakingOp, operation: &Operation) -> Result<Self, StrataError> {
        let (token, qty) = match op {
            StakingOp::Stake | StakingOp::Unstake => {
                let p: QtyPayload = parse_payload(operation)?;
                (p.token, p.qty)
            }
            StakingOp::CancelUnstake | StakingOp::Claim => {
                let p: TokenPayload = parse_payload(operation)?;
                (p.token, Amount::ZERO)
            }
        };
        Ok(Self {
            op,
            account: operation.account.clone(),
            auth: operation.auth,
            token,
            qty,
        })
    }
}

impl Action for StakingAction {
    fn name(&self) -> &'static str {
        self.op.op_name()
    }

    /// Claims move only rewards to their owner, so posting authority suffices.
    fn is_supported(&self) -> bool {
        self.op == StakingOp::Claim || self.auth == AuthLevel::Active
    }

    fn validate(&self, tx: &Transaction<'_>) -> Result<(), StrataError> {
        if pools_for_staked_token(tx.config(), &self.token)?.is_empty() {
            return Err(StrataError::rejected(format!("{} cannot be staked", self.token)));
        }
        if matches!(self.op, StakingOp::Stake | StakingOp::Unstake) && !self.qty.is_positive() {
            return Err(StrataError::rejected("qty must be positive"));
        }
        Ok(())
    }

    fn process(&self, tx: &mut Transaction<'_>) -> Result<Vec<EventRecord>, StrataError> {
        match self.op {
            StakingOp::Stake => staking::stake(tx, &self.account, &self.token, self.qty),
            StakingOp::Unstake => staking::begin_unstake(tx, &self.account, &self.token, self.qty),
            StakingOp::CancelUnstake => staking::cancel_unstake(tx, &self.account, &self.token),
            StakingOp::Claim => staking::claim(tx, &self.account, &self.token),
        }
    }
}
