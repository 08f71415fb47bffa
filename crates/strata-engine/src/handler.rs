// crates/strata-engine/src/handler.rs
//
// Handler versions as an explicit tagged enum.
//
// A route names a `HandlerVersion`; instantiating it against an operation
// yields the `Action` that validates and processes it. Adding a new version of
// an operation means adding a variant here and a route window in `route.rs`,
// never mutating a registry at runtime.

use serde::{Deserialize, Serialize};

use strata_core::error::StrataError;
use strata_core::operation::Operation;

use crate::action::Action;
use crate::actions::config_update::UpdateConfig;
use crate::actions::price_feed::PriceFeed;
use crate::actions::staking::{StakingAction, StakingOp};
use crate::actions::token_transfer::TokenTransfer;
use crate::actions::transitions::{TransitionCappedEmission, TransitionConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerVersion {
    TokenTransferV1,
    TokenTransferV2,
    StakeTokens,
    UnstakeTokens,
    CancelUnstakeTokens,
    ClaimStakingRewards,
    UpdateConfig,
    PriceFeed,
    TransitionConfig,
    TransitionCappedEmission,
}

impl HandlerVersion {
    /// Build the handler for one operation, parsing its payload.
    pub fn instantiate(self, op: &Operation) -> Result<Box<dyn Action>, StrataError> {
        Ok(match self {
            HandlerVersion::TokenTransferV1 => Box::new(TokenTransfer::v1(op)?),
            HandlerVersion::TokenTransferV2 => Box::new(TokenTransfer::v2(op)?),
            HandlerVersion::StakeTokens => Box::new(StakingAction::new(StakingOp::Stake, op)?),
            HandlerVersion::UnstakeTokens => Box::new(StakingAction::new(StakingOp::Unstake, op)?),
            HandlerVersion::CancelUnstakeTokens => {
                Box::new(StakingAction::new(StakingOp::CancelUnstake, op)?)
            }
            HandlerVersion::ClaimStakingRewards => {
                Box::new(StakingAction::new(StakingOp::Claim, op)?)
            }
            HandlerVersion::UpdateConfig => Box::new(UpdateConfig::new(op)?),
            HandlerVersion::PriceFeed => Box::new(PriceFeed::new(op)?),
            HandlerVersion::TransitionConfig => Box::new(TransitionConfig::new(op)?),
            HandlerVersion::TransitionCappedEmission => {
                Box::new(TransitionCappedEmission::new(op)?)
            }
        })
    }
}
