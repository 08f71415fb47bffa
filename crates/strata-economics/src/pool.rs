// crates/strata-economics/src/pool.rs
//
// Staking pool configuration.
//
// Pools live in config group `staking_pools`, one JSON value per pool id, and
// change only through governed config updates. Several pools may pay rewards
// for the same stake token (one per reward token); such pools must agree on
// what is staked and how it unstakes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strata_core::account::{is_valid_account, is_valid_token};
use strata_core::amount::Amount;
use strata_core::error::StrataError;
use strata_store::snapshot::groups;
use strata_store::SnapshotState;

/// How many reward tokens a pool releases per block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmissionRule {
    /// A constant `tokens_per_block`.
    Fixed { tokens_per_block: Amount },
    /// Between 70% and 90% of `tokens_per_block`, scaled by how well funded
    /// the reward account is.
    CappedDynamic { tokens_per_block: Amount },
}

impl EmissionRule {
    pub fn tokens_per_block(&self) -> Amount {
        match self {
            EmissionRule::Fixed { tokens_per_block } => *tokens_per_block,
            EmissionRule::CappedDynamic { tokens_per_block } => *tokens_per_block,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, EmissionRule::Fixed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPoolConfig {
    /// Pool id; filled from the config key when loaded.
    #[serde(default)]
    pub id: String,
    /// Liquid token locked while staked.
    pub staked_token: String,
    /// Ledger representation of stake, issued by `$STAKE_ISSUER`.
    pub stake_token: String,
    pub reward_token: String,
    /// Account funding the emission.
    pub reward_account: String,
    pub emission: EmissionRule,
    pub start_block: u64,
    #[serde(default)]
    pub stop_block: Option<u64>,
    #[serde(default)]
    pub stop_date: Option<DateTime<Utc>>,
    pub unstaking_interval_blocks: u64,
    pub unstaking_periods: u32,
}

impl StakingPoolConfig {
    /// Structural checks on one pool, independent of its siblings.
    pub fn validate(&self) -> Result<(), StrataError> {
        if self.id.is_empty() {
            return Err(StrataError::rejected("pool id must not be empty"));
        }
        for token in [&self.staked_token, &self.stake_token, &self.reward_token] {
            if !is_valid_token(token) {
                return Err(StrataError::rejected(format!(
                    "pool {}: invalid token symbol {:?}",
                    self.id, token
                )));
            }
        }
        if !is_valid_account(&self.reward_account) {
            return Err(StrataError::rejected(format!(
                "pool {}: invalid reward account {:?}",
                self.id, self.reward_account
            )));
        }
        if self.staked_token == self.stake_token {
            return Err(StrataError::rejected(format!(
                "pool {}: stake token must differ from the staked token",
                self.id
            )));
        }
        if self.emission.tokens_per_block().is_negative() {
            return Err(StrataError::rejected(format!(
                "pool {}: tokens_per_block must not be negative",
                self.id
            )));
        }
        if self.unstaking_periods == 0 || self.unstaking_interval_blocks == 0 {
            return Err(StrataError::rejected(format!(
                "pool {}: unstaking periods and interval must be positive",
                self.id
            )));
        }
        if let Some(stop) = self.stop_block {
            if stop < self.start_block {
                return Err(StrataError::rejected(format!(
                    "pool {}: stop_block {} precedes start_block {}",
                    self.id, stop, self.start_block
                )));
            }
        }
        Ok(())
    }

    /// Check `self` against the other configured pools.
    pub fn check_siblings(&self, pools: &[StakingPoolConfig]) -> Result<(), StrataError> {
        for other in pools.iter().filter(|p| p.id != self.id) {
            if other.stake_token == self.stake_token
                && (other.staked_token != self.staked_token
                    || other.unstaking_interval_blocks != self.unstaking_interval_blocks
                    || other.unstaking_periods != self.unstaking_periods)
            {
                return Err(StrataError::rejected(format!(
                    "pool {} disagrees with pool {} on stake token {}",
                    self.id, other.id, self.stake_token
                )));
            }
            if other.staked_token == self.staked_token && other.stake_token != self.stake_token {
                return Err(StrataError::rejected(format!(
                    "pool {}: {} is already staked as {} by pool {}",
                    self.id, self.staked_token, other.stake_token, other.id
                )));
            }
            if other.stake_token == self.stake_token && other.reward_token == self.reward_token {
                return Err(StrataError::rejected(format!(
                    "pool {} duplicates pool {} ({} rewards for {})",
                    self.id, other.id, self.reward_token, self.stake_token
                )));
            }
        }
        Ok(())
    }
}

/// Every configured pool, ordered by id.
pub fn load_pools(config: &SnapshotState) -> Result<Vec<StakingPoolConfig>, StrataError> {
    let Some(group) = config.group(groups::STAKING_POOLS) else {
        return Ok(Vec::new());
    };
    group
        .iter()
        .map(|(id, value)| {
            let mut pool: StakingPoolConfig = serde_json::from_value(value.clone())
                .map_err(|e| StrataError::Serialization(format!("pool {}: {}", id, e)))?;
            pool.id = id.clone();
            Ok(pool)
        })
        .collect()
}

pub fn load_pool(
    config: &SnapshotState,
    id: &str,
) -> Result<Option<StakingPoolConfig>, StrataError> {
    Ok(load_pools(config)?.into_iter().find(|p| p.id == id))
}

/// Pools paying rewards to holders of `stake_token`.
pub fn pools_for_stake_token(
    config: &SnapshotState,
    stake_token: &str,
) -> Result<Vec<StakingPoolConfig>, StrataError> {
    Ok(load_pools(config)?
        .into_iter()
        .filter(|p| p.stake_token == stake_token)
        .collect())
}

/// The pools for liquid token `staked_token`; empty if it cannot be staked.
pub fn pools_for_staked_token(
    config: &SnapshotState,
    staked_token: &str,
) -> Result<Vec<StakingPoolConfig>, StrataError> {
    Ok(load_pools(config)?
        .into_iter()
        .filter(|p| p.staked_token == staked_token)
        .collect())
}

/// True if `token` is the stake token of any pool. Stake tokens cannot be
/// transferred between accounts.
pub fn is_stake_token(config: &SnapshotState, token: &str) -> Result<bool, StrataError> {
    Ok(load_pools(config)?.iter().any(|p| p.stake_token == token))
}

#[cfg(test)]
pub(crate) fn sample_pool(id: &str, reward_token: &str) -> StakingPoolConfig {
    StakingPoolConfig {
        id: id.to_string(),
        staked_token: "SPS".to_string(),
        stake_token: "SPSP".to_string(),
        reward_token: reward_token.to_string(),
        reward_account: "$REWARD_POOLS_STAKING".to_string(),
        emission: EmissionRule::Fixed {
            tokens_per_block: Amount::from_tokens(10),
        },
        start_block: 10,
        stop_block: None,
        stop_date: None,
        unstaking_interval_blocks: 10,
        unstaking_periods: 4,
    }
}
