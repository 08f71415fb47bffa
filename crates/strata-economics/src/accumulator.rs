// crates/strata-economics/src/accumulator.rs
//
// Reward-per-share accumulator.
//
// Each pool keeps one running `acc_tokens_per_share`. Whenever any staker
// touches the pool, the tokens emitted since `last_reward_block` are moved from
// the pool's reward account into the `$STAKING_REWARDS_POOL` holding account
// and the accumulator grows by `emitted / total_staked`. A staker is owed
// `staked * (acc_tokens_per_share - last_share)`, paid from the holding
// account. Cost per stake, unstake or claim is O(pools), never O(stakers).
//
// Stake is a ledger balance: an account's stake is its `stake_token`
// balance, and total stake is the negated `$STAKE_ISSUER` balance. The
// accumulator persists its own `total_staked` and reconciles it against the
// ledger on every touch.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use strata_core::account::{REWARD_HOLDING_ACCOUNT, STAKE_ISSUER_ACCOUNT};
use strata_core::amount::Amount;
use strata_core::error::StrataError;
use strata_core::event::EventRecord;
use strata_store::keys;
use strata_store::Transaction;

use crate::emission::emission_for;
use crate::ledger::{get_balance, is_bookkeeping, transfer};
use crate::pool::{pools_for_stake_token, StakingPoolConfig};

/// Fixed-point scale of share rates (10^18).
pub const SHARE_SCALE: i128 = 1_000_000_000_000_000_000;

pub const POOL_STATE_TABLE: &str = "staking_pool_state";
pub const POSITIONS_TABLE: &str = "staking_positions";

/// Reward units per staked unit, scaled by `SHARE_SCALE`.
///
/// Serialized as a decimal integer string so it survives JSON tooling that
/// reads numbers as doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ShareRate(i128);

impl ShareRate {
    pub const ZERO: ShareRate = ShareRate(0);

    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i128 {
        self.0
    }

    pub fn checked_add(self, rhs: ShareRate) -> Option<ShareRate> {
        self.0.checked_add(rhs.0).map(ShareRate)
    }

    pub fn checked_sub(self, rhs: ShareRate) -> Option<ShareRate> {
        self.0.checked_sub(rhs.0).map(ShareRate)
    }

    /// `emitted / staked` as a share rate, truncating.
    pub fn per_unit(emitted: Amount, staked: Amount) -> Option<ShareRate> {
        if !staked.is_positive() {
            return None;
        }
        emitted
            .units()
            .checked_mul(SHARE_SCALE)
            .map(|scaled| ShareRate(scaled / staked.units()))
    }

    /// `staked * self`, back in token units, truncating.
    pub fn apply(self, staked: Amount) -> Option<Amount> {
        staked
            .units()
            .checked_mul(self.0)
            .map(|scaled| Amount::from_units(scaled / SHARE_SCALE))
    }
}

impl fmt::Display for ShareRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ShareRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShareRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<i128>().map(ShareRate).map_err(de::Error::custom)
    }
}

/// Persistent state of one pool's accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatorState {
    pub pool: String,
    pub acc_tokens_per_share: ShareRate,
    pub last_reward_block: u64,
    pub total_staked: Amount,
    /// Resolved once from the pool's stop_block/stop_date, then never moved.
    pub stop_block: Option<u64>,
    /// Running total moved from the reward account into the holding account.
    pub total_emitted: Amount,
}

/// A staker's share checkpoint in one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakerPosition {
    pub pool: String,
    pub account: String,
    pub last_share: ShareRate,
}

/// Total stake of `stake_token` according to the ledger.
pub fn ledger_total_staked(tx: &Transaction<'_>, stake_token: &str) -> Result<Amount, StrataError> {
    get_balance(tx, STAKE_ISSUER_ACCOUNT, stake_token)?
        .checked_neg()
        .ok_or_else(|| StrataError::invariant(format!("stake total overflow for {}", stake_token)))
}

fn overflow(pool: &str, what: &str) -> StrataError {
    StrataError::invariant(format!("pool {}: {} overflow", pool, what))
}

pub fn load_state(
    tx: &Transaction<'_>,
    pool_id: &str,
) -> Result<Option<AccumulatorState>, StrataError> {
    tx.get_json(&keys::accumulator(pool_id))
}

/// Load the pool's state, creating it from the ledger on first touch.
pub fn load_or_init(
    tx: &Transaction<'_>,
    pool: &StakingPoolConfig,
) -> Result<AccumulatorState, StrataError> {
    if let Some(state) = load_state(tx, &pool.id)? {
        return Ok(state);
    }
    Ok(AccumulatorState {
        pool: pool.id.clone(),
        acc_tokens_per_share: ShareRate::ZERO,
        last_reward_block: tx.block_num(),
        total_staked: ledger_total_staked(tx, &pool.stake_token)?,
        stop_block: None,
        total_emitted: Amount::ZERO,
    })
}

pub fn save_state(
    tx: &mut Transaction<'_>,
    state: &AccumulatorState,
) -> Result<EventRecord, StrataError> {
    tx.put_json(keys::accumulator(&state.pool), state)?;
    Ok(EventRecord::update(POOL_STATE_TABLE, serde_json::to_value(state)?))
}

/// The block at which emission stops, if either trigger has fired by now.
fn resolve_stop(pool: &StakingPoolConfig, block: u64, block_time: DateTime<Utc>) -> Option<u64> {
    let by_block = pool.stop_block.filter(|stop| block >= *stop);
    let by_date = pool
        .stop_date
        .filter(|date| block_time >= *date)
        .map(|_| block);
    match (by_block, by_date) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// A ledger rejection inside reward bookkeeping means the books are wrong.
fn escalate(err: StrataError) -> StrataError {
    match err {
        StrataError::Rejected(msg) => StrataError::invariant(msg),
        other => other,
    }
}

fn check_reconciled(state: &AccumulatorState, ledger_total: Amount) -> Result<(), StrataError> {
    if state.total_staked != ledger_total {
        return Err(StrataError::invariant(format!(
            "pool {} tracks {} staked but the ledger holds {}",
            state.pool, state.total_staked, ledger_total
        )));
    }
    Ok(())
}

/// Emit everything owed since `last_reward_block` and grow the accumulator.
///
/// Zero total stake advances `last_reward_block` without emitting.
pub fn advance_pool(
    tx: &mut Transaction<'_>,
    actor: &str,
    pool: &StakingPoolConfig,
    state: &mut AccumulatorState,
) -> Result<Vec<EventRecord>, StrataError> {
    let block = tx.block_num();
    if state.stop_block.is_none() {
        state.stop_block = resolve_stop(pool, block, tx.ctx().block_time);
    }

    let end = state.stop_block.map_or(block, |stop| stop.min(block));
    let start = state.last_reward_block.max(pool.start_block);
    let mut events = Vec::new();

    if end > start && state.total_staked.is_positive() {
        let reward_balance = get_balance(tx, &pool.reward_account, &pool.reward_token)?;
        let mut emission = emission_for(&pool.emission, end - start, reward_balance)?;
        if !is_bookkeeping(tx, &pool.reward_account)? {
            emission = emission.min(reward_balance.max(Amount::ZERO));
        }

        if emission.is_positive() {
            events.extend(
                transfer(
                    tx,
                    actor,
                    &pool.reward_account,
                    REWARD_HOLDING_ACCOUNT,
                    &pool.reward_token,
                    emission,
                    "staking_emission",
                )
                .map_err(escalate)?,
            );
            let increment = ShareRate::per_unit(emission, state.total_staked)
                .ok_or_else(|| overflow(&pool.id, "share rate"))?;
            state.acc_tokens_per_share = state
                .acc_tokens_per_share
                .checked_add(increment)
                .ok_or_else(|| overflow(&pool.id, "accumulator"))?;
            state.total_emitted = state
                .total_emitted
                .checked_add(emission)
                .ok_or_else(|| overflow(&pool.id, "emission total"))?;
        }
    }

    state.last_reward_block = state.last_reward_block.max(block);
    Ok(events)
}

/// Bring one pool up to date without touching any staker. Used before a
/// pool's configuration changes so accrued rewards follow the old rule.
pub fn settle_pool(
    tx: &mut Transaction<'_>,
    actor: &str,
    pool: &StakingPoolConfig,
) -> Result<Vec<EventRecord>, StrataError> {
    let mut state = load_or_init(tx, pool)?;
    check_reconciled(&state, ledger_total_staked(tx, &pool.stake_token)?)?;
    let mut events = advance_pool(tx, actor, pool, &mut state)?;
    events.push(save_state(tx, &state)?);
    Ok(events)
}

/// Settle `account`'s rewards in every pool of `stake_token`.
///
/// Must be called before the account's stake balance changes; `extra_delta`
/// is the change the caller is about to make, and is added to each pool's
/// `total_staked` so the accumulator agrees with the ledger afterwards.
/// Claiming with no stake pays nothing and is not an error.
pub fn claim_all(
    tx: &mut Transaction<'_>,
    account: &str,
    stake_token: &str,
    extra_delta: Amount,
    reason: &str,
) -> Result<Vec<EventRecord>, StrataError> {
    let pools = pools_for_stake_token(tx.config(), stake_token)?;
    let ledger_total = ledger_total_staked(tx, stake_token)?;
    let staked = get_balance(tx, account, stake_token)?;

    let staked_after = staked
        .checked_add(extra_delta)
        .ok_or_else(|| StrataError::invariant("stake overflow"))?;
    if staked_after.is_negative() {
        return Err(StrataError::rejected(format!(
            "{} has only {} {} staked",
            account, staked, stake_token
        )));
    }

    let mut events = Vec::new();
    for pool in &pools {
        let mut state = load_or_init(tx, pool)?;
        check_reconciled(&state, ledger_total)?;
        events.extend(advance_pool(tx, account, pool, &mut state)?);

        let position_key = keys::stake_position(&pool.id, account);
        let last_share = tx
            .get_json::<StakerPosition>(&position_key)?
            .map_or(ShareRate::ZERO, |p| p.last_share);
        let owed = state
            .acc_tokens_per_share
            .checked_sub(last_share)
            .and_then(|delta| delta.apply(staked))
            .ok_or_else(|| StrataError::invariant(format!("pool {}: reward overflow", pool.id)))?;

        if owed.is_positive() {
            events.extend(
                transfer(
                    tx,
                    account,
                    REWARD_HOLDING_ACCOUNT,
                    account,
                    &pool.reward_token,
                    owed,
                    reason,
                )
                .map_err(escalate)?,
            );
        }

        let position = StakerPosition {
            pool: pool.id.clone(),
            account: account.to_string(),
            last_share: state.acc_tokens_per_share,
        };
        tx.put_json(position_key, &position)?;
        events.push(EventRecord::update(POSITIONS_TABLE, serde_json::to_value(&position)?));

        state.total_staked = state
            .total_staked
            .checked_add(extra_delta)
            .filter(|total| !total.is_negative())
            .ok_or_else(|| {
                StrataError::invariant(format!("pool {}: total stake would go negative", pool.id))
            })?;
        events.push(save_state(tx, &state)?);
    }
    Ok(events)
}
