// crates/strata-economics/src/staking.rs
//
// Stake, unstake, cancel and claim.
//
// Staking locks a liquid token in `$TOKEN_STAKING` and issues the same
// quantity of the pool's stake token from `$STAKE_ISSUER`. Unstaking releases
// it again in `unstaking_periods` installments, one every
// `unstaking_interval_blocks`; the last installment carries the remainder of
// the equal split. Rewards are settled through `claim_all` before every change
// in stake.
//
// Pending installments are indexed by due block so the block processor can
// release them in (block, account, token) order without scanning every record.

use serde::{Deserialize, Serialize};

use strata_core::account::{STAKE_ISSUER_ACCOUNT, STAKING_ACCOUNT};
use strata_core::amount::Amount;
use strata_core::error::StrataError;
use strata_core::event::EventRecord;
use strata_store::keys;
use strata_store::Transaction;

use crate::accumulator::claim_all;
use crate::ledger::{get_balance, transfer};
use crate::pool::{pools_for_staked_token, StakingPoolConfig};

pub const UNSTAKING_TABLE: &str = "token_unstaking";

/// A pending unstake of `token` by `account`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnstakeRecord {
    pub account: String,
    /// Liquid token being released.
    pub token: String,
    pub stake_token: String,
    pub total_qty: Amount,
    pub qty_remaining: Amount,
    pub periods_total: u32,
    pub periods_remaining: u32,
    pub interval_blocks: u64,
    pub next_unstake_block: u64,
    pub created_block: u64,
}

impl UnstakeRecord {
    /// Quantity released by the next installment.
    pub fn next_installment(&self) -> Amount {
        if self.periods_remaining <= 1 {
            return self.qty_remaining;
        }
        self.total_qty
            .checked_div_int(u64::from(self.periods_total))
            .map_or(self.qty_remaining, |part| part.min(self.qty_remaining))
    }
}

/// Staking parameters shared by every pool of a liquid token.
struct StakeTerms {
    stake_token: String,
    interval_blocks: u64,
    periods: u32,
}

fn stake_terms(tx: &Transaction<'_>, token: &str) -> Result<StakeTerms, StrataError> {
    let pools = pools_for_staked_token(tx.config(), token)?;
    let pool: &StakingPoolConfig = pools
        .first()
        .ok_or_else(|| StrataError::rejected(format!("{} cannot be staked", token)))?;
    Ok(StakeTerms {
        stake_token: pool.stake_token.clone(),
        interval_blocks: pool.unstaking_interval_blocks,
        periods: pool.unstaking_periods,
    })
}

fn require_positive(qty: Amount) -> Result<(), StrataError> {
    if !qty.is_positive() {
        return Err(StrataError::rejected(format!(
            "quantity must be positive, got {}",
            qty
        )));
    }
    Ok(())
}

pub fn pending_unstake(
    tx: &Transaction<'_>,
    account: &str,
    token: &str,
) -> Result<Option<UnstakeRecord>, StrataError> {
    tx.get_json(&keys::unstake(account, token))
}

/// Lock `qty` of liquid `token` and issue the matching stake token.
pub fn stake(
    tx: &mut Transaction<'_>,
    account: &str,
    token: &str,
    qty: Amount,
) -> Result<Vec<EventRecord>, StrataError> {
    require_positive(qty)?;
    let terms = stake_terms(tx, token)?;

    let liquid = get_balance(tx, account, token)?;
    if liquid < qty {
        return Err(StrataError::rejected(format!(
            "insufficient balance: {} holds {} {}, needs {}",
            account, liquid, token, qty
        )));
    }

    let mut events = claim_all(tx, account, &terms.stake_token, qty, "stake_tokens")?;
    events.extend(transfer(tx, account, account, STAKING_ACCOUNT, token, qty, "stake_tokens")?);
    events.extend(transfer(
        tx,
        account,
        STAKE_ISSUER_ACCOUNT,
        account,
        &terms.stake_token,
        qty,
        "stake_tokens",
    )?);
    Ok(events)
}

/// Open an unstake of `qty` of `token`. A second unstake while one is pending
/// is rejected.
pub fn begin_unstake(
    tx: &mut Transaction<'_>,
    account: &str,
    token: &str,
    qty: Amount,
) -> Result<Vec<EventRecord>, StrataError> {
    require_positive(qty)?;
    let terms = stake_terms(tx, token)?;

    if pending_unstake(tx, account, token)?.is_some() {
        return Err(StrataError::rejected(format!(
            "{} already has a pending unstake of {}",
            account, token
        )));
    }
    let staked = get_balance(tx, account, &terms.stake_token)?;
    if staked < qty {
        return Err(StrataError::rejected(format!(
            "{} has only {} {} staked, cannot unstake {}",
            account, staked, token, qty
        )));
    }

    let block = tx.block_num();
    let record = UnstakeRecord {
        account: account.to_string(),
        token: token.to_string(),
        stake_token: terms.stake_token,
        total_qty: qty,
        qty_remaining: qty,
        periods_total: terms.periods,
        periods_remaining: terms.periods,
        interval_blocks: terms.interval_blocks,
        next_unstake_block: block.saturating_add(terms.interval_blocks),
        created_block: block,
    };
    put_record(tx, &record)?;
    Ok(vec![EventRecord::insert(UNSTAKING_TABLE, serde_json::to_value(&record)?)])
}

/// Drop a pending unstake; nothing released so far is taken back.
pub fn cancel_unstake(
    tx: &mut Transaction<'_>,
    account: &str,
    token: &str,
) -> Result<Vec<EventRecord>, StrataError> {
    let record = pending_unstake(tx, account, token)?.ok_or_else(|| {
        StrataError::rejected(format!("{} has no pending unstake of {}", account, token))
    })?;
    delete_record(tx, &record);
    Ok(vec![EventRecord::delete(UNSTAKING_TABLE, serde_json::to_value(&record)?)])
}

/// Settle `account`'s rewards in every pool of liquid `token`.
pub fn claim(
    tx: &mut Transaction<'_>,
    account: &str,
    token: &str,
) -> Result<Vec<EventRecord>, StrataError> {
    let terms = stake_terms(tx, token)?;
    claim_all(tx, account, &terms.stake_token, Amount::ZERO, "claim_staking_rewards")
}

/// Unstakes with an installment due at or before `block`, as
/// `(account, token)` in due order.
pub fn due_unstakes(
    tx: &Transaction<'_>,
    block: u64,
) -> Result<Vec<(String, String)>, StrataError> {
    let mut due = Vec::new();
    for (key, _) in tx.store().scan_prefix(keys::UNSTAKE_DUE_PREFIX.as_bytes())? {
        let (due_block, account, token) = keys::parse_unstake_due(&key).ok_or_else(|| {
            StrataError::Storage(format!(
                "malformed unstake index key {}",
                String::from_utf8_lossy(&key)
            ))
        })?;
        if due_block > block {
            break;
        }
        due.push((account, token));
    }
    Ok(due)
}

/// Release the next installment of `account`'s unstake of `token`.
pub fn release_installment(
    tx: &mut Transaction<'_>,
    account: &str,
    token: &str,
) -> Result<Vec<EventRecord>, StrataError> {
    let mut record = pending_unstake(tx, account, token)?.ok_or_else(|| {
        StrataError::invariant(format!(
            "unstake index points at missing record {}:{}",
            account, token
        ))
    })?;
    let qty = record.next_installment();
    delete_record(tx, &record);

    let mut events = Vec::new();
    if qty.is_positive() {
        let negative = qty
            .checked_neg()
            .ok_or_else(|| StrataError::invariant("installment overflow"))?;
        events.extend(claim_all(tx, account, &record.stake_token, negative, "unstake_tokens")?);
        events.extend(transfer(
            tx,
            account,
            account,
            STAKE_ISSUER_ACCOUNT,
            &record.stake_token,
            qty,
            "unstake_tokens",
        )?);
        events.extend(transfer(
            tx,
            account,
            STAKING_ACCOUNT,
            account,
            token,
            qty,
            "unstake_tokens",
        )?);
    }

    record.qty_remaining = record
        .qty_remaining
        .checked_sub(qty)
        .ok_or_else(|| StrataError::invariant("installment overflow"))?;
    record.periods_remaining = record.periods_remaining.saturating_sub(1);

    if record.periods_remaining == 0 || record.qty_remaining.is_zero() {
        events.push(EventRecord::delete(UNSTAKING_TABLE, serde_json::to_value(&record)?));
    } else {
        record.next_unstake_block = record
            .next_unstake_block
            .saturating_add(record.interval_blocks);
        put_record(tx, &record)?;
        events.push(EventRecord::update(UNSTAKING_TABLE, serde_json::to_value(&record)?));
    }
    Ok(events)
}

fn put_record(tx: &mut Transaction<'_>, record: &UnstakeRecord) -> Result<(), StrataError> {
    tx.put_json(keys::unstake(&record.account, &record.token), record)?;
    tx.store_mut().put(
        keys::unstake_due(record.next_unstake_block, &record.account, &record.token),
        Vec::new(),
    );
    Ok(())
}

fn delete_record(tx: &mut Transaction<'_>, record: &UnstakeRecord) {
    let store = tx.store_mut();
    store.delete(keys::unstake(&record.account, &record.token));
    store.delete(keys::unstake_due(record.next_unstake_block, &record.account, &record.token));
}
