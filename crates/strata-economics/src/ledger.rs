// crates/strata-economics/src/ledger.rs
//
// Balance ledger: (account, token) -> signed fixed-point balance.
//
// `transfer` is the only path by which actions move value. It debits and
// credits through `update_balance`, so the sum of all balances of a token is
// unchanged by every transfer; tokens enter and leave circulation only through
// transfers out of or into a bookkeeping account.
//
// Accounts are ordinary (never negative) or bookkeeping (may go negative).
// Membership is read from `ledger.bookkeeping_accounts` on every call because
// a transition can change it mid-chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strata_core::account::{is_valid_account, is_valid_token};
use strata_core::amount::Amount;
use strata_core::error::StrataError;
use strata_core::event::EventRecord;
use strata_store::keys;
use strata_store::snapshot::groups;
use strata_store::Transaction;

pub const BALANCES_TABLE: &str = "balances";
pub const HISTORY_TABLE: &str = "balance_history";

/// Config key (in group `ledger`) listing the bookkeeping accounts.
pub const BOOKKEEPING_KEY: &str = "bookkeeping_accounts";

/// Current balance of one (account, token) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub account: String,
    pub token: String,
    pub balance: Amount,
}

/// One immutable audit row per balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceHistory {
    pub account: String,
    pub token: String,
    /// Signed change applied to the balance.
    pub amount: Amount,
    pub balance_start: Amount,
    pub balance_end: Amount,
    pub block_num: u64,
    pub trx_id: String,
    pub actor: String,
    pub reason: String,
    /// The other side of the transfer, if any.
    pub counterparty: Option<String>,
    pub created: DateTime<Utc>,
}

/// True if `account` may hold a negative balance under the current config.
pub fn is_bookkeeping(tx: &Transaction<'_>, account: &str) -> Result<bool, StrataError> {
    Ok(tx
        .config()
        .string_list(groups::LEDGER, BOOKKEEPING_KEY)?
        .iter()
        .any(|a| a == account))
}

/// Balance of `account` in `token`; zero if never written.
pub fn get_balance(
    tx: &Transaction<'_>,
    account: &str,
    token: &str,
) -> Result<Amount, StrataError> {
    Ok(tx
        .get_json::<BalanceRecord>(&keys::balance(token, account))?
        .map_or(Amount::ZERO, |r| r.balance))
}

/// Apply a signed delta to one balance and append its history row.
///
/// This is the raw path beneath `transfer`. It does not reject: a negative
/// result on an ordinary account means a caller skipped its checks, which is
/// an invariant violation.
#[allow(clippy::too_many_arguments)]
pub fn update_balance(
    tx: &mut Transaction<'_>,
    actor: &str,
    account: &str,
    token: &str,
    delta: Amount,
    reason: &str,
    counterparty: Option<&str>,
) -> Result<Vec<EventRecord>, StrataError> {
    if delta.is_zero() {
        return Ok(Vec::new());
    }

    let start = get_balance(tx, account, token)?;
    let end = start.checked_add(delta).ok_or_else(|| {
        StrataError::invariant(format!("balance overflow for {} {}", account, token))
    })?;
    if end.is_negative() && !is_bookkeeping(tx, account)? {
        return Err(StrataError::invariant(format!(
            "{} would hold {} {} but is not a bookkeeping account",
            account, end, token
        )));
    }

    let record = BalanceRecord {
        account: account.to_string(),
        token: token.to_string(),
        balance: end,
    };
    tx.put_json(keys::balance(token, account), &record)?;

    let seq = tx.get_json::<u64>(keys::HISTORY_SEQ)?.unwrap_or(0) + 1;
    tx.put_json(keys::HISTORY_SEQ.to_vec(), &seq)?;
    let ctx = tx.ctx().clone();
    let history = BalanceHistory {
        account: account.to_string(),
        token: token.to_string(),
        amount: delta,
        balance_start: start,
        balance_end: end,
        block_num: ctx.block_num,
        trx_id: ctx.trx_id,
        actor: actor.to_string(),
        reason: reason.to_string(),
        counterparty: counterparty.map(str::to_string),
        created: ctx.block_time,
    };
    tx.put_json(keys::history(account, token, seq), &history)?;

    Ok(vec![
        EventRecord::update(BALANCES_TABLE, serde_json::to_value(&record)?),
        EventRecord::insert(HISTORY_TABLE, serde_json::to_value(&history)?),
    ])
}

/// Move `amount` of `token` from `from` to `to`.
///
/// Rejects a non-positive amount, an unknown token symbol, a self-transfer,
/// and a debit that would leave an ordinary `from` negative.
#[allow(clippy::too_many_arguments)]
pub fn transfer(
    tx: &mut Transaction<'_>,
    actor: &str,
    from: &str,
    to: &str,
    token: &str,
    amount: Amount,
    reason: &str,
) -> Result<Vec<EventRecord>, StrataError> {
    if !amount.is_positive() {
        return Err(StrataError::rejected(format!(
            "transfer amount must be positive, got {}",
            amount
        )));
    }
    if !is_valid_token(token) {
        return Err(StrataError::rejected(format!("invalid token symbol {:?}", token)));
    }
    if from == to {
        return Err(StrataError::rejected(format!("{} cannot transfer to itself", from)));
    }
    for account in [from, to] {
        if !is_valid_account(account) {
            return Err(StrataError::rejected(format!("invalid account name {:?}", account)));
        }
    }

    let balance = get_balance(tx, from, token)?;
    if balance < amount && !is_bookkeeping(tx, from)? {
        return Err(StrataError::rejected(format!(
            "insufficient balance: {} holds {} {}, needs {}",
            from, balance, token, amount
        )));
    }

    let debit = amount
        .checked_neg()
        .ok_or_else(|| StrataError::invariant("transfer amount overflow"))?;
    let mut events = update_balance(tx, actor, from, token, debit, reason, Some(to))?;
    events.extend(update_balance(tx, actor, to, token, amount, reason, Some(from))?);
    Ok(events)
}

/// Sum of every balance of `token`. Zero whenever only transfers touched it.
pub fn token_supply(tx: &Transaction<'_>, token: &str) -> Result<Amount, StrataError> {
    tx.store()
        .scan_json::<BalanceRecord>(&keys::balance_prefix(token))?
        .into_iter()
        .try_fold(Amount::ZERO, |sum, (_, record)| {
            sum.checked_add(record.balance)
                .ok_or_else(|| StrataError::invariant(format!("supply overflow for {}", token)))
        })
}

/// Every balance of `token`, in account order.
pub fn holders(tx: &Transaction<'_>, token: &str) -> Result<Vec<BalanceRecord>, StrataError> {
    Ok(tx
        .store()
        .scan_json::<BalanceRecord>(&keys::balance_prefix(token))?
        .into_iter()
        .map(|(_, record)| record)
        .collect())
}

/// History of one (account, token) pair in the order it was written.
pub fn history(
    tx: &Transaction<'_>,
    account: &str,
    token: &str,
) -> Result<Vec<BalanceHistory>, StrataError> {
    Ok(tx
        .store()
        .scan_json::<BalanceHistory>(&keys::history_prefix(account, token))?
        .into_iter()
        .map(|(_, h)| h)
        .collect())
}
