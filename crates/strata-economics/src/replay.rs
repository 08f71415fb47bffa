// crates/strata-economics/src/replay.rs
//
// Replay keys: client-supplied idempotency tokens scoped to a source account.
//
// Before the `replay_keys` transition point is reached, keys are ignored. From
// that height on, a key may be used once per account; the same key from a
// different account is independent.

use serde::{Deserialize, Serialize};

use strata_core::account::is_valid_account;
use strata_core::error::StrataError;
use strata_core::event::EventRecord;
use strata_store::keys;
use strata_store::Transaction;

/// Transition point from which replay keys are enforced.
pub const REPLAY_KEYS_TRANSITION: &str = "replay_keys";

pub const REPLAY_KEYS_TABLE: &str = "replay_keys";

pub const MAX_KEY_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub account: String,
    pub key: String,
    pub block_num: u64,
    pub trx_id: String,
}

/// True once replay keys are enforced at the transaction's block.
pub fn enforced(tx: &Transaction<'_>) -> Result<bool, StrataError> {
    tx.config()
        .transition_reached(REPLAY_KEYS_TRANSITION, tx.block_num())
}

/// Check `key` against the replay table and record it in the same transaction.
///
/// Returns `Ok(None)` when keys are not enforced yet (the key is ignored), and
/// the insert event otherwise. A malformed key or a key already used by
/// `account` is rejected.
pub fn check_and_record(
    tx: &mut Transaction<'_>,
    account: &str,
    key: &str,
) -> Result<Option<EventRecord>, StrataError> {
    if !enforced(tx)? {
        return Ok(None);
    }
    // The row key is `replay:{account}:{key}`; a `:` in the account would
    // let two different (account, key) pairs share a row.
    if !is_valid_account(account) {
        return Err(StrataError::rejected(format!("invalid account name {:?}", account)));
    }
    if key.is_empty() || key.chars().count() > MAX_KEY_LEN {
        return Err(StrataError::rejected(format!(
            "replay key must be 1-{} characters",
            MAX_KEY_LEN
        )));
    }

    let row_key = keys::replay(account, key);
    if tx.get_json::<ReplayRecord>(&row_key)?.is_some() {
        return Err(StrataError::rejected(format!(
            "replay key {:?} already used by {}",
            key, account
        )));
    }

    let record = ReplayRecord {
        account: account.to_string(),
        key: key.to_string(),
        block_num: tx.block_num(),
        trx_id: tx.ctx().trx_id.clone(),
    };
    tx.put_json(row_key, &record)?;
    Ok(Some(EventRecord::insert(
        REPLAY_KEYS_TABLE,
        serde_json::to_value(&record)?,
    )))
}
