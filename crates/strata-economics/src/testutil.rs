// Shared fixtures for the unit tests of this crate.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use strata_core::account::{MINTING_ACCOUNT, STAKE_ISSUER_ACCOUNT};
use strata_core::amount::Amount;
use strata_core::operation::BlockContext;
use strata_store::snapshot::groups;
use strata_store::{ConfigSnapshot, MemoryStore, Transaction};

pub fn time(block: u64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + block as i64 * 3, 0).unwrap()
}

pub fn ctx(block: u64) -> BlockContext {
    BlockContext::new(block, time(block), format!("trx-{}", block))
}

pub fn amt(s: &str) -> Amount {
    s.parse().unwrap()
}

/// A store and snapshot with `$MINTING` and `$STAKE_ISSUER` as bookkeeping
/// accounts plus the given extra config entries (applied after, so they may
/// override the bookkeeping list).
pub fn setup(extra: &[(&str, &str, Value)]) -> (MemoryStore, ConfigSnapshot) {
    let store = MemoryStore::new();
    let mut snapshot = ConfigSnapshot::new();
    {
        let mut tx = Transaction::begin(&store, &mut snapshot, ctx(0));
        tx.set_config(
            groups::LEDGER,
            "bookkeeping_accounts",
            &vec![MINTING_ACCOUNT.to_string(), STAKE_ISSUER_ACCOUNT.to_string()],
        )
        .unwrap();
        for (group, key, value) in extra {
            tx.set_config(group, key, value).unwrap();
        }
        tx.commit().unwrap();
    }
    (store, snapshot)
}

/// Mint `qty` of `token` to each account from `$MINTING` in one committed transaction.
pub fn mint(store: &MemoryStore, snapshot: &mut ConfigSnapshot, grants: &[(&str, &str, &str)]) {
    let mut tx = Transaction::begin(store, snapshot, ctx(0));
    for (account, token, qty) in grants {
        crate::ledger::transfer(
            &mut tx,
            MINTING_ACCOUNT,
            MINTING_ACCOUNT,
            account,
            token,
            amt(qty),
            "mint",
        )
        .unwrap();
    }
    tx.commit().unwrap();
}
