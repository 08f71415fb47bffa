// crates/strata-engine/src/genesis.rs
//
// Genesis state: initial config groups and initial balances.
//
// Applied exactly once per store, guarded by `meta:genesis`. Balances are
// minted by ordinary ledger transfers out of `$MINTING`, so the conservation
// invariant holds from the first block.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use strata_core::account::MINTING_ACCOUNT;
use strata_core::amount::Amount;
use strata_core::error::StrataError;
use strata_core::operation::BlockContext;
use strata_core::traits::{KvStore, KvWrite};
use strata_economics::ledger::{self, BOOKKEEPING_KEY};
use strata_economics::pool::load_pools;
use strata_store::keys;
use strata_store::snapshot::groups;
use strata_store::{ConfigSnapshot, Transaction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisBalance {
    pub account: String,
    pub token: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genesis {
    /// group -> key -> value
    #[serde(default)]
    pub config: BTreeMap<String, BTreeMap<String, Value>>,
    #[serde(default)]
    pub balances: Vec<GenesisBalance>,
}

/// Apply `genesis` unless it already has been. Returns the committed writes,
/// or `None` when the store already carries a genesis marker.
pub fn apply_genesis(
    store: &dyn KvStore,
    snapshot: &mut ConfigSnapshot,
    genesis: &Genesis,
) -> Result<Option<Vec<KvWrite>>, StrataError> {
    if store.get(keys::GENESIS)?.is_some() {
        return Ok(None);
    }

    let ctx = BlockContext::new(0, DateTime::<Utc>::default(), "genesis");
    let mut tx = Transaction::begin(store, snapshot, ctx);
    match write_genesis(&mut tx, genesis) {
        Ok(()) => tx.commit().map(Some),
        Err(e) => {
            tx.rollback();
            Err(match e {
                StrataError::Rejected(msg) => {
                    StrataError::Configuration(format!("genesis: {}", msg))
                }
                other => other,
            })
        }
    }
}

fn write_genesis(tx: &mut Transaction<'_>, genesis: &Genesis) -> Result<(), StrataError> {
    for (group, entries) in &genesis.config {
        for (key, value) in entries {
            tx.set_config(group, key, value)?;
        }
    }

    let mut bookkeeping = tx.config().string_list(groups::LEDGER, BOOKKEEPING_KEY)?;
    if !bookkeeping.iter().any(|a| a == MINTING_ACCOUNT) {
        bookkeeping.push(MINTING_ACCOUNT.to_string());
        tx.set_config(groups::LEDGER, BOOKKEEPING_KEY, &bookkeeping)?;
    }

    let pools = load_pools(tx.config())?;
    for pool in &pools {
        pool.validate()?;
        pool.check_siblings(&pools)?;
    }

    for grant in &genesis.balances {
        ledger::transfer(
            tx,
            MINTING_ACCOUNT,
            MINTING_ACCOUNT,
            &grant.account,
            &grant.token,
            grant.amount,
            "genesis",
        )?;
    }

    tx.put_json(keys::GENESIS.to_vec(), &0u64)
}
