// crates/strata-store/src/snapshot.rs
//
// ConfigSnapshot: generation-tagged, copy-on-write cache of config groups,
// last prices and the last block header.
//
// Validation reads config through this cache instead of re-querying the store,
// so the cache must follow the store across commit and rollback:
//
//   - `inject_all` opens a `SnapshotTx` for one transaction. Reads see the
//     baseline until the first write, which clones it into a shadow
//     generation (baseline generation + 1).
//   - `SnapshotTx::commit` promotes the shadow to the new baseline.
//   - `SnapshotTx::rollback` (or drop) discards the shadow.
//
// Holders of an `Arc<SnapshotState>` obtained from `baseline()` keep observing
// the generation they were handed, whatever later transactions do.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use strata_core::amount::Amount;
use strata_core::error::StrataError;
use strata_core::operation::BlockHeader;
use strata_core::traits::KvStore;

use crate::keys;

/// Names of the config groups the engine reads.
pub mod groups {
    /// `bookkeeping_accounts`: accounts allowed to go negative.
    pub const LEDGER: &str = "ledger";
    /// `admins`: accounts allowed to submit `update_config`.
    pub const GOVERNANCE: &str = "governance";
    /// `oracles`: accounts allowed to submit `price_feed`.
    pub const PRICES: &str = "prices";
    /// `reward_start_block` and other staking-wide settings.
    pub const STAKING: &str = "staking";
    /// One `StakingPoolConfig` per pool id.
    pub const STAKING_POOLS: &str = "staking_pools";
    /// Transition point name -> block height.
    pub const TRANSITIONS: &str = "transitions";
}

/// Last reported USD price for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub token: String,
    pub usd: Amount,
    pub block_num: u64,
    pub updated: DateTime<Utc>,
}

/// One immutable generation of cached state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotState {
    generation: u64,
    config: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    prices: BTreeMap<String, PriceEntry>,
    last_block: Option<BlockHeader>,
}

impl SnapshotState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Raw JSON value of `group.key`.
    pub fn config_value(&self, group: &str, key: &str) -> Option<&serde_json::Value> {
        self.config.get(group).and_then(|g| g.get(key))
    }

    /// All keys of a config group, in key order.
    pub fn group(&self, group: &str) -> Option<&BTreeMap<String, serde_json::Value>> {
        self.config.get(group)
    }

    pub fn group_names(&self) -> Vec<String> {
        self.config.keys().cloned().collect()
    }

    /// Typed read of `group.key`. `Ok(None)` when unset.
    pub fn get<T: DeserializeOwned>(
        &self,
        group: &str,
        key: &str,
    ) -> Result<Option<T>, StrataError> {
        match self.config_value(group, key) {
            Some(v) => serde_json::from_value(v.clone()).map(Some).map_err(|e| {
                StrataError::Serialization(format!("config {}.{}: {}", group, key, e))
            }),
            None => Ok(None),
        }
    }

    /// Typed read of a list of strings; unset reads as empty.
    pub fn string_list(&self, group: &str, key: &str) -> Result<Vec<String>, StrataError> {
        Ok(self.get::<Vec<String>>(group, key)?.unwrap_or_default())
    }

    /// Height of a named transition point, if configured.
    pub fn transition_height(&self, name: &str) -> Result<Option<u64>, StrataError> {
        self.get(groups::TRANSITIONS, name)
    }

    /// True once `block` is at or past the named transition point.
    /// An unset transition point is never reached.
    pub fn transition_reached(&self, name: &str, block: u64) -> Result<bool, StrataError> {
        Ok(self
            .transition_height(name)?
            .map_or(false, |height| block >= height))
    }

    pub fn price(&self, token: &str) -> Option<&PriceEntry> {
        self.prices.get(token)
    }

    pub fn last_block(&self) -> Option<&BlockHeader> {
        self.last_block.as_ref()
    }
}

/// Owner of the committed baseline generation.
///
/// Cloning is cheap (one `Arc`); the block processor stages a block against a
/// clone and adopts it only once the block is on disk.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    baseline: Arc<SnapshotState>,
}

impl ConfigSnapshot {
    /// Empty snapshot at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate a snapshot from everything persisted in the store.
    pub fn load(store: &dyn KvStore) -> Result<Self, StrataError> {
        let mut state = SnapshotState::default();

        for (key, value) in store.scan_prefix(keys::CONFIG_PREFIX.as_bytes())? {
            let (group, name) = keys::parse_config(&key).ok_or_else(|| {
                StrataError::Storage(format!(
                    "malformed config key {}",
                    String::from_utf8_lossy(&key)
                ))
            })?;
            let value: serde_json::Value = serde_json::from_slice(&value)?;
            state.config.entry(group).or_default().insert(name, value);
        }

        for (_, value) in store.scan_prefix(keys::PRICE_PREFIX.as_bytes())? {
            let entry: PriceEntry = serde_json::from_slice(&value)?;
            state.prices.insert(entry.token.clone(), entry);
        }

        if let Some(bytes) = store.get(keys::LAST_BLOCK)? {
            state.last_block = Some(serde_json::from_slice(&bytes)?);
        }

        Ok(Self {
            baseline: Arc::new(state),
        })
    }

    /// A shared handle to the committed baseline.
    pub fn baseline(&self) -> Arc<SnapshotState> {
        Arc::clone(&self.baseline)
    }

    pub fn generation(&self) -> u64 {
        self.baseline.generation
    }

    /// Open the snapshot side of a new transaction.
    pub fn inject_all(&mut self) -> SnapshotTx<'_> {
        SnapshotTx {
            owner: self,
            shadow: None,
        }
    }
}

/// The snapshot as seen by one open transaction.
pub struct SnapshotTx<'a> {
    owner: &'a mut ConfigSnapshot,
    shadow: Option<SnapshotState>,
}

impl<'a> SnapshotTx<'a> {
    /// Current view: the shadow if this transaction wrote anything, else the baseline.
    pub fn view(&self) -> &SnapshotState {
        match &self.shadow {
            Some(shadow) => shadow,
            None => self.owner.baseline.as_ref(),
        }
    }

    /// True once this transaction has staged a change.
    pub fn is_dirty(&self) -> bool {
        self.shadow.is_some()
    }

    fn shadow_mut(&mut self) -> &mut SnapshotState {
        let baseline = &self.owner.baseline;
        self.shadow.get_or_insert_with(|| {
            let mut next = SnapshotState::clone(baseline);
            next.generation += 1;
            next
        })
    }

    pub fn stage_config(&mut self, group: &str, key: &str, value: serde_json::Value) {
        self.shadow_mut()
            .config
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn stage_price(&mut self, entry: PriceEntry) {
        self.shadow_mut().prices.insert(entry.token.clone(), entry);
    }

    pub fn stage_last_block(&mut self, header: BlockHeader) {
        self.shadow_mut().last_block = Some(header);
    }

    /// Promote the shadow generation to baseline.
    pub fn commit(self) {
        if let Some(shadow) = self.shadow {
            self.owner.baseline = Arc::new(shadow);
        }
    }

    /// Discard the shadow generation.
    pub fn rollback(self) {}
}
