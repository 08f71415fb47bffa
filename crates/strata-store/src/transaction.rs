// crates/strata-store/src/transaction.rs
//
// Transaction: the unit of atomicity for one operation.
//
// Bundles the store write overlay, the snapshot shadow generation, and the
// block context. Both halves commit together or are discarded together, so
// cached config can never drift from the store. The snapshot is borrowed
// mutably for the transaction's lifetime, which rules out a second open
// transaction at compile time.

use serde::de::DeserializeOwned;
use serde::Serialize;

use strata_core::error::StrataError;
use strata_core::operation::{BlockContext, BlockHeader};
use strata_core::traits::{KvStore, KvWrite};

use crate::keys;
use crate::snapshot::{ConfigSnapshot, PriceEntry, SnapshotState, SnapshotTx};
use crate::tx::StoreTx;

pub struct Transaction<'a> {
    store: StoreTx<'a>,
    config: SnapshotTx<'a>,
    ctx: BlockContext,
}

impl<'a> Transaction<'a> {
    /// Open a transaction over `store`, shadowing `snapshot`.
    pub fn begin(
        store: &'a dyn KvStore,
        snapshot: &'a mut ConfigSnapshot,
        ctx: BlockContext,
    ) -> Self {
        Self {
            store: StoreTx::new(store),
            config: snapshot.inject_all(),
            ctx,
        }
    }

    pub fn ctx(&self) -> &BlockContext {
        &self.ctx
    }

    pub fn block_num(&self) -> u64 {
        self.ctx.block_num
    }

    pub fn store(&self) -> &StoreTx<'a> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StoreTx<'a> {
        &mut self.store
    }

    /// Config as seen by this transaction (including its own staged writes).
    pub fn config(&self) -> &SnapshotState {
        self.config.view()
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, StrataError> {
        self.store.get_json(key)
    }

    pub fn put_json<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<(), StrataError> {
        self.store.put_json(key, value)
    }

    /// Persist `group.key` and stage it in the snapshot shadow.
    pub fn set_config<T: Serialize>(
        &mut self,
        group: &str,
        key: &str,
        value: &T,
    ) -> Result<(), StrataError> {
        let value = serde_json::to_value(value)?;
        self.store.put_json(keys::config(group, key), &value)?;
        self.config.stage_config(group, key, value);
        Ok(())
    }

    /// Persist and cache the last price of a token.
    pub fn set_price(&mut self, entry: PriceEntry) -> Result<(), StrataError> {
        self.store.put_json(keys::price(&entry.token), &entry)?;
        self.config.stage_price(entry);
        Ok(())
    }

    /// Persist and cache the header of the block being processed.
    pub fn set_last_block(&mut self, header: &BlockHeader) -> Result<(), StrataError> {
        self.store.put_json(keys::LAST_BLOCK.to_vec(), header)?;
        self.config.stage_last_block(header.clone());
        Ok(())
    }

    /// Commit the store overlay, then promote the snapshot shadow.
    ///
    /// If the store write fails the shadow is dropped with it.
    pub fn commit(self) -> Result<Vec<KvWrite>, StrataError> {
        let writes = self.store.commit()?;
        self.config.commit();
        Ok(writes)
    }

    pub fn rollback(self) {
        self.store.rollback();
        self.config.rollback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn ctx(block: u64) -> BlockContext {
        BlockContext::new(block, Utc.timestamp_opt(1_700_000_000, 0).unwrap(), "trx")
    }

    #[test]
    fn test_config_write_persists_and_caches() {
        let store = MemoryStore::new();
        let mut snapshot = ConfigSnapshot::new();

        let mut tx = Transaction::begin(&store, &mut snapshot, ctx(1));
        tx.set_config("governance", "admins", &vec!["gov".to_string()])
            .unwrap();
        assert_eq!(
            tx.config().string_list("governance", "admins").unwrap(),
            vec!["gov".to_string()]
        );
        tx.commit().unwrap();

        // Cache and store agree, and a fresh load reproduces the cache.
        let reloaded = ConfigSnapshot::load(&store).unwrap();
        assert_eq!(
            reloaded.baseline().string_list("governance", "admins").unwrap(),
            snapshot.baseline().string_list("governance", "admins").unwrap()
        );
    }

    #[test]
    fn test_rollback_discards_store_and_cache_together() {
        let store = MemoryStore::new();
        let mut snapshot = ConfigSnapshot::new();

        let mut tx = Transaction::begin(&store, &mut snapshot, ctx(1));
        tx.set_config("prices", "oracles", &vec!["feed".to_string()])
            .unwrap();
        tx.rollback();

        assert!(store.is_empty());
        assert_eq!(snapshot.generation(), 0);
        assert!(snapshot.baseline().config_value("prices", "oracles").is_none());
    }
}
