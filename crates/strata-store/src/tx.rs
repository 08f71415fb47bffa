// crates/strata-store/src/tx.rs
//
// StoreTx: a write overlay over a `KvStore`.
//
// All writes of one operation are staged in memory. Reads (including prefix
// scans) see the staged writes layered over the base store. `commit` applies
// the whole overlay as a single atomic batch; `rollback` (or dropping the
// transaction) discards it without touching the base store.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use strata_core::error::StrataError;
use strata_core::traits::{KvStore, KvWrite};

/// Staged writes over a base store.
pub struct StoreTx<'a> {
    base: &'a dyn KvStore,
    /// `None` marks a staged delete.
    staged: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> StoreTx<'a> {
    pub fn new(base: &'a dyn KvStore) -> Self {
        Self {
            base,
            staged: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StrataError> {
        match self.staged.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.base.get(key),
        }
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.staged.insert(key, Some(value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.staged.insert(key, None);
    }

    /// Prefix scan merging the base store with staged writes.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StrataError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.base.scan_prefix(prefix)?.into_iter().collect();
        for (key, value) in self
            .staged
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, StrataError> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_json<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<(), StrataError> {
        let bytes = serde_json::to_vec(value)?;
        self.put(key, bytes);
        Ok(())
    }

    /// Prefix scan decoding every value as JSON.
    pub fn scan_json<T: DeserializeOwned>(
        &self,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, T)>, StrataError> {
        self.scan_prefix(prefix)?
            .into_iter()
            .map(|(k, v)| Ok((k, serde_json::from_slice(&v)?)))
            .collect()
    }

    /// True when at least one write is staged.
    pub fn is_dirty(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Apply the staged writes as one batch and return them in key order.
    pub fn commit(self) -> Result<Vec<KvWrite>, StrataError> {
        let writes: Vec<KvWrite> = self
            .staged
            .into_iter()
            .map(|(k, v)| match v {
                Some(v) => KvWrite::Put(k, v),
                None => KvWrite::Delete(k),
            })
            .collect();
        if !writes.is_empty() {
            self.base.write_batch(&writes)?;
        }
        Ok(writes)
    }

    /// Discard all staged writes.
    pub fn rollback(self) {}
}
