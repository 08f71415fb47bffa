// crates/strata-store/src/overlay.rs
//
// BlockOverlay: block-level staging area between the operation transactions
// and the persistent store.
//
// Each operation's `Transaction` is opened over the overlay and commits into
// it, so the overlay acts as a savepoint stack of depth one: a rejected
// operation drops only its own writes, while committed ones accumulate here.
// Nothing reaches the base store until `commit`, which writes the whole block
// as one batch. Dropping the overlay discards the block.

use std::sync::RwLock;

use strata_core::error::StrataError;
use strata_core::traits::{KvStore, KvWrite};

use crate::tx::StoreTx;

pub struct BlockOverlay<'a> {
    staged: RwLock<StoreTx<'a>>,
}

fn poisoned() -> StrataError {
    StrataError::Storage("block overlay lock poisoned".to_string())
}

impl<'a> BlockOverlay<'a> {
    pub fn new(base: &'a dyn KvStore) -> Self {
        Self {
            staged: RwLock::new(StoreTx::new(base)),
        }
    }

    /// Write every staged row to the base store in one batch.
    pub fn commit(self) -> Result<Vec<KvWrite>, StrataError> {
        self.staged.into_inner().map_err(|_| poisoned())?.commit()
    }
}

impl KvStore for BlockOverlay<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StrataError> {
        self.staged.read().map_err(|_| poisoned())?.get(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StrataError> {
        self.staged.read().map_err(|_| poisoned())?.scan_prefix(prefix)
    }

    fn write_batch(&self, writes: &[KvWrite]) -> Result<(), StrataError> {
        let mut staged = self.staged.write().map_err(|_| poisoned())?;
        for write in writes {
            match write {
                KvWrite::Put(k, v) => staged.put(k.clone(), v.clone()),
                KvWrite::Delete(k) => staged.delete(k.clone()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_writes_stay_staged_until_commit() {
        let base = MemoryStore::new();
        base.write_batch(&[KvWrite::Put(b"k:old".to_vec(), b"1".to_vec())])
            .unwrap();

        let overlay = BlockOverlay::new(&base);
        overlay
            .write_batch(&[
                KvWrite::Put(b"k:new".to_vec(), b"2".to_vec()),
                KvWrite::Delete(b"k:old".to_vec()),
            ])
            .unwrap();
        assert_eq!(overlay.get(b"k:new").unwrap(), Some(b"2".to_vec()));
        assert_eq!(overlay.scan_prefix(b"k:").unwrap().len(), 1);
        assert_eq!(base.get(b"k:new").unwrap(), None);

        let writes = overlay.commit().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(base.get(b"k:new").unwrap(), Some(b"2".to_vec()));
        assert_eq!(base.get(b"k:old").unwrap(), None);
    }

    #[test]
    fn test_dropped_overlay_leaves_base_untouched() {
        let base = MemoryStore::new();
        {
            let overlay = BlockOverlay::new(&base);
            overlay
                .write_batch(&[KvWrite::Put(b"k".to_vec(), b"v".to_vec())])
                .unwrap();
        }
        assert!(base.is_empty());
    }
}
