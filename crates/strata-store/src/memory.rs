// crates/strata-store/src/memory.rs
//
// In-memory `KvStore` backed by an ordered map. Used by unit tests and by
// tooling that replays a short feed without touching disk.

use std::collections::BTreeMap;
use std::sync::RwLock;

use strata_core::error::StrataError;
use strata_core::traits::{KvStore, KvWrite};

/// Ordered in-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StrataError {
    StrataError::Storage("memory store lock poisoned".to_string())
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StrataError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StrataError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn write_batch(&self, writes: &[KvWrite]) -> Result<(), StrataError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        for write in writes {
            match write {
                KvWrite::Put(k, v) => {
                    map.insert(k.clone(), v.clone());
                }
                KvWrite::Delete(k) => {
                    map.remove(k);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_prefix_is_ordered_and_bounded() {
        let store = MemoryStore::new();
        store
            .write_batch(&[
                KvWrite::Put(b"a:2".to_vec(), b"2".to_vec()),
                KvWrite::Put(b"a:1".to_vec(), b"1".to_vec()),
                KvWrite::Put(b"b:1".to_vec(), b"x".to_vec()),
            ])
            .unwrap();

        let rows = store.scan_prefix(b"a:").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, b"a:1".to_vec());
        assert_eq!(rows[1].0, b"a:2".to_vec());
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();
        store
            .write_batch(&[KvWrite::Put(b"k".to_vec(), b"v".to_vec())])
            .unwrap();
        store.write_batch(&[KvWrite::Delete(b"k".to_vec())]).unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
        assert!(store.is_empty());
    }
}
