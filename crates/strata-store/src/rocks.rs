// crates/strata-store/src/rocks.rs
//
// RocksDB-backed persistent state store.
//
// The engine writes only through `write_batch`, so every committed
// transaction lands as one RocksDB `WriteBatch`: either all of an operation's
// balance, history and accumulator rows are on disk, or none are.

use rocksdb::{DBWithThreadMode, MultiThreaded, Options, WriteBatch};

use strata_core::error::StrataError;
use strata_core::traits::{KvStore, KvWrite};

/// RocksDB wrapper implementing the `KvStore` trait.
#[derive(Debug)]
pub struct RocksStore {
    db: DBWithThreadMode<MultiThreaded>,
}

impl RocksStore {
    /// Open a RocksDB database at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist.
    pub fn open(path: &str) -> Result<Self, StrataError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path).map_err(|e| {
            StrataError::Storage(format!("Failed to open RocksDB at {}: {}", path, e))
        })?;

        Ok(Self { db })
    }

    /// Open an existing database without taking the write lock, so it can be
    /// inspected while a daemon holds it. Writes fail.
    pub fn open_read_only(path: &str) -> Result<Self, StrataError> {
        let opts = Options::default();
        let db = DBWithThreadMode::<MultiThreaded>::open_for_read_only(&opts, path, false)
            .map_err(|e| {
                StrataError::Storage(format!("Failed to open RocksDB read-only at {}: {}", path, e))
            })?;

        Ok(Self { db })
    }

    /// Flush memtables to disk. Called on graceful shutdown.
    pub fn flush(&self) -> Result<(), StrataError> {
        self.db
            .flush()
            .map_err(|e| StrataError::Storage(format!("RocksDB flush failed: {}", e)))
    }
}

impl KvStore for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StrataError> {
        self.db
            .get(key)
            .map_err(|e| StrataError::Storage(format!("RocksDB get failed: {}", e)))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StrataError> {
        let mut rows = Vec::new();
        for item in self.db.prefix_iterator(prefix) {
            let (key, value) = item
                .map_err(|e| StrataError::Storage(format!("RocksDB iteration error: {}", e)))?;

            // Without a prefix extractor the iterator runs to the end of the
            // keyspace. Stop when the prefix no longer matches.
            if !key.starts_with(prefix) {
                break;
            }
            rows.push((key.to_vec(), value.to_vec()));
        }
        Ok(rows)
    }

    fn write_batch(&self, writes: &[KvWrite]) -> Result<(), StrataError> {
        let mut batch = WriteBatch::default();
        for write in writes {
            match write {
                KvWrite::Put(k, v) => batch.put(k, v),
                KvWrite::Delete(k) => batch.delete(k),
            }
        }
        self.db
            .write(batch)
            .map_err(|e| StrataError::Storage(format!("RocksDB write failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_path(label: &str) -> String {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("strata_test_{}_{}", label, uuid::Uuid::now_v7()));
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_batch_roundtrip_and_prefix_scan() {
        let path = temp_db_path("rocks");
        let store = RocksStore::open(&path).unwrap();
        store
            .write_batch(&[
                KvWrite::Put(b"balance:SPS:bob".to_vec(), b"2".to_vec()),
                KvWrite::Put(b"balance:SPS:alice".to_vec(), b"1".to_vec()),
                KvWrite::Put(b"balance:VOUCHER:alice".to_vec(), b"3".to_vec()),
            ])
            .unwrap();

        let rows = store.scan_prefix(b"balance:SPS:").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, b"balance:SPS:alice".to_vec());

        store
            .write_batch(&[KvWrite::Delete(b"balance:SPS:bob".to_vec())])
            .unwrap();
        assert_eq!(store.get(b"balance:SPS:bob").unwrap(), None);

        drop(store);
        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn test_read_only_sees_committed_writes_and_refuses_new_ones() {
        let path = temp_db_path("readonly");
        let store = RocksStore::open(&path).unwrap();
        store
            .write_batch(&[KvWrite::Put(b"meta:last_block".to_vec(), b"7".to_vec())])
            .unwrap();
        store.flush().unwrap();

        let reader = RocksStore::open_read_only(&path).unwrap();
        assert_eq!(reader.get(b"meta:last_block").unwrap(), Some(b"7".to_vec()));
        assert!(reader
            .write_batch(&[KvWrite::Put(b"k".to_vec(), b"v".to_vec())])
            .is_err());

        drop(reader);
        drop(store);
        let _ = std::fs::remove_dir_all(&path);
    }
}
