//! Persistent key/value storage using RocksDB.

use meshmap_core::error::Error as CoreError;
use meshmap_core::error::Result as CoreResult;
use meshmap_core::KvStore;
use rocksdb::{Options, DB};
use std::path::Path;

use crate::error::Result;

/// RocksDB-backed implementation of the conflation engine's store.
pub struct RocksKvStore {
    db: DB,
}

impl RocksKvStore {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }
}

impl KvStore for RocksKvStore {
    fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        self.db
            .get(key.as_bytes())
            .map_err(|e| CoreError::Storage(e.to_string()))
    }

    fn put(&self, key: &str, value: &[u8]) -> CoreResult<()> {
        self.db
            .put(key.as_bytes(), value)
            .map_err(|e| CoreError::Storage(e.to_string()))
    }

    fn delete(&self, key: &str) -> CoreResult<()> {
        self.db
            .delete(key.as_bytes())
            .map_err(|e| CoreError::Storage(e.to_string()))
    }

    fn list(&self, prefix: &str) -> CoreResult<Vec<(String, Vec<u8>)>> {
        let mut entries = Vec::new();

        let iter = self.db.prefix_iterator(prefix.as_bytes());
        for item in iter {
            let (key, value) = item.map_err(|e| CoreError::Storage(e.to_string()))?;
            if key.starts_with(prefix.as_bytes()) {
                let key = String::from_utf8_lossy(&key).to_string();
                entries.push((key, value.to_vec()));
            } else {
                break;
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshmap_core::{ConflationEngine, Observation};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn roundtrip() {
        let dir = tempdir().unwrap();
        let store = RocksKvStore::open(dir.path()).unwrap();

        store.put("sample:abc", b"payload").unwrap();
        assert_eq!(
            store.get("sample:abc").unwrap().as_deref(),
            Some(&b"payload"[..])
        );

        store.delete("sample:abc").unwrap();
        assert_eq!(store.get("sample:abc").unwrap(), None);
    }

    #[test]
    fn list_scopes_by_prefix() {
        let dir = tempdir().unwrap();
        let store = RocksKvStore::open(dir.path()).unwrap();

        store.put("sample:a", b"1").unwrap();
        store.put("sample:b", b"2").unwrap();
        store.put("node:x", b"3").unwrap();

        let samples = store.list("sample:").unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|(k, _)| k.starts_with("sample:")));
    }

    #[test]
    fn engine_runs_against_rocksdb() {
        let dir = tempdir().unwrap();
        let store = Arc::new(RocksKvStore::open(dir.path()).unwrap());
        let engine = ConflationEngine::new(store);

        let obs = Observation {
            lat: 40.0,
            lon: -105.0,
            rssi: Some(-72),
            snr: None,
            mesh: Some("alpha".to_string()),
            path: Vec::new(),
            observed: true,
            sender: None,
        };

        let outcome = engine.ingest(&obs, 1_000).unwrap();
        let record = engine.get_sample(&outcome.cell).unwrap().unwrap();
        assert_eq!(record.rssi, Some(-72));
        assert!(record.mesh_ids.contains("ALPHA"));
    }
}
