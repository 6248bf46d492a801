//! Abstract key/value storage behind the conflation engine.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{Error, Result};

/// Minimal key/value contract the conflation engine needs.
///
/// No transactions and no compare-and-swap: the engine's merge rules are
/// designed so that plain read-modify-write per key is enough. Production
/// binds this to RocksDB; tests use [`MemoryKvStore`].
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any existing value.
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// List all entries whose key starts with `prefix`, in key order.
    fn list(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;
}

/// In-memory store for tests and local experimentation.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    map: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> MemoryKvStore {
        MemoryKvStore::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let map = self
            .map
            .read()
            .map_err(|_| Error::Storage("store lock poisoned".to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut map = self
            .map
            .write()
            .map_err(|_| Error::Storage("store lock poisoned".to_string()))?;
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut map = self
            .map
            .write()
            .map_err(|_| Error::Storage("store lock poisoned".to_string()))?;
        map.remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let map = self
            .map
            .read()
            .map_err(|_| Error::Storage("store lock poisoned".to_string()))?;
        Ok(map
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
