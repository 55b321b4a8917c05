//! # Memory Cache Provider
//!
//! In-process stores guarded by `parking_lot` locks. Entries are never
//! evicted; a store only shrinks through explicit deletes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::cache::providers::{CacheStorage, CacheStore};
use crate::cache::types::{AssetResponse, CacheKey, CacheLookupResult, CacheResult};

/// A single in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<CacheKey, AssetResponse>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> CacheLookupResult {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, key: CacheKey, response: AssetResponse) -> CacheResult<()> {
        self.entries.write().insert(key, response);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn keys(&self) -> CacheResult<Vec<CacheKey>> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    async fn contains(&self, key: &CacheKey) -> CacheResult<bool> {
        Ok(self.entries.read().contains_key(key))
    }
}

/// Named in-memory stores for a single process
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    stores: Arc<RwLock<HashMap<String, Arc<MemoryStore>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete handle to an existing store, without creating it
    pub fn store(&self, name: &str) -> Option<Arc<MemoryStore>> {
        self.stores.read().get(name).cloned()
    }
}

#[async_trait::async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn CacheStore>> {
        let store: Arc<dyn CacheStore> = self
            .stores
            .write()
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(store = name, "Created memory store");
                Arc::new(MemoryStore::new())
            })
            .clone();
        Ok(store)
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let existed = self.stores.write().remove(name).is_some();
        if existed {
            debug!(store = name, "Deleted memory store");
        }
        Ok(existed)
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        Ok(self.stores.read().contains_key(name))
    }

    async fn names(&self) -> CacheResult<Vec<String>> {
        let mut names: Vec<String> = self.stores.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str) -> CacheKey {
        CacheKey::new(format!("https://app.test/{path}"))
    }

    fn response(body: &str) -> AssetResponse {
        AssetResponse::new(200, "https://app.test/", body.to_string())
    }

    #[tokio::test]
    async fn test_open_creates_lazily() {
        let storage = MemoryStorage::new();
        assert!(!storage.has("main").await.unwrap());

        storage.open("main").await.unwrap();
        assert!(storage.has("main").await.unwrap());
        assert_eq!(storage.names().await.unwrap(), vec!["main".to_string()]);
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let storage = MemoryStorage::new();
        let store = storage.open("main").await.unwrap();

        store.put(key("a.js"), response("a")).await.unwrap();
        assert_eq!(store.get(&key("a.js")).await.unwrap(), Some(response("a")));
        assert!(store.contains(&key("a.js")).await.unwrap());
        assert!(store.get(&key("b.js")).await.unwrap().is_none());

        assert!(store.delete(&key("a.js")).await.unwrap());
        assert!(!store.delete(&key("a.js")).await.unwrap());
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_shares_entries() {
        let storage = MemoryStorage::new();
        storage
            .open("main")
            .await
            .unwrap()
            .put(key("a.js"), response("a"))
            .await
            .unwrap();

        let again = storage.open("main").await.unwrap();
        assert_eq!(again.keys().await.unwrap(), vec![key("a.js")]);
        assert_eq!(storage.store("main").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_detaches_open_handles() {
        let storage = MemoryStorage::new();
        let old = storage.open("main").await.unwrap();
        old.put(key("a.js"), response("a")).await.unwrap();

        assert!(storage.delete("main").await.unwrap());
        assert!(!storage.delete("main").await.unwrap());
        assert!(!storage.has("main").await.unwrap());

        // The detached handle still works, the fresh store is empty.
        assert!(old.contains(&key("a.js")).await.unwrap());
        let fresh = storage.open("main").await.unwrap();
        assert!(fresh.keys().await.unwrap().is_empty());
    }
}
