//! # Cache Provider
//!
//! The host capabilities every storage backend has to offer: a registry of
//! stores opened by name, and the key/value operations of a single store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::types::{AssetResponse, CacheKey, CacheLookupResult, CacheResult};

/// A single named store mapping request identities to responses
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the response stored for a request
    async fn get(&self, key: &CacheKey) -> CacheLookupResult;

    /// Store a response, replacing any previous entry for the request
    async fn put(&self, key: CacheKey, response: AssetResponse) -> CacheResult<()>;

    /// Remove an entry. Returns whether an entry existed.
    async fn delete(&self, key: &CacheKey) -> CacheResult<bool>;

    /// All request identities currently stored
    async fn keys(&self) -> CacheResult<Vec<CacheKey>>;

    /// Check if the store contains an entry for the given key
    async fn contains(&self, key: &CacheKey) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Registry of named stores.
///
/// Stores are created lazily by [`CacheStorage::open`]. Deleting a store drops
/// its contents and the next `open` yields a fresh empty one. Whether handles
/// opened before the delete see the new store is up to the provider.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a store by name, creating it if needed
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn CacheStore>>;

    /// Delete a store. Returns whether it existed.
    async fn delete(&self, name: &str) -> CacheResult<bool>;

    /// Check whether a store exists
    async fn has(&self, name: &str) -> CacheResult<bool>;

    /// Names of all existing stores
    async fn names(&self) -> CacheResult<Vec<String>>;
}
