//! # Cache Manager
//!
//! This module ties the storage capability to the three named stores the
//! lifecycle handlers share.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::providers::{CacheStorage, CacheStore};
use crate::cache::types::{AssetResponse, CacheKey, CacheResult};
use crate::error::AgentError;
use crate::manifest::ResourceManifest;

/// Key the last applied manifest is stored under in the record store
pub const MANIFEST_RECORD_KEY: &str = "manifest";

/// Names of the stores, opened by name on every handler invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    /// Long-lived store requests are served from
    pub main: String,
    /// Transient store filled during install
    pub staging: String,
    /// Holds the last applied manifest
    pub manifest: String,
}

impl Default for CacheNames {
    fn default() -> Self {
        Self {
            main: "flutter-app-cache".to_string(),
            staging: "flutter-temp-cache".to_string(),
            manifest: "flutter-app-manifest".to_string(),
        }
    }
}

/// Access to the staging, main and manifest-record stores
#[derive(Clone)]
pub struct CacheStores {
    storage: Arc<dyn CacheStorage>,
    names: CacheNames,
}

impl CacheStores {
    pub fn new(storage: Arc<dyn CacheStorage>, names: CacheNames) -> Self {
        Self { storage, names }
    }

    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub async fn open_main(&self) -> CacheResult<Arc<dyn CacheStore>> {
        self.storage.open(&self.names.main).await
    }

    pub async fn open_staging(&self) -> CacheResult<Arc<dyn CacheStore>> {
        self.storage.open(&self.names.staging).await
    }

    pub async fn open_record(&self) -> CacheResult<Arc<dyn CacheStore>> {
        self.storage.open(&self.names.manifest).await
    }

    /// Delete the main store and open it again, empty
    pub async fn recreate_main(&self) -> CacheResult<Arc<dyn CacheStore>> {
        self.storage.delete(&self.names.main).await?;
        self.open_main().await
    }

    pub async fn delete_staging(&self) -> CacheResult<bool> {
        self.storage.delete(&self.names.staging).await
    }

    /// Delete all three stores. Failures are logged and do not stop the others.
    pub async fn delete_all(&self) {
        for name in [&self.names.main, &self.names.staging, &self.names.manifest] {
            if let Err(e) = self.storage.delete(name).await {
                warn!(store = %name, error = %e, "Failed to delete store");
            }
        }
    }

    /// Copy every entry of `from` into `to`, overwriting. Returns the number copied.
    pub async fn copy_all(&self, from: &dyn CacheStore, to: &dyn CacheStore) -> CacheResult<usize> {
        let mut copied = 0;
        for key in from.keys().await? {
            if let Some(response) = from.get(&key).await? {
                to.put(key, response).await?;
                copied += 1;
            }
        }
        Ok(copied)
    }

    /// Load the last applied manifest, if one was recorded
    pub async fn read_manifest(
        &self,
        record: &dyn CacheStore,
    ) -> Result<Option<ResourceManifest>, AgentError> {
        match record.get(&CacheKey::new(MANIFEST_RECORD_KEY)).await? {
            Some(response) => Ok(Some(ResourceManifest::from_json(&response.body)?)),
            None => Ok(None),
        }
    }

    /// Record `manifest` as the last applied one
    pub async fn write_manifest(
        &self,
        record: &dyn CacheStore,
        manifest: &ResourceManifest,
    ) -> Result<(), AgentError> {
        let body = manifest.to_json()?;
        let response = AssetResponse::new(200, MANIFEST_RECORD_KEY, body)
            .with_header("Content-Type", "application/json");
        record
            .put(CacheKey::new(MANIFEST_RECORD_KEY), response)
            .await?;
        debug!(entries = manifest.len(), "Recorded manifest");
        Ok(())
    }
}
