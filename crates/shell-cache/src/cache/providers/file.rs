//! # File Cache
//!
//! This module implements a file-based persistent cache provider. Every store
//! is a directory under the storage root; every entry is a `.body` file holding
//! the response bytes and a `.meta` JSON file holding everything else.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io;
use tracing::{debug, warn};

use crate::cache::providers::{CacheStorage, CacheStore};
use crate::cache::types::{AssetResponse, CacheKey, CacheLookupResult, CacheResult};

/// On-disk metadata of a stored response
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMeta {
    /// Request identity, kept so `keys()` can be answered from disk
    key: CacheKey,
    status: u16,
    headers: Vec<(String, String)>,
    url: String,
    /// When the entry was written, seconds since the epoch
    cached_at: u64,
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// A store backed by one directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn body_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.body", key.to_filename()))
    }

    fn meta_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.meta", key.to_filename()))
    }

    async fn read_meta(&self, path: &Path) -> Option<StoredMeta> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to read cache metadata file");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to parse cache metadata, dropping entry");
                let body = path.with_extension("body");
                let _ = fs::remove_file(path).await;
                let _ = fs::remove_file(&body).await;
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &CacheKey) -> CacheLookupResult {
        let meta_path = self.meta_path(key);
        let Some(meta) = self.read_meta(&meta_path).await else {
            return Ok(None);
        };

        let body_path = self.body_path(key);
        let body = match fs::read(&body_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = ?body_path, error = %e, "Failed to read cache data file");
                return Ok(None);
            }
        };

        Ok(Some(AssetResponse {
            status: meta.status,
            headers: meta.headers,
            url: meta.url,
            body: Bytes::from(body),
        }))
    }

    async fn put(&self, key: CacheKey, response: AssetResponse) -> CacheResult<()> {
        fs::create_dir_all(&self.dir).await?;

        let body_path = self.body_path(&key);
        let meta_path = self.meta_path(&key);

        let meta = StoredMeta {
            key,
            status: response.status,
            headers: response.headers,
            url: response.url,
            cached_at: now_secs(),
        };
        let meta_json = serde_json::to_vec(&meta).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to serialize metadata: {e}"),
            )
        })?;

        // Write both files under temporary names first; the metadata rename is
        // what makes the entry visible.
        let temp_body_path = body_path.with_extension("body.tmp");
        let temp_meta_path = meta_path.with_extension("meta.tmp");

        if let Err(e) = fs::write(&temp_body_path, &response.body).await {
            warn!(path = ?temp_body_path, error = %e, "Failed to write cache data file");
            return Err(e);
        }

        if let Err(e) = fs::write(&temp_meta_path, &meta_json).await {
            warn!(path = ?temp_meta_path, error = %e, "Failed to write cache metadata file");
            let _ = fs::remove_file(&temp_body_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_body_path, &body_path).await {
            warn!(from = ?temp_body_path, to = ?body_path, error = %e, "Failed to rename temporary data file");
            let _ = fs::remove_file(&temp_body_path).await;
            let _ = fs::remove_file(&temp_meta_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_meta_path, &meta_path).await {
            warn!(from = ?temp_meta_path, to = ?meta_path, error = %e, "Failed to rename temporary metadata file");
            let _ = fs::remove_file(&body_path).await;
            let _ = fs::remove_file(&temp_meta_path).await;
            return Err(e);
        }

        debug!(key = %meta.key, "Cached entry to file");
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<bool> {
        let body_path = self.body_path(key);
        let meta_path = self.meta_path(key);

        // Metadata first, so a half-deleted entry reads as a miss.
        let meta_result = fs::remove_file(&meta_path).await;
        let body_result = fs::remove_file(&body_path).await;

        match (meta_result, body_result) {
            (Err(e), _) if e.kind() != io::ErrorKind::NotFound => {
                warn!(path = ?meta_path, error = %e, "Failed to remove cache metadata file");
                Err(e)
            }
            (_, Err(e)) if e.kind() != io::ErrorKind::NotFound => {
                warn!(path = ?body_path, error = %e, "Failed to remove cache data file");
                Err(e)
            }
            (Ok(()), _) => Ok(true),
            _ => Ok(false),
        }
    }

    async fn keys(&self) -> CacheResult<Vec<CacheKey>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("meta") {
                continue;
            }
            if let Some(meta) = self.read_meta(&path).await {
                keys.push(meta.key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn contains(&self, key: &CacheKey) -> CacheResult<bool> {
        Ok(fs::try_exists(self.meta_path(key)).await? && fs::try_exists(self.body_path(key)).await?)
    }
}

/// Named stores persisted under a root directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> CacheResult<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid store name: {name:?}"),
            ));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait::async_trait]
impl CacheStorage for FileStorage {
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn CacheStore>> {
        let dir = self.store_dir(name)?;
        fs::create_dir_all(&dir).await?;
        Ok(Arc::new(FileStore::new(dir)))
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let dir = self.store_dir(name)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(store = name, dir = ?dir, "Deleted file store");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                warn!(dir = ?dir, error = %e, "Failed to remove store directory");
                Err(e)
            }
        }
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        fs::try_exists(self.store_dir(name)?).await
    }

    async fn names(&self) -> CacheResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}
