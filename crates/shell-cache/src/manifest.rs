//! # Resource Manifest
//!
//! The build-time mapping from every deployed asset path to its content hash,
//! plus the list of shell paths that have to be cached before the agent is
//! ready. Both are produced by the surrounding build tool and are read-only
//! for the lifetime of an agent.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Logical key of the entry document.
pub const ROOT_KEY: &str = "/";

/// Mapping from a path relative to the origin to the content hash of that asset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest {
    entries: BTreeMap<String, String>,
}

impl ResourceManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing the hash of an existing key
    pub fn with_entry(mut self, key: impl Into<String>, hash: impl Into<String>) -> Self {
        self.entries.insert(key.into(), hash.into());
        self
    }

    /// Parse the flat JSON object form (`{"main.js": "<hash>"}`)
    pub fn from_json(bytes: &[u8]) -> Result<Self, AgentError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json(&self) -> Result<String, AgentError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn hash_of(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a cached entry for `key` recorded under `previous` may be served
    /// under this manifest: the key must still exist and its hash must be unchanged.
    pub fn retains(&self, previous: &ResourceManifest, key: &str) -> bool {
        match (self.hash_of(key), previous.hash_of(key)) {
            (Some(current), Some(old)) => current == old,
            _ => false,
        }
    }

    /// Compare this manifest against a previously applied one
    pub fn diff(&self, previous: &ResourceManifest) -> ManifestDiff {
        let mut diff = ManifestDiff::default();

        for (key, hash) in self.iter() {
            match previous.hash_of(key) {
                Some(old) if old == hash => diff.unchanged.push(key.to_string()),
                Some(_) => diff.changed.push(key.to_string()),
                None => diff.added.push(key.to_string()),
            }
        }

        diff.removed = previous
            .keys()
            .filter(|key| !self.contains(key))
            .map(str::to_string)
            .collect();

        diff
    }
}

impl<K, V> FromIterator<(K, V)> for ResourceManifest
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Key-level difference between two manifests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    pub unchanged: Vec<String>,
    pub changed: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ManifestDiff {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }
}

/// Ordered list of the application shell files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoreShell(Vec<String>);

impl CoreShell {
    pub fn new(paths: Vec<String>) -> Self {
        Self(paths)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CoreShell {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The artifact emitted by the build tool: `{"resources": {...}, "core": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub resources: ResourceManifest,
    #[serde(default)]
    pub core: CoreShell,
}

impl BuildManifest {
    pub fn from_json(bytes: &[u8]) -> Result<Self, AgentError> {
        let manifest: BuildManifest = serde_json::from_slice(bytes)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_path(path: &Path) -> Result<Self, AgentError> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }

    /// Every shell path has to be a manifest key
    pub fn validate(&self) -> Result<(), AgentError> {
        if let Some(missing) = self.core.iter().find(|p| !self.resources.contains(p)) {
            return Err(AgentError::InvalidManifest(format!(
                "core path {missing} is not listed in resources"
            )));
        }
        Ok(())
    }
}
