//! # Builder for AgentConfig
//!
//! This module provides a builder pattern implementation for creating
//! AgentConfig instances with a fluent API.
//!
//! # Example
//!
//! ```
//! use shell_cache::AgentConfig;
//!
//! let config = AgentConfig::builder()
//!     .with_origin("https://app.example.com")
//!     .with_resource("index.html", "a8ac06ac")
//!     .with_resource("/", "a8ac06ac")
//!     .with_resource("main.dart.js", "30a754ac")
//!     .with_core(["main.dart.js", "index.html"])
//!     .with_main_cache("my-app-cache")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.origin.as_str(), "https://app.example.com");
//! assert_eq!(config.cache_names.main, "my-app-cache");
//! ```

use crate::cache::CacheNames;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::manifest::{BuildManifest, CoreShell, ResourceManifest};
use crate::request::Origin;

/// Builder for creating AgentConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct AgentConfigBuilder {
    origin: Option<String>,
    manifest: ResourceManifest,
    core: CoreShell,
    cache_names: CacheNames,
    gate_fetch_on_activation: bool,
}

impl AgentConfigBuilder {
    /// Create a new builder with default store names and the fetch gate on
    pub fn new() -> Self {
        Self {
            origin: None,
            manifest: ResourceManifest::new(),
            core: CoreShell::default(),
            cache_names: CacheNames::default(),
            gate_fetch_on_activation: true,
        }
    }

    /// Set the origin; any URL is accepted and reduced to its origin
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Take resources and core shell from the build tool's output
    pub fn with_build_manifest(mut self, build: BuildManifest) -> Self {
        self.manifest = build.resources;
        self.core = build.core;
        self
    }

    /// Replace the resource manifest
    pub fn with_manifest(mut self, manifest: ResourceManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Add a single resource
    pub fn with_resource(mut self, key: impl Into<String>, hash: impl Into<String>) -> Self {
        self.manifest = self.manifest.with_entry(key, hash);
        self
    }

    /// Set the core shell paths
    pub fn with_core<I, S>(mut self, core: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core = core.into_iter().collect();
        self
    }

    /// Set all store names
    pub fn with_cache_names(mut self, names: CacheNames) -> Self {
        self.cache_names = names;
        self
    }

    /// Set the main store name
    pub fn with_main_cache(mut self, name: impl Into<String>) -> Self {
        self.cache_names.main = name.into();
        self
    }

    /// Set the staging store name
    pub fn with_staging_cache(mut self, name: impl Into<String>) -> Self {
        self.cache_names.staging = name.into();
        self
    }

    /// Set the manifest-record store name
    pub fn with_manifest_cache(mut self, name: impl Into<String>) -> Self {
        self.cache_names.manifest = name.into();
        self
    }

    /// Set whether fetches wait for a running activation
    pub fn with_fetch_gate(mut self, enabled: bool) -> Self {
        self.gate_fetch_on_activation = enabled;
        self
    }

    /// Build the AgentConfig instance
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let origin = self
            .origin
            .as_deref()
            .ok_or_else(|| AgentError::UrlError("origin is required".to_string()))
            .and_then(Origin::parse)?;

        let build = BuildManifest {
            resources: self.manifest,
            core: self.core,
        };
        build.validate()?;

        let names = &self.cache_names;
        if names.main == names.staging || names.main == names.manifest || names.staging == names.manifest {
            return Err(AgentError::InvalidConfig(
                "store names must be distinct".to_string(),
            ));
        }

        Ok(AgentConfig {
            cache_names: self.cache_names,
            gate_fetch_on_activation: self.gate_fetch_on_activation,
            ..AgentConfig::new(origin, build)
        })
    }
}

impl Default for AgentConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AgentConfigBuilder::new()
            .with_origin("https://app.test/index.html")
            .build()
            .unwrap();
        assert_eq!(config.origin.as_str(), "https://app.test");
        assert_eq!(config.cache_names, CacheNames::default());
        assert!(config.gate_fetch_on_activation);
        assert!(config.manifest.is_empty());
        assert!(config.core.is_empty());
    }

    #[test]
    fn test_builder_customization() {
        let config = AgentConfigBuilder::new()
            .with_origin("http://localhost:8080")
            .with_resource("index.html", "h1")
            .with_resource("main.dart.js", "h2")
            .with_core(["main.dart.js"])
            .with_staging_cache("tmp")
            .with_manifest_cache("record")
            .with_fetch_gate(false)
            .build()
            .unwrap();

        assert_eq!(config.origin.as_str(), "http://localhost:8080");
        assert_eq!(config.manifest.hash_of("main.dart.js"), Some("h2"));
        assert_eq!(config.core.len(), 1);
        assert_eq!(config.cache_names.staging, "tmp");
        assert_eq!(config.cache_names.manifest, "record");
        assert!(!config.gate_fetch_on_activation);
    }

    #[test]
    fn test_builder_rejects_invalid_input() {
        assert!(matches!(
            AgentConfigBuilder::new().build(),
            Err(AgentError::UrlError(_))
        ));

        let missing_core = AgentConfigBuilder::new()
            .with_origin("https://app.test")
            .with_core(["main.dart.js"])
            .build();
        assert!(matches!(missing_core, Err(AgentError::InvalidManifest(_))));

        let clashing_names = AgentConfigBuilder::new()
            .with_origin("https://app.test")
            .with_staging_cache("flutter-app-cache")
            .build();
        assert!(matches!(clashing_names, Err(AgentError::InvalidConfig(_))));
    }
}
