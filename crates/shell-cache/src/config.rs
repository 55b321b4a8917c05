use crate::cache::CacheNames;
use crate::manifest::{BuildManifest, CoreShell, ResourceManifest};
use crate::request::Origin;

/// Immutable configuration of an agent, fixed at build time
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Origin the agent serves, requests elsewhere are never intercepted
    pub origin: Origin,

    /// Asset path to content hash for this build
    pub manifest: ResourceManifest,

    /// Paths fetched into staging on install
    pub core: CoreShell,

    /// Names of the staging, main and manifest-record stores
    pub cache_names: CacheNames,

    /// Hold fetches back while an activation is reconciling the stores
    pub gate_fetch_on_activation: bool,
}

impl AgentConfig {
    pub fn builder() -> crate::builder::AgentConfigBuilder {
        crate::builder::AgentConfigBuilder::new()
    }

    /// Configuration for `origin` with the build tool's output and default store names
    pub fn new(origin: Origin, build: BuildManifest) -> Self {
        Self {
            origin,
            manifest: build.resources,
            core: build.core,
            cache_names: CacheNames::default(),
            gate_fetch_on_activation: true,
        }
    }
}
