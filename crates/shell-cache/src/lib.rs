//! # Shell Cache
//!
//! A manifest-driven cache for the static files of a single-origin web
//! application. A build-time manifest maps every deployed asset path to a
//! content hash; the agent uses it to keep unchanged files across upgrades,
//! evict changed ones, and decide per request whether to answer from cache
//! or network.
//!
//! ## Features
//!
//! - Install, activate, fetch and message lifecycle handlers
//! - Hash-based reconciliation between application versions
//! - Cache-first serving with lazy population, online-first entry document
//! - In-memory and file-backed store providers
//! - Pluggable network and client-control capabilities

pub mod agent;
pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod manifest;
pub mod message;
pub mod network;
pub mod request;

pub use agent::{
    ActivationOutcome, AgentStatus, AssetAgent, DownloadReport, FetchDisposition, MessageOutcome,
};
pub use builder::AgentConfigBuilder;
pub use cache::{AssetResponse, CacheKey, CacheNames, CacheStorage, CacheStore, FileStorage, MemoryStorage};
pub use config::AgentConfig;
pub use error::AgentError;
pub use lifecycle::{ClientControl, HostClients};
pub use manifest::{BuildManifest, CoreShell, ManifestDiff, ResourceManifest};
pub use message::AgentMessage;
pub use network::{HttpNetwork, HttpNetworkConfig, Network, create_client};
pub use request::{AssetRequest, FetchMode, Origin};
