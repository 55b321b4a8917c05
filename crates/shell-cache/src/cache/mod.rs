//! # Cache System
//!
//! Named request/response stores and the three-store set the agent works
//! with: staging, main and the manifest record.

// Module declarations
mod manager;
pub mod providers;
mod types;

// Re-export primary types from our various modules
pub use manager::{CacheNames, CacheStores, MANIFEST_RECORD_KEY};
pub use types::{AssetResponse, CacheKey, CacheLookupResult, CacheResult};

pub use providers::{CacheStorage, CacheStore, FileStorage, MemoryStorage};
