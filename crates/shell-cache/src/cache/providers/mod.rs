//! # Cache Providers
//!
//! This module contains different cache provider implementations.

// Re-export providers for easier access
pub use self::file::{FileStorage, FileStore};
pub use self::memory::{MemoryStorage, MemoryStore};
pub use self::provider::{CacheStorage, CacheStore};

// Provider interface
pub mod provider;

// Individual provider implementations
pub mod file;
pub mod memory;
