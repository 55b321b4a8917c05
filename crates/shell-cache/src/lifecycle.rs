//! Host primitives that move the agent through its lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

/// Control over the pages the agent serves
pub trait ClientControl: Send + Sync {
    /// Activate a waiting agent without waiting for old clients to close
    fn skip_waiting(&self);

    /// Take control of every open client immediately
    fn claim_clients(&self);
}

/// [`ClientControl`] for hosts without real clients: logs each request and
/// counts it.
#[derive(Debug, Default)]
pub struct HostClients {
    skip_waiting: AtomicUsize,
    claims: AtomicUsize,
}

impl HostClients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_waiting_count(&self) -> usize {
        self.skip_waiting.load(Ordering::Relaxed)
    }

    pub fn claim_count(&self) -> usize {
        self.claims.load(Ordering::Relaxed)
    }
}

impl ClientControl for HostClients {
    fn skip_waiting(&self) {
        self.skip_waiting.fetch_add(1, Ordering::Relaxed);
        info!("Skipping the waiting phase");
    }

    fn claim_clients(&self) {
        self.claims.fetch_add(1, Ordering::Relaxed);
        info!("Claimed open clients");
    }
}
