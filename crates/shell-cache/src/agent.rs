//! # Asset Agent
//!
//! The request-interception agent and its four lifecycle handlers:
//!
//! - [`AssetAgent::install`] fetches the core shell into the staging store.
//! - [`AssetAgent::activate`] reconciles staging into the main store against
//!   the recorded manifest, keeping entries whose hash did not change.
//! - [`AssetAgent::handle_fetch`] serves manifest assets cache-first and the
//!   entry document online-first.
//! - [`AssetAgent::handle_message`] handles the force-activate and
//!   download-offline commands.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use reqwest::Method;
use tokio::sync::{RwLock, RwLockReadGuard};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::{AssetResponse, CacheStorage, CacheStores};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::lifecycle::ClientControl;
use crate::manifest::{ManifestDiff, ROOT_KEY};
use crate::message::AgentMessage;
use crate::network::Network;
use crate::request::{AssetRequest, FetchMode, normalize_url};

/// What the fetch handler decided for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDisposition {
    /// Not intercepted; the host performs its default network handling
    Passthrough,
    /// Answered by the agent
    Respond(AssetResponse),
}

/// Which reconciliation path an activation took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// No manifest was recorded; main was rebuilt from staging
    Fresh { copied: usize },
    /// A manifest was recorded; unchanged entries were kept
    Upgraded {
        retained: usize,
        evicted: usize,
        copied: usize,
    },
    /// Reconciliation failed and every store was deleted
    Reset,
}

/// Result of a message
#[derive(Debug)]
pub enum MessageOutcome {
    /// Unknown message
    Ignored,
    /// The waiting phase was skipped
    SkippedWaiting,
    /// A download pass is running in the background
    DownloadStarted(JoinHandle<Result<DownloadReport, AgentError>>),
}

/// Counts from a download-offline pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Assets fetched and stored
    pub fetched: usize,
    /// Assets whose fetch failed or returned an error status
    pub failed: usize,
    /// Assets already cached
    pub skipped: usize,
}

/// Snapshot of the stores for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStatus {
    /// Store name and entry count, `None` when the store does not exist
    pub stores: Vec<(String, Option<usize>)>,
    /// Difference between this build's manifest and the recorded one
    pub recorded: Option<ManifestDiff>,
}

pub struct AssetAgent {
    config: Arc<AgentConfig>,
    stores: CacheStores,
    network: Arc<dyn Network>,
    clients: Arc<dyn ClientControl>,
    /// Held for writing by a running activation, for reading by fetches
    activation: RwLock<()>,
}

impl AssetAgent {
    pub fn new(
        config: AgentConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        clients: Arc<dyn ClientControl>,
    ) -> Self {
        let stores = CacheStores::new(storage, config.cache_names.clone());
        Self {
            config: Arc::new(config),
            stores,
            network,
            clients,
            activation: RwLock::new(()),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn stores(&self) -> &CacheStores {
        &self.stores
    }

    async fn read_gate(&self) -> Option<RwLockReadGuard<'_, ()>> {
        if self.config.gate_fetch_on_activation {
            Some(self.activation.read().await)
        } else {
            None
        }
    }

    /// Fetch every core shell file into the staging store.
    ///
    /// All files are fetched bypassing HTTP caches. If any fetch fails or
    /// answers with an error status nothing is stored and the error is
    /// returned, so the host can retry the install later.
    pub async fn install(&self) -> Result<usize, AgentError> {
        self.clients.skip_waiting();

        let staging = self.stores.open_staging().await?;
        let requests: Vec<AssetRequest> = self
            .config
            .core
            .iter()
            .map(|path| AssetRequest::get(self.config.origin.resolve(path)))
            .collect();

        let responses = try_join_all(requests.iter().map(|request| async move {
            let response = self.network.fetch(request, FetchMode::Reload).await?;
            if !response.is_success() {
                return Err(AgentError::StatusCode {
                    url: request.url.clone(),
                    status: response.status,
                });
            }
            Ok::<_, AgentError>((request.cache_key(), response))
        }))
        .await?;

        let count = responses.len();
        for (key, response) in responses {
            staging.put(key, response).await?;
        }

        info!(files = count, "Installed core shell into staging");
        Ok(count)
    }

    /// Move staged files into the main store.
    ///
    /// Never fails: when reconciliation hits an error the cache state cannot
    /// be trusted, so all three stores are deleted and the next requests
    /// start from a cold cache.
    pub async fn activate(&self) -> ActivationOutcome {
        let _guard = if self.config.gate_fetch_on_activation {
            Some(self.activation.write().await)
        } else {
            None
        };

        match self.reconcile().await {
            Ok(outcome) => {
                info!(?outcome, "Activated");
                outcome
            }
            Err(e) => {
                error!(error = %e, "Failed to upgrade agent, deleting all stores");
                self.stores.delete_all().await;
                ActivationOutcome::Reset
            }
        }
    }

    async fn reconcile(&self) -> Result<ActivationOutcome, AgentError> {
        let main = self.stores.open_main().await?;
        let staging = self.stores.open_staging().await?;
        let record = self.stores.open_record().await?;

        let Some(previous) = self.stores.read_manifest(record.as_ref()).await? else {
            // Nothing to diff against; start the main store from scratch.
            let main = self.stores.recreate_main().await?;
            let copied = self.stores.copy_all(staging.as_ref(), main.as_ref()).await?;
            self.stores.delete_staging().await?;
            self.stores
                .write_manifest(record.as_ref(), &self.config.manifest)
                .await?;
            self.clients.claim_clients();
            return Ok(ActivationOutcome::Fresh { copied });
        };

        let mut retained = 0;
        let mut evicted = 0;
        for key in main.keys().await? {
            let keep = self
                .config
                .origin
                .relative_key(&normalize_url(key.as_str()))
                .is_some_and(|logical| self.config.manifest.retains(&previous, &logical));

            if keep {
                retained += 1;
            } else {
                debug!(key = %key, "Evicting stale entry");
                main.delete(&key).await?;
                evicted += 1;
            }
        }

        // Staged files win over anything kept above.
        let copied = self.stores.copy_all(staging.as_ref(), main.as_ref()).await?;
        self.stores.delete_staging().await?;
        self.stores
            .write_manifest(record.as_ref(), &self.config.manifest)
            .await?;
        self.clients.claim_clients();

        Ok(ActivationOutcome::Upgraded {
            retained,
            evicted,
            copied,
        })
    }

    /// Decide how to answer an outgoing request.
    ///
    /// Only GET requests for manifest assets on the agent's origin are
    /// intercepted. The entry document goes online-first, everything else is
    /// served from the main store and lazily populated from the network.
    pub async fn handle_fetch(
        &self,
        request: &AssetRequest,
    ) -> Result<FetchDisposition, AgentError> {
        if request.method != Method::GET {
            return Ok(FetchDisposition::Passthrough);
        }

        let Some(key) = self.config.origin.fetch_key(&request.url) else {
            return Ok(FetchDisposition::Passthrough);
        };
        if !self.config.manifest.contains(&key) {
            debug!(url = %request.url, key = %key, "Not a manifest asset, passing through");
            return Ok(FetchDisposition::Passthrough);
        }

        let response = if key == ROOT_KEY {
            self.online_first(request).await?
        } else {
            self.cache_first(request).await?
        };
        Ok(FetchDisposition::Respond(response))
    }

    async fn cache_first(&self, request: &AssetRequest) -> Result<AssetResponse, AgentError> {
        let _guard = self.read_gate().await;
        let main = self.stores.open_main().await?;
        let cache_key = request.cache_key();

        if let Some(cached) = main.get(&cache_key).await? {
            debug!(url = %request.url, "Served from cache");
            return Ok(cached);
        }

        let response = self.network.fetch(request, FetchMode::Default).await?;
        if response.is_success() {
            if let Err(e) = main.put(cache_key, response.clone()).await {
                warn!(url = %request.url, error = %e, "Failed to cache fetched asset");
            }
        } else {
            debug!(url = %request.url, status = response.status, "Not caching error response");
        }
        Ok(response)
    }

    /// Fetch from the network, falling back to the main store only when the
    /// network fails. Any response the server sent, error statuses included,
    /// replaces the cached copy.
    pub async fn online_first(&self, request: &AssetRequest) -> Result<AssetResponse, AgentError> {
        let _guard = self.read_gate().await;

        match self.network.fetch(request, FetchMode::Default).await {
            Ok(response) => {
                let stored = match self.stores.open_main().await {
                    Ok(main) => main.put(request.cache_key(), response.clone()).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = stored {
                    warn!(url = %request.url, error = %e, "Failed to cache entry document");
                }
                Ok(response)
            }
            Err(fetch_error) => {
                warn!(url = %request.url, error = %fetch_error, "Network failed, trying cache");
                let cached = match self.stores.open_main().await {
                    Ok(main) => main.get(&request.cache_key()).await,
                    Err(e) => Err(e),
                };
                match cached {
                    Ok(Some(response)) => Ok(response),
                    Ok(None) => Err(fetch_error),
                    Err(e) => {
                        warn!(url = %request.url, error = %e, "Cache lookup failed");
                        Err(fetch_error)
                    }
                }
            }
        }
    }

    /// Handle a message posted by a page.
    ///
    /// A download-offline pass is spawned on the current tokio runtime and its
    /// handle returned; nothing else waits for it. Outside a runtime the pass
    /// cannot start and [`AgentError::NoRuntime`] is returned.
    pub fn handle_message(self: &Arc<Self>, message: &str) -> Result<MessageOutcome, AgentError> {
        match AgentMessage::parse(message) {
            Some(AgentMessage::ForceActivate) => {
                self.clients.skip_waiting();
                Ok(MessageOutcome::SkippedWaiting)
            }
            Some(AgentMessage::DownloadOffline) => {
                let runtime = Handle::try_current().map_err(|_| AgentError::NoRuntime)?;
                let agent = Arc::clone(self);
                let handle = runtime.spawn(async move {
                    let report = agent.download_offline().await;
                    if let Err(e) = &report {
                        warn!(error = %e, "Offline download failed");
                    }
                    report
                });
                Ok(MessageOutcome::DownloadStarted(handle))
            }
            None => {
                debug!(raw = message, "Ignoring unknown message");
                Ok(MessageOutcome::Ignored)
            }
        }
    }

    /// Fetch every manifest asset that is not in the main store yet.
    ///
    /// Failed fetches are logged and counted; the rest are still stored.
    pub async fn download_offline(&self) -> Result<DownloadReport, AgentError> {
        let _guard = self.read_gate().await;
        let main = self.stores.open_main().await?;
        let origin = &self.config.origin;

        let cached: HashSet<String> = main
            .keys()
            .await?
            .iter()
            .filter_map(|key| origin.relative_key(&normalize_url(key.as_str())))
            .collect();

        let missing: Vec<AssetRequest> = self
            .config
            .manifest
            .keys()
            .filter(|key| !cached.contains(*key))
            .map(|key| AssetRequest::get(origin.resolve(key)))
            .collect();

        let mut report = DownloadReport {
            skipped: self.config.manifest.len() - missing.len(),
            ..DownloadReport::default()
        };

        let results = join_all(missing.iter().map(|request| async move {
            (request, self.network.fetch(request, FetchMode::Default).await)
        }))
        .await;

        for (request, result) in results {
            match result {
                Ok(response) if response.is_success() => {
                    main.put(request.cache_key(), response).await?;
                    report.fetched += 1;
                }
                Ok(response) => {
                    warn!(url = %request.url, status = response.status, "Offline download got error status");
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(url = %request.url, error = %e, "Offline download failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            fetched = report.fetched,
            failed = report.failed,
            skipped = report.skipped,
            "Offline download finished"
        );
        Ok(report)
    }

    /// Entry counts of the three stores and the diff against the recorded manifest
    pub async fn status(&self) -> Result<AgentStatus, AgentError> {
        let storage = self.stores.storage();
        let names = self.stores.names();

        let mut stores = Vec::new();
        for name in [&names.main, &names.staging, &names.manifest] {
            let count = if storage.has(name).await? {
                Some(storage.open(name).await?.keys().await?.len())
            } else {
                None
            };
            stores.push((name.clone(), count));
        }

        let recorded = if storage.has(&names.manifest).await? {
            let record = self.stores.open_record().await?;
            self.stores
                .read_manifest(record.as_ref())
                .await?
                .map(|previous| self.config.manifest.diff(&previous))
        } else {
            None
        };

        Ok(AgentStatus { stores, recorded })
    }
}
