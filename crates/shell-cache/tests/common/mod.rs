#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use shell_cache::cache::CacheResult;
use shell_cache::{
    AgentConfig, AgentError, AssetAgent, AssetRequest, AssetResponse, CacheStorage, CacheStore,
    FetchMode, HostClients, MemoryStorage, Network, ResourceManifest,
};

pub const ORIGIN: &str = "https://app.test";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Absolute URL of a manifest key
pub fn url(key: &str) -> String {
    if key == "/" {
        format!("{ORIGIN}/")
    } else {
        format!("{ORIGIN}/{key}")
    }
}

pub fn manifest(entries: &[(&str, &str)]) -> ResourceManifest {
    entries.iter().copied().collect()
}

pub fn config(entries: &[(&str, &str)], core: &[&str]) -> AgentConfig {
    AgentConfig::builder()
        .with_origin(ORIGIN)
        .with_manifest(manifest(entries))
        .with_core(core.iter().copied())
        .build()
        .unwrap()
}

pub fn ok(key: &str, body: &str) -> AssetResponse {
    AssetResponse::new(200, url(key), body.to_string())
}

#[derive(Clone)]
enum Reply {
    Respond(AssetResponse),
    Fail,
}

/// Network double answering from a script; unknown URLs get a 404
#[derive(Default)]
pub struct FakeNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<(String, FetchMode)>>,
    offline: AtomicBool,
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serve `body` with status 200 for a manifest key
    pub fn serve(&self, key: &str, body: &str) {
        self.serve_url(&url(key), ok(key, body));
    }

    pub fn serve_status(&self, key: &str, status: u16) {
        self.serve_url(&url(key), AssetResponse::new(status, url(key), "error"));
    }

    pub fn serve_url(&self, url: &str, response: AssetResponse) {
        self.replies
            .lock()
            .insert(url.to_string(), Reply::Respond(response));
    }

    /// Fail the fetch of a manifest key with a network error
    pub fn fail(&self, key: &str) {
        self.replies.lock().insert(url(key), Reply::Fail);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(String, FetchMode)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|(u, _)| u == url).count()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(
        &self,
        request: &AssetRequest,
        mode: FetchMode,
    ) -> Result<AssetResponse, AgentError> {
        self.calls.lock().push((request.url.clone(), mode));

        if self.offline.load(Ordering::SeqCst) {
            return Err(AgentError::Network(format!("offline: {}", request.url)));
        }

        let reply = self.replies.lock().get(&request.url).cloned();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail) => Err(AgentError::Network(format!(
                "connection reset: {}",
                request.url
            ))),
            None => Ok(AssetResponse::new(404, request.url.clone(), "not found")),
        }
    }
}

/// Memory storage whose `open` can be made to fail for chosen store names
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: MemoryStorage,
    failing: Mutex<HashSet<String>>,
}

impl FlakyStorage {
    pub fn new(inner: MemoryStorage) -> Arc<Self> {
        Arc::new(Self {
            inner,
            failing: Mutex::new(HashSet::new()),
        })
    }

    pub fn fail_open(&self, name: &str) {
        self.failing.lock().insert(name.to_string());
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn CacheStore>> {
        if self.failing.lock().contains(name) {
            return Err(std::io::Error::other(format!("cannot open {name}")));
        }
        self.inner.open(name).await
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        self.inner.delete(name).await
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        self.inner.has(name).await
    }

    async fn names(&self) -> CacheResult<Vec<String>> {
        self.inner.names().await
    }
}

pub struct Harness {
    pub agent: Arc<AssetAgent>,
    pub storage: MemoryStorage,
    pub network: Arc<FakeNetwork>,
    pub clients: Arc<HostClients>,
}

impl Harness {
    pub fn new(config: AgentConfig) -> Self {
        Self::with_storage(config, MemoryStorage::new())
    }

    /// Agent over an existing storage, as a new version would see it
    pub fn with_storage(config: AgentConfig, storage: MemoryStorage) -> Self {
        init_tracing();
        let network = FakeNetwork::new();
        let clients = Arc::new(HostClients::new());
        let agent = Arc::new(AssetAgent::new(
            config,
            Arc::new(storage.clone()),
            network.clone(),
            clients.clone(),
        ));
        Self {
            agent,
            storage,
            network,
            clients,
        }
    }

    pub async fn main_store(&self) -> Arc<dyn CacheStore> {
        self.agent.stores().open_main().await.unwrap()
    }

    pub async fn cached_body(&self, key: &str) -> Option<String> {
        self.main_store()
            .await
            .get(&url(key).as_str().into())
            .await
            .unwrap()
            .map(|r| String::from_utf8(r.body.to_vec()).unwrap())
    }
}
