//! # Network
//!
//! The fetch primitive the agent sits in front of, and its HTTP
//! implementation on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::debug;

use crate::cache::AssetResponse;
use crate::error::AgentError;
use crate::request::{AssetRequest, FetchMode};

const DEFAULT_USER_AGENT: &str = concat!("shell-cache/", env!("CARGO_PKG_VERSION"));

/// A network fetch. Resolves with any response the server sent, success or
/// not; fails only when no response was obtained.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(
        &self,
        request: &AssetRequest,
        mode: FetchMode,
    ) -> Result<AssetResponse, AgentError>;
}

/// Configurable options for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpNetworkConfig {
    /// Overall timeout for the entire HTTP request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,
}

impl Default for HttpNetworkConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: HeaderMap::new(),
        }
    }
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &HttpNetworkConfig) -> Result<Client, AgentError> {
    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder.build().map_err(AgentError::from)
}

/// [`Network`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: Client,
}

impl HttpNetwork {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn with_config(config: &HttpNetworkConfig) -> Result<Self, AgentError> {
        Ok(Self::new(create_client(config)?))
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(
        &self,
        request: &AssetRequest,
        mode: FetchMode,
    ) -> Result<AssetResponse, AgentError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.as_str());

        if mode == FetchMode::Reload {
            builder = builder
                .header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
                .header(header::PRAGMA, HeaderValue::from_static("no-cache"));
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        debug!(url = %url, status, bytes = body.len(), ?mode, "Fetched from network");

        Ok(AssetResponse {
            status,
            headers,
            url,
            body,
        })
    }
}
