//! # Requests and logical keys
//!
//! Requests are identified by their absolute URL. The manifest, however, is
//! keyed by paths relative to the origin, so every handler first maps a
//! request URL to its logical key.

use std::fmt;

use reqwest::Method;
use url::Url;

use crate::cache::CacheKey;
use crate::error::AgentError;
use crate::manifest::ROOT_KEY;

/// Marker of a cache-busting version query (`main.dart.js?v=123`)
const VERSION_QUERY: &str = "?v=";

/// Serialized origin (`scheme://host[:port]`) the agent is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin(String);

impl Origin {
    /// Parse any URL and keep only its origin
    pub fn parse(input: &str) -> Result<Self, AgentError> {
        let url = Url::parse(input)?;
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(AgentError::UrlError(format!(
                "{input} does not have a tuple origin"
            )));
        }
        Ok(Self(origin.ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part of `url` after the origin, or `None` for other origins.
    ///
    /// The remainder is either empty or starts with `/`, `?` or `#`.
    fn remainder<'a>(&self, url: &'a str) -> Option<&'a str> {
        let rest = url.strip_prefix(self.0.as_str())?;
        match rest.chars().next() {
            None | Some('/') | Some('?') | Some('#') => Some(rest),
            _ => None,
        }
    }

    /// Key of a stored request: the path relative to the origin, `/` for the
    /// origin itself. The query string is kept.
    pub fn relative_key(&self, url: &str) -> Option<String> {
        let rest = self.remainder(url)?;
        let key = rest.get(1..).unwrap_or_default();
        if key.is_empty() {
            Some(ROOT_KEY.to_string())
        } else {
            Some(key.to_string())
        }
    }

    /// Key of an intercepted request. Version queries are dropped, and the
    /// origin, any `/#...` fragment route and an empty path all map to `/`.
    pub fn fetch_key(&self, url: &str) -> Option<String> {
        let rest = self.remainder(url)?;
        let mut key = rest.get(1..).unwrap_or_default();
        if let Some(idx) = key.find(VERSION_QUERY) {
            key = &key[..idx];
        }

        if rest.is_empty() || rest.starts_with("/#") || key.is_empty() {
            return Some(ROOT_KEY.to_string());
        }
        Some(key.to_string())
    }

    /// Absolute URL of a manifest key
    pub fn resolve(&self, key: &str) -> String {
        if key == ROOT_KEY {
            format!("{}/", self.0)
        } else {
            format!("{}/{}", self.0, key.trim_start_matches('/'))
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An outgoing request seen by the fetch handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub method: Method,
    pub url: String,
}

impl AssetRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Identity the request is stored under: the parsed URL without its
    /// fragment, so `origin`, `origin/` and `origin/#/route` share one entry.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(normalize_url(&self.url))
    }
}

/// Serialize `url` the way a parser sees it, fragment dropped. Unparseable
/// input is kept as is.
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.to_string(),
    }
}

/// How the network primitive treats intermediate HTTP caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Normal fetch, conditional requests allowed
    #[default]
    Default,
    /// Force a full network fetch, bypassing HTTP caches
    Reload,
}
