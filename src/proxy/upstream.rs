//! Upstream Module
//!
//! The authoritative asset origin the proxy falls back to.

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::proxy::{ProxyRequest, ProxyResponse};

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "host",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

// == Upstream Trait ==
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Performs the real network request. Only transport failures are
    /// errors; any HTTP status is a response.
    async fn send(&self, request: &ProxyRequest) -> Result<ProxyResponse>;
}

// == HTTP Upstream ==
/// Forwards requests to an origin base URL.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    origin: String,
}

impl HttpUpstream {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: &ProxyRequest) -> Result<ProxyResponse> {
        let url = format!("{}{}", self.origin, request.path);
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| CacheError::InvalidRequest(format!("bad method {}", request.method)))?;
        debug!(method = %method, url = %url, "Forwarding to origin");

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            if !is_hop_by_hop(name) {
                builder = builder.header(name, value);
            }
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CacheError::Upstream(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::Upstream(e.to_string()))?
            .to_vec();

        Ok(ProxyResponse::new(status, headers, body))
    }
}
