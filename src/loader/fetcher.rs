//! Asset Fetcher Module
//!
//! Network side of lazy loading: pulls an asset from the origin (or the
//! caching proxy in front of it).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

/// Metadata about a successfully fetched asset; stored as the cache payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedAsset {
    pub source: String,
    pub content_type: String,
    pub size: usize,
}

impl FetchedAsset {
    pub fn to_payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// == Asset Fetcher Trait ==
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetches `source`. Transport failures and non-success statuses are
    /// both [`CacheError::Fetch`].
    async fn fetch(&self, source: &str) -> Result<FetchedAsset>;
}

// == HTTP Fetcher ==
/// Fetches sources relative to a base URL over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: Client,
    base_url: String,
}

impl HttpAssetFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, source: &str) -> String {
        if source.starts_with("http://") || source.starts_with("https://") {
            source.to_string()
        } else {
            format!("{}/{}", self.base_url, source.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, source: &str) -> Result<FetchedAsset> {
        let url = self.url_for(source);
        debug!(url = %url, "Fetching asset");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CacheError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), url = %url, "Asset fetch returned error status");
            return Err(CacheError::Fetch(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::Fetch(e.to_string()))?;

        Ok(FetchedAsset {
            source: source.to_string(),
            content_type,
            size: body.len(),
        })
    }
}
