//! Network Cache Proxy Module
//!
//! Cache-aside tier at the request layer: serves fresh stored responses for
//! asset GETs, otherwise goes to the upstream and stores a stamped copy in
//! the background.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::StorageBackend;
use crate::clock::SharedClock;
use crate::error::{CacheError, Result};
use crate::proxy::{ProxyRequest, ProxyResponse, ResponseHead, Upstream, PROXY_TTL_MS};

/// How a proxied request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the store
    Hit,
    /// Fetched from upstream
    Miss,
    /// Outside the intercepted prefix; forwarded untouched
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

/// Counter snapshot for the proxy.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProxyStats {
    pub hits: u64,
    pub misses: u64,
    pub bypassed: u64,
    pub store_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    bypassed: AtomicU64,
    store_failures: Arc<AtomicU64>,
}

/// Key of the raw body stored next to a response head.
fn body_key(key: &str) -> String {
    format!("{}#body", key)
}

// == Network Cache Proxy ==
pub struct NetworkCacheProxy {
    upstream: Arc<dyn Upstream>,
    store: Arc<dyn StorageBackend>,
    generation: String,
    prefix: String,
    clock: SharedClock,
    counters: Counters,
}

impl NetworkCacheProxy {
    // == Constructor ==
    /// Creates a proxy intercepting `GET <prefix>/...`, storing responses
    /// under the cache generation `generation`.
    pub fn new(
        upstream: Arc<dyn Upstream>,
        store: Arc<dyn StorageBackend>,
        generation: impl Into<String>,
        prefix: impl Into<String>,
        clock: SharedClock,
    ) -> Self {
        Self {
            upstream,
            store,
            generation: generation.into(),
            prefix: prefix.into().trim_end_matches('/').to_string(),
            clock,
            counters: Counters::default(),
        }
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn storage_key(&self, request: &ProxyRequest) -> String {
        format!("{}:{}", self.generation, request.identity())
    }

    // == Activate ==
    /// Purges every stored generation other than the current one.
    ///
    /// Call once when a new proxy build is installed. Returns the number of
    /// stored keys (heads and bodies) removed.
    pub fn activate(&self) -> usize {
        let own = format!("{}:", self.generation);
        let keys = match self.store.enumerate() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, "Failed to enumerate proxy store on activation");
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys.iter().filter(|k| !k.starts_with(&own)) {
            match self.store.remove(key) {
                Ok(()) => removed += 1,
                Err(err) => warn!(key = %key, error = %err, "Failed to purge stale response"),
            }
        }
        info!(generation = %self.generation, removed, "Proxy generation activated");
        removed
    }

    // == Intercepts ==
    /// True for `GET` requests under the asset prefix.
    pub fn intercepts(&self, request: &ProxyRequest) -> bool {
        request.method.eq_ignore_ascii_case("GET")
            && request
                .path_only()
                .strip_prefix(&self.prefix)
                .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
    }

    fn lookup(&self, key: &str) -> Option<ProxyResponse> {
        let head = match self.store.read(key) {
            Ok(found) => found?,
            Err(err) => {
                warn!(key, error = %err, "Proxy store read failed");
                return None;
            }
        };
        let head: ResponseHead = match serde_json::from_slice(&head) {
            Ok(head) => head,
            Err(err) => {
                debug!(key, error = %err, "Discarding unreadable stored response");
                self.discard(key);
                return None;
            }
        };
        match self.store.read(&body_key(key)) {
            Ok(Some(body)) => Some(ProxyResponse::from_parts(head, body)),
            Ok(None) => {
                debug!(key, "Stored response has no body");
                self.discard(key);
                None
            }
            Err(err) => {
                warn!(key, error = %err, "Proxy store read failed");
                None
            }
        }
    }

    fn discard(&self, key: &str) {
        for stored in [key.to_string(), body_key(key)] {
            if let Err(err) = self.store.remove(&stored) {
                warn!(key = %stored, error = %err, "Failed to remove stored response");
            }
        }
    }

    fn is_fresh(&self, response: &ProxyResponse) -> bool {
        response
            .cached_at()
            .is_some_and(|at| self.clock.now_ms().saturating_sub(at) < PROXY_TTL_MS)
    }

    // == Handle ==
    /// Answers one request.
    ///
    /// Errors only when the upstream cannot be reached on a miss or bypass.
    /// Storing never delays or fails the response.
    pub async fn handle(&self, request: ProxyRequest) -> Result<(ProxyResponse, CacheStatus)> {
        if !self.intercepts(&request) {
            self.counters.bypassed.fetch_add(1, Ordering::Relaxed);
            let response = self.upstream.send(&request).await?;
            return Ok((response, CacheStatus::Bypass));
        }

        let key = self.storage_key(&request);
        if let Some(stored) = self.lookup(&key) {
            if self.is_fresh(&stored) {
                debug!(path = %request.path, "Serving stored response");
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok((stored, CacheStatus::Hit));
            }
            debug!(path = %request.path, "Stored response is stale");
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let response = self.upstream.send(&request).await?;

        if response.is_success() {
            let stamped = response.stamped(self.clock.now_ms());
            let store = Arc::clone(&self.store);
            let failures = Arc::clone(&self.counters.store_failures);
            tokio::spawn(async move {
                // Body first: a head without its body reads as a miss
                let result = store
                    .write(&body_key(&key), &stamped.body)
                    .and_then(|()| serde_json::to_vec(&stamped.head()).map_err(CacheError::from))
                    .and_then(|head| store.write(&key, &head));
                if let Err(err) = result {
                    failures.fetch_add(1, Ordering::Relaxed);
                    warn!(key = %key, error = %err, "Failed to store proxied response");
                }
            });
        }

        Ok((response, CacheStatus::Miss))
    }

    pub fn stats(&self) -> ProxyStats {
        ProxyStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            bypassed: self.counters.bypassed.load(Ordering::Relaxed),
            store_failures: self.counters.store_failures.load(Ordering::Relaxed),
        }
    }
}
