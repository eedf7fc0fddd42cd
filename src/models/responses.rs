//! Response DTOs for the cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheEntry, CacheStats};
use crate::proxy::ProxyStats;

/// Response body for reading an entry (GET /__cache/entries/:id)
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    /// The requested asset id
    pub id: String,
    /// The cached entry
    pub entry: CacheEntry,
}

impl EntryResponse {
    pub fn new(id: impl Into<String>, entry: CacheEntry) -> Self {
        Self {
            id: id.into(),
            entry,
        }
    }
}

/// Response body for storing an entry (PUT /__cache/entries/:id)
#[derive(Debug, Clone, Serialize)]
pub struct PutEntryResponse {
    /// Success message
    pub message: String,
    /// The asset id that was cached
    pub id: String,
}

impl PutEntryResponse {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Asset '{}' cached successfully", id),
            id,
        }
    }
}

/// Response body for the presence probe (GET /__cache/cached/:id)
#[derive(Debug, Clone, Serialize)]
pub struct CachedResponse {
    pub id: String,
    pub cached: bool,
}

/// Response body for clearing the cache (DELETE /__cache/entries)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self {
            message: "Cache cleared".to_string(),
        }
    }
}

/// Response body for the stats endpoint (GET /__cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Coordinator counters
    pub cache: CacheStats,
    /// Proxy counters
    pub proxy: ProxyStats,
    /// Coordinator hit rate over both tiers
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, proxy: ProxyStats) -> Self {
        Self {
            hit_rate: cache.hit_rate(),
            cache,
            proxy,
        }
    }
}

/// Response body for the health endpoint (GET /__cache/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Active proxy cache generation
    pub generation: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(generation: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            generation: generation.into(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
