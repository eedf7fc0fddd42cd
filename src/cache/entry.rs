//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A single cached asset record with creation and expiry timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Versioned entry key, see [`entry_key`]
    pub key: String,
    /// Arbitrary asset metadata
    pub payload: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl_ms` after `now_ms`.
    pub fn new(key: impl Into<String>, payload: Value, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            key: key.into(),
            payload,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// The entry is still live at exactly `expires_at`; it expires once the
    /// clock has moved past it.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds at `now_ms` (0 once expired).
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}

// == Key Derivation ==
/// Builds the entry key for an asset id under a cache-format version.
///
/// Bumping the version moves every entry into a fresh key space so stale
/// layouts never collide with new ones.
pub fn entry_key(version: &str, asset_id: &str) -> String {
    format!("asset-{}:{}", version, asset_id)
}
