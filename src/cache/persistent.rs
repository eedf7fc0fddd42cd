//! Persistent Tier Module
//!
//! Serializes entries into a [`StorageBackend`] under a namespace, compacting
//! on quota pressure and degrading silently when a write still cannot land.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, StorageBackend};
use crate::error::CacheError;

// == Write Outcome ==
/// What happened to a persistent write. Never an error: a dropped write
/// only means the entry lives in memory alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Stored on the first attempt
    Stored,
    /// Stored on the retry after a compaction pass
    StoredAfterCompaction,
    /// Not stored
    Dropped,
}

// == Persistent Cache ==
/// Durable entry store; capacity is bounded only by the backend's quota.
#[derive(Debug, Clone)]
pub struct PersistentCache {
    backend: Arc<dyn StorageBackend>,
    namespace: String,
}

impl PersistentCache {
    // == Constructor ==
    pub fn new(backend: Arc<dyn StorageBackend>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn namespaced_keys(&self) -> Vec<String> {
        let prefix = format!("{}:", self.namespace);
        match self.backend.enumerate() {
            Ok(keys) => keys.into_iter().filter(|k| k.starts_with(&prefix)).collect(),
            Err(err) => {
                warn!(namespace = %self.namespace, error = %err, "Failed to enumerate storage");
                Vec::new()
            }
        }
    }

    fn discard(&self, storage_key: &str) {
        if let Err(err) = self.backend.remove(storage_key) {
            warn!(key = storage_key, error = %err, "Failed to remove stored entry");
        }
    }

    /// Loads and decodes a stored entry. Unreadable or undecodable values
    /// are reported as `Err` so callers can delete them.
    fn load(&self, storage_key: &str) -> Result<Option<CacheEntry>, CacheError> {
        match self.backend.read(storage_key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    // == Write ==
    /// Stores an entry, compacting and retrying once if the backend is full.
    pub fn write(&self, key: &str, entry: &CacheEntry) -> WriteOutcome {
        let storage_key = self.storage_key(key);
        let bytes = match serde_json::to_vec(entry) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(key, error = %err, "Failed to serialize entry");
                return WriteOutcome::Dropped;
            }
        };

        match self.backend.write(&storage_key, &bytes) {
            Ok(()) => WriteOutcome::Stored,
            Err(CacheError::QuotaExceeded(reason)) => {
                info!(key, %reason, "Persistent store full, compacting");
                self.compact();
                match self.backend.write(&storage_key, &bytes) {
                    Ok(()) => WriteOutcome::StoredAfterCompaction,
                    Err(err) => {
                        warn!(key, error = %err, "Persistent write failed after compaction");
                        WriteOutcome::Dropped
                    }
                }
            }
            Err(err) => {
                warn!(key, error = %err, "Persistent write failed");
                WriteOutcome::Dropped
            }
        }
    }

    // == Compact ==
    /// Removes the oldest half of namespaced entries by `created_at`.
    ///
    /// Undecodable entries are removed first and do not count towards the
    /// half. Entries that fail to read are left in place. Returns the number of keys removed.
    pub fn compact(&self) -> usize {
        let mut live = Vec::new();
        let mut removed = 0;

        for storage_key in self.namespaced_keys() {
            match self.load(&storage_key) {
                Ok(Some(entry)) => live.push((entry.created_at, storage_key)),
                Ok(None) => {}
                Err(CacheError::Corrupt(_)) => {
                    self.discard(&storage_key);
                    removed += 1;
                }
                Err(err) => {
                    warn!(key = %storage_key, error = %err, "Skipping unreadable entry during compaction");
                }
            }
        }

        live.sort();
        let victims = live.len().div_ceil(2);
        for (_, storage_key) in live.into_iter().take(victims) {
            self.discard(&storage_key);
            removed += 1;
        }

        debug!(namespace = %self.namespace, removed, "Compaction finished");
        removed
    }

    // == Read ==
    /// Returns a live entry. Corrupt or expired values are deleted and
    /// reported as a miss.
    pub fn read(&self, key: &str, now_ms: u64) -> Option<CacheEntry> {
        let storage_key = self.storage_key(key);
        match self.load(&storage_key) {
            Ok(Some(entry)) if entry.is_expired_at(now_ms) => {
                debug!(key, "Persistent entry expired");
                self.discard(&storage_key);
                None
            }
            Ok(entry) => entry,
            Err(err @ CacheError::Corrupt(_)) => {
                warn!(key, error = %err, "Dropping corrupt persistent entry");
                self.discard(&storage_key);
                None
            }
            Err(err) => {
                warn!(key, error = %err, "Persistent read failed");
                None
            }
        }
    }

    // == Peek ==
    /// True if a live, decodable entry is stored. Never mutates.
    pub fn peek(&self, key: &str, now_ms: u64) -> bool {
        matches!(
            self.load(&self.storage_key(key)),
            Ok(Some(entry)) if !entry.is_expired_at(now_ms)
        )
    }

    // == Sweep Expired ==
    /// Deletes every expired or undecodable namespaced entry in one pass.
    pub fn sweep_expired(&self, now_ms: u64) -> usize {
        let mut removed = 0;
        for storage_key in self.namespaced_keys() {
            let stale = match self.load(&storage_key) {
                Ok(Some(entry)) => entry.is_expired_at(now_ms),
                Ok(None) => false,
                Err(CacheError::Corrupt(_)) => true,
                Err(err) => {
                    warn!(key = %storage_key, error = %err, "Skipping unreadable entry during sweep");
                    false
                }
            };
            if stale {
                self.discard(&storage_key);
                removed += 1;
            }
        }
        removed
    }

    // == Clear ==
    /// Deletes every key in this namespace and nothing else.
    pub fn clear(&self) -> usize {
        let keys = self.namespaced_keys();
        for storage_key in &keys {
            self.discard(storage_key);
        }
        keys.len()
    }

    /// Number of stored keys in this namespace, live or not.
    pub fn len(&self) -> usize {
        self.namespaced_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
