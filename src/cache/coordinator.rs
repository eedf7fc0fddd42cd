//! Cache Coordinator Module
//!
//! Read-through / write-through orchestration over the memory and
//! persistent tiers. Owns the TTL; the tiers own the entries.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::{
    entry_key, CacheEntry, CacheStats, MemoryCache, PersistentCache, StorageBackend, WriteOutcome,
    ASSET_TTL,
};
use crate::clock::{SharedClock, SystemClock};
use crate::config::Config;

#[derive(Debug)]
struct MemoryTier {
    cache: MemoryCache,
    stats: CacheStats,
}

// == Cache Coordinator ==
/// Two-tier asset cache shared by the loader and any UI caller.
///
/// Construct one per application (or per test) and hand it out as
/// `Arc<CacheCoordinator>`.
#[derive(Debug)]
pub struct CacheCoordinator {
    memory: Mutex<MemoryTier>,
    persistent: PersistentCache,
    ttl: Duration,
    version: String,
    clock: SharedClock,
}

impl CacheCoordinator {
    // == Constructor ==
    /// Creates a coordinator over an explicit persistent tier and clock.
    pub fn new(
        memory_capacity: usize,
        ttl: Duration,
        version: impl Into<String>,
        persistent: PersistentCache,
        clock: SharedClock,
    ) -> Self {
        Self {
            memory: Mutex::new(MemoryTier {
                cache: MemoryCache::new(memory_capacity),
                stats: CacheStats::new(),
            }),
            persistent,
            ttl,
            version: version.into(),
            clock,
        }
    }

    /// Creates a coordinator from configuration over the given backend,
    /// reading the system clock. The TTL is always [`ASSET_TTL`].
    pub fn from_config(config: &Config, backend: Arc<dyn StorageBackend>) -> Self {
        Self::new(
            config.memory_capacity,
            ASSET_TTL,
            config.cache_version.clone(),
            PersistentCache::new(backend, config.namespace.clone()),
            Arc::new(SystemClock),
        )
    }

    /// Coordinator with the default TTL over an in-process backend.
    pub fn in_memory(memory_capacity: usize, clock: SharedClock) -> Self {
        Self::new(
            memory_capacity,
            ASSET_TTL,
            "v1",
            PersistentCache::new(Arc::new(crate::cache::MemoryStorage::new()), "gallery-cache"),
            clock,
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key_for(&self, asset_id: &str) -> String {
        entry_key(&self.version, asset_id)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryTier> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Is Cached ==
    /// True iff a live entry exists in either tier. Does not mutate state.
    pub fn is_cached(&self, asset_id: &str) -> bool {
        let key = self.key_for(asset_id);
        let now = self.clock.now_ms();
        if self.lock().cache.contains_live(&key, now) {
            return true;
        }
        self.persistent.peek(&key, now)
    }

    // == Get ==
    /// Read-through lookup: memory first, then persistent with promotion.
    pub fn get(&self, asset_id: &str) -> Option<CacheEntry> {
        let key = self.key_for(asset_id);
        let now = self.clock.now_ms();

        {
            let mut tier = self.lock();
            if let Some(entry) = tier.cache.get(&key, now) {
                tier.stats.record_memory_hit();
                return Some(entry);
            }
        }

        let found = self.persistent.read(&key, now);

        let mut tier = self.lock();
        match found {
            Some(entry) => {
                tier.stats.record_persistent_hit();
                // A put may have landed while the lock was released
                if tier.cache.contains_live(&key, now) {
                    return tier.cache.get(&key, now);
                }
                debug!(asset_id, "Promoting persistent entry into memory");
                if tier.cache.put(key, entry.clone()).is_some() {
                    tier.stats.record_eviction();
                }
                Some(entry)
            }
            None => {
                tier.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Writes a fresh entry to both tiers.
    ///
    /// The memory write always happens; the persistent write may compact or
    /// degrade but never fails the call.
    pub fn put(&self, asset_id: &str, payload: Value) {
        let key = self.key_for(asset_id);
        let entry = CacheEntry::new(
            key.clone(),
            payload,
            self.clock.now_ms(),
            self.ttl.as_millis() as u64,
        );

        {
            let mut tier = self.lock();
            if let Some(evicted) = tier.cache.put(key.clone(), entry.clone()) {
                debug!(evicted = %evicted, "Memory tier evicted oldest entry");
                tier.stats.record_eviction();
            }
        }

        let outcome = self.persistent.write(&key, &entry);

        let mut tier = self.lock();
        match outcome {
            WriteOutcome::Stored => {}
            WriteOutcome::StoredAfterCompaction => tier.stats.record_compaction(),
            WriteOutcome::Dropped => tier.stats.record_degraded_write(),
        }
    }

    // == Clear ==
    /// Empties memory and deletes every persistent entry in the namespace.
    pub fn clear(&self) {
        self.lock().cache.clear();
        let removed = self.persistent.clear();
        info!(removed, "Cache cleared");
    }

    // == Sweep Expired ==
    /// Deletes expired persistent entries; returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.persistent.sweep_expired(self.clock.now_ms())
    }

    // == Stats ==
    /// Returns a snapshot of the coordinator counters.
    pub fn stats(&self) -> CacheStats {
        let tier = self.lock();
        let mut stats = tier.stats.clone();
        stats.set_memory_entries(tier.cache.len());
        stats
    }
}
