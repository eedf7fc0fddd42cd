//! Cache Statistics Module
//!
//! Tracks coordinator metrics including per-tier hits, misses, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads served by the memory tier
    pub memory_hits: u64,
    /// Reads served by the persistent tier (each one promoted into memory)
    pub persistent_hits: u64,
    /// Reads that found nothing live in either tier
    pub misses: u64,
    /// Entries evicted from the memory tier by the FIFO bound
    pub evictions: u64,
    /// Persistent writes that only landed after a compaction pass
    pub compactions: u64,
    /// Persistent writes that were dropped, leaving the entry memory-only
    pub degraded_writes: u64,
    /// Current number of entries in the memory tier
    pub memory_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the combined hit rate over both tiers.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.persistent_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn record_memory_hit(&mut self) {
        self.memory_hits += 1;
    }

    pub fn record_persistent_hit(&mut self) {
        self.persistent_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_compaction(&mut self) {
        self.compactions += 1;
    }

    pub fn record_degraded_write(&mut self) {
        self.degraded_writes += 1;
    }

    pub fn set_memory_entries(&mut self, count: usize) {
        self.memory_entries = count;
    }
}
