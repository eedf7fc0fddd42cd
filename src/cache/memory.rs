//! Memory Tier Module
//!
//! Bounded in-process map with FIFO eviction and lazy TTL expiry.

use std::collections::HashMap;

use crate::cache::{CacheEntry, FifoTracker};

// == Memory Cache ==
/// Volatile key→entry store holding at most `capacity` entries.
#[derive(Debug)]
pub struct MemoryCache {
    entries: HashMap<String, CacheEntry>,
    order: FifoTracker,
    capacity: usize,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates an empty memory tier bounded to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: FifoTracker::new(),
            capacity,
        }
    }

    // == Put ==
    /// Inserts or overwrites an entry.
    ///
    /// A new key arriving at a full tier evicts the oldest-inserted key
    /// first, so `len() <= capacity` holds afterwards. Returns the evicted
    /// key, if any.
    pub fn put(&mut self, key: String, entry: CacheEntry) -> Option<String> {
        if self.capacity == 0 {
            return None;
        }

        let mut evicted = None;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.evict_oldest() {
                self.entries.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        self.order.insert(&key);
        self.entries.insert(key, entry);
        evicted
    }

    // == Get ==
    /// Returns a live entry; an expired one is removed and `None` returned.
    pub fn get(&mut self, key: &str, now_ms: u64) -> Option<CacheEntry> {
        let expired = self.entries.get(key)?.is_expired_at(now_ms);
        if expired {
            self.remove(key);
            return None;
        }
        self.entries.get(key).cloned()
    }

    // == Contains Live ==
    /// True if a live entry exists. Never mutates.
    pub fn contains_live(&self, key: &str, now_ms: u64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now_ms))
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.order.remove(key);
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
