//! FIFO Tracker Module
//!
//! Tracks insertion order for the memory tier's eviction policy.

use std::collections::VecDeque;

// == FIFO Tracker ==
/// Tracks insertion order for first-in-first-out eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
///
/// Reads never reorder keys, and re-inserting a tracked key keeps its
/// original position.
#[derive(Debug, Default)]
pub struct FifoTracker {
    order: VecDeque<String>,
}

impl FifoTracker {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Insert ==
    /// Records a key as newest if it is not tracked yet.
    pub fn insert(&mut self, key: &str) {
        if !self.contains(key) {
            self.order.push_back(key.to_string());
        }
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Returns and removes the oldest-inserted key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    // == Peek Oldest ==
    /// Returns the oldest-inserted key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.front()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}
