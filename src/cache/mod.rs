//! Cache Module
//!
//! Two-tier asset caching: a bounded FIFO memory tier in front of a
//! persistent keyed store, orchestrated by [`CacheCoordinator`].

mod coordinator;
mod entry;
mod fifo;
mod memory;
mod persistent;
mod stats;
mod storage;

#[cfg(test)]
mod property_tests;

use std::time::Duration;

// Re-export public types
pub use coordinator::CacheCoordinator;
pub use entry::{entry_key, CacheEntry};
pub use fifo::FifoTracker;
pub use memory::MemoryCache;
pub use persistent::{PersistentCache, WriteOutcome};
pub use stats::CacheStats;
pub use storage::{FileStorage, MemoryStorage, StorageBackend};

// == Public Constants ==
/// Lifetime of every cached asset entry, in seconds (7 days).
///
/// The proxy keeps its own copy in [`crate::proxy::PROXY_TTL_MS`]; the two
/// must stay equal.
pub const ASSET_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// [`ASSET_TTL_SECS`] as a `Duration`.
pub const ASSET_TTL: Duration = Duration::from_secs(ASSET_TTL_SECS);
