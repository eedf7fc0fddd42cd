//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the tier invariants over generated operation
//! sequences.

use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

use crate::cache::{
    CacheCoordinator, CacheEntry, MemoryCache, MemoryStorage, PersistentCache, ASSET_TTL,
};
use crate::clock::ManualClock;

// == Test Configuration ==
const TEST_CAPACITY: usize = 20;
const TEST_TTL_MS: u64 = 10_000;

// == Strategies ==
/// Generates asset ids shaped like gallery file names
fn asset_id_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,12}\\.(png|gif|webp|mp4)".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum TierOp {
    Put { key: String },
    Get { key: String },
    Advance { ms: u64 },
}

fn tier_op_strategy() -> impl Strategy<Value = TierOp> {
    prop_oneof![
        asset_id_strategy().prop_map(|key| TierOp::Put { key }),
        asset_id_strategy().prop_map(|key| TierOp::Get { key }),
        (0u64..TEST_TTL_MS).prop_map(|ms| TierOp::Advance { ms }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Memory tier size never exceeds its bound, whatever the op mix.
    #[test]
    fn prop_memory_capacity_enforcement(ops in prop::collection::vec(tier_op_strategy(), 1..200)) {
        let mut cache = MemoryCache::new(TEST_CAPACITY);
        let mut now = 0u64;

        for op in ops {
            match op {
                TierOp::Put { key } => {
                    cache.put(key.clone(), CacheEntry::new(key, json!(null), now, TEST_TTL_MS));
                }
                TierOp::Get { key } => {
                    let _ = cache.get(&key, now);
                }
                TierOp::Advance { ms } => now += ms,
            }
            prop_assert!(
                cache.len() <= TEST_CAPACITY,
                "Memory size {} exceeds capacity {}",
                cache.len(),
                TEST_CAPACITY
            );
        }
    }

    // No read ever returns an entry past its expiry.
    #[test]
    fn prop_never_returns_expired(ops in prop::collection::vec(tier_op_strategy(), 1..200)) {
        let mut cache = MemoryCache::new(TEST_CAPACITY);
        let mut now = 0u64;

        for op in ops {
            match op {
                TierOp::Put { key } => {
                    cache.put(key.clone(), CacheEntry::new(key, json!(null), now, TEST_TTL_MS));
                }
                TierOp::Get { key } => {
                    if let Some(entry) = cache.get(&key, now) {
                        prop_assert!(now <= entry.expires_at, "Returned expired entry {}", key);
                    }
                }
                TierOp::Advance { ms } => now += ms,
            }
        }
    }

    // Filling past capacity evicts in insertion order, reads notwithstanding.
    #[test]
    fn prop_fifo_eviction_order(
        ids in prop::collection::hash_set(asset_id_strategy(), 3..15),
        reads in prop::collection::vec(0usize..100, 0..20),
        new_id in asset_id_strategy()
    ) {
        let ids: Vec<String> = ids.into_iter().collect();
        prop_assume!(!ids.contains(&new_id));

        let capacity = ids.len();
        let mut cache = MemoryCache::new(capacity);
        for id in &ids {
            cache.put(id.clone(), CacheEntry::new(id.clone(), json!(null), 0, TEST_TTL_MS));
        }

        // Re-reading (even the oldest key) must not change who gets evicted
        for r in reads {
            let _ = cache.get(&ids[r % capacity], 0);
        }

        let evicted = cache.put(new_id.clone(), CacheEntry::new(new_id.clone(), json!(null), 0, TEST_TTL_MS));

        prop_assert_eq!(evicted.as_ref(), Some(&ids[0]));
        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(cache.get(&ids[0], 0).is_none());
        for id in ids.iter().skip(1) {
            prop_assert!(cache.get(id, 0).is_some(), "Key '{}' should remain", id);
        }
    }

    // Anything put through the coordinator is visible via is_cached, even
    // after the memory tier has evicted it.
    #[test]
    fn prop_coordinator_put_is_cached(ids in prop::collection::vec(asset_id_strategy(), 1..60)) {
        let clock = Arc::new(ManualClock::new(0));
        let coordinator = CacheCoordinator::new(
            5,
            ASSET_TTL,
            "v1",
            PersistentCache::new(Arc::new(MemoryStorage::new()), "prop"),
            clock,
        );

        for id in &ids {
            coordinator.put(id, json!(id));
        }
        for id in &ids {
            prop_assert!(coordinator.is_cached(id), "{} should be cached", id);
        }

        coordinator.clear();
        for id in &ids {
            prop_assert!(!coordinator.is_cached(id), "{} should be cleared", id);
        }
    }
}
