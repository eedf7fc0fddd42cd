//! Persistent Sweep Task
//!
//! Removes expired entries from the persistent tier at startup and,
//! optionally, at a fixed interval afterwards.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheCoordinator;

/// Runs one sweep immediately. Returns the number of entries removed.
pub fn run_startup_sweep(coordinator: &CacheCoordinator) -> usize {
    let removed = coordinator.sweep_expired();
    info!("Startup sweep: removed {} expired entries", removed);
    removed
}

/// Spawns a background task that sweeps the persistent tier every
/// `sweep_interval_secs` seconds.
///
/// Returns a JoinHandle so the task can be aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(coordinator.clone(), 3600);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(
    coordinator: Arc<CacheCoordinator>,
    sweep_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting persistent sweep task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = coordinator.sweep_expired();
            if removed > 0 {
                info!("Persistent sweep: removed {} expired entries", removed);
            } else {
                debug!("Persistent sweep: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStorage, PersistentCache, ASSET_TTL};
    use crate::clock::ManualClock;
    use serde_json::json;

    const T0: u64 = 1_700_000_000_000;
    const DAY_MS: u64 = 24 * 60 * 60 * 1000;

    fn coordinator_over(
        storage: Arc<MemoryStorage>,
        clock: Arc<ManualClock>,
    ) -> Arc<CacheCoordinator> {
        Arc::new(CacheCoordinator::new(
            10,
            ASSET_TTL,
            "v1",
            PersistentCache::new(storage, "gallery-cache"),
            clock,
        ))
    }

    #[test]
    fn test_startup_sweep_removes_only_expired() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        let coordinator = coordinator_over(storage.clone(), clock.clone());

        coordinator.put("old.png", json!(1));
        clock.advance_ms(2 * DAY_MS);
        coordinator.put("new.png", json!(2));
        clock.advance_ms(6 * DAY_MS);

        assert_eq!(run_startup_sweep(&coordinator), 1);
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        let coordinator = coordinator_over(storage.clone(), clock.clone());

        coordinator.put("cat.png", json!(1));
        clock.advance_ms(8 * DAY_MS);

        let handle = spawn_sweep_task(coordinator.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(storage.is_empty(), "Expired entry should have been swept");
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_live_entries() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        let coordinator = coordinator_over(storage.clone(), clock);

        coordinator.put("cat.png", json!(1));

        let handle = spawn_sweep_task(coordinator.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(storage.len(), 1, "Live entry should not be removed");
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let coordinator = coordinator_over(
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::new(T0)),
        );

        let handle = spawn_sweep_task(coordinator, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
