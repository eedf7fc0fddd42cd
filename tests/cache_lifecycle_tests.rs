//! Lifecycle tests across real storage and real HTTP.
//!
//! Covers persistence across a restart, quota compaction on disk, and a
//! loader fetching through the proxy from a live origin.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Path, routing::get, Router};
use gallery_cache::{
    api::create_router,
    cache::{CacheCoordinator, FileStorage, PersistentCache, ASSET_TTL},
    clock::{ManualClock, SystemClock},
    loader::{AssetElement, LoadState, Rect, Viewport, VisibilityOutcome},
    proxy::HttpUpstream,
    AppState, Config, LazyLoader, NetworkCacheProxy,
};
use serde_json::json;
use tempfile::TempDir;

const T0: u64 = 1_700_000_000_000;

fn file_coordinator(dir: &TempDir, clock: Arc<ManualClock>) -> CacheCoordinator {
    let storage = FileStorage::open(dir.path()).unwrap();
    CacheCoordinator::new(
        10,
        ASSET_TTL,
        "v1",
        PersistentCache::new(Arc::new(storage), "gallery-cache"),
        clock,
    )
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[test]
fn test_entries_survive_restart() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(T0));

    let before = file_coordinator(&dir, clock.clone());
    before.put("cat.png", json!({"size": 3}));
    drop(before);

    let after = file_coordinator(&dir, clock);
    assert!(after.is_cached("cat.png"));

    let entry = after.get("cat.png").unwrap();
    assert_eq!(entry.payload["size"], 3);
    let stats = after.stats();
    assert_eq!(stats.persistent_hits, 1);
    assert_eq!(stats.memory_entries, 1);
}

#[test]
fn test_full_disk_compacts_and_keeps_newest() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let storage = FileStorage::open(dir.path()).unwrap().with_quota(600);
    let coordinator = CacheCoordinator::new(
        100,
        ASSET_TTL,
        "v1",
        PersistentCache::new(Arc::new(storage), "gallery-cache"),
        clock.clone(),
    );

    for i in 0..12 {
        coordinator.put(&format!("asset-{}.png", i), json!({"index": i}));
        clock.advance_ms(1_000);
    }

    let stats = coordinator.stats();
    assert!(stats.compactions >= 1, "quota should have forced a compaction");
    assert_eq!(stats.memory_entries, 12);

    // Newest entry always reaches disk after compaction
    let restarted = file_coordinator(&dir, clock);
    assert!(restarted.is_cached("asset-11.png"));
    assert!(!restarted.is_cached("asset-0.png"));
}

#[tokio::test]
async fn test_loader_fetches_through_proxy() {
    let origin = Router::new().route(
        "/stickers/:name",
        get(|Path(name): Path<String>| async move {
            ([("content-type", "image/png")], format!("png bytes for {}", name))
        }),
    );
    let origin_addr = serve(origin).await;

    let gallery_dir = TempDir::new().unwrap();
    let config = Config {
        store_dir: gallery_dir.path().to_path_buf(),
        ..Config::default()
    };
    let coordinator = Arc::new(CacheCoordinator::from_config(
        &config,
        Arc::new(FileStorage::open(config.persistent_dir()).unwrap()),
    ));
    let proxy = Arc::new(NetworkCacheProxy::new(
        Arc::new(HttpUpstream::new(format!("http://{}", origin_addr))),
        Arc::new(FileStorage::open(config.proxy_dir()).unwrap()),
        config.proxy_generation.clone(),
        config.asset_prefix.clone(),
        Arc::new(SystemClock),
    ));
    let gallery_addr = serve(create_router(AppState::new(coordinator.clone(), proxy.clone()))).await;

    let loader_config = Config {
        origin_url: format!("http://{}", gallery_addr),
        ..config.clone()
    };
    let loader = LazyLoader::from_config(&loader_config, coordinator.clone());

    let el = Arc::new(
        AssetElement::for_asset(&config.asset_prefix, "cat.png", Rect::new(0.0, 100.0)).unwrap(),
    );
    loader.observe(el.clone());
    assert_eq!(el.state(), LoadState::Pending);

    let handles = loader.viewport_changed(Viewport::new(0.0, 800.0));
    assert_eq!(handles.len(), 1);
    for handle in handles {
        assert_eq!(handle.await.unwrap(), VisibilityOutcome::Fetched);
    }

    assert_eq!(el.state(), LoadState::Loaded);
    assert_eq!(el.source().as_deref(), Some("/stickers/cat.png"));
    assert!(coordinator.is_cached("cat.png"));
    let payload = coordinator.get("cat.png").unwrap().payload;
    assert_eq!(payload["contentType"], "image/png");
    assert_eq!(proxy.stats().misses, 1);

    // A second element for the same asset is served by the cache
    let twin = Arc::new(
        AssetElement::for_asset(&config.asset_prefix, "cat.png", Rect::new(0.0, 100.0)).unwrap(),
    );
    loader.observe(twin.clone());
    let handles = loader.viewport_changed(Viewport::new(0.0, 800.0));
    for handle in handles {
        assert_eq!(handle.await.unwrap(), VisibilityOutcome::FromCache);
    }
    assert_eq!(twin.state(), LoadState::Loaded);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(proxy.stats().store_failures, 0);
}
