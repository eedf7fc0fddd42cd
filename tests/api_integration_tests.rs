//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle for the admin endpoints and the
//! proxy fallback.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use gallery_cache::{
    api::create_router,
    cache::{CacheCoordinator, MemoryStorage},
    clock::ManualClock,
    proxy::{NetworkCacheProxy, ProxyRequest, ProxyResponse, Upstream},
    AppState, Result,
};
use serde_json::Value;
use tower::ServiceExt;

const T0: u64 = 1_700_000_000_000;
const DAY_MS: u64 = 24 * 60 * 60 * 1000;

// == Helper Functions ==

/// Origin that serves a fixed PNG body and counts calls.
#[derive(Default)]
struct CountingOrigin {
    calls: AtomicUsize,
}

#[async_trait]
impl Upstream for CountingOrigin {
    async fn send(&self, request: &ProxyRequest) -> Result<ProxyResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProxyResponse::new(
            200,
            vec![("content-type".to_string(), "image/png".to_string())],
            format!("body of {}", request.path).into_bytes(),
        ))
    }
}

struct TestApp {
    router: Router,
    origin: Arc<CountingOrigin>,
    clock: Arc<ManualClock>,
}

impl TestApp {
    fn new() -> Self {
        let origin = Arc::new(CountingOrigin::default());
        let clock = Arc::new(ManualClock::new(T0));
        let coordinator = Arc::new(CacheCoordinator::in_memory(100, clock.clone()));
        let proxy = Arc::new(NetworkCacheProxy::new(
            origin.clone(),
            Arc::new(MemoryStorage::new()),
            "stickers-cache-v1",
            "/stickers",
            clock.clone(),
        ));
        Self {
            router: create_router(AppState::new(coordinator, proxy)),
            origin,
            clock,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    fn origin_calls(&self) -> usize {
        self.origin.calls.load(Ordering::SeqCst)
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn put_entry(id: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(format!("/__cache/entries/{}", id))
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Lets the proxy's detached store task run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

// == Entry Endpoint Tests ==

#[tokio::test]
async fn test_put_then_get_entry() {
    let app = TestApp::new();

    let response = app
        .send(put_entry("cat.png", r#"{"payload":{"contentType":"image/png","size":42}}"#))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("cat.png"));

    let response = app.get("/__cache/entries/cat.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["id"], "cat.png");
    assert_eq!(json["entry"]["payload"]["size"], 42);
    assert_eq!(json["entry"]["key"], "asset-v1:cat.png");
}

#[tokio::test]
async fn test_put_entry_missing_payload_is_rejected() {
    let app = TestApp::new();
    let response = app.send(put_entry("cat.png", r#"{"size":42}"#)).await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_get_entry_not_found() {
    let app = TestApp::new();

    let response = app.get("/__cache/entries/nonexistent.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_cached_probe_follows_ttl() {
    let app = TestApp::new();

    let json = body_to_json(app.get("/__cache/cached/cat.png").await.into_body()).await;
    assert_eq!(json["cached"], false);

    app.send(put_entry("cat.png", r#"{"payload":1}"#)).await;
    let json = body_to_json(app.get("/__cache/cached/cat.png").await.into_body()).await;
    assert_eq!(json["cached"], true);

    app.clock.advance_ms(7 * DAY_MS + 1);
    let json = body_to_json(app.get("/__cache/cached/cat.png").await.into_body()).await;
    assert_eq!(json["cached"], false);
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let app = TestApp::new();
    app.send(put_entry("a.png", r#"{"payload":1}"#)).await;
    app.send(put_entry("b.mp4", r#"{"payload":2}"#)).await;

    let response = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri("/__cache/entries")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    for id in ["a.png", "b.mp4"] {
        let json = body_to_json(app.get(&format!("/__cache/cached/{}", id)).await.into_body()).await;
        assert_eq!(json["cached"], false);
    }
}

// == Stats / Health Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = TestApp::new();
    app.send(put_entry("cat.png", r#"{"payload":1}"#)).await;
    app.get("/__cache/entries/cat.png").await;
    app.get("/__cache/entries/dog.png").await;

    let response = app.get("/__cache/stats").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["cache"]["memory_hits"], 1);
    assert_eq!(json["cache"]["misses"], 1);
    assert_eq!(json["cache"]["memory_entries"], 1);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();

    let response = app.get("/__cache/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["generation"], "stickers-cache-v1");
}

// == Proxy Fallback Tests ==

#[tokio::test]
async fn test_proxy_serves_second_request_from_store() {
    let app = TestApp::new();

    let first = app.get("/stickers/cat.png").await;
    assert_eq!(first.headers()["x-cache"], "MISS");
    let first_body = body_to_string(first.into_body()).await;
    settle().await;

    let second = app.get("/stickers/cat.png").await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers()["x-cache"], "HIT");
    assert_eq!(second.headers()["content-type"], "image/png");
    assert_eq!(body_to_string(second.into_body()).await, first_body);

    assert_eq!(app.origin_calls(), 1);
}

#[tokio::test]
async fn test_proxy_refetches_after_freshness_window() {
    let app = TestApp::new();

    app.get("/stickers/cat.png").await;
    settle().await;
    app.clock.advance_ms(8 * DAY_MS);

    let response = app.get("/stickers/cat.png").await;
    assert_eq!(response.headers()["x-cache"], "MISS");
    assert_eq!(app.origin_calls(), 2);
}

#[tokio::test]
async fn test_proxy_bypasses_other_paths() {
    let app = TestApp::new();

    for _ in 0..2 {
        let response = app.get("/index.html").await;
        assert_eq!(response.headers()["x-cache"], "BYPASS");
        settle().await;
    }
    assert_eq!(app.origin_calls(), 2);

    let json = body_to_json(app.get("/__cache/stats").await.into_body()).await;
    assert_eq!(json["proxy"]["bypassed"], 2);
}

#[tokio::test]
async fn test_proxy_bypasses_non_get_asset_requests() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/stickers/cat.png")
                .body(Body::from("upload"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.headers()["x-cache"], "BYPASS");
}
