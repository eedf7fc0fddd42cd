//! API Routes
//!
//! Configures the Axum router: admin endpoints under `/__cache`, everything
//! else through the network cache proxy.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cached_handler, clear_handler, get_entry_handler, health_handler, proxy_handler,
    put_entry_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /__cache/health` - Health check
/// - `GET /__cache/stats` - Coordinator and proxy counters
/// - `GET /__cache/cached/:id` - Presence probe, no side effects
/// - `GET /__cache/entries/:id` - Read-through lookup
/// - `PUT /__cache/entries/:id` - Write to both tiers
/// - `DELETE /__cache/entries` - Clear both tiers
/// - anything else - Proxied to the origin
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/__cache/health", get(health_handler))
        .route("/__cache/stats", get(stats_handler))
        .route("/__cache/cached/:id", get(cached_handler))
        .route(
            "/__cache/entries/:id",
            get(get_entry_handler).put(put_entry_handler),
        )
        .route("/__cache/entries", delete(clear_handler))
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
