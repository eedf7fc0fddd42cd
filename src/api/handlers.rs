//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints and the proxy
//! fallback.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::CacheCoordinator;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_asset_id, CachedResponse, ClearResponse, EntryResponse, HealthResponse,
    PutEntryRequest, PutEntryResponse, StatsResponse,
};
use crate::proxy::{is_hop_by_hop, CacheStatus, NetworkCacheProxy, ProxyRequest, ProxyResponse};

/// Largest request body forwarded by the proxy.
pub const MAX_PROXY_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Header reporting how the proxy answered a request.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Two-tier asset metadata cache
    pub coordinator: Arc<CacheCoordinator>,
    /// Request-layer response cache in front of the origin
    pub proxy: Arc<NetworkCacheProxy>,
}

impl AppState {
    pub fn new(coordinator: Arc<CacheCoordinator>, proxy: Arc<NetworkCacheProxy>) -> Self {
        Self { coordinator, proxy }
    }
}

fn checked_id(id: String) -> Result<String> {
    match validate_asset_id(&id) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(id),
    }
}

/// Handler for GET /__cache/cached/:id
pub async fn cached_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CachedResponse>> {
    let id = checked_id(id)?;
    let cached = state.coordinator.is_cached(&id);
    Ok(Json(CachedResponse { id, cached }))
}

/// Handler for GET /__cache/entries/:id
///
/// Read-through lookup; a persistent hit is promoted into memory.
pub async fn get_entry_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EntryResponse>> {
    let id = checked_id(id)?;
    match state.coordinator.get(&id) {
        Some(entry) => Ok(Json(EntryResponse::new(id, entry))),
        None => Err(CacheError::NotFound(format!("Asset '{}' not cached", id))),
    }
}

/// Handler for PUT /__cache/entries/:id
pub async fn put_entry_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PutEntryRequest>,
) -> Result<Json<PutEntryResponse>> {
    let id = checked_id(id)?;
    state.coordinator.put(&id, req.payload);
    Ok(Json(PutEntryResponse::new(id)))
}

/// Handler for DELETE /__cache/entries
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.coordinator.clear();
    Json(ClearResponse::cleared())
}

/// Handler for GET /__cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.coordinator.stats(),
        state.proxy.stats(),
    ))
}

/// Handler for GET /__cache/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.proxy.generation()))
}

/// Fallback handler: every request not addressed to the admin API goes
/// through the network cache proxy.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let proxy_request = to_proxy_request(request).await?;
    let (response, status) = state.proxy.handle(proxy_request).await?;
    Ok(into_http_response(response, status))
}

async fn to_proxy_request(request: Request) -> Result<ProxyRequest> {
    let (parts, body) = request.into_parts();
    let path = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = axum::body::to_bytes(body, MAX_PROXY_BODY_BYTES)
        .await
        .map_err(|e| CacheError::InvalidRequest(format!("unreadable body: {}", e)))?;

    Ok(ProxyRequest {
        method: parts.method.as_str().to_string(),
        path,
        headers,
        body: body.to_vec(),
    })
}

fn into_http_response(response: ProxyResponse, status: CacheStatus) -> Response {
    let code = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(code);
    for (name, value) in response.headers.iter().filter(|(n, _)| !is_hop_by_hop(n)) {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder = builder.header(
        CACHE_STATUS_HEADER,
        HeaderValue::from_static(status.as_str()),
    );

    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|err| CacheError::Internal(err.to_string()).into_response())
}
