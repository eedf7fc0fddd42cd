//! API Module
//!
//! HTTP handlers and routing for the cache admin API and the proxy
//! fallback.
//!
//! # Endpoints
//! - `GET /__cache/health` - Health check endpoint
//! - `GET /__cache/stats` - Cache and proxy statistics
//! - `GET /__cache/cached/:id` - Is the asset cached
//! - `GET /__cache/entries/:id` - Read an entry
//! - `PUT /__cache/entries/:id` - Store an entry
//! - `DELETE /__cache/entries` - Clear the cache

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
