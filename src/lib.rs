//! Gallery Cache - Two-tier asset caching for a media gallery
//!
//! Provides a memory + persistent metadata cache with TTL expiry, a
//! visibility-driven lazy loader, and a network cache proxy in front of the
//! asset origin.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod proxy;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::CacheCoordinator;
pub use config::Config;
pub use error::{CacheError, Result};
pub use loader::LazyLoader;
pub use proxy::NetworkCacheProxy;
pub use tasks::{run_startup_sweep, spawn_sweep_task};
