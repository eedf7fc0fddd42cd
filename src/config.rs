//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Cache and proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries held by the memory tier
    pub memory_capacity: usize,
    /// Cache-format version mixed into every entry key
    pub cache_version: String,
    /// Namespace prefix for persistent keys
    pub namespace: String,
    /// Directory holding the persistent tier and the proxy store
    pub store_dir: PathBuf,
    /// Base URL of the asset origin
    pub origin_url: String,
    /// Path prefix intercepted by the proxy
    pub asset_prefix: String,
    /// Name of the current proxy cache generation
    pub proxy_generation: String,
    /// HTTP server port
    pub server_port: u16,
    /// Periodic persistent sweep interval in seconds (0 = startup only)
    pub sweep_interval: u64,
    /// Look-ahead margin in pixels for the lazy loader
    pub lookahead_margin: u32,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMORY_CAPACITY` - Memory tier entry bound (default: 100)
    /// - `CACHE_VERSION` - Key format version (default: v1)
    /// - `CACHE_NAMESPACE` - Persistent key namespace (default: gallery-cache)
    /// - `STORE_DIR` - Storage directory (default: ./.gallery-cache)
    /// - `ORIGIN_URL` - Asset origin (default: http://127.0.0.1:8000)
    /// - `ASSET_PREFIX` - Proxied path prefix (default: /stickers)
    /// - `PROXY_GENERATION` - Proxy cache generation (default: stickers-cache-v1)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Persistent sweep interval in seconds (default: 0)
    /// - `LOOKAHEAD_MARGIN` - Loader look-ahead in pixels (default: 200)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            memory_capacity: parse_var("MEMORY_CAPACITY", defaults.memory_capacity),
            cache_version: env::var("CACHE_VERSION").unwrap_or(defaults.cache_version),
            namespace: env::var("CACHE_NAMESPACE").unwrap_or(defaults.namespace),
            store_dir: env::var("STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
            origin_url: env::var("ORIGIN_URL").unwrap_or(defaults.origin_url),
            asset_prefix: env::var("ASSET_PREFIX").unwrap_or(defaults.asset_prefix),
            proxy_generation: env::var("PROXY_GENERATION").unwrap_or(defaults.proxy_generation),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            sweep_interval: parse_var("SWEEP_INTERVAL", defaults.sweep_interval),
            lookahead_margin: parse_var("LOOKAHEAD_MARGIN", defaults.lookahead_margin),
        }
    }

    /// Directory for the coordinator's persistent tier.
    pub fn persistent_dir(&self) -> PathBuf {
        self.store_dir.join("entries")
    }

    /// Directory for the proxy's response store.
    pub fn proxy_dir(&self) -> PathBuf {
        self.store_dir.join("responses")
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_capacity: 100,
            cache_version: "v1".to_string(),
            namespace: "gallery-cache".to_string(),
            store_dir: PathBuf::from("./.gallery-cache"),
            origin_url: "http://127.0.0.1:8000".to_string(),
            asset_prefix: "/stickers".to_string(),
            proxy_generation: "stickers-cache-v1".to_string(),
            server_port: 3000,
            sweep_interval: 0,
            lookahead_margin: 200,
        }
    }
}
