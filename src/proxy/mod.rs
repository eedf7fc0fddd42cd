//! Proxy Module
//!
//! Request-layer cache for asset GETs, independent of the coordinator's
//! tiers and transparent to everything else.

mod interceptor;
mod response;
mod upstream;

pub use interceptor::{CacheStatus, NetworkCacheProxy, ProxyStats};
pub use response::{ProxyRequest, ProxyResponse, ResponseHead};
pub use upstream::{is_hop_by_hop, HttpUpstream, Upstream};

/// Freshness window for stored responses, in milliseconds (7 days).
///
/// Kept separately from [`crate::cache::ASSET_TTL`]; the two must match.
pub const PROXY_TTL_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Header carrying the Unix-ms time a stored response was captured.
pub const CACHED_AT_HEADER: &str = "x-cached-at";
