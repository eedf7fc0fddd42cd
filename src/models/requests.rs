//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

/// Maximum accepted asset id length in bytes.
pub const MAX_ASSET_ID_LENGTH: usize = 256;

/// Request body for storing an entry (PUT /__cache/entries/:id)
#[derive(Debug, Clone, Deserialize)]
pub struct PutEntryRequest {
    /// Asset metadata to cache
    pub payload: Value,
}

/// Validates an asset id taken from the path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_asset_id(id: &str) -> Option<String> {
    if id.is_empty() {
        return Some("Asset id cannot be empty".to_string());
    }
    if id.len() > MAX_ASSET_ID_LENGTH {
        return Some(format!(
            "Asset id exceeds maximum length of {} bytes",
            MAX_ASSET_ID_LENGTH
        ));
    }
    if id.contains('/') {
        return Some("Asset id cannot contain '/'".to_string());
    }
    None
}
