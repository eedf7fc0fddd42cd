//! Proxy Message Types
//!
//! Owned request/response values that can be cloned and persisted
//! independently of the connection they came from.

use serde::{Deserialize, Serialize};

use crate::proxy::CACHED_AT_HEADER;

// == Proxy Request ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub method: String,
    /// Path plus optional query string, e.g. `/stickers/cat.png?v=2`
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ProxyRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Path without the query string.
    pub fn path_only(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(path, _)| path)
    }

    /// Key under which a response to this request is stored.
    pub fn identity(&self) -> String {
        format!("{} {}", self.method.to_ascii_uppercase(), self.path)
    }
}

// == Response Head ==
/// Status line and headers of a stored response. The body is stored
/// separately as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

// == Proxy Response ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ProxyResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn from_parts(head: ResponseHead, body: Vec<u8>) -> Self {
        Self::new(head.status, head.headers, body)
    }

    pub fn head(&self) -> ResponseHead {
        ResponseHead {
            status: self.status,
            headers: self.headers.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replaces every value of `name` with `value`.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    /// Freshness timestamp injected when the response was stored.
    pub fn cached_at(&self) -> Option<u64> {
        self.header(CACHED_AT_HEADER)?.trim().parse().ok()
    }

    /// Copy of this response stamped with `now_ms` as its freshness time.
    pub fn stamped(&self, now_ms: u64) -> Self {
        let mut copy = self.clone();
        copy.set_header(CACHED_AT_HEADER, now_ms.to_string());
        copy
    }
}
