//! The persisted cache entry.

use bytes::Bytes;
use http::StatusCode;
use http_cache_semantics::CachePolicy;
use serde::{Deserialize, Serialize};

/// One stored response.
///
/// Written once per stored response. An entry is immutable after the write:
/// it is only ever replaced wholesale when revalidation confirms the origin
/// changed, or deleted when a forced refresh meets an expired entry or
/// revalidation reports a non-storable outcome.
///
/// The policy snapshot carries the response headers and cache-control
/// metadata; serving from the entry goes through the policy so headers like
/// `age` are adjusted for elapsed time.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache-control policy snapshot taken at write time.
    pub policy: CachePolicy,
    /// Resolved URL the response was fetched from.
    pub url: String,
    /// Response status code.
    pub status: u16,
    /// Response body bytes, post storage hooks.
    pub body: Bytes,
}

impl CacheEntry {
    /// Assembles an entry from a response about to be persisted.
    pub fn new(policy: CachePolicy, url: impl Into<String>, status: StatusCode, body: Bytes) -> Self {
        CacheEntry {
            policy,
            url: url.into(),
            status: status.as_u16(),
            body,
        }
    }

    /// The stored status as a typed code. Falls back to `200 OK` should the
    /// persisted integer be out of range.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK)
    }
}
