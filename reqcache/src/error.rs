//! Error types for cache orchestration.
//!
//! One closed enumeration with two kinds, both carrying the original cause:
//! request-origin failures are fatal to the call (unless failover recovers
//! them), cache-origin failures never are. Causes are reference-counted so
//! the same error can resolve the call future and travel the event channel.

use std::sync::Arc;

use reqcache_core::BoxError;
use thiserror::Error;

/// An orchestration error.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Transport-layer failure: construction error, network error, abort.
    #[error("request error: {0}")]
    Request(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// Store or policy-snapshot failure. Reported for observability; the
    /// call proceeds as if the cache were absent.
    #[error("cache error: {0}")]
    Cache(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps a transport-origin cause.
    pub fn request(cause: impl Into<BoxError>) -> Self {
        Error::Request(Arc::from(cause.into()))
    }

    /// Wraps a cache-origin cause.
    pub fn cache(cause: impl Into<BoxError>) -> Self {
        Error::Cache(Arc::from(cause.into()))
    }

    /// Whether this error originated in the transport layer.
    pub fn is_request(&self) -> bool {
        matches!(self, Error::Request(_))
    }

    /// Whether this error originated in the cache subsystem.
    pub fn is_cache(&self) -> bool {
        matches!(self, Error::Cache(_))
    }
}

/// The transport call was aborted through its handle.
#[derive(Debug, Clone, Copy, Error)]
#[error("request aborted")]
pub struct Aborted;
