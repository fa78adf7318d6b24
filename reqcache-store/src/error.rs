//! Error types for store operations.

use thiserror::Error;

/// Error type for store operations.
///
/// Categorizes failures of the persistence layer so the orchestrator can
/// report them uniformly as cache-origin errors. None of these are fatal to
/// completing a request; the cache is treated as absent instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal store error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// Errors occurring during communication with remote backends.
    #[error(transparent)]
    Connection(Box<dyn std::error::Error + Send + Sync>),

    /// Malformed persisted entry or policy snapshot.
    #[error("malformed cache entry: {0}")]
    Format(#[from] serde_json::Error),
}
