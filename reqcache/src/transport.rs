//! The transport seam.
//!
//! The cache wraps an arbitrary request function; [`Transport`] is that
//! function's shape. Implementations perform the actual network call and
//! stream the response body back. Aborting happens out of band through the
//! [`TransportHandle`] surfaced by the `request` event.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use reqcache_core::{BodyStream, BoxError, RequestBody};
use smol_str::SmolStr;
use tokio::sync::watch;

/// The outbound request handed to the transport.
///
/// Header names are already lowercase-normalized; for revalidation calls
/// the map additionally carries the policy-built conditional headers.
pub struct TransportRequest {
    /// Uppercased request method.
    pub method: SmolStr,
    /// Target URL.
    pub url: String,
    /// Outbound headers.
    pub headers: HeaderMap,
    /// Request body, if any.
    pub body: Option<RequestBody>,
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// A live response produced by the transport.
pub struct TransportResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body stream.
    pub body: BodyStream,
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Performs a network request.
///
/// Errors returned here are request-origin and fatal to the call unless
/// automatic failover recovers them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues the request and resolves with the response head plus a body
    /// stream.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, BoxError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, BoxError> {
        (**self).send(request).await
    }
}

/// Cancellable handle for an in-flight transport call.
///
/// Carried by the `request` event so callers can attach abort logic before
/// the response arrives. Aborting resolves the call with a request error
/// and halts the pending store write; it does not retroactively remove
/// entries already persisted.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl TransportHandle {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(false);
        TransportHandle { tx: Arc::new(tx) }
    }

    /// Aborts the in-flight call.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    /// Whether the call was aborted.
    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the call is aborted. Never resolves otherwise.
    pub(crate) async fn aborted(&self) {
        let mut rx = self.tx.subscribe();
        // wait_for only errs once the sender is gone; self holds it
        let _ = rx.wait_for(|aborted| *aborted).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn abort_resolves_waiters() {
        let handle = TransportHandle::new();
        assert!(!handle.is_aborted());

        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.aborted().await });
        handle.abort();
        task.await.unwrap();
        assert!(handle.is_aborted());
    }

    #[tokio::test]
    async fn abort_after_subscribe_is_not_missed() {
        let handle = TransportHandle::new();
        handle.abort();
        // Late waiters still observe the abort.
        handle.aborted().await;
    }
}
