//! Response types delivered to callers.
//!
//! A [`Response`] has the observable shape of a normal HTTP response
//! (status, headers, a once-consumable body) regardless of whether it was
//! materialized from a stored entry or arrived live from the network. The
//! provenance is exposed through [`Response::from_cache`], and the
//! cache-control policy that governed the decision travels with the
//! response.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use http::{HeaderMap, StatusCode};
use http_cache_semantics::CachePolicy;

use crate::BoxError;

/// Fallible stream of body chunks.
pub type BodyStream = futures::stream::BoxStream<'static, Result<Bytes, BoxError>>;

/// A once-consumable response body.
///
/// Bodies replayed from the cache are fully buffered ([`Body::Full`]); live
/// network bodies stream through ([`Body::Streaming`]). Both can be
/// collected with [`Body::bytes`] or consumed chunk by chunk via the
/// [`Stream`] impl.
pub enum Body {
    /// Fully buffered body, replayed from stored bytes.
    Full(Bytes),
    /// Live body streamed from the network.
    Streaming(BodyStream),
}

impl Body {
    /// An empty, fully buffered body.
    pub fn empty() -> Self {
        Body::Full(Bytes::new())
    }

    /// Collects the whole body into one buffer.
    pub async fn bytes(self) -> Result<Bytes, BoxError> {
        match self {
            Body::Full(bytes) => Ok(bytes),
            Body::Streaming(mut stream) => {
                let mut buffer = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buffer.extend_from_slice(&chunk?);
                }
                Ok(buffer.freeze())
            }
        }
    }
}

impl Stream for Body {
    type Item = Result<Bytes, BoxError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.get_mut() {
            Body::Full(bytes) => {
                if bytes.is_empty() {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Ok(std::mem::take(bytes))))
                }
            }
            Body::Streaming(stream) => stream.as_mut().poll_next(cx),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Full(bytes) => f.debug_tuple("Body::Full").field(&bytes.len()).finish(),
            Body::Streaming(_) => f.write_str("Body::Streaming"),
        }
    }
}

/// A response delivered by one orchestration run.
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
    from_cache: bool,
    policy: Option<CachePolicy>,
}

impl Response {
    /// Assembles a response from its parts.
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Body,
        from_cache: bool,
        policy: Option<CachePolicy>,
    ) -> Self {
        Response {
            status,
            headers,
            body,
            from_cache,
            policy,
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers. For cache-served responses these are the
    /// policy-adjusted headers (e.g. with an updated `age`).
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether this response was served from the store rather than a fresh
    /// network body.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// The cache-control policy attached to this response, when caching was
    /// in play for the call.
    pub fn policy(&self) -> Option<&CachePolicy> {
        self.policy.as_ref()
    }

    /// Consumes the response, returning its body.
    pub fn into_body(self) -> Body {
        self.body
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("from_cache", &self.from_cache)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_body_collects() {
        let body = Body::Full(Bytes::from_static(b"hello"));
        assert_eq!(body.bytes().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn streaming_body_collects_chunks() {
        let chunks: Vec<Result<Bytes, BoxError>> = vec![
            Ok(Bytes::from_static(b"hel")),
            Ok(Bytes::from_static(b"lo")),
        ];
        let body = Body::Streaming(futures::stream::iter(chunks).boxed());
        assert_eq!(body.bytes().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn full_body_streams_once() {
        let body = Body::Full(Bytes::from_static(b"hello"));
        let collected: Vec<_> = body.collect().await;
        assert_eq!(collected.len(), 1);
    }
}
