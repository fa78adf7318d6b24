//! Live response duplication.
//!
//! A live network body must reach two independent consumers: the caller and
//! the store write. [`tee`] spawns a pump task that relays every chunk into
//! an unbounded caller-facing channel while accumulating a copy for
//! storage, so neither side can block or starve the other. The storage side
//! resolves only when the body was read to the end cleanly; a stream error
//! resolves it with no body, and no entry gets written.
//!
//! The caller may stop consuming (or drop the body entirely); the pump
//! keeps draining the source so the storage copy still completes.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use reqcache_core::{Body, BodyStream, BoxError};
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

/// Resolves with the fully buffered body once the source stream ends, or
/// with `None` when it errored mid-flight.
pub(crate) struct BufferedBody {
    rx: oneshot::Receiver<Option<Bytes>>,
}

impl BufferedBody {
    pub(crate) async fn wait(self) -> Option<Bytes> {
        self.rx.await.unwrap_or(None)
    }
}

/// Splits a live body into the caller-facing stream and the storage buffer.
///
/// Requires a running tokio runtime.
pub(crate) fn tee(stream: BodyStream) -> (Body, BufferedBody) {
    let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(pump(stream, chunk_tx, done_tx));
    (
        Body::Streaming(Box::pin(RelayedBody { rx: chunk_rx })),
        BufferedBody { rx: done_rx },
    )
}

async fn pump(
    mut stream: BodyStream,
    chunks: mpsc::UnboundedSender<Result<Bytes, BoxError>>,
    done: oneshot::Sender<Option<Bytes>>,
) {
    let mut buffer = BytesMut::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                buffer.extend_from_slice(&chunk);
                let _ = chunks.send(Ok(chunk));
            }
            Err(error) => {
                trace!("body stream errored, storage copy discarded");
                let _ = chunks.send(Err(error));
                let _ = done.send(None);
                return;
            }
        }
    }
    let _ = done.send(Some(buffer.freeze()));
}

struct RelayedBody {
    rx: mpsc::UnboundedReceiver<Result<Bytes, BoxError>>,
}

impl Stream for RelayedBody {
    type Item = Result<Bytes, BoxError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn both_sides_see_the_whole_body() {
        let chunks: Vec<Result<Bytes, BoxError>> = vec![
            Ok(Bytes::from_static(b"hel")),
            Ok(Bytes::from_static(b"lo")),
        ];
        let (body, buffered) = tee(futures::stream::iter(chunks).boxed());

        assert_eq!(body.bytes().await.unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(buffered.wait().await, Some(Bytes::from_static(b"hello")));
    }

    #[tokio::test]
    async fn storage_copy_completes_without_the_caller() {
        let chunks: Vec<Result<Bytes, BoxError>> = vec![Ok(Bytes::from_static(b"data"))];
        let (body, buffered) = tee(futures::stream::iter(chunks).boxed());
        drop(body);
        assert_eq!(buffered.wait().await, Some(Bytes::from_static(b"data")));
    }

    #[tokio::test]
    async fn stream_error_discards_storage_copy() {
        let chunks: Vec<Result<Bytes, BoxError>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err("connection reset".into()),
        ];
        let (body, buffered) = tee(futures::stream::iter(chunks).boxed());

        assert!(body.bytes().await.is_err());
        assert_eq!(buffered.wait().await, None);
    }
}
