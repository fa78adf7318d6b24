//! The per-call event surface.
//!
//! Each orchestration run owns one emitter with three event kinds:
//! `Request` when the transport is invoked (carrying the abort handle),
//! `Response` exactly once on successful resolution, and `Error` zero or
//! more times. Cache errors arrive out of band, possibly after the
//! response: they are diagnostics of degraded but successful operation,
//! not failures of the primary request.
//!
//! The response itself is delivered through the call future, keeping the
//! "exactly one response" contract in the type system; the event stream is
//! purely observational and may be dropped without affecting the call.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use http::StatusCode;
use reqcache_core::CacheKey;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::Error;
use crate::transport::TransportHandle;

/// Lightweight description of a delivered response.
#[derive(Debug, Clone)]
pub struct ResponseSummary {
    /// Response status.
    pub status: StatusCode,
    /// Whether the response was served from the store.
    pub from_cache: bool,
    /// The cache key derived for the call.
    pub key: CacheKey,
}

/// One observable outcome of an orchestration run.
#[derive(Debug)]
pub enum Event {
    /// A transport call was issued; the handle aborts it.
    Request(TransportHandle),
    /// The call resolved with a response. Emitted exactly once per
    /// successful call, after the `Request` event when one was fired.
    Response(ResponseSummary),
    /// An unrecoverable condition or an out-of-band cache failure.
    Error(Error),
}

/// Sending half, held by the orchestrator. Emission never blocks and never
/// fails: a dropped subscriber simply discards events.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSink {
    pub(crate) fn channel() -> (EventSink, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventSink { tx }, EventStream { rx })
    }

    pub(crate) fn request(&self, handle: TransportHandle) {
        let _ = self.tx.send(Event::Request(handle));
    }

    pub(crate) fn response(&self, summary: ResponseSummary) {
        let _ = self.tx.send(Event::Response(summary));
    }

    pub(crate) fn error(&self, error: Error) {
        debug!(error = %error, "reporting call error");
        let _ = self.tx.send(Event::Error(error));
    }
}

/// Receiving half, handed to the caller alongside the call future.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventStream {
    /// Receives the next event, or `None` once the call has finished and
    /// all events were drained.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Non-blocking receive of an already-emitted event.
    pub fn try_next(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let (sink, mut stream) = EventSink::channel();
        sink.request(TransportHandle::new());
        sink.error(Error::cache("lookup failed"));
        drop(sink);

        assert!(matches!(stream.next().await, Some(Event::Request(_))));
        assert!(matches!(stream.next().await, Some(Event::Error(_))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropped_stream_does_not_fail_emission() {
        let (sink, stream) = EventSink::channel();
        drop(stream);
        sink.error(Error::cache("ignored"));
    }
}
