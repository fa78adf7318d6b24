//! The front-door cache client.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use reqcache_core::{RequestOptions, Response};
use reqcache_store::{MemoryStore, Store};

use crate::error::Error;
use crate::events::{EventSink, EventStream};
use crate::fsm::CacheRun;
use crate::transport::{Transport, TransportHandle};

/// A caching layer wrapped around a transport and a store.
///
/// The client itself is cheap to clone and safe to share; every
/// [`request`](RequestCache::request) call gets its own state machine, its
/// own event channel, and its own abort handle. Calls touching the same key
/// are deliberately independent: two concurrent misses both go to the
/// network and the later store write wins.
pub struct RequestCache<T, S = MemoryStore> {
    transport: Arc<T>,
    store: Arc<S>,
}

impl<T, S> RequestCache<T, S>
where
    T: Transport + 'static,
    S: Store + 'static,
{
    /// Wraps `transport` with caching backed by `store`.
    pub fn new(transport: T, store: S) -> Self {
        RequestCache {
            transport: Arc::new(transport),
            store: Arc::new(store),
        }
    }

    /// Issues a request through the cache.
    ///
    /// Returns immediately with a [`CacheCall`]; nothing runs until the
    /// call future is polled. The call resolves with exactly one response
    /// or one fatal error, while non-fatal cache trouble flows out of the
    /// event stream alongside.
    pub fn request(&self, options: RequestOptions) -> CacheCall {
        let (sink, events) = EventSink::channel();
        let handle = TransportHandle::new();
        let run = CacheRun::new(
            self.transport.clone(),
            self.store.clone(),
            options,
            sink,
            handle,
        );
        CacheCall {
            events,
            future: Box::pin(run.run()),
        }
    }

    /// The wrapped transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<T, S> Clone for RequestCache<T, S> {
    fn clone(&self) -> Self {
        RequestCache {
            transport: self.transport.clone(),
            store: self.store.clone(),
        }
    }
}

impl<T, S> fmt::Debug for RequestCache<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCache").finish_non_exhaustive()
    }
}

/// One in-flight cached request.
///
/// `CacheCall` is itself a future resolving to the response. Callers that
/// want the event side channel split it off first with
/// [`into_parts`](CacheCall::into_parts) and poll the two halves
/// independently.
pub struct CacheCall {
    events: EventStream,
    future: BoxFuture<'static, Result<Response, Error>>,
}

impl CacheCall {
    /// Splits the call into its event stream and its response future.
    pub fn into_parts(self) -> (EventStream, BoxFuture<'static, Result<Response, Error>>) {
        (self.events, self.future)
    }

    /// The event stream for this call.
    ///
    /// Events already emitted stay buffered, so polling late loses nothing.
    pub fn events(&mut self) -> &mut EventStream {
        &mut self.events
    }
}

impl Future for CacheCall {
    type Output = Result<Response, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().future.as_mut().poll(cx)
    }
}

impl fmt::Debug for CacheCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheCall").finish_non_exhaustive()
    }
}
