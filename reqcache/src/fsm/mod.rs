//! The orchestration state machine.
//!
//! One [`CacheRun`] exists per call. It walks the states in
//! [`states::State`], consulting the store and the policy engine, and
//! resolves with exactly one response. Cache-origin failures are reported
//! through the event sink and degrade the run to a plain network call;
//! only transport-origin failures are fatal.
//!
//! The store write runs as a spawned continuation racing the transport's
//! abort signal, so delivery to the caller is never delayed by persistence
//! and a canceled request cannot strand the write.

pub(crate) mod states;

use std::sync::Arc;
use std::time::SystemTime;

use http::{HeaderMap, StatusCode};
use http_cache_semantics::CachePolicy;
use reqcache_core::{Body, CacheEntry, CacheKey, Hook, RequestOptions, Response, TtlRule};
use reqcache_store::{EntryStore, Store};
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::body::{tee, BufferedBody};
use crate::error::{Aborted, Error};
use crate::events::{EventSink, ResponseSummary};
use crate::policy::{self, Freshness, Revalidation};
use crate::transport::{Transport, TransportHandle, TransportRequest, TransportResponse};
use states::{RunState, State};

/// One orchestration run.
pub(crate) struct CacheRun<T, S> {
    transport: Arc<T>,
    store: Arc<S>,
    options: RequestOptions,
    sink: EventSink,
    handle: TransportHandle,
    run: RunState,
}

impl<T, S> CacheRun<T, S>
where
    T: Transport + 'static,
    S: Store + 'static,
{
    pub(crate) fn new(
        transport: Arc<T>,
        store: Arc<S>,
        options: RequestOptions,
        sink: EventSink,
        handle: TransportHandle,
    ) -> Self {
        let key = CacheKey::derive(options.method(), options.url(), options.peek_body());
        CacheRun {
            transport,
            store,
            options,
            sink,
            handle,
            run: RunState::new(key),
        }
    }

    /// Drives the state machine to completion, applying automatic failover
    /// when configured and the failure happened before any transport call.
    pub(crate) async fn run(mut self) -> Result<Response, Error> {
        match self.drive().await {
            Ok(response) => {
                self.finish(&response);
                Ok(response)
            }
            Err(error) => {
                self.sink.error(error.clone());
                if self.options.is_automatic_failover() && !self.run.attempted {
                    warn!(key = %self.run.key, "orchestration failed before any request, trying a direct call");
                    match self.failover().await {
                        Ok(response) => {
                            self.finish(&response);
                            Ok(response)
                        }
                        Err(fallback) => {
                            self.sink.error(fallback.clone());
                            Err(fallback)
                        }
                    }
                } else {
                    Err(error)
                }
            }
        }
    }

    fn finish(&self, response: &Response) {
        self.sink.response(ResponseSummary {
            status: response.status(),
            from_cache: response.from_cache(),
            key: self.run.key.clone(),
        });
    }

    async fn drive(&mut self) -> Result<Response, Error> {
        if self.options.cache_allowed() {
            // The policy engine evaluates requests as http types; an
            // unrepresentable request fails here, before any store access.
            policy::eval_request(&self.options, false).map_err(Error::request)?;
        }
        let mut state = State::Lookup;
        loop {
            debug!(state = ?state, key = %self.run.key, "entering state");
            state = match state {
                State::Lookup => self.lookup().await,
                State::Fresh { entry, parts } => Self::fresh(entry, parts),
                State::Revalidate { entry, headers } => State::Requesting {
                    revalidation: Some(entry),
                    headers,
                },
                State::Miss => State::Requesting {
                    revalidation: None,
                    headers: self.options.headers().clone(),
                },
                State::Requesting {
                    revalidation,
                    headers,
                } => self.requesting(revalidation, headers).await?,
                State::Done(response) => return Ok(response),
            };
        }
    }

    async fn lookup(&mut self) -> State {
        if !self.options.cache_allowed() {
            return State::Miss;
        }
        let entry = match self.store.get(&self.run.key).await {
            Ok(entry) => entry,
            Err(error) => {
                self.sink.error(Error::cache(error));
                None
            }
        };
        let Some(entry) = entry else {
            return State::Miss;
        };

        let now = SystemTime::now();
        if self.options.is_force_refresh() && entry.policy.time_to_live(now).is_zero() {
            // A forced refresh must not race against expiring cache data.
            match self.store.delete(&self.run.key).await {
                Ok(deleted) => {
                    debug!(key = %self.run.key, ?deleted, "dropped expired entry before refresh");
                }
                Err(error) => self.sink.error(Error::cache(error)),
            }
            return State::Miss;
        }

        match policy::before(&entry, &self.options, now) {
            Ok(Freshness::Fresh(parts)) => State::Fresh { entry, parts },
            Ok(Freshness::Stale { request }) => State::Revalidate {
                entry,
                headers: request.headers,
            },
            Err(error) => {
                self.sink.error(Error::cache(error));
                State::Miss
            }
        }
    }

    fn fresh(entry: CacheEntry, parts: http::response::Parts) -> State {
        let CacheEntry { policy, body, .. } = entry;
        State::Done(Response::new(
            parts.status,
            parts.headers,
            Body::Full(body),
            true,
            Some(policy),
        ))
    }

    async fn requesting(
        &mut self,
        revalidation: Option<CacheEntry>,
        headers: HeaderMap,
    ) -> Result<State, Error> {
        self.run.attempted = true;
        self.sink.request(self.handle.clone());
        // Taking the body consumes the stream-body marker, so the caching
        // decision must be snapshotted first.
        let cache_allowed = self.options.cache_allowed();
        let request = TransportRequest {
            method: SmolStr::new(self.options.method()),
            url: self.options.url().to_owned(),
            headers,
            body: self.options.take_body(),
        };
        let response = tokio::select! {
            sent = self.transport.send(request) => sent.map_err(Error::request)?,
            _ = self.handle.aborted() => return Err(Error::request(Aborted)),
        };

        let now = SystemTime::now();
        let had_source = revalidation.is_some();

        if let Some(entry) = revalidation {
            match policy::reconcile(&entry, response.status, &response.headers, &self.options, now)
            {
                Ok(Revalidation::NotModified(policy, parts)) => {
                    debug!(key = %self.run.key, "origin confirmed cached body");
                    return Ok(State::Done(Response::new(
                        parts.status,
                        parts.headers,
                        Body::Full(entry.body),
                        true,
                        Some(policy),
                    )));
                }
                Ok(Revalidation::Modified) => {}
                Err(error) => self.sink.error(Error::cache(error)),
            }
        }

        let TransportResponse {
            status,
            headers,
            body,
        } = response;

        if !cache_allowed {
            return Ok(State::Done(Response::new(
                status,
                headers,
                Body::Streaming(body),
                false,
                None,
            )));
        }

        let policy = match policy::response_policy(&self.options, status, &headers) {
            Ok(policy) => Some(policy),
            Err(error) => {
                self.sink.error(Error::cache(error));
                None
            }
        };

        match policy {
            Some(policy) if policy.is_storable() => {
                let (caller_body, buffered) = tee(body);
                self.spawn_write(policy.clone(), status, buffered);
                Ok(State::Done(Response::new(
                    status,
                    headers,
                    caller_body,
                    false,
                    Some(policy),
                )))
            }
            policy => {
                if had_source {
                    // The origin superseded the entry we revalidated with a
                    // non-storable outcome; do not leave it behind.
                    match self.store.delete(&self.run.key).await {
                        Ok(deleted) => {
                            debug!(key = %self.run.key, ?deleted, "removed superseded entry");
                        }
                        Err(error) => self.sink.error(Error::cache(error)),
                    }
                }
                Ok(State::Done(Response::new(
                    status,
                    headers,
                    Body::Streaming(body),
                    false,
                    policy,
                )))
            }
        }
    }

    fn spawn_write(&self, policy: CachePolicy, status: StatusCode, buffered: BufferedBody) {
        let store = self.store.clone();
        let key = self.run.key.clone();
        let handle = self.handle.clone();
        let sink = self.sink.clone();
        let hooks = self.options.hooks().to_vec();
        let ttl_rule = self.options.ttl_rule();
        let url = self.options.url().to_owned();
        tokio::spawn(write_entry(
            store, key, handle, sink, hooks, ttl_rule, policy, url, status, buffered,
        ));
    }

    async fn failover(&mut self) -> Result<Response, Error> {
        self.run.attempted = true;
        self.sink.request(self.handle.clone());
        let request = TransportRequest {
            method: SmolStr::new(self.options.method()),
            url: self.options.url().to_owned(),
            headers: self.options.headers().clone(),
            body: self.options.take_body(),
        };
        let response = tokio::select! {
            sent = self.transport.send(request) => sent.map_err(Error::request)?,
            _ = self.handle.aborted() => return Err(Error::request(Aborted)),
        };
        Ok(Response::new(
            response.status,
            response.headers,
            Body::Streaming(response.body),
            false,
            None,
        ))
    }
}

/// The background store-write continuation.
///
/// Races the body buffer against the abort signal, applies storage hooks in
/// order, computes the TTL at write time, and persists. Failures surface as
/// cache errors on the event channel; the caller's response is long gone by
/// then and stays unaffected.
#[allow(clippy::too_many_arguments)]
async fn write_entry<S: Store + 'static>(
    store: Arc<S>,
    key: CacheKey,
    handle: TransportHandle,
    sink: EventSink,
    hooks: Vec<Hook>,
    ttl_rule: TtlRule,
    policy: CachePolicy,
    url: String,
    status: StatusCode,
    buffered: BufferedBody,
) {
    let body = tokio::select! {
        body = buffered.wait() => body,
        _ = handle.aborted() => None,
    };
    let Some(mut body) = body else {
        debug!(key = %key, "request ended before the body completed, skipping write");
        return;
    };
    for hook in &hooks {
        body = match hook.apply(body) {
            Ok(body) => body,
            Err(error) => {
                warn!(key = %key, hook = hook.name(), "storage hook failed");
                sink.error(Error::cache(error));
                return;
            }
        };
    }
    let freshness = policy.time_to_live(SystemTime::now());
    let ttl = ttl_rule.apply(freshness);
    let entry = CacheEntry::new(policy, url, status, body);
    match store.set(&key, &entry, ttl).await {
        Ok(()) => debug!(key = %key, ?ttl, "entry written"),
        Err(error) => sink.error(Error::cache(error)),
    }
}
