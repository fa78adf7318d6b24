//! Orchestration states.

use http::HeaderMap;
use reqcache_core::{CacheEntry, CacheKey, Response};

/// The per-call state machine.
///
/// ```text
/// Lookup → {Fresh, Revalidate, Miss} → Requesting → Done
/// ```
///
/// The store/delete/skip outcome of `Requesting` is resolved inside that
/// transition: the store write continues in the background after `Done`.
/// Failures exit the loop as errors instead of a state.
pub(crate) enum State {
    /// Derive the key and consult the store.
    Lookup,
    /// A stored entry covers the request; serve it without the network.
    Fresh {
        /// The covering entry.
        entry: CacheEntry,
        /// Policy-adjusted response parts to serve.
        parts: http::response::Parts,
    },
    /// A stored entry needs origin confirmation.
    Revalidate {
        /// The entry being revalidated.
        entry: CacheEntry,
        /// Full outbound header set, validators included.
        headers: HeaderMap,
    },
    /// Nothing usable in the store; go to the network.
    Miss,
    /// Issue the transport call.
    Requesting {
        /// The revalidation source entry, when one exists.
        revalidation: Option<CacheEntry>,
        /// Outbound headers for the call.
        headers: HeaderMap,
    },
    /// Terminal: exactly one response per call.
    Done(Response),
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Lookup => f.write_str("State::Lookup"),
            State::Fresh { .. } => f.write_str("State::Fresh"),
            State::Revalidate { .. } => f.write_str("State::Revalidate"),
            State::Miss => f.write_str("State::Miss"),
            State::Requesting { .. } => f.write_str("State::Requesting"),
            State::Done(_) => f.write_str("State::Done"),
        }
    }
}

/// Cross-transition call state.
#[derive(Debug)]
pub(crate) struct RunState {
    /// The derived cache key for this call.
    pub key: CacheKey,
    /// Whether a transport call was actually issued. Governs automatic
    /// failover, which fires at most once and only pre-attempt.
    pub attempted: bool,
}

impl RunState {
    pub(crate) fn new(key: CacheKey) -> Self {
        RunState {
            key,
            attempted: false,
        }
    }
}
