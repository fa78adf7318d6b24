//! Per-call request options.
//!
//! [`RequestOptions`] is the immutable input to one orchestration run: the
//! target resource, headers, optional body, and the caching controls. The
//! body is taken out exactly once, when the transport call is issued.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use smol_str::SmolStr;

use crate::hooks::Hook;
use crate::response::BodyStream;

/// A request body, either fully buffered or streamed.
///
/// Streamed bodies cannot be rewound to compute a content hash without
/// consuming them, so a stream body forces caching off for its call.
pub enum RequestBody {
    /// Fully buffered body bytes.
    Full(Bytes),
    /// A byte stream handed through to the transport untouched.
    Stream(BodyStream),
}

impl RequestBody {
    /// Whether this body is a stream.
    pub fn is_stream(&self) -> bool {
        matches!(self, RequestBody::Stream(_))
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Full(bytes) => {
                f.debug_tuple("RequestBody::Full").field(&bytes.len()).finish()
            }
            RequestBody::Stream(_) => f.write_str("RequestBody::Stream"),
        }
    }
}

/// How a stored entry's TTL is computed from the policy freshness lifetime.
///
/// With `strict` set, the stored TTL is the policy-computed lifetime capped
/// by `max` when present. Without `strict`, the TTL is `max` when set and
/// otherwise omitted, leaving the entry under the store's own default
/// lifetime policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtlRule {
    /// Pin the stored TTL to the policy freshness lifetime.
    pub strict: bool,
    /// Upper bound on the stored TTL.
    pub max: Option<Duration>,
}

impl TtlRule {
    /// Resolves the TTL to persist alongside an entry.
    pub fn apply(&self, freshness: Duration) -> Option<Duration> {
        if self.strict {
            Some(self.max.map_or(freshness, |max| freshness.min(max)))
        } else {
            self.max
        }
    }
}

/// Options for one cached request.
///
/// Built with a fluent builder; header names are normalized to lowercase by
/// construction ([`HeaderName`] is always lowercase).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use reqcache_core::RequestOptions;
///
/// let options = RequestOptions::get("http://example.com/a")
///     .header("accept", "application/json")
///     .strict_ttl(true)
///     .max_ttl(Duration::from_secs(30));
/// assert_eq!(options.method(), "GET");
/// assert!(options.cache_allowed());
/// ```
#[derive(Debug)]
pub struct RequestOptions {
    method: SmolStr,
    url: String,
    headers: HeaderMap,
    body: Option<RequestBody>,
    cache: bool,
    strict_ttl: bool,
    max_ttl: Option<Duration>,
    force_refresh: bool,
    automatic_failover: bool,
    hooks: Vec<Hook>,
}

impl RequestOptions {
    /// Creates options for the given method and caller-normalized URL.
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        RequestOptions {
            method: SmolStr::new(method.to_ascii_uppercase()),
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            cache: true,
            strict_ttl: false,
            max_ttl: None,
            force_refresh: false,
            automatic_failover: false,
            hooks: Vec::new(),
        }
    }

    /// Creates GET options, the common case.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Adds a header. Invalid names or values are silently dropped, matching
    /// the permissive mapping input this layer accepts.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets a fully buffered request body.
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(RequestBody::Full(body));
        self
    }

    /// Sets a streamed request body. This disables caching for the call.
    pub fn body_stream(mut self, stream: BodyStream) -> Self {
        self.body = Some(RequestBody::Stream(stream));
        self
    }

    /// Master cache switch for this call (default `true`).
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Pin stored TTLs to the policy freshness lifetime (default `false`).
    pub fn strict_ttl(mut self, strict: bool) -> Self {
        self.strict_ttl = strict;
        self
    }

    /// Upper bound on stored TTLs.
    pub fn max_ttl(mut self, max: Duration) -> Self {
        self.max_ttl = Some(max);
        self
    }

    /// Bypass still-fresh entries, forcing revalidation or refetch.
    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    /// Fall back to one bare network attempt when orchestration fails
    /// before any transport call was made.
    pub fn automatic_failover(mut self, failover: bool) -> Self {
        self.automatic_failover = failover;
        self
    }

    /// Appends a storage-path body transform, applied in insertion order
    /// before persistence. Never applied to the body delivered to the
    /// caller.
    pub fn hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Uppercased request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Target URL as supplied by the caller.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The request body, if still present.
    pub fn peek_body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Takes the body out for the transport call. Subsequent calls return
    /// `None`.
    pub fn take_body(&mut self) -> Option<RequestBody> {
        self.body.take()
    }

    /// Whether caching participates in this call: the master switch is on
    /// and the body, if any, is not a stream.
    pub fn cache_allowed(&self) -> bool {
        self.cache && !self.body.as_ref().is_some_and(RequestBody::is_stream)
    }

    /// Whether a forced refresh was requested.
    pub fn is_force_refresh(&self) -> bool {
        self.force_refresh
    }

    /// Whether automatic failover is configured.
    pub fn is_automatic_failover(&self) -> bool {
        self.automatic_failover
    }

    /// The TTL computation rule for stored entries.
    pub fn ttl_rule(&self) -> TtlRule {
        TtlRule {
            strict: self.strict_ttl,
            max: self.max_ttl,
        }
    }

    /// Storage-path hooks in application order.
    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_are_lowercased() {
        let options = RequestOptions::get("http://example.com/").header("X-Custom", "1");
        assert!(options.headers().contains_key("x-custom"));
    }

    #[test]
    fn stream_body_disables_caching() {
        let options = RequestOptions::new("POST", "http://example.com/submit")
            .body_stream(Box::pin(futures::stream::empty()));
        assert!(!options.cache_allowed());

        let options = RequestOptions::new("POST", "http://example.com/submit")
            .body(Bytes::from_static(b"x=1"));
        assert!(options.cache_allowed());
    }

    #[test]
    fn cache_switch_wins() {
        let options = RequestOptions::get("http://example.com/").cache(false);
        assert!(!options.cache_allowed());
    }

    #[test]
    fn strict_ttl_is_capped_by_max_ttl() {
        let rule = TtlRule {
            strict: true,
            max: Some(Duration::from_secs(30)),
        };
        assert_eq!(rule.apply(Duration::from_secs(60)), Some(Duration::from_secs(30)));
        assert_eq!(rule.apply(Duration::from_secs(10)), Some(Duration::from_secs(10)));
    }

    #[test]
    fn loose_ttl_defers_to_store() {
        let rule = TtlRule::default();
        assert_eq!(rule.apply(Duration::from_secs(60)), None);

        let bounded = TtlRule {
            strict: false,
            max: Some(Duration::from_secs(30)),
        };
        assert_eq!(bounded.apply(Duration::from_secs(60)), Some(Duration::from_secs(30)));
    }

    #[test]
    fn body_is_taken_once() {
        let mut options =
            RequestOptions::new("POST", "http://example.com/").body(Bytes::from_static(b"x"));
        assert!(options.take_body().is_some());
        assert!(options.take_body().is_none());
    }
}
