//! Cache key derivation.
//!
//! A [`CacheKey`] identifies one cacheable resource. Keys are derived from
//! the request method, the caller-normalized URL, and, for mutating methods
//! carrying a buffered body, a content hash of the body bytes:
//!
//! ```text
//! METHOD:url[:sha256hex(body)]
//! ```
//!
//! Two requests that would observe the same cached response must collide on
//! the same key; POST/PATCH/PUT requests with different bodies must not.
//! A streamed body cannot be hashed without consuming it, so no hash segment
//! is produced for streams; callers disable caching for those requests
//! instead (see [`RequestOptions::cache_allowed`]).
//!
//! ## Performance
//!
//! [`CacheKey`] keeps its data behind an `Arc`, so cloning a key only bumps
//! a reference count. The method segment uses [`SmolStr`] which stores short
//! strings inline without heap allocation.
//!
//! [`RequestOptions::cache_allowed`]: crate::request::RequestOptions::cache_allowed

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use smol_str::SmolStr;

use crate::request::RequestBody;

/// Methods whose body content participates in the cache key.
const BODY_HASHED_METHODS: [&str; 3] = ["POST", "PATCH", "PUT"];

#[derive(Debug, Eq, PartialEq, Hash)]
struct CacheKeyInner {
    method: SmolStr,
    url: String,
    body_hash: Option<String>,
}

/// A cache key identifying a cached response.
///
/// # Cheap Cloning
///
/// `CacheKey` wraps its data in [`Arc`], making `clone()` an O(1) operation.
/// Keys are passed around freely during orchestration and used directly as
/// map keys by in-memory stores.
///
/// # Example
///
/// ```
/// use reqcache_core::CacheKey;
///
/// let key = CacheKey::derive("get", "http://example.com/a?q=1", None);
/// assert_eq!(key.to_string(), "GET:http://example.com/a?q=1");
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CacheKey {
    inner: Arc<CacheKeyInner>,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.inner.method, self.inner.url)?;
        if let Some(hash) = &self.inner.body_hash {
            write!(f, ":{hash}")?;
        }
        Ok(())
    }
}

impl CacheKey {
    /// Derives a cache key from a request's method, normalized URL and body.
    ///
    /// The method is uppercased. For POST/PATCH/PUT with a buffered body the
    /// SHA-256 hex digest of the body bytes is appended; a streamed body
    /// contributes nothing (the key is still well formed, but callers must
    /// not cache such requests).
    pub fn derive(method: &str, url: &str, body: Option<&RequestBody>) -> Self {
        let method = SmolStr::new(method.to_ascii_uppercase());
        let body_hash = match body {
            Some(RequestBody::Full(bytes)) if BODY_HASHED_METHODS.contains(&method.as_str()) => {
                Some(hex::encode(Sha256::digest(bytes)))
            }
            _ => None,
        };
        CacheKey {
            inner: Arc::new(CacheKeyInner {
                method,
                url: url.to_owned(),
                body_hash,
            }),
        }
    }

    /// Returns the uppercased method segment.
    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// Returns the URL segment.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Returns the body content hash segment, if any.
    pub fn body_hash(&self) -> Option<&str> {
        self.inner.body_hash.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn identical_get_urls_collide() {
        let a = CacheKey::derive("GET", "http://example.com/a", None);
        let b = CacheKey::derive("get", "http://example.com/a", None);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "GET:http://example.com/a");
    }

    #[test]
    fn query_and_host_differences_split_keys() {
        let a = CacheKey::derive("GET", "http://example.com/a?q=1", None);
        let b = CacheKey::derive("GET", "http://example.com/a?q=2", None);
        let c = CacheKey::derive("GET", "http://other.example.com/a?q=1", None);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn post_bodies_are_hashed() {
        let one = RequestBody::Full(Bytes::from_static(b"x=1"));
        let two = RequestBody::Full(Bytes::from_static(b"x=2"));
        let a = CacheKey::derive("POST", "http://example.com/submit", Some(&one));
        let b = CacheKey::derive("POST", "http://example.com/submit", Some(&two));
        assert_ne!(a, b);

        let again = CacheKey::derive("POST", "http://example.com/submit", Some(&one));
        assert_eq!(a, again);
        assert!(a.body_hash().is_some());
    }

    #[test]
    fn get_body_is_ignored() {
        let body = RequestBody::Full(Bytes::from_static(b"payload"));
        let key = CacheKey::derive("GET", "http://example.com/a", Some(&body));
        assert!(key.body_hash().is_none());
    }

    #[test]
    fn stream_body_produces_no_hash() {
        let stream = RequestBody::Stream(Box::pin(futures::stream::empty()));
        let key = CacheKey::derive("POST", "http://example.com/submit", Some(&stream));
        assert!(key.body_hash().is_none());
        assert_eq!(key.to_string(), "POST:http://example.com/submit");
    }
}
