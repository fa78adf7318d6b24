//! Thin translation layer over the cache-control policy engine.
//!
//! The policy math itself (RFC 7234 freshness, validators, `vary`
//! matching) belongs entirely to [`http_cache_semantics`]. This module maps
//! between that engine and the orchestrator's vocabulary: can a stored
//! entry still cover a request, which conditional headers revalidate it,
//! and did the origin confirm the cached body.
//!
//! Everything here is pure evaluation over supplied data. A failure (an
//! URL the `http` types reject, say) is a cache-origin problem for the
//! caller to report, never a reason to drop the request.

use std::time::SystemTime;

use http::{HeaderMap, HeaderValue, StatusCode};
use http_cache_semantics::{AfterResponse, BeforeRequest, CachePolicy};
use reqcache_core::{BoxError, CacheEntry, RequestOptions};

/// Outcome of evaluating a stored entry against a new request.
pub(crate) enum Freshness {
    /// The entry still covers the request; serve it with these
    /// policy-adjusted response parts.
    Fresh(http::response::Parts),
    /// The entry needs revalidation; issue the transport call with these
    /// request parts (headers carry the validators).
    Stale {
        /// Request parts to re-issue, conditional headers included.
        request: http::request::Parts,
    },
}

/// Outcome of reconciling a revalidation response with its source entry.
pub(crate) enum Revalidation {
    /// Origin confirmed the cached body; serve it under the merged policy
    /// and headers.
    NotModified(CachePolicy, http::response::Parts),
    /// Origin supplied a new authoritative response.
    Modified,
}

/// Builds the `http` request the policy engine evaluates.
///
/// A forced refresh is expressed as `cache-control: no-cache`, which makes
/// the engine bypass freshness and hand back the conditional headers.
pub(crate) fn eval_request(
    options: &RequestOptions,
    force_refresh: bool,
) -> Result<http::Request<()>, BoxError> {
    let mut request = http::Request::builder()
        .method(options.method())
        .uri(options.url())
        .body(())?;
    *request.headers_mut() = options.headers().clone();
    if force_refresh {
        request
            .headers_mut()
            .insert(http::header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    }
    Ok(request)
}

fn eval_response(status: StatusCode, headers: &HeaderMap) -> Result<http::Response<()>, BoxError> {
    let mut response = http::Response::builder().status(status).body(())?;
    *response.headers_mut() = headers.clone();
    Ok(response)
}

/// Whether the stored entry covers `options` without a network call, and if
/// not, which conditional request revalidates it.
pub(crate) fn before(
    entry: &CacheEntry,
    options: &RequestOptions,
    now: SystemTime,
) -> Result<Freshness, BoxError> {
    let request = eval_request(options, options.is_force_refresh())?;
    match entry.policy.before_request(&request, now) {
        BeforeRequest::Fresh(parts) => Ok(Freshness::Fresh(parts)),
        BeforeRequest::Stale { request, .. } => Ok(Freshness::Stale { request }),
    }
}

/// Reconciles a revalidation response against the entry it was issued for.
pub(crate) fn reconcile(
    entry: &CacheEntry,
    status: StatusCode,
    headers: &HeaderMap,
    options: &RequestOptions,
    now: SystemTime,
) -> Result<Revalidation, BoxError> {
    let request = eval_request(options, false)?;
    let response = eval_response(status, headers)?;
    match entry.policy.after_response(&request, &response, now) {
        AfterResponse::NotModified(policy, parts) => Ok(Revalidation::NotModified(policy, parts)),
        AfterResponse::Modified(_, _) => Ok(Revalidation::Modified),
    }
}

/// Builds the policy snapshot for a fresh network response.
pub(crate) fn response_policy(
    options: &RequestOptions,
    status: StatusCode,
    headers: &HeaderMap,
) -> Result<CachePolicy, BoxError> {
    let request = eval_request(options, false)?;
    let response = eval_response(status, headers)?;
    Ok(CachePolicy::new(&request, &response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(cache_control: &str, etag: Option<&str>) -> CacheEntry {
        let options = RequestOptions::get("http://example.com/a");
        let request = eval_request(&options, false).unwrap();
        let mut builder = http::Response::builder()
            .status(200)
            .header("cache-control", cache_control);
        if let Some(etag) = etag {
            builder = builder.header("etag", etag);
        }
        let response = builder.body(()).unwrap();
        CacheEntry::new(
            CachePolicy::new(&request, &response),
            "http://example.com/a",
            StatusCode::OK,
            bytes::Bytes::from_static(b"body"),
        )
    }

    #[test]
    fn fresh_entry_is_served_without_network() {
        let entry = entry("max-age=60", None);
        let options = RequestOptions::get("http://example.com/a");
        match before(&entry, &options, SystemTime::now()).unwrap() {
            Freshness::Fresh(parts) => assert_eq!(parts.status, StatusCode::OK),
            Freshness::Stale { .. } => panic!("expected fresh"),
        }
    }

    #[test]
    fn stale_entry_yields_conditional_headers() {
        let entry = entry("max-age=0", Some("\"v1\""));
        let options = RequestOptions::get("http://example.com/a");
        match before(&entry, &options, SystemTime::now()).unwrap() {
            Freshness::Stale { request } => {
                assert_eq!(
                    request.headers.get("if-none-match").map(|v| v.as_bytes()),
                    Some(b"\"v1\"".as_ref())
                );
            }
            Freshness::Fresh(_) => panic!("expected stale"),
        }
    }

    #[test]
    fn force_refresh_bypasses_freshness() {
        let entry = entry("max-age=60", Some("\"v1\""));
        let options = RequestOptions::get("http://example.com/a").force_refresh(true);
        assert!(matches!(
            before(&entry, &options, SystemTime::now()).unwrap(),
            Freshness::Stale { .. }
        ));
    }

    #[test]
    fn not_modified_is_recognized() {
        let entry = entry("max-age=0", Some("\"v1\""));
        let options = RequestOptions::get("http://example.com/a");
        let mut headers = HeaderMap::new();
        headers.insert("etag", HeaderValue::from_static("\"v1\""));
        match reconcile(
            &entry,
            StatusCode::NOT_MODIFIED,
            &headers,
            &options,
            SystemTime::now(),
        )
        .unwrap()
        {
            Revalidation::NotModified(_, parts) => assert_eq!(parts.status, StatusCode::OK),
            Revalidation::Modified => panic!("expected not-modified"),
        }
    }

    #[test]
    fn changed_origin_is_authoritative() {
        let entry = entry("max-age=0", Some("\"v1\""));
        let options = RequestOptions::get("http://example.com/a");
        let mut headers = HeaderMap::new();
        headers.insert("etag", HeaderValue::from_static("\"v2\""));
        headers.insert("cache-control", HeaderValue::from_static("max-age=60"));
        assert!(matches!(
            reconcile(&entry, StatusCode::OK, &headers, &options, SystemTime::now()).unwrap(),
            Revalidation::Modified
        ));
    }
}
