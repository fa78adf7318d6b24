#![warn(missing_docs)]
//! # reqcache
//!
//! A transparent caching layer for HTTP-shaped request/response exchanges.
//!
//! [`RequestCache`] wraps a [`Transport`] (anything that can turn a request
//! into a response) and a [`Store`] (anything that can persist bytes under a
//! key) and orchestrates the space between them: key derivation, freshness
//! evaluation via RFC 7234 semantics, conditional revalidation, and
//! non-blocking duplication of live response bodies into the store.
//!
//! Two contracts shape the whole crate:
//!
//! - **Exactly one resolution per call.** Every [`request`] yields one
//!   response or one fatal error, never both, never neither.
//! - **Cache trouble is never fatal.** A broken store or undecodable entry
//!   degrades the call to a plain network request and surfaces on the
//!   call's [`EventStream`]; only transport failures abort the call.
//!
//! ```no_run
//! use reqcache::{MemoryStore, RequestCache, RequestOptions};
//! # use reqcache::{Transport, TransportRequest, TransportResponse, BoxError};
//! # struct Http;
//! # #[async_trait::async_trait]
//! # impl Transport for Http {
//! #     async fn send(&self, _: TransportRequest) -> Result<TransportResponse, BoxError> {
//! #         unimplemented!()
//! #     }
//! # }
//!
//! # async fn run() -> Result<(), reqcache::Error> {
//! let cache = RequestCache::new(Http, MemoryStore::new());
//! let response = cache
//!     .request(RequestOptions::get("http://example.com/resource"))
//!     .await?;
//! println!("from cache: {}", response.from_cache());
//! # Ok(())
//! # }
//! ```
//!
//! [`request`]: RequestCache::request

/// The cache client and its per-call handle.
pub mod client;

/// Fatal error classification.
///
/// Splits failures by origin: [`Error::Request`] for the transport layer,
/// [`Error::Cache`] for everything cache-related that escaped degradation.
pub mod error;

/// The per-call event side channel.
///
/// Each call carries an [`EventStream`] announcing the transport attempt
/// (with its abort handle), non-fatal cache errors, and the final response
/// summary.
pub mod events;

/// The transport seam.
///
/// [`Transport`] is the one trait users implement to plug in an HTTP
/// client; [`TransportHandle`] lets them abort the in-flight attempt.
pub mod transport;

mod body;
mod fsm;
mod policy;

pub use client::{CacheCall, RequestCache};
pub use error::{Aborted, Error};
pub use events::{Event, EventStream, ResponseSummary};
pub use transport::{Transport, TransportHandle, TransportRequest, TransportResponse};

pub use reqcache_core::{
    Body, BodyStream, BoxError, CacheEntry, CacheKey, Hook, Raw, RequestBody, RequestOptions,
    Response, TtlRule,
};
pub use reqcache_store::{DeleteStatus, EntryStore, MemoryStore, Store, StoreError, StoreResult};
