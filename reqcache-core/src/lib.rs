#![warn(missing_docs)]
//! # reqcache-core
//!
//! Core types for the reqcache transparent response caching engine.
//!
//! This crate provides the foundational, I/O-free building blocks shared by
//! the store adapters and the orchestration engine:
//!
//! - **Identify** cached resources ([`CacheKey`])
//! - **Persist** responses ([`CacheEntry`])
//! - **Describe** one call ([`RequestOptions`], [`RequestBody`])
//! - **Deliver** results ([`Response`], [`Body`])
//! - **Transform** bodies before persistence ([`Hook`])
//!
//! The cache-control policy math itself is delegated to
//! [`http_cache_semantics`]; entries carry its [`CachePolicy`] as their
//! stored policy snapshot.
//!
//! [`CachePolicy`]: http_cache_semantics::CachePolicy

pub mod entry;
pub mod hooks;
pub mod key;
pub mod request;
pub mod response;

pub use entry::CacheEntry;
pub use hooks::{BodyTransform, Hook};
pub use key::CacheKey;
pub use request::{RequestBody, RequestOptions, TtlRule};
pub use response::{Body, BodyStream, Response};

/// Raw byte data type used for serialized cache values.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;

/// Type-erased error used at the transport and hook seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
