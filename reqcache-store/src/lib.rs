#![warn(missing_docs)]
//! # reqcache-store
//!
//! Store adapter capability for the reqcache caching engine.
//!
//! Persistence is split in two layers, so backends only deal in bytes:
//!
//! - [`Store`]: the raw key/value capability: `read`, `write` with an
//!   optional TTL, `remove`. Implement this for a new backend.
//! - [`EntryStore`]: provided typed operations (`get`/`set`/`delete`) that
//!   handle [`CacheEntry`](reqcache_core::CacheEntry) (de)serialization on
//!   top of any [`Store`].
//!
//! [`MemoryStore`] is the bundled in-memory adapter; network-backed
//! adapters implement [`Store`] in their own crates.

pub mod error;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{DeleteStatus, EntryStore, Store, StoreResult};
