//! # Response Caching Module
//!
//! Content-addressed storage for generated explanations. Every explanation is
//! stored under a key derived purely from the item's content, so repeated
//! items (within a batch or across requests) never hit the upstream API twice.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`derive_key`] | Readable, filesystem-safe key from an item's canonical form |
//! | [`ResponseCache`] | `has`/`get`/`put` over a backend, with hit/miss statistics |
//! | [`CacheBackend`] | Trait for storage backends |
//! | [`FileCache`] | One `<key>.txt` file per entry under a root directory |
//! | [`MemoryCache`] | In-process backend for tests |
//!
//! ## Example
//!
//! ```rust
//! use explain_relay::cache::{derive_key, MemoryCache, ResponseCache};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let cache = ResponseCache::new(MemoryCache::new());
//! let key = derive_key(&json!({"Aspirin": "NSAID"}));
//! cache.put(&key, "Aspirin is a non-steroidal anti-inflammatory drug.").await?;
//! assert!(cache.has(&key).await?);
//! # Ok::<(), explain_relay::Error>(())
//! # }).unwrap();
//! ```
//!
//! Entries are not scoped by model: an explanation produced by one model is
//! served for the same item regardless of which model is requested later.

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, FileCache, MemoryCache};
pub use key::{canonicalize, derive_key, CacheKey, MAX_KEY_LEN};
pub use manager::{CacheStats, ResponseCache};
