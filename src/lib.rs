//! # explain-relay
//!
//! Batch explanation relay: accepts single values or batches of JSON items,
//! asks a generative-text API to explain each one, caches the explanations on
//! content-derived keys, and rotates across a list of model identifiers every
//! N requests to spread load.
//!
//! ## Overview
//!
//! ```text
//! BatchOrchestrator ─► ModelRotator::next_model()
//!        │
//!        └──────────► ExplanationFetcher::fetch(key, value, model)
//!                            │
//!                            ├─► ResponseCache::has / get / put ─► derive_key
//!                            └─► TextGenerator::generate (cache miss only)
//! ```
//!
//! Single-item requests bypass the rotator and use a caller-supplied or
//! default model.
//!
//! ## Guarantees
//!
//! - **Order**: a batch of N items yields exactly N outcomes, outcome *i* for item *i*.
//! - **Sequential**: one upstream request in flight per batch; a cache entry
//!   written for item *i* is visible to item *i + 1*.
//! - **Isolation**: an upstream failure becomes that item's `Error` outcome and
//!   never aborts sibling items.
//! - **Deduplication**: an item whose key is already cached is never sent upstream.
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Key derivation and the response cache |
//! | [`rotation`] | Model rotation bookkeeping |
//! | [`upstream`] | Text-generation seam and the Gemini client |
//! | [`explain`] | Prompt construction and cache-or-generate |
//! | [`batch`] | Sequential batch orchestration |
//! | [`relay`] | Request validation shared by server and CLI |
//! | [`server`] | Axum HTTP routes |
//! | [`config`] | Configuration loading |
//! | [`types`] | Items, outcomes and request/response shapes |

pub mod batch;
pub mod cache;
pub mod config;
pub mod explain;
pub mod relay;
pub mod rotation;
pub mod server;
pub mod types;
pub mod upstream;

pub use batch::{BatchOrchestrator, BatchSummary};
pub use cache::{derive_key, CacheKey, ResponseCache};
pub use config::RelayConfig;
pub use explain::ExplanationFetcher;
pub use relay::Relay;
pub use rotation::ModelRotator;
pub use types::{Item, ItemOutcome, OutcomeStatus};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
