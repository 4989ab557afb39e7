//! # Batch Explanation Module
//!
//! Turns an ordered list of items into a sequence of explanation fetches,
//! rotating the model every `switch_limit` items and collecting one
//! [`ItemOutcome`](crate::types::ItemOutcome) per item, in input order.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BatchOrchestrator`] | Validates the batch and drives the sequential loop |
//! | [`BatchSummary`] | Success/failure/cache-hit counts for a finished batch |
//!
//! ## Example
//!
//! ```rust,no_run
//! use explain_relay::batch::BatchOrchestrator;
//! use explain_relay::cache::{FileCache, ResponseCache};
//! use explain_relay::explain::ExplanationFetcher;
//! use explain_relay::upstream::GeminiGenerator;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn demo() -> explain_relay::Result<()> {
//! let generator = GeminiGenerator::new(
//!     explain_relay::upstream::DEFAULT_API_BASE,
//!     std::env::var("GEMINI_API_KEY").ok(),
//!     None,
//! )?;
//! let fetcher = ExplanationFetcher::new(
//!     ResponseCache::new(FileCache::new("responses")),
//!     Arc::new(generator),
//! );
//! let outcomes = BatchOrchestrator::new(fetcher)
//!     .run(
//!         &[json!({"Aspirin": "NSAID"}), json!({"Insulin": "Hormone"})],
//!         vec!["gemini-2.0-flash-lite".into(), "gemini-2.0-flash".into()],
//!         10,
//!     )
//!     .await?;
//! assert_eq!(outcomes.len(), 2);
//! # Ok(())
//! # }
//! ```

mod orchestrator;
mod summary;

pub use orchestrator::BatchOrchestrator;
pub use summary::BatchSummary;
