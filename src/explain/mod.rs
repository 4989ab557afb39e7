//! Explanation fetching: prompt construction plus cache-or-generate.

mod fetcher;
mod prompt;

pub use fetcher::{ExplanationFetcher, EMPTY_RESPONSE};
pub use prompt::{PromptTemplate, DEFAULT_INSTRUCTION};
