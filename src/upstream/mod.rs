//! Upstream text generation.
//!
//! The relay treats the generative-text service as one opaque call:
//! `(model, prompt)` in, generated text or a failure out. [`TextGenerator`] is
//! the seam; [`GeminiGenerator`] is the production implementation.

mod gemini;

pub use gemini::{GeminiGenerator, DEFAULT_API_BASE};

use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single upstream call.
///
/// Transport failures, non-2xx statuses and API error bodies are all reported
/// the same way to callers: as an item-level error outcome.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Malformed upstream response: {0}")]
    Malformed(String),

    #[error("No API key configured for the upstream service")]
    MissingCredentials,
}

/// Result of a successful upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Generated text; `None` when the response carried no text.
    pub text: Option<String>,
}

impl Generation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn empty() -> Self {
        Self { text: None }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Issue exactly one generation request for `prompt` using `model`.
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, UpstreamError>;

    fn name(&self) -> &'static str;
}
