use crate::upstream::UpstreamError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Request field or configuration key that caused the error (e.g., "jsonArray", "config.port")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "batch_orchestrator", "config_loader")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the relay.
///
/// `InvalidInput` and `InvalidConfig` are surfaced to callers before any item
/// is processed. `Upstream` failures are normally folded into a per-item
/// outcome by the fetcher and only escape when calling a generator directly.
/// `NotFound` drives the cache-miss path and is never shown to clients.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {message}{}", format_context(.context))]
    InvalidInput {
        message: String,
        context: ErrorContext,
    },

    #[error("Invalid rotation config: {message}{}", format_context(.context))]
    InvalidConfig {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Upstream failure: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Cache entry not found: {key}")]
    NotFound { key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::invalid_input_with_context(msg, ErrorContext::new())
    }

    /// Create a new input validation error with structured context
    pub fn invalid_input_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidInput {
            message: msg.into(),
            context,
        }
    }

    /// Create a new rotation-parameter error with structured context
    pub fn invalid_config_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidConfig {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration loading error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// The bare message without the rendered context, suitable for client-facing bodies.
    pub fn message(&self) -> String {
        match self {
            Error::InvalidInput { message, .. }
            | Error::InvalidConfig { message, .. }
            | Error::Configuration { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::InvalidInput { context, .. }
            | Error::InvalidConfig { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// True for errors caused by the caller's request rather than by the relay.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput { .. } | Error::InvalidConfig { .. })
    }
}
