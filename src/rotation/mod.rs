//! Model rotation.
//!
//! A batch spreads its upstream calls across a fixed list of model
//! identifiers: the first `switch_limit` items use the first model, the next
//! `switch_limit` the second, and so on, wrapping around at the end of the
//! list. This module is pure bookkeeping and performs no I/O.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rotation bookkeeping.
///
/// Invariants: `current_index < models.len()` and
/// `uses_on_current <= switch_limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRotationState {
    pub models: Vec<String>,
    pub switch_limit: usize,
    pub current_index: usize,
    pub uses_on_current: usize,
}

/// Yields the model for each item of a batch.
///
/// Call [`next_model`](Self::next_model) before dispatching an item and
/// [`advance`](Self::advance) once it has produced an outcome.
#[derive(Debug, Clone)]
pub struct ModelRotator {
    state: ModelRotationState,
}

impl ModelRotator {
    pub fn new(models: Vec<String>, switch_limit: usize) -> Result<Self> {
        if models.is_empty() {
            return Err(Error::invalid_config_with_context(
                "Model list is required.",
                ErrorContext::new()
                    .with_field_path("models")
                    .with_source("model_rotator"),
            ));
        }
        if let Some(pos) = models.iter().position(|m| m.trim().is_empty()) {
            return Err(Error::invalid_config_with_context(
                "Model identifiers must not be blank.",
                ErrorContext::new()
                    .with_field_path(format!("models[{}]", pos))
                    .with_source("model_rotator"),
            ));
        }
        if switch_limit == 0 {
            return Err(Error::invalid_config_with_context(
                "Model switch limit must be a positive integer.",
                ErrorContext::new()
                    .with_field_path("modelSwitchLimit")
                    .with_details("got 0")
                    .with_source("model_rotator"),
            ));
        }
        Ok(Self {
            state: ModelRotationState {
                models,
                switch_limit,
                current_index: 0,
                uses_on_current: 0,
            },
        })
    }

    /// Model at the current index, without rotating.
    pub fn current(&self) -> &str {
        &self.state.models[self.state.current_index]
    }

    /// Rotate if the previous items used up the current model's allowance,
    /// then return the model to use for the next item.
    pub fn next_model(&mut self) -> &str {
        if self.state.uses_on_current >= self.state.switch_limit {
            self.state.current_index = (self.state.current_index + 1) % self.state.models.len();
            self.state.uses_on_current = 0;
            if self.state.models.len() > 1 {
                tracing::info!(model = %self.current(), "Model rotation point reached");
            }
        }
        self.current()
    }

    /// Record one dispatched item against the current model.
    pub fn advance(&mut self) {
        self.state.uses_on_current = (self.state.uses_on_current + 1).min(self.state.switch_limit);
    }

    pub fn state(&self) -> &ModelRotationState {
        &self.state
    }
}

/// Parse a switch limit from a request field.
///
/// Accepts a positive JSON integer or a string holding one (surrounding
/// whitespace allowed). Anything else is [`Error::InvalidConfig`].
pub fn parse_switch_limit(value: &Value) -> Result<usize> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    match parsed {
        Some(limit) if limit > 0 => Ok(limit),
        _ => Err(Error::invalid_config_with_context(
            "Model switch limit must be a positive integer.",
            ErrorContext::new()
                .with_field_path("modelSwitchLimit")
                .with_details(format!("got {}", value))
                .with_source("model_rotator"),
        )),
    }
}
