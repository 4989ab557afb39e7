//! Core type definitions.
//!
//! Wire names follow the relay's public JSON contract (`promptKey`,
//! `jsonArray`, `allResponses`, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unit of input. Any JSON value; no schema is imposed.
pub type Item = Value;

/// Reporting key used when an item is not a record or has no fields.
pub const UNKNOWN_KEY: &str = "Unknown Key";

/// Reporting key for an item: its first field name if it is a non-empty record.
pub fn reporting_key(item: &Item) -> String {
    item.as_object()
        .and_then(|obj| obj.keys().next())
        .cloned()
        .unwrap_or_else(|| UNKNOWN_KEY.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// Per-item result record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub key: String,
    pub status: OutcomeStatus,
    #[serde(rename = "model")]
    pub model_used: String,
    /// Explanation text, or the failure description for `Error` outcomes.
    #[serde(rename = "response")]
    pub text: String,
    #[serde(rename = "cached")]
    pub served_from_cache: bool,
}

impl ItemOutcome {
    pub fn success(key: impl Into<String>, model: impl Into<String>, text: impl Into<String>, cached: bool) -> Self {
        Self {
            key: key.into(),
            status: OutcomeStatus::Success,
            model_used: model.into(),
            text: text.into(),
            served_from_cache: cached,
        }
    }

    pub fn error(key: impl Into<String>, model: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: OutcomeStatus::Error,
            model_used: model.into(),
            text: description.into(),
            served_from_cache: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Body of a single explanation request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    /// Any JSON value; non-strings are reported in their compact JSON form.
    #[serde(default)]
    pub prompt_key: Option<Value>,
    /// The value to explain. Missing and `null` are both treated as absent.
    #[serde(default)]
    pub prompt: Option<Value>,
    #[serde(default)]
    pub model_override: Option<String>,
}

/// Body of a batch explanation request.
///
/// Fields stay loosely typed so that shape errors can be reported with the
/// relay's own messages instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub json_array: Value,
    #[serde(default)]
    pub models: Value,
    #[serde(default)]
    pub model_switch_limit: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub all_responses: Vec<ItemOutcome>,
}
