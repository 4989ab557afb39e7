//! Request-level entry points shared by the HTTP server and the CLI.

use serde_json::Value;
use std::sync::Arc;

use crate::batch::BatchOrchestrator;
use crate::cache::{FileCache, ResponseCache};
use crate::config::RelayConfig;
use crate::explain::{ExplanationFetcher, PromptTemplate};
use crate::rotation::parse_switch_limit;
use crate::types::{BatchRequest, ExplainRequest, ItemOutcome, UNKNOWN_KEY};
use crate::upstream::{GeminiGenerator, TextGenerator};
use crate::{Error, ErrorContext, Result};

#[derive(Clone)]
pub struct Relay {
    orchestrator: BatchOrchestrator,
    default_model: String,
}

impl Relay {
    pub fn new(fetcher: ExplanationFetcher, default_model: impl Into<String>) -> Self {
        Self {
            orchestrator: BatchOrchestrator::new(fetcher),
            default_model: default_model.into(),
        }
    }

    /// File-backed cache under `config.cache_dir` and a Gemini generator.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let generator: Arc<dyn TextGenerator> = Arc::new(GeminiGenerator::from_config(config)?);
        Ok(Self::with_generator(config, generator))
    }

    /// Like [`from_config`](Self::from_config) but with a caller-supplied generator.
    pub fn with_generator(config: &RelayConfig, generator: Arc<dyn TextGenerator>) -> Self {
        let cache = ResponseCache::new(FileCache::new(&config.cache_dir));
        let fetcher = ExplanationFetcher::new(cache, generator)
            .with_prompt(PromptTemplate::new(config.prompt_instruction.clone()));
        Self::new(fetcher, config.default_model.clone())
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn cache(&self) -> &ResponseCache {
        self.orchestrator.fetcher().cache()
    }

    /// Explain one value. Bypasses model rotation.
    pub async fn explain(&self, request: ExplainRequest) -> Result<ItemOutcome> {
        let value = match request.prompt {
            Some(v) if !is_blank(&v) => v,
            _ => {
                return Err(Error::invalid_input_with_context(
                    "Prompt (key value) is required.",
                    ErrorContext::new()
                        .with_field_path("prompt")
                        .with_source("relay"),
                ))
            }
        };
        let key = match request.prompt_key {
            Some(Value::String(key)) => key,
            Some(other) => other.to_string(),
            None => UNKNOWN_KEY.to_string(),
        };
        let model = request
            .model_override
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.default_model.clone());

        Ok(self.orchestrator.fetcher().fetch(&key, &value, &model).await)
    }

    /// Validate a loosely-typed batch request and run it.
    pub async fn explain_batch(&self, request: BatchRequest) -> Result<Vec<ItemOutcome>> {
        let items = match request.json_array {
            Value::Array(items) if !items.is_empty() => items,
            _ => {
                return Err(Error::invalid_input_with_context(
                    "Input must be a non-empty JSON array.",
                    ErrorContext::new()
                        .with_field_path("jsonArray")
                        .with_source("relay"),
                ))
            }
        };
        let models = parse_models(&request.models)?;
        let switch_limit = parse_switch_limit(&request.model_switch_limit)?;
        self.orchestrator.run(&items, models, switch_limit).await
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn parse_models(value: &Value) -> Result<Vec<String>> {
    let required = || {
        Error::invalid_input_with_context(
            "Model list is required.",
            ErrorContext::new()
                .with_field_path("models")
                .with_source("relay"),
        )
    };
    let list = match value {
        Value::Array(list) if !list.is_empty() => list,
        _ => return Err(required()),
    };
    list.iter()
        .enumerate()
        .map(|(i, m)| {
            m.as_str().map(String::from).ok_or_else(|| {
                Error::invalid_input_with_context(
                    "Model identifiers must be strings.",
                    ErrorContext::new()
                        .with_field_path(format!("models[{}]", i))
                        .with_details(m.to_string())
                        .with_source("relay"),
                )
            })
        })
        .collect()
}
