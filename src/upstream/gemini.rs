//! Google Gemini generateContent client.
//!
//! - Request: `POST {base}/models/{model}:generateContent?key=...` with
//!   `{"contents":[{"parts":[{"text": prompt}]}]}`.
//! - Response: `candidates[0].content.parts[0].text`.
//! - Errors arrive as `{"error": {"code", "message", "status"}}`, usually with
//!   a non-2xx status.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{Generation, TextGenerator, UpstreamError};
use crate::config::RelayConfig;
use crate::Result;

/// Gemini v1beta REST API base.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiGenerator {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GeminiGenerator {
    /// Build a client. `timeout` of `None` means calls may wait indefinitely.
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().map_err(UpstreamError::Transport)?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        Self::new(
            config.api_base.clone(),
            config.api_key.clone(),
            config.request_timeout(),
        )
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    fn build_body(prompt: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        })
    }

    /// Interpret a raw response. An `error` object wins over the status code.
    pub(crate) fn parse_response(status: u16, body: &str) -> std::result::Result<Generation, UpstreamError> {
        let success = (200..300).contains(&status);
        let parsed: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) if success => return Err(UpstreamError::Malformed(e.to_string())),
            Err(_) => {
                return Err(UpstreamError::Api {
                    status,
                    message: format!("HTTP {}: {}", status, truncate(body, 200)),
                })
            }
        };

        if let Some(error) = parsed.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .unwrap_or_else(|| format!("API Error: {}", parsed));
            return Err(UpstreamError::Api { status, message });
        }

        if !success {
            return Err(UpstreamError::Api {
                status,
                message: format!("HTTP {}", status),
            });
        }

        let text = parsed
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(String::from);
        Ok(Generation { text })
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, model: &str, prompt: &str) -> std::result::Result<Generation, UpstreamError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredentials)?;

        let resp = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", key)])
            .json(&Self::build_body(prompt))
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!(model, status, bytes = body.len(), "Gemini response received");
        Self::parse_response(status, &body)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_body() {
        let body = GeminiGenerator::build_body("Explain X");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Explain X");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let g = GeminiGenerator::new("http://localhost:1234/v1beta/", None, None).unwrap();
        assert_eq!(
            g.endpoint("gemini-2.0-flash"),
            "http://localhost:1234/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_parse_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hi!"}],"role":"model"},"finishReason":"STOP"}]}"#;
        let g = GeminiGenerator::parse_response(200, body).unwrap();
        assert_eq!(g.text.as_deref(), Some("Hi!"));
    }

    #[test]
    fn test_parse_missing_or_empty_text_is_empty_generation() {
        for body in [
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":""}]},"finishReason":"SAFETY"}]}"#,
            r#"{}"#,
        ] {
            assert_eq!(
                GeminiGenerator::parse_response(200, body).unwrap(),
                Generation::empty()
            );
        }
    }

    #[test]
    fn test_parse_error_object() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        match GeminiGenerator::parse_response(429, body) {
            Err(UpstreamError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_object_without_message() {
        let body = r#"{"error":{"code":500}}"#;
        let err = GeminiGenerator::parse_response(200, body).unwrap_err();
        assert!(err.to_string().starts_with("API Error: "));
    }

    #[test]
    fn test_parse_non_success_without_error_object() {
        let err = GeminiGenerator::parse_response(503, r#"{"candidates":[]}"#).unwrap_err();
        assert!(matches!(err, UpstreamError::Api { status: 503, .. }));

        let err = GeminiGenerator::parse_response(502, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502: <html>Bad Gateway</html>");
    }

    #[test]
    fn test_parse_malformed_success_body() {
        let err = GeminiGenerator::parse_response(200, "not json").unwrap_err();
        assert!(matches!(err, UpstreamError::Malformed(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let g = GeminiGenerator::new(DEFAULT_API_BASE, Some("secret".into()), None).unwrap();
        let dbg = format!("{:?}", g);
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("REDACTED"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let g = GeminiGenerator::new("http://127.0.0.1:9", None, None).unwrap();
        let err = g.generate("m", "p").await.unwrap_err();
        assert!(matches!(err, UpstreamError::MissingCredentials));
    }
}
