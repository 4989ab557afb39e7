//! Relay configuration.
//!
//! Resolution order: built-in defaults, then an optional YAML file, then
//! environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::explain::DEFAULT_INSTRUCTION;
use crate::upstream::DEFAULT_API_BASE;
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Environment variable naming a YAML config file.
pub const CONFIG_PATH_ENV: &str = "EXPLAIN_RELAY_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bind: String,
    pub port: u16,
    /// Root directory for cached explanations.
    pub cache_dir: PathBuf,
    /// Directory served for non-API paths (e.g. the `index.html` front end).
    pub static_dir: Option<PathBuf>,
    /// Model used by single-item requests without an override.
    pub default_model: String,
    pub api_base: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Per-call upstream timeout; 0 disables it.
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
    pub prompt_instruction: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            cache_dir: PathBuf::from("responses"),
            static_dir: None,
            default_model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            request_timeout_secs: 60,
            body_limit_bytes: 50 * 1024 * 1024,
            prompt_instruction: DEFAULT_INSTRUCTION.to_string(),
        }
    }
}

impl RelayConfig {
    /// Defaults, overlaid with `path` (or `$EXPLAIN_RELAY_CONFIG`), overlaid
    /// with the process environment, then validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(p) => Self::from_yaml_file(&p)?,
            None => Self::default(),
        };
        config.apply_env(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to read config file: {}", e),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid config YAML: {}", e),
                ErrorContext::new().with_source("config_loader"),
            )
        })
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("EXPLAIN_RELAY_BIND") {
            self.bind = v;
        }
        if let Some(v) = lookup("EXPLAIN_RELAY_PORT") {
            self.port = parse_env("EXPLAIN_RELAY_PORT", &v)?;
        }
        if let Some(v) = lookup("EXPLAIN_RELAY_CACHE_DIR") {
            self.cache_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("EXPLAIN_RELAY_STATIC_DIR") {
            self.static_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("EXPLAIN_RELAY_DEFAULT_MODEL") {
            self.default_model = v;
        }
        if let Some(v) = lookup("EXPLAIN_RELAY_API_BASE") {
            self.api_base = v;
        }
        if let Some(v) = lookup("EXPLAIN_RELAY_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("EXPLAIN_RELAY_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("EXPLAIN_RELAY_BODY_LIMIT") {
            self.body_limit_bytes = parse_env("EXPLAIN_RELAY_BODY_LIMIT", &v)?;
        }
        if let Some(key) = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("GOOGLE_API_KEY"))
            .filter(|k| !k.is_empty())
        {
            self.api_key = Some(key);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(invalid("port", "port must be non-zero"));
        }
        if self.default_model.trim().is_empty() {
            return Err(invalid("default_model", "default model must not be empty"));
        }
        if let Err(e) = url::Url::parse(&self.api_base) {
            return Err(invalid("api_base", format!("invalid URL '{}': {}", self.api_base, e)));
        }
        if self.body_limit_bytes == 0 {
            return Err(invalid("body_limit_bytes", "body limit must be non-zero"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| {
        Error::configuration_with_context(
            format!("Invalid value for {}: {}", name, e),
            ErrorContext::new()
                .with_field_path(name)
                .with_details(raw.to_string())
                .with_source("config_loader"),
        )
    })
}

fn invalid(field: &str, msg: impl Into<String>) -> Error {
    Error::configuration_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(format!("config.{}", field))
            .with_source("config_loader"),
    )
}
