//! Cache key derivation.
//!
//! Keys are readable filename fragments, not digests: the first
//! [`MAX_KEY_LEN`] characters of the value's canonical form, with everything
//! outside `[A-Za-z0-9_]` replaced by `_`, lower-cased. Distinct long values
//! sharing a 50-character prefix alias to the same key.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upper bound on key length, in characters.
pub const MAX_KEY_LEN: usize = 50;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("static pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive a key from an already-canonicalized string.
    pub fn from_canonical(canonical: &str) -> Self {
        let prefix: String = canonical.chars().take(MAX_KEY_LEN).collect();
        Self(UNSAFE_CHARS.replace_all(&prefix, "_").to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename used by file-backed caches.
    pub fn file_name(&self) -> String {
        format!("{}.txt", self.0)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonical string form of an item.
///
/// Objects and arrays use their compact JSON serialization; strings are used
/// verbatim (no quotes); other scalars use their JSON text.
pub fn canonicalize(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Derive the cache key for an item.
pub fn derive_key(value: &Value) -> CacheKey {
    CacheKey::from_canonical(&canonicalize(value))
}
