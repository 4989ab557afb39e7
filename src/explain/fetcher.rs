//! Cache-or-generate for a single item.

use std::sync::Arc;
use tracing::{debug, warn};

use super::prompt::PromptTemplate;
use crate::cache::{canonicalize, CacheKey, ResponseCache};
use crate::types::{Item, ItemOutcome};
use crate::upstream::TextGenerator;
use crate::Error;

/// Stored and returned when the upstream call succeeds without any text.
pub const EMPTY_RESPONSE: &str = "⚠️ Empty response";

/// Produces an [`ItemOutcome`] for one item, consulting the cache first.
///
/// Never fails: upstream and storage problems become `Error` outcomes.
#[derive(Clone)]
pub struct ExplanationFetcher {
    cache: ResponseCache,
    generator: Arc<dyn TextGenerator>,
    prompt: PromptTemplate,
}

impl ExplanationFetcher {
    pub fn new(cache: ResponseCache, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            cache,
            generator,
            prompt: PromptTemplate::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub async fn fetch(&self, key: &str, value: &Item, model: &str) -> ItemOutcome {
        let canonical = canonicalize(value);
        let cache_key = CacheKey::from_canonical(&canonical);

        match self.lookup(&cache_key).await {
            Ok(Some(text)) => {
                debug!(key, cache_key = %cache_key, model, "Cache hit");
                return ItemOutcome::success(key, model, text, true);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(key, cache_key = %cache_key, error = %e, "Cached entry exists but could not be read");
                return ItemOutcome::error(key, model, e.to_string());
            }
        }

        let prompt = self.prompt.render(&canonical);
        let generation = match self.generator.generate(model, &prompt).await {
            Ok(g) => g,
            Err(e) => {
                warn!(key, model, error = %e, "Upstream call failed");
                return ItemOutcome::error(key, model, e.to_string());
            }
        };

        let text = generation
            .text
            .unwrap_or_else(|| EMPTY_RESPONSE.to_string());

        if let Err(e) = self.cache.put(&cache_key, &text).await {
            warn!(key, cache_key = %cache_key, error = %e, "Failed to store explanation");
            return ItemOutcome::error(key, model, e.to_string());
        }

        debug!(key, cache_key = %cache_key, model, "Stored new explanation");
        ItemOutcome::success(key, model, text, false)
    }

    /// A failed existence check is logged and treated as a miss. Once the
    /// entry is known to exist, a read failure is returned so the caller never
    /// regenerates over it. An entry removed between the two calls is a miss.
    async fn lookup(&self, cache_key: &CacheKey) -> crate::Result<Option<String>> {
        match self.cache.has(cache_key).await {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(e) => {
                warn!(cache_key = %cache_key, error = %e, "Cache lookup failed, fetching instead");
                return Ok(None);
            }
        }
        match self.cache.get(cache_key).await {
            Ok(text) => Ok(Some(text)),
            Err(Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{derive_key, MemoryCache};
    use crate::types::OutcomeStatus;
    use crate::upstream::{Generation, UpstreamError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, String)>>,
        reply: Option<Generation>,
    }

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, UpstreamError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), prompt.to_string()));
            match &self.reply {
                Some(g) => Ok(g.clone()),
                None => Err(UpstreamError::Api {
                    status: 500,
                    message: "backend exploded".into(),
                }),
            }
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    fn fetcher(reply: Option<Generation>) -> (ExplanationFetcher, Arc<Recorder>) {
        let gen = Arc::new(Recorder {
            reply,
            ..Default::default()
        });
        let f = ExplanationFetcher::new(ResponseCache::new(MemoryCache::new()), gen.clone());
        (f, gen)
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let (f, gen) = fetcher(Some(Generation::text("An NSAID.")));
        let value = json!({"Aspirin": "NSAID"});

        let first = f.fetch("Aspirin", &value, "model-a").await;
        let second = f.fetch("Aspirin", &value, "model-b").await;

        assert_eq!(first.status, OutcomeStatus::Success);
        assert!(!first.served_from_cache);
        assert!(second.served_from_cache);
        assert_eq!(second.text, first.text);
        assert_eq!(second.model_used, "model-b");
        assert_eq!(gen.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prompt_contains_canonical_value() {
        let (f, gen) = fetcher(Some(Generation::text("ok")));
        f.fetch("k", &json!({"Dose": "5mg"}), "m").await;
        let calls = gen.calls.lock().unwrap();
        assert_eq!(calls[0].0, "m");
        assert!(calls[0].1.ends_with("\n\n{\"Dose\":\"5mg\"}"));
    }

    #[tokio::test]
    async fn test_empty_generation_is_cached_sentinel() {
        let (f, gen) = fetcher(Some(Generation::empty()));
        let value = json!("Placebo");
        let first = f.fetch("k", &value, "m").await;
        assert_eq!(first.status, OutcomeStatus::Success);
        assert_eq!(first.text, EMPTY_RESPONSE);

        let second = f.fetch("k", &value, "m").await;
        assert!(second.served_from_cache);
        assert_eq!(second.text, EMPTY_RESPONSE);
        assert_eq!(gen.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_reported_in_band_and_not_cached() {
        let (f, gen) = fetcher(None);
        let value = json!("Unobtainium");
        let outcome = f.fetch("k", &value, "m").await;
        assert_eq!(outcome, ItemOutcome::error("k", "m", "backend exploded"));
        assert!(!f.cache().has(&derive_key(&value)).await.unwrap());

        f.fetch("k", &value, "m").await;
        assert_eq!(gen.calls.lock().unwrap().len(), 2);
    }

    struct Unreadable;

    #[async_trait]
    impl crate::cache::CacheBackend for Unreadable {
        async fn get(&self, _key: &CacheKey) -> crate::Result<Option<String>> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into())
        }
        async fn put(&self, _key: &CacheKey, _text: &str) -> crate::Result<()> {
            Ok(())
        }
        async fn exists(&self, _key: &CacheKey) -> crate::Result<bool> {
            Ok(true)
        }
        async fn len(&self) -> crate::Result<usize> {
            Ok(1)
        }
        fn name(&self) -> &'static str {
            "unreadable"
        }
    }

    #[tokio::test]
    async fn test_unreadable_existing_entry_is_error_without_upstream_call() {
        let gen = Arc::new(Recorder {
            reply: Some(Generation::text("fresh")),
            ..Default::default()
        });
        let f = ExplanationFetcher::new(ResponseCache::new(Unreadable), gen.clone());

        let outcome = f.fetch("k", &json!("Warfarin"), "m").await;
        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert!(!outcome.served_from_cache);
        assert!(gen.calls.lock().unwrap().is_empty());
    }
}
