//! Sequential batch orchestration.

use std::time::Instant;
use tracing::{info, info_span, Instrument};

use super::summary::BatchSummary;
use crate::explain::ExplanationFetcher;
use crate::rotation::ModelRotator;
use crate::types::{reporting_key, Item, ItemOutcome};
use crate::{Error, ErrorContext, Result};

/// Runs a batch one item at a time, in input order.
///
/// Item `i + 1` is not started until item `i` has produced its outcome, so a
/// cache entry written for an earlier item is always visible to a later item
/// with the same content, and at most one upstream request is in flight per
/// batch. Parallelizing this loop would require a per-key in-flight guard to
/// keep that deduplication.
#[derive(Clone)]
pub struct BatchOrchestrator {
    fetcher: ExplanationFetcher,
}

impl BatchOrchestrator {
    pub fn new(fetcher: ExplanationFetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &ExplanationFetcher {
        &self.fetcher
    }

    /// One outcome per item, in input order.
    ///
    /// Fails before any item is processed if `items` or `models` is empty
    /// ([`Error::InvalidInput`]) or the rotation parameters are unusable
    /// ([`Error::InvalidConfig`]). Per-item failures never abort the batch.
    pub async fn run(
        &self,
        items: &[Item],
        models: Vec<String>,
        switch_limit: usize,
    ) -> Result<Vec<ItemOutcome>> {
        if items.is_empty() {
            return Err(Error::invalid_input_with_context(
                "Input must be a non-empty JSON array.",
                ErrorContext::new()
                    .with_field_path("jsonArray")
                    .with_source("batch_orchestrator"),
            ));
        }
        if models.is_empty() {
            return Err(Error::invalid_input_with_context(
                "Model list is required.",
                ErrorContext::new()
                    .with_field_path("models")
                    .with_source("batch_orchestrator"),
            ));
        }
        let mut rotator = ModelRotator::new(models, switch_limit)?;

        let batch_id = uuid::Uuid::new_v4();
        let span = info_span!("batch", %batch_id, items = items.len());
        self.run_items(items, &mut rotator).instrument(span).await
    }

    async fn run_items(&self, items: &[Item], rotator: &mut ModelRotator) -> Result<Vec<ItemOutcome>> {
        let total = items.len();
        let start = Instant::now();
        info!(total, "Starting sequential batch processing");

        let mut outcomes = Vec::with_capacity(total);
        for (index, item) in items.iter().enumerate() {
            let model = rotator.next_model().to_string();
            let key = reporting_key(item);
            info!("[Item {}/{}] Processing key: {} (model: {})", index + 1, total, key, model);

            let outcome = self.fetcher.fetch(&key, item, &model).await;
            info!(
                key = %outcome.key,
                status = ?outcome.status,
                "  -> {}",
                if outcome.served_from_cache { "CACHE HIT" } else { "API CALL" }
            );
            outcomes.push(outcome);
            rotator.advance();
        }

        let summary = BatchSummary::from_outcomes(&outcomes, start.elapsed());
        let cache = self.fetcher.cache().stats();
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            cache_hits = summary.cache_hits,
            success_rate = summary.success_rate(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            cache_backend = self.fetcher.cache().backend_name(),
            cache_hit_ratio = cache.hit_ratio(),
            cache_writes = cache.writes,
            cache_errors = cache.errors,
            "Sequential batch processing finished"
        );
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, ResponseCache};
    use crate::upstream::{Generation, TextGenerator, UpstreamError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(AtomicUsize);

    #[async_trait]
    impl TextGenerator for Counting {
        async fn generate(&self, model: &str, _prompt: &str) -> std::result::Result<Generation, UpstreamError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Generation::text(format!("by {model}")))
        }
        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn orchestrator() -> (BatchOrchestrator, Arc<Counting>) {
        let gen = Arc::new(Counting(AtomicUsize::new(0)));
        let fetcher = ExplanationFetcher::new(ResponseCache::new(MemoryCache::new()), gen.clone());
        (BatchOrchestrator::new(fetcher), gen)
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected_without_calls() {
        let (o, gen) = orchestrator();
        let err = o.run(&[], vec!["m".into()], 1).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert_eq!(gen.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_models_rejected() {
        let (o, _) = orchestrator();
        let err = o.run(&[json!({"a": 1})], vec![], 1).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_zero_switch_limit_rejected() {
        let (o, gen) = orchestrator();
        let err = o.run(&[json!({"a": 1})], vec!["m".into()], 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert_eq!(gen.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeated_item_within_batch_hits_cache() {
        let (o, gen) = orchestrator();
        let items = vec![json!({"X": 1}), json!({"X": 1}), json!({"Y": 2})];
        let out = o.run(&items, vec!["A".into(), "B".into()], 1).await.unwrap();

        assert_eq!(out.len(), 3);
        assert!(!out[0].served_from_cache);
        assert!(out[1].served_from_cache);
        assert_eq!(out[1].text, "by A");
        assert_eq!(out[1].model_used, "B");
        assert_eq!(out[2].model_used, "A");
        assert_eq!(gen.0.load(Ordering::SeqCst), 2);
    }
}
