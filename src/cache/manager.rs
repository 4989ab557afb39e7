//! Response cache.

use super::backend::CacheBackend;
use super::key::CacheKey;
use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Explanation text keyed by [`CacheKey`], over a pluggable backend.
///
/// Cheap to clone; clones share the backend and counters.
#[derive(Clone)]
pub struct ResponseCache {
    backend: Arc<dyn CacheBackend>,
    stats: Arc<AtomicStats>,
}

impl ResponseCache {
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    pub fn from_arc(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            stats: Arc::new(AtomicStats::default()),
        }
    }

    /// True iff a record exists for `key`. Counts as a hit or a miss.
    pub async fn has(&self, key: &CacheKey) -> Result<bool> {
        match self.backend.exists(key).await {
            Ok(true) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Ok(true)
            }
            Ok(false) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                Ok(false)
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Stored text for `key`, or [`Error::NotFound`].
    pub async fn get(&self, key: &CacheKey) -> Result<String> {
        match self.backend.get(key).await {
            Ok(Some(text)) => Ok(text),
            Ok(None) => Err(Error::NotFound {
                key: key.to_string(),
            }),
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Store `text` under `key`, overwriting any prior value.
    pub async fn put(&self, key: &CacheKey, text: &str) -> Result<()> {
        match self.backend.put(key, text).await {
            Ok(()) => {
                self.stats.writes.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    pub async fn len(&self) -> Result<usize> {
        self.backend.len().await
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{derive_key, MemoryCache};
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let cache = ResponseCache::new(MemoryCache::new());
        let err = cache.get(&derive_key(&json!("absent"))).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { ref key } if key == "absent"));
    }

    #[tokio::test]
    async fn test_stats_track_hits_misses_and_writes() {
        let cache = ResponseCache::new(MemoryCache::new());
        let key = derive_key(&json!("Warfarin"));

        assert!(!cache.has(&key).await.unwrap());
        cache.put(&key, "Anticoagulant.").await.unwrap();
        assert!(cache.has(&key).await.unwrap());
        assert_eq!(cache.get(&key).await.unwrap(), "Anticoagulant.");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.errors, 0);
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let cache = ResponseCache::new(MemoryCache::new());
        let other = cache.clone();
        let key = derive_key(&json!("shared"));
        cache.put(&key, "v").await.unwrap();
        assert!(other.has(&key).await.unwrap());
        assert_eq!(other.stats().writes, 1);
        assert_eq!(other.backend_name(), "memory");
    }

    #[test]
    fn test_hit_ratio_empty() {
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);
    }
}
