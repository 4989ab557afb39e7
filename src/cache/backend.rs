//! Cache backend implementations.

use super::key::CacheKey;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Durable storage for explanation text, one record per key.
///
/// Backends never expire or evict entries. `put` overwrites.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>>;
    async fn put(&self, key: &CacheKey, text: &str) -> Result<()>;
    async fn exists(&self, key: &CacheKey) -> Result<bool>;
    async fn len(&self) -> Result<usize>;
    fn name(&self) -> &'static str;
}

/// One `<key>.txt` file per entry under a root directory.
///
/// The root is created on first write if it does not exist yet.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory eagerly. Idempotent.
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }
}

#[async_trait]
impl CacheBackend for FileCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        // Entries written by other tools may not be valid UTF-8.
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &CacheKey, text: &str) -> Result<()> {
        self.ensure_root().await?;
        let path = self.path_for(key);
        tokio::fs::write(&path, text).await?;
        debug!(path = %path.display(), bytes = text.len(), "Wrote cache entry");
        Ok(())
    }

    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(key)).await?)
    }

    async fn len(&self) -> Result<usize> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut count = 0;
        while let Some(entry) = dir.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "txt") {
                count += 1;
            }
        }
        Ok(count)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// In-process backend, used for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> crate::Error {
    std::io::Error::other("memory cache lock poisoned").into()
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }
    async fn put(&self, key: &CacheKey, text: &str) -> Result<()> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.clone(), text.to_string());
        Ok(())
    }
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.entries.read().map_err(poisoned)?.contains_key(key))
    }
    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }
    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::derive_key;
    use serde_json::json;

    #[tokio::test]
    async fn test_file_cache_creates_root_on_first_put() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("responses");
        let cache = FileCache::new(&root);
        let key = derive_key(&json!("Metformin"));

        assert!(!cache.exists(&key).await.unwrap());
        assert_eq!(cache.len().await.unwrap(), 0);

        cache.put(&key, "Biguanide antidiabetic.").await.unwrap();
        assert!(root.join("metformin.txt").is_file());
        assert!(cache.exists(&key).await.unwrap());
        assert_eq!(
            cache.get(&key).await.unwrap().as_deref(),
            Some("Biguanide antidiabetic.")
        );
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_file_cache_put_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = FileCache::new(tmp.path());
        let key = derive_key(&json!("k"));
        cache.put(&key, "first").await.unwrap();
        cache.put(&key, "second").await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_file_cache_missing_entry_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = FileCache::new(tmp.path().join("never-created"));
        assert!(cache.get(&derive_key(&json!("x"))).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ensure_root_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = FileCache::new(tmp.path().join("a").join("b"));
        cache.ensure_root().await.unwrap();
        cache.ensure_root().await.unwrap();
        assert!(cache.root().is_dir());
    }

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        let key = derive_key(&json!({"a": 1}));
        assert!(!cache.exists(&key).await.unwrap());
        cache.put(&key, "text").await.unwrap();
        assert!(cache.exists(&key).await.unwrap());
        assert_eq!(cache.len().await.unwrap(), 1);
        assert_eq!(cache.name(), "memory");
    }

    #[tokio::test]
    async fn test_memory_cache_poisoned_lock_is_error() {
        let cache = std::sync::Arc::new(MemoryCache::new());
        let holder = cache.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.entries.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        let key = derive_key(&json!("x"));
        assert!(matches!(cache.get(&key).await, Err(crate::Error::Io(_))));
        assert!(cache.put(&key, "text").await.is_err());
        assert!(cache.exists(&key).await.is_err());
    }
}
