//! In-memory cache backend with TTL expiry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::cache::CacheBackend;
use crate::error::{KgError, KgResult};

/// Glob match supporting a single trailing `*`.
pub(crate) fn matches_pattern(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

/// Cache backend held in process memory.
///
/// Can be switched unavailable to exercise the degradation paths.
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    available: AtomicBool,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> KgResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(KgError::unavailable("memory cache switched off"))
        }
    }

    /// Live keys matching `pattern`, sorted.
    pub async fn keys_matching(&self, pattern: &str) -> Vec<String> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(k, (_, expires))| *expires > now && matches_pattern(pattern, k))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> KgResult<Option<String>> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let live = entries
            .get(key)
            .filter(|(_, expires)| *expires > now)
            .map(|(value, _)| value.clone());
        if live.is_none() {
            entries.remove(key);
        }
        Ok(live)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KgResult<()> {
        self.check()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        // Expired entries are purged on every write so unread keys cannot pile up.
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> KgResult<usize> {
        self.check()?;
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|k, _| !matches_pattern(pattern, k));
        Ok(before - entries.len())
    }

    async fn ping(&self) -> KgResult<()> {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_pattern() {
        assert!(matches_pattern("graph:root:*", "graph:root:{\"limit\":10}"));
        assert!(!matches_pattern("graph:root:*", "graph:children:author_001"));
        assert!(matches_pattern("graph:node:x", "graph:node:x"));
        assert!(!matches_pattern("graph:node:x", "graph:node:xy"));
    }

    #[tokio::test]
    async fn test_expired_entries_are_misses() {
        let cache = MemoryCache::new();
        cache.set_ex("k", "v", Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);

        cache.set_ex("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_writes_purge_expired_entries() {
        let cache = MemoryCache::new();
        for i in 0..1000 {
            let key = format!("graph:root:{{\"author_name_contains\":\"a{}\"}}", i);
            cache.set_ex(&key, "{}", Duration::ZERO).await.unwrap();
        }
        assert!(cache.entries.lock().await.len() <= 1);

        cache.set_ex("graph:node:x", "{}", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.entries.lock().await.len(), 1);
        assert_eq!(cache.keys_matching("graph:*").await, vec!["graph:node:x".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_pattern_counts_removed() {
        let cache = MemoryCache::new();
        for key in ["graph:root:a", "graph:root:b", "graph:node:c"] {
            cache.set_ex(key, "{}", Duration::from_secs(60)).await.unwrap();
        }
        assert_eq!(cache.delete_pattern("graph:root:*").await.unwrap(), 2);
        assert_eq!(cache.keys_matching("graph:*").await, vec!["graph:node:c".to_string()]);
    }

    #[tokio::test]
    async fn test_unavailable_backend_errors() {
        let cache = MemoryCache::new();
        cache.set_available(false);
        assert!(matches!(cache.get("k").await, Err(KgError::StoreUnavailable(_))));
        assert!(cache.ping().await.is_err());
    }
}
