//! [`CacheBackend`] over Redis string keys with expiry.

use std::time::Duration;

use async_trait::async_trait;
use paperkg_core::{CacheBackend, KgResult};
use redis::AsyncCommands;
use tracing::debug;

use crate::client::{CacheError, CacheResult, RedisPool};

/// Redis expiry in whole seconds; sub-second TTLs round up to one.
pub fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

#[derive(Clone)]
pub struct RedisCache {
    pool: RedisPool,
}

impl RedisCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    async fn scan_keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.pool.clone();
        let mut scan: redis::AsyncIter<String> = conn.scan_match(pattern).await?;
        let mut keys = Vec::new();
        while let Some(key) = scan.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> KgResult<Option<String>> {
        let mut conn = self.pool.clone();
        let value: Option<String> = conn.get(key).await.map_err(CacheError::from)?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KgResult<()> {
        let mut conn = self.pool.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl))
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> KgResult<usize> {
        let keys = self.scan_keys(pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.clone();
        let deleted: usize = conn.del(&keys).await.map_err(CacheError::from)?;
        debug!(pattern, deleted, "Deleted cache keys");
        Ok(deleted)
    }

    async fn ping(&self) -> KgResult<()> {
        let mut conn = self.pool.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_secs() {
        assert_eq!(ttl_secs(Duration::from_secs(3600)), 3600);
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::ZERO), 1);
    }

    #[test]
    fn test_cache_error_maps_to_unavailable() {
        let err: paperkg_core::KgError = CacheError::OperationFailed("down".into()).into();
        assert!(matches!(err, paperkg_core::KgError::StoreUnavailable(_)));
        assert!(err.to_string().contains("down"));
    }
}
