//! Read-through cache for assembled graph views.
//!
//! Caching is an optimization: every failure of the backend degrades to a
//! miss or a no-op with a warning, and never reaches the caller.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::KgResult;
use crate::identity::BusinessId;
use crate::model::RootFilters;

pub const ROOT_TTL: Duration = Duration::from_secs(60 * 60);
pub const CHILDREN_TTL: Duration = Duration::from_secs(30 * 60);
pub const NODE_TTL: Duration = Duration::from_secs(60 * 60);

/// Matches every root view entry.
pub const ROOT_PATTERN: &str = "graph:root:*";
/// Matches every entry written by this layer.
pub const ALL_PATTERN: &str = "graph:*";

/// Cache key for a root query.
///
/// Built from the normalized filters serialized with sorted keys, so requests
/// that differ only in parameter order share an entry.
pub fn root_key(filters: &RootFilters) -> KgResult<String> {
    let value = serde_json::to_value(filters.normalized())?;
    let sorted: BTreeMap<String, serde_json::Value> = match value {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    };
    Ok(format!("graph:root:{}", serde_json::to_string(&sorted)?))
}

pub fn children_key(node_id: &BusinessId) -> String {
    format!("graph:children:{}", node_id)
}

pub fn node_key(node_id: &BusinessId) -> String {
    format!("graph:node:{}", node_id)
}

/// Key-value backend. Patterns use a trailing `*` glob.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> KgResult<Option<String>>;

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KgResult<()>;

    /// Delete every key matching `pattern`, returning how many were removed.
    async fn delete_pattern(&self, pattern: &str) -> KgResult<usize>;

    async fn ping(&self) -> KgResult<()>;
}

/// Degrading wrapper around an optional [`CacheBackend`].
#[derive(Clone, Default)]
pub struct GraphCache {
    backend: Option<Arc<dyn CacheBackend>>,
}

impl GraphCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A cache where every read misses and every write is dropped.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;
        match backend.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Cache serialization failed");
                return;
            }
        };
        if let Err(e) = backend.set_ex(key, &raw, ttl).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    /// Returns the number of removed entries, or `None` if the backend failed
    /// (or the cache is disabled).
    pub async fn invalidate_pattern(&self, pattern: &str) -> Option<usize> {
        let backend = self.backend.as_ref()?;
        match backend.delete_pattern(pattern).await {
            Ok(removed) => {
                debug!(pattern, removed, "Cache entries invalidated");
                Some(removed)
            }
            Err(e) => {
                warn!(pattern, error = %e, "Cache invalidation failed");
                None
            }
        }
    }

    pub async fn ping(&self) -> KgResult<()> {
        match self.backend.as_ref() {
            Some(backend) => backend.ping().await,
            None => Ok(()),
        }
    }
}
