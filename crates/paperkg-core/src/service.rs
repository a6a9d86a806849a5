//! Graph service: cache-first orchestration over a [`GraphStore`].

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::cache::{self, GraphCache};
use crate::error::{KgError, KgResult};
use crate::identity::BusinessId;
use crate::model::{GraphView, LayoutPosition, LayoutReport, Node, RootFilters};
use crate::store::GraphStore;

/// Single entry point for the API layer.
#[derive(Clone)]
pub struct GraphService {
    store: Arc<dyn GraphStore>,
    cache: GraphCache,
}

impl GraphService {
    pub fn new(store: Arc<dyn GraphStore>, cache: GraphCache) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn cache(&self) -> &GraphCache {
        &self.cache
    }

    #[instrument(skip_all, fields(limit = filters.limit))]
    pub async fn get_root(&self, filters: &RootFilters) -> KgResult<GraphView> {
        filters.validate()?;
        let filters = filters.normalized();
        let key = cache::root_key(&filters)?;

        if let Some(view) = self.cache.get::<GraphView>(&key).await {
            return Ok(view);
        }

        let view = self.store.query_root(&filters).await?;
        info!(nodes = view.nodes.len(), edges = view.edges.len(), "Root view assembled");

        self.cache.set(&key, &view, cache::ROOT_TTL).await;
        Ok(view)
    }

    #[instrument(skip_all, fields(node_id = %node_id))]
    pub async fn get_children(&self, node_id: &BusinessId) -> KgResult<GraphView> {
        let key = cache::children_key(node_id);

        if let Some(view) = self.cache.get::<GraphView>(&key).await {
            return Ok(view);
        }

        let view = self.store.query_children(node_id).await?;
        self.cache.set(&key, &view, cache::CHILDREN_TTL).await;
        Ok(view)
    }

    /// Node detail. Absent nodes are not cached.
    #[instrument(skip_all, fields(node_id = %node_id))]
    pub async fn get_node_detail(&self, node_id: &BusinessId) -> KgResult<Option<Node>> {
        let key = cache::node_key(node_id);

        if let Some(node) = self.cache.get::<Node>(&key).await {
            return Ok(Some(node));
        }

        let node = self.store.query_node_detail(node_id).await?;
        if let Some(ref node) = node {
            self.cache.set(&key, node, cache::NODE_TTL).await;
        }
        Ok(node)
    }

    /// Persist layout positions, then purge every root view entry.
    ///
    /// Children and node-detail entries are left to expire on their own.
    #[instrument(skip_all, fields(count = positions.len()))]
    pub async fn persist_layout(&self, positions: &[LayoutPosition]) -> KgResult<LayoutReport> {
        if positions.is_empty() {
            return Err(KgError::validation("positions must not be empty"));
        }

        let report = self.store.persist_layout(positions).await?;
        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "Layout persisted"
        );
        if !report.skipped.is_empty() {
            warn!(skipped = ?report.skipped, "Layout positions referenced missing nodes");
        }

        self.cache.invalidate_pattern(cache::ROOT_PATTERN).await;
        Ok(report)
    }

    /// Purge every cached graph view. Returns `None` if the cache is disabled
    /// or unreachable.
    pub async fn clear_cache(&self) -> Option<usize> {
        self.cache.invalidate_pattern(cache::ALL_PATTERN).await
    }
}
