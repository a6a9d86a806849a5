//! [`GraphStore`] implementation over Neo4j.

use anyhow::Error;
use async_trait::async_trait;
use paperkg_core::assembler::{assemble_neighbors, assemble_root};
use paperkg_core::store::assign_business_id;
use paperkg_core::{
    BusinessId, GraphCounts, GraphStore, GraphView, KgError, KgResult, LayoutPosition, LayoutReport, Node,
    NodeLabel, Properties, RelType, RootFilters,
};
use tracing::error;

use crate::queries::children::{fetch_neighbors, Neighborhood};
use crate::queries::{detail, layout, root, write};
use crate::GraphClient;

fn unavailable(op: &str, e: Error) -> KgError {
    error!(op, error = %format!("{:#}", e), "Neo4j operation failed");
    KgError::unavailable(format!("{:#}", e))
}

/// Neo4j-backed graph store.
#[derive(Clone)]
pub struct Neo4jGraphStore {
    client: GraphClient,
}

impl Neo4jGraphStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GraphClient {
        &self.client
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn query_root(&self, filters: &RootFilters) -> KgResult<GraphView> {
        let records = root::fetch_root_records(&self.client, filters)
            .await
            .map_err(|e| unavailable("query_root", e))?;
        Ok(assemble_root(&records))
    }

    async fn query_children(&self, node_id: &BusinessId) -> KgResult<GraphView> {
        match fetch_neighbors(&self.client, node_id)
            .await
            .map_err(|e| unavailable("query_children", e))?
        {
            Neighborhood::Missing => Err(KgError::not_found(node_id.as_str())),
            Neighborhood::Found(records) => Ok(assemble_neighbors(node_id, &records)),
        }
    }

    async fn query_node_detail(&self, node_id: &BusinessId) -> KgResult<Option<Node>> {
        detail::fetch_node(&self.client, node_id)
            .await
            .map_err(|e| unavailable("query_node_detail", e))
    }

    async fn persist_layout(&self, positions: &[LayoutPosition]) -> KgResult<LayoutReport> {
        layout::save_layout(&self.client, positions)
            .await
            .map_err(|e| unavailable("persist_layout", e))
    }

    async fn create_node(&self, label: NodeLabel, mut properties: Properties) -> KgResult<BusinessId> {
        let id = assign_business_id(label, &mut properties);
        write::create_node(&self.client, label, &id, &properties)
            .await
            .map_err(|e| unavailable("create_node", e))?;
        Ok(id)
    }

    async fn create_relationship(
        &self,
        source: &BusinessId,
        target: &BusinessId,
        rel_type: RelType,
        properties: Properties,
    ) -> KgResult<()> {
        let created = write::create_relationship(&self.client, source, target, rel_type, &properties)
            .await
            .map_err(|e| unavailable("create_relationship", e))?;
        if created {
            Ok(())
        } else {
            Err(KgError::not_found(format!("{} or {}", source, target)))
        }
    }

    async fn counts(&self) -> KgResult<GraphCounts> {
        self.client
            .get_counts()
            .await
            .map_err(|e| unavailable("counts", e))
    }

    async fn clear(&self) -> KgResult<()> {
        write::clear_graph(&self.client)
            .await
            .map_err(|e| unavailable("clear", e))
    }
}
