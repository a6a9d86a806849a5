//! Graph store adapter contract.
//!
//! All operations accept and return business ids. Engine-internal ids never
//! cross this boundary.

use async_trait::async_trait;

use crate::error::KgResult;
use crate::identity::BusinessId;
use crate::model::{GraphView, LayoutPosition, LayoutReport, Node, NodeLabel, Properties, RelType, RootFilters};

/// Property names written by layout persistence.
pub const LAYOUT_X: &str = "layout_x";
pub const LAYOUT_Y: &str = "layout_y";
pub const LAYOUT_UPDATED_AT: &str = "layout_updated_at";

/// Node and relationship counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphCounts {
    pub nodes: usize,
    pub relationships: usize,
}

/// Read/write access to the property graph.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Root view: authors with their affiliation context, optionally extended
    /// to the papers they authored.
    async fn query_root(&self, filters: &RootFilters) -> KgResult<GraphView>;

    /// Direct neighbors of a node, either direction. Fails with `NotFound` if
    /// the node does not exist.
    async fn query_children(&self, node_id: &BusinessId) -> KgResult<GraphView>;

    /// Single node lookup.
    async fn query_node_detail(&self, node_id: &BusinessId) -> KgResult<Option<Node>>;

    /// Apply layout positions one by one. Positions referencing missing nodes
    /// are reported as skipped; only infrastructure failures return `Err`.
    async fn persist_layout(&self, positions: &[LayoutPosition]) -> KgResult<LayoutReport>;

    /// Create a node. Uses `properties.id` as business id when present,
    /// otherwise mints one.
    async fn create_node(&self, label: NodeLabel, properties: Properties) -> KgResult<BusinessId>;

    /// Create (or merge) a relationship between two existing nodes.
    async fn create_relationship(
        &self,
        source: &BusinessId,
        target: &BusinessId,
        rel_type: RelType,
        properties: Properties,
    ) -> KgResult<()>;

    async fn counts(&self) -> KgResult<GraphCounts>;

    /// Remove every node and relationship.
    async fn clear(&self) -> KgResult<()>;
}

/// Business id for a new node: the `id` property if set, else `{label}_{uuid}`.
pub fn assign_business_id(label: NodeLabel, properties: &mut Properties) -> BusinessId {
    if let Some(id) = BusinessId::from_properties(properties) {
        return id;
    }
    let id = BusinessId::new(format!(
        "{}_{}",
        label.as_str().to_lowercase(),
        uuid::Uuid::new_v4().simple()
    ));
    properties.insert(
        crate::identity::ID_PROPERTY.to_string(),
        serde_json::Value::String(id.as_str().to_string()),
    );
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assign_business_id_keeps_existing() {
        let mut props = Properties::new();
        props.insert("id".into(), json!("paper_009"));
        assert_eq!(assign_business_id(NodeLabel::Paper, &mut props).as_str(), "paper_009");
    }

    #[test]
    fn test_assign_business_id_mints_and_stores() {
        let mut props = Properties::new();
        let id = assign_business_id(NodeLabel::Organization, &mut props);
        assert!(id.as_str().starts_with("organization_"));
        assert_eq!(props["id"], json!(id.as_str()));
    }
}
