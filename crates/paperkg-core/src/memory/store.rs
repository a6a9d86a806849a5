//! In-memory property graph.
//!
//! Mirrors the Neo4j adapter's traversal semantics closely enough to run the
//! service and HTTP layer without a database. Internal ids are generation
//! prefixed ordinals (`"{generation}:{ordinal}"`) and change on [`reload`].
//!
//! [`reload`]: MemoryGraphStore::reload

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::assembler::{assemble_neighbors, assemble_root, node_from_raw, NeighborRecord, RawNode, RawRelationship, RootRecord};
use crate::error::{KgError, KgResult};
use crate::identity::{BusinessId, InternalId};
use crate::model::{GraphView, LayoutPosition, LayoutReport, Node, NodeLabel, Properties, RelType, RootFilters};
use crate::store::{assign_business_id, GraphCounts, GraphStore, LAYOUT_UPDATED_AT, LAYOUT_X, LAYOUT_Y};

#[derive(Debug, Clone)]
struct StoredRel {
    start: InternalId,
    end: InternalId,
    rel_type: RelType,
    properties: Properties,
}

impl StoredRel {
    fn to_raw(&self) -> RawRelationship {
        RawRelationship {
            start: self.start.clone(),
            end: self.end.clone(),
            rel_type: self.rel_type.as_str().to_string(),
            properties: self.properties.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct GraphData {
    generation: u64,
    next_ordinal: u64,
    nodes: Vec<RawNode>,
    rels: Vec<StoredRel>,
}

impl GraphData {
    fn mint(&mut self) -> InternalId {
        let id = InternalId::new(format!("{}:{}", self.generation, self.next_ordinal));
        self.next_ordinal += 1;
        id
    }

    fn find(&self, id: &BusinessId) -> Option<&RawNode> {
        self.nodes
            .iter()
            .find(|n| BusinessId::from_properties(&n.properties).as_ref() == Some(id))
    }

    fn find_mut(&mut self, id: &BusinessId) -> Option<&mut RawNode> {
        self.nodes
            .iter_mut()
            .find(|n| BusinessId::from_properties(&n.properties).as_ref() == Some(id))
    }

    fn by_internal(&self, id: &InternalId) -> Option<&RawNode> {
        self.nodes.iter().find(|n| &n.internal_id == id)
    }

    fn with_label(&self, label: NodeLabel) -> impl Iterator<Item = &RawNode> {
        self.nodes
            .iter()
            .filter(move |n| n.labels.iter().any(|l| l == label.as_str()))
    }

    fn rel_between(&self, start: &InternalId, end: &InternalId, rel_type: RelType) -> Option<&StoredRel> {
        self.rels
            .iter()
            .find(|r| &r.start == start && &r.end == end && r.rel_type == rel_type)
    }
}

fn prop_str<'a>(node: &'a RawNode, key: &str) -> Option<&'a str> {
    node.properties.get(key).and_then(|v| v.as_str())
}

fn business_key(node: &RawNode) -> String {
    prop_str(node, "id").unwrap_or_default().to_string()
}

/// Graph store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    data: RwLock<GraphData>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop and recreate every node and relationship with fresh internal ids,
    /// as a database reload would. Business ids and properties are preserved.
    pub async fn reload(&self) {
        let mut data = self.data.write().await;
        data.generation += 1;
        data.next_ordinal = 0;

        let old_nodes = std::mem::take(&mut data.nodes);
        let mut remap = std::collections::HashMap::new();
        for mut node in old_nodes.into_iter().rev() {
            let fresh = data.mint();
            remap.insert(node.internal_id.clone(), fresh.clone());
            node.internal_id = fresh;
            data.nodes.push(node);
        }
        data.nodes.reverse();

        for rel in data.rels.iter_mut() {
            if let (Some(start), Some(end)) = (remap.get(&rel.start), remap.get(&rel.end)) {
                rel.start = start.clone();
                rel.end = end.clone();
            }
        }
    }

    /// Internal id currently assigned to a business id.
    pub async fn internal_id(&self, id: &BusinessId) -> Option<InternalId> {
        self.data.read().await.find(id).map(|n| n.internal_id.clone())
    }

    fn matches_filters(author: &RawNode, org: &RawNode, filters: &RootFilters) -> bool {
        if !filters.org_names.is_empty() {
            let name = prop_str(org, "name");
            let abbreviation = prop_str(org, "abbreviation");
            let hit = filters
                .org_names
                .iter()
                .any(|n| Some(n.as_str()) == name || Some(n.as_str()) == abbreviation);
            if !hit {
                return false;
            }
        }
        if let Some(needle) = &filters.author_name_contains {
            let name = prop_str(author, "name").unwrap_or_default().to_lowercase();
            if !name.contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }

    fn paper_in_range(paper: &RawNode, filters: &RootFilters) -> bool {
        let year = paper.properties.get("year").and_then(|v| v.as_i64());
        if let Some(from) = filters.year_from {
            if !year.is_some_and(|y| y >= from) {
                return false;
            }
        }
        if let Some(to) = filters.year_to {
            if !year.is_some_and(|y| y <= to) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn query_root(&self, filters: &RootFilters) -> KgResult<GraphView> {
        let data = self.data.read().await;
        let mut records = Vec::new();

        for author in data.with_label(NodeLabel::Author) {
            for org in data.with_label(NodeLabel::Organization) {
                let stored = data.rel_between(&author.internal_id, &org.internal_id, RelType::AffiliatedWith);
                let by_property = prop_str(author, "org_id").is_some() && prop_str(author, "org_id") == prop_str(org, "id");
                if stored.is_none() && !by_property {
                    continue;
                }
                if !Self::matches_filters(author, org, filters) {
                    continue;
                }

                let papers: Vec<(&RawNode, &StoredRel)> = data
                    .rels
                    .iter()
                    .filter(|r| r.rel_type == RelType::Authored && r.start == author.internal_id)
                    .filter_map(|r| data.by_internal(&r.end).map(|p| (p, r)))
                    .filter(|(p, _)| p.labels.iter().any(|l| l == NodeLabel::Paper.as_str()))
                    .filter(|(p, _)| Self::paper_in_range(p, filters))
                    .collect();

                let base = RootRecord {
                    author: author.clone(),
                    organization: Some(org.clone()),
                    affiliation: stored.map(StoredRel::to_raw),
                    paper: None,
                    authored: None,
                };
                if papers.is_empty() {
                    records.push(base);
                } else {
                    for (paper, rel) in papers {
                        records.push(RootRecord {
                            paper: Some(paper.clone()),
                            authored: Some(rel.to_raw()),
                            ..base.clone()
                        });
                    }
                }
            }
        }

        // ORDER BY o.id, a.id, p.id (nulls last)
        records.sort_by_key(|r| {
            let paper = r.paper.as_ref().map(business_key);
            (
                r.organization.as_ref().map(business_key),
                business_key(&r.author),
                paper.is_none(),
                paper,
            )
        });
        records.truncate(filters.limit as usize);

        Ok(assemble_root(&records))
    }

    async fn query_children(&self, node_id: &BusinessId) -> KgResult<GraphView> {
        let data = self.data.read().await;
        let center = data.find(node_id).ok_or_else(|| KgError::not_found(node_id.as_str()))?;

        let mut records: Vec<NeighborRecord> = data
            .rels
            .iter()
            .filter_map(|r| {
                let other = if r.start == center.internal_id {
                    &r.end
                } else if r.end == center.internal_id {
                    &r.start
                } else {
                    return None;
                };
                data.by_internal(other).map(|neighbor| NeighborRecord {
                    center: center.clone(),
                    relationship: r.to_raw(),
                    neighbor: neighbor.clone(),
                })
            })
            .collect();

        // ORDER BY type(r), m.id
        records.sort_by(|a, b| {
            (a.relationship.rel_type.as_str(), business_key(&a.neighbor))
                .cmp(&(b.relationship.rel_type.as_str(), business_key(&b.neighbor)))
        });

        Ok(assemble_neighbors(node_id, &records))
    }

    async fn query_node_detail(&self, node_id: &BusinessId) -> KgResult<Option<Node>> {
        let data = self.data.read().await;
        Ok(data.find(node_id).and_then(node_from_raw))
    }

    async fn persist_layout(&self, positions: &[LayoutPosition]) -> KgResult<LayoutReport> {
        let mut report = LayoutReport::default();

        for position in positions {
            let mut data = self.data.write().await;
            match data.find_mut(&position.node_id) {
                Some(node) => {
                    node.properties.insert(LAYOUT_X.to_string(), serde_json::json!(position.x));
                    node.properties.insert(LAYOUT_Y.to_string(), serde_json::json!(position.y));
                    node.properties.insert(
                        LAYOUT_UPDATED_AT.to_string(),
                        serde_json::json!(chrono::Utc::now().to_rfc3339()),
                    );
                    report.applied.push(position.node_id.clone());
                }
                None => report.skipped.push(position.node_id.clone()),
            }
        }

        Ok(report)
    }

    async fn create_node(&self, label: NodeLabel, mut properties: Properties) -> KgResult<BusinessId> {
        let id = assign_business_id(label, &mut properties);
        let mut data = self.data.write().await;

        if let Some(existing) = data.find_mut(&id) {
            existing.properties.extend(properties);
            if !existing.labels.iter().any(|l| l == label.as_str()) {
                existing.labels.push(label.as_str().to_string());
            }
            return Ok(id);
        }

        let internal_id = data.mint();
        data.nodes.push(RawNode {
            internal_id,
            labels: vec![label.as_str().to_string()],
            properties,
        });
        Ok(id)
    }

    async fn create_relationship(
        &self,
        source: &BusinessId,
        target: &BusinessId,
        rel_type: RelType,
        properties: Properties,
    ) -> KgResult<()> {
        let mut data = self.data.write().await;
        let start = data
            .find(source)
            .map(|n| n.internal_id.clone())
            .ok_or_else(|| KgError::not_found(source.as_str()))?;
        let end = data
            .find(target)
            .map(|n| n.internal_id.clone())
            .ok_or_else(|| KgError::not_found(target.as_str()))?;

        let existing = data
            .rels
            .iter()
            .position(|r| r.start == start && r.end == end && r.rel_type == rel_type);
        match existing {
            Some(i) => data.rels[i].properties.extend(properties),
            None => data.rels.push(StoredRel {
                start,
                end,
                rel_type,
                properties,
            }),
        }
        Ok(())
    }

    async fn counts(&self) -> KgResult<GraphCounts> {
        let data = self.data.read().await;
        Ok(GraphCounts {
            nodes: data.nodes.len(),
            relationships: data.rels.len(),
        })
    }

    async fn clear(&self) -> KgResult<()> {
        let mut data = self.data.write().await;
        data.nodes.clear();
        data.rels.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(pairs: &[(&str, serde_json::Value)]) -> Properties {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    async fn small_store() -> MemoryGraphStore {
        let store = MemoryGraphStore::new();
        store
            .create_node(NodeLabel::Organization, props(&[("id", json!("org_001")), ("name", json!("Tsinghua University")), ("abbreviation", json!("THU"))]))
            .await
            .unwrap();
        store
            .create_node(NodeLabel::Author, props(&[("id", json!("author_001")), ("name", json!("Zhang San"))]))
            .await
            .unwrap();
        store
            .create_node(NodeLabel::Author, props(&[("id", json!("author_002")), ("name", json!("Li Si")), ("org_id", json!("org_001"))]))
            .await
            .unwrap();
        store
            .create_node(NodeLabel::Paper, props(&[("id", json!("paper_001")), ("year", json!(2023))]))
            .await
            .unwrap();
        store
            .create_relationship(&"author_001".into(), &"org_001".into(), RelType::AffiliatedWith, Properties::new())
            .await
            .unwrap();
        store
            .create_relationship(&"author_001".into(), &"paper_001".into(), RelType::Authored, props(&[("order", json!(1))]))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_root_uses_org_id_property_as_affiliation() {
        let store = small_store().await;
        let view = store.query_root(&RootFilters::default()).await.unwrap();
        assert!(view
            .edges
            .iter()
            .any(|e| e.id == "author_002->org_001:AFFILIATED_WITH"));
    }

    #[tokio::test]
    async fn test_root_year_filter_keeps_author_drops_paper() {
        let store = small_store().await;
        let filters = RootFilters {
            year_from: Some(2024),
            ..RootFilters::default()
        };
        let view = store.query_root(&filters).await.unwrap();
        assert!(view.node("author_001").is_some());
        assert!(view.node("paper_001").is_none());
    }

    #[tokio::test]
    async fn test_root_author_filter_is_case_insensitive() {
        let store = small_store().await;
        let filters = RootFilters {
            author_name_contains: Some("zhang".into()),
            ..RootFilters::default()
        };
        let view = store.query_root(&filters).await.unwrap();
        assert!(view.node("author_001").is_some());
        assert!(view.node("author_002").is_none());
    }

    #[tokio::test]
    async fn test_root_limit_bounds_records() {
        let store = small_store().await;
        let view = store.query_root(&RootFilters::with_limit(1)).await.unwrap();
        // org_001/author_001/paper_001 sorts first
        let ids: Vec<&str> = view.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["author_001", "org_001", "paper_001"]);
    }

    #[tokio::test]
    async fn test_create_node_merges_on_business_id() {
        let store = small_store().await;
        store
            .create_node(NodeLabel::Paper, props(&[("id", json!("paper_001")), ("venue", json!("AAAI"))]))
            .await
            .unwrap();
        let counts = store.counts().await.unwrap();
        assert_eq!(counts.nodes, 4);
        let paper = store.query_node_detail(&"paper_001".into()).await.unwrap().unwrap();
        assert_eq!(paper.properties["venue"], json!("AAAI"));
        assert_eq!(paper.properties["year"], json!(2023));
    }

    #[tokio::test]
    async fn test_create_relationship_requires_endpoints() {
        let store = small_store().await;
        let err = store
            .create_relationship(&"author_001".into(), &"paper_404".into(), RelType::Authored, Properties::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_reload_changes_internal_ids_only() {
        let store = small_store().await;
        let id = BusinessId::new("author_001");
        let before = store.internal_id(&id).await.unwrap();
        let view_before = store.query_children(&id).await.unwrap();

        store.reload().await;

        let after = store.internal_id(&id).await.unwrap();
        assert_ne!(before, after);
        assert_eq!(store.query_children(&id).await.unwrap(), view_before);
    }
}
