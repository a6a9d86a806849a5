//! Folds raw traversal records into a deduplicated [`GraphView`].
//!
//! Traversal results repeat node data once per relationship. The assembler
//! keeps the first occurrence of every business id, in record order, and emits
//! each `(source, target, type)` edge at most once. No I/O happens here.

use std::collections::HashSet;

use tracing::debug;

use crate::identity::{edge_id, BusinessId, IdentityResolver, InternalId};
use crate::model::{Edge, GraphView, Node, NodeLabel, Properties, RelType};

/// A node as returned by the graph engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub internal_id: InternalId,
    pub labels: Vec<String>,
    pub properties: Properties,
}

/// A relationship as returned by the graph engine, endpoints in engine ids.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRelationship {
    pub start: InternalId,
    pub end: InternalId,
    pub rel_type: String,
    pub properties: Properties,
}

/// One row of the root traversal.
///
/// `organization`/`affiliation` are absent when the author has no affiliation
/// context; `paper`/`authored` are absent when the optional authorship leg
/// did not match.
#[derive(Debug, Clone, PartialEq)]
pub struct RootRecord {
    pub author: RawNode,
    pub organization: Option<RawNode>,
    pub affiliation: Option<RawRelationship>,
    pub paper: Option<RawNode>,
    pub authored: Option<RawRelationship>,
}

/// One row of a neighborhood expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRecord {
    pub center: RawNode,
    pub relationship: RawRelationship,
    pub neighbor: RawNode,
}

/// Convert a single raw node, resolving its business id and label.
pub fn node_from_raw(raw: &RawNode) -> Option<Node> {
    let label = NodeLabel::from_labels(&raw.labels)?;
    let id = BusinessId::from_properties(&raw.properties)?;
    Some(Node {
        id,
        label,
        properties: raw.properties.clone(),
    })
}

/// Incremental builder behind [`assemble_root`] and [`assemble_neighbors`].
#[derive(Debug, Default)]
pub struct GraphAssembler {
    resolver: IdentityResolver,
    seen_nodes: HashSet<BusinessId>,
    seen_edges: HashSet<(BusinessId, BusinessId, RelType)>,
    view: GraphView,
}

impl GraphAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if its id has not been seen. Returns its business id, or
    /// `None` if the node cannot be surfaced (no business id or unknown label).
    pub fn add_node(&mut self, raw: &RawNode) -> Option<BusinessId> {
        let Some(label) = NodeLabel::from_labels(&raw.labels) else {
            debug!(labels = ?raw.labels, "Dropping node with unknown label");
            return None;
        };
        let Some(id) = self.resolver.register(&raw.internal_id, &raw.properties) else {
            debug!(internal_id = raw.internal_id.as_str(), "Dropping node without business id");
            return None;
        };

        if self.seen_nodes.insert(id.clone()) {
            self.view.nodes.push(Node {
                id: id.clone(),
                label,
                properties: raw.properties.clone(),
            });
        }
        Some(id)
    }

    /// Add an edge between two nodes already in the view. Returns `false` for
    /// duplicates and for edges that would dangle.
    pub fn add_edge(
        &mut self,
        source: &BusinessId,
        target: &BusinessId,
        rel_type: RelType,
        properties: Properties,
    ) -> bool {
        if !self.seen_nodes.contains(source) || !self.seen_nodes.contains(target) {
            return false;
        }
        if !self.seen_edges.insert((source.clone(), target.clone(), rel_type)) {
            return false;
        }
        self.view.edges.push(Edge {
            id: edge_id(source, target, rel_type),
            source: source.clone(),
            target: target.clone(),
            rel_type,
            properties,
        });
        true
    }

    /// Add a stored relationship, keeping its stored direction.
    pub fn add_relationship(&mut self, rel: &RawRelationship) -> bool {
        let Some(rel_type) = RelType::parse(&rel.rel_type) else {
            debug!(rel_type = %rel.rel_type, "Dropping relationship with unknown type");
            return false;
        };
        let (Some(source), Some(target)) = (
            self.resolver.resolve(&rel.start).cloned(),
            self.resolver.resolve(&rel.end).cloned(),
        ) else {
            return false;
        };
        self.add_edge(&source, &target, rel_type, rel.properties.clone())
    }

    pub fn finish(self) -> GraphView {
        self.view
    }
}

/// Assemble the root view.
///
/// Every (author, organization) pair yields exactly one `AFFILIATED_WITH`
/// edge from author to organization, carrying the stored relationship's
/// properties when there is one and synthesized otherwise.
pub fn assemble_root(records: &[RootRecord]) -> GraphView {
    let mut asm = GraphAssembler::new();

    for record in records {
        let Some(author) = asm.add_node(&record.author) else {
            continue;
        };

        if let Some(org) = record.organization.as_ref().and_then(|o| asm.add_node(o)) {
            let properties = record
                .affiliation
                .as_ref()
                .filter(|r| r.rel_type == RelType::AffiliatedWith.as_str())
                .map(|r| r.properties.clone())
                .unwrap_or_default();
            asm.add_edge(&author, &org, RelType::AffiliatedWith, properties);
        }

        if let Some(paper) = &record.paper {
            if asm.add_node(paper).is_some() {
                if let Some(rel) = &record.authored {
                    asm.add_relationship(rel);
                }
            }
        }
    }

    asm.finish()
}

/// Assemble a neighborhood view around `center`.
///
/// Edges are normalized so the queried node is always the source. The center
/// node is included first whenever there is at least one neighbor.
pub fn assemble_neighbors(center: &BusinessId, records: &[NeighborRecord]) -> GraphView {
    let mut asm = GraphAssembler::new();

    for record in records {
        let Some(rel_type) = RelType::parse(&record.relationship.rel_type) else {
            continue;
        };
        match node_from_raw(&record.center) {
            Some(node) if &node.id == center => {}
            _ => continue,
        }
        // The center is only listed once a neighbor is known to render.
        if node_from_raw(&record.neighbor).is_none() {
            continue;
        }
        asm.add_node(&record.center);
        let Some(neighbor) = asm.add_node(&record.neighbor) else {
            continue;
        };
        asm.add_edge(center, &neighbor, rel_type, record.relationship.properties.clone());
    }

    asm.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(internal: &str, label: &str, id: &str) -> RawNode {
        let mut properties = Properties::new();
        properties.insert("id".into(), json!(id));
        properties.insert("name".into(), json!(format!("{} name", id)));
        RawNode {
            internal_id: InternalId::new(internal),
            labels: vec![label.to_string()],
            properties,
        }
    }

    fn rel(start: &str, end: &str, rel_type: &str) -> RawRelationship {
        RawRelationship {
            start: InternalId::new(start),
            end: InternalId::new(end),
            rel_type: rel_type.to_string(),
            properties: Properties::new(),
        }
    }

    fn root(author: RawNode, org: Option<RawNode>, paper: Option<RawNode>) -> RootRecord {
        let authored = paper
            .as_ref()
            .map(|p| rel(author.internal_id.as_str(), p.internal_id.as_str(), "AUTHORED"));
        RootRecord {
            author,
            organization: org,
            affiliation: None,
            paper,
            authored,
        }
    }

    #[test]
    fn test_root_dedups_nodes_in_discovery_order() {
        let a1 = raw("1", "Author", "author_001");
        let o1 = raw("10", "Organization", "org_001");
        let p1 = raw("20", "Paper", "paper_001");
        let p2 = raw("21", "Paper", "paper_002");

        let view = assemble_root(&[
            root(a1.clone(), Some(o1.clone()), Some(p1)),
            root(a1, Some(o1), Some(p2)),
        ]);

        let ids: Vec<&str> = view.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["author_001", "org_001", "paper_001", "paper_002"]);
    }

    #[test]
    fn test_root_synthesizes_one_affiliation_per_pair() {
        let a1 = raw("1", "Author", "author_001");
        let o1 = raw("10", "Organization", "org_001");
        let records: Vec<RootRecord> = (0..3)
            .map(|i| {
                root(
                    a1.clone(),
                    Some(o1.clone()),
                    Some(raw(&format!("2{}", i), "Paper", &format!("paper_00{}", i))),
                )
            })
            .collect();

        let view = assemble_root(&records);
        let affiliations: Vec<&Edge> = view
            .edges
            .iter()
            .filter(|e| e.rel_type == RelType::AffiliatedWith)
            .collect();
        assert_eq!(affiliations.len(), 1);
        assert_eq!(affiliations[0].id, "author_001->org_001:AFFILIATED_WITH");
        assert_eq!(view.edges.iter().filter(|e| e.rel_type == RelType::Authored).count(), 3);
    }

    #[test]
    fn test_root_keeps_stored_affiliation_properties() {
        let a1 = raw("1", "Author", "author_001");
        let o1 = raw("10", "Organization", "org_001");
        let mut affiliation = rel("1", "10", "AFFILIATED_WITH");
        affiliation.properties.insert("since".into(), json!(2019));

        let view = assemble_root(&[RootRecord {
            author: a1,
            organization: Some(o1),
            affiliation: Some(affiliation),
            paper: None,
            authored: None,
        }]);

        assert_eq!(view.edges.len(), 1);
        assert_eq!(view.edges[0].properties["since"], json!(2019));
    }

    #[test]
    fn test_root_tolerates_missing_paper_leg() {
        let view = assemble_root(&[root(
            raw("1", "Author", "author_002"),
            Some(raw("11", "Organization", "org_002")),
            None,
        )]);
        assert_eq!(view.nodes.len(), 2);
        assert_eq!(view.edges.len(), 1);
        assert!(view.nodes.iter().all(|n| n.label != NodeLabel::Paper));
    }

    #[test]
    fn test_root_drops_nodes_without_business_id() {
        let mut anonymous = raw("20", "Paper", "x");
        anonymous.properties.remove("id");
        let view = assemble_root(&[root(
            raw("1", "Author", "author_001"),
            Some(raw("10", "Organization", "org_001")),
            Some(anonymous),
        )]);

        assert_eq!(view.nodes.len(), 2);
        assert!(view.edges.iter().all(|e| e.rel_type != RelType::Authored));
    }

    #[test]
    fn test_no_dangling_edges() {
        let view = assemble_root(&[
            root(
                raw("1", "Author", "author_001"),
                Some(raw("10", "Organization", "org_001")),
                Some(raw("20", "Paper", "paper_001")),
            ),
            root(raw("2", "Author", "author_002"), Some(raw("11", "Unknown", "org_x")), None),
        ]);

        for edge in &view.edges {
            assert!(view.node(edge.source.as_str()).is_some());
            assert!(view.node(edge.target.as_str()).is_some());
        }
    }

    #[test]
    fn test_neighbors_normalize_direction() {
        let paper = raw("20", "Paper", "paper_001");
        let author = raw("1", "Author", "author_001");
        let cited = raw("21", "Paper", "paper_002");

        let center = BusinessId::new("paper_001");
        let view = assemble_neighbors(
            &center,
            &[
                NeighborRecord {
                    center: paper.clone(),
                    relationship: rel("1", "20", "AUTHORED"),
                    neighbor: author,
                },
                NeighborRecord {
                    center: paper,
                    relationship: rel("20", "21", "CITES"),
                    neighbor: cited,
                },
            ],
        );

        assert_eq!(view.nodes[0].id, center);
        assert_eq!(view.nodes.len(), 3);
        assert!(view.edges.iter().all(|e| e.source == center));
        assert_eq!(view.edges[0].id, "paper_001->author_001:AUTHORED");
    }

    #[test]
    fn test_neighbors_empty_records() {
        let view = assemble_neighbors(&BusinessId::new("author_001"), &[]);
        assert!(view.is_empty());
    }

    #[test]
    fn test_neighbors_without_renderable_neighbor_are_empty() {
        let author = raw("1", "Author", "author_001");
        let mut anonymous = raw("30", "Paper", "");
        anonymous.properties.remove("id");

        let view = assemble_neighbors(
            &BusinessId::new("author_001"),
            &[
                NeighborRecord {
                    center: author.clone(),
                    relationship: rel("1", "40", "REVIEWED"),
                    neighbor: raw("40", "Venue", "venue_001"),
                },
                NeighborRecord {
                    center: author.clone(),
                    relationship: rel("1", "30", "AUTHORED"),
                    neighbor: anonymous,
                },
                NeighborRecord {
                    center: author,
                    relationship: rel("1", "41", "MENTORED"),
                    neighbor: raw("41", "Author", "author_002"),
                },
            ],
        );
        assert!(view.is_empty(), "{:?}", view);
    }

    #[test]
    fn test_node_from_raw() {
        let node = node_from_raw(&raw("5", "Organization", "org_003")).unwrap();
        assert_eq!(node.id.as_str(), "org_003");
        assert_eq!(node.label, NodeLabel::Organization);
        assert!(node_from_raw(&raw("5", "Venue", "v1")).is_none());
    }
}
