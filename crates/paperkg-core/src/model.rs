//! Graph view domain models.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{KgError, KgResult};
use crate::identity::BusinessId;

/// Node or edge property map. Ordered so serialization is deterministic.
pub type Properties = BTreeMap<String, serde_json::Value>;

pub const DEFAULT_ROOT_LIMIT: u32 = 100;
pub const MAX_ROOT_LIMIT: u32 = 1000;

/// Node label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    Paper,
    Author,
    Organization,
}

impl NodeLabel {
    /// The Neo4j node label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paper => "Paper",
            Self::Author => "Author",
            Self::Organization => "Organization",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Paper" => Some(Self::Paper),
            "Author" => Some(Self::Author),
            "Organization" => Some(Self::Organization),
            _ => None,
        }
    }

    /// First known label out of a node's label list.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Option<Self> {
        labels.iter().find_map(|l| Self::parse(l.as_ref()))
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelType {
    Authored,
    AffiliatedWith,
    Cites,
}

impl RelType {
    /// The Neo4j relationship type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authored => "AUTHORED",
            Self::AffiliatedWith => "AFFILIATED_WITH",
            Self::Cites => "CITES",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AUTHORED" => Some(Self::Authored),
            "AFFILIATED_WITH" => Some(Self::AffiliatedWith),
            "CITES" => Some(Self::Cites),
            _ => None,
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node as rendered by the graph client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: BusinessId,
    pub label: NodeLabel,
    #[serde(default)]
    pub properties: Properties,
}

/// An edge between two nodes of the same view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: BusinessId,
    pub target: BusinessId,
    #[serde(rename = "type")]
    pub rel_type: RelType,
    #[serde(default)]
    pub properties: Properties,
}

/// Deduplicated node/edge payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphView {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }
}

/// Client-set visual coordinate for a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPosition {
    pub node_id: BusinessId,
    pub x: f64,
    pub y: f64,
}

/// Per-item outcome of a layout batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutReport {
    pub applied: Vec<BusinessId>,
    pub skipped: Vec<BusinessId>,
}

impl LayoutReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Filters for the root graph query. All optional filters combine conjunctively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootFilters {
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_from: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub org_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name_contains: Option<String>,
}

impl Default for RootFilters {
    fn default() -> Self {
        Self {
            limit: DEFAULT_ROOT_LIMIT,
            year_from: None,
            year_to: None,
            org_names: Vec::new(),
            author_name_contains: None,
        }
    }
}

impl RootFilters {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Canonical form: blank strings dropped, organization names trimmed,
    /// sorted and deduplicated.
    pub fn normalized(&self) -> Self {
        let mut org_names: Vec<String> = self
            .org_names
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        org_names.sort();
        org_names.dedup();

        Self {
            limit: self.limit,
            year_from: self.year_from,
            year_to: self.year_to,
            org_names,
            author_name_contains: self
                .author_name_contains
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    pub fn validate(&self) -> KgResult<()> {
        if self.limit < 1 || self.limit > MAX_ROOT_LIMIT {
            return Err(KgError::validation(format!(
                "limit must be between 1 and {}, got {}",
                MAX_ROOT_LIMIT, self.limit
            )));
        }
        if let (Some(from), Some(to)) = (self.year_from, self.year_to) {
            if from > to {
                return Err(KgError::validation(format!(
                    "year_from ({}) is after year_to ({})",
                    from, to
                )));
            }
        }
        Ok(())
    }

    pub fn has_paper_filter(&self) -> bool {
        self.year_from.is_some() || self.year_to.is_some()
    }
}
