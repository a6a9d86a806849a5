//! Node identity across the two id spaces.
//!
//! The graph engine assigns every node an internal id that changes whenever the
//! data is reloaded or reindexed. Entities also carry a stable business id
//! (`paper_001`, `author_002`, ...) assigned at load time. Only business ids may
//! appear in API payloads and cache keys; [`InternalId`] is intentionally not
//! `Serialize` so it cannot leak into either.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Properties, RelType};

/// Property holding the business id on every node.
pub const ID_PROPERTY: &str = "id";

/// Stable, application-assigned node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessId(String);

impl BusinessId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the business id from a node's property map.
    ///
    /// Returns `None` when the property is absent, not a string, or blank.
    pub fn from_properties(properties: &Properties) -> Option<Self> {
        properties
            .get(ID_PROPERTY)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::new)
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BusinessId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BusinessId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Graph-engine node identifier (Neo4j `elementId`, or the in-memory ordinal).
///
/// Only meaningful inside a single result batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InternalId(String);

impl InternalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Derive the id of an edge from its endpoints and type.
///
/// Deterministic, so the same relationship always gets the same id whether it
/// came from the store or was synthesized.
pub fn edge_id(source: &BusinessId, target: &BusinessId, rel_type: RelType) -> String {
    format!("{}->{}:{}", source, target, rel_type.as_str())
}

/// Per-batch mapping from internal ids to business ids.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    ids: HashMap<InternalId, BusinessId>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node's identity. Returns its business id, or `None` if the node
    /// has none (such a node must not be surfaced).
    pub fn register(&mut self, internal: &InternalId, properties: &Properties) -> Option<BusinessId> {
        let business = BusinessId::from_properties(properties)?;
        self.ids.insert(internal.clone(), business.clone());
        Some(business)
    }

    pub fn resolve(&self, internal: &InternalId) -> Option<&BusinessId> {
        self.ids.get(internal)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(id: serde_json::Value) -> Properties {
        let mut p = Properties::new();
        p.insert(ID_PROPERTY.to_string(), id);
        p
    }

    #[test]
    fn test_business_id_from_properties() {
        assert_eq!(
            BusinessId::from_properties(&props(json!("author_001"))),
            Some(BusinessId::new("author_001"))
        );
        assert_eq!(BusinessId::from_properties(&props(json!(42))), None);
        assert_eq!(BusinessId::from_properties(&props(json!("  "))), None);
        assert_eq!(BusinessId::from_properties(&Properties::new()), None);
    }

    #[test]
    fn test_edge_id_is_deterministic() {
        let a = BusinessId::new("author_001");
        let o = BusinessId::new("org_001");
        assert_eq!(edge_id(&a, &o, RelType::AffiliatedWith), "author_001->org_001:AFFILIATED_WITH");
        assert_eq!(
            edge_id(&a, &o, RelType::AffiliatedWith),
            edge_id(&a.clone(), &o.clone(), RelType::AffiliatedWith)
        );
    }

    #[test]
    fn test_resolver_maps_internal_to_business() {
        let mut resolver = IdentityResolver::new();
        let internal = InternalId::new("4:abc:17");
        let registered = resolver.register(&internal, &props(json!("paper_001")));
        assert_eq!(registered, Some(BusinessId::new("paper_001")));
        assert_eq!(resolver.resolve(&internal), Some(&BusinessId::new("paper_001")));
        assert!(resolver.resolve(&InternalId::new("4:abc:18")).is_none());
    }

    #[test]
    fn test_resolver_skips_nodes_without_business_id() {
        let mut resolver = IdentityResolver::new();
        assert!(resolver.register(&InternalId::new("1"), &Properties::new()).is_none());
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_business_id_serializes_as_plain_string() {
        let id = BusinessId::new("org_001");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"org_001\"");
    }
}
