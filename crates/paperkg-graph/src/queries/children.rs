//! Neighborhood expansion around a single node.

use anyhow::Result;
use paperkg_core::assembler::NeighborRecord;
use paperkg_core::BusinessId;

use crate::cypher::{known_labels, node_columns, rel_columns, CypherQuery, ParamValue};
use crate::rows::{raw_node, raw_rel};
use crate::GraphClient;

/// Outcome of a neighborhood query.
#[derive(Debug)]
pub enum Neighborhood {
    /// The node does not exist.
    Missing,
    /// The node exists; `records` is empty when it has no neighbors.
    Found(Vec<NeighborRecord>),
}

pub fn build_children_query(node_id: &BusinessId) -> CypherQuery {
    let text = format!(
        "MATCH (n)
         WHERE n.id = $id AND {labels}
         OPTIONAL MATCH (n)-[r]-(m)
         WITH n, r, m
         ORDER BY type(r), m.id
         RETURN {n}, {r}, {m}",
        labels = known_labels("n"),
        n = node_columns("n"),
        r = rel_columns("r"),
        m = node_columns("m"),
    );
    CypherQuery::new(text).param("id", ParamValue::Str(node_id.as_str().to_string()))
}

/// Fetch direct neighbors (either direction).
///
/// Zero rows means the node is absent; a single row with null `m` means it
/// exists without neighbors.
pub async fn fetch_neighbors(client: &GraphClient, node_id: &BusinessId) -> Result<Neighborhood> {
    let rows = client.query(build_children_query(node_id).into_query()).await?;
    if rows.is_empty() {
        return Ok(Neighborhood::Missing);
    }

    let mut records = Vec::new();
    for row in &rows {
        let (Some(center), Some(relationship), Some(neighbor)) =
            (raw_node(row, "n")?, raw_rel(row, "r")?, raw_node(row, "m")?)
        else {
            continue;
        };
        records.push(NeighborRecord {
            center,
            relationship,
            neighbor,
        });
    }
    Ok(Neighborhood::Found(records))
}
