//! Single node lookup by business id.

use anyhow::Result;
use paperkg_core::assembler::node_from_raw;
use paperkg_core::{BusinessId, Node};

use crate::cypher::{known_labels, node_columns, CypherQuery, ParamValue};
use crate::rows::raw_node;
use crate::GraphClient;

pub fn build_detail_query(node_id: &BusinessId) -> CypherQuery {
    let text = format!(
        "MATCH (n)
         WHERE n.id = $id AND {labels}
         RETURN {n}
         LIMIT 1",
        labels = known_labels("n"),
        n = node_columns("n"),
    );
    CypherQuery::new(text).param("id", ParamValue::Str(node_id.as_str().to_string()))
}

pub async fn fetch_node(client: &GraphClient, node_id: &BusinessId) -> Result<Option<Node>> {
    let rows = client.query(build_detail_query(node_id).into_query()).await?;
    match rows.first() {
        Some(row) => Ok(raw_node(row, "n")?.as_ref().and_then(node_from_raw)),
        None => Ok(None),
    }
}
