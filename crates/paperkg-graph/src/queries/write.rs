//! Node and relationship creation for the data loader.
//!
//! Both use `MERGE` on business ids so a load can be re-run without
//! duplicating entities.

use anyhow::Result;
use neo4rs::Query;
use paperkg_core::identity::ID_PROPERTY;
use paperkg_core::{BusinessId, NodeLabel, Properties, RelType};
use tracing::debug;

use crate::cypher::{known_labels, safe_key, CypherQuery, ParamValue};
use crate::GraphClient;

/// `SET` clause for `var` binding every non-null property as `$p{i}`.
fn set_clause(var: &str, properties: &Properties, query: &mut CypherQuery) -> String {
    let mut assignments = Vec::new();
    for (key, value) in properties {
        if key == ID_PROPERTY {
            continue;
        }
        let (Some(key), Some(value)) = (safe_key(key), ParamValue::from_json(value)) else {
            debug!(key = %key, "Skipping property that cannot be stored");
            continue;
        };
        let name = format!("p{}", query.params.len());
        assignments.push(format!("{}.{} = ${}", var, key, name));
        query.params.push((name, value));
    }

    if assignments.is_empty() {
        String::new()
    } else {
        format!("\n         SET {}", assignments.join(", "))
    }
}

pub fn build_create_node_query(label: NodeLabel, id: &BusinessId, properties: &Properties) -> CypherQuery {
    let mut query = CypherQuery::new(String::new()).param("id", ParamValue::Str(id.as_str().to_string()));
    let set = set_clause("n", properties, &mut query);
    query.text = format!(
        "MERGE (n:{label} {{id: $id}}){set}
         RETURN n.id AS id",
        label = label.as_str(),
        set = set,
    );
    query
}

pub fn build_create_relationship_query(
    source: &BusinessId,
    target: &BusinessId,
    rel_type: RelType,
    properties: &Properties,
) -> CypherQuery {
    let mut query = CypherQuery::new(String::new())
        .param("source", ParamValue::Str(source.as_str().to_string()))
        .param("target", ParamValue::Str(target.as_str().to_string()));
    let set = set_clause("r", properties, &mut query);
    query.text = format!(
        "MATCH (a) WHERE a.id = $source AND {a_labels}
         MATCH (b) WHERE b.id = $target AND {b_labels}
         MERGE (a)-[r:{rel}]->(b){set}
         RETURN count(r) AS created",
        a_labels = known_labels("a"),
        b_labels = known_labels("b"),
        rel = rel_type.as_str(),
        set = set,
    );
    query
}

pub async fn create_node(
    client: &GraphClient,
    label: NodeLabel,
    id: &BusinessId,
    properties: &Properties,
) -> Result<()> {
    client
        .execute(build_create_node_query(label, id, properties).into_query())
        .await
}

/// Returns `false` when either endpoint is missing.
pub async fn create_relationship(
    client: &GraphClient,
    source: &BusinessId,
    target: &BusinessId,
    rel_type: RelType,
    properties: &Properties,
) -> Result<bool> {
    let query = build_create_relationship_query(source, target, rel_type, properties).into_query();
    let created: i64 = client.query_scalar(query, "created").await?.unwrap_or(0);
    Ok(created > 0)
}

/// Delete every node and relationship.
pub async fn clear_graph(client: &GraphClient) -> Result<()> {
    client
        .execute(Query::new("MATCH (n) DETACH DELETE n".to_string()))
        .await
}
