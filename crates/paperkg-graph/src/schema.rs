//! Constraints and indexes backing business-id lookups and root filters.

use anyhow::{Context, Result};
use neo4rs::Query;
use paperkg_core::NodeLabel;
use tracing::info;

use crate::GraphClient;

const LABELS: [NodeLabel; 3] = [NodeLabel::Paper, NodeLabel::Author, NodeLabel::Organization];

/// Properties read by root query filters and ordering.
const FILTER_INDEXES: &[(NodeLabel, &str)] = &[
    (NodeLabel::Paper, "year"),
    (NodeLabel::Organization, "name"),
    (NodeLabel::Organization, "abbreviation"),
    (NodeLabel::Author, "org_id"),
];

/// Every schema statement, each guarded with `IF NOT EXISTS`.
pub fn schema_statements() -> Vec<String> {
    let constraints = LABELS.iter().map(|label| {
        let name = label.as_str().to_lowercase();
        format!(
            "CREATE CONSTRAINT {name}_id IF NOT EXISTS FOR (n:{label}) REQUIRE n.id IS UNIQUE",
            name = name,
            label = label.as_str(),
        )
    });
    let indexes = FILTER_INDEXES.iter().map(|(label, property)| {
        format!(
            "CREATE INDEX {name}_{property} IF NOT EXISTS FOR (n:{label}) ON (n.{property})",
            name = label.as_str().to_lowercase(),
            label = label.as_str(),
            property = property,
        )
    });
    constraints.chain(indexes).collect()
}

/// Create the schema. Safe to run repeatedly.
pub async fn initialize_schema(client: &GraphClient) -> Result<()> {
    let statements = schema_statements();
    for statement in &statements {
        client
            .execute(Query::new(statement.clone()))
            .await
            .with_context(|| format!("Schema statement failed: {}", statement))?;
    }

    info!(statements = statements.len(), "Neo4j schema initialized");
    Ok(())
}
