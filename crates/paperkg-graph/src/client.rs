//! Neo4j connection client.

use anyhow::{Context, Result};
use neo4rs::{ConfigBuilder, Graph, Query};
use paperkg_core::GraphCounts;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::rows::column;

/// Both totals from a single statement.
pub const COUNTS_QUERY: &str = "CALL { MATCH (n) RETURN count(n) AS nodes } \
     CALL { MATCH ()-[r]->() RETURN count(r) AS relationships } \
     RETURN nodes, relationships";

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: "neo4j".to_string(),
            max_connections: 16,
            fetch_size: 200,
        }
    }
}

/// Pooled client for Neo4j. Clone is cheap; clones share the pool.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// `Graph::connect` only builds the pool; the `RETURN 1` ping forces a real
    /// bolt handshake so an unreachable server fails here, at startup.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()
            .context("Failed to build Neo4j config")?;

        let graph = Graph::connect(neo4j_config)
            .await
            .context("Failed to create Neo4j connection pool")?;

        graph.run(Query::new("RETURN 1".to_string())).await
            .context("Neo4j is not responding to queries")?;

        info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, query: Query) -> Result<()> {
        self.graph.run(query).await.context("Neo4j query execution failed")?;
        Ok(())
    }

    /// Execute a Cypher query and return results as rows.
    pub async fn query(&self, query: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(query).await
            .context("Neo4j query failed")?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await.context("Failed to read Neo4j result stream")? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Column `field` of the first row, or `None` when the query matched nothing.
    pub async fn query_scalar<T: DeserializeOwned>(&self, query: Query, field: &str) -> Result<Option<T>> {
        self.query(query)
            .await?
            .first()
            .map(|row| column(row, field))
            .transpose()
    }

    /// Node and relationship totals, read in one round trip.
    pub async fn get_counts(&self) -> Result<GraphCounts> {
        let rows = self.query(Query::new(COUNTS_QUERY.to_string())).await?;
        let Some(row) = rows.first() else {
            return Ok(GraphCounts::default());
        };

        let total = |field: &str| -> Result<usize> {
            let n: i64 = column(row, field)?;
            usize::try_from(n).with_context(|| format!("Negative {} count: {}", field, n))
        };
        Ok(GraphCounts {
            nodes: total("nodes")?,
            relationships: total("relationships")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_query_returns_both_totals() {
        assert_eq!(COUNTS_QUERY.matches("count(").count(), 2);
        assert!(COUNTS_QUERY.ends_with("RETURN nodes, relationships"));
    }

    #[test]
    fn test_config_defaults_apply_to_partial_input() {
        let config: GraphConfig = serde_json::from_str(r#"{"uri": "bolt://graph:7687"}"#).unwrap();
        assert_eq!(config.uri, "bolt://graph:7687");
        assert_eq!(config.database, "neo4j");
        assert_eq!(config.fetch_size, 200);
    }
}
