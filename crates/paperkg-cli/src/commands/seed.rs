//! Dataset loading command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use paperkg_cache::RedisCache;
use paperkg_core::cache::ALL_PATTERN;
use paperkg_core::dataset::{load_dataset, Dataset};
use paperkg_core::{GraphCache, GraphStore};
use paperkg_graph::{schema, GraphClient, Neo4jGraphStore};
use tracing::warn;

use crate::config::Settings;

#[derive(Args)]
pub struct SeedArgs {
    /// Delete every node and relationship before loading
    #[arg(long)]
    pub reset: bool,

    /// JSON dataset to load instead of the built-in sample
    #[arg(long)]
    pub file: Option<PathBuf>,
}

fn read_dataset(path: Option<&PathBuf>) -> Result<Dataset> {
    match path {
        None => Ok(Dataset::sample()),
        Some(p) => {
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read dataset {}", p.display()))?;
            serde_json::from_str(&contents).with_context(|| format!("Invalid dataset {}", p.display()))
        }
    }
}

pub async fn execute(args: SeedArgs, settings: &Settings) -> Result<()> {
    let dataset = read_dataset(args.file.as_ref())?;

    let client = GraphClient::connect(&settings.neo4j).await?;
    schema::initialize_schema(&client).await?;
    let store = Neo4jGraphStore::new(client);

    if args.reset {
        store.clear().await?;
        println!("{} Cleared existing graph", "✓".green());
    }

    println!("{}", "Loading dataset...".bold());
    let summary = load_dataset(&store, &dataset).await?;
    println!("  Nodes:         {}", summary.nodes.to_string().cyan());
    println!("  Relationships: {}", summary.relationships.to_string().cyan());
    if summary.skipped > 0 {
        println!("  Skipped links: {}", summary.skipped.to_string().yellow());
    }

    // Cached views may describe the previous graph.
    match paperkg_cache::init_pool(&settings.redis.url).await {
        Ok(pool) => {
            let cache = GraphCache::new(Arc::new(RedisCache::new(pool)));
            if let Some(removed) = cache.invalidate_pattern(ALL_PATTERN).await {
                println!("  Cache entries purged: {}", removed);
            }
        }
        Err(e) => warn!(error = %e, "Redis unavailable, cache not purged"),
    }

    println!("{} Dataset loaded", "✓".green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dataset_is_sample() {
        let dataset = read_dataset(None).unwrap();
        assert_eq!(dataset.organizations.len(), 3);
        assert_eq!(dataset.authorships.len(), 6);
    }

    #[test]
    fn test_dataset_file() {
        let path = std::env::temp_dir().join(format!("paperkg-seed-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"organizations": [{"id": "org_x", "name": "Example Institute"}]}"#,
        )
        .unwrap();

        let dataset = read_dataset(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(dataset.organizations.len(), 1);
        assert!(dataset.papers.is_empty());
    }

    #[test]
    fn test_missing_dataset_file_is_an_error() {
        assert!(read_dataset(Some(&PathBuf::from("/nonexistent/data.json"))).is_err());
    }
}
