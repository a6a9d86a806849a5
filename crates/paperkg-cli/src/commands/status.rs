//! Backend status command.

use colored::Colorize;
use anyhow::Result;
use paperkg_cache::RedisCache;
use paperkg_core::CacheBackend;
use paperkg_graph::GraphClient;

use crate::config::Settings;

/// Show Neo4j counts and Redis reachability. Unreachable backends are
/// reported rather than treated as errors.
pub async fn execute(settings: &Settings) -> Result<()> {
    println!("{}", "PaperKG Status".bold());
    println!("{}", "─".repeat(40));

    println!("  Neo4j:         {}", settings.neo4j.uri.dimmed());
    match GraphClient::connect(&settings.neo4j).await {
        Ok(client) => {
            let counts = client.get_counts().await?;
            println!("  Nodes:         {}", counts.nodes.to_string().cyan());
            println!("  Relationships: {}", counts.relationships.to_string().cyan());
        }
        Err(e) => println!("  Status:        {} ({:#})", "unreachable".red(), e),
    }

    println!("  Redis:         {}", settings.redis.url.dimmed());
    let redis = match paperkg_cache::init_pool(&settings.redis.url).await {
        Ok(pool) => RedisCache::new(pool).ping().await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    match redis {
        Ok(()) => println!("  Status:        {}", "ok".green()),
        Err(e) => println!("  Status:        {} ({})", "unreachable".red(), e),
    }

    println!("{}", "─".repeat(40));
    Ok(())
}
