//! HTTP API server command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use paperkg_cache::RedisCache;
use paperkg_core::dataset::{load_dataset, Dataset};
use paperkg_core::memory::{MemoryCache, MemoryGraphStore};
use paperkg_core::{GraphCache, GraphService, GraphStore};
use paperkg_graph::{GraphClient, Neo4jGraphStore};
use paperkg_web::AppState;
use tracing::{info, warn};

use crate::config::Settings;

#[derive(Args)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Serve the sample dataset from memory instead of Neo4j and Redis
    #[arg(long)]
    pub in_memory: bool,

    /// Run without a cache
    #[arg(long)]
    pub no_cache: bool,

    /// Include internal error details in 500 responses
    #[arg(long)]
    pub debug: bool,

    /// Also write daily-rotated log files to this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl ServeArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if self.debug {
            settings.server.debug = true;
        }
    }
}

pub async fn execute(args: ServeArgs, mut settings: Settings) -> Result<()> {
    args.apply(&mut settings);

    let (store, cache) = if args.in_memory {
        in_memory_backends(args.no_cache).await?
    } else {
        live_backends(&settings, args.no_cache).await?
    };
    let cache_mode = if cache.is_enabled() { "enabled".green() } else { "disabled".yellow() };
    let service = GraphService::new(store, cache);

    let host = &settings.server.host;
    let port = settings.server.port;

    println!();
    println!("  {} {}", "PaperKG".cyan().bold(), "API Server".bold());
    println!();
    println!("  {}        http://{}:{}/api/v1/graph", "API".green(), host, port);
    println!("  {}     http://{}:{}/health", "Health".green(), host, port);
    println!(
        "  {}    {}",
        "Backend".green(),
        if args.in_memory { "in-memory sample" } else { settings.neo4j.uri.as_str() }
    );
    println!("  {}      {}", "Cache".green(), cache_mode);
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    paperkg_web::run_server(AppState::new(service, settings.server.debug), host, port).await
}

async fn in_memory_backends(no_cache: bool) -> Result<(Arc<dyn GraphStore>, GraphCache)> {
    let store = Arc::new(MemoryGraphStore::new());
    let summary = load_dataset(store.as_ref(), &Dataset::sample()).await?;
    info!(nodes = summary.nodes, relationships = summary.relationships, "Sample dataset loaded");

    let cache = if no_cache {
        GraphCache::disabled()
    } else {
        GraphCache::new(Arc::new(MemoryCache::new()))
    };
    Ok((store, cache))
}

async fn live_backends(settings: &Settings, no_cache: bool) -> Result<(Arc<dyn GraphStore>, GraphCache)> {
    let client = GraphClient::connect(&settings.neo4j).await?;
    let store = Arc::new(Neo4jGraphStore::new(client));

    let cache = if no_cache {
        GraphCache::disabled()
    } else {
        match paperkg_cache::init_pool(&settings.redis.url).await {
            Ok(pool) => {
                info!(url = %settings.redis.url, "Connected to Redis");
                GraphCache::new(Arc::new(RedisCache::new(pool)))
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, serving without cache");
                GraphCache::disabled()
            }
        }
    };
    Ok((store, cache))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let mut settings = Settings::default();
        let args = ServeArgs {
            host: Some("127.0.0.1".into()),
            port: None,
            in_memory: false,
            no_cache: false,
            debug: true,
            log_dir: None,
        };
        args.apply(&mut settings);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8000);
        assert!(settings.server.debug);
    }

    #[tokio::test]
    async fn test_in_memory_backends_serve_sample() {
        let (store, cache) = in_memory_backends(true).await.unwrap();
        assert!(!cache.is_enabled());
        let counts = store.counts().await.unwrap();
        assert_eq!(counts.nodes, 9);
    }
}
