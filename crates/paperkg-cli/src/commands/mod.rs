//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;

pub mod cache;
pub mod seed;
pub mod serve;
pub mod status;

/// PaperKG - paper knowledge graph API
#[derive(Parser)]
#[command(name = "paperkg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./paperkg.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve(serve::ServeArgs),

    /// Initialize the Neo4j schema and load a dataset
    Seed(seed::SeedArgs),

    /// Show Neo4j counts and cache reachability
    Status,

    /// Cache maintenance
    #[command(subcommand)]
    Cache(cache::CacheCommands),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::load(self.config.as_deref())?;

        match self.command {
            Commands::Serve(args) => serve::execute(args, settings).await,
            Commands::Seed(args) => seed::execute(args, &settings).await,
            Commands::Status => status::execute(&settings).await,
            Commands::Cache(cmd) => cache::execute(cmd, &settings).await,
        }
    }
}
