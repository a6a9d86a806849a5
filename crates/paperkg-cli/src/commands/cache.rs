//! Cache maintenance commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use paperkg_cache::RedisCache;
use paperkg_core::cache::ALL_PATTERN;
use paperkg_core::CacheBackend;

use crate::config::Settings;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Remove every cached graph view
    Clear,
}

pub async fn execute(cmd: CacheCommands, settings: &Settings) -> Result<()> {
    match cmd {
        CacheCommands::Clear => cmd_clear(settings).await,
    }
}

async fn cmd_clear(settings: &Settings) -> Result<()> {
    let pool = paperkg_cache::init_pool(&settings.redis.url).await?;
    let removed = RedisCache::new(pool).delete_pattern(ALL_PATTERN).await?;
    println!("{} Removed {} cache entries", "✓".green(), removed);
    Ok(())
}
