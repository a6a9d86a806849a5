//! Redis connection pool management.

use paperkg_core::KgError;
use redis::aio::ConnectionManager;
use thiserror::Error;

/// Redis error types.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for Redis operations.
pub type CacheResult<T> = Result<T, CacheError>;

impl From<CacheError> for KgError {
    fn from(e: CacheError) -> Self {
        KgError::unavailable(e)
    }
}

/// ConnectionManager multiplexes and reconnects internally; clone it per operation.
pub type RedisPool = ConnectionManager;

/// Initialize a Redis connection pool from a URL and check it answers PING.
///
/// Example URL: `redis://127.0.0.1:6379/0`
pub async fn init_pool(redis_url: &str) -> CacheResult<RedisPool> {
    let client = redis::Client::open(redis_url)?;
    let mut manager = ConnectionManager::new(client).await?;
    let pong: String = redis::cmd("PING").query_async(&mut manager).await?;
    if pong != "PONG" {
        return Err(CacheError::OperationFailed(format!("unexpected PING reply: {}", pong)));
    }
    Ok(manager)
}
