//! PaperKG Redis cache
//!
//! Implements [`paperkg_core::CacheBackend`] over a Redis connection manager.

pub mod client;
pub mod store;

pub use client::{init_pool, CacheError, CacheResult, RedisPool};
pub use store::RedisCache;
