//! In-memory backends for tests and `serve --in-memory`.

mod cache;
mod store;

pub use cache::MemoryCache;
pub use store::MemoryGraphStore;
