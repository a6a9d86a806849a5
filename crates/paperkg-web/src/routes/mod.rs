//! Route handlers.

pub mod graph;
pub mod system;
