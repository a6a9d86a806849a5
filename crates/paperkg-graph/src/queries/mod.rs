//! Cypher queries backing the graph store operations.

pub mod children;
pub mod detail;
pub mod layout;
pub mod root;
pub mod write;
