//! # PaperKG Graph
//!
//! Neo4j adapter for the paper knowledge graph.
//!
//! Builds parameterized Cypher for the root, neighborhood, detail and layout
//! operations, decodes rows into raw records and hands them to the core
//! assembler. Implements [`paperkg_core::GraphStore`].

pub mod client;
pub mod cypher;
pub mod queries;
pub mod rows;
pub mod schema;
pub mod store;

pub use client::{GraphClient, GraphConfig};
pub use store::Neo4jGraphStore;
