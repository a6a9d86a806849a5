//! # PaperKG Core
//!
//! Graph query and caching layer for the paper knowledge graph.
//!
//! Defines the node/edge model, the business-id identity contract, the pure
//! record assembler, the degrading read-through cache and the [`GraphService`]
//! that the HTTP layer calls into. Storage backends implement [`GraphStore`]
//! and [`CacheBackend`].

pub mod assembler;
pub mod cache;
pub mod dataset;
pub mod error;
pub mod identity;
pub mod memory;
pub mod model;
pub mod service;
pub mod store;

pub use cache::{CacheBackend, GraphCache};
pub use error::{KgError, KgResult};
pub use identity::{BusinessId, InternalId};
pub use model::{Edge, GraphView, LayoutPosition, LayoutReport, Node, NodeLabel, Properties, RelType, RootFilters};
pub use service::GraphService;
pub use store::{GraphCounts, GraphStore};
