//! Shared data model for the Atlas asset graph.
//!
//! This crate defines the vocabulary every other Atlas crate speaks:
//! update tags, property values, and the node/relationship shapes the
//! graph store persists. It carries no I/O and no store logic.

pub mod graph;
pub mod tag;
pub mod value;

pub use graph::{GraphNode, GraphRelationship, NodeRef, RelDirection};
pub use tag::UpdateTag;
pub use value::PropertyValue;
