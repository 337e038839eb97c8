//! GeoPipes Store - Storage ports and the in-memory adapter
//!
//! This crate defines the ports the pipeline reads from (spatial index,
//! layer, editable layer) and provides an in-memory layer backed by an
//! R-tree, grouped into a spatial database.

pub mod index;
pub mod memory;
pub mod ports;

pub use index::RTreeIndex;
pub use memory::{MemoryLayer, SpatialDatabase};
pub use ports::{EditableLayer, Layer, RecordCursor, SearchPredicate, SpatialIndex};
