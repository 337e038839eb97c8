//! GeoPipes Pipeline - Lazy geometry pipelines over layers
//!
//! A pipeline starts from a layer search and chains filter, transform,
//! metric, aggregate and serialization stages. Streaming stages pull one
//! flow at a time; sorting, extrema, overlays and density-island grouping
//! drain their input first.

pub mod cql;
pub mod models;
pub mod pipeline;
mod stages;
pub mod start;

pub use cql::CqlFilter;
pub use models::{reserved, Flow};
pub use pipeline::{FlowCollection, Pipeline, Stage};
pub use start::{
    start, start_equal_exact_search, start_intersect_window_search, start_window_search,
    start_with,
};
