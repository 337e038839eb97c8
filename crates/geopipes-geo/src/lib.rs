//! GeoPipes Geo - planar geometry algorithms
//!
//! This crate holds every geometric operation the pipeline stages call:
//! validation, normalization and the three equality comparators, unary
//! transforms, overlay aggregates, measures, text writers and
//! density-island clustering.

pub mod cluster;
pub mod equality;
pub mod measure;
pub mod models;
pub mod normalize;
pub mod ops;
pub mod overlay;
pub mod serialize;
pub mod spatial;
pub mod transform;
pub mod validation;

pub use models::{parse_wkt, GeometryExt};
