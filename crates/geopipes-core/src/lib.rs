//! GeoPipes Core - Domain models, errors, and configuration
//!
//! This crate contains the records, property values and geometry factory shared
//! by the geometry, store and pipeline crates.

pub mod config;
pub mod error;
pub mod models;

pub use error::{GeopipesError, Result};
