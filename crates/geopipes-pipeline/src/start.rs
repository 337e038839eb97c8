//! Entry points: a pipeline starts from a layer search.

use crate::pipeline::Pipeline;
use geo::{Geometry, Rect};
use geopipes_core::error::Result;
use geopipes_geo::equality::EqualityMode;
use geopipes_store::{Layer, SearchPredicate};

/// Pipeline over every record of `layer`
pub fn start<L: Layer + ?Sized>(layer: &L) -> Result<Pipeline> {
    start_with(layer, &SearchPredicate::All)
}

/// Pipeline over the records of `layer` matching `predicate`
pub fn start_with<L: Layer + ?Sized>(layer: &L, predicate: &SearchPredicate) -> Result<Pipeline> {
    tracing::debug!(layer = layer.name(), predicate = predicate.kind(), "Starting pipeline");
    let cursor = layer.search(predicate)?;
    Ok(Pipeline::from_cursor(cursor, layer.geometry_factory().clone()))
}

/// Pipeline over the records whose geometry equals `geometry` exactly,
/// coordinates within `tolerance`
pub fn start_equal_exact_search<L: Layer + ?Sized>(
    layer: &L,
    geometry: Geometry<f64>,
    tolerance: f64,
) -> Result<Pipeline> {
    let predicate = SearchPredicate::Equal { geometry, mode: EqualityMode::Exact { tolerance } };
    start_with(layer, &predicate)
}

/// Pipeline over the records whose envelope intersects `window`
pub fn start_intersect_window_search<L: Layer + ?Sized>(layer: &L, window: Rect<f64>) -> Result<Pipeline> {
    start_with(layer, &SearchPredicate::Window(window))
}

/// Same as [`start_intersect_window_search`]
pub fn start_window_search<L: Layer + ?Sized>(layer: &L, window: Rect<f64>) -> Result<Pipeline> {
    start_intersect_window_search(layer, window)
}
