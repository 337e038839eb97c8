//! Planar measures: area, length and distance.

use crate::models::{to_canonical, GeometryExt};
use geo::{Area, Distance, Euclidean, Geometry, LineString, Point};
use geopipes_core::error::{GeopipesError, Result};

/// Planar area; zero for points and lines.
pub fn area(geometry: &Geometry<f64>) -> f64 {
    geometry.unsigned_area()
}

/// Length of lines, perimeter of polygons (all rings), zero for points.
pub fn length(geometry: &Geometry<f64>) -> f64 {
    match to_canonical(geometry.clone()) {
        Geometry::LineString(ls) => line_length(&ls),
        Geometry::MultiLineString(mls) => mls.0.iter().map(line_length).sum(),
        Geometry::Polygon(poly) => {
            line_length(poly.exterior()) + poly.interiors().iter().map(line_length).sum::<f64>()
        }
        Geometry::MultiPolygon(mp) => mp
            .0
            .iter()
            .map(|p| line_length(p.exterior()) + p.interiors().iter().map(line_length).sum::<f64>())
            .sum(),
        Geometry::GeometryCollection(gc) => gc.0.iter().map(length).sum(),
        _ => 0.0,
    }
}

fn line_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment| Euclidean.distance(Point(segment.start), Point(segment.end)))
        .sum()
}

/// Minimum Euclidean distance between two geometries.
pub fn distance(a: &Geometry<f64>, b: &Geometry<f64>) -> Result<f64> {
    if a.is_empty_geometry() || b.is_empty_geometry() {
        return Err(GeopipesError::unsupported(
            "calculateDistance",
            "distance to an empty geometry is undefined",
        ));
    }
    Ok(Euclidean.distance(a, b))
}
