//! Geometry helpers shared by the algorithm modules.
//!
//! Everything in this crate works on `geo::Geometry<f64>`. This module adds
//! WKT parsing and an extension trait with the small queries the pipeline
//! asks of every geometry (type name, emptiness, vertex count, envelope).

use geo::{BoundingRect, Coord, CoordsIter, Geometry, GeometryCollection, LineString, Polygon, Rect};
use geopipes_core::error::{GeopipesError, Result};
use std::str::FromStr;

/// Parse a WKT string into a planar geometry.
pub fn parse_wkt(text: &str) -> Result<Geometry<f64>> {
    wkt::Wkt::<f64>::from_str(text.trim())
        .map_err(|e| GeopipesError::WktParse(format!("{}: {}", text.trim(), e)))
        .and_then(|w| {
            w.try_into().map_err(|e: wkt::conversion::Error| {
                GeopipesError::WktParse(format!("{}: {:?}", text.trim(), e))
            })
        })
}

/// An empty geometry collection, used wherever an operation has no result.
pub fn empty_geometry() -> Geometry<f64> {
    Geometry::GeometryCollection(GeometryCollection(vec![]))
}

/// An empty polygon, the result of an areal operation with no area.
pub fn empty_polygon() -> Geometry<f64> {
    Geometry::Polygon(Polygon::new(LineString::new(vec![]), vec![]))
}

/// Rewrite the geo-only variants (`Line`, `Rect`, `Triangle`) into the
/// general ones so the rest of the crate only deals with simple-features
/// types.
pub fn to_canonical(geometry: Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::Line(line) => Geometry::LineString(LineString::new(vec![line.start, line.end])),
        Geometry::Rect(rect) => Geometry::Polygon(rect.to_polygon()),
        Geometry::Triangle(triangle) => Geometry::Polygon(triangle.to_polygon()),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection(
            gc.0.into_iter().map(to_canonical).collect(),
        )),
        other => other,
    }
}

/// Extension trait with the geometry queries the stages need.
pub trait GeometryExt {
    /// Simple-features type name, e.g. `"Polygon"`.
    fn type_name(&self) -> &'static str;

    /// True when the geometry has no coordinates at all.
    fn is_empty_geometry(&self) -> bool;

    /// Number of stored coordinates, ring-closing repeats included.
    fn num_points(&self) -> usize;

    /// Every stored coordinate in storage order.
    fn coordinates(&self) -> Vec<Coord<f64>>;

    /// Axis-aligned envelope, `None` for empty geometries.
    fn envelope(&self) -> Option<Rect<f64>>;
}

impl GeometryExt for Geometry<f64> {
    fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::Line(_) | Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "Polygon",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::GeometryCollection(_) => "GeometryCollection",
        }
    }

    fn is_empty_geometry(&self) -> bool {
        self.coords_count() == 0
    }

    fn num_points(&self) -> usize {
        self.coords_count()
    }

    fn coordinates(&self) -> Vec<Coord<f64>> {
        self.coords_iter().collect()
    }

    fn envelope(&self) -> Option<Rect<f64>> {
        self.bounding_rect()
    }
}

/// Envelope of the four scalar bounds `(min_x, min_y, max_x, max_y)`.
pub fn envelope_from_bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Rect<f64> {
    Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
}
