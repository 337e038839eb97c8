//! The three geometry equality comparators.
//!
//! They are deliberately separate algorithms:
//! - exact: same structure, same vertex order, coordinates within tolerance
//! - norm: exact comparison after [`normalize`](crate::normalize::normalize)
//! - topo: same point set, regardless of representation
//!
//! Every exact match is a norm match at the same tolerance. With tolerance 0
//! every norm match is also a topo match; a positive tolerance widens exact
//! and norm but not topo.

use crate::models::{to_canonical, GeometryExt};
use crate::normalize::normalize;
use geo::{Coord, Geometry, LineString, Polygon, Relate};

/// Which comparator to run, with its tolerance where it takes one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EqualityMode {
    Exact { tolerance: f64 },
    Norm { tolerance: f64 },
    Topo,
}

impl EqualityMode {
    pub fn matches(&self, a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
        match *self {
            EqualityMode::Exact { tolerance } => equal_exact(a, b, tolerance),
            EqualityMode::Norm { tolerance } => equal_norm(a, b, tolerance),
            EqualityMode::Topo => equal_topo(a, b),
        }
    }
}

/// Coordinate-wise comparison: structure and vertex order must match and each
/// vertex pair lies within `tolerance` of each other.
pub fn equal_exact(a: &Geometry<f64>, b: &Geometry<f64>, tolerance: f64) -> bool {
    let a = to_canonical(a.clone());
    let b = to_canonical(b.clone());
    exact(&a, &b, tolerance)
}

/// Exact comparison of the normalized forms. A pair that already matches
/// exactly passes even when a vertex within tolerance moved the canonical
/// ring start.
pub fn equal_norm(a: &Geometry<f64>, b: &Geometry<f64>, tolerance: f64) -> bool {
    equal_exact(a, b, tolerance) || exact(&normalize(a), &normalize(b), tolerance)
}

/// Point-set equality.
pub fn equal_topo(a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
    match (a.is_empty_geometry(), b.is_empty_geometry()) {
        (true, true) => true,
        (false, false) => a.relate(b).is_equal_topo(),
        _ => false,
    }
}

fn exact(a: &Geometry<f64>, b: &Geometry<f64>, tolerance: f64) -> bool {
    match (a, b) {
        (Geometry::Point(pa), Geometry::Point(pb)) => coord_within(pa.0, pb.0, tolerance),
        (Geometry::LineString(la), Geometry::LineString(lb)) => line_within(la, lb, tolerance),
        (Geometry::Polygon(pa), Geometry::Polygon(pb)) => polygon_within(pa, pb, tolerance),
        (Geometry::MultiPoint(ma), Geometry::MultiPoint(mb)) => {
            ma.0.len() == mb.0.len()
                && ma.0.iter().zip(&mb.0).all(|(x, y)| coord_within(x.0, y.0, tolerance))
        }
        (Geometry::MultiLineString(ma), Geometry::MultiLineString(mb)) => {
            ma.0.len() == mb.0.len()
                && ma.0.iter().zip(&mb.0).all(|(x, y)| line_within(x, y, tolerance))
        }
        (Geometry::MultiPolygon(ma), Geometry::MultiPolygon(mb)) => {
            ma.0.len() == mb.0.len()
                && ma.0.iter().zip(&mb.0).all(|(x, y)| polygon_within(x, y, tolerance))
        }
        (Geometry::GeometryCollection(ga), Geometry::GeometryCollection(gb)) => {
            ga.0.len() == gb.0.len() && ga.0.iter().zip(&gb.0).all(|(x, y)| exact(x, y, tolerance))
        }
        _ => false,
    }
}

fn coord_within(a: Coord<f64>, b: Coord<f64>, tolerance: f64) -> bool {
    if a == b {
        return true;
    }
    (a.x - b.x).hypot(a.y - b.y) <= tolerance
}

fn line_within(a: &LineString<f64>, b: &LineString<f64>, tolerance: f64) -> bool {
    a.0.len() == b.0.len() && a.0.iter().zip(&b.0).all(|(x, y)| coord_within(*x, *y, tolerance))
}

fn polygon_within(a: &Polygon<f64>, b: &Polygon<f64>, tolerance: f64) -> bool {
    line_within(a.exterior(), b.exterior(), tolerance)
        && a.interiors().len() == b.interiors().len()
        && a.interiors().iter().zip(b.interiors()).all(|(x, y)| line_within(x, y, tolerance))
}
