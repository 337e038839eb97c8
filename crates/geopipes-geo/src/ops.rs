//! Unary geometry operations behind the transform stages.

use crate::models::{empty_geometry, empty_polygon, to_canonical, GeometryExt};
use crate::normalize::{compare_coords, normalize, normalize_polygon};
use crate::validation::ensure_valid;
use geo::{
    Area, Buffer, Centroid, ConvexHull, Coord, CoordsIter, Geometry, InteriorPoint, LineString,
    MultiLineString, MultiPoint, MultiPolygon, Point, Polygon, Simplify,
};
use geopipes_core::error::{GeopipesError, Result};
use geopipes_core::models::ValidityMode;

/// Boundary of a geometry.
///
/// A polygon without holes yields the closed line of its shell, polygons with
/// holes and multipolygons yield a multi line string of all rings, lines
/// yield their endpoints (mod-2 rule for multi lines) and points yield an
/// empty collection.
pub fn boundary(geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
    match to_canonical(geometry.clone()) {
        Geometry::Point(_) | Geometry::MultiPoint(_) => Ok(empty_geometry()),
        Geometry::LineString(ls) => Ok(line_boundary(std::slice::from_ref(&ls))),
        Geometry::MultiLineString(mls) => Ok(line_boundary(&mls.0)),
        Geometry::Polygon(poly) => {
            if poly.exterior().0.is_empty() {
                Ok(Geometry::MultiLineString(MultiLineString(vec![])))
            } else if poly.interiors().is_empty() {
                Ok(Geometry::LineString(poly.exterior().clone()))
            } else {
                Ok(Geometry::MultiLineString(MultiLineString(polygon_rings(&poly))))
            }
        }
        Geometry::MultiPolygon(mp) => Ok(Geometry::MultiLineString(MultiLineString(
            mp.0.iter().flat_map(polygon_rings).collect(),
        ))),
        other => Err(GeopipesError::unsupported(
            "toBoundary",
            format!("{} has no defined boundary", other.type_name()),
        )),
    }
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<LineString<f64>> {
    std::iter::once(polygon.exterior().clone()).chain(polygon.interiors().iter().cloned()).collect()
}

/// Endpoints that occur an odd number of times.
fn line_boundary(lines: &[LineString<f64>]) -> Geometry<f64> {
    let mut endpoints: Vec<Coord<f64>> = Vec::new();
    for line in lines {
        if line.is_closed() {
            continue;
        }
        if let (Some(first), Some(last)) = (line.0.first(), line.0.last()) {
            endpoints.push(*first);
            endpoints.push(*last);
        }
    }
    endpoints.sort_by(compare_coords);

    let mut points = Vec::new();
    let mut i = 0;
    while i < endpoints.len() {
        let mut j = i;
        while j < endpoints.len() && endpoints[j] == endpoints[i] {
            j += 1;
        }
        if (j - i) % 2 == 1 {
            points.push(Point(endpoints[i]));
        }
        i = j;
    }
    Geometry::MultiPoint(MultiPoint(points))
}

/// Smallest convex geometry containing the input.
///
/// One distinct point gives a Point, collinear input gives the LineString
/// between its extreme points, anything else a clockwise polygon starting at
/// its lowest-left vertex.
pub fn convex_hull(geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
    let mut distinct: Vec<Coord<f64>> = geometry.coords_iter().collect();
    distinct.sort_by(compare_coords);
    distinct.dedup();

    match distinct.len() {
        0 => Ok(empty_geometry()),
        1 => Ok(Geometry::Point(Point(distinct[0]))),
        n => {
            let hull = geometry.convex_hull();
            if n == 2 || hull.unsigned_area() == 0.0 {
                let (first, last) = (distinct[0], distinct[n - 1]);
                Ok(Geometry::LineString(LineString::new(vec![first, last])))
            } else {
                Ok(Geometry::Polygon(normalize_polygon(&hull)))
            }
        }
    }
}

/// Insert vertices so that no segment is longer than `tolerance`.
///
/// A segment of length `L` is split into `floor(L / tolerance) + 1` equal
/// pieces whenever that is more than one piece.
pub fn densify(geometry: &Geometry<f64>, tolerance: f64) -> Result<Geometry<f64>> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(GeopipesError::invalid_argument(
            "densify",
            format!("tolerance must be finite and positive, got {}", tolerance),
        ));
    }

    Ok(match to_canonical(geometry.clone()) {
        Geometry::LineString(ls) => Geometry::LineString(densify_line(&ls, tolerance)),
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString(
            mls.0.iter().map(|ls| densify_line(ls, tolerance)).collect(),
        )),
        Geometry::Polygon(poly) => Geometry::Polygon(densify_polygon(&poly, tolerance)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon(
            mp.0.iter().map(|p| densify_polygon(p, tolerance)).collect(),
        )),
        Geometry::GeometryCollection(gc) => {
            let members = gc
                .0
                .iter()
                .map(|member| densify(member, tolerance))
                .collect::<Result<Vec<_>>>()?;
            Geometry::GeometryCollection(geo::GeometryCollection(members))
        }
        other => other,
    })
}

fn densify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    Polygon::new(
        densify_line(polygon.exterior(), tolerance),
        polygon.interiors().iter().map(|ring| densify_line(ring, tolerance)).collect(),
    )
}

fn densify_line(line: &LineString<f64>, tolerance: f64) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(line.0.len());
    for segment in line.lines() {
        let (p, q) = (segment.start, segment.end);
        coords.push(p);
        let length = (q.x - p.x).hypot(q.y - p.y);
        let pieces = (length / tolerance).floor() as usize + 1;
        if pieces > 1 {
            for i in 1..pieces {
                let t = i as f64 / pieces as f64;
                coords.push(Coord { x: p.x + t * (q.x - p.x), y: p.y + t * (q.y - p.y) });
            }
        }
    }
    if let Some(last) = line.0.last() {
        coords.push(*last);
    }
    LineString::new(coords)
}

/// Dilate (positive distance) or erode (negative distance) a geometry.
pub fn buffer(geometry: &Geometry<f64>, distance: f64, mode: ValidityMode) -> Result<Geometry<f64>> {
    if !distance.is_finite() {
        return Err(GeopipesError::invalid_argument(
            "toBuffer",
            format!("distance must be finite, got {}", distance),
        ));
    }
    ensure_valid(geometry, mode, "toBuffer")?;
    if geometry.is_empty_geometry() {
        return Ok(empty_polygon());
    }

    let buffered = to_canonical(geometry.clone()).buffer(distance);
    Ok(polygonal_result(buffered))
}

/// Collapse a multipolygon result into the simplest normalized geometry.
pub fn polygonal_result(mut polygons: MultiPolygon<f64>) -> Geometry<f64> {
    polygons.0.retain(|p| !p.exterior().0.is_empty());
    match polygons.0.len() {
        0 => empty_polygon(),
        1 => Geometry::Polygon(normalize_polygon(&polygons.0[0])),
        _ => normalize(&Geometry::MultiPolygon(polygons)),
    }
}

/// Centroid, failing on empty geometries.
pub fn centroid(geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
    geometry
        .centroid()
        .map(Geometry::Point)
        .ok_or_else(|| GeopipesError::unsupported("toCentroid", "empty geometry has no centroid"))
}

/// A point guaranteed to lie on the geometry.
pub fn interior_point(geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
    geometry.interior_point().map(Geometry::Point).ok_or_else(|| {
        GeopipesError::unsupported("toInteriorPoint", "empty geometry has no interior point")
    })
}

/// Bounding rectangle as a geometry: a point or line when degenerate,
/// otherwise a clockwise polygon starting at the minimum corner.
pub fn envelope(geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
    let rect = geometry
        .envelope()
        .ok_or_else(|| GeopipesError::unsupported("toEnvelope", "empty geometry has no envelope"))?;
    let (min, max) = (rect.min(), rect.max());
    if min == max {
        return Ok(Geometry::Point(Point(min)));
    }
    if min.x == max.x || min.y == max.y {
        return Ok(Geometry::LineString(LineString::new(vec![min, max])));
    }
    Ok(Geometry::Polygon(Polygon::new(
        LineString::new(vec![
            min,
            Coord { x: min.x, y: max.y },
            max,
            Coord { x: max.x, y: min.y },
            min,
        ]),
        vec![],
    )))
}

/// Douglas-Peucker simplification; points pass through unchanged.
pub fn simplify(geometry: &Geometry<f64>, tolerance: f64) -> Result<Geometry<f64>> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(GeopipesError::invalid_argument(
            "simplify",
            format!("tolerance must be finite and non-negative, got {}", tolerance),
        ));
    }
    Ok(match to_canonical(geometry.clone()) {
        Geometry::LineString(ls) => Geometry::LineString(ls.simplify(tolerance)),
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(mls.simplify(tolerance)),
        Geometry::Polygon(poly) => Geometry::Polygon(poly.simplify(tolerance)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(mp.simplify(tolerance)),
        Geometry::GeometryCollection(gc) => {
            let members = gc
                .0
                .iter()
                .map(|member| simplify(member, tolerance))
                .collect::<Result<Vec<_>>>()?;
            Geometry::GeometryCollection(geo::GeometryCollection(members))
        }
        other => other,
    })
}

/// First coordinate of a line string.
pub fn start_point(geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
    line_end(geometry, "startPoint", |ls| ls.0.first().copied())
}

/// Last coordinate of a line string.
pub fn end_point(geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
    line_end(geometry, "endPoint", |ls| ls.0.last().copied())
}

fn line_end(
    geometry: &Geometry<f64>,
    operation: &str,
    pick: impl Fn(&LineString<f64>) -> Option<Coord<f64>>,
) -> Result<Geometry<f64>> {
    match to_canonical(geometry.clone()) {
        Geometry::LineString(ls) => pick(&ls)
            .map(|c| Geometry::Point(Point(c)))
            .ok_or_else(|| GeopipesError::unsupported(operation, "empty line string")),
        other => Err(GeopipesError::unsupported(
            operation,
            format!("expected LineString, got {}", other.type_name()),
        )),
    }
}

/// Every stored coordinate as a point, in storage order.
pub fn extract_points(geometry: &Geometry<f64>) -> Vec<Geometry<f64>> {
    geometry.coords_iter().map(|c| Geometry::Point(Point(c))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equality::equal_topo;
    use crate::models::parse_wkt;

    fn wkt(text: &str) -> Geometry<f64> {
        parse_wkt(text).unwrap()
    }

    #[test]
    fn test_polygon_boundary_is_closed_line() {
        let b = boundary(&wkt("POLYGON ((2 3, 2 5, 6 5, 6 3, 2 3))")).unwrap();
        assert_eq!(b, wkt("LINESTRING (2 3, 2 5, 6 5, 6 3, 2 3)"));
    }

    #[test]
    fn test_polygon_with_hole_boundary() {
        let b = boundary(&wkt("POLYGON ((0 0, 0 9, 9 9, 9 0, 0 0), (2 2, 4 2, 4 4, 2 2))")).unwrap();
        assert!(matches!(b, Geometry::MultiLineString(ref m) if m.0.len() == 2));
    }

    #[test]
    fn test_line_boundaries() {
        assert_eq!(
            boundary(&wkt("LINESTRING (0 0, 1 1, 2 0)")).unwrap(),
            wkt("MULTIPOINT ((0 0), (2 0))")
        );
        let closed = boundary(&wkt("LINESTRING (0 0, 1 1, 2 0, 0 0)")).unwrap();
        assert!(closed.is_empty_geometry());
        // shared endpoint (1 1) appears twice and drops out
        assert_eq!(
            boundary(&wkt("MULTILINESTRING ((0 0, 1 1), (1 1, 2 0))")).unwrap(),
            wkt("MULTIPOINT ((0 0), (2 0))")
        );
        assert!(boundary(&wkt("POINT (1 1)")).unwrap().is_empty_geometry());
    }

    #[test]
    fn test_convex_hull_of_concave_polygon() {
        let hull = convex_hull(&wkt("POLYGON ((0 0, 2 5, 0 10, 10 10, 10 0, 0 0))")).unwrap();
        assert_eq!(hull, wkt("POLYGON ((0 0, 0 10, 10 10, 10 0, 0 0))"));
    }

    #[test]
    fn test_convex_hull_degenerate_inputs() {
        assert_eq!(convex_hull(&wkt("MULTIPOINT ((1 1), (1 1))")).unwrap(), wkt("POINT (1 1)"));
        assert_eq!(
            convex_hull(&wkt("MULTIPOINT ((3 3), (1 1), (2 2))")).unwrap(),
            wkt("LINESTRING (1 1, 3 3)")
        );
    }

    #[test]
    fn test_densify_hull() {
        let dense = densify(&wkt("POLYGON ((0 0, 0 10, 10 10, 10 0, 0 0))"), 10.0).unwrap();
        assert_eq!(dense, wkt("POLYGON ((0 0, 0 5, 0 10, 5 10, 10 10, 10 5, 10 0, 5 0, 0 0))"));
    }

    #[test]
    fn test_densify_rejects_bad_tolerance() {
        let line = wkt("LINESTRING (0 0, 1 0)");
        assert!(densify(&line, 0.0).is_err());
        assert!(densify(&line, f64::INFINITY).is_err());
        assert_eq!(densify(&line, 5.0).unwrap(), line);
    }

    #[test]
    fn test_buffer_grows_area() {
        let square = wkt("POLYGON ((2 3, 2 5, 6 5, 6 3, 2 3))");
        let buffered = buffer(&square, 0.1, ValidityMode::Lenient).unwrap();
        assert!(buffered.unsigned_area() > 8.0);
        assert!(buffer(&square, f64::NAN, ValidityMode::Lenient).is_err());
    }

    #[test]
    fn test_buffer_rejects_invalid_in_strict_mode() {
        let bowtie = wkt("POLYGON ((0 0, 10 10, 10 0, 0 10, 0 0))");
        let err = buffer(&bowtie, 1.0, ValidityMode::Strict).unwrap_err();
        assert!(matches!(err, GeopipesError::InvalidGeometry { .. }));
    }

    #[test]
    fn test_centroid_and_interior_point() {
        let square = wkt("POLYGON ((12 56, 12 57, 13 57, 13 56, 12 56))");
        let c = centroid(&square).unwrap();
        assert!(crate::equality::equal_exact(&c, &wkt("POINT (12.5 56.5)"), 1e-9));
        let inside = interior_point(&square).unwrap();
        assert!(geo::Intersects::intersects(&square, &inside));
        assert!(centroid(&wkt("LINESTRING EMPTY")).is_err());
    }

    #[test]
    fn test_envelope_shapes() {
        assert_eq!(
            envelope(&wkt("LINESTRING (0 0, 2 5, 4 1)")).unwrap(),
            wkt("POLYGON ((0 0, 0 5, 4 5, 4 0, 0 0))")
        );
        assert_eq!(envelope(&wkt("POINT (1 2)")).unwrap(), wkt("POINT (1 2)"));
        assert_eq!(
            envelope(&wkt("LINESTRING (0 1, 3 1)")).unwrap(),
            wkt("LINESTRING (0 1, 3 1)")
        );
    }

    #[test]
    fn test_simplify_drops_near_collinear_vertex() {
        let line = wkt("LINESTRING (0 0, 5 0.01, 10 0)");
        assert_eq!(simplify(&line, 0.1).unwrap(), wkt("LINESTRING (0 0, 10 0)"));
        assert!(simplify(&line, -1.0).is_err());
    }

    #[test]
    fn test_start_and_end_points() {
        let line = wkt("LINESTRING (1 2, 3 4, 5 6)");
        assert_eq!(start_point(&line).unwrap(), wkt("POINT (1 2)"));
        assert_eq!(end_point(&line).unwrap(), wkt("POINT (5 6)"));
        assert!(matches!(
            start_point(&wkt("POINT (0 0)")),
            Err(GeopipesError::UnsupportedGeometry { .. })
        ));
    }

    #[test]
    fn test_extract_points_keeps_closing_vertex() {
        let points = extract_points(&wkt("POLYGON ((2 3, 2 5, 6 5, 6 3, 2 3))"));
        assert_eq!(points.len(), 5);
        assert!(equal_topo(&points[0], &points[4]));
    }
}
