//! Canonical vertex order for geometries.
//!
//! Two geometries with the same structure and the same vertices, differing
//! only in ring start point, ring orientation, line direction or the order
//! of multi-geometry members, normalize to identical coordinate lists.
//!
//! Canonical form: line strings read in the direction whose first differing
//! coordinate is smaller; rings start at their smallest coordinate (by x,
//! then y); polygon shells run clockwise and holes counter-clockwise; holes
//! and multi-geometry members are sorted.

use crate::models::to_canonical;
use geo::algorithm::winding_order::WindingOrder;
use geo::algorithm::orient::{Direction, Orient};
use geo::{Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon, Winding};
use std::cmp::Ordering;

/// Total order on coordinates: x first, then y.
pub fn compare_coords(a: &Coord<f64>, b: &Coord<f64>) -> Ordering {
    a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y))
}

/// Normalize a geometry into canonical vertex order.
pub fn normalize(geometry: &Geometry<f64>) -> Geometry<f64> {
    match to_canonical(geometry.clone()) {
        Geometry::LineString(ls) => Geometry::LineString(normalize_line(ls)),
        Geometry::Polygon(poly) => Geometry::Polygon(normalize_polygon(&poly)),
        Geometry::MultiPoint(mp) => {
            let mut points = mp.0;
            points.sort_by(|a, b| compare_coords(&a.0, &b.0));
            Geometry::MultiPoint(MultiPoint(points))
        }
        Geometry::MultiLineString(mls) => {
            let mut lines: Vec<LineString<f64>> = mls.0.into_iter().map(normalize_line).collect();
            lines.sort_by(|a, b| compare_sequences(&a.0, &b.0));
            Geometry::MultiLineString(MultiLineString(lines))
        }
        Geometry::MultiPolygon(mp) => {
            let mut polygons: Vec<Polygon<f64>> = mp.0.iter().map(normalize_polygon).collect();
            polygons.sort_by(compare_polygons);
            Geometry::MultiPolygon(MultiPolygon(polygons))
        }
        Geometry::GeometryCollection(gc) => {
            let mut members: Vec<Geometry<f64>> = gc.0.iter().map(normalize).collect();
            members.sort_by(compare_geometries);
            Geometry::GeometryCollection(GeometryCollection(members))
        }
        other => other,
    }
}

/// Normalize a polygon: clockwise shell, counter-clockwise sorted holes.
pub fn normalize_polygon(polygon: &Polygon<f64>) -> Polygon<f64> {
    let shell = normalize_ring(polygon.exterior(), WindingOrder::Clockwise);
    let mut holes: Vec<LineString<f64>> = polygon
        .interiors()
        .iter()
        .map(|ring| normalize_ring(ring, WindingOrder::CounterClockwise))
        .collect();
    holes.sort_by(|a, b| compare_sequences(&a.0, &b.0));
    Polygon::new(shell, holes)
}

/// Clockwise shell and counter-clockwise holes, keeping each ring's start vertex.
pub fn orient_polygon(polygon: &Polygon<f64>) -> Polygon<f64> {
    polygon.orient(Direction::Reversed)
}

fn normalize_line(line: LineString<f64>) -> LineString<f64> {
    let coords = &line.0;
    let n = coords.len();
    for i in 0..n / 2 {
        let j = n - 1 - i;
        match compare_coords(&coords[i], &coords[j]) {
            Ordering::Equal => continue,
            Ordering::Greater => {
                let mut reversed = line.0.clone();
                reversed.reverse();
                return LineString::new(reversed);
            }
            Ordering::Less => break,
        }
    }
    line
}

/// Rotate a closed ring to start at its smallest coordinate and orient it.
fn normalize_ring(ring: &LineString<f64>, orientation: WindingOrder) -> LineString<f64> {
    if ring.0.len() < 4 || !ring.is_closed() {
        return ring.clone();
    }

    let open = &ring.0[..ring.0.len() - 1];
    let start = open
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| compare_coords(a, b))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    coords.extend_from_slice(&open[start..]);
    coords.extend_from_slice(&open[..start]);
    coords.push(open[start]);

    let mut rotated = LineString::new(coords);
    if let Some(current) = rotated.winding_order() {
        if current != orientation {
            // both ends hold the minimum, so reversing keeps the start
            rotated.0.reverse();
        }
    }
    rotated
}

fn compare_sequences(a: &[Coord<f64>], b: &[Coord<f64>]) -> Ordering {
    for (ca, cb) in a.iter().zip(b.iter()) {
        let ord = compare_coords(ca, cb);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_polygons(a: &Polygon<f64>, b: &Polygon<f64>) -> Ordering {
    compare_sequences(&a.exterior().0, &b.exterior().0)
        .then_with(|| a.interiors().len().cmp(&b.interiors().len()))
        .then_with(|| {
            a.interiors()
                .iter()
                .zip(b.interiors())
                .map(|(ra, rb)| compare_sequences(&ra.0, &rb.0))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        })
}

fn type_rank(geometry: &Geometry<f64>) -> u8 {
    match geometry {
        Geometry::Point(_) => 0,
        Geometry::MultiPoint(_) => 1,
        Geometry::Line(_) | Geometry::LineString(_) => 2,
        Geometry::MultiLineString(_) => 3,
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => 4,
        Geometry::MultiPolygon(_) => 5,
        Geometry::GeometryCollection(_) => 6,
    }
}

/// Total order on geometries: by type, then by coordinates.
pub fn compare_geometries(a: &Geometry<f64>, b: &Geometry<f64>) -> Ordering {
    use geo::CoordsIter;
    type_rank(a).cmp(&type_rank(b)).then_with(|| {
        let ca: Vec<Coord<f64>> = a.coords_iter().collect();
        let cb: Vec<Coord<f64>> = b.coords_iter().collect();
        compare_sequences(&ca, &cb)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_wkt;

    fn norm(wkt: &str) -> Geometry<f64> {
        normalize(&parse_wkt(wkt).unwrap())
    }

    #[test]
    fn test_ring_start_and_orientation() {
        // counter-clockwise, starting at (5 5)
        let a = norm("POLYGON ((5 5, 0 5, 0 0, 5 0, 5 5))");
        let expected = parse_wkt("POLYGON ((0 0, 0 5, 5 5, 5 0, 0 0))").unwrap();
        assert_eq!(a, expected);
    }

    #[test]
    fn test_same_polygon_different_start_normalizes_equal() {
        assert_eq!(
            norm("POLYGON ((12 56, 12 57, 13 57, 13 56, 12 56))"),
            norm("POLYGON ((13 57, 13 56, 12 56, 12 57, 13 57))")
        );
    }

    #[test]
    fn test_holes_run_counter_clockwise() {
        let poly = norm("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 2 4, 4 4, 4 2, 2 2))");
        match poly {
            Geometry::Polygon(p) => {
                assert_eq!(p.interiors()[0].winding_order(), Some(WindingOrder::CounterClockwise));
                assert_eq!(p.exterior().winding_order(), Some(WindingOrder::Clockwise));
                assert_eq!(p.interiors()[0].0[0], Coord { x: 2.0, y: 2.0 });
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_line_direction() {
        assert_eq!(norm("LINESTRING (3 3, 1 1)"), parse_wkt("LINESTRING (1 1, 3 3)").unwrap());
        assert_eq!(norm("LINESTRING (1 1, 3 3)"), parse_wkt("LINESTRING (1 1, 3 3)").unwrap());
    }

    #[test]
    fn test_multi_members_sorted() {
        assert_eq!(
            norm("MULTIPOINT ((3 1), (1 2), (1 1))"),
            parse_wkt("MULTIPOINT ((1 1), (1 2), (3 1))").unwrap()
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = norm("MULTIPOLYGON (((5 5, 5 6, 6 6, 5 5)), ((0 0, 1 0, 1 1, 0 0)))");
        assert_eq!(normalize(&once), once);
    }
}
