//! Set-theoretic aggregates over many geometries.
//!
//! Areal inputs go through geo's boolean overlay. Lines and points are
//! carried alongside: a union keeps the lower-dimension parts not already
//! covered by an areal part, an intersection clips lines against areas,
//! crosses lines against lines and keeps points lying on the other operand.

use crate::models::{empty_geometry, empty_polygon, to_canonical, GeometryExt};
use crate::normalize::{compare_coords, normalize, orient_polygon};
use crate::ops::polygonal_result;
use crate::validation::ensure_valid;
use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{
    BooleanOps, Contains, Coord, Geometry, GeometryCollection, Intersects, LineString,
    MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use geopipes_core::error::Result;
use geopipes_core::models::ValidityMode;

/// A geometry split by dimension.
#[derive(Debug, Clone)]
struct Parts {
    polygons: MultiPolygon<f64>,
    lines: Vec<LineString<f64>>,
    points: Vec<Coord<f64>>,
}

impl Parts {
    fn empty() -> Self {
        Parts { polygons: MultiPolygon(vec![]), lines: vec![], points: vec![] }
    }

    fn of(geometry: &Geometry<f64>) -> Self {
        let mut parts = Parts::empty();
        parts.add(to_canonical(geometry.clone()));
        parts
    }

    fn add(&mut self, geometry: Geometry<f64>) {
        match geometry {
            Geometry::Point(p) => self.points.push(p.0),
            Geometry::MultiPoint(mp) => self.points.extend(mp.0.into_iter().map(|p| p.0)),
            Geometry::LineString(ls) if !ls.0.is_empty() => self.lines.push(ls),
            Geometry::MultiLineString(mls) => {
                self.lines.extend(mls.0.into_iter().filter(|ls| !ls.0.is_empty()))
            }
            Geometry::Polygon(p) if !p.exterior().0.is_empty() => self.polygons.0.push(p),
            Geometry::MultiPolygon(mp) => {
                self.polygons.0.extend(mp.0.into_iter().filter(|p| !p.exterior().0.is_empty()))
            }
            Geometry::GeometryCollection(gc) => {
                for member in gc.0 {
                    self.add(to_canonical(member));
                }
            }
            _ => {}
        }
    }

    fn is_areal(&self) -> bool {
        !self.polygons.0.is_empty() && self.lines.is_empty() && self.points.is_empty()
    }

    fn is_puntal(&self) -> bool {
        self.polygons.0.is_empty() && self.lines.is_empty() && !self.points.is_empty()
    }

    fn is_empty(&self) -> bool {
        self.polygons.0.is_empty() && self.lines.is_empty() && self.points.is_empty()
    }

    /// Highest dimension present: 2 areal, 1 lineal, 0 puntal or empty.
    fn dimension(&self) -> u8 {
        if !self.polygons.0.is_empty() {
            2
        } else if !self.lines.is_empty() {
            1
        } else {
            0
        }
    }

    /// Drop lines inside the areal part, repeated lines, and points
    /// already on a line or an area.
    fn without_covered_parts(self) -> Self {
        let areal = Geometry::MultiPolygon(self.polygons.clone());
        let mut kept_lines: Vec<LineString<f64>> = Vec::new();
        let mut seen: Vec<Geometry<f64>> = Vec::new();
        for line in self.lines {
            let as_geometry = Geometry::LineString(line.clone());
            if !self.polygons.0.is_empty() && areal.contains(&as_geometry) {
                continue;
            }
            let normalized = normalize(&as_geometry);
            if seen.contains(&normalized) {
                continue;
            }
            seen.push(normalized);
            kept_lines.push(line);
        }

        let lineal = Geometry::MultiLineString(MultiLineString(kept_lines.clone()));
        let mut points = self.points;
        points.retain(|c| {
            let point = Geometry::Point(Point(*c));
            !(areal.intersects(&point) || lineal.intersects(&point))
        });

        Parts { polygons: self.polygons, lines: kept_lines, points }
    }

    fn into_geometry(self) -> Geometry<f64> {
        let mut members = Vec::new();
        if !self.polygons.0.is_empty() {
            members.push(polygonal_result(self.polygons));
        }
        if !self.lines.is_empty() {
            members.push(lineal_result(self.lines));
        }
        if !self.points.is_empty() {
            members.push(puntal_result(self.points));
        }
        match members.len() {
            0 => empty_geometry(),
            1 => members.remove(0),
            _ => Geometry::GeometryCollection(GeometryCollection(members)),
        }
    }
}

fn lineal_result(lines: Vec<LineString<f64>>) -> Geometry<f64> {
    if lines.len() == 1 {
        return normalize(&Geometry::LineString(lines[0].clone()));
    }
    normalize(&Geometry::MultiLineString(MultiLineString(lines)))
}

fn puntal_result(mut points: Vec<Coord<f64>>) -> Geometry<f64> {
    points.sort_by(compare_coords);
    points.dedup();
    if points.len() == 1 {
        return Geometry::Point(Point(points[0]));
    }
    Geometry::MultiPoint(MultiPoint(points.into_iter().map(Point).collect()))
}

/// Area overlap as the overlay produced it, with clockwise shells. Rings
/// keep the overlay's start vertex.
fn overlap_result(mut polygons: MultiPolygon<f64>) -> Geometry<f64> {
    polygons.0.retain(|p| !p.exterior().0.is_empty());
    let mut oriented: Vec<Polygon<f64>> = polygons.0.iter().map(orient_polygon).collect();
    match oriented.len() {
        0 => empty_polygon(),
        1 => Geometry::Polygon(oriented.remove(0)),
        _ => Geometry::MultiPolygon(MultiPolygon(oriented)),
    }
}

/// An empty geometry of the given dimension.
fn empty_of_dimension(dimension: u8) -> Geometry<f64> {
    match dimension {
        0 => Geometry::MultiPoint(MultiPoint(vec![])),
        1 => Geometry::MultiLineString(MultiLineString(vec![])),
        _ => empty_polygon(),
    }
}

/// Pieces of `lines` inside the areas.
fn clip_lines(areas: &MultiPolygon<f64>, lines: &[LineString<f64>]) -> Vec<LineString<f64>> {
    if areas.0.is_empty() || lines.is_empty() {
        return vec![];
    }
    areas
        .clip(&MultiLineString(lines.to_vec()), false)
        .0
        .into_iter()
        .filter(|ls| ls.0.len() >= 2)
        .collect()
}

/// Shared segments and crossing points of two sets of lines.
fn cross_lines(
    a: &[LineString<f64>],
    b: &[LineString<f64>],
) -> (Vec<LineString<f64>>, Vec<Coord<f64>>) {
    let mut shared = Vec::new();
    let mut crossings = Vec::new();
    for la in a {
        for sa in la.lines() {
            for lb in b {
                for sb in lb.lines() {
                    match line_intersection(sa, sb) {
                        Some(LineIntersection::SinglePoint { intersection, .. }) => {
                            crossings.push(intersection)
                        }
                        Some(LineIntersection::Collinear { intersection }) => {
                            if intersection.start == intersection.end {
                                crossings.push(intersection.start);
                            } else {
                                shared.push(LineString::new(vec![
                                    intersection.start,
                                    intersection.end,
                                ]));
                            }
                        }
                        None => {}
                    }
                }
            }
        }
    }
    (shared, crossings)
}

/// Set union of all geometries. `None` for an empty input.
pub fn union_all(geometries: &[Geometry<f64>], mode: ValidityMode) -> Result<Option<Geometry<f64>>> {
    if geometries.is_empty() {
        return Ok(None);
    }

    let mut union = Parts::empty();
    for geometry in geometries {
        ensure_valid(geometry, mode, "unionAll")?;
        let parts = Parts::of(geometry);
        for polygon in parts.polygons.0 {
            union.polygons = union.polygons.union(&polygon);
        }
        union.lines.extend(parts.lines);
        union.points.extend(parts.points);
    }

    Ok(Some(union.without_covered_parts().into_geometry()))
}

/// Common intersection of all geometries. `None` for an empty input; an
/// empty geometry when the inputs share no point.
pub fn intersect_all(
    geometries: &[Geometry<f64>],
    mode: ValidityMode,
) -> Result<Option<Geometry<f64>>> {
    let (first, rest) = match geometries.split_first() {
        Some(split) => split,
        None => return Ok(None),
    };
    ensure_valid(first, mode, "intersectAll")?;

    let mut acc = Parts::of(first).into_geometry();
    for geometry in rest {
        ensure_valid(geometry, mode, "intersectAll")?;
        acc = intersection(&acc, geometry)?;
    }
    Ok(Some(acc))
}

/// Intersection of two geometries. The result's dimension never exceeds
/// the lower of the two operands'.
pub fn intersection(a: &Geometry<f64>, b: &Geometry<f64>) -> Result<Geometry<f64>> {
    let (pa, pb) = (Parts::of(a), Parts::of(b));
    let dimension = pa.dimension().min(pb.dimension());

    if a.is_empty_geometry() || b.is_empty_geometry() {
        return Ok(if pa.is_areal() || pb.is_areal() { empty_polygon() } else { empty_geometry() });
    }

    if pa.is_areal() && pb.is_areal() {
        return Ok(overlap_result(pa.polygons.intersection(&pb.polygons)));
    }

    if pa.is_puntal() || pb.is_puntal() {
        let (puntal, other) = if pa.is_puntal() { (pa, b) } else { (pb, a) };
        let kept: Vec<Coord<f64>> = puntal
            .points
            .into_iter()
            .filter(|c| other.intersects(&Geometry::Point(Point(*c))))
            .collect();
        if kept.is_empty() {
            return Ok(empty_of_dimension(0));
        }
        return Ok(puntal_result(kept));
    }

    let mut shared = Parts::empty();
    if !pa.polygons.0.is_empty() && !pb.polygons.0.is_empty() {
        shared.polygons = pa.polygons.intersection(&pb.polygons);
    }
    shared.lines.extend(clip_lines(&pb.polygons, &pa.lines));
    shared.lines.extend(clip_lines(&pa.polygons, &pb.lines));
    let (segments, crossings) = cross_lines(&pa.lines, &pb.lines);
    shared.lines.extend(segments);
    shared.points.extend(crossings);
    for (points, other) in [(&pa.points, b), (&pb.points, a)] {
        shared
            .points
            .extend(points.iter().filter(|c| other.intersects(&Geometry::Point(Point(**c)))));
    }

    let shared = shared.without_covered_parts();
    if shared.is_empty() {
        return Ok(empty_of_dimension(dimension));
    }
    Ok(shared.into_geometry())
}
