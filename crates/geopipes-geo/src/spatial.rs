use crate::equality::equal_topo;
use crate::models::GeometryExt;
use geo::{Contains, Distance, Euclidean, Geometry, Intersects, Rect};

/// Planar spatial predicate between a flowing geometry and a fixed one
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialPredicate {
    Intersects,
    Disjoint,
    /// The flowing geometry lies inside the fixed one
    Within,
    /// The flowing geometry contains the fixed one
    Contains,
    /// Topological equality
    Equals,
    /// Envelopes intersect
    BoundingBox,
    /// Euclidean distance at most `distance`
    DWithin { distance: f64 },
}

impl SpatialPredicate {
    pub fn name(&self) -> &'static str {
        match self {
            SpatialPredicate::Intersects => "INTERSECTS",
            SpatialPredicate::Disjoint => "DISJOINT",
            SpatialPredicate::Within => "WITHIN",
            SpatialPredicate::Contains => "CONTAINS",
            SpatialPredicate::Equals => "EQUALS",
            SpatialPredicate::BoundingBox => "BBOX",
            SpatialPredicate::DWithin { .. } => "DWITHIN",
        }
    }
}

/// Evaluate `predicate(geometry, filter)`.
///
/// Empty geometries satisfy only `Disjoint`.
pub fn evaluate_spatial_predicate(
    geometry: &Geometry<f64>,
    predicate: SpatialPredicate,
    filter: &Geometry<f64>,
) -> bool {
    if geometry.is_empty_geometry() || filter.is_empty_geometry() {
        return predicate == SpatialPredicate::Disjoint;
    }

    match predicate {
        SpatialPredicate::Intersects => geometry.intersects(filter),
        SpatialPredicate::Disjoint => !geometry.intersects(filter),
        SpatialPredicate::Within => filter.contains(geometry),
        SpatialPredicate::Contains => geometry.contains(filter),
        SpatialPredicate::Equals => equal_topo(geometry, filter),
        SpatialPredicate::BoundingBox => evaluate_bounding_box(geometry, filter),
        SpatialPredicate::DWithin { distance } => Euclidean.distance(geometry, filter) <= distance,
    }
}

/// Check if geometry's bounding box intersects the filter's bounding box
fn evaluate_bounding_box(geometry: &Geometry<f64>, filter: &Geometry<f64>) -> bool {
    match (geometry.envelope(), filter.envelope()) {
        (Some(a), Some(b)) => bounding_boxes_intersect(&a, &b),
        _ => false,
    }
}

/// Check if two bounding boxes intersect (touching counts)
pub fn bounding_boxes_intersect(bbox1: &Rect<f64>, bbox2: &Rect<f64>) -> bool {
    let x_overlap = bbox1.min().x <= bbox2.max().x && bbox1.max().x >= bbox2.min().x;
    let y_overlap = bbox1.min().y <= bbox2.max().y && bbox1.max().y >= bbox2.min().y;

    x_overlap && y_overlap
}

/// True when the geometry's envelope intersects `window`
pub fn envelope_intersects(geometry: &Geometry<f64>, window: &Rect<f64>) -> bool {
    geometry.envelope().map(|env| bounding_boxes_intersect(&env, window)).unwrap_or(false)
}
