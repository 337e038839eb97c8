use geo::{Coord, Geometry, Intersects, Line, LineString, Polygon};
use geopipes_core::error::{GeopipesError, Result};
use geopipes_core::models::ValidityMode;

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    fn absorb(&mut self, prefix: &str, other: ValidationResult) {
        for error in other.errors {
            self.add_error(format!("{}.{}", prefix, error.location), error.reason);
        }
    }

    /// First error as a one-line message
    pub fn first_reason(&self) -> Option<String> {
        self.errors.first().map(|e| format!("{}: {}", e.location, e.reason))
    }
}

/// Validate a geometry.
///
/// Lenient mode checks finiteness and minimum point counts. Strict mode
/// additionally requires closed rings without self-intersections. Empty
/// geometries are always valid.
pub fn validate_geometry(geometry: &Geometry<f64>, mode: ValidityMode) -> ValidationResult {
    match geometry {
        Geometry::Point(p) => validate_coord("Point", p.0),
        Geometry::Line(l) => {
            let mut result = validate_coord("Line.start", l.start);
            result.absorb("Line", validate_coord("end", l.end));
            result
        }
        Geometry::LineString(ls) => validate_linestring(ls),
        Geometry::Polygon(poly) => validate_polygon(poly, mode),
        Geometry::MultiPoint(mp) => {
            let mut result = ValidationResult::valid();
            for (i, point) in mp.0.iter().enumerate() {
                result.absorb("MultiPoint", validate_coord(&format!("[{}]", i), point.0));
            }
            result
        }
        Geometry::MultiLineString(mls) => {
            let mut result = ValidationResult::valid();
            for (i, ls) in mls.0.iter().enumerate() {
                result.absorb(&format!("MultiLineString[{}]", i), validate_linestring(ls));
            }
            result
        }
        Geometry::MultiPolygon(mp) => {
            let mut result = ValidationResult::valid();
            for (i, poly) in mp.0.iter().enumerate() {
                result.absorb(&format!("MultiPolygon[{}]", i), validate_polygon(poly, mode));
            }
            result
        }
        Geometry::GeometryCollection(gc) => {
            let mut result = ValidationResult::valid();
            for (i, member) in gc.0.iter().enumerate() {
                result.absorb(&format!("GeometryCollection[{}]", i), validate_geometry(member, mode));
            }
            result
        }
        Geometry::Rect(r) => validate_polygon(&r.to_polygon(), mode),
        Geometry::Triangle(t) => validate_polygon(&t.to_polygon(), mode),
    }
}

/// Validate `geometry` before `operation` runs on it, turning the first
/// problem into an `InvalidGeometry` error.
pub fn ensure_valid(geometry: &Geometry<f64>, mode: ValidityMode, operation: &str) -> Result<()> {
    let result = validate_geometry(geometry, mode);
    if result.is_valid {
        return Ok(());
    }
    Err(GeopipesError::InvalidGeometry {
        reason: format!(
            "{} input rejected: {}",
            operation,
            result.first_reason().unwrap_or_else(|| "invalid geometry".to_string())
        ),
    })
}

fn validate_coord(location: &str, coord: Coord<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();
    if !coord.x.is_finite() || !coord.y.is_finite() {
        result.add_error(
            format!("{}({}, {})", location, coord.x, coord.y),
            "Coordinates must be finite".to_string(),
        );
    }
    result
}

fn validate_linestring(linestring: &LineString<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();
    if linestring.0.is_empty() {
        return result;
    }

    // LineString must have at least 2 points
    if linestring.0.len() < 2 {
        result.add_error(
            "LineString".to_string(),
            format!("LineString must have at least 2 points, found {}", linestring.0.len()),
        );
        return result;
    }

    for (i, coord) in linestring.0.iter().enumerate() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            result
                .add_error(format!("LineString[{}]", i), "Coordinates must be finite".to_string());
        }
    }

    result
}

fn validate_ring(location: String, ring: &LineString<f64>, mode: ValidityMode) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if ring.0.len() < 4 {
        result.add_error(
            location.clone(),
            format!("Ring must have at least 4 points, found {}", ring.0.len()),
        );
    }

    for (i, coord) in ring.0.iter().enumerate() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            result.add_error(format!("{}[{}]", location, i), "Coordinates must be finite".to_string());
        }
    }

    if mode == ValidityMode::Strict && result.is_valid {
        if ring.0.first() != ring.0.last() {
            result.add_error(
                location.clone(),
                "Ring must be closed (first point == last point)".to_string(),
            );
        } else if let Some((i, j)) = ring_self_intersection(ring) {
            result.add_error(location, format!("Ring self-intersects between segments {} and {}", i, j));
        }
    }

    result
}

fn validate_polygon(polygon: &Polygon<f64>, mode: ValidityMode) -> ValidationResult {
    let mut result = ValidationResult::valid();
    if polygon.exterior().0.is_empty() {
        return result;
    }

    let exterior = validate_ring("Polygon exterior".to_string(), polygon.exterior(), mode);
    result.errors.extend(exterior.errors);

    for (i, interior) in polygon.interiors().iter().enumerate() {
        let ring = validate_ring(format!("Polygon interior[{}]", i), interior, mode);
        result.errors.extend(ring.errors);
    }

    result.is_valid = result.errors.is_empty();
    result
}

/// First pair of non-adjacent ring segments that touch or cross.
fn ring_self_intersection(ring: &LineString<f64>) -> Option<(usize, usize)> {
    let segments: Vec<Line<f64>> = ring.lines().collect();
    let n = segments.len();
    for i in 0..n {
        for j in (i + 2)..n {
            // first and last segment share the closing vertex
            if i == 0 && j == n - 1 {
                continue;
            }
            if segments[i].intersects(&segments[j]) {
                return Some((i, j));
            }
        }
    }
    None
}
