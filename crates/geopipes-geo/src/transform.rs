//! Planar affine maps

use geo::{AffineOps, AffineTransform, Coord, Geometry};
use geopipes_core::error::{GeopipesError, Result};
use serde::{Deserialize, Serialize};

/// A 2D affine map `x' = a*x + b*y + xoff`, `y' = d*x + e*y + yoff`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub xoff: f64,
    pub d: f64,
    pub e: f64,
    pub yoff: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine {
    pub fn new(a: f64, b: f64, xoff: f64, d: f64, e: f64, yoff: f64) -> Self {
        Self { a, b, xoff, d, e, yoff }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, dx, 0.0, 1.0, dy)
    }

    /// Scale about the origin
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, 0.0, sy, 0.0)
    }

    /// Counter-clockwise rotation about the origin, angle in degrees
    pub fn rotation(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos, -sin, 0.0, sin, cos, 0.0)
    }

    /// Build from the six coefficients `[a, b, xoff, d, e, yoff]`.
    pub fn from_coefficients(values: &[f64]) -> Result<Self> {
        match values {
            [a, b, xoff, d, e, yoff] => Ok(Self::new(*a, *b, *xoff, *d, *e, *yoff)),
            _ => Err(GeopipesError::invalid_argument(
                "affineTransform",
                format!("expected 6 coefficients, got {}", values.len()),
            )),
        }
    }

    /// `self` applied after `first`.
    pub fn compose(&self, first: &Affine) -> Affine {
        Affine::new(
            self.a * first.a + self.b * first.d,
            self.a * first.b + self.b * first.e,
            self.a * first.xoff + self.b * first.yoff + self.xoff,
            self.d * first.a + self.e * first.d,
            self.d * first.b + self.e * first.e,
            self.d * first.xoff + self.e * first.yoff + self.yoff,
        )
    }

    pub fn is_finite(&self) -> bool {
        [self.a, self.b, self.xoff, self.d, self.e, self.yoff].iter().all(|v| v.is_finite())
    }

    pub fn apply_coord(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.a * c.x + self.b * c.y + self.xoff,
            y: self.d * c.x + self.e * c.y + self.yoff,
        }
    }

    fn to_geo(self) -> AffineTransform<f64> {
        AffineTransform::new(self.a, self.b, self.xoff, self.d, self.e, self.yoff)
    }
}

/// Apply `affine` to every coordinate of `geometry`.
pub fn affine_transform(geometry: &Geometry<f64>, affine: &Affine) -> Result<Geometry<f64>> {
    if !affine.is_finite() {
        return Err(GeopipesError::invalid_argument(
            "affineTransform",
            "coefficients must be finite",
        ));
    }
    Ok(geometry.affine_transform(&affine.to_geo()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_wkt;

    #[test]
    fn test_translate_and_back() {
        let geom = parse_wkt("POLYGON ((12 56, 12 57, 13 57, 13 56, 12 56))").unwrap();
        let moved = affine_transform(&geom, &Affine::translation(10.0, 25.0)).unwrap();
        assert_eq!(moved, parse_wkt("POLYGON ((22 81, 22 82, 23 82, 23 81, 22 81))").unwrap());

        let back = affine_transform(&moved, &Affine::translation(-10.0, -25.0)).unwrap();
        assert_eq!(back, geom);
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let c = Affine::rotation(90.0).apply_coord(Coord { x: 1.0, y: 0.0 });
        assert!((c.x - 0.0).abs() < 1e-12);
        assert!((c.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_compose_applies_right_then_left() {
        let t = Affine::translation(1.0, 0.0).compose(&Affine::scaling(2.0, 2.0));
        assert_eq!(t.apply_coord(Coord { x: 1.0, y: 1.0 }), Coord { x: 3.0, y: 2.0 });
    }

    #[test]
    fn test_coefficients_and_finiteness() {
        assert!(Affine::from_coefficients(&[1.0, 0.0, 0.0]).is_err());
        let nan = Affine::translation(f64::NAN, 0.0);
        let point = parse_wkt("POINT (1 1)").unwrap();
        assert!(affine_transform(&point, &nan).is_err());
    }
}
