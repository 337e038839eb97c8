//! Coordinate reference, precision model and the per-layer geometry factory.

use geo::{Coord, Geometry, MapCoords};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::new(3857, "Web Mercator")
    }

    /// Build from a bare EPSG code, naming the well-known ones
    pub fn from_epsg(epsg: u32) -> Self {
        match epsg {
            4326 => Self::wgs84(),
            3857 => Self::web_mercator(),
            other => Self::new(other, format!("EPSG:{}", other)),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{} ({})", self.epsg, self.name)
    }
}

/// Coordinate precision applied to every geometry a layer creates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PrecisionModel {
    /// Full double precision; coordinates are kept as given.
    #[default]
    Floating,
    /// Coordinates are rounded to the nearest multiple of `1 / scale`.
    Fixed { scale: f64 },
}

impl PrecisionModel {
    /// Snap a single ordinate to this precision model
    pub fn make_precise(&self, value: f64) -> f64 {
        match self {
            PrecisionModel::Floating => value,
            PrecisionModel::Fixed { scale } => (value * scale).round() / scale,
        }
    }
}

impl fmt::Display for PrecisionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecisionModel::Floating => write!(f, "floating"),
            PrecisionModel::Fixed { scale } => write!(f, "fixed:{}", scale),
        }
    }
}

/// Geometry validation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValidityMode {
    /// Strict validation - ring closure and self-intersection are checked too
    Strict,
    /// Lenient validation - only finiteness and point counts are checked
    #[default]
    Lenient,
}

/// The factory a layer uses for every geometry it stores or produces.
///
/// A layer owns exactly one factory, so all of its geometries share one
/// precision model and one spatial reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryFactory {
    precision: PrecisionModel,
    crs: Crs,
    validity: ValidityMode,
}

impl GeometryFactory {
    pub fn new(precision: PrecisionModel, crs: Crs) -> Self {
        Self { precision, crs, validity: ValidityMode::default() }
    }

    pub fn with_validity(mut self, validity: ValidityMode) -> Self {
        self.validity = validity;
        self
    }

    pub fn precision(&self) -> PrecisionModel {
        self.precision
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn validity(&self) -> ValidityMode {
        self.validity
    }

    /// Snap every coordinate of `geometry` to the precision model.
    pub fn create(&self, geometry: Geometry<f64>) -> Geometry<f64> {
        match self.precision {
            PrecisionModel::Floating => geometry,
            precision @ PrecisionModel::Fixed { .. } => geometry.map_coords(|c| Coord {
                x: precision.make_precise(c.x),
                y: precision.make_precise(c.y),
            }),
        }
    }
}
