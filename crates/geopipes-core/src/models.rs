pub mod geometry;
pub mod property;
pub mod record;

pub use geometry::{Crs, GeometryFactory, PrecisionModel, ValidityMode};
pub use property::{Properties, PropertyValue};
pub use record::{OsmNode, OsmWay, Record, RecordId};
