use geo::{Geometry, Rect};
use geopipes_core::error::Result;
use geopipes_core::models::{Crs, GeometryFactory, OsmWay, PropertyValue, Record, RecordId};
use geopipes_geo::equality::EqualityMode;
use geopipes_geo::spatial::envelope_intersects;
use std::sync::Arc;

/// Search predicate accepted by indexes and layers
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPredicate {
    /// Every record
    All,
    /// Records whose envelope intersects the window
    Window(Rect<f64>),
    /// Records whose property `name` equals `value` (type-sensitive)
    Attribute { name: String, value: PropertyValue },
    /// Records whose geometry equals `geometry` under `mode`
    Equal { geometry: Geometry<f64>, mode: EqualityMode },
}

impl SearchPredicate {
    /// Exact-geometry search within `tolerance`
    pub fn equal_exact(geometry: Geometry<f64>, tolerance: f64) -> Self {
        SearchPredicate::Equal { geometry, mode: EqualityMode::Exact { tolerance } }
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            SearchPredicate::All => "all",
            SearchPredicate::Window(_) => "window",
            SearchPredicate::Attribute { .. } => "attribute",
            SearchPredicate::Equal { .. } => "equal",
        }
    }

    /// Full check of a stored record
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            SearchPredicate::All => true,
            SearchPredicate::Window(window) => envelope_intersects(&record.geometry, window),
            SearchPredicate::Attribute { name, value } => record.property(name) == Some(value),
            SearchPredicate::Equal { geometry, mode } => mode.matches(geometry, &record.geometry),
        }
    }
}

/// Lazy sequence of search results
pub type RecordCursor = Box<dyn Iterator<Item = Result<Arc<Record>>> + Send>;

/// Port for a spatial index over record geometries
///
/// `search` may return a superset of the matching ids; callers refine
/// candidates with [`SearchPredicate::matches`].
pub trait SpatialIndex: Send + Sync {
    /// Index a geometry under `id`
    fn insert(&mut self, id: RecordId, geometry: &Geometry<f64>);

    /// Drop `id` from the index, returning whether it was present
    fn remove(&mut self, id: RecordId) -> bool;

    /// Candidate ids for `predicate`, ascending
    fn search(&self, predicate: &SearchPredicate) -> Result<Vec<RecordId>>;

    /// Number of indexed geometries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Port for a read-only layer of geometry records
pub trait Layer: Send + Sync {
    fn name(&self) -> &str;

    /// The factory every geometry of this layer passes through
    fn geometry_factory(&self) -> &GeometryFactory;

    fn crs(&self) -> &Crs {
        self.geometry_factory().crs()
    }

    /// Names of the properties records were added with
    fn extra_property_names(&self) -> Result<Vec<String>>;

    /// Get a record by id
    fn record(&self, id: RecordId) -> Result<Arc<Record>>;

    /// Records matching `predicate`, ascending by id
    fn search(&self, predicate: &SearchPredicate) -> Result<RecordCursor>;

    /// Number of records
    fn len(&self) -> Result<usize>;
}

/// Port for a layer that accepts new records
pub trait EditableLayer: Layer {
    /// Add a geometry without properties
    fn add(&self, geometry: Geometry<f64>) -> Result<RecordId>;

    /// Add a geometry with properties given as parallel name/value arrays
    fn add_with_properties(
        &self,
        geometry: Geometry<f64>,
        names: &[&str],
        values: Vec<PropertyValue>,
    ) -> Result<RecordId>;

    /// Add an OSM way; its tags become the record's properties
    fn add_osm_way(&self, way: OsmWay) -> Result<RecordId>;

    /// Declare the property names records of this layer carry
    fn set_extra_property_names(&self, names: Vec<String>) -> Result<()>;

    /// Remove a record
    fn remove(&self, id: RecordId) -> Result<()>;
}
