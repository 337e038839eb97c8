//! In-memory layers for development and testing.
//!
//! Lock poisoning is reported as a store error rather than a panic. There is
//! no durability and no isolation beyond the per-layer lock.

use crate::index::RTreeIndex;
use crate::ports::{EditableLayer, Layer, RecordCursor, SearchPredicate, SpatialIndex};
use geo::Geometry;
use geopipes_core::config::LayeredConfig;
use geopipes_core::error::{GeopipesError, Result};
use geopipes_core::models::{
    GeometryFactory, OsmWay, Properties, PropertyValue, Record, RecordId,
};
use geopipes_geo::validation::ensure_valid;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

fn poisoned(what: &str) -> GeopipesError {
    GeopipesError::Store { reason: format!("{} lock poisoned", what) }
}

#[derive(Debug, Default)]
struct LayerState {
    records: HashMap<RecordId, Arc<Record>>,
    index: RTreeIndex,
    extra_property_names: Vec<String>,
    next_id: u64,
}

/// In-memory implementation of Layer and EditableLayer
#[derive(Debug, Clone)]
pub struct MemoryLayer {
    name: String,
    factory: GeometryFactory,
    state: Arc<RwLock<LayerState>>,
}

impl MemoryLayer {
    pub fn new(name: impl Into<String>, factory: GeometryFactory) -> Self {
        Self {
            name: name.into(),
            factory,
            state: Arc::new(RwLock::new(LayerState { next_id: 1, ..Default::default() })),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LayerState>> {
        self.state.read().map_err(|_| poisoned(&self.name))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LayerState>> {
        self.state.write().map_err(|_| poisoned(&self.name))
    }

    fn insert(
        &self,
        geometry: Geometry<f64>,
        properties: Properties,
        osm: Option<OsmWay>,
    ) -> Result<RecordId> {
        ensure_valid(&geometry, self.factory.validity(), "add")?;
        let geometry = self.factory.create(geometry);

        let mut state = self.write()?;
        let id = RecordId(state.next_id);
        state.next_id += 1;

        state.index.insert(id, &geometry);
        state.records.insert(id, Arc::new(Record { id, geometry, properties, osm }));
        Ok(id)
    }
}

impl Layer for MemoryLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn geometry_factory(&self) -> &GeometryFactory {
        &self.factory
    }

    fn extra_property_names(&self) -> Result<Vec<String>> {
        Ok(self.read()?.extra_property_names.clone())
    }

    fn record(&self, id: RecordId) -> Result<Arc<Record>> {
        self.read()?
            .records
            .get(&id)
            .cloned()
            .ok_or(GeopipesError::RecordNotFound { id: id.0 })
    }

    fn search(&self, predicate: &SearchPredicate) -> Result<RecordCursor> {
        let candidates = self.read()?.index.search(predicate)?;
        Ok(Box::new(MemoryCursor {
            layer: self.name.clone(),
            state: Arc::clone(&self.state),
            candidates: candidates.into_iter(),
            predicate: predicate.clone(),
        }))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }
}

impl EditableLayer for MemoryLayer {
    fn add(&self, geometry: Geometry<f64>) -> Result<RecordId> {
        self.insert(geometry, Properties::new(), None)
    }

    fn add_with_properties(
        &self,
        geometry: Geometry<f64>,
        names: &[&str],
        values: Vec<PropertyValue>,
    ) -> Result<RecordId> {
        if names.len() != values.len() {
            return Err(GeopipesError::PropertyMismatch { names: names.len(), values: values.len() });
        }
        let properties: Properties =
            names.iter().map(|n| n.to_string()).zip(values).collect();
        self.insert(geometry, properties, None)
    }

    fn add_osm_way(&self, way: OsmWay) -> Result<RecordId> {
        let geometry = Geometry::LineString(way.to_line_string());
        let properties = way.tag_properties();
        self.insert(geometry, properties, Some(way))
    }

    fn set_extra_property_names(&self, names: Vec<String>) -> Result<()> {
        self.write()?.extra_property_names = names;
        Ok(())
    }

    fn remove(&self, id: RecordId) -> Result<()> {
        let mut state = self.write()?;
        if state.records.remove(&id).is_none() {
            return Err(GeopipesError::RecordNotFound { id: id.0 });
        }
        state.index.remove(id);
        Ok(())
    }
}

/// Lazy search cursor: candidates are looked up and refined one at a time.
struct MemoryCursor {
    layer: String,
    state: Arc<RwLock<LayerState>>,
    candidates: std::vec::IntoIter<RecordId>,
    predicate: SearchPredicate,
}

impl Iterator for MemoryCursor {
    type Item = Result<Arc<Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.candidates.next()?;
            let state = match self.state.read() {
                Ok(state) => state,
                Err(_) => return Some(Err(poisoned(&self.layer))),
            };
            // records removed after the search started are skipped
            if let Some(record) = state.records.get(&id) {
                if self.predicate.matches(record) {
                    return Some(Ok(Arc::clone(record)));
                }
            }
        }
    }
}

/// A named collection of in-memory layers sharing one configuration
#[derive(Debug, Default)]
pub struct SpatialDatabase {
    factory: GeometryFactory,
    layers: RwLock<BTreeMap<String, Arc<MemoryLayer>>>,
}

impl SpatialDatabase {
    /// Database whose layers use the default geometry factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Database whose layers take SRID, precision and validity from `config`
    pub fn with_config(config: &LayeredConfig) -> Self {
        Self { factory: config.geometry_factory(), layers: RwLock::new(BTreeMap::new()) }
    }

    pub fn geometry_factory(&self) -> &GeometryFactory {
        &self.factory
    }

    /// Look up a layer
    pub fn layer(&self, name: &str) -> Result<Arc<dyn Layer>> {
        let layers = self.layers.read().map_err(|_| poisoned("database"))?;
        layers
            .get(name)
            .map(|layer| Arc::clone(layer) as Arc<dyn Layer>)
            .ok_or_else(|| GeopipesError::LayerNotFound { name: name.to_string() })
    }

    /// Look up a layer for editing, creating it when missing
    pub fn get_or_create_editable_layer(&self, name: &str) -> Result<Arc<MemoryLayer>> {
        let mut layers = self.layers.write().map_err(|_| poisoned("database"))?;
        if let Some(layer) = layers.get(name) {
            return Ok(Arc::clone(layer));
        }
        let layer = Arc::new(MemoryLayer::new(name, self.factory.clone()));
        layers.insert(name.to_string(), Arc::clone(&layer));
        tracing::info!(layer = name, crs = %self.factory.crs(), "Created layer");
        Ok(layer)
    }

    /// Create a new layer, failing if the name is taken
    pub fn create_layer(&self, name: &str) -> Result<Arc<MemoryLayer>> {
        let mut layers = self.layers.write().map_err(|_| poisoned("database"))?;
        if layers.contains_key(name) {
            return Err(GeopipesError::LayerExists { name: name.to_string() });
        }
        let layer = Arc::new(MemoryLayer::new(name, self.factory.clone()));
        layers.insert(name.to_string(), Arc::clone(&layer));
        tracing::info!(layer = name, crs = %self.factory.crs(), "Created layer");
        Ok(layer)
    }

    /// Delete a layer
    pub fn delete_layer(&self, name: &str) -> Result<()> {
        let mut layers = self.layers.write().map_err(|_| poisoned("database"))?;
        match layers.remove(name) {
            Some(_) => {
                tracing::info!(layer = name, "Deleted layer");
                Ok(())
            }
            None => Err(GeopipesError::LayerNotFound { name: name.to_string() }),
        }
    }

    /// Layer names in ascending order
    pub fn layer_names(&self) -> Result<Vec<String>> {
        Ok(self.layers.read().map_err(|_| poisoned("database"))?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geopipes_core::config::CliConfigOverrides;
    use geopipes_core::models::{OsmNode, PrecisionModel, ValidityMode};
    use geopipes_geo::models::envelope_from_bounds;
    use geopipes_geo::parse_wkt;

    fn boxes(db: &SpatialDatabase) -> Arc<MemoryLayer> {
        let layer = db.get_or_create_editable_layer("boxes").unwrap();
        layer
            .add_with_properties(
                parse_wkt("POLYGON ((12 56, 12 57, 13 57, 13 56, 12 56))").unwrap(),
                &["name"],
                vec!["A".into()],
            )
            .unwrap();
        layer
            .add_with_properties(
                parse_wkt("POLYGON ((2 3, 2 5, 6 5, 6 3, 2 3))").unwrap(),
                &["name"],
                vec!["B".into()],
            )
            .unwrap();
        layer
    }

    fn collect(cursor: RecordCursor) -> Vec<Arc<Record>> {
        cursor.collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn test_add_and_search_all() {
        let db = SpatialDatabase::new();
        let layer = boxes(&db);
        assert_eq!(layer.len().unwrap(), 2);

        let records = collect(layer.search(&SearchPredicate::All).unwrap());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, RecordId(1));
        assert_eq!(records[0].property("name"), Some(&PropertyValue::from("A")));
    }

    #[test]
    fn test_window_and_attribute_search() {
        let db = SpatialDatabase::new();
        let layer = boxes(&db);

        let window = SearchPredicate::Window(envelope_from_bounds(0.0, 0.0, 3.0, 3.0));
        let records = collect(layer.search(&window).unwrap());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, RecordId(2));

        let attribute =
            SearchPredicate::Attribute { name: "name".to_string(), value: "A".into() };
        let records = collect(layer.search(&attribute).unwrap());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, RecordId(1));
    }

    #[test]
    fn test_property_mismatch() {
        let db = SpatialDatabase::new();
        let layer = db.get_or_create_editable_layer("bad").unwrap();
        let err = layer
            .add_with_properties(parse_wkt("POINT (0 0)").unwrap(), &["a", "b"], vec![PropertyValue::from(1i64)])
            .unwrap_err();
        assert!(matches!(err, GeopipesError::PropertyMismatch { names: 2, values: 1 }));
        assert_eq!(layer.len().unwrap(), 0);
    }

    #[test]
    fn test_layer_lifecycle() {
        let db = SpatialDatabase::new();
        db.create_layer("a").unwrap();
        assert!(matches!(db.create_layer("a"), Err(GeopipesError::LayerExists { .. })));
        db.get_or_create_editable_layer("b").unwrap();
        assert_eq!(db.layer_names().unwrap(), vec!["a".to_string(), "b".to_string()]);

        db.delete_layer("a").unwrap();
        assert!(matches!(db.layer("a"), Err(GeopipesError::LayerNotFound { .. })));
        assert!(db.delete_layer("a").is_err());
    }

    #[test]
    fn test_osm_way_record() {
        let db = SpatialDatabase::new();
        let layer = db.get_or_create_editable_layer("roads").unwrap();
        let way = OsmWay::new(1, vec![OsmNode::new(1, 12.0, 55.0), OsmNode::new(2, 12.1, 55.0)])
            .with_tag("name", "Storgatan");
        let id = layer.add_osm_way(way).unwrap();

        let record = layer.record(id).unwrap();
        assert!(record.is_osm_way());
        assert_eq!(record.property("name"), Some(&PropertyValue::from("Storgatan")));
        assert!(matches!(record.geometry, Geometry::LineString(_)));
    }

    #[test]
    fn test_factory_from_config_snaps_and_validates() {
        let mut config = LayeredConfig::with_defaults();
        config.update_from_cli(CliConfigOverrides {
            precision: Some(PrecisionModel::Fixed { scale: 1.0 }),
            geometry_validity: Some(ValidityMode::Strict),
            ..Default::default()
        });
        let db = SpatialDatabase::with_config(&config);
        let layer = db.get_or_create_editable_layer("snapped").unwrap();

        let id = layer.add(parse_wkt("POINT (1.4 2.6)").unwrap()).unwrap();
        assert_eq!(layer.record(id).unwrap().geometry, parse_wkt("POINT (1 3)").unwrap());

        let bowtie = parse_wkt("POLYGON ((0 0, 10 10, 10 0, 0 10, 0 0))").unwrap();
        assert!(matches!(layer.add(bowtie), Err(GeopipesError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_cursor_skips_removed_records() {
        let db = SpatialDatabase::new();
        let layer = boxes(&db);
        let mut cursor = layer.search(&SearchPredicate::All).unwrap();
        layer.remove(RecordId(1)).unwrap();
        let first = cursor.next().unwrap().unwrap();
        assert_eq!(first.id, RecordId(2));
        assert!(cursor.next().is_none());
    }
}
