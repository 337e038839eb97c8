use geo::Geometry;
use geopipes_core::models::{Properties, PropertyValue, Record};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Property names written by the metric and serialization stages.
///
/// A producing stage overwrites any previous value under its name.
pub mod reserved {
    pub const WELL_KNOWN_TEXT: &str = "WellKnownText";
    pub const GEOJSON: &str = "GeoJSON";
    pub const AREA: &str = "Area";
    pub const LENGTH: &str = "Length";
    pub const DISTANCE: &str = "Distance";
    pub const NUM_POINTS: &str = "NumPoints";

    /// Names holding a text rendering of the geometry
    pub fn is_rendering(name: &str) -> bool {
        name == WELL_KNOWN_TEXT || name == GEOJSON
    }
}

/// One geometry record travelling through a pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub geometry: Geometry<f64>,
    pub properties: Properties,

    /// Stored records this flow was derived from
    records: Vec<Arc<Record>>,
}

impl Flow {
    pub fn new(geometry: Geometry<f64>, records: Vec<Arc<Record>>) -> Self {
        Self { geometry, properties: Properties::new(), records }
    }

    /// Fresh flow for a stored record, with no properties
    pub fn from_record(record: Arc<Record>) -> Self {
        Self::new(record.geometry.clone(), vec![record])
    }

    /// Replace the geometry, keeping properties and source records
    pub fn with_geometry(mut self, geometry: Geometry<f64>) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    /// Look a name up in the flow, then in its source records in order
    pub fn resolve(&self, name: &str) -> Option<&PropertyValue> {
        self.property(name)
            .or_else(|| self.records.iter().find_map(|record| record.property(name)))
    }

    /// Copy every source record property into the flow; later records win
    pub fn copy_record_properties(&mut self) {
        for record in &self.records {
            for (name, value) in &record.properties {
                self.properties.insert(name.clone(), value.clone());
            }
        }
    }

    /// Properties as a JSON object, dropping the text renderings
    pub fn json_properties(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .filter(|(name, _)| !reserved::is_rendering(name))
            .map(|(name, value)| (name.clone(), Value::from(value.clone())))
            .collect()
    }
}

/// Merge the source records of `flows`, dropping repeats of the same record
pub(crate) fn merged_records<'a>(flows: impl IntoIterator<Item = &'a Flow>) -> Vec<Arc<Record>> {
    let mut merged: Vec<Arc<Record>> = Vec::new();
    for flow in flows {
        for record in &flow.records {
            if !merged.iter().any(|seen| Arc::ptr_eq(seen, record)) {
                merged.push(Arc::clone(record));
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use geopipes_core::models::RecordId;

    fn record(id: u64, name: &str) -> Arc<Record> {
        let mut properties = Properties::new();
        properties.insert("name".to_string(), name.into());
        properties.insert("id".to_string(), PropertyValue::Integer(id as i64));
        Arc::new(Record::new(RecordId(id), Geometry::Point(Point::new(0.0, 0.0)), properties))
    }

    #[test]
    fn test_fresh_flow_has_no_properties() {
        let flow = Flow::from_record(record(1, "A"));
        assert!(flow.properties.is_empty());
        assert_eq!(flow.records().len(), 1);
        assert_eq!(flow.resolve("name"), Some(&PropertyValue::from("A")));
    }

    #[test]
    fn test_flow_property_shadows_record() {
        let flow = Flow::from_record(record(1, "A")).with_property("name", "renamed");
        assert_eq!(flow.resolve("name"), Some(&PropertyValue::from("renamed")));
    }

    #[test]
    fn test_copy_record_properties_later_wins() {
        let geometry = Geometry::Point(Point::new(0.0, 0.0));
        let mut flow = Flow::new(geometry, vec![record(1, "A"), record(2, "B")]);
        flow.copy_record_properties();
        assert_eq!(flow.property("name"), Some(&PropertyValue::from("B")));
        assert_eq!(flow.property("id"), Some(&PropertyValue::Integer(2)));
    }

    #[test]
    fn test_merged_records_deduplicates() {
        let shared = record(1, "A");
        let a = Flow::from_record(Arc::clone(&shared));
        let b = Flow::new(a.geometry.clone(), vec![Arc::clone(&shared), record(2, "B")]);
        assert_eq!(merged_records([&a, &b]).len(), 2);
    }

    #[test]
    fn test_json_properties_skip_renderings() {
        let flow = Flow::from_record(record(1, "A"))
            .with_property(reserved::WELL_KNOWN_TEXT, "POINT (0 0)")
            .with_property(reserved::AREA, 0.0);
        let json = flow.json_properties();
        assert!(json.contains_key("Area"));
        assert!(!json.contains_key("WellKnownText"));
    }
}
