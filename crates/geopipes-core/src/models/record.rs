//! Stored layer records and their OSM way descriptors.

use geo::{Coord, Geometry, LineString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::property::{Properties, PropertyValue};

/// Unique identifier for a record within a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node of an OSM way
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmNode {
    pub id: i64,
    pub x: f64,
    pub y: f64,
}

impl OsmNode {
    pub fn new(id: i64, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    pub fn coord(&self) -> Coord<f64> {
        Coord { x: self.x, y: self.y }
    }
}

/// The way a record was built from when its layer was imported from OSM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmWay {
    pub id: i64,
    pub tags: BTreeMap<String, String>,
    pub nodes: Vec<OsmNode>,
}

impl OsmWay {
    pub fn new(id: i64, nodes: Vec<OsmNode>) -> Self {
        Self { id, tags: BTreeMap::new(), nodes }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Line through the way's nodes in order
    pub fn to_line_string(&self) -> LineString<f64> {
        LineString::new(self.nodes.iter().map(OsmNode::coord).collect())
    }

    /// Tags as record properties
    pub fn tag_properties(&self) -> Properties {
        self.tags
            .iter()
            .map(|(k, v)| (k.clone(), PropertyValue::String(v.clone())))
            .collect()
    }
}

/// A geometry record stored in a layer
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub geometry: Geometry<f64>,
    pub properties: Properties,
    pub osm: Option<OsmWay>,
}

impl Record {
    pub fn new(id: RecordId, geometry: Geometry<f64>, properties: Properties) -> Self {
        Self { id, geometry, properties, osm: None }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn is_osm_way(&self) -> bool {
        self.osm.is_some()
    }
}
