//! TOML dataset files
//!
//! A dataset declares layers of WKT features and OSM ways:
//!
//! ```toml
//! [[layers]]
//! name = "boxes"
//!
//! [[layers.features]]
//! wkt = "POLYGON ((12 56, 12 57, 13 57, 13 56, 12 56))"
//! properties = { name = "A" }
//!
//! [[layers]]
//! name = "streets.osm"
//!
//! [[layers.ways]]
//! id = 1
//! tags = { name = "Storgatan" }
//! nodes = [{ id = 10, x = 12.0, y = 56.05 }, { id = 11, x = 12.01, y = 56.05 }]
//! ```

use crate::errors;
use anyhow::{bail, Context, Result};
use geopipes_core::config::LayeredConfig;
use geopipes_core::models::{OsmNode, OsmWay, PropertyValue};
use geopipes_geo::parse_wkt;
use geopipes_store::{EditableLayer, Layer, SpatialDatabase};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    layers: Vec<LayerSpec>,
}

#[derive(Debug, Deserialize)]
struct LayerSpec {
    name: String,

    /// Declared property names; defaults to every name the features use
    #[serde(default)]
    property_names: Vec<String>,

    #[serde(default)]
    features: Vec<FeatureSpec>,

    #[serde(default)]
    ways: Vec<WaySpec>,
}

#[derive(Debug, Deserialize)]
struct FeatureSpec {
    wkt: String,

    #[serde(default)]
    properties: toml::Table,
}

#[derive(Debug, Deserialize)]
struct WaySpec {
    id: i64,

    #[serde(default)]
    tags: BTreeMap<String, String>,

    nodes: Vec<NodeSpec>,
}

#[derive(Debug, Deserialize)]
struct NodeSpec {
    id: i64,
    x: f64,
    y: f64,
}

/// Read a dataset file into a fresh database whose layers follow `config`
pub fn load_dataset(path: &Path, config: &LayeredConfig) -> Result<SpatialDatabase> {
    if !path.exists() {
        return Err(errors::dataset_not_found(&path.display().to_string()).into());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let database = parse_dataset(&content, config)
        .with_context(|| format!("Failed to load dataset {}", path.display()))?;

    tracing::info!(path = %path.display(), layers = database.layer_names()?.len(), "Loaded dataset");
    Ok(database)
}

/// Build a database from dataset TOML text
pub fn parse_dataset(content: &str, config: &LayeredConfig) -> Result<SpatialDatabase> {
    let file: DatasetFile = toml::from_str(content).context("Invalid dataset TOML")?;
    let database = SpatialDatabase::with_config(config);

    for spec in file.layers {
        let layer = database.create_layer(&spec.name)?;

        let mut declared: BTreeSet<String> = spec.property_names.iter().cloned().collect();
        for (index, feature) in spec.features.iter().enumerate() {
            let geometry = parse_wkt(&feature.wkt).with_context(|| {
                format!("Layer '{}': feature {} has invalid WKT", spec.name, index)
            })?;

            let names: Vec<&str> = feature.properties.keys().map(String::as_str).collect();
            let values = feature
                .properties
                .iter()
                .map(|(name, value)| property_value(name, value))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Layer '{}': feature {}", spec.name, index))?;

            if spec.property_names.is_empty() {
                declared.extend(names.iter().map(|name| name.to_string()));
            }
            layer.add_with_properties(geometry, &names, values)?;
        }

        for way in spec.ways {
            let nodes = way.nodes.iter().map(|n| OsmNode::new(n.id, n.x, n.y)).collect();
            let osm_way = way
                .tags
                .into_iter()
                .fold(OsmWay::new(way.id, nodes), |acc, (key, value)| acc.with_tag(key, value));
            layer
                .add_osm_way(osm_way)
                .with_context(|| format!("Layer '{}': way {}", spec.name, way.id))?;
        }

        layer.set_extra_property_names(declared.into_iter().collect())?;
        tracing::debug!(layer = %spec.name, records = layer.len()?, "Loaded layer");
    }

    Ok(database)
}

fn property_value(name: &str, value: &toml::Value) -> Result<PropertyValue> {
    Ok(match value {
        toml::Value::String(s) => PropertyValue::String(s.clone()),
        toml::Value::Integer(i) => PropertyValue::Integer(*i),
        toml::Value::Float(f) => PropertyValue::Float(*f),
        toml::Value::Boolean(b) => PropertyValue::Boolean(*b),
        other => bail!("property '{}' has unsupported type {}", name, other.type_str()),
    })
}
