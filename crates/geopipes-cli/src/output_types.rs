use serde::Serialize;

/// Output for layers command
#[derive(Debug, Serialize)]
pub struct LayersOutput {
    pub dataset: String,
    pub layers: Vec<LayerInfo>,
}

#[derive(Debug, Serialize)]
pub struct LayerInfo {
    pub name: String,
    pub records: usize,
    pub crs: String,
    pub property_names: Vec<String>,
}

/// Output for run command
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub layer: String,
    pub stages: Vec<String>,
    pub flow_count: usize,
    pub flows: Vec<FlowItem>,
}

#[derive(Debug, Serialize)]
pub struct FlowItem {
    pub geometry: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub records: Vec<u64>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub srid: ConfigEntry,
    pub precision: ConfigEntry,
    pub geometry_validity: ConfigEntry,
    pub equality_tolerance: ConfigEntry,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: String,
}

/// Output for cql command
#[derive(Debug, Serialize)]
pub struct CqlOutput {
    pub expression: String,
    pub valid: bool,
}
