//! Layers command implementation

use crate::cli::LayersArgs;
use crate::dataset::load_dataset;
use crate::output::OutputWriter;
use crate::output_types::{LayerInfo, LayersOutput};
use anyhow::Result;
use geopipes_core::config::LayeredConfig;
use tabled::Tabled;

pub fn execute(args: LayersArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let database = load_dataset(&args.dataset, config)?;

    let mut layers = Vec::new();
    for name in database.layer_names()? {
        let layer = database.layer(&name)?;
        layers.push(LayerInfo {
            records: layer.len()?,
            crs: layer.crs().to_string(),
            property_names: layer.extra_property_names()?,
            name,
        });
    }

    if output.is_json() {
        return output.result(LayersOutput {
            dataset: args.dataset.display().to_string(),
            layers,
        });
    }

    output.section(format!("Layers in {}", args.dataset.display()));

    #[derive(Tabled)]
    struct LayerRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Records")]
        records: usize,
        #[tabled(rename = "CRS")]
        crs: String,
        #[tabled(rename = "Properties")]
        properties: String,
    }

    let rows: Vec<LayerRow> = layers
        .into_iter()
        .map(|layer| LayerRow {
            name: layer.name,
            records: layer.records,
            crs: layer.crs,
            properties: layer.property_names.join(", "),
        })
        .collect();
    output.table(rows);

    Ok(())
}
