//! Run command implementation

use crate::cli::RunArgs;
use crate::dataset::load_dataset;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::{FlowItem, RunOutput};
use crate::stage_spec::StageSpec;
use anyhow::{bail, Result};
use geopipes_core::config::LayeredConfig;
use geopipes_core::GeopipesError;
use geopipes_geo::models::envelope_from_bounds;
use geopipes_geo::serialize::to_wkt;
use geopipes_pipeline::{start, start_window_search, Flow};
use tabled::Tabled;

/// Longest geometry text shown in a table cell
const MAX_WKT_WIDTH: usize = 60;

pub fn execute(args: RunArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let stages = args
        .stages
        .iter()
        .map(|text| text.parse::<StageSpec>())
        .collect::<Result<Vec<_>>>()?;

    let database = load_dataset(&args.dataset, config)?;
    let layer = match database.layer(&args.layer) {
        Ok(layer) => layer,
        Err(GeopipesError::LayerNotFound { name }) => {
            return Err(errors::layer_not_found(&name, &database.layer_names()?).into())
        }
        Err(error) => return Err(error.into()),
    };

    let mut pipeline = match &args.window {
        Some(bounds) => start_window_search(layer.as_ref(), parse_bounds(bounds)?)?,
        None => start(layer.as_ref())?,
    };
    for stage in &stages {
        pipeline = stage.apply(pipeline, config)?;
    }

    if args.geojson {
        let collection = pipeline.to_feature_collection()?;
        println!("{}", serde_json::to_string_pretty(&collection)?);
        return Ok(());
    }

    let flows = pipeline.collect()?;
    tracing::info!(layer = %args.layer, stages = stages.len(), flows = flows.len(), "Pipeline finished");

    if output.is_json() {
        return output.result(RunOutput {
            layer: args.layer,
            stages: args.stages,
            flow_count: flows.len(),
            flows: flows.iter().map(flow_item).collect(),
        });
    }

    output.section(format!("{} flow(s) from {}", flows.len(), args.layer));

    #[derive(Tabled)]
    struct FlowRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "Geometry")]
        geometry: String,
        #[tabled(rename = "Properties")]
        properties: String,
        #[tabled(rename = "Records")]
        records: String,
    }

    let rows: Vec<FlowRow> = flows
        .iter()
        .enumerate()
        .map(|(index, flow)| FlowRow {
            index,
            geometry: truncate(&to_wkt(&flow.geometry), MAX_WKT_WIDTH),
            properties: flow
                .properties
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join(", "),
            records: flow
                .records()
                .iter()
                .map(|record| record.id.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    output.table(rows);

    Ok(())
}

fn flow_item(flow: &Flow) -> FlowItem {
    FlowItem {
        geometry: to_wkt(&flow.geometry),
        properties: flow
            .properties
            .iter()
            .map(|(name, value)| (name.clone(), serde_json::Value::from(value.clone())))
            .collect(),
        records: flow.records().iter().map(|record| record.id.0).collect(),
    }
}

/// `minx,miny,maxx,maxy`
fn parse_bounds(text: &str) -> Result<geo::Rect<f64>> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<f64>, _>>();
    match values.as_deref() {
        Ok([min_x, min_y, max_x, max_y]) => Ok(envelope_from_bounds(*min_x, *min_y, *max_x, *max_y)),
        _ => bail!("--window expects minx,miny,maxx,maxy, got '{}'", text),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_dataset;
    use geopipes_pipeline::Pipeline;

    fn run_stages(pipeline: Pipeline, stages: &[&str], config: &LayeredConfig) -> Result<Pipeline> {
        stages
            .iter()
            .try_fold(pipeline, |pipeline, text| text.parse::<StageSpec>()?.apply(pipeline, config))
    }

    #[test]
    fn test_parse_bounds() {
        let rect = parse_bounds("1, 2,3,4").unwrap();
        assert_eq!(rect.min().x, 1.0);
        assert_eq!(rect.max().y, 4.0);
        assert!(parse_bounds("1,2,3").is_err());
        assert!(parse_bounds("a,b,c,d").is_err());
    }

    #[test]
    fn test_truncate_long_geometry_text() {
        assert_eq!(truncate("POINT (1 2)", 60), "POINT (1 2)");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }

    #[test]
    fn test_window_start_then_stages() {
        let config = LayeredConfig::with_defaults();
        let database = parse_dataset(
            "[[layers]]\nname = \"pts\"\n\
             [[layers.features]]\nwkt = \"POINT (1 1)\"\nproperties = { n = 1 }\n\
             [[layers.features]]\nwkt = \"POINT (5 5)\"\nproperties = { n = 2 }\n\
             [[layers.features]]\nwkt = \"POINT (9 9)\"\nproperties = { n = 3 }\n",
            &config,
        )
        .unwrap();
        let layer = database.layer("pts").unwrap();

        let pipeline = start_window_search(layer.as_ref(), parse_bounds("0,0,6,6").unwrap()).unwrap();
        let flows = run_stages(pipeline, &["copyRecordProperties", "sortDescending n"], &config)
            .unwrap()
            .collect()
            .unwrap();
        let items: Vec<FlowItem> = flows.iter().map(flow_item).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].geometry, "POINT (5 5)");
        assert_eq!(items[0].properties["n"], serde_json::json!(2));
        assert_eq!(items[1].records, vec![1]);
    }
}
