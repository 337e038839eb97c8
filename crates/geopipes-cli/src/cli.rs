use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GeoPipes - geometry pipelines over spatially indexed layers
#[derive(Parser, Debug)]
#[command(name = "geopipes")]
#[command(about = "Run geometry pipelines over spatially indexed layers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./geopipes.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Spatial reference id of new layers
    #[arg(long, global = true)]
    pub srid: Option<u32>,

    /// Precision model: floating or fixed:<scale>
    #[arg(long, global = true)]
    pub precision: Option<String>,

    /// Geometry validity mode (strict or lenient)
    #[arg(long, global = true)]
    pub validity_mode: Option<String>,

    /// Default tolerance of equalExactFilter and equalNormFilter
    #[arg(long, global = true)]
    pub equality_tolerance: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the layers of a dataset file
    Layers(LayersArgs),

    /// Run a pipeline over one layer of a dataset file
    Run(RunArgs),

    /// Show the effective configuration and where each value came from
    Config,

    /// Compile a CQL expression and report syntax errors
    Cql(CqlArgs),
}

#[derive(Parser, Debug)]
pub struct LayersArgs {
    /// TOML dataset file
    pub dataset: PathBuf,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// TOML dataset file
    pub dataset: PathBuf,

    /// Layer the pipeline starts from
    #[arg(long, short = 'l')]
    pub layer: String,

    /// Start from a window search: minx,miny,maxx,maxy
    #[arg(long, value_name = "BOUNDS")]
    pub window: Option<String>,

    /// Stage to append, as "<name> [args...]"; repeat to chain
    /// Example: --stage "toBuffer 2" --stage "calculateArea"
    #[arg(long = "stage", short = 's', value_name = "STAGE")]
    pub stages: Vec<String>,

    /// Print the flows as a GeoJSON FeatureCollection
    #[arg(long)]
    pub geojson: bool,
}

#[derive(Parser, Debug)]
pub struct CqlArgs {
    /// The expression to compile
    pub expression: String,
}
