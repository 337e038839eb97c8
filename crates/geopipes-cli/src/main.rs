//! GeoPipes CLI - Command-line interface
//!
//! Loads a TOML dataset into an in-memory spatial database and runs
//! geometry pipelines over its layers.

mod cli;
mod commands;
mod config_loader;
mod dataset;
mod errors;
mod output;
mod output_types;
mod stage_spec;

use clap::Parser;
use cli::Cli;

fn main() {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(error) = commands::execute(cli) {
        errors::from_anyhow(error).display();
        std::process::exit(1);
    }
}
