//! Configuration loading utilities for CLI commands

use crate::cli::Cli;
use anyhow::{bail, Context, Result};
use geopipes_core::config::{
    parse_precision_model, parse_validity_mode, CliConfigOverrides, LayeredConfig,
};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "geopipes.toml";

/// Load layered configuration: defaults, config file, environment, then CLI flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    // An explicit path must exist; the default file is optional
    if let Some(path) = config_path(cli.config.as_deref()) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }
    config = config.load_from_env();

    config.update_from_cli(cli_overrides(cli)?);
    Ok(config)
}

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

fn cli_overrides(cli: &Cli) -> Result<CliConfigOverrides> {
    let precision = cli.precision.as_deref().map(parse_precision_model).transpose()?;
    let geometry_validity = cli.validity_mode.as_deref().map(parse_validity_mode).transpose()?;

    if let Some(tolerance) = cli.equality_tolerance {
        if !tolerance.is_finite() || tolerance < 0.0 {
            bail!("--equality-tolerance must be a non-negative number, got {}", tolerance);
        }
    }

    Ok(CliConfigOverrides {
        srid: cli.srid,
        precision,
        geometry_validity,
        equality_tolerance: cli.equality_tolerance,
    })
}
