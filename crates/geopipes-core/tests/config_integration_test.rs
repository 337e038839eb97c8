//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use geopipes_core::config::{
    parse_precision_model, parse_validity_mode, CliConfigOverrides, ConfigSource, LayeredConfig,
};
use geopipes_core::models::{Crs, PrecisionModel, ValidityMode};
use geopipes_core::GeopipesError;
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

fn clear_env() {
    env::remove_var("GEOPIPES_SRID");
    env::remove_var("GEOPIPES_PRECISION");
    env::remove_var("GEOPIPES_GEOMETRY_VALIDITY");
    env::remove_var("GEOPIPES_EQUALITY_TOLERANCE");
}

#[test]
fn test_default_configuration() {
    let config = LayeredConfig::with_defaults();

    assert_eq!(config.srid.value, 4326);
    assert_eq!(config.srid.source, ConfigSource::Default);
    assert_eq!(config.precision.value, PrecisionModel::Floating);
    assert_eq!(config.geometry_validity.value, ValidityMode::Lenient);
    assert_eq!(config.equality_tolerance.value, 0.0);
}

#[test]
fn test_partial_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "srid = 3857").unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.srid.value, 3857);
    assert_eq!(config.srid.source, ConfigSource::File);
    assert_eq!(config.precision.source, ConfigSource::Default);
    assert_eq!(config.geometry_validity.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
srid = 3857
geometry_validity = "Strict"
"#
    )
    .unwrap();

    env::set_var("GEOPIPES_SRID", "32748");
    env::set_var("GEOPIPES_EQUALITY_TOLERANCE", "0.25");

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();
    clear_env();

    assert_eq!(config.srid.value, 32748);
    assert_eq!(config.srid.source, ConfigSource::Environment);
    assert_eq!(config.geometry_validity.value, ValidityMode::Strict);
    assert_eq!(config.geometry_validity.source, ConfigSource::File);
    assert_eq!(config.equality_tolerance.value, 0.25);
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "precision = \"fixed:10\"").unwrap();

    env::set_var("GEOPIPES_PRECISION", "fixed:100");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();
    clear_env();

    assert_eq!(config.precision.value, PrecisionModel::Fixed { scale: 100.0 });
    assert_eq!(config.precision.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides {
        precision: Some(PrecisionModel::Fixed { scale: 1000.0 }),
        ..Default::default()
    });

    assert_eq!(config.precision.value, PrecisionModel::Fixed { scale: 1000.0 });
    assert_eq!(config.precision.source, ConfigSource::Cli);
}

#[test]
#[serial]
fn test_malformed_environment_is_ignored() {
    clear_env();
    env::set_var("GEOPIPES_GEOMETRY_VALIDITY", "sometimes");
    env::set_var("GEOPIPES_EQUALITY_TOLERANCE", "-3");

    let config = LayeredConfig::with_defaults().load_from_env();
    clear_env();

    assert_eq!(config.geometry_validity.source, ConfigSource::Default);
    assert_eq!(config.equality_tolerance.source, ConfigSource::Default);
}

#[test]
fn test_parse_variations() {
    assert_eq!(parse_precision_model("  Floating ").unwrap(), PrecisionModel::Floating);
    assert_eq!(parse_precision_model("fixed:0.5").unwrap(), PrecisionModel::Fixed { scale: 0.5 });
    assert!(parse_precision_model("fixed:-2").is_err());
    assert!(parse_precision_model("double").is_err());

    assert_eq!(parse_validity_mode("Strict").unwrap(), ValidityMode::Strict);
    assert!(parse_validity_mode("").is_err());
}

#[test]
fn test_invalid_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "srid = [not toml").unwrap();

    let result = LayeredConfig::with_defaults().load_from_file(file.path());
    assert!(matches!(result, Err(GeopipesError::ConfigInvalid { .. })));
}

#[test]
fn test_missing_config_file() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/geopipes.toml");
    assert!(result.is_err());
}

#[test]
fn test_full_configuration_workflow() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
srid = 3857
precision = "fixed:1"
geometry_validity = "Strict"
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();
    let factory = config.geometry_factory();

    assert_eq!(factory.crs(), &Crs::web_mercator());
    assert_eq!(factory.validity(), ValidityMode::Strict);

    let snapped = factory.create(geo::Geometry::Point(geo::Point::new(1.4, 2.6)));
    assert_eq!(snapped, geo::Geometry::Point(geo::Point::new(1.0, 3.0)));
}
