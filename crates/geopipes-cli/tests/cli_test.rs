//! Integration tests for the geopipes binary
//!
//! These tests run the built binary against a dataset file and check the
//! JSON it prints.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const DATASET: &str = r#"
[[layers]]
name = "boxes"

[[layers.features]]
wkt = "POLYGON ((12 26, 12 27, 13 27, 13 26, 12 26))"
properties = { name = "A" }

[[layers.features]]
wkt = "POLYGON ((2 3, 2 5, 6 5, 6 3, 2 3))"
properties = { name = "B" }

[[layers]]
name = "two-street.osm"

[[layers.ways]]
id = 1
tags = { name = "Storgatan" }
nodes = [{ id = 1, x = 12.0, y = 56.05 }, { id = 2, x = 12.01, y = 56.05 }, { id = 3, x = 12.02, y = 56.05 }]
"#;

fn dataset() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.toml");
    std::fs::write(&path, DATASET).unwrap();
    (dir, path)
}

fn geopipes(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_geopipes"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

#[test]
fn test_layers_lists_dataset_layers() {
    let (_dir, path) = dataset();
    let output = geopipes(&["layers", path.to_str().unwrap(), "--json"]);
    assert!(output.status.success());

    let parsed = json(&output);
    assert_eq!(parsed["status"], "success");
    let layers = parsed["data"]["layers"].as_array().unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0]["name"], "boxes");
    assert_eq!(layers[0]["records"], 2);
}

#[test]
fn test_run_applies_stages_in_order() {
    let (_dir, path) = dataset();
    let output = geopipes(&[
        "run",
        path.to_str().unwrap(),
        "--layer",
        "boxes",
        "--stage",
        "cqlFilter name = 'B'",
        "--stage",
        "calculateArea",
        "--stage",
        "createWellKnownText",
        "--json",
    ]);
    assert!(output.status.success());

    let data = &json(&output)["data"];
    assert_eq!(data["flow_count"], 1);
    let flow = &data["flows"][0];
    assert_eq!(flow["properties"]["Area"], 8.0);
    assert_eq!(flow["properties"]["WellKnownText"], "POLYGON ((2 3, 2 5, 6 5, 6 3, 2 3))");
}

#[test]
fn test_run_extracts_osm_points() {
    let (_dir, path) = dataset();
    let output = geopipes(&[
        "run",
        path.to_str().unwrap(),
        "-l",
        "two-street.osm",
        "-s",
        "extractOsmPoints",
        "--json",
    ]);
    assert!(output.status.success());
    assert_eq!(json(&output)["data"]["flow_count"], 3);
}

#[test]
fn test_run_window_start_and_geojson_export() {
    let (_dir, path) = dataset();
    let output = geopipes(&[
        "run",
        path.to_str().unwrap(),
        "--layer",
        "boxes",
        "--window",
        "11,25,14,28",
        "--geojson",
    ]);
    assert!(output.status.success());

    let collection = json(&output);
    assert_eq!(collection["type"], "FeatureCollection");
    assert_eq!(collection["features"].as_array().unwrap().len(), 1);
}

#[test]
fn test_unknown_layer_fails() {
    let (_dir, path) = dataset();
    let output = geopipes(&["run", path.to_str().unwrap(), "--layer", "rivers"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Layer not found: rivers"));
}

#[test]
fn test_unknown_stage_suggests_a_name() {
    let (_dir, path) = dataset();
    let output = geopipes(&["run", path.to_str().unwrap(), "--layer", "boxes", "--stage", "toBufer 1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("toBuffer"));
}

#[test]
fn test_cql_reports_syntax_errors() {
    let ok = geopipes(&["cql", "name LIKE 'St%' AND BBOX(geom, 0, 0, 1, 1)", "--json"]);
    assert!(ok.status.success());
    assert_eq!(json(&ok)["data"]["valid"], true);

    let bad = geopipes(&["cql", "name = "]);
    assert!(!bad.status.success());
    assert!(String::from_utf8_lossy(&bad.stderr).contains("CQL syntax error"));
}

#[test]
fn test_config_reports_cli_sources() {
    let output = geopipes(&["config", "--srid", "3006", "--json"]);
    assert!(output.status.success());

    let data = &json(&output)["data"];
    assert_eq!(data["srid"]["value"], "EPSG:3006");
    assert_eq!(data["srid"]["source"], "Cli");
}

#[test]
fn test_missing_dataset_fails() {
    let output = geopipes(&["layers", "/nonexistent/dataset.toml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Dataset file not found"));
}
