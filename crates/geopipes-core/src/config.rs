use crate::error::{GeopipesError, Result};
use crate::models::{Crs, GeometryFactory, PrecisionModel, ValidityMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for GeoPipes
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub srid: ConfigValue<u32>,
    pub precision: ConfigValue<PrecisionModel>,
    pub geometry_validity: ConfigValue<ValidityMode>,
    pub equality_tolerance: ConfigValue<f64>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            srid: ConfigValue::new(4326, ConfigSource::Default),
            precision: ConfigValue::new(PrecisionModel::Floating, ConfigSource::Default),
            geometry_validity: ConfigValue::new(ValidityMode::Lenient, ConfigSource::Default),
            equality_tolerance: ConfigValue::new(0.0, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeopipesError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeopipesError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(srid) = file_config.srid {
            self.srid.update(srid, ConfigSource::File);
        }

        if let Some(precision) = file_config.precision {
            self.precision.update(parse_precision_model(&precision)?, ConfigSource::File);
        }

        if let Some(geometry_validity) = file_config.geometry_validity {
            self.geometry_validity.update(geometry_validity, ConfigSource::File);
        }

        if let Some(tolerance) = file_config.equality_tolerance {
            self.equality_tolerance.update(check_tolerance(tolerance)?, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // GEOPIPES_SRID
        if let Ok(srid_str) = env::var("GEOPIPES_SRID") {
            match srid_str.parse::<u32>() {
                Ok(srid) => self.srid.update(srid, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOPIPES_SRID value '{}': expected integer EPSG code",
                    srid_str
                ),
            }
        }

        // GEOPIPES_PRECISION
        if let Ok(precision_str) = env::var("GEOPIPES_PRECISION") {
            match parse_precision_model(&precision_str) {
                Ok(precision) => self.precision.update(precision, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOPIPES_PRECISION value '{}': expected floating or fixed:<scale>",
                    precision_str
                ),
            }
        }

        // GEOPIPES_GEOMETRY_VALIDITY
        if let Ok(validity_str) = env::var("GEOPIPES_GEOMETRY_VALIDITY") {
            match parse_validity_mode(&validity_str) {
                Ok(validity) => self.geometry_validity.update(validity, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOPIPES_GEOMETRY_VALIDITY value '{}': expected strict or lenient",
                    validity_str
                ),
            }
        }

        // GEOPIPES_EQUALITY_TOLERANCE
        if let Ok(tolerance_str) = env::var("GEOPIPES_EQUALITY_TOLERANCE") {
            match tolerance_str.parse::<f64>().map_err(|_| ()).and_then(|t| {
                check_tolerance(t).map_err(|_| ())
            }) {
                Ok(tolerance) => {
                    self.equality_tolerance.update(tolerance, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid GEOPIPES_EQUALITY_TOLERANCE value '{}': expected a non-negative number",
                    tolerance_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(srid) = overrides.srid {
            self.srid.update(srid, ConfigSource::Cli);
        }

        if let Some(precision) = overrides.precision {
            self.precision.update(precision, ConfigSource::Cli);
        }

        if let Some(geometry_validity) = overrides.geometry_validity {
            self.geometry_validity.update(geometry_validity, ConfigSource::Cli);
        }

        if let Some(tolerance) = overrides.equality_tolerance {
            self.equality_tolerance.update(tolerance, ConfigSource::Cli);
        }
    }

    /// The geometry factory new layers are created with
    pub fn geometry_factory(&self) -> GeometryFactory {
        GeometryFactory::new(self.precision.value, Crs::from_epsg(self.srid.value))
            .with_validity(self.geometry_validity.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("srid".to_string(), (format!("EPSG:{}", self.srid.value), self.srid.source));

        map.insert(
            "precision".to_string(),
            (self.precision.value.to_string(), self.precision.source),
        );

        map.insert(
            "geometry_validity".to_string(),
            (format!("{:?}", self.geometry_validity.value), self.geometry_validity.source),
        );

        map.insert(
            "equality_tolerance".to_string(),
            (self.equality_tolerance.value.to_string(), self.equality_tolerance.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    srid: Option<u32>,
    precision: Option<String>,
    geometry_validity: Option<ValidityMode>,
    equality_tolerance: Option<f64>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub srid: Option<u32>,
    pub precision: Option<PrecisionModel>,
    pub geometry_validity: Option<ValidityMode>,
    pub equality_tolerance: Option<f64>,
}

/// Parse a precision model: `floating` or `fixed:<scale>`
pub fn parse_precision_model(s: &str) -> Result<PrecisionModel> {
    let lower = s.trim().to_lowercase();
    if lower == "floating" {
        return Ok(PrecisionModel::Floating);
    }

    let invalid = || GeopipesError::ConfigInvalid {
        key: "precision".to_string(),
        reason: format!("Invalid precision model: {}. Use floating or fixed:<scale>", s),
    };

    let scale = lower
        .strip_prefix("fixed:")
        .ok_or_else(invalid)?
        .parse::<f64>()
        .map_err(|_| invalid())?;

    if !scale.is_finite() || scale <= 0.0 {
        return Err(invalid());
    }
    Ok(PrecisionModel::Fixed { scale })
}

/// Parse validity mode from string
pub fn parse_validity_mode(s: &str) -> Result<ValidityMode> {
    match s.to_lowercase().as_str() {
        "strict" => Ok(ValidityMode::Strict),
        "lenient" => Ok(ValidityMode::Lenient),
        _ => Err(GeopipesError::ConfigInvalid {
            key: "geometry_validity".to_string(),
            reason: format!("Invalid validity mode: {}. Use strict or lenient", s),
        }),
    }
}

fn check_tolerance(tolerance: f64) -> Result<f64> {
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(tolerance)
    } else {
        Err(GeopipesError::ConfigInvalid {
            key: "equality_tolerance".to_string(),
            reason: format!("Tolerance must be a non-negative number, got {}", tolerance),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.srid.value, 4326);
        assert_eq!(config.srid.source, ConfigSource::Default);
        assert_eq!(config.precision.value, PrecisionModel::Floating);
        assert_eq!(config.equality_tolerance.value, 0.0);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
srid = 3857
precision = "fixed:1000"
geometry_validity = "Strict"
equality_tolerance = 0.5
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.srid.value, 3857);
        assert_eq!(config.srid.source, ConfigSource::File);
        assert_eq!(config.precision.value, PrecisionModel::Fixed { scale: 1000.0 });
        assert_eq!(config.geometry_validity.value, ValidityMode::Strict);
        assert_eq!(config.equality_tolerance.value, 0.5);
    }

    #[test]
    fn test_load_from_file_rejects_negative_tolerance() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "equality_tolerance = -1.0").unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(GeopipesError::ConfigInvalid { .. })));
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        env::set_var("GEOPIPES_SRID", "32748");
        env::set_var("GEOPIPES_PRECISION", "not-a-model");
        let config = LayeredConfig::with_defaults().load_from_env();
        env::remove_var("GEOPIPES_SRID");
        env::remove_var("GEOPIPES_PRECISION");

        assert_eq!(config.srid.value, 32748);
        assert_eq!(config.srid.source, ConfigSource::Environment);
        // Malformed values are ignored with a warning
        assert_eq!(config.precision.source, ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            srid: Some(3857),
            precision: Some(PrecisionModel::Fixed { scale: 10.0 }),
            geometry_validity: None,
            equality_tolerance: None,
        });

        assert_eq!(config.srid.value, 3857);
        assert_eq!(config.srid.source, ConfigSource::Cli);
        assert_eq!(config.geometry_validity.source, ConfigSource::Default);

        let factory = config.geometry_factory();
        assert_eq!(factory.crs(), &Crs::web_mercator());
        assert_eq!(factory.precision(), PrecisionModel::Fixed { scale: 10.0 });
    }

    #[test]
    fn test_parse_precision_model() {
        assert_eq!(parse_precision_model("floating").unwrap(), PrecisionModel::Floating);
        assert_eq!(
            parse_precision_model("FIXED:100").unwrap(),
            PrecisionModel::Fixed { scale: 100.0 }
        );
        assert!(parse_precision_model("fixed:0").is_err());
        assert!(parse_precision_model("fixed").is_err());
    }

    #[test]
    fn test_parse_validity_mode() {
        assert_eq!(parse_validity_mode("strict").unwrap(), ValidityMode::Strict);
        assert_eq!(parse_validity_mode("LENIENT").unwrap(), ValidityMode::Lenient);
        assert!(parse_validity_mode("invalid").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let map = LayeredConfig::with_defaults().to_inspection_map();

        let (srid_value, srid_source) = &map["srid"];
        assert_eq!(srid_value, "EPSG:4326");
        assert_eq!(*srid_source, ConfigSource::Default);
        assert_eq!(map["precision"].0, "floating");
    }
}
