//! `--stage "<name> [args...]"` options and how they extend a pipeline.
//!
//! Names are matched without regard to case, `_` or `-`, so `toBuffer`,
//! `to_buffer` and `to-buffer` name the same stage.

use crate::errors;
use anyhow::{bail, Result};
use geo::Geometry;
use geopipes_core::config::LayeredConfig;
use geopipes_core::models::PropertyValue;
use geopipes_geo::models::envelope_from_bounds;
use geopipes_geo::parse_wkt;
use geopipes_geo::transform::Affine;
use geopipes_pipeline::Pipeline;
use std::str::FromStr;

/// Stage names with their argument shapes
pub const STAGES: &[(&str, &str)] = &[
    ("attributeFilter", "attributeFilter <name> <value>"),
    ("propertyNullFilter", "propertyNullFilter <name>"),
    ("propertyNotNullFilter", "propertyNotNullFilter <name>"),
    ("windowIntersectionFilter", "windowIntersectionFilter <minx> <miny> <maxx> <maxy>"),
    ("cqlFilter", "cqlFilter <expression>"),
    ("equalExactFilter", "equalExactFilter [tolerance] <wkt>"),
    ("equalNormFilter", "equalNormFilter [tolerance] <wkt>"),
    ("equalTopoFilter", "equalTopoFilter <wkt>"),
    ("osmAttributeFilter", "osmAttributeFilter <key> <value>"),
    ("intersectsFilter", "intersectsFilter <wkt>"),
    ("withinFilter", "withinFilter <wkt>"),
    ("containsFilter", "containsFilter <wkt>"),
    ("distanceFilter", "distanceFilter <max> <wkt>"),
    ("affineTransform", "affineTransform <a> <b> <xoff> <d> <e> <yoff>"),
    ("translate", "translate <dx> <dy>"),
    ("scale", "scale <sx> <sy>"),
    ("rotate", "rotate <degrees>"),
    ("toBoundary", "toBoundary"),
    ("toBuffer", "toBuffer <distance>"),
    ("toCentroid", "toCentroid"),
    ("toConvexHull", "toConvexHull"),
    ("toEnvelope", "toEnvelope"),
    ("toInteriorPoint", "toInteriorPoint"),
    ("densify", "densify <tolerance>"),
    ("simplify", "simplify <tolerance>"),
    ("startPoint", "startPoint"),
    ("endPoint", "endPoint"),
    ("copyRecordProperties", "copyRecordProperties"),
    ("extractPoints", "extractPoints"),
    ("extractOsmPoints", "extractOsmPoints"),
    ("groupByDensityIslands", "groupByDensityIslands <tolerance>"),
    ("calculateArea", "calculateArea"),
    ("calculateLength", "calculateLength"),
    ("calculateDistance", "calculateDistance <wkt>"),
    ("countPoints", "countPoints"),
    ("sort", "sort <property>"),
    ("sortDescending", "sortDescending <property>"),
    ("getMin", "getMin <property>"),
    ("getMax", "getMax <property>"),
    ("unionAll", "unionAll"),
    ("intersectAll", "intersectAll"),
    ("limit", "limit <n>"),
    ("skip", "skip <n>"),
    ("createWellKnownText", "createWellKnownText"),
    ("createJson", "createJson"),
    ("createGeoJsonFeature", "createGeoJsonFeature"),
];

/// One `--stage` option: a stage name and its raw argument text
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub name: String,
    pub args: String,
}

impl FromStr for StageSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            bail!("Empty --stage option");
        }
        let (name, args) = match trimmed.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (trimmed, ""),
        };
        Ok(Self { name: name.to_string(), args: args.to_string() })
    }
}

impl StageSpec {
    /// Append this stage to `pipeline`
    pub fn apply(&self, pipeline: Pipeline, config: &LayeredConfig) -> Result<Pipeline> {
        let key = normalize(&self.name);
        let next = match key.as_str() {
            "attributefilter" => {
                let (name, value) = self.word_and_rest()?;
                pipeline.attribute_filter(name, parse_value(value))
            }
            "propertynullfilter" => pipeline.property_null_filter(self.word()?),
            "propertynotnullfilter" => pipeline.property_not_null_filter(self.word()?),
            "windowintersectionfilter" => {
                let [min_x, min_y, max_x, max_y] = self.numbers::<4>()?;
                pipeline.window_intersection_filter(envelope_from_bounds(min_x, min_y, max_x, max_y))
            }
            "cqlfilter" => pipeline.cql_filter(self.rest()?)?,
            "equalexactfilter" => {
                let (tolerance, geometry) = self.tolerance_and_geometry(config)?;
                pipeline.equal_exact_filter(geometry, tolerance)?
            }
            "equalnormfilter" => {
                let (tolerance, geometry) = self.tolerance_and_geometry(config)?;
                pipeline.equal_norm_filter(geometry, tolerance)?
            }
            "equaltopofilter" => pipeline.equal_topo_filter(self.geometry()?),
            "osmattributefilter" => {
                let (key, value) = self.word_and_rest()?;
                pipeline.osm_attribute_filter(key, unquote(value))
            }
            "intersectsfilter" => pipeline.intersects_filter(self.geometry()?),
            "withinfilter" => pipeline.within_filter(self.geometry()?),
            "containsfilter" => pipeline.contains_filter(self.geometry()?),
            "distancefilter" => {
                let (max_distance, geometry) = self.number_and_geometry()?;
                pipeline.distance_filter(geometry, max_distance)?
            }
            "affinetransform" => {
                let coefficients = self.numbers::<6>()?;
                pipeline.affine_transform(Affine::from_coefficients(&coefficients)?)
            }
            "translate" => {
                let [dx, dy] = self.numbers::<2>()?;
                pipeline.affine_transform(Affine::translation(dx, dy))
            }
            "scale" => {
                let [sx, sy] = self.numbers::<2>()?;
                pipeline.affine_transform(Affine::scaling(sx, sy))
            }
            "rotate" => {
                let [degrees] = self.numbers::<1>()?;
                pipeline.affine_transform(Affine::rotation(degrees))
            }
            "toboundary" => self.no_args(pipeline)?.to_boundary(),
            "tobuffer" => {
                let [distance] = self.numbers::<1>()?;
                pipeline.to_buffer(distance)
            }
            "tocentroid" => self.no_args(pipeline)?.to_centroid(),
            "toconvexhull" => self.no_args(pipeline)?.to_convex_hull(),
            "toenvelope" => self.no_args(pipeline)?.to_envelope(),
            "tointeriorpoint" => self.no_args(pipeline)?.to_interior_point(),
            "densify" => {
                let [tolerance] = self.numbers::<1>()?;
                pipeline.densify(tolerance)?
            }
            "simplify" => {
                let [tolerance] = self.numbers::<1>()?;
                pipeline.simplify(tolerance)?
            }
            "startpoint" => self.no_args(pipeline)?.start_point(),
            "endpoint" => self.no_args(pipeline)?.end_point(),
            "copyrecordproperties" => self.no_args(pipeline)?.copy_record_properties(),
            "extractpoints" => self.no_args(pipeline)?.extract_points(),
            "extractosmpoints" => self.no_args(pipeline)?.extract_osm_points(),
            "groupbydensityislands" => {
                let [tolerance] = self.numbers::<1>()?;
                pipeline.group_by_density_islands(tolerance)?
            }
            "calculatearea" => self.no_args(pipeline)?.calculate_area(),
            "calculatelength" => self.no_args(pipeline)?.calculate_length(),
            "calculatedistance" => pipeline.calculate_distance(self.geometry()?),
            "countpoints" => self.no_args(pipeline)?.count_points(),
            "sort" => pipeline.sort(self.word()?),
            "sortdescending" => pipeline.sort_descending(self.word()?),
            "getmin" => pipeline.get_min(self.word()?),
            "getmax" => pipeline.get_max(self.word()?),
            "unionall" => self.no_args(pipeline)?.union_all(),
            "intersectall" => self.no_args(pipeline)?.intersect_all(),
            "limit" => pipeline.limit(self.count()?),
            "skip" => pipeline.skip(self.count()?),
            "createwellknowntext" => self.no_args(pipeline)?.create_well_known_text(),
            "createjson" => self.no_args(pipeline)?.create_json(),
            "creategeojsonfeature" => self.no_args(pipeline)?.create_geojson_feature(),
            _ => return Err(errors::unknown_stage(&self.name, &similar_names(&self.name)).into()),
        };

        tracing::debug!(stage = %self.name, args = %self.args, "Appended stage");
        Ok(next)
    }

    fn bad(&self, reason: impl AsRef<str>) -> anyhow::Error {
        let key = normalize(&self.name);
        let usage = STAGES
            .iter()
            .find(|(name, _)| normalize(name) == key)
            .map(|(_, usage)| *usage)
            .unwrap_or(self.name.as_str());
        errors::bad_stage_arguments(&self.name, usage, reason.as_ref()).into()
    }

    fn no_args(&self, pipeline: Pipeline) -> Result<Pipeline> {
        if !self.args.is_empty() {
            return Err(self.bad(format!("takes no arguments, got '{}'", self.args)));
        }
        Ok(pipeline)
    }

    fn rest(&self) -> Result<&str> {
        if self.args.is_empty() {
            return Err(self.bad("missing argument"));
        }
        Ok(&self.args)
    }

    fn word(&self) -> Result<&str> {
        let word = self.rest()?;
        if word.contains(char::is_whitespace) {
            return Err(self.bad(format!("expected one word, got '{}'", word)));
        }
        Ok(word)
    }

    fn word_and_rest(&self) -> Result<(&str, &str)> {
        self.rest()?
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .ok_or_else(|| self.bad("expected a name followed by a value"))
    }

    fn count(&self) -> Result<usize> {
        let word = self.word()?;
        word.parse().map_err(|_| self.bad(format!("'{}' is not a count", word)))
    }

    fn numbers<const N: usize>(&self) -> Result<[f64; N]> {
        let values = self
            .args
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| token.parse::<f64>().map_err(|_| self.bad(format!("'{}' is not a number", token))))
            .collect::<Result<Vec<f64>>>()?;
        let found = values.len();
        values
            .try_into()
            .map_err(|_| self.bad(format!("expected {} numbers, got {}", N, found)))
    }

    fn geometry(&self) -> Result<Geometry<f64>> {
        parse_geometry(self.rest()?).map_err(|reason| self.bad(reason))
    }

    fn number_and_geometry(&self) -> Result<(f64, Geometry<f64>)> {
        let (first, rest) = self.word_and_rest()?;
        let number = first.parse().map_err(|_| self.bad(format!("'{}' is not a number", first)))?;
        let geometry = parse_geometry(rest).map_err(|reason| self.bad(reason))?;
        Ok((number, geometry))
    }

    /// A leading number is the tolerance; otherwise the configured one applies
    fn tolerance_and_geometry(&self, config: &LayeredConfig) -> Result<(f64, Geometry<f64>)> {
        let args = self.rest()?;
        if let Some((first, rest)) = args.split_once(char::is_whitespace) {
            if let Ok(tolerance) = first.parse::<f64>() {
                let geometry = parse_geometry(rest.trim()).map_err(|reason| self.bad(reason))?;
                return Ok((tolerance, geometry));
            }
        }
        Ok((config.equality_tolerance.value, self.geometry()?))
    }
}

fn parse_geometry(wkt: &str) -> std::result::Result<Geometry<f64>, String> {
    parse_wkt(wkt).map_err(|e| e.to_string())
}

fn normalize(name: &str) -> String {
    name.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect()
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('\'') && value.ends_with('\''))
            || (value.starts_with('"') && value.ends_with('"')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Quoted text stays a string; bare words are typed when they parse
fn parse_value(value: &str) -> PropertyValue {
    let unquoted = unquote(value);
    if unquoted.len() != value.len() {
        return PropertyValue::from(unquoted);
    }
    if value == "null" {
        return PropertyValue::Null;
    }
    if let Ok(b) = value.parse::<bool>() {
        return PropertyValue::Boolean(b);
    }
    if let Ok(i) = value.parse::<i64>() {
        return PropertyValue::Integer(i);
    }
    if let Ok(f) = value.parse::<f64>() {
        return PropertyValue::Float(f);
    }
    PropertyValue::from(value)
}

/// Known stage names within two edits of `name`
fn similar_names(name: &str) -> Vec<&'static str> {
    let key = normalize(name);
    STAGES
        .iter()
        .map(|(candidate, _)| *candidate)
        .filter(|candidate| edit_distance(&key, &normalize(candidate)) <= 2)
        .collect()
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        previous = current;
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use geopipes_core::models::GeometryFactory;
    use geopipes_pipeline::Flow;

    fn spec(text: &str) -> StageSpec {
        text.parse().unwrap()
    }

    fn squares() -> Pipeline {
        let flows = [
            ("A", "POLYGON ((0 0, 0 2, 2 2, 2 0, 0 0))"),
            ("B", "POLYGON ((10 10, 10 13, 13 13, 13 10, 10 10))"),
        ]
        .iter()
        .map(|(name, wkt)| Flow::new(parse_wkt(wkt).unwrap(), vec![]).with_property("name", *name))
        .collect();
        Pipeline::from_flows(flows, GeometryFactory::default())
    }

    fn run(stages: &[&str]) -> Result<Vec<Flow>> {
        let config = LayeredConfig::with_defaults();
        let mut pipeline = squares();
        for text in stages {
            pipeline = spec(text).apply(pipeline, &config)?;
        }
        Ok(pipeline.collect()?)
    }

    #[test]
    fn test_parse_splits_name_from_arguments() {
        assert_eq!(
            spec("  cqlFilter name = 'A'  "),
            StageSpec { name: "cqlFilter".to_string(), args: "name = 'A'".to_string() }
        );
        assert_eq!(spec("unionAll").args, "");
        assert!("   ".parse::<StageSpec>().is_err());
    }

    #[test]
    fn test_names_ignore_case_and_separators() {
        assert_eq!(run(&["attribute_filter name A"]).unwrap().len(), 1);
        assert_eq!(run(&["ATTRIBUTE-FILTER name 'B'"]).unwrap().len(), 1);
    }

    #[test]
    fn test_chained_stages() {
        let flows = run(&["translate 1 1", "calculateArea", "sortDescending Area", "limit 1"]).unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].property("Area"), Some(&PropertyValue::Float(9.0)));
        assert_eq!(flows[0].property("name"), Some(&PropertyValue::from("B")));
    }

    #[test]
    fn test_cql_and_window_stages() {
        assert_eq!(run(&["cqlFilter name IN ('A', 'C')"]).unwrap().len(), 1);
        assert_eq!(run(&["windowIntersectionFilter 9,9,20,20"]).unwrap().len(), 1);
        assert!(run(&["cqlFilter name = "]).is_err());
    }

    #[test]
    fn test_equal_exact_uses_configured_tolerance_by_default() {
        assert_eq!(run(&["equalExactFilter POLYGON ((0 0, 0 2, 2 2, 2 0, 0 0))"]).unwrap().len(), 1);
        assert_eq!(run(&["equalExactFilter POLYGON ((0 0, 0 2.1, 2 2, 2 0, 0 0))"]).unwrap().len(), 0);
        assert_eq!(run(&["equalExactFilter 0.2 POLYGON ((0 0, 0 2.1, 2 2, 2 0, 0 0))"]).unwrap().len(), 1);
    }

    #[test]
    fn test_attribute_values_are_typed() {
        assert_eq!(parse_value("3"), PropertyValue::Integer(3));
        assert_eq!(parse_value("2.5"), PropertyValue::Float(2.5));
        assert_eq!(parse_value("true"), PropertyValue::Boolean(true));
        assert_eq!(parse_value("'3'"), PropertyValue::from("3"));
        assert_eq!(parse_value("null"), PropertyValue::Null);
    }

    #[test]
    fn test_bad_arguments_are_reported() {
        assert!(run(&["toBuffer"]).is_err());
        assert!(run(&["toBuffer wide"]).is_err());
        assert!(run(&["translate 1"]).is_err());
        assert!(run(&["unionAll now"]).is_err());
        assert!(run(&["densify -1"]).is_err());
        assert!(run(&["intersectsFilter POLYGON (("]).is_err());
    }

    #[test]
    fn test_unknown_stage_suggests_close_names() {
        assert_eq!(similar_names("toBufer"), vec!["toBuffer"]);
        let error = run(&["toBufer 2"]).unwrap_err();
        assert_eq!(error.to_string(), "Unknown stage: toBufer");
    }

    #[test]
    fn test_every_listed_stage_is_recognized() {
        let config = LayeredConfig::with_defaults();
        for (name, _) in STAGES {
            let result = StageSpec { name: name.to_string(), args: String::new() }.apply(squares(), &config);
            if let Err(error) = result {
                assert!(!error.to_string().starts_with("Unknown stage"), "{} was not recognized", name);
            }
        }
    }
}
