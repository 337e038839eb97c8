//! Text encodings of geometries: WKT and compact GeoJSON.
//!
//! Both writers print integral ordinates without a decimal point
//! (`12`, not `12.0`), other values in shortest round-trip form.

use crate::models::to_canonical;
use geo::{Coord, Geometry, LineString, Polygon};
use serde_json::{json, Map, Number, Value};

/// Largest magnitude printed as an integer.
const INTEGRAL_LIMIT: f64 = 1e15;

fn is_integral(v: f64) -> bool {
    v.is_finite() && v.fract() == 0.0 && v.abs() < INTEGRAL_LIMIT
}

fn format_ordinate(v: f64) -> String {
    if is_integral(v) {
        // `as` maps -0.0 to 0
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

fn wkt_coord(c: &Coord<f64>) -> String {
    format!("{} {}", format_ordinate(c.x), format_ordinate(c.y))
}

fn wkt_sequence(line: &LineString<f64>) -> String {
    let coords: Vec<String> = line.0.iter().map(wkt_coord).collect();
    format!("({})", coords.join(", "))
}

fn wkt_polygon_body(polygon: &Polygon<f64>) -> String {
    let rings: Vec<String> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(wkt_sequence)
        .collect();
    format!("({})", rings.join(", "))
}

fn wkt_tagged(tag: &str, body: Option<String>) -> String {
    match body {
        Some(body) => format!("{} {}", tag, body),
        None => format!("{} EMPTY", tag),
    }
}

/// Canonical WKT: `TYPE (x y, x y)`, `TYPE EMPTY` for empty geometries.
pub fn to_wkt(geometry: &Geometry<f64>) -> String {
    match to_canonical(geometry.clone()) {
        Geometry::Point(p) => format!("POINT ({})", wkt_coord(&p.0)),
        Geometry::LineString(ls) => {
            wkt_tagged("LINESTRING", (!ls.0.is_empty()).then(|| wkt_sequence(&ls)))
        }
        Geometry::Polygon(poly) => wkt_tagged(
            "POLYGON",
            (!poly.exterior().0.is_empty()).then(|| wkt_polygon_body(&poly)),
        ),
        Geometry::MultiPoint(mp) => wkt_tagged(
            "MULTIPOINT",
            (!mp.0.is_empty()).then(|| {
                let points: Vec<String> =
                    mp.0.iter().map(|p| format!("({})", wkt_coord(&p.0))).collect();
                format!("({})", points.join(", "))
            }),
        ),
        Geometry::MultiLineString(mls) => wkt_tagged(
            "MULTILINESTRING",
            (!mls.0.is_empty()).then(|| {
                let lines: Vec<String> = mls.0.iter().map(wkt_sequence).collect();
                format!("({})", lines.join(", "))
            }),
        ),
        Geometry::MultiPolygon(mp) => wkt_tagged(
            "MULTIPOLYGON",
            (!mp.0.is_empty()).then(|| {
                let polygons: Vec<String> = mp.0.iter().map(wkt_polygon_body).collect();
                format!("({})", polygons.join(", "))
            }),
        ),
        Geometry::GeometryCollection(gc) => wkt_tagged(
            "GEOMETRYCOLLECTION",
            (!gc.0.is_empty()).then(|| {
                let members: Vec<String> = gc.0.iter().map(to_wkt).collect();
                format!("({})", members.join(", "))
            }),
        ),
        other => unreachable!("{:?} survived canonicalization", other),
    }
}

/// A JSON number, integral when the value is integral.
pub fn json_number(v: f64) -> Value {
    if is_integral(v) {
        Value::from(v as i64)
    } else {
        Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn json_position(c: &Coord<f64>) -> Value {
    Value::Array(vec![json_number(c.x), json_number(c.y)])
}

fn json_positions(line: &LineString<f64>) -> Value {
    Value::Array(line.0.iter().map(json_position).collect())
}

fn json_rings(polygon: &Polygon<f64>) -> Value {
    if polygon.exterior().0.is_empty() {
        return Value::Array(vec![]);
    }
    Value::Array(
        std::iter::once(polygon.exterior()).chain(polygon.interiors()).map(json_positions).collect(),
    )
}

/// GeoJSON geometry object with `type` written before `coordinates`.
pub fn to_geojson_value(geometry: &Geometry<f64>) -> Value {
    let (kind, coordinates) = match to_canonical(geometry.clone()) {
        Geometry::Point(p) => ("Point", json_position(&p.0)),
        Geometry::LineString(ls) => ("LineString", json_positions(&ls)),
        Geometry::Polygon(poly) => ("Polygon", json_rings(&poly)),
        Geometry::MultiPoint(mp) => {
            ("MultiPoint", Value::Array(mp.0.iter().map(|p| json_position(&p.0)).collect()))
        }
        Geometry::MultiLineString(mls) => {
            ("MultiLineString", Value::Array(mls.0.iter().map(json_positions).collect()))
        }
        Geometry::MultiPolygon(mp) => {
            ("MultiPolygon", Value::Array(mp.0.iter().map(json_rings).collect()))
        }
        Geometry::GeometryCollection(gc) => {
            return json!({
                "type": "GeometryCollection",
                "geometries": gc.0.iter().map(to_geojson_value).collect::<Vec<_>>(),
            });
        }
        other => unreachable!("{:?} survived canonicalization", other),
    };
    json!({ "type": kind, "coordinates": coordinates })
}

/// Compact GeoJSON geometry text.
pub fn to_geojson(geometry: &Geometry<f64>) -> String {
    to_geojson_value(geometry).to_string()
}

/// GeoJSON Feature object holding the geometry and the given properties.
pub fn to_feature_value(geometry: &Geometry<f64>, properties: Map<String, Value>) -> Value {
    json!({
        "type": "Feature",
        "geometry": to_geojson_value(geometry),
        "properties": Value::Object(properties),
    })
}

/// Typed GeoJSON feature, for consumers of the `geojson` crate.
pub fn to_feature(geometry: &Geometry<f64>, properties: Map<String, Value>) -> geojson::Feature {
    geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
