use geo::{Coord, Geometry, LineString, Point, Polygon};
use geopipes_core::models::{GeometryFactory, PropertyValue};
use geopipes_geo::equality::{equal_exact, equal_norm, equal_topo};
use geopipes_geo::transform::Affine;
use geopipes_geo::GeometryExt;
use geopipes_pipeline::{Flow, Pipeline};
use proptest::prelude::*;

fn coordinate() -> impl Strategy<Value = f64> {
    (-1000i32..1000).prop_map(|v| v as f64 / 4.0)
}

fn rectangle() -> impl Strategy<Value = Geometry<f64>> {
    (coordinate(), coordinate(), 1i32..40, 1i32..40).prop_map(|(x, y, w, h)| {
        let (w, h) = (w as f64, h as f64);
        Geometry::Polygon(Polygon::new(
            LineString::new(vec![
                Coord { x, y },
                Coord { x, y: y + h },
                Coord { x: x + w, y: y + h },
                Coord { x: x + w, y },
                Coord { x, y },
            ]),
            vec![],
        ))
    })
}

/// A rectangle and a copy with every corner moved by less than a quarter unit.
fn rectangle_and_perturbed() -> impl Strategy<Value = (Geometry<f64>, Geometry<f64>)> {
    let offset = || -0.25..0.25f64;
    (rectangle(), prop::collection::vec((offset(), offset()), 4)).prop_map(|(query, offsets)| {
        let corners: Vec<Coord<f64>> = match &query {
            Geometry::Polygon(p) => p.exterior().0[..4]
                .iter()
                .zip(&offsets)
                .map(|(c, (dx, dy))| Coord { x: c.x + dx, y: c.y + dy })
                .collect(),
            _ => unreachable!(),
        };
        let mut ring = corners.clone();
        ring.push(corners[0]);
        (query, Geometry::Polygon(Polygon::new(LineString::new(ring), vec![])))
    })
}

fn point() -> impl Strategy<Value = Geometry<f64>> {
    (coordinate(), coordinate()).prop_map(|(x, y)| Geometry::Point(Point::new(x, y)))
}

fn pipeline_of(geometries: Vec<Geometry<f64>>) -> Pipeline {
    let flows = geometries.into_iter().map(|g| Flow::new(g, vec![])).collect();
    Pipeline::from_flows(flows, GeometryFactory::default())
}

proptest! {
    #[test]
    fn count_equals_iteration(geometries in prop::collection::vec(point(), 0..30), skip in 0usize..10) {
        let counted = pipeline_of(geometries.clone()).skip(skip).count().unwrap();
        let iterated = pipeline_of(geometries).skip(skip).filter(|r| r.is_ok()).count();
        prop_assert_eq!(counted, iterated);
    }

    #[test]
    fn translation_round_trip_restores_coordinates(
        geometries in prop::collection::vec(rectangle(), 1..10),
        dx in coordinate(),
        dy in coordinate(),
    ) {
        let restored = pipeline_of(geometries.clone())
            .affine_transform(Affine::translation(dx, dy))
            .affine_transform(Affine::translation(-dx, -dy))
            .collect()
            .unwrap();
        for (original, flow) in geometries.iter().zip(&restored) {
            prop_assert_eq!(original.coordinates(), flow.geometry.coordinates());
        }
    }

    #[test]
    fn sort_is_non_decreasing_and_repeatable(keys in prop::collection::vec(-50i64..50, 0..40)) {
        let build = || {
            let flows = keys
                .iter()
                .enumerate()
                .map(|(i, k)| {
                    Flow::new(Geometry::Point(Point::new(i as f64, 0.0)), vec![])
                        .with_property("key", *k)
                        .with_property("arrival", i as i64)
                })
                .collect();
            Pipeline::from_flows(flows, GeometryFactory::default()).sort("key")
        };
        let first = build().collect().unwrap();
        let second = build().collect().unwrap();
        prop_assert_eq!(&first, &second);

        for pair in first.windows(2) {
            let (a, b) = (pair[0].property("key").unwrap(), pair[1].property("key").unwrap());
            prop_assert!(a.natural_cmp(b) != std::cmp::Ordering::Greater);
            if a == b {
                let arrival = |f: &Flow| match f.property("arrival") {
                    Some(PropertyValue::Integer(i)) => *i,
                    _ => -1,
                };
                prop_assert!(arrival(&pair[0]) < arrival(&pair[1]));
            }
        }
    }

    #[test]
    fn overlays_emit_exactly_one_flow(geometries in prop::collection::vec(rectangle(), 1..6)) {
        let mut united = pipeline_of(geometries.clone()).union_all();
        prop_assert!(united.next().is_ok());
        prop_assert!(united.next().unwrap_err().is_exhausted());

        let mut intersected = pipeline_of(geometries).intersect_all();
        prop_assert!(intersected.next().is_ok());
        prop_assert!(intersected.next().unwrap_err().is_exhausted());
    }

    #[test]
    fn equality_comparators_nest(query in rectangle(), candidate in rectangle(), tolerance in 0.0..2.0f64) {
        if equal_exact(&candidate, &query, tolerance) {
            prop_assert!(equal_norm(&candidate, &query, tolerance));
        }
        if equal_norm(&candidate, &query, 0.0) {
            prop_assert!(equal_topo(&candidate, &query));
        }
    }

    #[test]
    fn exact_matches_are_norm_matches_under_perturbation(
        (query, candidate) in rectangle_and_perturbed(),
        tolerance in 0.0..0.5f64,
    ) {
        if equal_exact(&candidate, &query, tolerance) {
            prop_assert!(equal_norm(&candidate, &query, tolerance));
        }
        prop_assert!(equal_exact(&candidate, &query, 0.36));
        prop_assert!(equal_norm(&candidate, &query, 0.36));
        if equal_norm(&candidate, &query, 0.0) {
            prop_assert!(equal_topo(&candidate, &query));
        }
    }
}
