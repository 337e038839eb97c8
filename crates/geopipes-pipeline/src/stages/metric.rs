use super::MapStage;
use crate::models::{reserved, Flow};
use crate::pipeline::Pipeline;
use geo::Geometry;
use geopipes_core::error::Result;
use geopipes_core::models::PropertyValue;
use geopipes_geo::measure;
use geopipes_geo::GeometryExt;

impl Pipeline {
    /// Set property `name` to `metric(geometry)`, overwriting any previous value
    fn attach_metric<F>(self, name: &'static str, metric: F) -> Pipeline
    where
        F: Fn(&Geometry<f64>) -> Result<PropertyValue> + 'static,
    {
        self.chain(move |up| {
            MapStage::new(up, move |mut flow: Flow| {
                let value = metric(&flow.geometry)?;
                flow.set_property(name, value);
                Ok(flow)
            })
        })
    }

    /// Planar area as `Area`; zero for points and lines
    pub fn calculate_area(self) -> Pipeline {
        self.attach_metric(reserved::AREA, |geometry| Ok(measure::area(geometry).into()))
    }

    /// Line or ring length as `Length`
    pub fn calculate_length(self) -> Pipeline {
        self.attach_metric(reserved::LENGTH, |geometry| Ok(measure::length(geometry).into()))
    }

    /// Minimum Euclidean distance to `reference` as `Distance`
    pub fn calculate_distance(self, reference: Geometry<f64>) -> Pipeline {
        self.attach_metric(reserved::DISTANCE, move |geometry| {
            Ok(measure::distance(geometry, &reference)?.into())
        })
    }

    /// Number of stored coordinates as `NumPoints`
    pub fn count_points(self) -> Pipeline {
        self.attach_metric(reserved::NUM_POINTS, |geometry| {
            Ok(PropertyValue::Integer(geometry.num_points() as i64))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::models::Flow;
    use crate::pipeline::Pipeline;
    use geopipes_core::models::{GeometryFactory, PropertyValue};
    use geopipes_geo::parse_wkt;

    fn boxes() -> Pipeline {
        let flows = [
            "POLYGON ((12 56, 12 57, 13 57, 13 56, 12 56))",
            "POLYGON ((2 3, 2 5, 6 5, 6 3, 2 3))",
        ]
        .iter()
        .map(|w| Flow::new(parse_wkt(w).unwrap(), vec![]))
        .collect();
        Pipeline::from_flows(flows, GeometryFactory::default())
    }

    fn values(pipeline: Pipeline, name: &str) -> Vec<f64> {
        pipeline
            .collect()
            .unwrap()
            .iter()
            .map(|f| f.property(name).and_then(PropertyValue::as_f64).unwrap())
            .collect()
    }

    #[test]
    fn test_area_and_length() {
        assert_eq!(values(boxes().calculate_area(), "Area"), vec![1.0, 8.0]);
        assert_eq!(values(boxes().calculate_length(), "Length"), vec![4.0, 12.0]);
    }

    #[test]
    fn test_metric_overwrites_previous_value() {
        let flows = vec![Flow::new(parse_wkt("POINT (3 4)").unwrap(), vec![]).with_property("Area", "old")];
        let mut pipeline = Pipeline::from_flows(flows, GeometryFactory::default()).calculate_area();
        assert_eq!(pipeline.next().unwrap().property("Area"), Some(&PropertyValue::Float(0.0)));
    }

    #[test]
    fn test_distance_and_point_count() {
        let origin = parse_wkt("POINT (0 0)").unwrap();
        let distances = values(boxes().calculate_distance(origin), "Distance");
        assert_eq!(distances.iter().map(|d| d.round()).collect::<Vec<_>>(), vec![57.0, 4.0]);

        let mut counted = boxes().count_points();
        assert_eq!(counted.next().unwrap().property("NumPoints"), Some(&PropertyValue::Integer(5)));
    }

    #[test]
    fn test_distance_to_empty_geometry_fails() {
        let empty = parse_wkt("MULTIPOINT EMPTY").unwrap();
        let mut pipeline = boxes().calculate_distance(empty);
        assert!(pipeline.next().is_err());
    }
}
