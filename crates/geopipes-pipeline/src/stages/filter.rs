use super::FilterStage;
use crate::cql::CqlFilter;
use crate::models::Flow;
use crate::pipeline::Pipeline;
use geo::{Geometry, Rect};
use geopipes_core::error::{GeopipesError, Result};
use geopipes_core::models::PropertyValue;
use geopipes_geo::equality::{equal_exact, equal_norm, equal_topo};
use geopipes_geo::models::envelope_from_bounds;
use geopipes_geo::spatial::{envelope_intersects, evaluate_spatial_predicate, SpatialPredicate};

impl Pipeline {
    /// Pass flows whose property `name` equals `value`, type-sensitively
    pub fn attribute_filter(self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Pipeline {
        let (name, value) = (name.into(), value.into());
        self.chain(move |up| {
            FilterStage::new(up, move |flow: &Flow| Ok(flow.property(&name) == Some(&value)))
        })
    }

    /// Pass flows whose property `name` is absent or null
    pub fn property_null_filter(self, name: impl Into<String>) -> Pipeline {
        let name = name.into();
        self.chain(move |up| {
            FilterStage::new(up, move |flow: &Flow| {
                Ok(flow.property(&name).map_or(true, PropertyValue::is_null))
            })
        })
    }

    /// Pass flows whose property `name` is present and not null
    pub fn property_not_null_filter(self, name: impl Into<String>) -> Pipeline {
        let name = name.into();
        self.chain(move |up| {
            FilterStage::new(up, move |flow: &Flow| {
                Ok(flow.property(&name).is_some_and(|v| !v.is_null()))
            })
        })
    }

    /// Pass flows whose envelope intersects `window`
    pub fn window_intersection_filter(self, window: Rect<f64>) -> Pipeline {
        self.chain(move |up| {
            FilterStage::new(up, move |flow: &Flow| Ok(envelope_intersects(&flow.geometry, &window)))
        })
    }

    /// [`Pipeline::window_intersection_filter`] with scalar bounds
    pub fn window_intersection_filter_bounds(
        self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> Pipeline {
        self.window_intersection_filter(envelope_from_bounds(min_x, min_y, max_x, max_y))
    }

    /// Pass flows matching a CQL expression. The expression is compiled here,
    /// so syntax errors are reported before any flow is read.
    pub fn cql_filter(self, expression: &str) -> Result<Pipeline> {
        let filter = CqlFilter::compile(expression)?;
        Ok(self.chain(move |up| FilterStage::new(up, move |flow: &Flow| Ok(filter.matches(flow)))))
    }

    /// Same structure and vertex order, coordinates within `tolerance`
    pub fn equal_exact_filter(self, geometry: Geometry<f64>, tolerance: f64) -> Result<Pipeline> {
        check_tolerance("equalExactFilter", tolerance)?;
        Ok(self.chain(move |up| {
            FilterStage::new(up, move |flow: &Flow| {
                Ok(equal_exact(&flow.geometry, &geometry, tolerance))
            })
        }))
    }

    /// Equal after normalization, coordinates within `tolerance`
    pub fn equal_norm_filter(self, geometry: Geometry<f64>, tolerance: f64) -> Result<Pipeline> {
        check_tolerance("equalNormFilter", tolerance)?;
        Ok(self.chain(move |up| {
            FilterStage::new(up, move |flow: &Flow| Ok(equal_norm(&flow.geometry, &geometry, tolerance)))
        }))
    }

    /// Equal as point sets
    pub fn equal_topo_filter(self, geometry: Geometry<f64>) -> Pipeline {
        self.chain(move |up| {
            FilterStage::new(up, move |flow: &Flow| Ok(equal_topo(&flow.geometry, &geometry)))
        })
    }

    /// Pass flows with a source OSM way whose tag `key` equals `value`
    pub fn osm_attribute_filter(self, key: impl Into<String>, value: impl Into<String>) -> Pipeline {
        let (key, value) = (key.into(), value.into());
        self.chain(move |up| {
            FilterStage::new(up, move |flow: &Flow| {
                Ok(flow
                    .records()
                    .iter()
                    .filter_map(|record| record.osm.as_ref())
                    .any(|way| way.tag(&key) == Some(value.as_str())))
            })
        })
    }

    /// Pass flows sharing at least one point with `geometry`
    pub fn intersects_filter(self, geometry: Geometry<f64>) -> Pipeline {
        self.spatial_filter(SpatialPredicate::Intersects, geometry)
    }

    /// Pass flows lying inside `geometry`
    pub fn within_filter(self, geometry: Geometry<f64>) -> Pipeline {
        self.spatial_filter(SpatialPredicate::Within, geometry)
    }

    /// Pass flows containing `geometry`
    pub fn contains_filter(self, geometry: Geometry<f64>) -> Pipeline {
        self.spatial_filter(SpatialPredicate::Contains, geometry)
    }

    /// Pass flows within `max_distance` of `reference`
    pub fn distance_filter(self, reference: Geometry<f64>, max_distance: f64) -> Result<Pipeline> {
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(GeopipesError::invalid_argument(
                "distanceFilter",
                format!("distance must be finite and non-negative, got {}", max_distance),
            ));
        }
        Ok(self.spatial_filter(SpatialPredicate::DWithin { distance: max_distance }, reference))
    }

    fn spatial_filter(self, predicate: SpatialPredicate, geometry: Geometry<f64>) -> Pipeline {
        self.chain(move |up| {
            FilterStage::new(up, move |flow: &Flow| {
                Ok(evaluate_spatial_predicate(&flow.geometry, predicate, &geometry))
            })
        })
    }
}

fn check_tolerance(operation: &str, tolerance: f64) -> Result<()> {
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(())
    } else {
        Err(GeopipesError::invalid_argument(
            operation,
            format!("tolerance must be finite and non-negative, got {}", tolerance),
        ))
    }
}
