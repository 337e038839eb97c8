use super::{BlockingStage, FanOutStage, MapStage};
use crate::models::{merged_records, Flow};
use crate::pipeline::Pipeline;
use geo::{Geometry, Point};
use geopipes_core::error::{GeopipesError, Result};
use geopipes_geo::cluster::density_islands;
use geopipes_geo::ops;
use geopipes_geo::overlay::union_all;
use geopipes_geo::transform::{affine_transform, Affine};
use geopipes_geo::validation::ensure_valid;
use std::sync::Arc;

impl Pipeline {
    /// Replace each flow's geometry with `op(geometry)`, snapped by the
    /// pipeline's geometry factory
    fn map_geometry<F>(self, op: F) -> Pipeline
    where
        F: FnMut(&Geometry<f64>) -> Result<Geometry<f64>> + 'static,
    {
        let factory = self.geometry_factory().clone();
        let mut op = op;
        self.chain(move |up| {
            MapStage::new(up, move |flow: Flow| {
                let geometry = op(&flow.geometry)?;
                Ok(flow.with_geometry(factory.create(geometry)))
            })
        })
    }

    /// Apply a 2D affine map to every coordinate
    pub fn affine_transform(self, affine: Affine) -> Pipeline {
        self.map_geometry(move |geometry| affine_transform(geometry, &affine))
    }

    pub fn to_boundary(self) -> Pipeline {
        self.map_geometry(ops::boundary)
    }

    /// Dilate by a positive `distance`, erode by a negative one
    pub fn to_buffer(self, distance: f64) -> Pipeline {
        let validity = self.geometry_factory().validity();
        self.map_geometry(move |geometry| ops::buffer(geometry, distance, validity))
    }

    pub fn to_centroid(self) -> Pipeline {
        self.map_geometry(ops::centroid)
    }

    pub fn to_convex_hull(self) -> Pipeline {
        let validity = self.geometry_factory().validity();
        self.map_geometry(move |geometry| {
            ensure_valid(geometry, validity, "toConvexHull")?;
            ops::convex_hull(geometry)
        })
    }

    /// Insert vertices so no segment is longer than `tolerance`
    pub fn densify(self, tolerance: f64) -> Result<Pipeline> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(GeopipesError::invalid_argument(
                "densify",
                format!("tolerance must be finite and positive, got {}", tolerance),
            ));
        }
        let validity = self.geometry_factory().validity();
        Ok(self.map_geometry(move |geometry| {
            ensure_valid(geometry, validity, "densify")?;
            ops::densify(geometry, tolerance)
        }))
    }

    /// Douglas-Peucker simplification
    pub fn simplify(self, tolerance: f64) -> Result<Pipeline> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(GeopipesError::invalid_argument(
                "simplify",
                format!("tolerance must be finite and non-negative, got {}", tolerance),
            ));
        }
        Ok(self.map_geometry(move |geometry| ops::simplify(geometry, tolerance)))
    }

    pub fn to_envelope(self) -> Pipeline {
        self.map_geometry(ops::envelope)
    }

    pub fn to_interior_point(self) -> Pipeline {
        self.map_geometry(ops::interior_point)
    }

    pub fn start_point(self) -> Pipeline {
        self.map_geometry(ops::start_point)
    }

    pub fn end_point(self) -> Pipeline {
        self.map_geometry(ops::end_point)
    }

    /// Copy the properties of each flow's source records into the flow
    pub fn copy_record_properties(self) -> Pipeline {
        self.chain(|up| {
            MapStage::new(up, |mut flow: Flow| {
                flow.copy_record_properties();
                Ok(flow)
            })
        })
    }

    /// One flow per stored coordinate, including ring-closing repeats
    pub fn extract_points(self) -> Pipeline {
        let factory = self.geometry_factory().clone();
        self.chain(move |up| {
            FanOutStage::new(up, move |flow: Flow| {
                Ok(ops::extract_points(&flow.geometry)
                    .into_iter()
                    .map(|point| Flow::new(factory.create(point), flow.records().to_vec()))
                    .collect())
            })
        })
    }

    /// One flow per node of each OSM way source record
    pub fn extract_osm_points(self) -> Pipeline {
        let factory = self.geometry_factory().clone();
        self.chain(move |up| {
            FanOutStage::new(up, move |flow: Flow| {
                let mut points = Vec::new();
                for record in flow.records() {
                    if let Some(way) = &record.osm {
                        for node in &way.nodes {
                            let point = factory.create(Geometry::Point(Point(node.coord())));
                            points.push(Flow::new(point, vec![Arc::clone(record)]));
                        }
                    }
                }
                Ok(points)
            })
        })
    }

    /// Group all flows into density islands: clusters connected through
    /// pairwise distances of at most `tolerance`. Emits one flow per island,
    /// in order of each island's first member, with the union of the
    /// members' geometries.
    pub fn group_by_density_islands(self, tolerance: f64) -> Result<Pipeline> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(GeopipesError::invalid_argument(
                "groupByDensityIslands",
                format!("tolerance must be finite and non-negative, got {}", tolerance),
            ));
        }
        let factory = self.geometry_factory().clone();
        Ok(self.chain(move |up| {
            BlockingStage::new("groupByDensityIslands", up, move |flows: Vec<Flow>| {
                let geometries: Vec<Geometry<f64>> =
                    flows.iter().map(|flow| flow.geometry.clone()).collect();
                let islands = density_islands(&geometries, tolerance)?;

                let mut grouped = Vec::with_capacity(islands.len());
                for members in islands {
                    let member_geometries: Vec<Geometry<f64>> =
                        members.iter().map(|&i| geometries[i].clone()).collect();
                    if let Some(union) = union_all(&member_geometries, factory.validity())? {
                        let records = merged_records(members.iter().map(|&i| &flows[i]));
                        grouped.push(Flow::new(factory.create(union), records));
                    }
                }
                Ok(grouped)
            })
        }))
    }
}
