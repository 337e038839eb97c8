use super::{BlockingStage, FilterStage, LimitStage};
use crate::models::{merged_records, Flow};
use crate::pipeline::Pipeline;
use geo::Geometry;
use geopipes_core::error::Result;
use geopipes_core::models::{GeometryFactory, PropertyValue};
use geopipes_geo::overlay::{intersect_all, union_all};
use std::cmp::Ordering;

/// Value a flow is ordered by; absent and null values have none
fn sort_key<'a>(flow: &'a Flow, name: &str) -> Option<&'a PropertyValue> {
    flow.property(name).filter(|v| !v.is_null())
}

/// Order by `name` with flows lacking it last, in arrival order
fn sort_flows(flows: &mut [Flow], name: &str, descending: bool) {
    flows.sort_by(|a, b| match (sort_key(a, name), sort_key(b, name)) {
        (Some(x), Some(y)) if descending => y.natural_cmp(x),
        (Some(x), Some(y)) => x.natural_cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// First flow whose key is strictly better than every earlier one
fn extremum(flows: Vec<Flow>, name: &str, wanted: Ordering) -> Option<Flow> {
    let mut best: Option<Flow> = None;
    for flow in flows {
        let Some(key) = sort_key(&flow, name) else { continue };
        let better = match best.as_ref().and_then(|b| sort_key(b, name)) {
            Some(current) => key.natural_cmp(current) == wanted,
            None => true,
        };
        if better {
            best = Some(flow);
        }
    }
    best
}

/// Single flow carrying an overlay result and every input's source records
fn overlay_flow(flows: &[Flow], geometry: Geometry<f64>, factory: &GeometryFactory) -> Flow {
    Flow::new(factory.create(geometry), merged_records(flows))
}

impl Pipeline {
    /// Stable ascending sort by the natural order of property `name`
    pub fn sort(self, name: impl Into<String>) -> Pipeline {
        self.sorted(name.into(), false)
    }

    /// Stable descending sort by property `name`
    pub fn sort_descending(self, name: impl Into<String>) -> Pipeline {
        self.sorted(name.into(), true)
    }

    fn sorted(self, name: String, descending: bool) -> Pipeline {
        self.chain(move |up| {
            BlockingStage::new("sort", up, move |mut flows: Vec<Flow>| {
                sort_flows(&mut flows, &name, descending);
                Ok(flows)
            })
        })
    }

    /// The flow with the smallest value of `name`
    pub fn get_min(self, name: impl Into<String>) -> Pipeline {
        let name = name.into();
        self.chain(move |up| {
            BlockingStage::new("getMin", up, move |flows: Vec<Flow>| {
                Ok(extremum(flows, &name, Ordering::Less).into_iter().collect())
            })
        })
    }

    /// The flow with the largest value of `name`
    pub fn get_max(self, name: impl Into<String>) -> Pipeline {
        let name = name.into();
        self.chain(move |up| {
            BlockingStage::new("getMax", up, move |flows: Vec<Flow>| {
                Ok(extremum(flows, &name, Ordering::Greater).into_iter().collect())
            })
        })
    }

    /// One flow whose geometry is the union of every input geometry
    pub fn union_all(self) -> Pipeline {
        let factory = self.geometry_factory().clone();
        self.chain(move |up| {
            BlockingStage::new("unionAll", up, move |flows: Vec<Flow>| {
                let geometries: Vec<Geometry<f64>> =
                    flows.iter().map(|f| f.geometry.clone()).collect();
                Ok(union_all(&geometries, factory.validity())?
                    .map(|union| overlay_flow(&flows, union, &factory))
                    .into_iter()
                    .collect())
            })
        })
    }

    /// One flow whose geometry is the common intersection of every input;
    /// an empty geometry when they share no point
    pub fn intersect_all(self) -> Pipeline {
        let factory = self.geometry_factory().clone();
        self.chain(move |up| {
            BlockingStage::new("intersectAll", up, move |flows: Vec<Flow>| {
                let geometries: Vec<Geometry<f64>> =
                    flows.iter().map(|f| f.geometry.clone()).collect();
                Ok(intersect_all(&geometries, factory.validity())?
                    .map(|common| overlay_flow(&flows, common, &factory))
                    .into_iter()
                    .collect())
            })
        })
    }

    /// At most `n` flows
    pub fn limit(self, n: usize) -> Pipeline {
        self.chain(move |up| LimitStage::new(up, n))
    }

    /// Drop the first `n` flows
    pub fn skip(self, n: usize) -> Pipeline {
        let mut seen = 0usize;
        self.chain(move |up| {
            FilterStage::new(up, move |_: &Flow| -> Result<bool> {
                seen += 1;
                Ok(seen > n)
            })
        })
    }
}
