use super::MapStage;
use crate::models::{reserved, Flow};
use crate::pipeline::Pipeline;
use geopipes_geo::serialize::{to_feature_value, to_geojson, to_wkt};

impl Pipeline {
    /// Set `WellKnownText` to the canonical WKT of the geometry
    pub fn create_well_known_text(self) -> Pipeline {
        self.chain(|up| {
            MapStage::new(up, |mut flow: Flow| {
                let wkt = to_wkt(&flow.geometry);
                flow.set_property(reserved::WELL_KNOWN_TEXT, wkt);
                Ok(flow)
            })
        })
    }

    /// Set `GeoJSON` to the compact GeoJSON geometry
    pub fn create_json(self) -> Pipeline {
        self.chain(|up| {
            MapStage::new(up, |mut flow: Flow| {
                let json = to_geojson(&flow.geometry);
                flow.set_property(reserved::GEOJSON, json);
                Ok(flow)
            })
        })
    }

    /// Set `GeoJSON` to a compact GeoJSON Feature of the geometry and the
    /// flow's other properties
    pub fn create_geojson_feature(self) -> Pipeline {
        self.chain(|up| {
            MapStage::new(up, |mut flow: Flow| {
                let feature = to_feature_value(&flow.geometry, flow.json_properties());
                flow.set_property(reserved::GEOJSON, feature.to_string());
                Ok(flow)
            })
        })
    }
}
