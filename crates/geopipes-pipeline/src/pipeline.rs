use crate::models::Flow;
use geopipes_core::error::{GeopipesError, Result};
use geopipes_core::models::GeometryFactory;
use geopipes_geo::serialize::to_feature;
use geopipes_store::RecordCursor;
use std::sync::Arc;

/// The one capability every pipeline link provides.
pub trait Stage {
    /// Produce the next flow, or `None` at end of sequence
    fn advance(&mut self) -> Result<Option<Flow>>;
}

/// Lazy, single-pass sequence of flows.
///
/// Every chainable operation consumes the pipeline and returns a new one
/// whose stage pulls from it. Work happens only inside `advance`-driven calls
/// (`has_next`, `next`, `peek`, iteration). Once end of sequence has been
/// observed the pipeline stays exhausted.
pub struct Pipeline {
    stage: Box<dyn Stage>,
    lookahead: Option<Flow>,
    exhausted: bool,
    factory: GeometryFactory,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("lookahead", &self.lookahead)
            .field("exhausted", &self.exhausted)
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline over an arbitrary stage
    pub fn from_stage(stage: impl Stage + 'static, factory: GeometryFactory) -> Self {
        Self { stage: Box::new(stage), lookahead: None, exhausted: false, factory }
    }

    /// Pipeline over a search cursor of stored records
    pub fn from_cursor(cursor: RecordCursor, factory: GeometryFactory) -> Self {
        Self::from_stage(RecordSource { cursor }, factory)
    }

    /// Pipeline over already built flows
    pub fn from_flows(flows: Vec<Flow>, factory: GeometryFactory) -> Self {
        Self::from_stage(FlowSource { flows: flows.into_iter() }, factory)
    }

    /// The factory geometries produced by this pipeline pass through
    pub fn geometry_factory(&self) -> &GeometryFactory {
        &self.factory
    }

    /// Chain a stage built around this pipeline
    pub(crate) fn chain<S, F>(self, build: F) -> Pipeline
    where
        S: Stage + 'static,
        F: FnOnce(Pipeline) -> S,
    {
        let factory = self.factory.clone();
        Pipeline::from_stage(build(self), factory)
    }

    fn pull(&mut self) -> Result<Option<Flow>> {
        if self.exhausted {
            return Ok(None);
        }
        match self.stage.advance() {
            Ok(Some(flow)) => Ok(Some(flow)),
            Ok(None) => {
                self.exhausted = true;
                Ok(None)
            }
            Err(e) => {
                self.exhausted = true;
                Err(e)
            }
        }
    }

    /// True when another flow is available. Advances the upstream by at most
    /// one element, which is held until the next read.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.lookahead.is_none() {
            self.lookahead = self.pull()?;
        }
        Ok(self.lookahead.is_some())
    }

    /// The next flow without consuming it
    pub fn peek(&mut self) -> Result<Option<&Flow>> {
        self.has_next()?;
        Ok(self.lookahead.as_ref())
    }

    /// The next flow, or `Ok(None)` at end of sequence
    pub fn try_next(&mut self) -> Result<Option<Flow>> {
        match self.lookahead.take() {
            Some(flow) => Ok(Some(flow)),
            None => self.pull(),
        }
    }

    /// The next flow; [`GeopipesError::Exhausted`] past the end
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Flow> {
        self.try_next()?.ok_or(GeopipesError::Exhausted)
    }

    /// Drain the pipeline, counting flows
    pub fn count(mut self) -> Result<usize> {
        let mut count = 0;
        while self.try_next()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Drain the pipeline into a vector
    pub fn collect(mut self) -> Result<Vec<Flow>> {
        let mut flows = Vec::new();
        while let Some(flow) = self.try_next()? {
            flows.push(flow);
        }
        Ok(flows)
    }

    /// Drain the pipeline into a collection that can be iterated again
    pub fn materialize(self) -> Result<FlowCollection> {
        let factory = self.factory.clone();
        Ok(FlowCollection { flows: Arc::new(self.collect()?), factory })
    }

    /// Drain the pipeline into a GeoJSON feature collection
    pub fn to_feature_collection(self) -> Result<geojson::FeatureCollection> {
        let features = self
            .collect()?
            .iter()
            .map(|flow| to_feature(&flow.geometry, flow.json_properties()))
            .collect();
        Ok(geojson::FeatureCollection { bbox: None, features, foreign_members: None })
    }
}

impl Stage for Pipeline {
    fn advance(&mut self) -> Result<Option<Flow>> {
        self.try_next()
    }
}

impl Iterator for Pipeline {
    type Item = Result<Flow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().transpose()
    }
}

/// Materialized flows; each call to [`FlowCollection::pipeline`] starts a
/// fresh pipeline over them.
#[derive(Debug, Clone)]
pub struct FlowCollection {
    flows: Arc<Vec<Flow>>,
    factory: GeometryFactory,
}

impl FlowCollection {
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::from_flows(self.flows.as_ref().clone(), self.factory.clone())
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// Wraps each stored record of a search as a fresh flow
struct RecordSource {
    cursor: RecordCursor,
}

impl Stage for RecordSource {
    fn advance(&mut self) -> Result<Option<Flow>> {
        Ok(self.cursor.next().transpose()?.map(Flow::from_record))
    }
}

struct FlowSource {
    flows: std::vec::IntoIter<Flow>,
}

impl Stage for FlowSource {
    fn advance(&mut self) -> Result<Option<Flow>> {
        Ok(self.flows.next())
    }
}
