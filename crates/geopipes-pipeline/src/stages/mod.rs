//! The four stage shapes every pipeline operation is built from, and the
//! operations themselves grouped by kind.
//!
//! - [`FilterStage`]: streaming, passes or drops each flow
//! - [`MapStage`]: streaming, one flow in and one flow out
//! - [`FanOutStage`]: streaming, one flow in and any number out
//! - [`BlockingStage`]: drains its whole input before emitting anything

mod aggregate;
mod filter;
mod metric;
mod serialize;
mod transform;

use crate::models::Flow;
use crate::pipeline::{Pipeline, Stage};
use geopipes_core::error::Result;
use std::collections::VecDeque;

pub(crate) struct FilterStage<F> {
    upstream: Pipeline,
    keep: F,
}

impl<F> FilterStage<F>
where
    F: FnMut(&Flow) -> Result<bool>,
{
    pub(crate) fn new(upstream: Pipeline, keep: F) -> Self {
        Self { upstream, keep }
    }
}

impl<F> Stage for FilterStage<F>
where
    F: FnMut(&Flow) -> Result<bool>,
{
    fn advance(&mut self) -> Result<Option<Flow>> {
        while let Some(flow) = self.upstream.try_next()? {
            if (self.keep)(&flow)? {
                return Ok(Some(flow));
            }
        }
        Ok(None)
    }
}

pub(crate) struct MapStage<F> {
    upstream: Pipeline,
    map: F,
}

impl<F> MapStage<F>
where
    F: FnMut(Flow) -> Result<Flow>,
{
    pub(crate) fn new(upstream: Pipeline, map: F) -> Self {
        Self { upstream, map }
    }
}

impl<F> Stage for MapStage<F>
where
    F: FnMut(Flow) -> Result<Flow>,
{
    fn advance(&mut self) -> Result<Option<Flow>> {
        match self.upstream.try_next()? {
            Some(flow) => (self.map)(flow).map(Some),
            None => Ok(None),
        }
    }
}

pub(crate) struct FanOutStage<F> {
    upstream: Pipeline,
    expand: F,
    pending: VecDeque<Flow>,
}

impl<F> FanOutStage<F>
where
    F: FnMut(Flow) -> Result<Vec<Flow>>,
{
    pub(crate) fn new(upstream: Pipeline, expand: F) -> Self {
        Self { upstream, expand, pending: VecDeque::new() }
    }
}

impl<F> Stage for FanOutStage<F>
where
    F: FnMut(Flow) -> Result<Vec<Flow>>,
{
    fn advance(&mut self) -> Result<Option<Flow>> {
        loop {
            if let Some(flow) = self.pending.pop_front() {
                return Ok(Some(flow));
            }
            match self.upstream.try_next()? {
                Some(flow) => self.pending.extend((self.expand)(flow)?),
                None => return Ok(None),
            }
        }
    }
}

/// Buffers every upstream flow, then emits the reducer's output in order.
pub(crate) struct BlockingStage<F> {
    name: &'static str,
    upstream: Pipeline,
    reduce: Option<F>,
    output: VecDeque<Flow>,
}

impl<F> BlockingStage<F>
where
    F: FnOnce(Vec<Flow>) -> Result<Vec<Flow>>,
{
    pub(crate) fn new(name: &'static str, upstream: Pipeline, reduce: F) -> Self {
        Self { name, upstream, reduce: Some(reduce), output: VecDeque::new() }
    }
}

impl<F> Stage for BlockingStage<F>
where
    F: FnOnce(Vec<Flow>) -> Result<Vec<Flow>>,
{
    fn advance(&mut self) -> Result<Option<Flow>> {
        if let Some(reduce) = self.reduce.take() {
            let mut input = Vec::new();
            while let Some(flow) = self.upstream.try_next()? {
                input.push(flow);
            }
            tracing::debug!(stage = self.name, flows = input.len(), "Drained input");
            self.output = reduce(input)?.into();
        }
        Ok(self.output.pop_front())
    }
}

/// Emits at most `remaining` flows, then stops pulling.
pub(crate) struct LimitStage {
    upstream: Pipeline,
    remaining: usize,
}

impl LimitStage {
    pub(crate) fn new(upstream: Pipeline, limit: usize) -> Self {
        Self { upstream, remaining: limit }
    }
}

impl Stage for LimitStage {
    fn advance(&mut self) -> Result<Option<Flow>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        self.upstream.try_next()
    }
}
