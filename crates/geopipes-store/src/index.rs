use crate::ports::{SearchPredicate, SpatialIndex};
use geo::{Geometry, Rect};
use geopipes_core::error::Result;
use geopipes_core::models::RecordId;
use geopipes_geo::equality::EqualityMode;
use geopipes_geo::GeometryExt;
use rstar::{RTree, RTreeObject, AABB};
use std::collections::BTreeSet;

/// Indexed record envelope
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    pub id: RecordId,

    /// Bounding box for spatial indexing
    envelope: AABB<[f64; 2]>,
}

impl IndexedRecord {
    fn new(id: RecordId, envelope: Rect<f64>) -> Self {
        Self { id, envelope: to_aabb(&envelope, 0.0) }
    }
}

impl RTreeObject for IndexedRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn to_aabb(rect: &Rect<f64>, grow: f64) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [rect.min().x - grow, rect.min().y - grow],
        [rect.max().x + grow, rect.max().y + grow],
    )
}

/// R-tree over record envelopes.
///
/// Empty geometries have no envelope; they are kept aside and returned only
/// by searches that cannot be answered from envelopes.
#[derive(Debug, Default)]
pub struct RTreeIndex {
    tree: RTree<IndexedRecord>,
    unbounded: BTreeSet<RecordId>,
}

impl RTreeIndex {
    /// Create a new empty spatial index
    pub fn new() -> Self {
        Self::default()
    }

    fn all_ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.tree.iter().map(|r| r.id).collect();
        ids.extend(self.unbounded.iter().copied());
        ids.sort();
        ids
    }

    fn ids_in(&self, window: &AABB<[f64; 2]>) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> =
            self.tree.locate_in_envelope_intersecting(window).map(|r| r.id).collect();
        ids.sort();
        ids
    }
}

impl SpatialIndex for RTreeIndex {
    fn insert(&mut self, id: RecordId, geometry: &Geometry<f64>) {
        match geometry.envelope() {
            Some(envelope) => self.tree.insert(IndexedRecord::new(id, envelope)),
            None => {
                self.unbounded.insert(id);
            }
        }
    }

    fn remove(&mut self, id: RecordId) -> bool {
        if self.unbounded.remove(&id) {
            return true;
        }
        let to_remove = self.tree.iter().find(|r| r.id == id).cloned();
        match to_remove {
            Some(indexed) => self.tree.remove(&indexed).is_some(),
            None => false,
        }
    }

    fn search(&self, predicate: &SearchPredicate) -> Result<Vec<RecordId>> {
        let ids = match predicate {
            SearchPredicate::All | SearchPredicate::Attribute { .. } => self.all_ids(),
            SearchPredicate::Window(window) => self.ids_in(&to_aabb(window, 0.0)),
            SearchPredicate::Equal { geometry, mode } => match geometry.envelope() {
                Some(envelope) => {
                    let grow = match mode {
                        EqualityMode::Exact { tolerance } | EqualityMode::Norm { tolerance } => {
                            *tolerance
                        }
                        EqualityMode::Topo => 0.0,
                    };
                    self.ids_in(&to_aabb(&envelope, grow))
                }
                None => self.unbounded.iter().copied().collect(),
            },
        };
        tracing::debug!(predicate = predicate.kind(), candidates = ids.len(), "Index search");
        Ok(ids)
    }

    fn len(&self) -> usize {
        self.tree.size() + self.unbounded.len()
    }
}
