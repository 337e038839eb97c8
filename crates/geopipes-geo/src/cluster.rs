//! Density islands: transitive proximity clustering.
//!
//! Two geometries are adjacent when their Euclidean distance is at most the
//! tolerance. Islands are the connected components of that relation, merged
//! incrementally with a union-find. Candidate pairs come from an R-tree over
//! envelopes grown by the tolerance, so only nearby pairs are measured.

use crate::models::GeometryExt;
use geo::{Distance, Euclidean, Geometry};
use geopipes_core::error::{GeopipesError, Result};
use rstar::{RTree, RTreeObject, AABB};
use std::collections::BTreeMap;

/// Disjoint-set forest with path halving and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        Self { parent: (0..size).collect(), rank: vec![0; size] }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; false when they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Member envelope in the candidate index
#[derive(Debug, Clone, PartialEq)]
struct IndexedMember {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedMember {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Group geometries into density islands.
///
/// Returns the member indices of each island. Members are ascending and
/// islands are ordered by their first member, so the grouping is stable for
/// a given input order. Empty geometries form islands of their own.
pub fn density_islands(geometries: &[Geometry<f64>], tolerance: f64) -> Result<Vec<Vec<usize>>> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(GeopipesError::invalid_argument(
            "groupByDensityIslands",
            format!("tolerance must be finite and non-negative, got {}", tolerance),
        ));
    }

    let members: Vec<IndexedMember> = geometries
        .iter()
        .enumerate()
        .filter_map(|(index, geometry)| {
            geometry.envelope().map(|rect| IndexedMember {
                index,
                envelope: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            })
        })
        .collect();
    let tree = RTree::bulk_load(members.clone());

    let mut sets = UnionFind::new(geometries.len());
    for member in &members {
        let lower = member.envelope.lower();
        let upper = member.envelope.upper();
        let search = AABB::from_corners(
            [lower[0] - tolerance, lower[1] - tolerance],
            [upper[0] + tolerance, upper[1] + tolerance],
        );
        for candidate in tree.locate_in_envelope_intersecting(&search) {
            if candidate.index <= member.index {
                continue;
            }
            if sets.find(candidate.index) == sets.find(member.index) {
                continue;
            }
            let gap = Euclidean.distance(&geometries[member.index], &geometries[candidate.index]);
            if gap <= tolerance {
                sets.union(member.index, candidate.index);
            }
        }
    }

    let mut islands: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut first_member: BTreeMap<usize, usize> = BTreeMap::new();
    for index in 0..geometries.len() {
        let root = sets.find(index);
        let first = *first_member.entry(root).or_insert(index);
        islands.entry(first).or_default().push(index);
    }

    tracing::debug!(
        members = geometries.len(),
        islands = islands.len(),
        tolerance,
        "Grouped geometries into density islands"
    );

    Ok(islands.into_values().collect())
}
