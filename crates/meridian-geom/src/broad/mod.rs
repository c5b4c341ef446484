// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Spatial index interfaces and implementations.
//!
//! Determinism contract (applies to all implementations used here):
//! - Each key has at most one extent; `upsert` replaces it.
//! - `intersects` returns keys strictly sorted ascending.
//! - Overlap is inclusive on edges (touching extents are considered overlapping).
//!
//! `LinearIndex` is an `O(n)` scan kept as the reference implementation for
//! tests and tiny graphs; `RTreeIndex` is what editing sessions use.

#[doc = "R-tree backed spatial index."]
pub mod rtree;

use crate::types::extent::Extent;
use std::collections::BTreeMap;

pub use rtree::RTreeIndex;

/// Spatial index interface: store one extent per key, query by extent.
///
/// Implementations must return query results deterministically, sorted
/// ascending by key, with inclusive edge overlap.
pub trait SpatialIndex<K> {
    /// Inserts or replaces the extent stored for `key`.
    fn upsert(&mut self, key: K, extent: Extent);
    /// Removes `key` if present.
    fn remove(&mut self, key: &K);
    /// Returns every key whose extent overlaps `extent`, ascending.
    fn intersects(&self, extent: &Extent) -> Vec<K>;
    /// Returns the extent stored for `key`.
    fn extent_of(&self, key: &K) -> Option<Extent>;
    /// Number of stored keys.
    fn len(&self) -> usize;
    /// `true` when nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reference index that scans every stored extent.
#[derive(Debug, Clone)]
pub struct LinearIndex<K> {
    items: BTreeMap<K, Extent>,
}

impl<K> Default for LinearIndex<K> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<K: Ord> LinearIndex<K> {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Ord + Clone> SpatialIndex<K> for LinearIndex<K> {
    fn upsert(&mut self, key: K, extent: Extent) {
        self.items.insert(key, extent);
    }

    fn remove(&mut self, key: &K) {
        self.items.remove(key);
    }

    fn intersects(&self, extent: &Extent) -> Vec<K> {
        // BTreeMap iteration is already sorted by key.
        self.items
            .iter()
            .filter(|(_, e)| e.overlaps(extent))
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn extent_of(&self, key: &K) -> Option<Extent> {
        self.items.get(key).copied()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
