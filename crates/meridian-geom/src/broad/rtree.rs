// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::collections::BTreeMap;

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

use super::SpatialIndex;
use crate::types::extent::Extent;

type Entry<K> = GeomWithData<Rectangle<[f64; 2]>, K>;

fn entry<K>(key: K, extent: &Extent) -> Entry<K> {
    GeomWithData::new(Rectangle::from_corners(extent.min(), extent.max()), key)
}

/// Rectangle tree over keyed extents.
///
/// The tree does not support in-place updates, so the last extent for each key
/// is kept alongside it; `upsert` removes the previous rectangle before
/// inserting the new one. Query output is sorted by key after the tree walk so
/// results do not depend on the tree's internal node layout.
pub struct RTreeIndex<K> {
    tree: RTree<Entry<K>>,
    extents: BTreeMap<K, Extent>,
}

impl<K> core::fmt::Debug for RTreeIndex<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RTreeIndex")
            .field("len", &self.extents.len())
            .finish_non_exhaustive()
    }
}

impl<K: Ord + Clone + PartialEq> Default for RTreeIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone + PartialEq> RTreeIndex<K> {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            extents: BTreeMap::new(),
        }
    }

    /// Builds an index from `(key, extent)` pairs in one pass.
    ///
    /// Later duplicates of a key replace earlier ones.
    pub fn bulk_load<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, Extent)>,
    {
        let extents: BTreeMap<K, Extent> = items.into_iter().collect();
        let entries = extents
            .iter()
            .map(|(k, e)| entry(k.clone(), e))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            extents,
        }
    }
}

impl<K: Ord + Clone + PartialEq> SpatialIndex<K> for RTreeIndex<K> {
    fn upsert(&mut self, key: K, extent: Extent) {
        if let Some(old) = self.extents.insert(key.clone(), extent) {
            self.tree.remove(&entry(key.clone(), &old));
        }
        self.tree.insert(entry(key, &extent));
    }

    fn remove(&mut self, key: &K) {
        if let Some(old) = self.extents.remove(key) {
            self.tree.remove(&entry(key.clone(), &old));
        }
    }

    fn intersects(&self, extent: &Extent) -> Vec<K> {
        let envelope = AABB::from_corners(extent.min(), extent.max());
        let mut out: Vec<K> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| e.data.clone())
            .collect();
        out.sort_unstable();
        out
    }

    fn extent_of(&self, key: &K) -> Option<Extent> {
        self.extents.get(key).copied()
    }

    fn len(&self) -> usize {
        self.extents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_previous_extent() {
        let mut index = RTreeIndex::new();
        index.upsert(7_u32, Extent::from_corners([0.0, 0.0], [1.0, 1.0]));
        index.upsert(7_u32, Extent::from_corners([10.0, 10.0], [11.0, 11.0]));
        assert_eq!(index.len(), 1);
        assert!(index
            .intersects(&Extent::from_corners([0.5, 0.5], [0.6, 0.6]))
            .is_empty());
        assert_eq!(
            index.intersects(&Extent::from_point([10.5, 10.5])),
            vec![7]
        );
    }

    #[test]
    fn remove_drops_key_from_queries() {
        let mut index = RTreeIndex::bulk_load([
            (1_u32, Extent::from_point([0.0, 0.0])),
            (2_u32, Extent::from_point([0.0, 0.0])),
        ]);
        index.remove(&1);
        assert_eq!(index.intersects(&Extent::from_point([0.0, 0.0])), vec![2]);
        assert!(index.extent_of(&1).is_none());
    }
}
