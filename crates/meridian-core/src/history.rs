// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Edit history port and an in-memory implementation.
use std::collections::BTreeSet;
use std::sync::Arc;

use meridian_geom::{RTreeIndex, SpatialIndex};
use tracing::{debug, instrument};

use crate::actions::{Action, ActionError};
use crate::entity::Entity;
use crate::graph::Graph;
use crate::ident::{EntityId, EntityKind};

/// Entities that differ between the base graph and the current graph.
///
/// Each list is ascending by id. `deleted` holds the base snapshot of the
/// removed entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    /// Present now, absent in the base.
    pub created: Vec<Arc<Entity>>,
    /// Present in both with different values.
    pub modified: Vec<Arc<Entity>>,
    /// Present in the base, absent now.
    pub deleted: Vec<Arc<Entity>>,
}

impl Changes {
    /// Diffs two snapshots.
    #[must_use]
    pub fn between(base: &Graph, head: &Graph) -> Self {
        let mut changes = Self::default();
        for after in head.entities() {
            match base.entity(after.id()) {
                None => changes.created.push(Arc::clone(after)),
                Some(before) if !Arc::ptr_eq(before, after) && before != after => {
                    changes.modified.push(Arc::clone(after));
                }
                Some(_) => {}
            }
        }
        for before in base.entities() {
            if !head.has_entity(before.id()) {
                changes.deleted.push(Arc::clone(before));
            }
        }
        changes
    }

    /// `true` when nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// History capability consumed by the validator.
pub trait History {
    /// Changes since the base graph.
    fn changes(&self) -> Changes;
    /// Current graph snapshot.
    fn graph(&self) -> &Graph;
    /// Spatial index over the extents of every entity in [`History::graph`].
    fn tree(&self) -> &dyn SpatialIndex<EntityId>;
}

/// Linear undo stack over graph snapshots with an incrementally maintained
/// spatial index.
#[derive(Debug)]
pub struct EditHistory {
    base: Graph,
    stack: Vec<(Graph, String)>,
    tree: RTreeIndex<EntityId>,
}

impl EditHistory {
    /// Starts a history at `base`.
    #[must_use]
    pub fn new(base: Graph) -> Self {
        let tree = RTreeIndex::bulk_load(
            base.entities()
                .filter_map(|e| base.extent(e.id()).map(|x| (e.id(), x))),
        );
        Self {
            base,
            stack: Vec::new(),
            tree,
        }
    }

    /// Applies `action` to the current graph and pushes the result.
    ///
    /// On error the history is unchanged.
    #[instrument(level = "debug", skip(self, action))]
    pub fn perform(&mut self, action: &Action, annotation: &str) -> Result<(), ActionError> {
        let current = self.stack.last().map_or(&self.base, |(g, _)| g);
        let next = action.apply(current)?;
        sync_tree(&mut self.tree, current, &next);
        self.stack.push((next, annotation.to_owned()));
        debug!(depth = self.stack.len(), "edit performed");
        Ok(())
    }

    /// Pops the last edit; returns its annotation, or `None` at the base.
    pub fn undo(&mut self) -> Option<String> {
        let (undone, annotation) = self.stack.pop()?;
        let graph = self.stack.last().map_or(&self.base, |(g, _)| g);
        sync_tree(&mut self.tree, &undone, graph);
        debug!(depth = self.stack.len(), %annotation, "edit undone");
        Some(annotation)
    }

    /// Annotation of the most recent edit.
    #[must_use]
    pub fn last_annotation(&self) -> Option<&str> {
        self.stack.last().map(|(_, a)| a.as_str())
    }

    /// Base graph the history started from.
    #[must_use]
    pub fn base(&self) -> &Graph {
        &self.base
    }
}

impl History for EditHistory {
    fn changes(&self) -> Changes {
        Changes::between(&self.base, self.graph())
    }

    fn graph(&self) -> &Graph {
        self.stack.last().map_or(&self.base, |(g, _)| g)
    }

    fn tree(&self) -> &dyn SpatialIndex<EntityId> {
        &self.tree
    }
}

/// Re-indexes every entity whose extent may differ between `before` and
/// `after`: changed entities, the parent ways of changed nodes, and the
/// parent relations of all of those (transitively).
fn sync_tree(tree: &mut RTreeIndex<EntityId>, before: &Graph, after: &Graph) {
    let diff = Changes::between(before, after);
    let mut dirty: BTreeSet<EntityId> = diff
        .created
        .iter()
        .chain(&diff.modified)
        .chain(&diff.deleted)
        .map(|e| e.id())
        .collect();

    let mut frontier: Vec<EntityId> = dirty.iter().copied().collect();
    while let Some(id) = frontier.pop() {
        for graph in [before, after] {
            let mut parents: Vec<EntityId> = Vec::new();
            if id.kind() == EntityKind::Node {
                parents.extend(graph.parent_ways(id).iter().map(|w| w.id));
            }
            parents.extend(graph.parent_relations(id).iter().map(|r| r.id));
            for parent in parents {
                if dirty.insert(parent) {
                    frontier.push(parent);
                }
            }
        }
    }

    for id in dirty {
        match after.extent(id) {
            Some(extent) => tree.upsert(id, extent),
            None => tree.remove(&id),
        }
    }
}
