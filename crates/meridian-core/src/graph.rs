// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable-by-convention graph snapshots with parent indices.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use meridian_geom::{Extent, Loc};
use thiserror::Error;

use crate::entity::{Entity, Node, Relation, Way};
use crate::ident::{EntityId, EntityKind};
use crate::tags::tag_suggesting_area;

/// Error raised when the graph is asked about an entity it does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The entity is referenced but absent from the snapshot.
    #[error("entity {0} is not in the graph")]
    MissingEntity(EntityId),
    /// The entity exists but has a different kind than required.
    #[error("entity {0} has the wrong kind for this operation")]
    WrongKind(EntityId),
}

/// Derived geometry of an entity in a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Geometry {
    /// Standalone node.
    Point,
    /// Node that belongs to at least one way.
    Vertex,
    /// Open way, or closed way without area tags.
    Line,
    /// Closed way with area tags, or multipolygon relation.
    Area,
    /// Any other relation.
    Relation,
}

/// A snapshot of the map graph.
///
/// Entities are shared through `Arc`, so cloning a graph (which history does
/// on every edit) copies the maps but not the entity payloads. Iteration is
/// always in [`EntityId`] order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    entities: BTreeMap<EntityId, Arc<Entity>>,
    /// node id -> ways containing it.
    parent_ways: BTreeMap<EntityId, BTreeSet<EntityId>>,
    /// member id -> relations containing it.
    parent_rels: BTreeMap<EntityId, BTreeSet<EntityId>>,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from entity values.
    pub fn from_entities<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = Entity>,
    {
        let mut graph = Self::new();
        for entity in entities {
            graph.replace(entity);
        }
        graph
    }

    /// `true` when `id` is present.
    #[must_use]
    pub fn has_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Shared entity snapshot for `id`.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Arc<Entity>> {
        self.entities.get(&id)
    }

    /// Entity snapshot for `id`, or [`GraphError::MissingEntity`].
    pub fn require(&self, id: EntityId) -> Result<&Arc<Entity>, GraphError> {
        self.entities.get(&id).ok_or(GraphError::MissingEntity(id))
    }

    /// Node view for `id`.
    #[must_use]
    pub fn node(&self, id: EntityId) -> Option<&Node> {
        self.entity(id).and_then(|e| e.as_node())
    }

    /// Way view for `id`.
    #[must_use]
    pub fn way(&self, id: EntityId) -> Option<&Way> {
        self.entity(id).and_then(|e| e.as_way())
    }

    /// Relation view for `id`.
    #[must_use]
    pub fn relation(&self, id: EntityId) -> Option<&Relation> {
        self.entity(id).and_then(|e| e.as_relation())
    }

    /// Every entity, ascending by id.
    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.entities.values()
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// `true` when the graph holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ways that contain node `id`, ascending by id.
    #[must_use]
    pub fn parent_ways(&self, id: EntityId) -> Vec<&Way> {
        self.parent_ways
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|w| self.way(*w))
            .collect()
    }

    /// Relations that have `id` as a member, ascending by id.
    #[must_use]
    pub fn parent_relations(&self, id: EntityId) -> Vec<&Relation> {
        self.parent_rels
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|r| self.relation(*r))
            .collect()
    }

    /// Multipolygon relations that have `id` as a member.
    #[must_use]
    pub fn parent_multipolygons(&self, id: EntityId) -> Vec<&Relation> {
        self.parent_relations(id)
            .into_iter()
            .filter(|r| r.is_multipolygon())
            .collect()
    }

    /// `true` when `id` belongs to at least one relation.
    #[must_use]
    pub fn is_member(&self, id: EntityId) -> bool {
        self.parent_rels.get(&id).is_some_and(|s| !s.is_empty())
    }

    /// Resolves the nodes of `way` in order.
    pub fn child_nodes(&self, way: &Way) -> Result<Vec<&Node>, GraphError> {
        way.nodes
            .iter()
            .map(|id| {
                self.require(*id)?
                    .as_node()
                    .ok_or(GraphError::WrongKind(*id))
            })
            .collect()
    }

    /// Locations of `way`'s nodes in order.
    pub fn way_locs(&self, way: &Way) -> Result<Vec<Loc>, GraphError> {
        Ok(self.child_nodes(way)?.iter().map(|n| n.loc).collect())
    }

    /// `true` for closed ways whose tags imply an area.
    #[must_use]
    pub fn is_area(&self, way: &Way) -> bool {
        way.is_closed() && tag_suggesting_area(&way.tags).is_some()
    }

    /// Derived geometry of `entity` in this snapshot.
    #[must_use]
    pub fn geometry(&self, entity: &Entity) -> Geometry {
        match entity {
            Entity::Node(n) => {
                if self.parent_ways.get(&n.id).is_some_and(|s| !s.is_empty()) {
                    Geometry::Vertex
                } else {
                    Geometry::Point
                }
            }
            Entity::Way(w) => {
                if self.is_area(w) {
                    Geometry::Area
                } else {
                    Geometry::Line
                }
            }
            Entity::Relation(r) => {
                if r.is_multipolygon() {
                    Geometry::Area
                } else {
                    Geometry::Relation
                }
            }
        }
    }

    /// Bounding extent of `id`; `None` when nothing locatable is reachable.
    ///
    /// Relations union their members' extents; cycles are visited once.
    #[must_use]
    pub fn extent(&self, id: EntityId) -> Option<Extent> {
        let mut seen = BTreeSet::new();
        self.extent_inner(id, &mut seen)
    }

    fn extent_inner(&self, id: EntityId, seen: &mut BTreeSet<EntityId>) -> Option<Extent> {
        if !seen.insert(id) {
            return None;
        }
        match self.entity(id)?.as_ref() {
            Entity::Node(n) => Some(Extent::from_point(n.loc)),
            Entity::Way(w) => {
                let locs: Vec<Loc> = w
                    .nodes
                    .iter()
                    .filter_map(|n| self.node(*n))
                    .map(|n| n.loc)
                    .collect();
                Extent::from_points(&locs)
            }
            Entity::Relation(r) => r
                .members
                .iter()
                .filter_map(|m| self.extent_inner(m.id, seen))
                .reduce(|a, b| a.union(&b)),
        }
    }

    /// Next unused locally-created id of `kind` (`-1`, `-2`, ...).
    #[must_use]
    pub fn next_id(&self, kind: EntityKind) -> EntityId {
        let lowest = self
            .entities
            .range(EntityId::new(kind, i64::MIN)..EntityId::new(kind, 0))
            .next()
            .map_or(0, |(id, _)| id.num());
        EntityId::new(kind, lowest - 1)
    }

    /// Inserts or replaces an entity, keeping the parent indices current.
    pub fn replace(&mut self, entity: Entity) {
        let id = entity.id();
        self.unlink_children(id);
        match &entity {
            Entity::Way(w) => {
                for n in &w.nodes {
                    self.parent_ways.entry(*n).or_default().insert(id);
                }
            }
            Entity::Relation(r) => {
                for m in &r.members {
                    self.parent_rels.entry(m.id).or_default().insert(id);
                }
            }
            Entity::Node(_) => {}
        }
        self.entities.insert(id, Arc::new(entity));
    }

    /// Removes an entity. References held by other entities are left as-is.
    pub fn remove(&mut self, id: EntityId) -> Option<Arc<Entity>> {
        self.unlink_children(id);
        self.entities.remove(&id)
    }

    fn unlink_children(&mut self, id: EntityId) {
        let Some(old) = self.entities.get(&id) else {
            return;
        };
        let (index, children): (_, Vec<EntityId>) = match old.as_ref() {
            Entity::Way(w) => (&mut self.parent_ways, w.nodes.clone()),
            Entity::Relation(r) => (&mut self.parent_rels, r.members.iter().map(|m| m.id).collect()),
            Entity::Node(_) => return,
        };
        for child in children {
            if let Some(parents) = index.get_mut(&child) {
                parents.remove(&id);
                if parents.is_empty() {
                    index.remove(&child);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Member;
    use crate::tags::{tags_from, Tags};

    fn node(n: i64, loc: Loc) -> Entity {
        Entity::Node(Node {
            id: EntityId::node(n),
            loc,
            tags: Tags::new(),
            version: Some(1),
            revision: 0,
        })
    }

    fn way(n: i64, nodes: &[i64], tags: Tags) -> Entity {
        Entity::Way(Way {
            id: EntityId::way(n),
            nodes: nodes.iter().map(|i| EntityId::node(*i)).collect(),
            tags,
            version: Some(1),
            revision: 0,
        })
    }

    fn square() -> Graph {
        Graph::from_entities([
            node(1, [0.0, 0.0]),
            node(2, [1.0, 0.0]),
            node(3, [1.0, 1.0]),
            node(4, [5.0, 5.0]),
            way(1, &[1, 2, 3, 1], tags_from([("building", "yes")])),
        ])
    }

    #[test]
    fn geometry_follows_membership_and_tags() {
        let g = square();
        let n1 = g.entity(EntityId::node(1)).unwrap();
        let n4 = g.entity(EntityId::node(4)).unwrap();
        let w1 = g.entity(EntityId::way(1)).unwrap();
        assert_eq!(g.geometry(n1), Geometry::Vertex);
        assert_eq!(g.geometry(n4), Geometry::Point);
        assert_eq!(g.geometry(w1), Geometry::Area);
    }

    #[test]
    fn replace_updates_parent_index() {
        let mut g = square();
        g.replace(way(1, &[2, 3], Tags::new()));
        assert!(g.parent_ways(EntityId::node(1)).is_empty());
        assert_eq!(g.parent_ways(EntityId::node(2)).len(), 1);
        g.remove(EntityId::way(1));
        assert!(g.parent_ways(EntityId::node(2)).is_empty());
    }

    #[test]
    fn child_nodes_reports_missing_nodes() {
        let mut g = square();
        g.replace(way(2, &[1, 99], Tags::new()));
        let w = g.way(EntityId::way(2)).unwrap().clone();
        assert_eq!(
            g.child_nodes(&w).unwrap_err(),
            GraphError::MissingEntity(EntityId::node(99))
        );
    }

    #[test]
    fn relation_extent_unions_members_and_survives_cycles() {
        let mut g = square();
        g.replace(Entity::Relation(Relation {
            id: EntityId::relation(1),
            members: vec![
                Member {
                    id: EntityId::way(1),
                    role: "outer".into(),
                },
                Member {
                    id: EntityId::node(4),
                    role: String::new(),
                },
                Member {
                    id: EntityId::relation(1),
                    role: String::new(),
                },
            ],
            tags: Tags::new(),
            version: None,
            revision: 0,
        }));
        let extent = g.extent(EntityId::relation(1)).unwrap();
        assert_eq!(extent.min(), [0.0, 0.0]);
        assert_eq!(extent.max(), [5.0, 5.0]);
        assert!(g.is_member(EntityId::node(4)));
    }

    #[test]
    fn next_id_counts_down_per_kind() {
        let mut g = square();
        assert_eq!(g.next_id(EntityKind::Node), EntityId::node(-1));
        g.replace(node(-1, [0.0, 0.0]));
        g.replace(node(-2, [0.0, 0.0]));
        assert_eq!(g.next_id(EntityKind::Node), EntityId::node(-3));
        assert_eq!(g.next_id(EntityKind::Way), EntityId::way(-1));
    }
}
