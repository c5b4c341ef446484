// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph edit actions.
//!
//! An [`Action`] is a pure function from one graph snapshot to the next. Fixes
//! resolve to actions; [`crate::EditHistory::perform`] applies them. Every
//! entity an action rewrites has its local revision bumped.
use std::collections::BTreeSet;

use meridian_geom::{spherical_closest, Loc};
use thiserror::Error;

use crate::entity::{Entity, Node};
use crate::graph::{Graph, GraphError};
use crate::ident::{EntityId, EntityKind};
use crate::tags::Tags;

/// Failure applying an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// An id named by the action is not in the graph (or has the wrong kind).
    #[error("entity {0} is missing or has the wrong kind")]
    MissingEntity(EntityId),
    /// No way contains the edge as consecutive nodes.
    #[error("no way contains edge {0}-{1}")]
    InvalidEdge(EntityId, EntityId),
    /// The action would not change anything meaningful (e.g. merging one node).
    #[error("degenerate action: {0}")]
    Degenerate(&'static str),
    /// A vertex or member index lies past the end of the list.
    #[error("index {index} is out of bounds for {way}")]
    InvalidIndex {
        /// Way or relation being edited.
        way: EntityId,
        /// Requested insertion index.
        index: usize,
    },
}

impl From<GraphError> for ActionError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::MissingEntity(id) | GraphError::WrongKind(id) => Self::MissingEntity(id),
        }
    }
}

/// A graph edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the tags of an entity.
    ChangeTags {
        /// Target entity.
        id: EntityId,
        /// Complete new tag set.
        tags: Tags,
    },
    /// Insert an entity as given, replacing any entity with the same id.
    AddEntity(Entity),
    /// Insert a new standalone node.
    AddNode {
        /// Id for the node; normally from [`Graph::next_id`].
        id: EntityId,
        /// Location.
        loc: Loc,
        /// Tags.
        tags: Tags,
    },
    /// Place `node` at `loc` and splice it between the ends of `edge` in
    /// every way that has them as consecutive nodes.
    AddMidpoint {
        /// Node to insert (must exist).
        node: EntityId,
        /// New location for the node.
        loc: Loc,
        /// Edge endpoints.
        edge: [EntityId; 2],
    },
    /// Merge nodes into one survivor, optionally moving it to `loc`.
    MergeNodes {
        /// Nodes to merge, at least two.
        ids: Vec<EntityId>,
        /// Target location; the survivor keeps its own when `None`.
        loc: Option<Loc>,
    },
    /// Insert an existing node into a way at `index`.
    AddVertex {
        /// Way to edit.
        way: EntityId,
        /// Node to insert.
        node: EntityId,
        /// Position in the node list (may equal its length).
        index: usize,
    },
    /// Set the role of the member at `index`.
    ChangeMemberRole {
        /// Relation to edit.
        relation: EntityId,
        /// Member position.
        index: usize,
        /// New role.
        role: String,
    },
    /// Remove the member at `index`.
    RemoveMember {
        /// Relation to edit.
        relation: EntityId,
        /// Member position.
        index: usize,
    },
    /// Delete an entity, detaching it from parents and dropping orphans.
    DeleteEntity {
        /// Entity to delete.
        id: EntityId,
    },
    /// Join two crossing ways at `loc` through a new node tagged `tags`.
    ///
    /// For each edge, an existing edge node closer than `merge_threshold_m`
    /// is merged with the new node; otherwise the new node is spliced into the
    /// edge.
    ConnectCrossingWays {
        /// Crossing location.
        loc: Loc,
        /// Tags for the connection node.
        tags: Tags,
        /// Crossing edges, one per way.
        edges: [[EntityId; 2]; 2],
        /// Snap distance in meters.
        merge_threshold_m: f64,
    },
    /// Apply actions in order.
    Sequence(Vec<Action>),
}

impl Action {
    /// Applies the action to `graph`, returning the next snapshot.
    pub fn apply(&self, graph: &Graph) -> Result<Graph, ActionError> {
        let mut next = graph.clone();
        self.apply_in_place(&mut next)?;
        Ok(next)
    }

    fn apply_in_place(&self, graph: &mut Graph) -> Result<(), ActionError> {
        match self {
            Self::ChangeTags { id, tags } => change_tags(graph, *id, tags.clone()),
            Self::AddEntity(entity) => {
                graph.replace(entity.clone());
                Ok(())
            }
            Self::AddNode { id, loc, tags } => {
                graph.replace(Entity::Node(Node {
                    id: *id,
                    loc: *loc,
                    tags: tags.clone(),
                    version: None,
                    revision: 1,
                }));
                Ok(())
            }
            Self::AddMidpoint { node, loc, edge } => add_midpoint(graph, *node, *loc, *edge),
            Self::MergeNodes { ids, loc } => merge_nodes(graph, ids, *loc),
            Self::AddVertex { way, node, index } => add_vertex(graph, *way, *node, *index),
            Self::ChangeMemberRole {
                relation,
                index,
                role,
            } => edit_member(graph, *relation, *index, Some(role)),
            Self::RemoveMember { relation, index } => edit_member(graph, *relation, *index, None),
            Self::DeleteEntity { id } => delete_entity(graph, *id),
            Self::ConnectCrossingWays {
                loc,
                tags,
                edges,
                merge_threshold_m,
            } => connect_crossing_ways(graph, *loc, tags, *edges, *merge_threshold_m),
            Self::Sequence(actions) => actions.iter().try_for_each(|a| a.apply_in_place(graph)),
        }
    }
}

fn change_tags(graph: &mut Graph, id: EntityId, tags: Tags) -> Result<(), ActionError> {
    let mut entity = graph.require(id)?.touched();
    *entity.tags_mut() = tags;
    graph.replace(entity);
    Ok(())
}

fn move_node(graph: &mut Graph, id: EntityId, loc: Loc) -> Result<(), ActionError> {
    let mut node = graph.node(id).ok_or(ActionError::MissingEntity(id))?.clone();
    node.loc = loc;
    node.revision += 1;
    graph.replace(Entity::Node(node));
    Ok(())
}

fn add_midpoint(
    graph: &mut Graph,
    node: EntityId,
    loc: Loc,
    edge: [EntityId; 2],
) -> Result<(), ActionError> {
    move_node(graph, node, loc)?;
    let [a, b] = edge;
    let candidates: Vec<_> = graph.parent_ways(a).into_iter().cloned().collect();
    let mut spliced = false;
    for mut way in candidates {
        let mut i = 0;
        let mut changed = false;
        while i + 1 < way.nodes.len() {
            let (x, y) = (way.nodes[i], way.nodes[i + 1]);
            if (x == a && y == b) || (x == b && y == a) {
                way.nodes.insert(i + 1, node);
                changed = true;
                i += 1;
            }
            i += 1;
        }
        if changed {
            way.revision += 1;
            graph.replace(Entity::Way(way));
            spliced = true;
        }
    }
    if spliced {
        Ok(())
    } else {
        Err(ActionError::InvalidEdge(a, b))
    }
}

fn merge_tags(into: &mut Tags, from: &Tags) {
    for (key, value) in from {
        match into.get_mut(key) {
            Some(existing) if existing != value => {
                let mut parts: BTreeSet<&str> = existing.split(';').collect();
                parts.extend(value.split(';'));
                let joined = parts.into_iter().collect::<Vec<_>>().join(";");
                *existing = joined;
            }
            Some(_) => {}
            None => {
                into.insert(key.clone(), value.clone());
            }
        }
    }
}

fn merge_nodes(graph: &mut Graph, ids: &[EntityId], loc: Option<Loc>) -> Result<(), ActionError> {
    let mut unique: Vec<EntityId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    if unique.len() < 2 {
        return Err(ActionError::Degenerate("merge needs at least two nodes"));
    }
    let nodes = unique
        .iter()
        .map(|id| graph.node(*id).cloned().ok_or(ActionError::MissingEntity(*id)))
        .collect::<Result<Vec<_>, _>>()?;

    // Prefer keeping an uploaded node so its history survives.
    let survivor_idx = nodes.iter().position(|n| n.version.is_some()).unwrap_or(0);
    let mut survivor = nodes[survivor_idx].clone();
    for (i, other) in nodes.iter().enumerate() {
        if i != survivor_idx {
            merge_tags(&mut survivor.tags, &other.tags);
        }
    }
    if let Some(loc) = loc {
        survivor.loc = loc;
    }
    survivor.revision += 1;
    let survivor_id = survivor.id;
    graph.replace(Entity::Node(survivor));

    for other in nodes.iter().filter(|n| n.id != survivor_id) {
        let ways: Vec<_> = graph.parent_ways(other.id).into_iter().cloned().collect();
        for mut way in ways {
            for n in &mut way.nodes {
                if *n == other.id {
                    *n = survivor_id;
                }
            }
            way.nodes.dedup();
            way.revision += 1;
            graph.replace(Entity::Way(way));
        }
        let rels: Vec<_> = graph.parent_relations(other.id).into_iter().cloned().collect();
        for mut rel in rels {
            for m in &mut rel.members {
                if m.id == other.id {
                    m.id = survivor_id;
                }
            }
            rel.revision += 1;
            graph.replace(Entity::Relation(rel));
        }
        graph.remove(other.id);
    }
    Ok(())
}

fn add_vertex(
    graph: &mut Graph,
    way: EntityId,
    node: EntityId,
    index: usize,
) -> Result<(), ActionError> {
    if graph.node(node).is_none() {
        return Err(ActionError::MissingEntity(node));
    }
    let mut w = graph.way(way).ok_or(ActionError::MissingEntity(way))?.clone();
    if index > w.nodes.len() {
        return Err(ActionError::InvalidIndex { way, index });
    }
    w.nodes.insert(index, node);
    w.revision += 1;
    graph.replace(Entity::Way(w));
    Ok(())
}

/// Sets the member's role, or removes the member when `role` is `None`.
fn edit_member(
    graph: &mut Graph,
    relation: EntityId,
    index: usize,
    role: Option<&String>,
) -> Result<(), ActionError> {
    let mut rel = graph
        .relation(relation)
        .ok_or(ActionError::MissingEntity(relation))?
        .clone();
    if index >= rel.members.len() {
        return Err(ActionError::InvalidIndex {
            way: relation,
            index,
        });
    }
    match role {
        Some(role) => rel.members[index].role.clone_from(role),
        None => {
            rel.members.remove(index);
        }
    }
    rel.revision += 1;
    graph.replace(Entity::Relation(rel));
    Ok(())
}

fn delete_entity(graph: &mut Graph, id: EntityId) -> Result<(), ActionError> {
    let entity = graph.require(id)?.clone();

    let rels: Vec<_> = graph.parent_relations(id).into_iter().cloned().collect();
    for mut rel in rels {
        rel.members.retain(|m| m.id != id);
        rel.revision += 1;
        let rel_id = rel.id;
        if rel.members.is_empty() {
            delete_entity(graph, rel_id)?;
        } else {
            graph.replace(Entity::Relation(rel));
        }
    }

    match entity.as_ref() {
        Entity::Node(_) => {
            let ways: Vec<_> = graph.parent_ways(id).into_iter().cloned().collect();
            for mut way in ways {
                let closed = way.is_closed();
                way.nodes.retain(|n| *n != id);
                if closed && way.nodes.first() != way.nodes.last() {
                    if let Some(first) = way.nodes.first().copied() {
                        way.nodes.push(first);
                    }
                }
                way.revision += 1;
                let way_id = way.id;
                if way.is_degenerate() {
                    graph.replace(Entity::Way(way));
                    delete_entity(graph, way_id)?;
                } else {
                    graph.replace(Entity::Way(way));
                }
            }
            graph.remove(id);
        }
        Entity::Way(way) => {
            graph.remove(id);
            for node in &way.nodes {
                let orphan = graph.node(*node).is_some_and(|n| {
                    !crate::tags::has_interesting_tags(&n.tags)
                        && graph.parent_ways(*node).is_empty()
                        && !graph.is_member(*node)
                });
                if orphan {
                    graph.remove(*node);
                }
            }
        }
        Entity::Relation(_) => {
            graph.remove(id);
        }
    }
    Ok(())
}

fn connect_crossing_ways(
    graph: &mut Graph,
    loc: Loc,
    tags: &Tags,
    edges: [[EntityId; 2]; 2],
    merge_threshold_m: f64,
) -> Result<(), ActionError> {
    let node_id = graph.next_id(EntityKind::Node);
    graph.replace(Entity::Node(Node {
        id: node_id,
        loc,
        tags: tags.clone(),
        version: None,
        revision: 1,
    }));

    let mut to_merge = vec![node_id];
    for edge in edges {
        let locs = edge
            .iter()
            .map(|id| graph.node(*id).map(|n| n.loc).ok_or(ActionError::MissingEntity(*id)))
            .collect::<Result<Vec<_>, _>>()?;
        match spherical_closest(&locs, loc) {
            Some((idx, dist)) if dist < merge_threshold_m => to_merge.push(edge[idx]),
            _ => add_midpoint(graph, node_id, loc, edge)?,
        }
    }
    if to_merge.len() > 1 {
        merge_nodes(graph, &to_merge, Some(loc))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Way;
    use crate::tags::tags_from;

    fn node(n: i64, loc: Loc) -> Entity {
        Entity::Node(Node {
            id: EntityId::node(n),
            loc,
            tags: Tags::new(),
            version: Some(1),
            revision: 0,
        })
    }

    fn way(n: i64, nodes: &[i64]) -> Entity {
        Entity::Way(Way {
            id: EntityId::way(n),
            nodes: nodes.iter().map(|i| EntityId::node(*i)).collect(),
            tags: tags_from([("highway", "residential")]),
            version: Some(1),
            revision: 0,
        })
    }

    fn cross() -> Graph {
        Graph::from_entities([
            node(1, [-0.001, 0.0]),
            node(2, [0.001, 0.0]),
            node(3, [0.0, -0.001]),
            node(4, [0.0, 0.001]),
            way(1, &[1, 2]),
            way(2, &[3, 4]),
        ])
    }

    #[test]
    fn connect_crossing_ways_splices_one_shared_node() {
        let g = cross();
        let next = Action::ConnectCrossingWays {
            loc: [0.0, 0.0],
            tags: tags_from([("highway", "crossing")]),
            edges: [
                [EntityId::node(1), EntityId::node(2)],
                [EntityId::node(3), EntityId::node(4)],
            ],
            merge_threshold_m: 0.75,
        }
        .apply(&g)
        .unwrap();
        let w1 = next.way(EntityId::way(1)).unwrap();
        let w2 = next.way(EntityId::way(2)).unwrap();
        assert_eq!(w1.nodes.len(), 3);
        assert_eq!(w1.nodes[1], w2.nodes[1]);
        let shared = next.node(w1.nodes[1]).unwrap();
        assert_eq!(shared.tags.get("highway").map(String::as_str), Some("crossing"));
        assert!(w1.revision > 0);
    }

    #[test]
    fn merge_nodes_keeps_uploaded_survivor_and_rewrites_ways() {
        let mut g = cross();
        g.replace(Entity::Node(Node {
            id: EntityId::node(-1),
            loc: [0.0, 0.0],
            tags: tags_from([("noexit", "yes")]),
            version: None,
            revision: 1,
        }));
        let next = Action::MergeNodes {
            ids: vec![EntityId::node(-1), EntityId::node(2)],
            loc: None,
        }
        .apply(&g)
        .unwrap();
        assert!(!next.has_entity(EntityId::node(-1)));
        let survivor = next.node(EntityId::node(2)).unwrap();
        assert_eq!(survivor.tags.get("noexit").map(String::as_str), Some("yes"));
        assert_eq!(
            Action::MergeNodes {
                ids: vec![EntityId::node(2)],
                loc: None
            }
            .apply(&g)
            .unwrap_err(),
            ActionError::Degenerate("merge needs at least two nodes")
        );
    }

    #[test]
    fn add_midpoint_rejects_unknown_edge() {
        let g = cross();
        let err = Action::AddMidpoint {
            node: EntityId::node(3),
            loc: [0.0, 0.0],
            edge: [EntityId::node(1), EntityId::node(4)],
        }
        .apply(&g)
        .unwrap_err();
        assert_eq!(err, ActionError::InvalidEdge(EntityId::node(1), EntityId::node(4)));
    }

    #[test]
    fn deleting_a_way_drops_its_orphan_nodes() {
        let g = cross();
        let next = Action::DeleteEntity {
            id: EntityId::way(1),
        }
        .apply(&g)
        .unwrap();
        assert!(!next.has_entity(EntityId::way(1)));
        assert!(!next.has_entity(EntityId::node(1)));
        assert!(next.has_entity(EntityId::node(3)));
    }

    #[test]
    fn deleting_a_node_removes_degenerate_parent_way() {
        let g = cross();
        let next = Action::DeleteEntity {
            id: EntityId::node(1),
        }
        .apply(&g)
        .unwrap();
        assert!(!next.has_entity(EntityId::way(1)));
        assert!(!next.has_entity(EntityId::node(2)));
    }

    #[test]
    fn add_vertex_closes_a_way() {
        let g = cross();
        let next = Action::AddVertex {
            way: EntityId::way(1),
            node: EntityId::node(1),
            index: 2,
        }
        .apply(&g)
        .unwrap();
        assert!(next.way(EntityId::way(1)).unwrap().is_closed());
        assert!(matches!(
            Action::AddVertex {
                way: EntityId::way(1),
                node: EntityId::node(1),
                index: 9,
            }
            .apply(&g),
            Err(ActionError::InvalidIndex { .. })
        ));
    }
}
