// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Highways that connect to no other highway.
use std::sync::Arc;

use crate::context::RuleContext;
use crate::entity::{Entity, Node, Relation, Way};
use crate::graph::Graph;
use crate::ident::EntityId;
use crate::issue::{Fix, FixCommand, Issue, Severity};
use crate::rule::{entity_subject, Rule, RuleError, RuleResult, Subject};
use crate::tags::Tags;
use crate::validations::crossing_ways::HIGHWAYS;

/// Rule id.
pub const ID: &str = "disconnected_way";

pub(crate) fn is_highway(tags: &Tags) -> bool {
    tags.get("highway")
        .is_some_and(|h| HIGHWAYS.contains(&h.as_str()))
}

/// A vertex is a dead end unless some other parent way is a highway or
/// belongs to a highway multipolygon. `relation` is the multipolygon under
/// test and never counts as a connection.
fn vertex_is_disconnected(way: &Way, vertex: &Node, graph: &Graph, relation: Option<EntityId>) -> bool {
    let parents = graph.parent_ways(vertex.id);
    if parents.len() == 1 {
        return true;
    }
    if vertex.tags.get("entrance").is_some_and(|e| e != "no") {
        return false;
    }
    parents.iter().filter(|p| p.id != way.id).all(|parent| {
        !is_highway(&parent.tags)
            && graph
                .parent_multipolygons(parent.id)
                .iter()
                .all(|rel| Some(rel.id) == relation || !is_highway(&rel.tags))
    })
}

fn is_disconnected_way(way: &Way, graph: &Graph, relation: Option<EntityId>) -> Result<bool, RuleError> {
    Ok(graph
        .child_nodes(way)?
        .iter()
        .all(|v| vertex_is_disconnected(way, v, graph, relation)))
}

fn is_disconnected_multipolygon(rel: &Relation, graph: &Graph) -> Result<bool, RuleError> {
    for member in &rel.members {
        let Some(way) = graph.way(member.id) else {
            continue;
        };
        if !is_disconnected_way(way, graph, Some(rel.id))? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn continue_fixes(way: &Way, graph: &Graph) -> Vec<Fix> {
    if way.is_closed() {
        return Vec::new();
    }
    let open_end = |id: EntityId| {
        graph
            .node(id)
            .is_some_and(|n| n.tags.get("noexit").map(String::as_str) != Some("yes"))
    };
    let mut fixes = Vec::new();
    for (end, title) in [
        (way.first(), "Continue from start"),
        (way.last(), "Continue from end"),
    ] {
        if let Some(vertex) = end.filter(|id| open_end(*id)) {
            fixes.push(
                Fix::new(title, FixCommand::ContinueDrawing { vertex })
                    .icon("continue")
                    .highlight(vec![vertex]),
            );
        }
    }
    fixes
}

/// The disconnected-way rule.
#[derive(Debug, Default)]
pub struct DisconnectedWay;

impl Rule for DisconnectedWay {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Disconnected Ways"
    }

    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult {
        let entity = entity_subject!(subject);
        if !is_highway(entity.tags()) {
            return Ok(Vec::new());
        }
        let graph = cx.graph;
        let mut fixes = match entity.as_ref() {
            Entity::Way(way) if is_disconnected_way(way, graph, None)? => continue_fixes(way, graph),
            Entity::Relation(rel)
                if rel.is_multipolygon() && is_disconnected_multipolygon(rel, graph)? =>
            {
                Vec::new()
            }
            _ => return Ok(Vec::new()),
        };
        fixes.push(Fix::new("Delete this feature", FixCommand::DeleteFeature).icon("delete"));

        let issue = Issue::builder(ID, Severity::Warning)
            .message(format!(
                "{} is disconnected from other roads and paths.",
                cx.label(entity)
            ))
            .tooltip("Roads and paths should connect to other roads or building entrances.")
            .entities(vec![Arc::clone(entity)])
            .fixes(fixes)
            .build();
        Ok(vec![Arc::new(issue)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::tags_from;

    fn node(n: i64, tags: Tags) -> Entity {
        Entity::Node(Node {
            id: EntityId::node(n),
            loc: [n as f64 * 0.001, 0.0],
            tags,
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

    #[test]
    fn footway_only_connection_is_still_connected_but_fence_is_not() {
        let road = tags_from([("highway", "residential")]);
        let graph = Graph::from_entities([
            node(1, Tags::new()),
            node(2, Tags::new()),
            node(3, Tags::new()),
            way(1, &[1, 2], road.clone()),
            way(2, &[2, 3], tags_from([("barrier", "fence")])),
        ]);
        let w1 = graph.way(EntityId::way(1)).unwrap();
        assert!(is_disconnected_way(w1, &graph, None).unwrap());

        let graph = Graph::from_entities([
            node(1, Tags::new()),
            node(2, Tags::new()),
            node(3, Tags::new()),
            way(1, &[1, 2], road),
            way(2, &[2, 3], tags_from([("highway", "footway")])),
        ]);
        let w1 = graph.way(EntityId::way(1)).unwrap();
        assert!(!is_disconnected_way(w1, &graph, None).unwrap());
    }

    #[test]
    fn entrances_connect_and_noexit_ends_get_no_continue_fix() {
        let graph = Graph::from_entities([
            node(1, Tags::new()),
            node(2, tags_from([("entrance", "yes"), ("noexit", "yes")])),
            node(3, Tags::new()),
            way(1, &[1, 2], tags_from([("highway", "service")])),
            way(2, &[2, 3], tags_from([("building", "yes")])),
        ]);
        let w1 = graph.way(EntityId::way(1)).unwrap();
        assert!(!is_disconnected_way(w1, &graph, None).unwrap());
        let fixes = continue_fixes(w1, &graph);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].entity_ids, vec![EntityId::node(1)]);
    }
}
