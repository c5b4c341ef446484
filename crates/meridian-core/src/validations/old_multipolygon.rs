// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Old-style multipolygons: feature tags on the single outer way instead of
//! the relation.
use std::sync::Arc;

use crate::context::RuleContext;
use crate::entity::{Entity, Relation, Way};
use crate::graph::Graph;
use crate::issue::{Fix, FixCommand, Issue, Severity};
use crate::rule::{entity_subject, Rule, RuleResult, Subject};
use crate::tags::{has_interesting_tags, is_interesting_key};

/// Rule id.
pub const ID: &str = "old_multipolygon";

/// The outer way carrying the tags of an old-style multipolygon.
fn old_style_outer<'g>(relation: &Relation, graph: &'g Graph) -> Option<&'g Way> {
    if !relation.is_multipolygon() {
        return None;
    }
    if relation.tags.keys().filter(|k| is_interesting_key(k)).count() > 1 {
        return None;
    }
    let mut outers = relation.members_with_role("outer");
    let outer = outers.next()?;
    if outers.next().is_some() {
        return None;
    }
    graph
        .way(outer.id)
        .filter(|way| has_interesting_tags(&way.tags))
}

/// The old-multipolygon rule.
#[derive(Debug, Default)]
pub struct OldMultipolygon;

impl Rule for OldMultipolygon {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Old-Style Multipolygons"
    }

    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult {
        let entity = entity_subject!(subject);
        let graph = cx.graph;
        let pair = match entity.as_ref() {
            Entity::Relation(rel) => old_style_outer(rel, graph).map(|way| (way.id, rel.id)),
            Entity::Way(way) if has_interesting_tags(&way.tags) => {
                match graph.parent_relations(way.id).as_slice() {
                    [rel] => old_style_outer(rel, graph)
                        .filter(|outer| outer.id == way.id)
                        .map(|outer| (outer.id, rel.id)),
                    _ => None,
                }
            }
            _ => None,
        };
        let Some((way_id, rel_id)) = pair else {
            return Ok(Vec::new());
        };
        let (Some(way), Some(rel)) = (graph.entity(way_id), graph.entity(rel_id)) else {
            return Ok(Vec::new());
        };
        let issue = Issue::builder(ID, Severity::Warning)
            .message(format!("{} has misplaced tags.", cx.label(rel)))
            .tooltip("Multipolygon tags belong on the relation, not on its outer way.")
            .entities(vec![Arc::clone(way), Arc::clone(rel)])
            .fix(
                Fix::new("Move tags to the relation", FixCommand::MoveTagsToRelation)
                    .icon("multipolygon"),
            )
            .build();
        Ok(vec![Arc::new(issue)])
    }
}
