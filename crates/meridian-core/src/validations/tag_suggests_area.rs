// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Open ways carrying a tag that only makes sense on an area.
use std::sync::Arc;

use meridian_geom::{has_self_intersections, spherical_distance, Loc};

use crate::context::RuleContext;
use crate::entity::{Node, Way};
use crate::graph::{Geometry, Graph};
use crate::ident::EntityId;
use crate::issue::{Fix, FixCommand, Issue, IssueInfo, Severity};
use crate::rule::{entity_subject, Rule, RuleError, RuleResult, Subject};
use crate::tags::{tag_suggesting_area, tag_text};

/// Rule id.
pub const ID: &str = "tag_suggests_area";

fn crosses_itself(nodes: &[&Node], closing: bool) -> bool {
    let mut test: Vec<(EntityId, Loc)> = nodes.iter().map(|n| (n.id, n.loc)).collect();
    if !closing {
        test.pop();
    }
    let Some(first) = test.first().copied() else {
        return true;
    };
    test.push(first);
    has_self_intersections(&test, &first.0)
}

/// Picks how the endpoints can be joined without the outline crossing
/// itself, if at all.
fn connect_command(way: &Way, graph: &Graph, merge_threshold_m: f64) -> Result<FixCommand, RuleError> {
    if way.nodes.len() < 3 {
        return Ok(FixCommand::None);
    }
    let nodes = graph.child_nodes(way)?;
    let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
        return Ok(FixCommand::None);
    };
    if spherical_distance(first.loc, last.loc) < merge_threshold_m && !crosses_itself(&nodes, false) {
        return Ok(FixCommand::MergeEndpoints);
    }
    if !crosses_itself(&nodes, true) {
        return Ok(FixCommand::CloseWay);
    }
    Ok(FixCommand::None)
}

/// The tag-suggests-area rule.
#[derive(Debug, Default)]
pub struct TagSuggestsArea;

impl Rule for TagSuggestsArea {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Lines Tagged as Areas"
    }

    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult {
        let entity = entity_subject!(subject);
        let Some(way) = entity.as_way() else {
            return Ok(Vec::new());
        };
        if way.is_closed() {
            return Ok(Vec::new());
        }
        let Some(suggesting) = tag_suggesting_area(&way.tags) else {
            return Ok(Vec::new());
        };
        if cx.presets.match_tags(&suggesting, Geometry::Line)
            == cx.presets.match_tags(&suggesting, Geometry::Area)
        {
            return Ok(Vec::new());
        }

        let connect = connect_command(way, cx.graph, cx.config.endpoint_merge_threshold_m)?;
        let text = tag_text(&suggesting);
        let issue = Issue::builder(ID, Severity::Warning)
            .message(format!(
                "{} should be a closed area based on the tag \"{text}\".",
                cx.label(entity)
            ))
            .tooltip("Areas must have connected endpoints.")
            .entities(vec![Arc::clone(entity)])
            .info(IssueInfo::SuggestedArea { tags: suggesting })
            .fix(Fix::new("Connect the endpoints", connect).icon("close"))
            .fix(Fix::new(format!("Remove {text}"), FixCommand::RemoveTags).icon("remove"))
            .build();
        Ok(vec![Arc::new(issue)])
    }
}
