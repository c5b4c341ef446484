// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Highway ends that stop just short of another highway.
//!
//! Each free end of a highway is extended along its last edge by
//! `almost_junction_extend_m`. If the extension crosses an edge of another
//! highway, and snapping the end onto that crossing would not make the way
//! cross itself, the end is reported.
use std::sync::Arc;

use meridian_geom::{
    has_self_intersections, line_intersection, spherical_distance, vec_interp, Extent, Loc,
};

use crate::context::RuleContext;
use crate::entity::{Entity, Node, Way};
use crate::ident::{EntityId, EntityKind};
use crate::issue::{Fix, FixCommand, Issue, IssueInfo, Severity};
use crate::rule::{entity_subject, Rule, RuleError, RuleResult, Subject};
use crate::tags::has_interesting_tags;
use crate::validations::disconnected_way::is_highway;

/// Rule id.
pub const ID: &str = "almost_junction";

#[derive(Debug)]
struct NearMiss {
    other: Arc<Entity>,
    edge: [EntityId; 2],
    cross_loc: Loc,
}

/// `true` when `tip` is a free end that may be extended.
fn is_extendable_end(way: &Way, tip: &Node, cx: &RuleContext<'_>) -> bool {
    let tag = |k: &str| tip.tags.get(k).map(String::as_str);
    if tag("noexit") == Some("yes") || tag("amenity") == Some("parking_entrance") {
        return false;
    }
    if tag("entrance").is_some_and(|e| e != "no") {
        return false;
    }
    cx.graph.parent_ways(tip.id).len() == 1
        && way.nodes.iter().filter(|n| **n == tip.id).count() == 1
}

fn find_near_miss(
    way: &Way,
    nodes: &[&Node],
    mid: &Node,
    tip: &Node,
    cx: &RuleContext<'_>,
) -> Result<Option<NearMiss>, RuleError> {
    let extend_m = cx.config.almost_junction_extend_m;
    let edge_len = spherical_distance(mid.loc, tip.loc);
    if edge_len <= 0.0 {
        return Ok(None);
    }
    let ext_tip = vec_interp(mid.loc, tip.loc, extend_m / edge_len + 1.0);
    let query = Extent::from_corners(tip.loc, ext_tip);

    for candidate in cx.tree.intersects(&query) {
        if candidate.kind() != EntityKind::Way || candidate == way.id {
            continue;
        }
        let Some(other) = cx.graph.entity(candidate) else {
            continue;
        };
        let Some(other_way) = other.as_way() else {
            continue;
        };
        if !is_highway(&other_way.tags) {
            continue;
        }
        for seg in cx.graph.child_nodes(other_way)?.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            if a.id == tip.id || b.id == tip.id {
                continue;
            }
            let Some(cross_loc) = line_intersection([tip.loc, ext_tip], [a.loc, b.loc]) else {
                continue;
            };
            let moved: Vec<(EntityId, Loc)> = nodes
                .iter()
                .map(|n| (n.id, if n.id == tip.id { cross_loc } else { n.loc }))
                .collect();
            if has_self_intersections(&moved, &tip.id) {
                continue;
            }
            return Ok(Some(NearMiss {
                other: Arc::clone(other),
                edge: [a.id, b.id],
                cross_loc,
            }));
        }
    }
    Ok(None)
}

/// The almost-junction rule.
#[derive(Debug, Default)]
pub struct AlmostJunction;

impl Rule for AlmostJunction {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Almost Junctions"
    }

    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult {
        let entity = entity_subject!(subject);
        let Some(way) = entity.as_way() else {
            return Ok(Vec::new());
        };
        if !is_highway(&way.tags) || way.is_degenerate() || way.is_closed() {
            return Ok(Vec::new());
        }
        let nodes = cx.graph.child_nodes(way)?;
        let last = nodes.len().saturating_sub(1);
        let ends = [(0, 1), (last, last.saturating_sub(1))];

        let mut issues = Vec::new();
        for (tip_idx, mid_idx) in ends {
            let (Some(tip), Some(mid)) = (nodes.get(tip_idx), nodes.get(mid_idx)) else {
                continue;
            };
            if !is_extendable_end(way, tip, cx) {
                continue;
            }
            let Some(miss) = find_near_miss(way, &nodes, mid, tip, cx)? else {
                continue;
            };
            let Some(tip_entity) = cx.graph.entity(tip.id) else {
                continue;
            };

            let mut fixes = vec![Fix::new(
                "Connect these features",
                FixCommand::ConnectAlmostJunction {
                    weld_threshold_m: cx.config.crossing_merge_threshold_m,
                },
            )
            .icon("crossing")];
            if !has_interesting_tags(&tip.tags) {
                fixes.push(
                    Fix::new("Tag this as disconnected", FixCommand::TagAsNoExit).icon("noexit"),
                );
            }
            let issue = Issue::builder(ID, Severity::Warning)
                .message(format!(
                    "{} is very close but not connected to {}.",
                    cx.label(entity),
                    cx.label(&miss.other)
                ))
                .tooltip("Highways that nearly touch should probably be joined.")
                .entities(vec![
                    Arc::clone(entity),
                    Arc::clone(tip_entity),
                    Arc::clone(&miss.other),
                ])
                .loc(tip.loc)
                .hash(format!("{},{}", tip.loc[0], tip.loc[1]))
                .info(IssueInfo::AlmostJunction {
                    mid: mid.id,
                    edge: miss.edge,
                    cross_loc: miss.cross_loc,
                })
                .fixes(fixes)
                .build();
            issues.push(Arc::new(issue));
        }
        Ok(issues)
    }
}
