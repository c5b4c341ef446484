// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Issues, fixes and fix resolution.
//!
//! Issues are immutable once built; their [`IssueId`] is computed in
//! [`IssueBuilder::build`]. A [`Fix`] carries no closure: callers turn it into
//! a concrete [`FixOutcome`] through [`Issue::resolve_fix`], which reads the
//! issue's location and payload against the graph current at that moment.
use std::sync::Arc;

use meridian_geom::{spherical_closest, Extent, Loc};
use tracing::warn;

use crate::actions::Action;
use crate::context::{can_delete, EditMode};
use crate::entity::{Affix, Entity};
use crate::graph::Graph;
use crate::ident::{make_issue_id, EntityId, IssueId};
use crate::tags::{has_tag, Tags};
use crate::validations::crossing_ways::FeatureType;
use crate::validations::many_deletions::DeletionCounts;
use crate::validations::missing_tag::MissingTagKind;

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Severity {
    /// Worth reviewing.
    Warning,
    /// Should be fixed before upload.
    Error,
}

/// Details of a crossing between two ways.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingInfo {
    /// Crossing class, e.g. `highway-waterway` or `bridge-bridge_connectable`.
    pub crossing_type: String,
    /// Feature types, in issue entity order.
    pub feature_types: [FeatureType; 2],
    /// The crossing edge of the validated way, then of the other way.
    pub edges: [[EntityId; 2]; 2],
    /// Tags for a node joining the ways; `None` when joining is not allowed.
    pub connection_tags: Option<Tags>,
}

/// Rule-specific payload attached to an issue.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum IssueInfo {
    /// No payload.
    #[default]
    None,
    /// See [`CrossingInfo`].
    Crossing(CrossingInfo),
    /// Which kind of tags are missing.
    MissingTag(MissingTagKind),
    /// Position of the role-less member inside the relation.
    MissingRole {
        /// Member index.
        member_index: usize,
    },
    /// The tag that suggests an area.
    SuggestedArea {
        /// Suggesting tag(s).
        tags: Tags,
    },
    /// The complete replacement tag set for an outdated entity.
    Outdated {
        /// Upgraded tags.
        upgraded: Tags,
    },
    /// A highway end that nearly touches another highway.
    AlmostJunction {
        /// Way node next to the end node.
        mid: EntityId,
        /// Edge of the other way that the extension crosses.
        edge: [EntityId; 2],
        /// Where the extension crosses that edge.
        cross_loc: Loc,
    },
    /// Deletion tallies for a changeset.
    Deletions(DeletionCounts),
    /// Name of the user rule that matched.
    MapRule {
        /// Rule name.
        name: String,
    },
}

/// Direction for the change-layer fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerDirection {
    /// `layer + 1`, or `1` when unset.
    Higher,
    /// `layer - 1`, or `-1` when unset.
    Lower,
}

/// What a fix does when chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum FixCommand {
    /// Advisory only; the user must act manually.
    None,
    /// Open the preset picker for the first entity.
    SelectPreset,
    /// Resume drawing the first entity (a way) from `vertex`.
    ContinueDrawing {
        /// End node to continue from.
        vertex: EntityId,
    },
    /// Join the two crossing ways.
    ConnectCrossingWays {
        /// Snap distance for reusing an edge node.
        merge_threshold_m: f64,
    },
    /// Shift the selected issue entity one layer up or down.
    ChangeLayer(LayerDirection),
    /// Delete the first entity.
    DeleteFeature,
    /// Merge the first and last nodes of the first entity.
    MergeEndpoints,
    /// Append the first node to the end of the first entity.
    CloseWay,
    /// Remove the area-suggesting tags from the first entity.
    RemoveTags,
    /// Replace the first entity's tags with the upgraded set.
    UpgradeTags,
    /// Move the outer way's tags onto the multipolygon relation.
    MoveTagsToRelation,
    /// Set the role of the role-less member.
    SetMemberRole {
        /// Role to assign.
        role: &'static str,
    },
    /// Drop the role-less member from the relation.
    RemoveFromRelation,
    /// Connect the almost-junction end node to the other way.
    ConnectAlmostJunction {
        /// Snap distance for reusing an edge node.
        weld_threshold_m: f64,
    },
    /// Tag the almost-junction end node `noexit=yes`.
    TagAsNoExit,
}

/// A suggested fix for an issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    /// Icon name for UIs.
    pub icon: Option<&'static str>,
    /// Short imperative title.
    pub title: String,
    /// What choosing the fix does.
    pub command: FixCommand,
    /// Entities to highlight while hovering the fix.
    pub entity_ids: Vec<EntityId>,
}

impl Fix {
    /// Fix without icon or highlight ids.
    #[must_use]
    pub fn new(title: impl Into<String>, command: FixCommand) -> Self {
        Self {
            icon: None,
            title: title.into(),
            command,
            entity_ids: Vec::new(),
        }
    }

    /// Sets the icon.
    #[must_use]
    pub fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Sets the highlight ids.
    #[must_use]
    pub fn highlight(mut self, ids: Vec<EntityId>) -> Self {
        self.entity_ids = ids;
        self
    }

    /// `true` when choosing the fix does something.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.command != FixCommand::None
    }
}

/// Result of resolving a fix against the current editor state.
#[derive(Debug, Clone, PartialEq)]
pub enum FixOutcome {
    /// Perform `action` on the history with `annotation`.
    Edit {
        /// Graph edit.
        action: Action,
        /// Undo-stack label.
        annotation: String,
    },
    /// Open the preset picker for `entity`.
    SelectPreset {
        /// Entity to retag.
        entity: EntityId,
    },
    /// Enter draw mode continuing `way` from `vertex`.
    ContinueDrawing {
        /// Way to extend.
        way: EntityId,
        /// End node to continue from.
        vertex: EntityId,
        /// Which end `vertex` is.
        affix: Affix,
    },
}

fn edit(action: Action, annotation: &str) -> FixOutcome {
    FixOutcome::Edit {
        action,
        annotation: annotation.to_owned(),
    }
}

/// A validation finding.
#[derive(Debug, Clone)]
pub struct Issue {
    id: IssueId,
    rule: String,
    severity: Severity,
    message: String,
    tooltip: String,
    entities: Vec<Arc<Entity>>,
    loc: Option<Loc>,
    info: IssueInfo,
    fixes: Vec<Fix>,
    hash: Option<String>,
}

impl PartialEq for Issue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Issue {}

impl Issue {
    /// Starts building an issue of type `rule`.
    #[must_use]
    pub fn builder(rule: impl Into<String>, severity: Severity) -> IssueBuilder {
        IssueBuilder {
            rule: rule.into(),
            severity,
            message: String::new(),
            tooltip: String::new(),
            entities: Vec::new(),
            loc: None,
            info: IssueInfo::None,
            fixes: Vec::new(),
            hash: None,
        }
    }

    /// Deterministic identity.
    #[must_use]
    pub fn id(&self) -> IssueId {
        self.id
    }

    /// Rule id (the issue type).
    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Longer explanation.
    #[must_use]
    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }

    /// Entity snapshots the issue is about, in rule-defined order.
    #[must_use]
    pub fn entities(&self) -> &[Arc<Entity>] {
        &self.entities
    }

    /// Ids of [`Issue::entities`].
    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id()).collect()
    }

    /// Location, when the issue is pinned to a point.
    #[must_use]
    pub fn loc(&self) -> Option<Loc> {
        self.loc
    }

    /// Rule-specific payload.
    #[must_use]
    pub fn info(&self) -> &IssueInfo {
        &self.info
    }

    /// Suggested fixes in display order.
    #[must_use]
    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    /// Differentiator folded into the id.
    #[must_use]
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// Extent to frame the issue: its location, else the union of its
    /// entities' extents in `graph`.
    #[must_use]
    pub fn extent(&self, graph: &Graph) -> Option<Extent> {
        if let Some(loc) = self.loc {
            return Some(Extent::from_point(loc));
        }
        self.entities
            .iter()
            .filter_map(|e| graph.extent(e.id()))
            .reduce(|a, b| a.union(&b))
    }

    /// Turns fix `index` into something the caller can execute.
    ///
    /// Returns `None` for advisory fixes, out-of-range indices, and whenever
    /// the entities the fix needs are gone from `graph` or no longer have the
    /// expected shape.
    #[must_use]
    pub fn resolve_fix(&self, index: usize, graph: &Graph, mode: &EditMode) -> Option<FixOutcome> {
        let fix = self.fixes.get(index)?;
        let outcome = self.resolve(fix, graph, mode);
        if outcome.is_none() && fix.is_actionable() {
            warn!(issue = %self.id, fix = %fix.title, "fix skipped; it no longer applies");
        }
        outcome
    }

    fn resolve(&self, fix: &Fix, graph: &Graph, mode: &EditMode) -> Option<FixOutcome> {
        let first = self.entities.first()?.id();
        match &fix.command {
            FixCommand::None => None,
            FixCommand::SelectPreset => graph
                .has_entity(first)
                .then_some(FixOutcome::SelectPreset { entity: first }),
            FixCommand::ContinueDrawing { vertex } => {
                let way = graph.way(first)?;
                let affix = way.affix(*vertex)?;
                let end = graph.node(*vertex)?;
                (end.tags.get("noexit").map(String::as_str) != Some("yes")).then_some(
                    FixOutcome::ContinueDrawing {
                        way: first,
                        vertex: *vertex,
                        affix,
                    },
                )
            }
            FixCommand::ConnectCrossingWays { merge_threshold_m } => {
                let IssueInfo::Crossing(info) = &self.info else {
                    return None;
                };
                let tags = info.connection_tags.clone()?;
                let loc = self.loc?;
                if info.edges.iter().flatten().any(|n| graph.node(*n).is_none()) {
                    return None;
                }
                Some(edit(
                    Action::ConnectCrossingWays {
                        loc,
                        tags,
                        edges: info.edges,
                        merge_threshold_m: *merge_threshold_m,
                    },
                    "Connected crossing features.",
                ))
            }
            FixCommand::ChangeLayer(direction) => {
                let selected = mode.single_selection()?;
                if !self.entities.iter().any(|e| e.id() == selected) {
                    return None;
                }
                let entity = graph.entity(selected)?;
                let mut tags = entity.tags().clone();
                let layer = tags
                    .get("layer")
                    .and_then(|l| l.trim().parse::<f64>().ok())
                    .filter(|l| l.is_normal());
                // Fractional layers step by one too: 1.5 goes to 2.5 or 0.5.
                let next = match (layer, direction) {
                    (Some(l), LayerDirection::Higher) => l + 1.0,
                    (Some(l), LayerDirection::Lower) => l - 1.0,
                    (None, LayerDirection::Higher) => 1.0,
                    (None, LayerDirection::Lower) => -1.0,
                };
                tags.insert("layer".to_owned(), next.to_string());
                Some(edit(
                    Action::ChangeTags { id: selected, tags },
                    "Changed the tags.",
                ))
            }
            FixCommand::DeleteFeature => can_delete(graph, first).then(|| {
                edit(Action::DeleteEntity { id: first }, "Deleted a feature.")
            }),
            FixCommand::MergeEndpoints => {
                let way = graph.way(first)?;
                let (a, b) = (way.first()?, way.last()?);
                let loc = graph.node(a)?.loc;
                graph.node(b)?;
                Some(edit(
                    Action::MergeNodes {
                        ids: vec![a, b],
                        loc: Some(loc),
                    },
                    "Connected a way's endpoints.",
                ))
            }
            FixCommand::CloseWay => {
                let way = graph.way(first)?;
                Some(edit(
                    Action::AddVertex {
                        way: first,
                        node: way.first()?,
                        index: way.nodes.len(),
                    },
                    "Connected a way's endpoints.",
                ))
            }
            FixCommand::RemoveTags => {
                let IssueInfo::SuggestedArea { tags: suggesting } = &self.info else {
                    return None;
                };
                let mut tags = graph.entity(first)?.tags().clone();
                tags.retain(|k, _| !suggesting.contains_key(k));
                Some(edit(Action::ChangeTags { id: first, tags }, "Removed tags."))
            }
            FixCommand::UpgradeTags => {
                let IssueInfo::Outdated { upgraded } = &self.info else {
                    return None;
                };
                graph.entity(first)?;
                Some(edit(
                    Action::ChangeTags {
                        id: first,
                        tags: upgraded.clone(),
                    },
                    "Upgraded old tags.",
                ))
            }
            FixCommand::MoveTagsToRelation => {
                let way = graph.way(first)?;
                let relation = graph.relation(self.entities.get(1)?.id())?;
                let mut tags = relation.tags.clone();
                for (k, v) in &way.tags {
                    if k != "area" {
                        tags.insert(k.clone(), v.clone());
                    }
                }
                Some(edit(
                    Action::Sequence(vec![
                        Action::ChangeTags {
                            id: relation.id,
                            tags,
                        },
                        Action::ChangeTags {
                            id: way.id,
                            tags: Tags::new(),
                        },
                    ]),
                    "Moved tags to the multipolygon.",
                ))
            }
            FixCommand::SetMemberRole { role } => {
                let IssueInfo::MissingRole { member_index } = &self.info else {
                    return None;
                };
                let relation = graph.relation(first)?;
                let member = relation.members.get(*member_index)?;
                (Some(member.id) == self.entities.get(1).map(|e| e.id())).then(|| {
                    edit(
                        Action::ChangeMemberRole {
                            relation: first,
                            index: *member_index,
                            role: (*role).to_owned(),
                        },
                        "Changed a member's role.",
                    )
                })
            }
            FixCommand::RemoveFromRelation => {
                let IssueInfo::MissingRole { member_index } = &self.info else {
                    return None;
                };
                let relation = graph.relation(first)?;
                relation.members.get(*member_index)?;
                Some(edit(
                    Action::RemoveMember {
                        relation: first,
                        index: *member_index,
                    },
                    "Removed a member from a relation.",
                ))
            }
            FixCommand::ConnectAlmostJunction { weld_threshold_m } => {
                let IssueInfo::AlmostJunction {
                    edge, cross_loc, ..
                } = &self.info
                else {
                    return None;
                };
                let end = graph.node(self.entities.get(1)?.id())?;
                let locs = [graph.node(edge[0])?.loc, graph.node(edge[1])?.loc];
                let action = match spherical_closest(&locs, *cross_loc) {
                    Some((idx, dist)) if dist < *weld_threshold_m => Action::MergeNodes {
                        ids: vec![edge[idx], end.id],
                        loc: Some(locs[idx]),
                    },
                    _ => Action::AddMidpoint {
                        node: end.id,
                        loc: *cross_loc,
                        edge: *edge,
                    },
                };
                Some(edit(action, "Connected a way to another."))
            }
            FixCommand::TagAsNoExit => {
                let node = graph.node(self.entities.get(1)?.id())?;
                if has_tag(&node.tags, "noexit") {
                    return None;
                }
                let mut tags = node.tags.clone();
                tags.insert("noexit".to_owned(), "yes".to_owned());
                Some(edit(
                    Action::ChangeTags { id: node.id, tags },
                    "Tagged a way end as disconnected.",
                ))
            }
        }
    }
}

/// Builder for [`Issue`].
#[derive(Debug)]
pub struct IssueBuilder {
    rule: String,
    severity: Severity,
    message: String,
    tooltip: String,
    entities: Vec<Arc<Entity>>,
    loc: Option<Loc>,
    info: IssueInfo,
    fixes: Vec<Fix>,
    hash: Option<String>,
}

impl IssueBuilder {
    /// Sets the message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the tooltip.
    #[must_use]
    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    /// Sets the entities.
    #[must_use]
    pub fn entities(mut self, entities: Vec<Arc<Entity>>) -> Self {
        self.entities = entities;
        self
    }

    /// Pins the issue to a location.
    #[must_use]
    pub fn loc(mut self, loc: Loc) -> Self {
        self.loc = Some(loc);
        self
    }

    /// Attaches a payload.
    #[must_use]
    pub fn info(mut self, info: IssueInfo) -> Self {
        self.info = info;
        self
    }

    /// Appends a fix.
    #[must_use]
    pub fn fix(mut self, fix: Fix) -> Self {
        self.fixes.push(fix);
        self
    }

    /// Appends fixes.
    #[must_use]
    pub fn fixes(mut self, fixes: impl IntoIterator<Item = Fix>) -> Self {
        self.fixes.extend(fixes);
        self
    }

    /// Sets the differentiator.
    #[must_use]
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Finalizes the issue and computes its id.
    #[must_use]
    pub fn build(self) -> Issue {
        let keys: Vec<_> = self.entities.iter().map(|e| e.key()).collect();
        let id = make_issue_id(&self.rule, self.hash.as_deref(), &keys, self.loc);
        Issue {
            id,
            rule: self.rule,
            severity: self.severity,
            message: self.message,
            tooltip: self.tooltip,
            entities: self.entities,
            loc: self.loc,
            info: self.info,
            fixes: self.fixes,
            hash: self.hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Node, Way};
    use crate::tags::tags_from;

    fn graph() -> Graph {
        graph_with_layer("2")
    }

    fn graph_with_layer(layer: &str) -> Graph {
        let node = |n: i64, loc: Loc| {
            Entity::Node(Node {
                id: EntityId::node(n),
                loc,
                tags: Tags::new(),
                version: Some(1),
                revision: 0,
            })
        };
        Graph::from_entities([
            node(1, [0.0, 0.0]),
            node(2, [0.001, 0.0]),
            Entity::Way(Way {
                id: EntityId::way(1),
                nodes: vec![EntityId::node(1), EntityId::node(2)],
                tags: tags_from([("highway", "residential"), ("layer", layer)]),
                version: Some(1),
                revision: 0,
            }),
        ])
    }

    fn issue(graph: &Graph) -> Issue {
        let way = Arc::clone(graph.entity(EntityId::way(1)).unwrap());
        Issue::builder("test", Severity::Warning)
            .entities(vec![way])
            .fix(Fix::new("Move it", FixCommand::None))
            .fix(Fix::new("Up", FixCommand::ChangeLayer(LayerDirection::Higher)))
            .fix(Fix::new("Delete", FixCommand::DeleteFeature))
            .build()
    }

    #[test]
    fn advisory_and_out_of_range_fixes_resolve_to_none() {
        let g = graph();
        let issue = issue(&g);
        assert_eq!(issue.resolve_fix(0, &g, &EditMode::Browse), None);
        assert_eq!(issue.resolve_fix(9, &g, &EditMode::Browse), None);
    }

    #[test]
    fn change_layer_requires_selected_issue_entity() {
        let g = graph();
        let issue = issue(&g);
        assert_eq!(issue.resolve_fix(1, &g, &EditMode::Browse), None);
        let mode = EditMode::Select(vec![EntityId::way(1)]);
        let expected = tags_from([("highway", "residential"), ("layer", "3")]);
        assert_eq!(
            issue.resolve_fix(1, &g, &mode),
            Some(FixOutcome::Edit {
                action: Action::ChangeTags {
                    id: EntityId::way(1),
                    tags: expected,
                },
                annotation: "Changed the tags.".to_owned(),
            })
        );
    }

    #[test]
    fn change_layer_keeps_fractional_layers() {
        let mode = EditMode::Select(vec![EntityId::way(1)]);
        let layer_after = |layer: &str, fix: usize| {
            let g = graph_with_layer(layer);
            let issue = Issue::builder("test", Severity::Warning)
                .entities(vec![Arc::clone(g.entity(EntityId::way(1)).unwrap())])
                .fixes(vec![
                    Fix::new("Up", FixCommand::ChangeLayer(LayerDirection::Higher)),
                    Fix::new("Down", FixCommand::ChangeLayer(LayerDirection::Lower)),
                ])
                .build();
            match issue.resolve_fix(fix, &g, &mode) {
                Some(FixOutcome::Edit {
                    action: Action::ChangeTags { tags, .. },
                    ..
                }) => tags.get("layer").cloned(),
                _ => None,
            }
        };
        assert_eq!(layer_after("1.5", 0).as_deref(), Some("2.5"));
        assert_eq!(layer_after("1.5", 1).as_deref(), Some("0.5"));
        assert_eq!(layer_after("-1", 1).as_deref(), Some("-2"));
        assert_eq!(layer_after("bogus", 0).as_deref(), Some("1"));
        assert_eq!(layer_after("0", 1).as_deref(), Some("-1"));
    }

    #[test]
    fn stale_entities_make_fixes_unavailable() {
        let g = graph();
        let issue = issue(&g);
        let empty = Graph::new();
        assert_eq!(issue.resolve_fix(2, &empty, &EditMode::Browse), None);
        assert!(matches!(
            issue.resolve_fix(2, &g, &EditMode::Browse),
            Some(FixOutcome::Edit { .. })
        ));
    }

    #[test]
    fn extent_prefers_loc() {
        let g = graph();
        let unpinned = issue(&g);
        let extent = unpinned.extent(&g).unwrap();
        assert_eq!(extent.max(), [0.001, 0.0]);
        let pinned = Issue::builder("test", Severity::Error).loc([3.0, 4.0]).build();
        assert_eq!(pinned.extent(&g), Some(Extent::from_point([3.0, 4.0])));
        assert_ne!(pinned.id(), unpinned.id());
    }
}
