// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Features with no meaningful tags.
use std::sync::Arc;

use crate::context::RuleContext;
use crate::entity::Entity;
use crate::graph::Geometry;
use crate::issue::{Fix, FixCommand, Issue, IssueInfo, Severity};
use crate::rule::{entity_subject, Rule, RuleResult, Subject};
use crate::tags::{is_interesting_key, Tags};

/// Rule id.
pub const ID: &str = "missing_tag";

/// Which tags are missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissingTagKind {
    /// No tags at all.
    Any,
    /// Only attribution, `name` or `area` tags.
    Descriptive,
    /// A relation without `type`.
    Specific,
}

impl MissingTagKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Descriptive => "descriptive",
            Self::Specific => "specific",
        }
    }
}

fn descriptive_key_count(tags: &Tags) -> usize {
    tags.keys()
        .filter(|k| is_interesting_key(k) && *k != "area" && *k != "name")
        .count()
}

/// The validator only runs this rule on a relation after `old_multipolygon`
/// reported it, which implies a typed multipolygon; the other relation
/// branches serve callers evaluating the rule on its own.
fn missing_kind(entity: &Entity) -> Option<MissingTagKind> {
    let tags = entity.tags();
    if tags.is_empty() {
        return Some(MissingTagKind::Any);
    }
    let count = descriptive_key_count(tags);
    let is_relation = entity.as_relation().is_some();
    let is_multipolygon = entity.as_relation().is_some_and(|r| r.is_multipolygon());
    if count == 0 || (is_relation && count == 1 && !is_multipolygon) {
        return Some(MissingTagKind::Descriptive);
    }
    if is_relation && !tags.contains_key("type") {
        return Some(MissingTagKind::Specific);
    }
    None
}

/// The missing-tag rule.
#[derive(Debug, Default)]
pub struct MissingTag;

impl Rule for MissingTag {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Missing Tags"
    }

    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult {
        let entity = entity_subject!(subject);
        let id = entity.id();
        if cx.graph.geometry(entity) == Geometry::Vertex
            || cx.graph.is_member(id)
            || cx.mode.is_drawing_new(id)
        {
            return Ok(Vec::new());
        }
        let Some(kind) = missing_kind(entity) else {
            return Ok(Vec::new());
        };

        let deletable = cx.can_delete(id);
        let edited = entity.version().is_none() || entity.revision() > 0;
        let severity = if edited && deletable {
            Severity::Error
        } else {
            Severity::Warning
        };

        let mut fixes = vec![Fix::new("Choose a feature type", FixCommand::SelectPreset).icon("search")];
        if deletable {
            fixes.push(Fix::new("Delete this feature", FixCommand::DeleteFeature).icon("delete"));
        }

        let label = cx.label(entity);
        let message = match kind {
            MissingTagKind::Any => format!("{label} has no tags."),
            MissingTagKind::Descriptive => format!("{label} has no descriptive tags."),
            MissingTagKind::Specific => format!("{label} has no relation type."),
        };
        let issue = Issue::builder(ID, severity)
            .message(message)
            .tooltip("Features must have tags that define what they are.")
            .entities(vec![Arc::clone(entity)])
            .info(IssueInfo::MissingTag(kind))
            .hash(kind.as_str())
            .fixes(fixes)
            .build();
        Ok(vec![Arc::new(issue)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Member, Relation};
    use crate::ident::EntityId;
    use crate::tags::tags_from;

    fn relation(tags: Tags) -> Entity {
        Entity::Relation(Relation {
            id: EntityId::relation(1),
            members: vec![Member {
                id: EntityId::way(1),
                role: "outer".to_owned(),
            }],
            tags,
            version: Some(1),
            revision: 0,
        })
    }

    #[test]
    fn kinds_follow_descriptive_key_counts() {
        assert_eq!(missing_kind(&relation(Tags::new())), Some(MissingTagKind::Any));
        assert_eq!(
            missing_kind(&relation(tags_from([("name", "x"), ("source", "survey")]))),
            Some(MissingTagKind::Descriptive)
        );
        assert_eq!(
            missing_kind(&relation(tags_from([("type", "route")]))),
            Some(MissingTagKind::Descriptive)
        );
        assert_eq!(missing_kind(&relation(tags_from([("type", "multipolygon")]))), None);
        assert_eq!(
            missing_kind(&relation(tags_from([("building", "yes"), ("name", "x"), ("landuse", "farm")]))),
            Some(MissingTagKind::Specific)
        );
        assert_eq!(
            missing_kind(&relation(tags_from([("type", "route"), ("route", "bus")]))),
            None
        );
    }
}
