// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! User-configured tag rules.
use std::sync::Arc;

use crate::config::MapRuleSpec;
use crate::context::RuleContext;
use crate::entity::Entity;
use crate::graph::Geometry;
use crate::issue::{Issue, IssueInfo};
use crate::registry::MAPRULES;
use crate::rule::{entity_subject, Rule, RuleResult, Subject};
use crate::tags::has_tag;

/// Rule id.
pub const ID: &str = MAPRULES;

/// `true` when `entity` with `geometry` satisfies every condition of `spec`.
#[must_use]
pub fn matches(spec: &MapRuleSpec, entity: &Entity, geometry: Geometry) -> bool {
    let tags = entity.tags();
    (spec.geometry.is_empty() || spec.geometry.contains(&geometry))
        && spec.equals.iter().all(|(k, v)| tags.get(k) == Some(v))
        && spec.present.iter().all(|k| has_tag(tags, k))
        && spec.absent.iter().all(|k| !tags.contains_key(k))
}

/// Evaluates [`crate::ValidatorConfig::maprules`].
#[derive(Debug, Default)]
pub struct MapRules;

impl Rule for MapRules {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Custom Rules"
    }

    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult {
        let entity = entity_subject!(subject);
        let geometry = cx.graph.geometry(entity);
        let issues = cx
            .config
            .maprules
            .iter()
            .filter(|spec| matches(spec, entity, geometry))
            .map(|spec| {
                Arc::new(
                    Issue::builder(ID, spec.severity)
                        .message(spec.message.clone())
                        .entities(vec![Arc::clone(entity)])
                        .hash(spec.name.clone())
                        .info(IssueInfo::MapRule {
                            name: spec.name.clone(),
                        })
                        .build(),
                )
            })
            .collect();
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Node;
    use crate::ident::EntityId;
    use crate::issue::Severity;
    use crate::tags::{tags_from, Tags};

    fn spec() -> MapRuleSpec {
        MapRuleSpec {
            name: "shops need names".to_owned(),
            geometry: vec![Geometry::Point],
            equals: tags_from([("shop", "bakery")]),
            present: Vec::new(),
            absent: vec!["name".to_owned()],
            severity: Severity::Error,
            message: "Bakery without a name.".to_owned(),
        }
    }

    fn point(tags: Tags) -> Entity {
        Entity::Node(Node {
            id: EntityId::node(1),
            loc: [0.0, 0.0],
            tags,
            version: Some(1),
            revision: 0,
        })
    }

    #[test]
    fn conditions_combine() {
        let spec = spec();
        let unnamed = point(tags_from([("shop", "bakery")]));
        assert!(matches(&spec, &unnamed, Geometry::Point));
        assert!(!matches(&spec, &unnamed, Geometry::Area));
        let named = point(tags_from([("shop", "bakery"), ("name", "Crumbs")]));
        assert!(!matches(&spec, &named, Geometry::Point));
        assert!(!matches(&spec, &point(tags_from([("shop", "butcher")])), Geometry::Point));
    }
}
