// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-entity rule ordering and short-circuiting.
//!
//! The pipeline is a fixed step table followed by every other entity-scoped
//! rule in registry order. Each rule runs at most once per entity. Disabled
//! and unregistered rules count as ran and passed without executing.
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::context::RuleContext;
use crate::entity::Entity;
use crate::ident::EntityKind;
use crate::issue::Issue;
use crate::registry::RuleRegistry;
use crate::rule::Subject;
use crate::validations::{
    almost_junction, crossing_ways, disconnected_way, missing_role, missing_tag,
    old_multipolygon, outdated_tags, tag_suggests_area,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applies {
    Any,
    Relation,
    Way,
}

impl Applies {
    fn matches(self, kind: EntityKind) -> bool {
        match self {
            Self::Any => true,
            Self::Relation => kind == EntityKind::Relation,
            Self::Way => kind == EntityKind::Way,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Then {
    Continue,
    /// Stop the pipeline for this entity.
    Stop,
    /// Record another rule as ran with no issues.
    MarkRan(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct Step {
    rule: &'static str,
    applies: Applies,
    on_pass: Then,
    on_issues: Then,
}

const fn step(rule: &'static str, applies: Applies, on_pass: Then, on_issues: Then) -> Step {
    Step {
        rule,
        applies,
        on_pass,
        on_issues,
    }
}

const STEPS: &[Step] = &[
    step(missing_role::ID, Applies::Any, Then::Continue, Then::Continue),
    step(
        old_multipolygon::ID,
        Applies::Relation,
        Then::MarkRan(missing_tag::ID),
        Then::Continue,
    ),
    step(missing_tag::ID, Applies::Any, Then::Continue, Then::Stop),
    step(outdated_tags::ID, Applies::Any, Then::Continue, Then::Continue),
    step(crossing_ways::ID, Applies::Way, Then::Continue, Then::Continue),
    step(
        almost_junction::ID,
        Applies::Way,
        Then::Continue,
        Then::MarkRan(disconnected_way::ID),
    ),
    step(disconnected_way::ID, Applies::Way, Then::Continue, Then::Continue),
    step(tag_suggests_area::ID, Applies::Way, Then::Continue, Then::Continue),
];

struct Run<'r, 'c> {
    registry: &'r mut RuleRegistry,
    cx: &'c RuleContext<'c>,
    entity: &'c Arc<Entity>,
    ran: BTreeSet<&'static str>,
    issues: Vec<Arc<Issue>>,
}

impl Run<'_, '_> {
    /// Runs `rule` unless it already ran; returns `true` when it passed.
    fn run(&mut self, rule: &'static str) -> bool {
        if !self.ran.insert(rule) || self.cx.config.is_disabled(rule) {
            return true;
        }
        let Some(r) = self.registry.get_mut(rule) else {
            return true;
        };
        match r.evaluate(Subject::Entity(self.entity), self.cx) {
            Ok(found) => {
                let passed = found.is_empty();
                self.issues.extend(found);
                passed
            }
            Err(err) => {
                warn!(rule, entity = %self.entity.id(), %err, "rule failed; treating as passed");
                true
            }
        }
    }
}

/// Validates one entity against every enabled entity-scoped rule.
pub(crate) fn validate_entity(
    registry: &mut RuleRegistry,
    cx: &RuleContext<'_>,
    entity: &Arc<Entity>,
) -> Vec<Arc<Issue>> {
    let remaining = registry.entity_rule_ids();
    let mut run = Run {
        registry,
        cx,
        entity,
        ran: BTreeSet::new(),
        issues: Vec::new(),
    };
    let kind = entity.kind();

    for step in STEPS.iter().filter(|s| s.applies.matches(kind)) {
        let passed = run.run(step.rule);
        match if passed { step.on_pass } else { step.on_issues } {
            Then::Continue => {}
            Then::Stop => {
                trace!(entity = %entity.id(), rule = step.rule, "pipeline stopped");
                return run.issues;
            }
            Then::MarkRan(other) => {
                run.ran.insert(other);
            }
        }
    }
    for rule in remaining {
        run.run(rule);
    }
    trace!(entity = %entity.id(), issues = run.issues.len(), "entity validated");
    run.issues
}
