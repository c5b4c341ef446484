// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Changesets that delete an unusually large number of features.
use std::sync::Arc;

use crate::context::RuleContext;
use crate::entity::Entity;
use crate::history::Changes;
use crate::issue::{Issue, IssueInfo, Severity};
use crate::rule::{Rule, RuleInput, RuleResult, Subject};

/// Rule id.
pub const ID: &str = "many_deletions";

/// Deleted entities by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionCounts {
    /// Nodes.
    pub points: usize,
    /// Ways that are not areas.
    pub lines: usize,
    /// Closed ways with area tags.
    pub areas: usize,
    /// Relations.
    pub relations: usize,
}

impl DeletionCounts {
    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.points + self.lines + self.areas + self.relations
    }
}

fn count(changes: &Changes, cx: &RuleContext<'_>) -> DeletionCounts {
    let mut counts = DeletionCounts::default();
    for entity in &changes.deleted {
        match entity.as_ref() {
            Entity::Node(_) => counts.points += 1,
            Entity::Way(w) if cx.graph.is_area(w) => counts.areas += 1,
            Entity::Way(_) => counts.lines += 1,
            Entity::Relation(_) => counts.relations += 1,
        }
    }
    counts
}

/// The many-deletions rule.
#[derive(Debug, Default)]
pub struct ManyDeletions;

impl Rule for ManyDeletions {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Many Deletions"
    }

    fn input(&self) -> RuleInput {
        RuleInput::Changes
    }

    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult {
        let Subject::Changes(changes) = subject else {
            return Ok(Vec::new());
        };
        let counts = count(changes, cx);
        let total = counts.total();
        if total <= cx.config.many_deletions_threshold {
            return Ok(Vec::new());
        }
        let issue = Issue::builder(ID, Severity::Warning)
            .message(format!(
                "Deleting {total} features: {} points, {} lines, {} areas and {} relations.",
                counts.points, counts.lines, counts.areas, counts.relations
            ))
            .tooltip("Only redundant or nonexistent features should be deleted.")
            .hash(total.to_string())
            .info(IssueInfo::Deletions(counts))
            .build();
        Ok(vec![Arc::new(issue)])
    }
}
