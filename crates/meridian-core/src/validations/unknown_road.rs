// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Roads of unknown classification (`highway=road`).
use std::sync::Arc;

use crate::context::RuleContext;
use crate::issue::{Fix, FixCommand, Issue, Severity};
use crate::rule::{entity_subject, Rule, RuleResult, Subject};

/// Rule id.
pub const ID: &str = "unknown_road";

/// The unknown-road rule.
#[derive(Debug, Default)]
pub struct UnknownRoad;

impl Rule for UnknownRoad {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Unknown Roads"
    }

    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult {
        let entity = entity_subject!(subject);
        let Some(way) = entity.as_way() else {
            return Ok(Vec::new());
        };
        if way.tags.get("highway").map(String::as_str) != Some("road") {
            return Ok(Vec::new());
        }
        let issue = Issue::builder(ID, Severity::Warning)
            .message(format!("{} has no classification.", cx.label(entity)))
            .tooltip("Roads without a specific type may not appear in maps or routing.")
            .entities(vec![Arc::clone(entity)])
            .fix(Fix::new("Choose a road type", FixCommand::SelectPreset).icon("search"))
            .fix(Fix::new("Delete this feature", FixCommand::DeleteFeature).icon("delete"))
            .build();
        Ok(vec![Arc::new(issue)])
    }
}
