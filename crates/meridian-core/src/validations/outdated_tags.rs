// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deprecated tags with a known replacement.
use std::sync::Arc;

use crate::context::RuleContext;
use crate::issue::{Fix, FixCommand, Issue, IssueInfo, Severity};
use crate::rule::{entity_subject, Rule, RuleResult, Subject};
use crate::tags::{tag_text, Tags};

/// Rule id.
pub const ID: &str = "outdated_tags";

/// Wildcard value in [`DEPRECATED`]; `$1` in a replacement is the matched value.
const ANY: &str = "*";

type Pairs = &'static [(&'static str, &'static str)];

/// `(old, replacement)` pairs.
const DEPRECATED: &[(Pairs, Pairs)] = &[
    (&[("amenity", "firepit")], &[("leisure", "firepit")]),
    (&[("amenity", "swimming_pool")], &[("leisure", "swimming_pool")]),
    (&[("amenity", "toilet")], &[("amenity", "toilets")]),
    (&[("barrier", "wire_fence")], &[("barrier", "fence"), ("fence_type", "chain")]),
    (&[("building", "home")], &[("building", "house")]),
    (&[("highway", "ford")], &[("ford", "yes")]),
    (&[("highway", "stile")], &[("barrier", "stile")]),
    (&[("highway", "unsurfaced")], &[("highway", "road"), ("surface", "unpaved")]),
    (&[("natural", "marsh")], &[("natural", "wetland"), ("wetland", "marsh")]),
    (&[("natural", "waterfall")], &[("waterway", "waterfall")]),
    (&[("power", "sub_station")], &[("power", "substation")]),
    (&[("power_rating", ANY)], &[("generator:output", "$1")]),
    (&[("power_source", ANY)], &[("generator:source", "$1")]),
    (&[("shop", "fish")], &[("shop", "seafood")]),
    (&[("shop", "organic")], &[("shop", "supermarket"), ("organic", "only")]),
];

/// Applies every matching deprecation in table order.
///
/// Returns the complete upgraded tag set, or `None` when nothing changed.
#[must_use]
pub fn upgrade_tags(tags: &Tags) -> Option<Tags> {
    let mut upgraded = tags.clone();
    for (old, replacement) in DEPRECATED {
        let mut matched = None;
        let all = old.iter().all(|(k, v)| match upgraded.get(*k) {
            Some(value) if *v == ANY => {
                matched = Some(value.clone());
                true
            }
            Some(value) => value.as_str() == *v,
            None => false,
        });
        if !all {
            continue;
        }
        for (k, _) in *old {
            upgraded.remove(*k);
        }
        for (k, v) in *replacement {
            let value = match (&matched, *v) {
                (Some(m), "$1") => m.clone(),
                _ => (*v).to_owned(),
            };
            upgraded.insert((*k).to_owned(), value);
        }
    }
    (upgraded != *tags).then_some(upgraded)
}

/// The outdated-tags rule.
#[derive(Debug, Default)]
pub struct OutdatedTags;

impl Rule for OutdatedTags {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Outdated Tags"
    }

    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult {
        let entity = entity_subject!(subject);
        let Some(upgraded) = upgrade_tags(entity.tags()) else {
            return Ok(Vec::new());
        };
        let issue = Issue::builder(ID, Severity::Warning)
            .message(format!("{} has outdated tags.", cx.label(entity)))
            .tooltip(format!("Suggested tags: {}.", tag_text(&upgraded)))
            .entities(vec![Arc::clone(entity)])
            .hash(tag_text(&upgraded))
            .info(IssueInfo::Outdated { upgraded })
            .fix(Fix::new("Upgrade the tags", FixCommand::UpgradeTags).icon("upgrade"))
            .build();
        Ok(vec![Arc::new(issue)])
    }
}
