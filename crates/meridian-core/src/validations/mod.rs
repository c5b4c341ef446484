// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Built-in validation rules.
use tracing::warn;

use crate::registry::RuleRegistry;
use crate::rule::Rule;

pub mod almost_junction;
pub mod crossing_ways;
pub mod disconnected_way;
pub mod many_deletions;
pub mod maprules;
pub mod missing_role;
pub mod missing_tag;
pub mod old_multipolygon;
pub mod outdated_tags;
pub mod tag_suggests_area;
pub mod unknown_road;

/// Registry holding every built-in rule.
///
/// Registration order is the pipeline order for rules without a fixed step:
/// `unknown_road` and `maprules` run after the stepped rules.
#[must_use]
pub fn default_registry() -> RuleRegistry {
    let rules: Vec<Box<dyn Rule>> = vec![
        Box::new(missing_role::MissingRole),
        Box::new(old_multipolygon::OldMultipolygon),
        Box::new(missing_tag::MissingTag),
        Box::new(outdated_tags::OutdatedTags),
        Box::new(crossing_ways::CrossingWays::new()),
        Box::new(almost_junction::AlmostJunction),
        Box::new(disconnected_way::DisconnectedWay),
        Box::new(tag_suggests_area::TagSuggestsArea),
        Box::new(unknown_road::UnknownRoad),
        Box::new(maprules::MapRules),
        Box::new(many_deletions::ManyDeletions),
    ];
    let mut registry = RuleRegistry::new();
    for rule in rules {
        if let Err(err) = registry.register(rule) {
            warn!(%err, "skipping built-in rule");
        }
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_lists_every_rule() {
        let registry = default_registry();
        assert_eq!(registry.len(), 11);
        assert_eq!(registry.changes_rule_ids(), vec![many_deletions::ID]);
        let shown = registry.display_ids();
        assert!(!shown.contains(&maprules::ID));
        assert!(!shown.contains(&many_deletions::ID));
        assert_eq!(shown.len(), 9);
        assert_eq!(shown.first(), Some(&almost_junction::ID));
    }
}
