// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rule registry keyed by rule id.
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::rule::{Rule, RuleInput};

/// Id of the user-configured rule that never appears in display listings.
pub const MAPRULES: &str = "maprules";

/// Error returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A rule with this id is already registered.
    #[error("rule already registered: {0}")]
    DuplicateRule(String),
    /// No rule with this id is registered.
    #[error("unknown rule: {0}")]
    UnknownRule(String),
}

/// Ordered collection of rules.
///
/// Registration order is the order the pipeline uses for rules it does not
/// schedule explicitly.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
    by_id: FxHashMap<&'static str, usize>,
}

impl core::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.id()))
            .finish()
    }
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateRule`] when the id is taken.
    pub fn register(&mut self, rule: Box<dyn Rule>) -> Result<(), RegistryError> {
        let id = rule.id();
        if self.by_id.contains_key(id) {
            return Err(RegistryError::DuplicateRule(id.to_owned()));
        }
        self.by_id.insert(id, self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    /// `true` when `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Mutable access to a rule by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut (dyn Rule + 'static)> {
        let idx = *self.by_id.get(id)?;
        self.rules.get_mut(idx).map(|r| &mut **r)
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// `true` when no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn ids_for(&self, input: RuleInput) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|r| r.input() == input)
            .map(|r| r.id())
            .collect()
    }

    /// Entity-scoped rule ids in registration order.
    #[must_use]
    pub fn entity_rule_ids(&self) -> Vec<&'static str> {
        self.ids_for(RuleInput::Entity)
    }

    /// Changeset-scoped rule ids in registration order.
    #[must_use]
    pub fn changes_rule_ids(&self) -> Vec<&'static str> {
        self.ids_for(RuleInput::Changes)
    }

    /// Entity-scoped rule ids for display: [`MAPRULES`] excluded, ordered by
    /// title (byte-wise, so case-sensitive).
    #[must_use]
    pub fn display_ids(&self) -> Vec<&'static str> {
        let mut rules: Vec<(&'static str, &'static str)> = self
            .rules
            .iter()
            .filter(|r| r.input() == RuleInput::Entity && r.id() != MAPRULES)
            .map(|r| (r.title(), r.id()))
            .collect();
        rules.sort_unstable();
        rules.into_iter().map(|(_, id)| id).collect()
    }

    /// Calls [`Rule::reset`] on every rule.
    pub fn reset_all(&mut self) {
        for rule in &mut self.rules {
            rule.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RuleContext;
    use crate::rule::{RuleResult, Subject};

    struct Named(&'static str, &'static str, RuleInput);

    impl Rule for Named {
        fn id(&self) -> &'static str {
            self.0
        }
        fn title(&self) -> &'static str {
            self.1
        }
        fn input(&self) -> RuleInput {
            self.2
        }
        fn evaluate(&mut self, _: Subject<'_>, _: &RuleContext<'_>) -> RuleResult {
            Ok(Vec::new())
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut reg = RuleRegistry::new();
        reg.register(Box::new(Named("a", "A", RuleInput::Entity)))
            .unwrap();
        assert_eq!(
            reg.register(Box::new(Named("a", "B", RuleInput::Entity))),
            Err(RegistryError::DuplicateRule("a".into()))
        );
    }

    #[test]
    fn display_ids_sorted_by_title_without_maprules_or_changes() {
        let mut reg = RuleRegistry::new();
        for rule in [
            Named("zeta", "Almost", RuleInput::Entity),
            Named(MAPRULES, "Custom", RuleInput::Entity),
            Named("alpha", "bravo", RuleInput::Entity),
            Named("mid", "Zulu", RuleInput::Entity),
            Named("many", "Many", RuleInput::Changes),
        ] {
            reg.register(Box::new(rule)).unwrap();
        }
        // Uppercase sorts before lowercase.
        assert_eq!(reg.display_ids(), vec!["zeta", "mid", "alpha"]);
        assert_eq!(reg.changes_rule_ids(), vec!["many"]);
        assert_eq!(reg.entity_rule_ids().len(), 4);
    }
}
