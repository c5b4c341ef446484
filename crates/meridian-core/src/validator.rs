// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Validation orchestrator.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, instrument, warn};

use crate::config::ValidatorConfig;
use crate::context::{EditContext, RuleContext};
use crate::ident::{EntityId, EntityKey, EntityKind, IssueId};
use crate::issue::{Issue, Severity};
use crate::pipeline::validate_entity;
use crate::registry::{RegistryError, RuleRegistry};
use crate::rule::Subject;
use crate::validations::default_registry;

type ReloadListener = Box<dyn FnMut(&[Arc<Issue>])>;

/// Runs rules over the edited graph and keeps the current issue set.
///
/// A pass ([`Validator::validate`]) resets every rule, runs changeset rules
/// once, then validates each entity affected by the edits. Issues are
/// deduplicated by [`IssueId`], so an issue found from both of its entities
/// (a crossing, say) is reported once.
pub struct Validator {
    registry: RuleRegistry,
    config: ValidatorConfig,
    issues: Vec<Arc<Issue>>,
    by_entity: FxHashMap<EntityKey, Vec<Arc<Issue>>>,
    listeners: Vec<ReloadListener>,
}

impl core::fmt::Debug for Validator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Validator")
            .field("registry", &self.registry)
            .field("issues", &self.issues.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(default_registry(), ValidatorConfig::default())
    }
}

impl Validator {
    /// Creates a validator over `registry`.
    #[must_use]
    pub fn new(registry: RuleRegistry, config: ValidatorConfig) -> Self {
        Self {
            registry,
            config,
            issues: Vec::new(),
            by_entity: FxHashMap::default(),
            listeners: Vec::new(),
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Replaces the configuration. Takes effect on the next pass.
    pub fn set_config(&mut self, config: ValidatorConfig) {
        self.config = config;
    }

    /// Every issue from the last pass.
    #[must_use]
    pub fn issues(&self) -> &[Arc<Issue>] {
        &self.issues
    }

    /// Warnings from the last pass.
    #[must_use]
    pub fn warnings(&self) -> Vec<Arc<Issue>> {
        self.with_severity(Severity::Warning)
    }

    /// Errors from the last pass.
    #[must_use]
    pub fn errors(&self) -> Vec<Arc<Issue>> {
        self.with_severity(Severity::Error)
    }

    fn with_severity(&self, severity: Severity) -> Vec<Arc<Issue>> {
        self.issues
            .iter()
            .filter(|i| i.severity() == severity)
            .cloned()
            .collect()
    }

    /// Displayable entity rule ids, ordered by title.
    #[must_use]
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.registry.display_ids()
    }

    /// Disabled rule ids.
    #[must_use]
    pub fn disabled_rules(&self) -> &BTreeSet<String> {
        &self.config.disabled_rules
    }

    /// Registers a callback invoked with the full issue list after each pass.
    pub fn on_reload(&mut self, listener: impl FnMut(&[Arc<Issue>]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Issues for one entity, computed on first request after a pass.
    ///
    /// Unknown ids yield an empty list.
    #[instrument(level = "trace", skip(self, cx))]
    pub fn issues_for_entity(&mut self, id: EntityId, cx: &EditContext<'_>) -> Vec<Arc<Issue>> {
        let graph = cx.history.graph();
        let Some(entity) = graph.entity(id) else {
            return Vec::new();
        };
        let key = entity.key();
        if let Some(cached) = self.by_entity.get(&key) {
            return cached.clone();
        }
        let rcx = RuleContext::new(cx, &self.config);
        let found = validate_entity(&mut self.registry, &rcx, entity);
        self.by_entity.insert(key, found.clone());
        found
    }

    /// Flips a rule between enabled and disabled, then re-validates.
    ///
    /// # Errors
    /// [`RegistryError::UnknownRule`] when `rule` is not registered.
    pub fn toggle_rule(&mut self, rule: &str, cx: &EditContext<'_>) -> Result<(), RegistryError> {
        if !self.registry.contains(rule) {
            return Err(RegistryError::UnknownRule(rule.to_owned()));
        }
        if !self.config.disabled_rules.remove(rule) {
            self.config.disabled_rules.insert(rule.to_owned());
        }
        debug!(rule, disabled = self.config.is_disabled(rule), "rule toggled");
        self.validate(cx);
        Ok(())
    }

    /// Runs a full pass and notifies listeners.
    #[instrument(level = "debug", skip_all)]
    pub fn validate(&mut self, cx: &EditContext<'_>) {
        self.by_entity.clear();
        self.issues.clear();
        self.registry.reset_all();

        let changes = cx.history.changes();
        let graph = cx.history.graph();
        let rcx = RuleContext::new(cx, &self.config);

        let mut issues: Vec<Arc<Issue>> = Vec::new();
        for rule in self.registry.changes_rule_ids() {
            if self.config.is_disabled(rule) {
                continue;
            }
            let Some(r) = self.registry.get_mut(rule) else {
                continue;
            };
            match r.evaluate(Subject::Changes(&changes), &rcx) {
                Ok(found) => issues.extend(found),
                Err(err) => warn!(rule, %err, "changeset rule failed; treating as passed"),
            }
        }

        let mut to_check: BTreeSet<EntityId> = BTreeSet::new();
        for entity in changes.created.iter().chain(&changes.modified) {
            let id = entity.id();
            let mut touched = vec![id];
            if id.kind() == EntityKind::Node {
                touched.extend(graph.parent_ways(id).iter().map(|w| w.id));
            }
            for t in &touched {
                if t.kind() != EntityKind::Relation {
                    to_check.extend(graph.parent_relations(*t).iter().map(|r| r.id));
                }
            }
            to_check.extend(touched);
        }

        let mut by_id: BTreeMap<IssueId, Arc<Issue>> = BTreeMap::new();
        for id in &to_check {
            let Some(entity) = graph.entity(*id) else {
                continue;
            };
            let found = validate_entity(&mut self.registry, &rcx, entity);
            for issue in &found {
                by_id.insert(issue.id(), Arc::clone(issue));
            }
            self.by_entity.insert(entity.key(), found);
        }
        issues.extend(by_id.into_values());
        self.issues = issues;

        debug!(
            entities = to_check.len(),
            issues = self.issues.len(),
            "validation pass complete"
        );
        for listener in &mut self.listeners {
            listener(&self.issues);
        }
    }
}
