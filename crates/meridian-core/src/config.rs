// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Validator configuration.
use std::collections::BTreeSet;

use crate::graph::Geometry;
use crate::issue::Severity;
use crate::tags::Tags;

/// Tunables and user preferences for a [`crate::Validator`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ValidatorConfig {
    /// Rule ids that are skipped (and count as passed).
    pub disabled_rules: BTreeSet<String>,
    /// Distance under which the connect fix for crossing ways reuses an
    /// existing edge node instead of inserting a new one.
    pub crossing_merge_threshold_m: f64,
    /// Distance under which an open way's endpoints are merged rather than
    /// joined by a closing segment.
    pub endpoint_merge_threshold_m: f64,
    /// How far a highway end is extended when looking for a near miss.
    pub almost_junction_extend_m: f64,
    /// Deletions in one edit session beyond which a warning is raised.
    pub many_deletions_threshold: usize,
    /// User-defined tag rules evaluated by the `maprules` rule.
    pub maprules: Vec<MapRuleSpec>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            disabled_rules: BTreeSet::new(),
            crossing_merge_threshold_m: 0.75,
            endpoint_merge_threshold_m: 0.75,
            almost_junction_extend_m: 5.0,
            many_deletions_threshold: 100,
            maprules: Vec::new(),
        }
    }
}

impl ValidatorConfig {
    /// `true` when `rule` is disabled.
    #[must_use]
    pub fn is_disabled(&self, rule: &str) -> bool {
        self.disabled_rules.contains(rule)
    }
}

/// A declarative tag rule.
///
/// An entity matches when its geometry is listed (or the list is empty), every
/// `equals` pair is present verbatim, every `present` key is set (and not
/// `no`) and every `absent` key is unset. Matching entities get one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapRuleSpec {
    /// Stable rule name; also the issue differentiator.
    pub name: String,
    /// Geometries the rule applies to; empty means any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub geometry: Vec<Geometry>,
    /// Tags that must match exactly.
    #[cfg_attr(feature = "serde", serde(default))]
    pub equals: Tags,
    /// Keys that must be set.
    #[cfg_attr(feature = "serde", serde(default))]
    pub present: Vec<String>,
    /// Keys that must be unset.
    #[cfg_attr(feature = "serde", serde(default))]
    pub absent: Vec<String>,
    /// Severity of the produced issue.
    pub severity: Severity,
    /// Message shown for matches.
    pub message: String,
}
