// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! meridian-core: incremental validation engine for editable map graphs.
//!
//! A [`Validator`] runs a registry of [`Rule`]s over the entities touched by
//! the current edit session and keeps the resulting [`Issue`]s. Issues carry
//! deterministic ids, so the same graph always yields the same issue set, and
//! their fixes resolve to [`Action`]s that an [`EditHistory`] can perform.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::cast_precision_loss
    )
)]

mod actions;
mod config;
mod context;
mod entity;
mod graph;
mod history;
mod ident;
mod issue;
mod pipeline;
mod presets;
mod registry;
mod rule;
mod tags;
/// Built-in validation rules.
pub mod validations;
mod validator;

/// Graph edits produced by fixes.
pub use actions::{Action, ActionError};
/// Validator configuration.
pub use config::{MapRuleSpec, ValidatorConfig};
/// Editor state handed to the validator.
pub use context::{can_delete, EditContext, EditMode, RuleContext};
/// Map entities.
pub use entity::{Affix, Entity, Member, Node, Relation, Way};
/// Graph snapshots.
pub use graph::{Geometry, Graph, GraphError};
/// Edit history and change sets.
pub use history::{Changes, EditHistory, History};
/// Entity and issue identifiers.
pub use ident::{
    make_issue_id, EntityId, EntityKey, EntityKind, Hash, IssueId, ParseEntityIdError,
};
/// Issues and fixes.
pub use issue::{
    CrossingInfo, Fix, FixCommand, FixOutcome, Issue, IssueBuilder, IssueInfo, LayerDirection,
    Severity,
};
/// Preset matching.
pub use presets::{display_label, PresetIndex};
/// Rule registry.
pub use registry::{RegistryError, RuleRegistry, MAPRULES};
/// Rule contract.
pub use rule::{Rule, RuleError, RuleInput, RuleResult, Subject};
/// Tag helpers.
pub use tags::{
    has_interesting_tags, has_tag, is_interesting_key, tag_suggesting_area, tag_text, tags_from,
    Tags,
};
/// Built-in rule registry.
pub use validations::default_registry;
/// Validation orchestrator.
pub use validator::Validator;
