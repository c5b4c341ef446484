// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Validation rule contract.
use std::sync::Arc;

use thiserror::Error;

use crate::context::RuleContext;
use crate::entity::Entity;
use crate::graph::GraphError;
use crate::history::Changes;
use crate::ident::EntityId;
use crate::issue::Issue;

/// What a rule is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleInput {
    /// One entity at a time.
    Entity,
    /// The whole changeset, once per pass.
    Changes,
}

/// Argument to [`Rule::evaluate`].
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    /// Entity under validation.
    Entity(&'a Arc<Entity>),
    /// Changeset under validation.
    Changes(&'a Changes),
}

/// Failure evaluating a rule.
///
/// The validator isolates these: the rule contributes no issues for the
/// subject and the pass continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The subject references an entity the graph does not hold.
    #[error("entity {0} is missing from the graph")]
    MissingEntity(EntityId),
    /// A way was expected.
    #[error("entity {0} is not a way")]
    NotAWay(EntityId),
}

impl From<GraphError> for RuleError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::MissingEntity(id) => Self::MissingEntity(id),
            GraphError::WrongKind(id) => Self::NotAWay(id),
        }
    }
}

/// Result of one rule evaluation.
pub type RuleResult = Result<Vec<Arc<Issue>>, RuleError>;

/// A validation rule.
///
/// Rules are identified by [`Rule::id`], which doubles as the type of every
/// issue they produce and as the key used to disable them. Rules only read the
/// graph; edits happen later through resolved fixes.
pub trait Rule {
    /// Unique id, e.g. `crossing_ways`.
    fn id(&self) -> &'static str;

    /// Display title used to order rules for presentation.
    fn title(&self) -> &'static str;

    /// Entity-scoped or changeset-scoped.
    fn input(&self) -> RuleInput {
        RuleInput::Entity
    }

    /// Evaluates the rule.
    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult;

    /// Drops per-pass state. Called before every full validation pass.
    fn reset(&mut self) {}
}

/// Unwraps an entity subject; changeset subjects yield no issues.
macro_rules! entity_subject {
    ($subject:expr) => {
        match $subject {
            $crate::rule::Subject::Entity(entity) => entity,
            $crate::rule::Subject::Changes(_) => return Ok(Vec::new()),
        }
    };
}
pub(crate) use entity_subject;
