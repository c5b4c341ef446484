// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Editor state visible to the validator and its rules.
use meridian_geom::SpatialIndex;

use crate::config::ValidatorConfig;
use crate::entity::Entity;
use crate::graph::Graph;
use crate::history::History;
use crate::ident::EntityId;
use crate::presets::{display_label, PresetIndex};

/// What the user is currently doing in the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditMode {
    /// Nothing selected.
    #[default]
    Browse,
    /// One or more entities selected.
    Select(Vec<EntityId>),
    /// Drawing a line.
    DrawLine {
        /// Way being drawn.
        way: EntityId,
        /// `true` when extending an existing way rather than drawing anew.
        continuing: bool,
    },
    /// Drawing an area.
    DrawArea {
        /// Way being drawn.
        way: EntityId,
    },
}

impl EditMode {
    /// `true` when `way` is a new way currently being drawn.
    #[must_use]
    pub fn is_drawing_new(&self, way: EntityId) -> bool {
        match self {
            Self::DrawArea { way: w } => *w == way,
            Self::DrawLine {
                way: w,
                continuing: false,
            } => *w == way,
            _ => false,
        }
    }

    /// The single selected id, if exactly one entity is selected.
    #[must_use]
    pub fn single_selection(&self) -> Option<EntityId> {
        match self {
            Self::Select(ids) if ids.len() == 1 => ids.first().copied(),
            _ => None,
        }
    }
}

/// Collaborators passed to [`crate::Validator`] entry points.
#[derive(Clone, Copy)]
pub struct EditContext<'a> {
    /// Edit history (graph, changes, spatial index).
    pub history: &'a dyn History,
    /// Preset matcher.
    pub presets: &'a dyn PresetIndex,
    /// Current editor mode.
    pub mode: &'a EditMode,
}

impl core::fmt::Debug for EditContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EditContext")
            .field("mode", self.mode)
            .finish_non_exhaustive()
    }
}

/// Read-only view handed to a rule for one evaluation.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    /// Graph snapshot under validation.
    pub graph: &'a Graph,
    /// Entity extents of `graph`.
    pub tree: &'a dyn SpatialIndex<EntityId>,
    /// Preset matcher.
    pub presets: &'a dyn PresetIndex,
    /// Current editor mode.
    pub mode: &'a EditMode,
    /// Validator configuration.
    pub config: &'a ValidatorConfig,
}

impl core::fmt::Debug for RuleContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RuleContext")
            .field("entities", &self.graph.len())
            .field("mode", self.mode)
            .finish_non_exhaustive()
    }
}

impl<'a> RuleContext<'a> {
    /// Builds a rule context from editor collaborators.
    #[must_use]
    pub fn new(cx: &EditContext<'a>, config: &'a ValidatorConfig) -> Self {
        Self {
            graph: cx.history.graph(),
            tree: cx.history.tree(),
            presets: cx.presets,
            mode: cx.mode,
            config,
        }
    }

    /// Display label for `entity`; see [`display_label`].
    #[must_use]
    pub fn label(&self, entity: &Entity) -> String {
        display_label(entity, self.graph, self.presets)
    }

    /// `true` when `id` exists and may be deleted (it is not a relation
    /// member).
    #[must_use]
    pub fn can_delete(&self, id: EntityId) -> bool {
        can_delete(self.graph, id)
    }
}

/// `true` when `id` exists in `graph` and is not a relation member.
#[must_use]
pub fn can_delete(graph: &Graph, id: EntityId) -> bool {
    graph.has_entity(id) && !graph.is_member(id)
}
