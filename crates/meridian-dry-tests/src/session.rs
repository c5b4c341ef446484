// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Editor session double bundling history, presets and mode.

use meridian_core::{
    Action, ActionError, EditContext, EditHistory, EditMode, FixOutcome, Graph, History, Issue,
};

use crate::presets::StaticPresets;

/// Owns everything an [`EditContext`] borrows.
#[derive(Debug)]
pub struct TestSession {
    /// Edit history over the starting graph.
    pub history: EditHistory,
    /// Preset matcher.
    pub presets: StaticPresets,
    /// Current mode.
    pub mode: EditMode,
}

impl TestSession {
    /// Session starting at `base` in browse mode.
    pub fn new(base: Graph) -> Self {
        Self {
            history: EditHistory::new(base),
            presets: StaticPresets::osm(),
            mode: EditMode::Browse,
        }
    }

    /// Session whose base is empty and whose first edit creates `graph`'s
    /// entities, so every entity counts as created.
    pub fn with_created(graph: &Graph) -> Result<Self, ActionError> {
        let mut session = Self::new(Graph::new());
        let replace = graph
            .entities()
            .map(|e| Action::AddEntity((**e).clone()))
            .collect();
        session.perform(&Action::Sequence(replace), "Created features.")?;
        Ok(session)
    }

    /// Borrowed view for validator calls.
    pub fn cx(&self) -> EditContext<'_> {
        EditContext {
            history: &self.history,
            presets: &self.presets,
            mode: &self.mode,
        }
    }

    /// Current graph.
    pub fn graph(&self) -> &Graph {
        self.history.graph()
    }

    /// Performs `action`.
    pub fn perform(&mut self, action: &Action, annotation: &str) -> Result<(), ActionError> {
        self.history.perform(action, annotation)
    }

    /// Resolves fix `index` of `issue` and performs it when it is an edit.
    ///
    /// Returns `Ok(false)` when the fix does not resolve to an edit.
    pub fn apply_fix(&mut self, issue: &Issue, index: usize) -> Result<bool, ActionError> {
        match issue.resolve_fix(index, self.history.graph(), &self.mode) {
            Some(FixOutcome::Edit { action, annotation }) => {
                self.history.perform(&action, &annotation)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
