// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Preset lookup port.
use crate::entity::Entity;
use crate::graph::{Geometry, Graph};
use crate::tags::Tags;

/// Tag-schema capability consulted by rules.
///
/// Implementations map a tag set and a geometry to the id of the best matching
/// preset. Two lookups returning the same id mean the tags describe the same
/// kind of feature for both geometries.
pub trait PresetIndex {
    /// Best matching preset id for `tags` drawn as `geometry`.
    fn match_tags(&self, tags: &Tags, geometry: Geometry) -> Option<String>;
}

/// Human-readable label for `entity`: name or ref, else the matched preset
/// id, else the entity id.
#[must_use]
pub fn display_label(entity: &Entity, graph: &Graph, presets: &dyn PresetIndex) -> String {
    if let Some(name) = entity.display_name() {
        return name.to_owned();
    }
    presets
        .match_tags(entity.tags(), graph.geometry(entity))
        .unwrap_or_else(|| entity.id().to_string())
}
