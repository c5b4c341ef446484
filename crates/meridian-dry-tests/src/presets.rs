// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Table-driven preset matcher.

use meridian_core::{Geometry, PresetIndex, Tags};

const ANY: &str = "*";

/// `(key, value, geometries, preset id)`; `*` matches any value.
type Entry = (&'static str, &'static str, &'static [Geometry], &'static str);

const LINE: &[Geometry] = &[Geometry::Line];
const AREA: &[Geometry] = &[Geometry::Area];
const POINTISH: &[Geometry] = &[Geometry::Point, Geometry::Vertex, Geometry::Area];
const LINE_AREA: &[Geometry] = &[Geometry::Line, Geometry::Area];

const OSM: &[Entry] = &[
    ("building", ANY, AREA, "building"),
    ("highway", "crossing", &[Geometry::Vertex], "highway/crossing"),
    ("highway", "footway", LINE, "highway/footway"),
    ("highway", "pedestrian", LINE_AREA, "highway/pedestrian"),
    ("highway", "primary", LINE, "highway/primary"),
    ("highway", "residential", LINE, "highway/residential"),
    ("highway", "road", LINE, "highway/road"),
    ("highway", "service", LINE, "highway/service"),
    ("highway", ANY, LINE, "highway"),
    ("landuse", ANY, AREA, "landuse"),
    ("leisure", "park", AREA, "leisure/park"),
    ("man_made", "pipeline", LINE, "man_made/pipeline"),
    ("natural", "water", AREA, "natural/water"),
    ("railway", "rail", LINE, "railway/rail"),
    ("shop", ANY, POINTISH, "shop"),
    ("type", "multipolygon", AREA, "type/multipolygon"),
    ("waterway", "river", LINE, "waterway/river"),
    ("waterway", "stream", LINE, "waterway/stream"),
];

/// [`PresetIndex`] over a fixed entry table; the first matching entry wins.
#[derive(Debug, Clone, Copy)]
pub struct StaticPresets {
    entries: &'static [Entry],
}

impl Default for StaticPresets {
    fn default() -> Self {
        Self::osm()
    }
}

impl StaticPresets {
    /// A small table of common OSM presets.
    pub fn osm() -> Self {
        Self { entries: OSM }
    }

    /// Matcher that knows no presets.
    pub fn empty() -> Self {
        Self { entries: &[] }
    }
}

impl PresetIndex for StaticPresets {
    fn match_tags(&self, tags: &Tags, geometry: Geometry) -> Option<String> {
        self.entries
            .iter()
            .find(|(key, value, geometries, _)| {
                geometries.contains(&geometry)
                    && tags.get(*key).is_some_and(|v| *value == ANY || v == value)
            })
            .map(|(_, _, _, id)| (*id).to_owned())
    }
}
