// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tag maps and the tag predicates shared by the validation rules.
use std::collections::BTreeMap;

/// Ordered `key -> value` tag mapping.
///
/// A `BTreeMap` keeps iteration (and therefore any derived text or hash)
/// independent of insertion order.
pub type Tags = BTreeMap<String, String>;

/// Builds a [`Tags`] map from string pairs.
pub fn tags_from<'a, I>(pairs: I) -> Tags
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}

/// `true` when `key` is present with any value other than `"no"`.
#[must_use]
pub fn has_tag(tags: &Tags, key: &str) -> bool {
    tags.get(key).is_some_and(|v| v != "no")
}

/// `true` for keys that describe a feature rather than its provenance.
///
/// Attribution-style keys (`source`, `created_by`, `tiger:*`, ...) never make
/// an entity "tagged" on their own.
#[must_use]
pub fn is_interesting_key(key: &str) -> bool {
    !matches!(key, "attribution" | "created_by" | "source" | "odbl") && !key.starts_with("tiger:")
}

/// `true` when at least one key is interesting; see [`is_interesting_key`].
#[must_use]
pub fn has_interesting_tags(tags: &Tags) -> bool {
    tags.keys().any(|k| is_interesting_key(k))
}

/// Keys whose presence implies an area, with the values that are lines
/// despite the key.
const AREA_KEYS: &[(&str, &[&str])] = &[
    ("aeroway", &["jet_bridge", "parking_position", "runway", "stopway", "taxiway"]),
    ("amenity", &["bench"]),
    ("building", &[]),
    ("building:part", &[]),
    ("craft", &[]),
    ("historic", &["citywalls"]),
    ("landuse", &[]),
    ("leisure", &["slipway", "track"]),
    ("man_made", &["breakwater", "cutline", "dyke", "embankment", "groyne", "pipeline"]),
    ("military", &["trench"]),
    ("natural", &["arete", "cliff", "coastline", "ridge", "tree_row", "valley"]),
    ("office", &[]),
    ("place", &[]),
    ("power", &["cable", "line", "minor_line"]),
    ("shop", &[]),
    ("tourism", &["artwork"]),
];

/// Returns the single tag that suggests the entity should be an area.
///
/// `area=yes` wins outright and `area=no` vetoes; otherwise the first key (in
/// key order) found in the area-key table whose value is not one of that key's
/// line exceptions is returned.
#[must_use]
pub fn tag_suggesting_area(tags: &Tags) -> Option<Tags> {
    match tags.get("area").map(String::as_str) {
        Some("yes") => return Some(tags_from([("area", "yes")])),
        Some("no") => return None,
        _ => {}
    }
    tags.iter().find_map(|(key, value)| {
        AREA_KEYS
            .iter()
            .find(|(area_key, _)| area_key == key)
            .filter(|(_, exceptions)| value != "no" && !exceptions.contains(&value.as_str()))
            .map(|_| tags_from([(key.as_str(), value.as_str())]))
    })
}

/// Renders tags as `k=v, k2=v2` in key order.
#[must_use]
pub fn tag_text(tags: &Tags) -> String {
    tags.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_tag_treats_no_as_absent() {
        let tags = tags_from([("bridge", "no"), ("tunnel", "yes")]);
        assert!(!has_tag(&tags, "bridge"));
        assert!(has_tag(&tags, "tunnel"));
        assert!(!has_tag(&tags, "covered"));
    }

    #[test]
    fn provenance_keys_are_not_interesting() {
        assert!(!has_interesting_tags(&tags_from([
            ("source", "survey"),
            ("tiger:cfcc", "A41"),
        ])));
        assert!(has_interesting_tags(&tags_from([("name", "Main")])));
    }

    #[test]
    fn area_suggestion_respects_exceptions_and_area_key() {
        assert_eq!(
            tag_suggesting_area(&tags_from([("building", "yes")])),
            Some(tags_from([("building", "yes")]))
        );
        assert_eq!(tag_suggesting_area(&tags_from([("natural", "coastline")])), None);
        assert_eq!(
            tag_suggesting_area(&tags_from([("building", "yes"), ("area", "no")])),
            None
        );
        assert_eq!(
            tag_suggesting_area(&tags_from([("highway", "pedestrian"), ("area", "yes")])),
            Some(tags_from([("area", "yes")]))
        );
        assert_eq!(tag_suggesting_area(&tags_from([("highway", "primary")])), None);
    }

    #[test]
    fn tag_text_is_key_ordered() {
        let tags = tags_from([("landuse", "grass"), ("area", "yes")]);
        assert_eq!(tag_text(&tags), "area=yes, landuse=grass");
    }
}
