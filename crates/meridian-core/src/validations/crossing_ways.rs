// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Illegitimate crossings between buildings, highways, railways and
//! waterways.
//!
//! Candidate ways come from the spatial index, one query per edge of the
//! validated way. Each pair of ways is compared once per pass: the pairwise
//! cache records the comparison in both directions and stores the resulting
//! issues under both ways, so validating the second way of a pair returns the
//! very same `Arc<Issue>` instances as the first.
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use meridian_geom::{line_intersection, Extent, Loc};

use crate::context::RuleContext;
use crate::entity::{Entity, Way};
use crate::graph::Graph;
use crate::ident::{EntityId, EntityKind};
use crate::issue::{CrossingInfo, Fix, FixCommand, Issue, IssueInfo, LayerDirection, Severity};
use crate::rule::{entity_subject, Rule, RuleError, RuleResult, Subject};
use crate::tags::{has_tag, tags_from, Tags};

/// Rule id.
pub const ID: &str = "crossing_ways";

/// Highway values treated as real roads and paths.
pub(crate) const HIGHWAYS: &[&str] = &[
    "residential",
    "service",
    "track",
    "unclassified",
    "footway",
    "path",
    "tertiary",
    "secondary",
    "primary",
    "living_street",
    "cycleway",
    "trunk",
    "steps",
    "motorway",
    "motorway_link",
    "pedestrian",
    "trunk_link",
    "primary_link",
    "secondary_link",
    "road",
    "tertiary_link",
    "bridleway",
    "raceway",
    "corridor",
    "bus_guideway",
];

const RAILWAYS: &[&str] = &[
    "rail",
    "disused",
    "tram",
    "subway",
    "narrow_gauge",
    "light_rail",
    "preserved",
    "miniature",
    "monorail",
    "funicular",
];

const WATERWAYS: &[&str] = &["canal", "ditch", "drain", "river", "stream"];

const IGNORED_BUILDINGS: &[&str] = &["demolished", "dismantled", "proposed", "razed"];

const PATH_HIGHWAYS: &[&str] = &[
    "path",
    "footway",
    "cycleway",
    "bridleway",
    "pedestrian",
    "steps",
    "corridor",
];

const NON_CROSSING_HIGHWAYS: &[&str] = &["track"];

/// Highways that should never get a ford.
const HIGHWAYS_DISALLOWING_FORDS: &[&str] = &[
    "motorway",
    "motorway_link",
    "trunk",
    "trunk_link",
    "primary",
    "primary_link",
    "secondary",
    "secondary_link",
];

/// Feature classes that take part in crossing checks.
///
/// Declaration order is alphabetical, so the derived `Ord` matches sorting by
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureType {
    /// `building=*`
    Building,
    /// `highway=*` from the highway list
    Highway,
    /// `railway=*` from the railway list
    Railway,
    /// `waterway=*` from the waterway list
    Waterway,
}

impl FeatureType {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Highway => "highway",
            Self::Railway => "railway",
            Self::Waterway => "waterway",
        }
    }

    fn allows_bridge(self) -> bool {
        matches!(self, Self::Highway | Self::Railway | Self::Waterway)
    }

    fn allows_tunnel(self) -> bool {
        matches!(self, Self::Highway | Self::Railway | Self::Waterway)
    }

    fn allows_structures(self) -> bool {
        self.allows_bridge() || self.allows_tunnel()
    }

    fn can_cover(self) -> bool {
        self == Self::Building
    }
}

fn value_in(tags: &Tags, key: &str, list: &[&str]) -> bool {
    tags.get(key).is_some_and(|v| list.contains(&v.as_str()))
}

/// Classifies a tag set. Buildings win; other areas are never checked.
#[must_use]
pub fn feature_type_for_tags(tags: &Tags) -> Option<FeatureType> {
    if has_tag(tags, "building") && !value_in(tags, "building", IGNORED_BUILDINGS) {
        return Some(FeatureType::Building);
    }
    if has_tag(tags, "area") {
        return None;
    }
    if has_tag(tags, "highway") && value_in(tags, "highway", HIGHWAYS) {
        return Some(FeatureType::Highway);
    }
    if has_tag(tags, "railway") && value_in(tags, "railway", RAILWAYS) {
        return Some(FeatureType::Railway);
    }
    if has_tag(tags, "waterway") && value_in(tags, "waterway", WATERWAYS) {
        return Some(FeatureType::Waterway);
    }
    None
}

/// The way itself, or its first parent relation carrying a feature type when
/// the way has none.
fn feature_entity(way: &Arc<Entity>, graph: &Graph) -> Arc<Entity> {
    if feature_type_for_tags(way.tags()).is_none() {
        let rel = graph
            .parent_relations(way.id())
            .into_iter()
            .find(|r| feature_type_for_tags(&r.tags).is_some())
            .and_then(|r| graph.entity(r.id));
        if let Some(rel) = rel {
            return Arc::clone(rel);
        }
    }
    Arc::clone(way)
}

fn feature_type_for_way(way: &Arc<Entity>, graph: &Graph) -> Option<FeatureType> {
    feature_type_for_tags(feature_entity(way, graph).tags())
}

fn tags_imply_indoors(tags: &Tags) -> bool {
    has_tag(tags, "level") || tags.get("highway").is_some_and(|h| h == "corridor")
}

fn tag_or_zero<'a>(tags: &'a Tags, key: &str) -> &'a str {
    tags.get(key).map_or("0", String::as_str)
}

/// One-side-or-different-layers check shared by bridges, tunnels and covers.
fn structure_separates(tags1: &Tags, tags2: &Tags, key: &str) -> bool {
    let (a, b) = (has_tag(tags1, key), has_tag(tags2, key));
    (a != b) || (a && b && tag_or_zero(tags1, "layer") != tag_or_zero(tags2, "layer"))
}

/// `true` when the two features can cross without interacting.
///
/// Checked in order: indoor features on different levels; bridges; tunnels;
/// covered buildings; and, when neither type supports structures, a layer
/// difference.
#[must_use]
pub fn is_legit_crossing(tags1: &Tags, ft1: FeatureType, tags2: &Tags, ft2: FeatureType) -> bool {
    if tags_imply_indoors(tags1)
        && tags_imply_indoors(tags2)
        && tag_or_zero(tags1, "level") != tag_or_zero(tags2, "level")
    {
        return true;
    }

    if ft1.allows_bridge() && ft2.allows_bridge() {
        if structure_separates(tags1, tags2, "bridge") {
            return true;
        }
    } else if (ft1.allows_bridge() && has_tag(tags1, "bridge"))
        || (ft2.allows_bridge() && has_tag(tags2, "bridge"))
    {
        return true;
    }

    if ft1.allows_tunnel() && ft2.allows_tunnel() {
        if structure_separates(tags1, tags2, "tunnel") {
            return true;
        }
    } else if (ft1.allows_tunnel() && has_tag(tags1, "tunnel"))
        || (ft2.allows_tunnel() && has_tag(tags2, "tunnel"))
    {
        return true;
    }

    if ft1.can_cover() && ft2.can_cover() {
        if structure_separates(tags1, tags2, "covered") {
            return true;
        }
    } else if (ft1.can_cover() && has_tag(tags2, "covered"))
        || (ft2.can_cover() && has_tag(tags1, "covered"))
    {
        return true;
    }

    !ft1.allows_structures()
        && !ft2.allows_structures()
        && tag_or_zero(tags1, "layer") != tag_or_zero(tags2, "layer")
}

/// Tags for a node joining the two features, or `None` when they should not
/// be joined. An empty map means "join with an untagged node".
#[must_use]
pub fn connection_tags(tags1: &Tags, tags2: &Tags) -> Option<Tags> {
    let ft1 = feature_type_for_tags(tags1);
    let ft2 = feature_type_for_tags(tags2);
    let is_path = |t: &Tags| value_in(t, "highway", PATH_HIGHWAYS);

    if ft1 == ft2 {
        return match ft1 {
            Some(FeatureType::Highway) => {
                let (p1, p2) = (is_path(tags1), is_path(tags2));
                if p1 == p2 {
                    return Some(Tags::new());
                }
                let (path, road) = if p1 { (tags1, tags2) } else { (tags2, tags1) };
                if value_in(road, "highway", NON_CROSSING_HIGHWAYS) {
                    return Some(Tags::new());
                }
                let marked = path.get("highway").is_some_and(|h| h == "footway")
                    && path.get("footway").is_some_and(|f| f == "crossing")
                    && value_in(path, "crossing", &["marked", "unmarked"]);
                let crossing = if marked {
                    path.get("crossing").map_or("unmarked", String::as_str)
                } else {
                    "unmarked"
                };
                Some(tags_from([("highway", "crossing"), ("crossing", crossing)]))
            }
            Some(FeatureType::Waterway | FeatureType::Railway) => Some(Tags::new()),
            _ => None,
        };
    }

    let types = [ft1, ft2];
    if !types.contains(&Some(FeatureType::Highway)) {
        return None;
    }
    if types.contains(&Some(FeatureType::Railway)) {
        let value = if is_path(tags1) || is_path(tags2) {
            "crossing"
        } else {
            "level_crossing"
        };
        return Some(tags_from([("railway", value)]));
    }
    if types.contains(&Some(FeatureType::Waterway)) {
        if has_tag(tags1, "tunnel") && has_tag(tags2, "tunnel") {
            return None;
        }
        if has_tag(tags1, "bridge") && has_tag(tags2, "bridge") {
            return None;
        }
        if value_in(tags1, "highway", HIGHWAYS_DISALLOWING_FORDS)
            || value_in(tags2, "highway", HIGHWAYS_DISALLOWING_FORDS)
        {
            return None;
        }
        return Some(tags_from([("ford", "yes")]));
    }
    None
}

#[derive(Debug)]
struct Crossing {
    ways: [Arc<Entity>; 2],
    feature_types: [FeatureType; 2],
    edges: [[EntityId; 2]; 2],
    cross_point: Loc,
}

type PairCache = BTreeMap<EntityId, BTreeMap<EntityId, Vec<Arc<Issue>>>>;

/// The crossing-ways rule.
#[derive(Debug, Default)]
pub struct CrossingWays {
    cache: PairCache,
}

impl CrossingWays {
    /// Creates the rule with an empty pairwise cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn compared(&self, a: EntityId, b: EntityId) -> bool {
        self.cache.get(&a).is_some_and(|m| m.contains_key(&b))
    }

    fn find_crossings(
        &mut self,
        way1: &Arc<Entity>,
        cx: &RuleContext<'_>,
    ) -> Result<Vec<Crossing>, RuleError> {
        let graph = cx.graph;
        let w1: &Way = way1.as_way().ok_or(RuleError::NotAWay(way1.id()))?;
        let Some(ft1) = feature_type_for_way(way1, graph) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        let mut single_done: BTreeSet<EntityId> = BTreeSet::new();
        let mut compared: BTreeSet<EntityId> = BTreeSet::new();
        let nodes1 = graph.child_nodes(w1)?;

        for pair in nodes1.windows(2) {
            let (n1, n2) = (pair[0], pair[1]);
            let segment1 = [n1.loc, n2.loc];
            for candidate in cx.tree.intersects(&Extent::from_corners(n1.loc, n2.loc)) {
                if candidate.kind() != EntityKind::Way
                    || candidate == w1.id
                    || single_done.contains(&candidate)
                    || self.compared(w1.id, candidate)
                {
                    continue;
                }
                let Some(way2) = graph.entity(candidate) else {
                    continue;
                };
                let Some(w2) = way2.as_way() else {
                    continue;
                };
                compared.insert(candidate);

                let Some(ft2) = feature_type_for_way(way2, graph) else {
                    continue;
                };
                if is_legit_crossing(&w1.tags, ft1, &w2.tags, ft2) {
                    continue;
                }

                let one_only = ft1 == FeatureType::Building || ft2 == FeatureType::Building;
                let nodes2 = graph.child_nodes(w2)?;
                for seg in nodes2.windows(2) {
                    let (na, nb) = (seg[0], seg[1]);
                    if [na.id, nb.id].iter().any(|id| *id == n1.id || *id == n2.id) {
                        continue;
                    }
                    if let Some(point) = line_intersection(segment1, [na.loc, nb.loc]) {
                        found.push(Crossing {
                            ways: [Arc::clone(way1), Arc::clone(way2)],
                            feature_types: [ft1, ft2],
                            edges: [[n1.id, n2.id], [na.id, nb.id]],
                            cross_point: point,
                        });
                        if one_only {
                            single_done.insert(candidate);
                            break;
                        }
                    }
                }
            }
        }

        for other in compared {
            self.cache.entry(w1.id).or_default().entry(other).or_default();
            self.cache.entry(other).or_default().entry(w1.id).or_default();
        }
        Ok(found)
    }
}

fn ways_to_check(entity: &Arc<Entity>, graph: &Graph) -> Vec<Arc<Entity>> {
    if feature_type_for_tags(entity.tags()).is_none() {
        return Vec::new();
    }
    match entity.as_ref() {
        Entity::Way(_) => vec![Arc::clone(entity)],
        Entity::Relation(r) if r.is_multipolygon() && has_tag(&r.tags, "building") => r
            .members
            .iter()
            .filter_map(|m| graph.entity(m.id))
            .filter(|e| e.kind() == EntityKind::Way)
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

fn tooltip(crossing_type: &str) -> String {
    let connectable = crossing_type.ends_with("_connectable");
    let base = crossing_type.trim_end_matches("_connectable");
    let text = match base {
        "indoor-indoor" => "Indoor features that cross should be connected or use different levels.",
        "tunnel-tunnel" => "Tunnels that cross should be connected or use different layers.",
        "bridge-bridge" => "Bridges that cross should be connected or use different layers.",
        b if b.starts_with("building-") => {
            "Features crossing buildings should be on a different layer or marked as covered."
        }
        "highway-waterway" | "railway-waterway" => {
            "Ways crossing water should use a bridge or tunnel, or a ford where allowed."
        }
        "waterway-waterway" => "Waterways that cross should be connected or use a tunnel.",
        _ => "Crossing features should be connected or separated by a bridge or tunnel.",
    };
    if connectable {
        format!("{text} Connecting them is also possible.")
    } else {
        text.to_owned()
    }
}

/// Waterways first, then feature types by descending name, then labels.
fn order_pair(cx: &RuleContext<'_>, a: (&Arc<Entity>, FeatureType), b: (&Arc<Entity>, FeatureType)) -> Ordering {
    match (a.1, b.1) {
        (x, y) if x == y => cx.label(a.0).cmp(&cx.label(b.0)),
        (FeatureType::Waterway, _) => Ordering::Less,
        (_, FeatureType::Waterway) => Ordering::Greater,
        (x, y) => y.cmp(&x),
    }
}

fn create_issue(crossing: &Crossing, cx: &RuleContext<'_>) -> Issue {
    let graph = cx.graph;
    let mut pair = [
        (&crossing.ways[0], crossing.feature_types[0]),
        (&crossing.ways[1], crossing.feature_types[1]),
    ];
    if order_pair(cx, pair[0], pair[1]) == Ordering::Greater {
        pair.swap(0, 1);
    }
    let entities = [feature_entity(pair[0].0, graph), feature_entity(pair[1].0, graph)];
    let [(_, ft1), (_, ft2)] = pair;
    let (tags1, tags2) = (entities[0].tags(), entities[1].tags());

    let conn_tags = connection_tags(tags1, tags2);
    let indoors = tags_imply_indoors(tags1) && tags_imply_indoors(tags2);
    let tunnels = ft1.allows_tunnel()
        && has_tag(tags1, "tunnel")
        && ft2.allows_tunnel()
        && has_tag(tags2, "tunnel");
    let bridges = ft1.allows_bridge()
        && has_tag(tags1, "bridge")
        && ft2.allows_bridge()
        && has_tag(tags2, "bridge");

    let mut crossing_type = if indoors {
        "indoor-indoor".to_owned()
    } else if tunnels {
        "tunnel-tunnel".to_owned()
    } else if bridges {
        "bridge-bridge".to_owned()
    } else {
        let mut names = [ft1.as_str(), ft2.as_str()];
        names.sort_unstable();
        names.join("-")
    };
    if conn_tags.is_some() && (indoors || tunnels || bridges) {
        crossing_type.push_str("_connectable");
    }

    let mut fixes = Vec::new();
    if conn_tags.is_some() {
        fixes.push(
            Fix::new(
                "Connect these features",
                FixCommand::ConnectCrossingWays {
                    merge_threshold_m: cx.config.crossing_merge_threshold_m,
                },
            )
            .icon("crossing"),
        );
    }
    let structure_fix = if indoors {
        Some(("Use different levels", "layers"))
    } else if tunnels || bridges {
        None
    } else if (ft1.allows_bridge() && ft1 != FeatureType::Waterway)
        || (ft2.allows_bridge() && ft2 != FeatureType::Waterway)
    {
        Some(("Add a bridge or tunnel", "bridge"))
    } else if ft1.allows_tunnel() || ft2.allows_tunnel() {
        Some(("Add a tunnel", "layers"))
    } else {
        None
    };
    match structure_fix {
        Some((title, icon)) => fixes.push(Fix::new(title, FixCommand::None).icon(icon)),
        None => {
            fixes.push(
                Fix::new("Tag this as higher", FixCommand::ChangeLayer(LayerDirection::Higher))
                    .icon("up"),
            );
            fixes.push(
                Fix::new("Tag this as lower", FixCommand::ChangeLayer(LayerDirection::Lower))
                    .icon("down"),
            );
        }
    }
    fixes.push(Fix::new("Reposition the features", FixCommand::None).icon("move"));

    let message = format!(
        "{} crosses {}.",
        cx.label(&entities[0]),
        cx.label(&entities[1])
    );
    Issue::builder(ID, Severity::Warning)
        .message(message)
        .tooltip(tooltip(&crossing_type))
        .entities(entities.to_vec())
        .loc(crossing.cross_point)
        .info(IssueInfo::Crossing(CrossingInfo {
            crossing_type,
            feature_types: [ft1, ft2],
            edges: crossing.edges,
            connection_tags: conn_tags,
        }))
        .fixes(fixes)
        .build()
}

impl Rule for CrossingWays {
    fn id(&self) -> &'static str {
        ID
    }

    fn title(&self) -> &'static str {
        "Crossing Ways"
    }

    fn evaluate(&mut self, subject: Subject<'_>, cx: &RuleContext<'_>) -> RuleResult {
        let entity = entity_subject!(subject);
        let mut issues = Vec::new();
        for way in ways_to_check(entity, cx.graph) {
            let way_id = way.id();
            for crossing in self.find_crossings(&way, cx)? {
                let other = crossing.ways[1].id();
                let issue = Arc::new(create_issue(&crossing, cx));
                self.cache
                    .entry(way_id)
                    .or_default()
                    .entry(other)
                    .or_default()
                    .push(Arc::clone(&issue));
                self.cache
                    .entry(other)
                    .or_default()
                    .entry(way_id)
                    .or_default()
                    .push(issue);
            }
            if let Some(by_other) = self.cache.get(&way_id) {
                issues.extend(by_other.values().flatten().cloned());
            }
        }
        Ok(issues)
    }

    fn reset(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(pairs: &[(&str, &str)]) -> Tags {
        tags_from(pairs.iter().copied())
    }

    #[test]
    fn classification_prefers_buildings_and_skips_areas() {
        assert_eq!(
            feature_type_for_tags(&t(&[("building", "yes"), ("highway", "service")])),
            Some(FeatureType::Building)
        );
        assert_eq!(feature_type_for_tags(&t(&[("building", "razed")])), None);
        assert_eq!(
            feature_type_for_tags(&t(&[("highway", "pedestrian"), ("area", "yes")])),
            None
        );
        assert_eq!(feature_type_for_tags(&t(&[("highway", "proposed")])), None);
        assert_eq!(
            feature_type_for_tags(&t(&[("waterway", "stream")])),
            Some(FeatureType::Waterway)
        );
    }

    #[test]
    fn bridge_on_one_side_is_legit_but_both_need_layers() {
        let hw = FeatureType::Highway;
        let bridge = t(&[("highway", "primary"), ("bridge", "yes")]);
        let road = t(&[("highway", "primary")]);
        assert!(is_legit_crossing(&bridge, hw, &road, hw));
        assert!(!is_legit_crossing(&bridge, hw, &bridge, hw));
        let high = t(&[("highway", "primary"), ("bridge", "yes"), ("layer", "1")]);
        assert!(is_legit_crossing(&bridge, hw, &high, hw));
        let no_bridge = t(&[("highway", "primary"), ("bridge", "no")]);
        assert!(!is_legit_crossing(&no_bridge, hw, &road, hw));
    }

    #[test]
    fn buildings_use_covered_and_layers() {
        let b = FeatureType::Building;
        let building = t(&[("building", "yes")]);
        let covered = t(&[("highway", "service"), ("covered", "yes")]);
        assert!(is_legit_crossing(
            &building,
            b,
            &covered,
            FeatureType::Highway
        ));
        let upper = t(&[("building", "yes"), ("layer", "1")]);
        assert!(is_legit_crossing(&building, b, &upper, b));
        assert!(!is_legit_crossing(&building, b, &building, b));
    }

    #[test]
    fn indoor_levels_separate_corridors() {
        let hw = FeatureType::Highway;
        let a = t(&[("highway", "corridor"), ("level", "1")]);
        let b = t(&[("highway", "corridor")]);
        assert!(is_legit_crossing(&a, hw, &b, hw));
        assert!(!is_legit_crossing(&b, hw, &b, hw));
    }

    #[test]
    fn connection_tags_cover_each_pairing() {
        let footway = t(&[("highway", "footway")]);
        let marked = t(&[
            ("highway", "footway"),
            ("footway", "crossing"),
            ("crossing", "marked"),
        ]);
        let road = t(&[("highway", "residential")]);
        let track = t(&[("highway", "track")]);
        let motorway = t(&[("highway", "motorway")]);
        let rail = t(&[("railway", "rail")]);
        let river = t(&[("waterway", "river")]);
        let building = t(&[("building", "yes")]);

        assert_eq!(
            connection_tags(&footway, &road),
            Some(t(&[("highway", "crossing"), ("crossing", "unmarked")]))
        );
        assert_eq!(
            connection_tags(&road, &marked),
            Some(t(&[("highway", "crossing"), ("crossing", "marked")]))
        );
        assert_eq!(connection_tags(&footway, &track), Some(Tags::new()));
        assert_eq!(connection_tags(&road, &road), Some(Tags::new()));
        assert_eq!(
            connection_tags(&road, &rail),
            Some(t(&[("railway", "level_crossing")]))
        );
        assert_eq!(
            connection_tags(&rail, &footway),
            Some(t(&[("railway", "crossing")]))
        );
        assert_eq!(connection_tags(&road, &river), Some(t(&[("ford", "yes")])));
        assert_eq!(connection_tags(&motorway, &river), None);
        assert_eq!(connection_tags(&river, &river), Some(Tags::new()));
        assert_eq!(connection_tags(&building, &road), None);
        assert_eq!(connection_tags(&building, &building), None);
    }
}
