// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! Crossing detection end to end: legitimacy, symmetry and the connect fix.

use std::sync::Arc;

use meridian_core::validations::crossing_ways;
use meridian_core::{
    EditMode, EntityId, FixCommand, Issue, IssueInfo, LayerDirection, Validator,
};
use meridian_dry_tests::{GraphBuilder, TestSession};
use proptest::prelude::*;

type Pairs<'a> = &'a [(&'a str, &'a str)];

/// Two two-node ways crossing at (0.001, 0): w1 runs west-east, w2 south-north.
fn cross(tags1: Pairs<'_>, tags2: Pairs<'_>) -> TestSession {
    let graph = GraphBuilder::new()
        .node(1, [0.0, 0.0])
        .node(2, [0.002, 0.0])
        .node(3, [0.001, -0.001])
        .node(4, [0.001, 0.001])
        .way(1, &[1, 2], tags1)
        .way(2, &[3, 4], tags2)
        .build();
    TestSession::with_created(&graph).unwrap()
}

fn crossings(issues: &[Arc<Issue>]) -> Vec<Arc<Issue>> {
    issues
        .iter()
        .filter(|i| i.rule() == crossing_ways::ID)
        .cloned()
        .collect()
}

fn validate(session: &TestSession) -> (Validator, Vec<Arc<Issue>>) {
    let mut validator = Validator::default();
    validator.validate(&session.cx());
    let found = crossings(validator.issues());
    (validator, found)
}

#[test]
fn road_over_river_is_reported_once_from_both_ways() {
    let session = cross(&[("highway", "residential")], &[("waterway", "river")]);
    let (mut validator, found) = validate(&session);
    assert_eq!(found.len(), 1);
    let issue = &found[0];

    // Waterways sort first.
    assert_eq!(issue.entity_ids(), vec![EntityId::way(2), EntityId::way(1)]);
    let loc = issue.loc().unwrap();
    assert!((loc[0] - 0.001).abs() < 1e-12 && loc[1].abs() < 1e-12);

    let IssueInfo::Crossing(info) = issue.info() else {
        panic!("crossing payload expected");
    };
    assert_eq!(info.crossing_type, "highway-waterway");
    assert_eq!(
        info.connection_tags.as_ref().and_then(|t| t.get("ford")).map(String::as_str),
        Some("yes")
    );
    let titles: Vec<_> = issue.fixes().iter().map(|f| f.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Connect these features", "Add a bridge or tunnel", "Reposition the features"]
    );

    let cx = session.cx();
    let from_road = crossings(&validator.issues_for_entity(EntityId::way(1), &cx));
    let from_river = crossings(&validator.issues_for_entity(EntityId::way(2), &cx));
    assert_eq!(from_road.len(), 1);
    assert!(Arc::ptr_eq(&from_road[0], &from_river[0]));
    assert_eq!(from_road[0].id(), issue.id());
}

#[test]
fn one_bridge_is_legit_two_bridges_need_layers() {
    let road = [("highway", "residential")];
    let bridge = [("highway", "primary"), ("bridge", "yes")];
    let high_bridge = [("highway", "primary"), ("bridge", "yes"), ("layer", "1")];

    assert!(validate(&cross(&bridge, &road)).1.is_empty());
    assert!(validate(&cross(&bridge, &high_bridge)).1.is_empty());

    let (_, found) = validate(&cross(&bridge, &bridge));
    assert_eq!(found.len(), 1);
    let IssueInfo::Crossing(info) = found[0].info() else {
        panic!("crossing payload expected");
    };
    assert_eq!(info.crossing_type, "bridge-bridge_connectable");
    let commands: Vec<_> = found[0].fixes().iter().map(|f| f.command.clone()).collect();
    assert!(commands.contains(&FixCommand::ChangeLayer(LayerDirection::Higher)));
    assert!(commands.contains(&FixCommand::ChangeLayer(LayerDirection::Lower)));
}

#[test]
fn building_crossed_by_road_reports_first_crossing_only() {
    let graph = GraphBuilder::new()
        .node(1, [0.0, 0.0])
        .node(2, [0.002, 0.0])
        .node(3, [0.002, 0.002])
        .node(4, [0.0, 0.002])
        .node(5, [-0.001, 0.001])
        .node(6, [0.003, 0.001])
        .way(1, &[1, 2, 3, 4, 1], &[("building", "yes")])
        .way(2, &[5, 6], &[("highway", "service")])
        .build();
    let session = TestSession::with_created(&graph).unwrap();
    let (_, found) = validate(&session);

    assert_eq!(found.len(), 1);
    let issue = &found[0];
    // Highway before building.
    assert_eq!(issue.entity_ids(), vec![EntityId::way(2), EntityId::way(1)]);
    let loc = issue.loc().unwrap();
    assert!((loc[0] - 0.002).abs() < 1e-12 && (loc[1] - 0.001).abs() < 1e-12);
    let IssueInfo::Crossing(info) = issue.info() else {
        panic!("crossing payload expected");
    };
    assert_eq!(info.crossing_type, "building-highway");
    assert_eq!(info.connection_tags, None);
    assert!(issue.fixes().iter().all(|f| !f.is_actionable()));
}

#[test]
fn non_water_pairs_sort_by_descending_feature_type() {
    let (_, found) = validate(&cross(&[("highway", "residential")], &[("railway", "rail")]));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].entity_ids(), vec![EntityId::way(2), EntityId::way(1)]);
    let IssueInfo::Crossing(info) = found[0].info() else {
        panic!("crossing payload expected");
    };
    assert_eq!(info.crossing_type, "highway-railway");
}

#[test]
fn covered_road_through_building_is_legit() {
    let graph = GraphBuilder::new()
        .node(1, [0.0, 0.0])
        .node(2, [0.002, 0.0])
        .node(3, [0.002, 0.002])
        .node(4, [0.0, 0.002])
        .node(5, [-0.001, 0.001])
        .node(6, [0.003, 0.001])
        .way(1, &[1, 2, 3, 4, 1], &[("building", "yes")])
        .way(2, &[5, 6], &[("highway", "service"), ("covered", "yes")])
        .build();
    let session = TestSession::with_created(&graph).unwrap();
    assert!(validate(&session).1.is_empty());
}

#[test]
fn connect_fix_removes_the_crossing_and_undo_restores_it() {
    let mut session = cross(&[("highway", "residential")], &[("highway", "residential")]);
    let (mut validator, found) = validate(&session);
    assert_eq!(found.len(), 1);
    let before = found[0].id();
    assert!(matches!(
        found[0].fixes()[0].command,
        FixCommand::ConnectCrossingWays { .. }
    ));

    assert!(session.apply_fix(&found[0], 0).unwrap());
    validator.validate(&session.cx());
    assert!(crossings(validator.issues()).is_empty());
    let w1 = session.graph().way(EntityId::way(1)).unwrap();
    let w2 = session.graph().way(EntityId::way(2)).unwrap();
    assert_eq!(w1.nodes.len(), 3);
    assert_eq!(w1.nodes[1], w2.nodes[1]);

    assert!(session.history.undo().is_some());
    validator.validate(&session.cx());
    let again = crossings(validator.issues());
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].id(), before);
}

#[test]
fn change_layer_fix_needs_the_selection() {
    let bridge = [("highway", "primary"), ("bridge", "yes")];
    let mut session = cross(&bridge, &bridge);
    let (mut validator, found) = validate(&session);
    let issue = Arc::clone(&found[0]);
    let higher = issue
        .fixes()
        .iter()
        .position(|f| f.command == FixCommand::ChangeLayer(LayerDirection::Higher))
        .unwrap();

    assert!(!session.apply_fix(&issue, higher).unwrap());
    session.mode = EditMode::Select(vec![EntityId::way(1)]);
    assert!(session.apply_fix(&issue, higher).unwrap());
    let layer = session
        .graph()
        .way(EntityId::way(1))
        .and_then(|w| w.tags.get("layer").cloned());
    assert_eq!(layer.as_deref(), Some("1"));

    validator.validate(&session.cx());
    assert!(crossings(validator.issues()).is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn crossing_issues_are_shared_by_both_ways(
        ax in -0.002..0.0f64, ay in -0.002..0.002f64,
        bx in 0.001..0.003f64, by in -0.002..0.002f64,
        cy in -0.003..-0.001f64, dy in 0.001..0.003f64,
    ) {
        let graph = GraphBuilder::new()
            .node(1, [ax, ay])
            .node(2, [bx, by])
            .node(3, [0.0005, cy])
            .node(4, [0.0005, dy])
            .way(1, &[1, 2], &[("highway", "residential")])
            .way(2, &[3, 4], &[("railway", "rail")])
            .build();
        let session = TestSession::with_created(&graph).unwrap();
        let cx = session.cx();
        let mut validator = Validator::default();
        validator.validate(&cx);

        let ids = |v: &[Arc<Issue>]| crossings(v).iter().map(|i| i.id()).collect::<Vec<_>>();
        let first = ids(validator.issues());
        let from_road = ids(&validator.issues_for_entity(EntityId::way(1), &cx));
        let from_rail = ids(&validator.issues_for_entity(EntityId::way(2), &cx));
        prop_assert_eq!(&from_road, &from_rail);
        prop_assert_eq!(&first, &from_road);

        validator.validate(&cx);
        prop_assert_eq!(ids(validator.issues()), first);
    }
}
