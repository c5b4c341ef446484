// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! Validator preferences persisted through the config service.

use meridian_app_core::{
    load_prefs, save_prefs, ConfigError, ConfigPort, ConfigService, ValidatorPrefs, PREFS_KEY,
};
use meridian_core::{tags_from, Geometry, MapRuleSpec, Severity, Validator};
use meridian_dry_tests::InMemoryConfigStore;

fn customised() -> ValidatorPrefs {
    let mut prefs = ValidatorPrefs::default();
    prefs.config.disabled_rules.insert("crossing_ways".to_owned());
    prefs.config.many_deletions_threshold = 20;
    prefs.config.maprules.push(MapRuleSpec {
        name: "named bakeries".to_owned(),
        geometry: vec![Geometry::Point],
        equals: tags_from([("shop", "bakery")]),
        present: Vec::new(),
        absent: vec!["name".to_owned()],
        severity: Severity::Error,
        message: "Bakery without a name.".to_owned(),
    });
    prefs
}

#[test]
fn prefs_round_trip_through_the_store() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    let prefs = customised();
    save_prefs(&service, &prefs).unwrap();

    let raw = String::from_utf8(store.raw(PREFS_KEY).unwrap()).unwrap();
    assert!(raw.contains("\"crossing_ways\""));
    assert!(raw.contains("\"point\""));
    assert_eq!(load_prefs(&service).unwrap(), Some(prefs));
}

#[test]
fn missing_or_empty_prefs_load_as_none() {
    let service = ConfigService::new(InMemoryConfigStore::new());
    assert_eq!(load_prefs(&service).unwrap(), None);
    let empty = ConfigService::new(InMemoryConfigStore::with_raw(PREFS_KEY, b""));
    assert_eq!(load_prefs(&empty).unwrap(), None);
}

#[test]
fn partial_blobs_fill_in_defaults() {
    let raw = br#"{"config":{"disabled_rules":["missing_tag"],"future_setting":true}}"#;
    let service = ConfigService::new(InMemoryConfigStore::with_raw(PREFS_KEY, raw));
    let prefs = load_prefs(&service).unwrap().unwrap();
    assert!(prefs.config.is_disabled("missing_tag"));
    assert_eq!(prefs.config.many_deletions_threshold, 100);
    assert!(prefs.config.maprules.is_empty());
}

#[test]
fn corrupt_blob_is_a_serde_error() {
    let service = ConfigService::new(InMemoryConfigStore::with_raw(PREFS_KEY, b"{not json"));
    assert!(matches!(load_prefs(&service), Err(ConfigError::Serde(_))));
    assert_eq!(ConfigPort::load_prefs(&service), None);
}

#[test]
fn port_swallows_store_failures() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    store.set_fail_on_save(true);
    ConfigPort::save_prefs(&service, &customised());
    assert_eq!(store.save_count(), 1);
    assert!(!store.contains_key(PREFS_KEY));

    store.set_fail_on_save(false);
    ConfigPort::save_prefs(&service, &customised());
    store.set_fail_on_load(true);
    assert_eq!(ConfigPort::load_prefs(&service), None);
    store.set_fail_on_load(false);
    assert_eq!(ConfigPort::load_prefs(&service), Some(customised()));
}

#[test]
fn capture_and_apply_move_settings_between_validators() {
    let mut source = Validator::default();
    customised().apply(&mut source);
    let captured = ValidatorPrefs::capture(&source);
    assert_eq!(captured, customised());

    let mut target = Validator::default();
    assert!(target.disabled_rules().is_empty());
    captured.apply(&mut target);
    assert!(target.disabled_rules().contains("crossing_ways"));
    assert_eq!(target.config().many_deletions_threshold, 20);
}
