// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Application services around the Meridian validator: a keyed JSON config
//! store and persisted validator preferences.

pub mod config;
pub mod config_port;
pub mod prefs;

pub use config::{ConfigError, ConfigService, ConfigStore};
pub use config_port::ConfigPort;
pub use prefs::{load_prefs, save_prefs, ValidatorPrefs, PREFS_KEY};
