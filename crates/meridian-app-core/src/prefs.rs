// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted validator preferences.

use meridian_core::{Validator, ValidatorConfig};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigService, ConfigStore};

/// Store key the validator preferences live under.
pub const PREFS_KEY: &str = "validator";

/// Saved validator settings.
///
/// Unknown fields are ignored and missing ones take their defaults, so older
/// blobs keep loading as settings are added.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorPrefs {
    /// Rule toggles, thresholds and user rules.
    pub config: ValidatorConfig,
}

impl ValidatorPrefs {
    /// Captures the current settings of `validator`.
    pub fn capture(validator: &Validator) -> Self {
        Self {
            config: validator.config().clone(),
        }
    }

    /// Installs these settings on `validator`; they apply from its next pass.
    pub fn apply(&self, validator: &mut Validator) {
        validator.set_config(self.config.clone());
    }
}

/// Loads the preferences stored under [`PREFS_KEY`]; `Ok(None)` when none
/// were saved.
pub fn load_prefs<S: ConfigStore>(
    service: &ConfigService<S>,
) -> Result<Option<ValidatorPrefs>, ConfigError> {
    service.load(PREFS_KEY)
}

/// Saves `prefs` under [`PREFS_KEY`].
pub fn save_prefs<S: ConfigStore>(
    service: &ConfigService<S>,
    prefs: &ValidatorPrefs,
) -> Result<(), ConfigError> {
    service.save(PREFS_KEY, prefs)
}
