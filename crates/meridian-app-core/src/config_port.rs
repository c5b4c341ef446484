// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Best-effort preference port for editor front ends.

use tracing::warn;

use crate::config::{ConfigService, ConfigStore};
use crate::prefs::{load_prefs, save_prefs, ValidatorPrefs};

/// Loads and saves validator preferences without surfacing storage errors.
pub trait ConfigPort {
    /// Saved preferences; `None` when missing or unreadable.
    fn load_prefs(&self) -> Option<ValidatorPrefs>;
    /// Persists `prefs`; failures are logged and dropped.
    fn save_prefs(&self, prefs: &ValidatorPrefs);
}

impl<S: ConfigStore> ConfigPort for ConfigService<S> {
    fn load_prefs(&self) -> Option<ValidatorPrefs> {
        match load_prefs(self) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(%err, "could not load validator preferences");
                None
            }
        }
    }

    fn save_prefs(&self, prefs: &ValidatorPrefs) {
        if let Err(err) = save_prefs(self, prefs) {
            warn!(%err, "could not save validator preferences");
        }
    }
}
