// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake.

use meridian_app_core::config::{ConfigError, ConfigStore};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// [`ConfigStore`] backed by a shared map, with call counters and injectable
/// failures.
///
/// Clones share state, so a test can hand one clone to a
/// [`meridian_app_core::ConfigService`] and inspect the other.
///
/// # Example
///
/// ```
/// use meridian_dry_tests::InMemoryConfigStore;
/// use meridian_app_core::{load_prefs, save_prefs, ConfigService, ValidatorPrefs};
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
/// save_prefs(&service, &ValidatorPrefs::default()).unwrap();
/// assert!(store.contains_key("validator"));
/// assert_eq!(load_prefs(&service).unwrap(), Some(ValidatorPrefs::default()));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `raw` under `key`.
    pub fn with_raw(key: &str, raw: &[u8]) -> Self {
        let store = Self::new();
        store.lock().data.insert(key.to_owned(), raw.to_vec());
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Makes every subsequent `load_raw` fail with [`ConfigError::Other`].
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_on_load = fail;
    }

    /// Makes every subsequent `save_raw` fail with [`ConfigError::Other`].
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_on_save = fail;
    }

    /// `load_raw` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    /// `save_raw` attempts, failed ones included.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// `true` when a blob is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    /// The raw blob stored under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().data.get(key).cloned()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.lock();
        inner.load_count += 1;
        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }
        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.lock();
        inner.save_count += 1;
        if inner.fail_on_save {
            return Err(ConfigError::Other("simulated save failure".into()));
        }
        inner.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn missing_key_is_not_found() {
        let store = InMemoryConfigStore::new();
        assert!(matches!(store.load_raw("validator"), Err(ConfigError::NotFound)));
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn clones_share_data_and_failures() {
        let a = InMemoryConfigStore::new();
        let b = a.clone();
        a.save_raw("validator", b"{}").unwrap();
        assert_eq!(b.raw("validator").as_deref(), Some(&b"{}"[..]));
        b.set_fail_on_save(true);
        assert!(matches!(a.save_raw("x", b"1"), Err(ConfigError::Other(_))));
        assert!(!a.contains_key("x"));
        assert_eq!(a.save_count(), 2);
    }
}
