// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::collaborators::{SettingsStore, StoreError};
use crate::management::yaml_store::YamlFile;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

const OVERRIDES_FILE_NAME: &str = "overrides.yaml";

type OverrideMap = BTreeMap<String, BTreeMap<String, Value>>;

/// Override records in `state/sys/overrides.yaml`, as `scope -> key -> value`.
pub struct OverrideStore {
    file: YamlFile,
    overrides: RwLock<OverrideMap>,
}

impl OverrideStore {
    pub fn new(state_sys_dir: &Path) -> Result<Self, StoreError> {
        let file = YamlFile::in_dir(state_sys_dir, OVERRIDES_FILE_NAME, "overrides");
        let mut overrides: OverrideMap = file
            .load()
            .map_err(|err| StoreError::new(err.to_string()))?
            .unwrap_or_default();
        overrides.retain(|_, keys| !keys.is_empty());
        Ok(Self {
            file,
            overrides: RwLock::new(overrides),
        })
    }

    pub fn snapshot(&self) -> Result<OverrideMap, StoreError> {
        self.overrides
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| StoreError::new("Override store lock poisoned"))
    }

    /// Returns the previous value, if any.
    pub fn set_override(
        &self,
        scope: &str,
        key: &str,
        value: Value,
    ) -> Result<Option<Value>, StoreError> {
        self.update(|overrides| {
            overrides
                .entry(scope.to_string())
                .or_default()
                .insert(key.to_string(), value)
        })
    }

    /// Returns whether a record existed.
    pub fn clear_override(&self, scope: &str, key: &str) -> Result<bool, StoreError> {
        self.update(|overrides| {
            let Some(keys) = overrides.get_mut(scope) else {
                return false;
            };
            let removed = keys.remove(key).is_some();
            if keys.is_empty() {
                overrides.remove(scope);
            }
            removed
        })
    }

    /// Applies `change` to a copy and persists it before the copy becomes visible.
    fn update<T>(&self, change: impl FnOnce(&mut OverrideMap) -> T) -> Result<T, StoreError> {
        let mut guard = self
            .overrides
            .write()
            .map_err(|_| StoreError::new("Override store lock poisoned"))?;
        let mut next = guard.clone();
        let result = change(&mut next);
        if next != *guard {
            self.file
                .store(&next)
                .map_err(|err| StoreError::new(err.to_string()))?;
            *guard = next;
        }
        Ok(result)
    }
}

impl SettingsStore for OverrideStore {
    fn get_override(&self, scope: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let guard = self
            .overrides
            .read()
            .map_err(|_| StoreError::new("Override store lock poisoned"))?;
        Ok(guard.get(scope).and_then(|keys| keys.get(key)).cloned())
    }

    fn overrides_for(&self, scope: &str) -> Result<BTreeMap<String, Value>, StoreError> {
        let guard = self
            .overrides
            .read()
            .map_err(|_| StoreError::new("Override store lock poisoned"))?;
        Ok(guard.get(scope).cloned().unwrap_or_default())
    }

    fn delete_all_overrides(&self, scope: &str) -> Result<usize, StoreError> {
        self.update(|overrides| overrides.remove(scope).map(|keys| keys.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;
    use serde_json::json;

    #[test]
    fn set_get_and_clear() {
        let fixture = TestFixtureRoot::new_unique("overrides-basic").unwrap();
        fixture.init_runtime_layout().unwrap();
        let store = OverrideStore::new(&fixture.state_sys_dir()).unwrap();

        assert_eq!(store.set_override("t1", "theme", json!("dark")).unwrap(), None);
        assert_eq!(
            store.set_override("t1", "theme", json!("light")).unwrap(),
            Some(json!("dark"))
        );
        assert_eq!(
            store.get_override("t1", "theme").unwrap(),
            Some(json!("light"))
        );
        assert!(store.clear_override("t1", "theme").unwrap());
        assert!(!store.clear_override("t1", "theme").unwrap());
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[test]
    fn delete_all_counts_records_and_persists() {
        let fixture = TestFixtureRoot::new_unique("overrides-delete").unwrap();
        fixture.init_runtime_layout().unwrap();
        {
            let store = OverrideStore::new(&fixture.state_sys_dir()).unwrap();
            store.set_override("t", "a", json!(1)).unwrap();
            store.set_override("t", "b", json!({"nested": [1, 2]})).unwrap();
            store.set_override("global", "a", json!(2)).unwrap();
            assert_eq!(store.delete_all_overrides("t").unwrap(), 2);
            assert_eq!(store.delete_all_overrides("t").unwrap(), 0);
        }
        let reloaded = OverrideStore::new(&fixture.state_sys_dir()).unwrap();
        assert!(reloaded.overrides_for("t").unwrap().is_empty());
        assert_eq!(reloaded.get_override("global", "a").unwrap(), Some(json!(2)));
    }

    #[test]
    fn loads_hand_written_yaml() {
        let fixture = TestFixtureRoot::new_unique("overrides-yaml").unwrap();
        fixture
            .write_state_file(
                OVERRIDES_FILE_NAME,
                "global:\n  quota: 10\n  theme: plain\neditors:\n  quota: 50\n  beta: true\n",
            )
            .unwrap();
        let store = OverrideStore::new(&fixture.state_sys_dir()).unwrap();
        assert_eq!(store.get_override("global", "quota").unwrap(), Some(json!(10)));
        assert_eq!(store.get_override("editors", "beta").unwrap(), Some(json!(true)));
        assert_eq!(store.overrides_for("editors").unwrap().len(), 2);
    }
}
