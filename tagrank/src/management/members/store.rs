// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::collaborators::{MembershipStore, StoreError};
use crate::management::yaml_store::YamlFile;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::RwLock;

const MEMBERS_FILE_NAME: &str = "members.yaml";

type MemberMap = BTreeMap<String, BTreeSet<String>>;

/// User to tag assignments in `state/sys/members.yaml`.
pub struct MemberStore {
    file: YamlFile,
    members: RwLock<MemberMap>,
}

impl MemberStore {
    pub fn new(state_sys_dir: &Path) -> Result<Self, StoreError> {
        let file = YamlFile::in_dir(state_sys_dir, MEMBERS_FILE_NAME, "members");
        let mut members: MemberMap = file
            .load()
            .map_err(|err| StoreError::new(err.to_string()))?
            .unwrap_or_default();
        members.retain(|_, tags| !tags.is_empty());
        Ok(Self {
            file,
            members: RwLock::new(members),
        })
    }

    /// Returns whether the assignment is new.
    pub fn assign(&self, user_id: &str, tag_id: &str) -> Result<bool, StoreError> {
        self.update(|members| {
            members
                .entry(user_id.to_string())
                .or_default()
                .insert(tag_id.to_string())
        })
    }

    /// Returns whether the user held the tag.
    pub fn unassign(&self, user_id: &str, tag_id: &str) -> Result<bool, StoreError> {
        self.update(|members| {
            let Some(tags) = members.get_mut(user_id) else {
                return false;
            };
            let removed = tags.remove(tag_id);
            if tags.is_empty() {
                members.remove(user_id);
            }
            removed
        })
    }

    pub fn users(&self) -> Result<Vec<String>, StoreError> {
        self.members
            .read()
            .map(|guard| guard.keys().cloned().collect())
            .map_err(|_| StoreError::new("Member store lock poisoned"))
    }

    fn update<T>(&self, change: impl FnOnce(&mut MemberMap) -> T) -> Result<T, StoreError> {
        let mut guard = self
            .members
            .write()
            .map_err(|_| StoreError::new("Member store lock poisoned"))?;
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

impl MembershipStore for MemberStore {
    fn tags_for_user(&self, user_id: &str) -> Result<BTreeSet<String>, StoreError> {
        let guard = self
            .members
            .read()
            .map_err(|_| StoreError::new("Member store lock poisoned"))?;
        Ok(guard.get(user_id).cloned().unwrap_or_default())
    }

    fn remove_tag_everywhere(&self, tag_id: &str) -> Result<usize, StoreError> {
        self.update(|members| {
            let count = members
                .values_mut()
                .map(|tags| tags.remove(tag_id))
                .filter(|removed| *removed)
                .count();
            members.retain(|_, tags| !tags.is_empty());
            count
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    #[test]
    fn assign_and_unassign_round_trip_through_disk() {
        let fixture = TestFixtureRoot::new_unique("members-basic").unwrap();
        fixture.init_runtime_layout().unwrap();
        {
            let store = MemberStore::new(&fixture.state_sys_dir()).unwrap();
            assert!(store.assign("alice", "editors").unwrap());
            assert!(!store.assign("alice", "editors").unwrap());
            assert!(store.assign("alice", "admin").unwrap());
            assert!(store.assign("bob", "viewers").unwrap());
            assert!(store.unassign("bob", "viewers").unwrap());
            assert!(!store.unassign("bob", "viewers").unwrap());
        }
        let store = MemberStore::new(&fixture.state_sys_dir()).unwrap();
        let tags = store.tags_for_user("alice").unwrap();
        assert!(tags.contains("editors"));
        assert!(tags.contains("admin"));
        assert!(store.tags_for_user("bob").unwrap().is_empty());
        assert_eq!(store.users().unwrap(), vec!["alice".to_string()]);
    }

    #[test]
    fn remove_tag_everywhere_counts_holders() {
        let fixture = TestFixtureRoot::new_unique("members-cascade").unwrap();
        fixture.init_runtime_layout().unwrap();
        let store = MemberStore::new(&fixture.state_sys_dir()).unwrap();
        store.assign("alice", "t").unwrap();
        store.assign("bob", "t").unwrap();
        store.assign("bob", "u").unwrap();

        assert_eq!(store.remove_tag_everywhere("t").unwrap(), 2);
        assert_eq!(store.remove_tag_everywhere("t").unwrap(), 0);
        assert_eq!(store.users().unwrap(), vec!["bob".to_string()]);
        let contents = fixture.read_state_file(MEMBERS_FILE_NAME).unwrap();
        assert!(!contents.contains("alice"));
    }
}
