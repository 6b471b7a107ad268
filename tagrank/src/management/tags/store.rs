// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::model::{
    ScopeKind, Tag, TagError, TagOrder, TagOrigin, TagRecord, classify_scope, user_tag,
    validate_scope, validate_tag_id,
};
use crate::config::TagsConfig;
use crate::management::collaborators::{MembershipStore, SettingsStore};
use crate::management::yaml_store::YamlFile;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};

const TAGS_FILE_NAME: &str = "tags.yaml";

/// Counts of records dropped alongside a removed tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovedTag {
    pub overrides_deleted: usize,
    pub memberships_removed: usize,
}

/// The definitive list of tags and their ranks.
///
/// Readers take an `Arc` of the current [`TagOrder`] and never hold a lock
/// while walking it. Every writer serializes on `writer`, persists the next
/// order and only then swaps it in, so a reader sees the old or the new order
/// in full. Removal additionally holds `cascade` exclusively while it deletes
/// dependent records; resolution holds it shared.
pub struct TagRegistry {
    file: YamlFile,
    user_tag_prefix: String,
    max_tags: usize,
    order: RwLock<Arc<TagOrder>>,
    writer: Mutex<()>,
    cascade: RwLock<()>,
    settings: Arc<dyn SettingsStore>,
    members: Arc<dyn MembershipStore>,
}

impl TagRegistry {
    pub fn new(
        state_sys_dir: &Path,
        config: &TagsConfig,
        settings: Arc<dyn SettingsStore>,
        members: Arc<dyn MembershipStore>,
    ) -> Result<Self, TagError> {
        let file = YamlFile::in_dir(state_sys_dir, TAGS_FILE_NAME, "tags");
        let order = load_order(&file, &config.user_tag_prefix)?;
        log::debug!(
            "Loaded {} tags (version {}) from {}",
            order.tags.len(),
            order.version,
            file.path().display()
        );
        Ok(Self {
            file,
            user_tag_prefix: config.user_tag_prefix.clone(),
            max_tags: config.max_tags,
            order: RwLock::new(Arc::new(order)),
            writer: Mutex::new(()),
            cascade: RwLock::new(()),
            settings,
            members,
        })
    }

    pub fn snapshot(&self) -> Result<Arc<TagOrder>, TagError> {
        self.order
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| TagError::Internal("Tag registry lock poisoned".to_string()))
    }

    /// All tags, `admin` first, then the mutable tags in rank order.
    pub fn list_tags(&self) -> Result<Vec<Tag>, TagError> {
        Ok(self.snapshot()?.list())
    }

    pub fn user_tag_prefix(&self) -> &str {
        &self.user_tag_prefix
    }

    pub fn user_tag(&self, user_id: &str) -> String {
        user_tag(&self.user_tag_prefix, user_id)
    }

    pub fn classify<'a>(&self, id: &'a str) -> ScopeKind<'a> {
        classify_scope(id, &self.user_tag_prefix)
    }

    pub fn create_tag(&self, id: &str, origin: TagOrigin) -> Result<Tag, TagError> {
        self.ensure_listable(id)?;
        let order = self.commit(|current| {
            if current.contains(id) {
                return Err(TagError::AlreadyExists(id.to_string()));
            }
            if current.tags.len() >= self.max_tags {
                return Err(TagError::Invalid(format!(
                    "Tag limit of {} reached",
                    self.max_tags
                )));
            }
            let mut tags = current.tags.clone();
            tags.push(TagRecord {
                id: id.to_string(),
                origin,
            });
            Ok(tags)
        })?;
        log::info!(
            "Created {} tag '{}' at rank {}",
            origin.as_str(),
            id,
            order.tags.len() - 1
        );
        Ok(Tag {
            id: id.to_string(),
            rank: Some(order.tags.len() - 1),
            origin,
        })
    }

    /// Creates `id` at the lowest priority unless it already exists.
    ///
    /// Scopes that are never listed (`admin`, `global`, user tags) are
    /// accepted and left alone. Returns whether a tag was created.
    pub fn ensure_tag(&self, id: &str, origin: TagOrigin) -> Result<bool, TagError> {
        validate_scope(id, &self.user_tag_prefix)?;
        if self.classify(id) != ScopeKind::Listed {
            return Ok(false);
        }
        if self.snapshot()?.contains(id) {
            return Ok(false);
        }
        match self.create_tag(id, origin) {
            Ok(_) => Ok(true),
            Err(TagError::AlreadyExists(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Unlists a tag, closing the rank gap, then drops its override records
    /// and memberships.
    ///
    /// The compacted order is committed first, so a failing collaborator
    /// never leaves the tag listed with part of its records gone. Records
    /// left behind by such a failure are cleared by removing the id again.
    pub fn remove_tag(&self, id: &str) -> Result<RemovedTag, TagError> {
        match self.classify(id) {
            ScopeKind::Admin | ScopeKind::Global => {
                return Err(TagError::Forbidden(format!(
                    "Tag '{}' is built in and cannot be removed",
                    id
                )));
            }
            ScopeKind::User(_) => return Err(TagError::NotFound(format!("Tag '{}'", id))),
            ScopeKind::Listed => {}
        }

        let _cascade = self
            .cascade
            .write()
            .map_err(|_| TagError::Internal("Tag cascade lock poisoned".to_string()))?;
        let unlisted = match self.commit(|current| {
            let rank = current
                .rank_of(id)
                .ok_or_else(|| TagError::NotFound(format!("Tag '{}'", id)))?;
            let mut tags = current.tags.clone();
            tags.remove(rank);
            Ok(tags)
        }) {
            Ok(_) => true,
            Err(TagError::NotFound(_)) => false,
            Err(err) => return Err(err),
        };

        let removed = self.drop_dependents(id).inspect_err(|_| {
            if unlisted {
                log::error!(
                    "Tag '{}' was unlisted but some of its records remain; remove it again to retry",
                    id
                );
            }
        })?;
        if !unlisted {
            if removed == RemovedTag::default() {
                return Err(TagError::NotFound(format!("Tag '{}'", id)));
            }
            log::warn!("Cleared leftover records of unlisted tag '{}'", id);
        }
        log::info!(
            "Removed tag '{}' ({} overrides, {} memberships)",
            id,
            removed.overrides_deleted,
            removed.memberships_removed
        );
        Ok(removed)
    }

    fn drop_dependents(&self, id: &str) -> Result<RemovedTag, TagError> {
        let overrides_deleted = self.settings.delete_all_overrides(id).map_err(|err| {
            log::error!("Failed to delete overrides of tag '{}': {}", id, err);
            TagError::Internal(format!("Settings store error: {}", err))
        })?;
        let memberships_removed = self.members.remove_tag_everywhere(id).map_err(|err| {
            log::error!("Failed to drop memberships of tag '{}': {}", id, err);
            TagError::Internal(format!("Membership store error: {}", err))
        })?;
        Ok(RemovedTag {
            overrides_deleted,
            memberships_removed,
        })
    }

    /// Shared side of the cascade lock; held for the span of one resolution.
    pub(crate) fn cascade_read(&self) -> Result<RwLockReadGuard<'_, ()>, TagError> {
        self.cascade
            .read()
            .map_err(|_| TagError::Internal("Tag cascade lock poisoned".to_string()))
    }

    /// Runs one read-validate-write cycle under the writer lock.
    ///
    /// `mutate` receives the current order and returns the next rank list;
    /// the version is bumped by one and the result persisted before it
    /// becomes visible.
    pub(crate) fn commit<F>(&self, mutate: F) -> Result<Arc<TagOrder>, TagError>
    where
        F: FnOnce(&TagOrder) -> Result<Vec<TagRecord>, TagError>,
    {
        let _writer = self
            .writer
            .lock()
            .map_err(|_| TagError::Internal("Tag writer lock poisoned".to_string()))?;
        let current = self.snapshot()?;
        let tags = mutate(&current)?;
        let next = Arc::new(TagOrder {
            version: current.version + 1,
            tags,
        });
        self.file.store(next.as_ref()).map_err(|err| {
            log::error!("Failed to persist tag order: {}", err);
            TagError::Internal(err.to_string())
        })?;
        let mut guard = self
            .order
            .write()
            .map_err(|_| TagError::Internal("Tag registry lock poisoned".to_string()))?;
        *guard = next.clone();
        Ok(next)
    }

    fn ensure_listable(&self, id: &str) -> Result<(), TagError> {
        match self.classify(id) {
            ScopeKind::Admin => Err(TagError::Forbidden(
                "Tag 'admin' is built in and cannot be created".to_string(),
            )),
            ScopeKind::Global => Err(TagError::Forbidden(
                "'global' is the fallback scope, not a tag".to_string(),
            )),
            ScopeKind::User(_) => Err(TagError::Forbidden(format!(
                "User tags ('{}<id>') are implicit and cannot be listed",
                self.user_tag_prefix
            ))),
            ScopeKind::Listed => validate_tag_id(id),
        }
    }
}

fn load_order(file: &YamlFile, user_tag_prefix: &str) -> Result<TagOrder, TagError> {
    let order: TagOrder = match file.load() {
        Ok(Some(order)) => order,
        Ok(None) => return Ok(TagOrder::default()),
        Err(err) => return Err(TagError::Internal(err.to_string())),
    };
    let mut seen = BTreeSet::new();
    for record in &order.tags {
        if classify_scope(&record.id, user_tag_prefix) != ScopeKind::Listed {
            return Err(TagError::Internal(format!(
                "tags file lists reserved id '{}'",
                record.id
            )));
        }
        validate_tag_id(&record.id)
            .map_err(|err| TagError::Internal(format!("tags file: {}", err)))?;
        if !seen.insert(record.id.as_str()) {
            return Err(TagError::Internal(format!(
                "tags file lists '{}' more than once",
                record.id
            )));
        }
    }
    Ok(order)
}
