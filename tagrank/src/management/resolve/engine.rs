// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::collaborators::{MembershipStore, SettingsStore, StoreError};
use crate::management::errors::{DomainError, ManagementErrorKind};
use crate::management::tags::{
    ADMIN_TAG, GLOBAL_SCOPE, TagError, TagOrder, TagRegistry, validate_setting_key,
    validate_user_id,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found { value: Value, source: String },
    NoOverride,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSetting {
    pub value: Value,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    Invalid(String),
    Internal(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Invalid(message) | ResolveError::Internal(message) => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for ResolveError {}

impl DomainError for ResolveError {
    fn kind(&self) -> ManagementErrorKind {
        match self {
            ResolveError::Invalid(_) => ManagementErrorKind::Validation,
            ResolveError::Internal(_) => ManagementErrorKind::Internal,
        }
    }
}

impl From<TagError> for ResolveError {
    fn from(err: TagError) -> Self {
        match err {
            TagError::Invalid(message) => ResolveError::Invalid(message),
            other => ResolveError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        log::error!("Resolution store failure: {}", err);
        ResolveError::Internal(err.to_string())
    }
}

/// Picks the authoritative override for a user and a setting key.
///
/// Results are a pure function of the registry snapshot, the user's tags and
/// the override records; walk position is the only tie-break.
#[derive(Clone)]
pub struct ResolutionEngine {
    registry: Arc<TagRegistry>,
    settings: Arc<dyn SettingsStore>,
    members: Arc<dyn MembershipStore>,
}

impl ResolutionEngine {
    pub fn new(
        registry: Arc<TagRegistry>,
        settings: Arc<dyn SettingsStore>,
        members: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            registry,
            settings,
            members,
        }
    }

    /// Scopes consulted for `user_id`, highest precedence first.
    pub fn effective_sequence(&self, user_id: &str) -> Result<Vec<String>, ResolveError> {
        validate_user_id(user_id)?;
        let _cascade = self.registry.cascade_read()?;
        self.sequence_for(user_id)
    }

    pub fn resolve(&self, user_id: &str, key: &str) -> Result<Resolution, ResolveError> {
        validate_user_id(user_id)?;
        validate_setting_key(key)?;
        let _cascade = self.registry.cascade_read()?;
        for scope in self.sequence_for(user_id)? {
            if let Some(value) = self.settings.get_override(&scope, key)? {
                log::trace!("Resolved '{}' for '{}' from '{}'", key, user_id, scope);
                return Ok(Resolution::Found {
                    value,
                    source: scope,
                });
            }
        }
        Ok(Resolution::NoOverride)
    }

    /// Every key overridden by any scope the user has, with its winning value.
    pub fn effective_settings(
        &self,
        user_id: &str,
    ) -> Result<BTreeMap<String, ResolvedSetting>, ResolveError> {
        Ok(self.explain(user_id)?.1)
    }

    /// Sequence and effective settings taken from one consistent view.
    pub fn explain(
        &self,
        user_id: &str,
    ) -> Result<(Vec<String>, BTreeMap<String, ResolvedSetting>), ResolveError> {
        validate_user_id(user_id)?;
        let _cascade = self.registry.cascade_read()?;
        let sequence = self.sequence_for(user_id)?;
        let mut settings = BTreeMap::new();
        for scope in &sequence {
            for (key, value) in self.settings.overrides_for(scope)? {
                settings.entry(key).or_insert_with(|| ResolvedSetting {
                    value,
                    source: scope.clone(),
                });
            }
        }
        Ok((sequence, settings))
    }

    fn sequence_for(&self, user_id: &str) -> Result<Vec<String>, ResolveError> {
        let order = self.registry.snapshot()?;
        let possessed = self.members.tags_for_user(user_id)?;
        Ok(build_sequence(
            &order,
            self.registry.user_tag(user_id),
            &possessed,
        ))
    }
}

/// `[user tag] ++ [admin if held] ++ held tags by rank ++ [global]`.
///
/// Held ids that are not listed (stale memberships) are ignored.
pub fn build_sequence(
    order: &TagOrder,
    user_scope: String,
    possessed: &BTreeSet<String>,
) -> Vec<String> {
    let mut sequence = Vec::with_capacity(possessed.len() + 3);
    sequence.push(user_scope);
    if possessed.contains(ADMIN_TAG) {
        sequence.push(ADMIN_TAG.to_string());
    }
    sequence.extend(
        order
            .ids()
            .filter(|id| possessed.contains(*id))
            .map(str::to_string),
    );
    sequence.push(GLOBAL_SCOPE.to_string());
    sequence
}
