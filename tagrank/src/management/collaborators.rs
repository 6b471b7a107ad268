// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Seams between the tag engine and the stores it reads from.
//!
//! The registry and the resolution engine only ever talk to these traits; the
//! YAML-backed stores in `overrides` and `members` are one implementation.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone)]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StoreError {}

/// Override records keyed by (scope, setting key).
///
/// A scope is a listed tag id, `admin`, `global` or a user tag.
pub trait SettingsStore: Send + Sync {
    fn get_override(&self, scope: &str, key: &str) -> Result<Option<Value>, StoreError>;

    fn overrides_for(&self, scope: &str) -> Result<BTreeMap<String, Value>, StoreError>;

    /// Returns how many records were deleted.
    fn delete_all_overrides(&self, scope: &str) -> Result<usize, StoreError>;
}

pub trait MembershipStore: Send + Sync {
    fn tags_for_user(&self, user_id: &str) -> Result<BTreeSet<String>, StoreError>;

    /// Drops `tag_id` from every user; returns how many users held it.
    fn remove_tag_everywhere(&self, tag_id: &str) -> Result<usize, StoreError>;
}
