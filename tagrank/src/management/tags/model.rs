// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::errors::{DomainError, ManagementErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed head of every ordered tag sequence.
pub const ADMIN_TAG: &str = "admin";
/// Fallback scope appended at resolution time; never a listed tag.
pub const GLOBAL_SCOPE: &str = "global";

const MAX_TAG_ID_CHARS: usize = 128;
const MAX_USER_ID_CHARS: usize = 128;
const MAX_SETTING_KEY_CHARS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagOrigin {
    Explicit,
    Implicit,
}

impl TagOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagOrigin::Explicit => "explicit",
            TagOrigin::Implicit => "implicit",
        }
    }
}

/// Persisted entry of the mutable part of the order; its list position is its rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagRecord {
    pub id: String,
    pub origin: TagOrigin,
}

/// Versioned snapshot of the mutable tags, lowest rank first.
///
/// `admin` is not stored; it is prepended by [`TagOrder::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagOrder {
    pub version: u64,
    #[serde(default)]
    pub tags: Vec<TagRecord>,
}

impl TagOrder {
    pub fn contains(&self, id: &str) -> bool {
        self.tags.iter().any(|record| record.id == id)
    }

    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.tags.iter().position(|record| record.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|record| record.id.as_str())
    }

    pub fn list(&self) -> Vec<Tag> {
        let mut tags = Vec::with_capacity(self.tags.len() + 1);
        tags.push(Tag {
            id: ADMIN_TAG.to_string(),
            rank: None,
            origin: TagOrigin::Explicit,
        });
        tags.extend(self.tags.iter().enumerate().map(|(rank, record)| Tag {
            id: record.id.clone(),
            rank: Some(rank),
            origin: record.origin,
        }));
        tags
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    /// `None` for `admin`, which sits above every ranked tag.
    pub rank: Option<usize>,
    pub origin: TagOrigin,
}

/// What a scope id refers to, given the configured user tag prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind<'a> {
    Admin,
    Global,
    User(&'a str),
    Listed,
}

pub fn classify_scope<'a>(id: &'a str, user_tag_prefix: &str) -> ScopeKind<'a> {
    if id == ADMIN_TAG {
        ScopeKind::Admin
    } else if id == GLOBAL_SCOPE {
        ScopeKind::Global
    } else if let Some(user_id) = id.strip_prefix(user_tag_prefix) {
        ScopeKind::User(user_id)
    } else {
        ScopeKind::Listed
    }
}

pub fn user_tag(user_tag_prefix: &str, user_id: &str) -> String {
    format!("{}{}", user_tag_prefix, user_id)
}

pub fn validate_tag_id(id: &str) -> Result<(), TagError> {
    if id.is_empty() {
        return Err(TagError::Invalid("Tag id is required".to_string()));
    }
    if id.chars().count() > MAX_TAG_ID_CHARS {
        return Err(TagError::Invalid(format!(
            "Tag id must be at most {} characters",
            MAX_TAG_ID_CHARS
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '.')
    {
        return Err(TagError::Invalid(format!(
            "Tag id '{}' contains invalid characters",
            id
        )));
    }
    Ok(())
}

pub fn validate_user_id(user_id: &str) -> Result<(), TagError> {
    if user_id.is_empty() {
        return Err(TagError::Invalid("User id is required".to_string()));
    }
    if user_id.chars().count() > MAX_USER_ID_CHARS {
        return Err(TagError::Invalid(format!(
            "User id must be at most {} characters",
            MAX_USER_ID_CHARS
        )));
    }
    if user_id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(TagError::Invalid(
            "User id must not contain whitespace".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_setting_key(key: &str) -> Result<(), TagError> {
    if key.is_empty() {
        return Err(TagError::Invalid("Setting key is required".to_string()));
    }
    if key.chars().count() > MAX_SETTING_KEY_CHARS {
        return Err(TagError::Invalid(format!(
            "Setting key must be at most {} characters",
            MAX_SETTING_KEY_CHARS
        )));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(TagError::Invalid(
            "Setting key must not contain whitespace".to_string(),
        ));
    }
    Ok(())
}

/// Validates any scope an override may be recorded against.
pub fn validate_scope(id: &str, user_tag_prefix: &str) -> Result<(), TagError> {
    match classify_scope(id, user_tag_prefix) {
        ScopeKind::Admin | ScopeKind::Global => Ok(()),
        ScopeKind::User(user_id) => validate_user_id(user_id),
        ScopeKind::Listed => validate_tag_id(id),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    NotFound(String),
    Forbidden(String),
    AlreadyExists(String),
    Invalid(String),
    InvalidOrder(String),
    Internal(String),
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagError::NotFound(what) => write!(f, "{} not found", what),
            TagError::Forbidden(message)
            | TagError::Invalid(message)
            | TagError::InvalidOrder(message)
            | TagError::Internal(message) => write!(f, "{}", message),
            TagError::AlreadyExists(id) => write!(f, "Tag '{}' already exists", id),
        }
    }
}

impl std::error::Error for TagError {}

impl DomainError for TagError {
    fn kind(&self) -> ManagementErrorKind {
        match self {
            TagError::NotFound(_) => ManagementErrorKind::NotFound,
            TagError::Forbidden(_) => ManagementErrorKind::Forbidden,
            TagError::AlreadyExists(_) => ManagementErrorKind::Conflict,
            TagError::Invalid(_) => ManagementErrorKind::Validation,
            TagError::InvalidOrder(_) => ManagementErrorKind::InvalidOrder,
            TagError::Internal(_) => ManagementErrorKind::Internal,
        }
    }
}
