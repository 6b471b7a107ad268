// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::model::{ADMIN_TAG, GLOBAL_SCOPE, TagError, TagOrder, TagRecord};
use super::store::TagRegistry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Applies whole-sequence reorders of the mutable tags.
///
/// `admin` stays pinned at the head and `global` at the tail; neither may
/// appear in a payload.
#[derive(Clone)]
pub struct PriorityOrderManager {
    registry: Arc<TagRegistry>,
}

impl PriorityOrderManager {
    pub fn new(registry: Arc<TagRegistry>) -> Self {
        Self { registry }
    }

    /// Replaces the rank order with `new_order`.
    ///
    /// On any rejection the stored order is left as it was. When
    /// `expected_version` is given it must match the current version.
    pub fn reorder(
        &self,
        new_order: &[String],
        expected_version: Option<u64>,
    ) -> Result<Arc<TagOrder>, TagError> {
        let next = self
            .registry
            .commit(|current| validate_order(current, new_order, expected_version))?;
        log::info!(
            "Reordered {} tags (version {})",
            next.tags.len(),
            next.version
        );
        Ok(next)
    }
}

/// Checks `new_order` against `current` and returns the records in their new ranks.
pub fn validate_order(
    current: &TagOrder,
    new_order: &[String],
    expected_version: Option<u64>,
) -> Result<Vec<TagRecord>, TagError> {
    if let Some(expected) = expected_version
        && expected != current.version
    {
        return Err(TagError::InvalidOrder(format!(
            "Tag order changed since version {} (now {}); reload and retry",
            expected, current.version
        )));
    }

    let origins: BTreeMap<&str, _> = current
        .tags
        .iter()
        .map(|record| (record.id.as_str(), record.origin))
        .collect();
    let mut seen = BTreeSet::new();
    let mut records = Vec::with_capacity(new_order.len());
    for id in new_order {
        if id == ADMIN_TAG || id == GLOBAL_SCOPE {
            return Err(TagError::InvalidOrder(format!(
                "'{}' is pinned and cannot be reordered",
                id
            )));
        }
        if !seen.insert(id.as_str()) {
            return Err(TagError::InvalidOrder(format!(
                "Tag '{}' appears more than once",
                id
            )));
        }
        let origin = origins.get(id.as_str()).ok_or_else(|| {
            TagError::InvalidOrder(format!("Unknown tag '{}' (it may have been removed)", id))
        })?;
        records.push(TagRecord {
            id: id.clone(),
            origin: *origin,
        });
    }

    let missing: Vec<&str> = current.ids().filter(|id| !seen.contains(id)).collect();
    if !missing.is_empty() {
        return Err(TagError::InvalidOrder(format!(
            "Order omits tags: {}",
            missing.join(", ")
        )));
    }
    Ok(records)
}
