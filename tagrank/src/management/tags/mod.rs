// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod model;
mod order;
pub(crate) mod store;

pub use model::{
    ADMIN_TAG, GLOBAL_SCOPE, ScopeKind, Tag, TagError, TagOrder, TagOrigin, TagRecord,
    validate_scope, validate_setting_key, validate_tag_id, validate_user_id,
};
pub use order::{PriorityOrderManager, validate_order};
pub use store::{RemovedTag, TagRegistry};

use crate::management::collaborators::SettingsStore;
use crate::management::core::{
    ManagementCommand, ManagementContext, ManagementRequest, ManagementResponse, ResponsePayload,
};
use crate::management::overrides::ScopeOverridesResponse;
use crate::management::registry::{ActionDescriptor, DomainDescriptor, ManagementRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const TAGS_DOMAIN_ID: u32 = 11;

pub const TAG_ACTION_LIST: u32 = 1;
pub const TAG_ACTION_CREATE: u32 = 2;
pub const TAG_ACTION_REMOVE: u32 = 3;
pub const TAG_ACTION_REORDER: u32 = 4;
pub const TAG_ACTION_SETTINGS: u32 = 5;

pub const TAG_ACTION_LIST_OK: u32 = 101;
pub const TAG_ACTION_LIST_ERR: u32 = 102;
pub const TAG_ACTION_CREATE_OK: u32 = 201;
pub const TAG_ACTION_CREATE_ERR: u32 = 202;
pub const TAG_ACTION_REMOVE_OK: u32 = 301;
pub const TAG_ACTION_REMOVE_ERR: u32 = 302;
pub const TAG_ACTION_REORDER_OK: u32 = 401;
pub const TAG_ACTION_REORDER_ERR: u32 = 402;
pub const TAG_ACTION_SETTINGS_OK: u32 = 501;
pub const TAG_ACTION_SETTINGS_ERR: u32 = 502;

#[derive(Debug, Clone)]
pub enum TagCommand {
    List(TagListRequest),
    Create(TagCreateRequest),
    Remove(TagRemoveRequest),
    Reorder(TagReorderRequest),
    Settings(TagSettingsRequest),
}

impl TagCommand {
    pub fn action_id(&self) -> u32 {
        match self {
            TagCommand::List(_) => TAG_ACTION_LIST,
            TagCommand::Create(_) => TAG_ACTION_CREATE,
            TagCommand::Remove(_) => TAG_ACTION_REMOVE,
            TagCommand::Reorder(_) => TAG_ACTION_REORDER,
            TagCommand::Settings(_) => TAG_ACTION_SETTINGS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagListRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCreateRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRemoveRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagReorderRequest {
    pub order: Vec<String>,
    /// Version the caller last saw; omitted means set-based validation only.
    #[serde(default)]
    pub version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSettingsRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagListResponse {
    pub version: u64,
    pub tags: Vec<Tag>,
}

impl From<&TagOrder> for TagListResponse {
    fn from(order: &TagOrder) -> Self {
        Self {
            version: order.version,
            tags: order.list(),
        }
    }
}

pub fn register(registry: &mut ManagementRegistry) -> Result<(), crate::management::RegistryError> {
    registry.register_domain(
        DomainDescriptor {
            name: "tag",
            id: TAGS_DOMAIN_ID,
            actions: vec![
                ActionDescriptor::new("list", TAG_ACTION_LIST),
                ActionDescriptor::new("create", TAG_ACTION_CREATE),
                ActionDescriptor::new("remove", TAG_ACTION_REMOVE),
                ActionDescriptor::new("reorder", TAG_ACTION_REORDER),
                ActionDescriptor::new("settings", TAG_ACTION_SETTINGS),
            ],
        },
        domain_handler!(handle_tags_request),
    )
}

async fn handle_tags_request(
    request: ManagementRequest,
    context: Arc<ManagementContext>,
) -> crate::management::errors::DomainResult<ManagementResponse> {
    let workflow_id = request.workflow_id;
    let response = match request.command {
        ManagementCommand::Tags(TagCommand::List(_)) => handle_list(workflow_id, &context),
        ManagementCommand::Tags(TagCommand::Create(payload)) => {
            handle_create(payload, workflow_id, &context)
        }
        ManagementCommand::Tags(TagCommand::Remove(payload)) => {
            handle_remove(payload, workflow_id, &context)
        }
        ManagementCommand::Tags(TagCommand::Reorder(payload)) => {
            handle_reorder(payload, workflow_id, &context)
        }
        ManagementCommand::Tags(TagCommand::Settings(payload)) => {
            handle_settings(payload, workflow_id, &context)
        }
        _ => response_err(
            TAG_ACTION_LIST_ERR,
            workflow_id,
            &TagError::Invalid("Invalid tag command".to_string()),
        ),
    };
    Ok(response)
}

fn handle_list(workflow_id: u32, context: &ManagementContext) -> ManagementResponse {
    match context.tag_registry.snapshot() {
        Ok(order) => response_payload(
            TAG_ACTION_LIST_OK,
            workflow_id,
            ResponsePayload::TagList(TagListResponse::from(order.as_ref())),
        ),
        Err(err) => response_err(TAG_ACTION_LIST_ERR, workflow_id, &err),
    }
}

fn handle_create(
    payload: TagCreateRequest,
    workflow_id: u32,
    context: &ManagementContext,
) -> ManagementResponse {
    match context
        .tag_registry
        .create_tag(payload.id.trim(), TagOrigin::Explicit)
    {
        Ok(tag) => response_ok(
            TAG_ACTION_CREATE_OK,
            workflow_id,
            &format!(
                "Tag '{}' created at rank {}",
                tag.id,
                tag.rank.unwrap_or_default()
            ),
        ),
        Err(err) => response_err(TAG_ACTION_CREATE_ERR, workflow_id, &err),
    }
}

fn handle_remove(
    payload: TagRemoveRequest,
    workflow_id: u32,
    context: &ManagementContext,
) -> ManagementResponse {
    match context.tag_registry.remove_tag(payload.id.trim()) {
        Ok(removed) => response_ok(
            TAG_ACTION_REMOVE_OK,
            workflow_id,
            &format!(
                "Tag '{}' removed ({} overrides, {} memberships)",
                payload.id.trim(),
                removed.overrides_deleted,
                removed.memberships_removed
            ),
        ),
        Err(err) => response_err(TAG_ACTION_REMOVE_ERR, workflow_id, &err),
    }
}

fn handle_reorder(
    payload: TagReorderRequest,
    workflow_id: u32,
    context: &ManagementContext,
) -> ManagementResponse {
    match context
        .order_manager
        .reorder(&payload.order, payload.version)
    {
        Ok(order) => response_payload(
            TAG_ACTION_REORDER_OK,
            workflow_id,
            ResponsePayload::TagList(TagListResponse::from(order.as_ref())),
        ),
        Err(err) => {
            log::debug!("Rejected tag reorder: {}", err);
            response_err(TAG_ACTION_REORDER_ERR, workflow_id, &err)
        }
    }
}

fn handle_settings(
    payload: TagSettingsRequest,
    workflow_id: u32,
    context: &ManagementContext,
) -> ManagementResponse {
    let id = payload.id.trim();
    let registry = &context.tag_registry;
    let known = match registry.classify(id) {
        ScopeKind::Admin | ScopeKind::Global => true,
        ScopeKind::User(user_id) => validate_user_id(user_id).is_ok(),
        ScopeKind::Listed => match registry.snapshot() {
            Ok(order) => order.contains(id),
            Err(err) => return response_err(TAG_ACTION_SETTINGS_ERR, workflow_id, &err),
        },
    };
    if !known {
        return response_err(
            TAG_ACTION_SETTINGS_ERR,
            workflow_id,
            &TagError::NotFound(format!("Tag '{}'", id)),
        );
    }
    match context.override_store.overrides_for(id) {
        Ok(overrides) => response_payload(
            TAG_ACTION_SETTINGS_OK,
            workflow_id,
            ResponsePayload::ScopeOverrides(ScopeOverridesResponse {
                scope: id.to_string(),
                overrides,
            }),
        ),
        Err(err) => response_err(
            TAG_ACTION_SETTINGS_ERR,
            workflow_id,
            &TagError::Internal(err.to_string()),
        ),
    }
}

define_domain_responses!(TAGS_DOMAIN_ID);
