// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

macro_rules! define_domain_responses {
    ($domain_id:expr) => {
        #[allow(dead_code)]
        fn response_ok(
            action_id: u32,
            workflow_id: u32,
            message: &str,
        ) -> crate::management::ManagementResponse {
            crate::management::ManagementResponse::message(
                $domain_id,
                action_id,
                workflow_id,
                message,
            )
        }

        fn response_err(
            action_id: u32,
            workflow_id: u32,
            err: &dyn crate::management::DomainError,
        ) -> crate::management::ManagementResponse {
            crate::management::ManagementResponse::error(
                $domain_id,
                action_id,
                workflow_id,
                err.kind(),
                err.to_string(),
            )
        }

        #[allow(dead_code)]
        fn response_payload(
            action_id: u32,
            workflow_id: u32,
            payload: crate::management::ResponsePayload,
        ) -> crate::management::ManagementResponse {
            crate::management::ManagementResponse {
                domain_id: $domain_id,
                action_id,
                workflow_id,
                payload,
            }
        }
    };
}

macro_rules! domain_handler {
    ($handle:path) => {{
        let handler: crate::management::ManagementHandler =
            std::sync::Arc::new(|request, context| {
                Box::pin(async move { $handle(request, context).await })
            });
        handler
    }};
}

mod bus;
pub mod cli;
pub mod cli_helper;
mod collaborators;
mod core;
mod errors;
mod ids;
mod members;
mod overrides;
mod registry;
mod resolve;
mod tags;
mod yaml_store;

pub use bus::ManagementBus;
pub use collaborators::{MembershipStore, SettingsStore, StoreError};
pub use core::{
    ErrorResponse, ManagementCommand, ManagementContext, ManagementRequest, ManagementResponse,
    MessageResponse, ResponsePayload,
};
pub use errors::{DomainError, DomainResult, ManagementError, ManagementErrorKind};
pub use ids::{next_connection_id, next_workflow_id};
pub use members::{
    MEMBER_ACTION_ASSIGN, MEMBER_ACTION_ASSIGN_ERR, MEMBER_ACTION_ASSIGN_OK, MEMBER_ACTION_SHOW,
    MEMBER_ACTION_SHOW_ERR, MEMBER_ACTION_SHOW_OK, MEMBER_ACTION_UNASSIGN,
    MEMBER_ACTION_UNASSIGN_ERR, MEMBER_ACTION_UNASSIGN_OK, MEMBERS_DOMAIN_ID, MemberAssignRequest,
    MemberCommand, MemberShowRequest, MemberShowResponse, MemberStore, MemberUnassignRequest,
};
pub use overrides::{
    OVERRIDE_ACTION_CLEAR, OVERRIDE_ACTION_CLEAR_ERR, OVERRIDE_ACTION_CLEAR_OK,
    OVERRIDE_ACTION_SET, OVERRIDE_ACTION_SET_ERR, OVERRIDE_ACTION_SET_OK, OVERRIDE_ACTION_SHOW,
    OVERRIDE_ACTION_SHOW_ERR, OVERRIDE_ACTION_SHOW_OK, OVERRIDES_DOMAIN_ID, OverrideClearRequest,
    OverrideCommand, OverrideSetRequest, OverrideShowRequest, OverrideStore,
    ScopeOverridesResponse,
};
pub use registry::{
    ActionDescriptor, DomainActionKey, DomainDescriptor, ManagementHandler, ManagementRegistry,
    RegistryError,
};
pub use resolve::{
    EffectiveResponse, RESOLVE_ACTION_EFFECTIVE, RESOLVE_ACTION_EFFECTIVE_ERR,
    RESOLVE_ACTION_EFFECTIVE_OK, RESOLVE_ACTION_KEY, RESOLVE_ACTION_KEY_ERR, RESOLVE_ACTION_KEY_OK,
    RESOLVE_DOMAIN_ID, Resolution, ResolutionEngine, ResolveCommand, ResolveEffectiveRequest,
    ResolveError, ResolveKeyRequest, ResolveResponse, ResolvedSetting, build_sequence,
};
pub use tags::{
    ADMIN_TAG, GLOBAL_SCOPE, PriorityOrderManager, RemovedTag, TAG_ACTION_CREATE,
    TAG_ACTION_CREATE_ERR, TAG_ACTION_CREATE_OK, TAG_ACTION_LIST, TAG_ACTION_LIST_ERR,
    TAG_ACTION_LIST_OK, TAG_ACTION_REMOVE, TAG_ACTION_REMOVE_ERR, TAG_ACTION_REMOVE_OK,
    TAG_ACTION_REORDER, TAG_ACTION_REORDER_ERR, TAG_ACTION_REORDER_OK, TAG_ACTION_SETTINGS,
    TAG_ACTION_SETTINGS_ERR, TAG_ACTION_SETTINGS_OK, TAGS_DOMAIN_ID, Tag, TagCommand,
    TagCreateRequest, TagError, TagListRequest, TagListResponse, TagOrder, TagOrigin, TagRecord,
    TagRegistry, TagRemoveRequest, TagReorderRequest, TagSettingsRequest, validate_order,
};

pub fn build_default_registry() -> Result<ManagementRegistry, RegistryError> {
    let mut registry = ManagementRegistry::new();
    tags::register(&mut registry)?;
    overrides::register(&mut registry)?;
    members::register(&mut registry)?;
    resolve::register(&mut registry)?;
    Ok(registry)
}
