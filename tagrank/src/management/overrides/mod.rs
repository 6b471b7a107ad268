// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod store;

pub use store::OverrideStore;

use crate::management::collaborators::{SettingsStore, StoreError};
use crate::management::core::{
    ManagementCommand, ManagementContext, ManagementRequest, ManagementResponse, ResponsePayload,
};
use crate::management::registry::{ActionDescriptor, DomainDescriptor, ManagementRegistry};
use crate::management::tags::{TagError, TagOrigin, validate_scope, validate_setting_key};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const OVERRIDES_DOMAIN_ID: u32 = 12;

pub const OVERRIDE_ACTION_SET: u32 = 1;
pub const OVERRIDE_ACTION_CLEAR: u32 = 2;
pub const OVERRIDE_ACTION_SHOW: u32 = 3;

pub const OVERRIDE_ACTION_SET_OK: u32 = 101;
pub const OVERRIDE_ACTION_SET_ERR: u32 = 102;
pub const OVERRIDE_ACTION_CLEAR_OK: u32 = 201;
pub const OVERRIDE_ACTION_CLEAR_ERR: u32 = 202;
pub const OVERRIDE_ACTION_SHOW_OK: u32 = 301;
pub const OVERRIDE_ACTION_SHOW_ERR: u32 = 302;

#[derive(Debug, Clone)]
pub enum OverrideCommand {
    Set(OverrideSetRequest),
    Clear(OverrideClearRequest),
    Show(OverrideShowRequest),
}

impl OverrideCommand {
    pub fn action_id(&self) -> u32 {
        match self {
            OverrideCommand::Set(_) => OVERRIDE_ACTION_SET,
            OverrideCommand::Clear(_) => OVERRIDE_ACTION_CLEAR,
            OverrideCommand::Show(_) => OVERRIDE_ACTION_SHOW,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideSetRequest {
    pub scope: String,
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideClearRequest {
    pub scope: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideShowRequest {
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeOverridesResponse {
    pub scope: String,
    pub overrides: BTreeMap<String, Value>,
}

pub fn register(registry: &mut ManagementRegistry) -> Result<(), crate::management::RegistryError> {
    registry.register_domain(
        DomainDescriptor {
            name: "override",
            id: OVERRIDES_DOMAIN_ID,
            actions: vec![
                ActionDescriptor::new("set", OVERRIDE_ACTION_SET),
                ActionDescriptor::new("clear", OVERRIDE_ACTION_CLEAR),
                ActionDescriptor::new("show", OVERRIDE_ACTION_SHOW),
            ],
        },
        domain_handler!(handle_overrides_request),
    )
}

async fn handle_overrides_request(
    request: ManagementRequest,
    context: Arc<ManagementContext>,
) -> crate::management::errors::DomainResult<ManagementResponse> {
    let workflow_id = request.workflow_id;
    let response = match request.command {
        ManagementCommand::Overrides(OverrideCommand::Set(payload)) => {
            handle_set(payload, workflow_id, &context)
        }
        ManagementCommand::Overrides(OverrideCommand::Clear(payload)) => {
            handle_clear(payload, workflow_id, &context)
        }
        ManagementCommand::Overrides(OverrideCommand::Show(payload)) => {
            handle_show(payload, workflow_id, &context)
        }
        _ => response_err(
            OVERRIDE_ACTION_SHOW_ERR,
            workflow_id,
            &TagError::Invalid("Invalid override command".to_string()),
        ),
    };
    Ok(response)
}

fn store_error(err: StoreError) -> TagError {
    log::error!("Override store failure: {}", err);
    TagError::Internal(err.to_string())
}

fn validate_target(context: &ManagementContext, scope: &str, key: &str) -> Result<(), TagError> {
    validate_scope(scope, context.tag_registry.user_tag_prefix())?;
    validate_setting_key(key)
}

/// Records an override, first materializing an unseen listed scope as an implicit tag.
fn set_override(context: &ManagementContext, payload: &OverrideSetRequest) -> Result<(), TagError> {
    let scope = payload.scope.trim();
    validate_target(context, scope, &payload.key)?;
    if context.tag_registry.ensure_tag(scope, TagOrigin::Implicit)? {
        log::info!("Tag '{}' created implicitly by an override", scope);
    }
    context
        .override_store
        .set_override(scope, &payload.key, payload.value.clone())
        .map_err(store_error)?;
    Ok(())
}

fn handle_set(
    payload: OverrideSetRequest,
    workflow_id: u32,
    context: &ManagementContext,
) -> ManagementResponse {
    match set_override(context, &payload) {
        Ok(()) => response_ok(
            OVERRIDE_ACTION_SET_OK,
            workflow_id,
            &format!(
                "Override '{}' set on '{}'",
                payload.key,
                payload.scope.trim()
            ),
        ),
        Err(err) => response_err(OVERRIDE_ACTION_SET_ERR, workflow_id, &err),
    }
}

fn handle_clear(
    payload: OverrideClearRequest,
    workflow_id: u32,
    context: &ManagementContext,
) -> ManagementResponse {
    let scope = payload.scope.trim();
    let result = validate_target(context, scope, &payload.key).and_then(|_| {
        context
            .override_store
            .clear_override(scope, &payload.key)
            .map_err(store_error)
    });
    match result {
        Ok(true) => response_ok(
            OVERRIDE_ACTION_CLEAR_OK,
            workflow_id,
            &format!("Override '{}' cleared on '{}'", payload.key, scope),
        ),
        Ok(false) => response_err(
            OVERRIDE_ACTION_CLEAR_ERR,
            workflow_id,
            &TagError::NotFound(format!("Override '{}' on '{}'", payload.key, scope)),
        ),
        Err(err) => response_err(OVERRIDE_ACTION_CLEAR_ERR, workflow_id, &err),
    }
}

fn handle_show(
    payload: OverrideShowRequest,
    workflow_id: u32,
    context: &ManagementContext,
) -> ManagementResponse {
    let scope = payload.scope.trim();
    let result = validate_scope(scope, context.tag_registry.user_tag_prefix()).and_then(|_| {
        context
            .override_store
            .overrides_for(scope)
            .map_err(store_error)
    });
    match result {
        Ok(overrides) => response_payload(
            OVERRIDE_ACTION_SHOW_OK,
            workflow_id,
            ResponsePayload::ScopeOverrides(ScopeOverridesResponse {
                scope: scope.to_string(),
                overrides,
            }),
        ),
        Err(err) => response_err(OVERRIDE_ACTION_SHOW_ERR, workflow_id, &err),
    }
}

define_domain_responses!(OVERRIDES_DOMAIN_ID);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::management::errors::ManagementErrorKind;
    use crate::management::{ManagementBus, build_default_registry};
    use crate::util::test_fixtures::TestFixtureRoot;
    use serde_json::json;

    fn start_bus(fixture: &TestFixtureRoot) -> ManagementBus {
        let runtime_paths = fixture.runtime_paths().unwrap();
        let context = ManagementContext::from_components(Arc::new(test_config()), runtime_paths)
            .expect("context");
        ManagementBus::start(build_default_registry().expect("registry"), context)
    }

    fn set(scope: &str, key: &str, value: Value) -> ManagementCommand {
        ManagementCommand::Overrides(OverrideCommand::Set(OverrideSetRequest {
            scope: scope.to_string(),
            key: key.to_string(),
            value,
        }))
    }

    #[tokio::test]
    async fn set_on_unseen_tag_creates_it_implicitly() {
        let fixture = TestFixtureRoot::new_unique("overrides-implicit").unwrap();
        let bus = start_bus(&fixture);

        let response = bus.call(set("night", "quota", json!(3))).await.unwrap();
        assert_eq!(response.action_id, OVERRIDE_ACTION_SET_OK);

        let tags = bus.context().tag_registry.list_tags().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].id, "night");
        assert_eq!(tags[1].origin, TagOrigin::Implicit);
    }

    #[tokio::test]
    async fn set_on_reserved_scopes_does_not_list_them() {
        let fixture = TestFixtureRoot::new_unique("overrides-reserved").unwrap();
        let bus = start_bus(&fixture);

        for scope in ["global", "admin", "user:alice"] {
            let response = bus.call(set(scope, "theme", json!("dark"))).await.unwrap();
            assert_eq!(response.action_id, OVERRIDE_ACTION_SET_OK, "{}", scope);
        }
        assert_eq!(bus.context().tag_registry.list_tags().unwrap().len(), 1);
        assert_eq!(
            bus.context()
                .override_store
                .get_override("user:alice", "theme")
                .unwrap(),
            Some(json!("dark"))
        );
    }

    #[tokio::test]
    async fn set_rejects_invalid_scope_and_key() {
        let fixture = TestFixtureRoot::new_unique("overrides-invalid").unwrap();
        let bus = start_bus(&fixture);

        let response = bus.call(set("Bad Scope", "k", json!(1))).await.unwrap();
        assert_eq!(
            response.error_payload().unwrap().kind,
            ManagementErrorKind::Validation
        );
        let response = bus.call(set("ok", "", json!(1))).await.unwrap();
        assert_eq!(response.action_id, OVERRIDE_ACTION_SET_ERR);
        assert_eq!(bus.context().tag_registry.list_tags().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_missing_override_is_not_found() {
        let fixture = TestFixtureRoot::new_unique("overrides-clear").unwrap();
        let bus = start_bus(&fixture);
        bus.call(set("global", "k", json!(1))).await.unwrap();

        let clear = || {
            ManagementCommand::Overrides(OverrideCommand::Clear(OverrideClearRequest {
                scope: "global".to_string(),
                key: "k".to_string(),
            }))
        };
        let response = bus.call(clear()).await.unwrap();
        assert_eq!(response.action_id, OVERRIDE_ACTION_CLEAR_OK);
        let response = bus.call(clear()).await.unwrap();
        assert_eq!(
            response.error_payload().unwrap().kind,
            ManagementErrorKind::NotFound
        );
    }
}
