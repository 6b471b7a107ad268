// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod store;

pub use store::MemberStore;

use crate::management::collaborators::{MembershipStore, StoreError};
use crate::management::core::{
    ManagementCommand, ManagementContext, ManagementRequest, ManagementResponse, ResponsePayload,
};
use crate::management::registry::{ActionDescriptor, DomainDescriptor, ManagementRegistry};
use crate::management::tags::{ScopeKind, TagError, TagOrigin, validate_tag_id, validate_user_id};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const MEMBERS_DOMAIN_ID: u32 = 13;

pub const MEMBER_ACTION_ASSIGN: u32 = 1;
pub const MEMBER_ACTION_UNASSIGN: u32 = 2;
pub const MEMBER_ACTION_SHOW: u32 = 3;

pub const MEMBER_ACTION_ASSIGN_OK: u32 = 101;
pub const MEMBER_ACTION_ASSIGN_ERR: u32 = 102;
pub const MEMBER_ACTION_UNASSIGN_OK: u32 = 201;
pub const MEMBER_ACTION_UNASSIGN_ERR: u32 = 202;
pub const MEMBER_ACTION_SHOW_OK: u32 = 301;
pub const MEMBER_ACTION_SHOW_ERR: u32 = 302;

#[derive(Debug, Clone)]
pub enum MemberCommand {
    Assign(MemberAssignRequest),
    Unassign(MemberUnassignRequest),
    Show(MemberShowRequest),
}

impl MemberCommand {
    pub fn action_id(&self) -> u32 {
        match self {
            MemberCommand::Assign(_) => MEMBER_ACTION_ASSIGN,
            MemberCommand::Unassign(_) => MEMBER_ACTION_UNASSIGN,
            MemberCommand::Show(_) => MEMBER_ACTION_SHOW,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberAssignRequest {
    pub user: String,
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberUnassignRequest {
    pub user: String,
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberShowRequest {
    pub user: String,
}

/// A user's assigned tags, in the order they take effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberShowResponse {
    pub user: String,
    pub user_tag: String,
    pub tags: Vec<String>,
}

pub fn register(registry: &mut ManagementRegistry) -> Result<(), crate::management::RegistryError> {
    registry.register_domain(
        DomainDescriptor {
            name: "member",
            id: MEMBERS_DOMAIN_ID,
            actions: vec![
                ActionDescriptor::new("assign", MEMBER_ACTION_ASSIGN),
                ActionDescriptor::new("unassign", MEMBER_ACTION_UNASSIGN),
                ActionDescriptor::new("show", MEMBER_ACTION_SHOW),
            ],
        },
        domain_handler!(handle_members_request),
    )
}

async fn handle_members_request(
    request: ManagementRequest,
    context: Arc<ManagementContext>,
) -> crate::management::errors::DomainResult<ManagementResponse> {
    let workflow_id = request.workflow_id;
    let response = match request.command {
        ManagementCommand::Members(MemberCommand::Assign(payload)) => {
            match assign(&context, payload.user.trim(), payload.tag.trim()) {
                Ok(()) => response_ok(
                    MEMBER_ACTION_ASSIGN_OK,
                    workflow_id,
                    &format!(
                        "Tag '{}' assigned to '{}'",
                        payload.tag.trim(),
                        payload.user.trim()
                    ),
                ),
                Err(err) => response_err(MEMBER_ACTION_ASSIGN_ERR, workflow_id, &err),
            }
        }
        ManagementCommand::Members(MemberCommand::Unassign(payload)) => {
            match unassign(&context, payload.user.trim(), payload.tag.trim()) {
                Ok(()) => response_ok(
                    MEMBER_ACTION_UNASSIGN_OK,
                    workflow_id,
                    &format!(
                        "Tag '{}' unassigned from '{}'",
                        payload.tag.trim(),
                        payload.user.trim()
                    ),
                ),
                Err(err) => response_err(MEMBER_ACTION_UNASSIGN_ERR, workflow_id, &err),
            }
        }
        ManagementCommand::Members(MemberCommand::Show(payload)) => {
            match show(&context, payload.user.trim()) {
                Ok(show) => response_payload(
                    MEMBER_ACTION_SHOW_OK,
                    workflow_id,
                    ResponsePayload::MemberShow(show),
                ),
                Err(err) => response_err(MEMBER_ACTION_SHOW_ERR, workflow_id, &err),
            }
        }
        _ => response_err(
            MEMBER_ACTION_SHOW_ERR,
            workflow_id,
            &TagError::Invalid("Invalid member command".to_string()),
        ),
    };
    Ok(response)
}

fn store_error(err: StoreError) -> TagError {
    log::error!("Member store failure: {}", err);
    TagError::Internal(err.to_string())
}

/// Only `admin` and listed tags can be held; `global` and user tags apply on their own.
fn validate_assignable(context: &ManagementContext, tag: &str) -> Result<(), TagError> {
    match context.tag_registry.classify(tag) {
        ScopeKind::Admin => Ok(()),
        ScopeKind::Global => Err(TagError::Forbidden(
            "'global' applies to every user and cannot be assigned".to_string(),
        )),
        ScopeKind::User(_) => Err(TagError::Forbidden(
            "User tags belong to their user and cannot be assigned".to_string(),
        )),
        ScopeKind::Listed => validate_tag_id(tag),
    }
}

fn assign(context: &ManagementContext, user: &str, tag: &str) -> Result<(), TagError> {
    validate_user_id(user)?;
    validate_assignable(context, tag)?;
    if context.tag_registry.ensure_tag(tag, TagOrigin::Implicit)? {
        log::info!("Tag '{}' created implicitly by an assignment", tag);
    }
    context
        .member_store
        .assign(user, tag)
        .map_err(store_error)?;
    Ok(())
}

fn unassign(context: &ManagementContext, user: &str, tag: &str) -> Result<(), TagError> {
    validate_user_id(user)?;
    validate_assignable(context, tag)?;
    if context
        .member_store
        .unassign(user, tag)
        .map_err(store_error)?
    {
        Ok(())
    } else {
        Err(TagError::NotFound(format!("Tag '{}' on user '{}'", tag, user)))
    }
}

fn show(context: &ManagementContext, user: &str) -> Result<MemberShowResponse, TagError> {
    validate_user_id(user)?;
    let held = context
        .member_store
        .tags_for_user(user)
        .map_err(store_error)?;
    let order = context.tag_registry.snapshot()?;
    let mut tags: Vec<String> = held
        .iter()
        .filter(|tag| tag.as_str() == crate::management::tags::ADMIN_TAG)
        .cloned()
        .collect();
    tags.extend(
        order
            .ids()
            .filter(|id| held.contains(*id))
            .map(str::to_string),
    );
    Ok(MemberShowResponse {
        user: user.to_string(),
        user_tag: context.tag_registry.user_tag(user),
        tags,
    })
}

define_domain_responses!(MEMBERS_DOMAIN_ID);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::management::errors::ManagementErrorKind;
    use crate::management::{ManagementBus, build_default_registry};
    use crate::util::test_fixtures::TestFixtureRoot;

    fn start_bus(fixture: &TestFixtureRoot) -> ManagementBus {
        let runtime_paths = fixture.runtime_paths().unwrap();
        let context = ManagementContext::from_components(Arc::new(test_config()), runtime_paths)
            .expect("context");
        ManagementBus::start(build_default_registry().expect("registry"), context)
    }

    fn assign_command(user: &str, tag: &str) -> ManagementCommand {
        ManagementCommand::Members(MemberCommand::Assign(MemberAssignRequest {
            user: user.to_string(),
            tag: tag.to_string(),
        }))
    }

    #[tokio::test]
    async fn assign_materializes_tag_and_show_orders_by_rank() {
        let fixture = TestFixtureRoot::new_unique("members-assign").unwrap();
        let bus = start_bus(&fixture);
        bus.context()
            .tag_registry
            .create_tag("first", TagOrigin::Explicit)
            .unwrap();

        for tag in ["late", "admin", "first"] {
            let response = bus.call(assign_command("alice", tag)).await.unwrap();
            assert_eq!(response.action_id, MEMBER_ACTION_ASSIGN_OK, "{}", tag);
        }

        let tags = bus.context().tag_registry.list_tags().unwrap();
        assert_eq!(tags[2].id, "late");
        assert_eq!(tags[2].origin, TagOrigin::Implicit);

        let response = bus
            .call(ManagementCommand::Members(MemberCommand::Show(
                MemberShowRequest {
                    user: "alice".to_string(),
                },
            )))
            .await
            .unwrap();
        match response.payload {
            ResponsePayload::MemberShow(show) => {
                assert_eq!(show.user_tag, "user:alice");
                assert_eq!(show.tags, vec!["admin", "first", "late"]);
            }
            _ => panic!("Expected member show response"),
        }
    }

    #[tokio::test]
    async fn assign_rejects_global_and_user_tags() {
        let fixture = TestFixtureRoot::new_unique("members-reserved").unwrap();
        let bus = start_bus(&fixture);

        for tag in ["global", "user:bob"] {
            let response = bus.call(assign_command("alice", tag)).await.unwrap();
            assert_eq!(
                response.error_payload().unwrap().kind,
                ManagementErrorKind::Forbidden
            );
        }
    }

    #[tokio::test]
    async fn unassign_reports_missing_membership() {
        let fixture = TestFixtureRoot::new_unique("members-unassign").unwrap();
        let bus = start_bus(&fixture);
        bus.call(assign_command("alice", "staff")).await.unwrap();

        let unassign = || {
            ManagementCommand::Members(MemberCommand::Unassign(MemberUnassignRequest {
                user: "alice".to_string(),
                tag: "staff".to_string(),
            }))
        };
        let response = bus.call(unassign()).await.unwrap();
        assert_eq!(response.action_id, MEMBER_ACTION_UNASSIGN_OK);
        let response = bus.call(unassign()).await.unwrap();
        assert_eq!(
            response.error_payload().unwrap().kind,
            ManagementErrorKind::NotFound
        );
    }
}
