// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::ValidatedConfig;
use crate::management::errors::{ManagementError, ManagementErrorKind};
use crate::management::members::{MEMBERS_DOMAIN_ID, MemberCommand, MemberShowResponse, MemberStore};
use crate::management::overrides::{
    OVERRIDES_DOMAIN_ID, OverrideCommand, OverrideStore, ScopeOverridesResponse,
};
use crate::management::resolve::{
    EffectiveResponse, RESOLVE_DOMAIN_ID, ResolutionEngine, ResolveCommand, ResolveResponse,
};
use crate::management::tags::{
    PriorityOrderManager, TAGS_DOMAIN_ID, TagCommand, TagListResponse, TagRegistry,
};
use crate::runtime_paths::RuntimePaths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

const MAX_MESSAGE_CHARS: usize = 1024;

/// Everything a domain handler may touch, shared by every request on the bus.
#[derive(Clone)]
pub struct ManagementContext {
    pub config: Arc<ValidatedConfig>,
    pub runtime_paths: RuntimePaths,
    pub tag_registry: Arc<TagRegistry>,
    pub order_manager: PriorityOrderManager,
    pub override_store: Arc<OverrideStore>,
    pub member_store: Arc<MemberStore>,
    pub resolution_engine: ResolutionEngine,
}

impl ManagementContext {
    pub fn from_components(
        config: Arc<ValidatedConfig>,
        runtime_paths: RuntimePaths,
    ) -> Result<Self, ManagementError> {
        let state_sys_dir = runtime_paths.state_sys_dir.clone();
        let override_store = OverrideStore::new(&state_sys_dir)
            .map(Arc::new)
            .map_err(|err| ManagementError::internal(format!("Override store error: {}", err)))?;
        let member_store = MemberStore::new(&state_sys_dir)
            .map(Arc::new)
            .map_err(|err| ManagementError::internal(format!("Member store error: {}", err)))?;
        let tag_registry = TagRegistry::new(
            &state_sys_dir,
            &config.tags,
            override_store.clone(),
            member_store.clone(),
        )
        .map(Arc::new)
        .map_err(|err| ManagementError::internal(format!("Tag registry error: {}", err)))?;
        let resolution_engine = ResolutionEngine::new(
            tag_registry.clone(),
            override_store.clone(),
            member_store.clone(),
        );
        Ok(Self {
            config,
            runtime_paths,
            order_manager: PriorityOrderManager::new(tag_registry.clone()),
            tag_registry,
            override_store,
            member_store,
            resolution_engine,
        })
    }

    pub fn from_runtime_root(root: &Path) -> Result<Self, ManagementError> {
        let bootstrap = crate::bootstrap::bootstrap_runtime(root)
            .map_err(|err| ManagementError::internal(format!("Bootstrap error: {}", err)))?;
        Self::from_components(
            Arc::new(bootstrap.validated_config),
            bootstrap.runtime_paths,
        )
    }
}

#[derive(Debug, Clone)]
pub enum ManagementCommand {
    Tags(TagCommand),
    Overrides(OverrideCommand),
    Members(MemberCommand),
    Resolve(ResolveCommand),
}

impl ManagementCommand {
    pub fn domain_id(&self) -> u32 {
        match self {
            ManagementCommand::Tags(_) => TAGS_DOMAIN_ID,
            ManagementCommand::Overrides(_) => OVERRIDES_DOMAIN_ID,
            ManagementCommand::Members(_) => MEMBERS_DOMAIN_ID,
            ManagementCommand::Resolve(_) => RESOLVE_DOMAIN_ID,
        }
    }

    pub fn action_id(&self) -> u32 {
        match self {
            ManagementCommand::Tags(command) => command.action_id(),
            ManagementCommand::Overrides(command) => command.action_id(),
            ManagementCommand::Members(command) => command.action_id(),
            ManagementCommand::Resolve(command) => command.action_id(),
        }
    }

    /// Commands that only read the stores and can run beside a queued mutation.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            ManagementCommand::Tags(TagCommand::List(_) | TagCommand::Settings(_))
                | ManagementCommand::Overrides(OverrideCommand::Show(_))
                | ManagementCommand::Members(MemberCommand::Show(_))
                | ManagementCommand::Resolve(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct ManagementRequest {
    pub workflow_id: u32,
    pub connection_id: u32,
    pub command: ManagementCommand,
}

impl ManagementRequest {
    pub fn domain_id(&self) -> u32 {
        self.command.domain_id()
    }

    pub fn action_id(&self) -> u32 {
        self.command.action_id()
    }
}

#[derive(Debug, Clone)]
pub struct ManagementResponse {
    pub domain_id: u32,
    pub action_id: u32,
    pub workflow_id: u32,
    pub payload: ResponsePayload,
}

impl ManagementResponse {
    pub fn message(
        domain_id: u32,
        action_id: u32,
        workflow_id: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            domain_id,
            action_id,
            workflow_id,
            payload: ResponsePayload::Message(MessageResponse::new(message)),
        }
    }

    pub fn error(
        domain_id: u32,
        action_id: u32,
        workflow_id: u32,
        kind: ManagementErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            domain_id,
            action_id,
            workflow_id,
            payload: ResponsePayload::Error(ErrorResponse {
                kind,
                message: MessageResponse::new(message).message,
            }),
        }
    }

    pub fn error_payload(&self) -> Option<&ErrorResponse> {
        match &self.payload {
            ResponsePayload::Error(payload) => Some(payload),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResponsePayload {
    Message(MessageResponse),
    Error(ErrorResponse),
    TagList(TagListResponse),
    ScopeOverrides(ScopeOverridesResponse),
    MemberShow(MemberShowResponse),
    Resolve(ResolveResponse),
    Effective(EffectiveResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    /// Messages longer than the limit are cut at a character boundary.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        match message.char_indices().nth(MAX_MESSAGE_CHARS) {
            Some((cut, _)) => Self {
                message: message[..cut].to_string(),
            },
            None => Self { message },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: ManagementErrorKind,
    pub message: String,
}

impl From<ManagementError> for ErrorResponse {
    fn from(err: ManagementError) -> Self {
        Self {
            kind: err.kind(),
            message: err.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_messages_are_truncated() {
        let response = MessageResponse::new("é".repeat(MAX_MESSAGE_CHARS + 10));
        assert_eq!(response.message.chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn error_payload_is_exposed() {
        let response =
            ManagementResponse::error(11, 302, 1, ManagementErrorKind::Forbidden, "pinned");
        let payload = response.error_payload().expect("error payload");
        assert_eq!(payload.kind, ManagementErrorKind::Forbidden);
        assert_eq!(payload.message, "pinned");

        let ok = ManagementResponse::message(11, 301, 1, "done");
        assert!(ok.error_payload().is_none());
    }
}
