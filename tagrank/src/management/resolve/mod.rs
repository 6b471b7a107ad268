// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod engine;

pub use engine::{Resolution, ResolutionEngine, ResolveError, ResolvedSetting, build_sequence};

use crate::management::core::{
    ManagementCommand, ManagementContext, ManagementRequest, ManagementResponse, ResponsePayload,
};
use crate::management::registry::{ActionDescriptor, DomainDescriptor, ManagementRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const RESOLVE_DOMAIN_ID: u32 = 14;

pub const RESOLVE_ACTION_KEY: u32 = 1;
pub const RESOLVE_ACTION_EFFECTIVE: u32 = 2;

pub const RESOLVE_ACTION_KEY_OK: u32 = 101;
pub const RESOLVE_ACTION_KEY_ERR: u32 = 102;
pub const RESOLVE_ACTION_EFFECTIVE_OK: u32 = 201;
pub const RESOLVE_ACTION_EFFECTIVE_ERR: u32 = 202;

#[derive(Debug, Clone)]
pub enum ResolveCommand {
    Key(ResolveKeyRequest),
    Effective(ResolveEffectiveRequest),
}

impl ResolveCommand {
    pub fn action_id(&self) -> u32 {
        match self {
            ResolveCommand::Key(_) => RESOLVE_ACTION_KEY,
            ResolveCommand::Effective(_) => RESOLVE_ACTION_EFFECTIVE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveKeyRequest {
    pub user: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveEffectiveRequest {
    pub user: String,
}

/// `found: false` is the no-override outcome; callers fall back to built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub user: String,
    pub key: String,
    pub found: bool,
    pub value: Option<Value>,
    pub source: Option<String>,
}

impl ResolveResponse {
    fn new(user: &str, key: &str, resolution: Resolution) -> Self {
        let (found, value, source) = match resolution {
            Resolution::Found { value, source } => (true, Some(value), Some(source)),
            Resolution::NoOverride => (false, None, None),
        };
        Self {
            user: user.to_string(),
            key: key.to_string(),
            found,
            value,
            source,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveResponse {
    pub user: String,
    pub sequence: Vec<String>,
    pub settings: BTreeMap<String, ResolvedSetting>,
}

pub fn register(registry: &mut ManagementRegistry) -> Result<(), crate::management::RegistryError> {
    registry.register_domain(
        DomainDescriptor {
            name: "resolve",
            id: RESOLVE_DOMAIN_ID,
            actions: vec![
                ActionDescriptor::new("key", RESOLVE_ACTION_KEY),
                ActionDescriptor::new("effective", RESOLVE_ACTION_EFFECTIVE),
            ],
        },
        domain_handler!(handle_resolve_request),
    )
}

async fn handle_resolve_request(
    request: ManagementRequest,
    context: Arc<ManagementContext>,
) -> crate::management::errors::DomainResult<ManagementResponse> {
    let workflow_id = request.workflow_id;
    let engine = &context.resolution_engine;
    let response = match request.command {
        ManagementCommand::Resolve(ResolveCommand::Key(payload)) => {
            let user = payload.user.trim();
            match engine.resolve(user, &payload.key) {
                Ok(resolution) => response_payload(
                    RESOLVE_ACTION_KEY_OK,
                    workflow_id,
                    ResponsePayload::Resolve(ResolveResponse::new(user, &payload.key, resolution)),
                ),
                Err(err) => response_err(RESOLVE_ACTION_KEY_ERR, workflow_id, &err),
            }
        }
        ManagementCommand::Resolve(ResolveCommand::Effective(payload)) => {
            let user = payload.user.trim();
            let effective = engine
                .explain(user)
                .map(|(sequence, settings)| EffectiveResponse {
                    user: user.to_string(),
                    sequence,
                    settings,
                });
            match effective {
                Ok(effective) => response_payload(
                    RESOLVE_ACTION_EFFECTIVE_OK,
                    workflow_id,
                    ResponsePayload::Effective(effective),
                ),
                Err(err) => response_err(RESOLVE_ACTION_EFFECTIVE_ERR, workflow_id, &err),
            }
        }
        _ => response_err(
            RESOLVE_ACTION_KEY_ERR,
            workflow_id,
            &ResolveError::Invalid("Invalid resolve command".to_string()),
        ),
    };
    Ok(response)
}

define_domain_responses!(RESOLVE_DOMAIN_ID);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::management::errors::ManagementErrorKind;
    use crate::management::{
        ManagementBus, TAG_ACTION_REORDER_OK, TagCommand, TagOrigin, TagReorderRequest,
        build_default_registry,
    };
    use crate::util::test_fixtures::TestFixtureRoot;
    use serde_json::json;

    fn start_bus(fixture: &TestFixtureRoot) -> ManagementBus {
        let runtime_paths = fixture.runtime_paths().unwrap();
        let context = ManagementContext::from_components(Arc::new(test_config()), runtime_paths)
            .expect("context");
        ManagementBus::start(build_default_registry().expect("registry"), context)
    }

    fn key_command(user: &str, key: &str) -> ManagementCommand {
        ManagementCommand::Resolve(ResolveCommand::Key(ResolveKeyRequest {
            user: user.to_string(),
            key: key.to_string(),
        }))
    }

    #[tokio::test]
    async fn resolve_reports_found_and_no_override() {
        let fixture = TestFixtureRoot::new_unique("resolve-domain").unwrap();
        let bus = start_bus(&fixture);
        let context = bus.context();
        context
            .tag_registry
            .create_tag("editors", TagOrigin::Explicit)
            .unwrap();
        context.member_store.assign("alice", "editors").unwrap();
        context
            .override_store
            .set_override("editors", "quota", json!(50))
            .unwrap();

        let response = bus.call(key_command("alice", "quota")).await.unwrap();
        match response.payload {
            ResponsePayload::Resolve(payload) => {
                assert!(payload.found);
                assert_eq!(payload.value, Some(json!(50)));
                assert_eq!(payload.source.as_deref(), Some("editors"));
            }
            _ => panic!("Expected resolve response"),
        }

        let response = bus.call(key_command("alice", "theme")).await.unwrap();
        match response.payload {
            ResponsePayload::Resolve(payload) => {
                assert!(!payload.found);
                assert!(payload.value.is_none());
            }
            _ => panic!("Expected resolve response"),
        }
    }

    #[tokio::test]
    async fn effective_lists_sequence_and_settings() {
        let fixture = TestFixtureRoot::new_unique("resolve-domain-effective").unwrap();
        let bus = start_bus(&fixture);
        let context = bus.context();
        context
            .override_store
            .set_override("global", "theme", json!("plain"))
            .unwrap();

        let response = bus
            .call(ManagementCommand::Resolve(ResolveCommand::Effective(
                ResolveEffectiveRequest {
                    user: "bob".to_string(),
                },
            )))
            .await
            .unwrap();
        assert_eq!(response.action_id, RESOLVE_ACTION_EFFECTIVE_OK);
        match response.payload {
            ResponsePayload::Effective(payload) => {
                assert_eq!(payload.sequence, vec!["user:bob", "global"]);
                assert_eq!(payload.settings["theme"].source, "global");
            }
            _ => panic!("Expected effective response"),
        }
    }

    fn resolved_source(response: ManagementResponse) -> Option<String> {
        match response.payload {
            ResponsePayload::Resolve(payload) => payload.source,
            _ => panic!("Expected resolve response"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn resolve_answers_while_a_reorder_waits_for_the_writer() {
        let fixture = TestFixtureRoot::new_unique("resolve-domain-concurrent").unwrap();
        let bus = start_bus(&fixture);
        let context = bus.context();
        for (id, quota) in [("t1", 1), ("t2", 2)] {
            context
                .tag_registry
                .create_tag(id, TagOrigin::Explicit)
                .unwrap();
            context.member_store.assign("alice", id).unwrap();
            context
                .override_store
                .set_override(id, "quota", json!(quota))
                .unwrap();
        }

        let (held_tx, held_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let registry = context.tag_registry.clone();
        let writer = std::thread::spawn(move || {
            registry.commit(|current| {
                held_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                Ok(current.tags.clone())
            })
        });
        held_rx.recv().unwrap();

        let reorder_bus = bus.clone();
        let reorder = tokio::spawn(async move {
            reorder_bus
                .call(ManagementCommand::Tags(TagCommand::Reorder(
                    TagReorderRequest {
                        order: vec!["t2".to_string(), "t1".to_string()],
                        version: None,
                    },
                )))
                .await
        });
        std::thread::sleep(std::time::Duration::from_millis(50));

        let response = bus.call(key_command("alice", "quota")).await.unwrap();
        assert_eq!(resolved_source(response).as_deref(), Some("t1"));

        release_tx.send(()).unwrap();
        writer.join().unwrap().unwrap();
        let response = reorder.await.unwrap().unwrap();
        assert_eq!(response.action_id, TAG_ACTION_REORDER_OK);

        let response = bus.call(key_command("alice", "quota")).await.unwrap();
        assert_eq!(resolved_source(response).as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn resolve_rejects_blank_user() {
        let fixture = TestFixtureRoot::new_unique("resolve-domain-blank").unwrap();
        let bus = start_bus(&fixture);
        let response = bus.call(key_command(" ", "quota")).await.unwrap();
        assert_eq!(response.action_id, RESOLVE_ACTION_KEY_ERR);
        assert_eq!(
            response.error_payload().unwrap().kind,
            ManagementErrorKind::Validation
        );
    }
}
