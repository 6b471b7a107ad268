// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::cli::CliError;
use crate::management::{
    DomainActionKey, EffectiveResponse, ManagementBus, ManagementCommand, ManagementContext,
    ManagementError, ManagementResponse, MemberShowResponse, ResolveResponse, ResponsePayload,
    ScopeOverridesResponse, TagListResponse, build_default_registry,
};
use serde_json::Value;
use std::path::Path;

#[derive(Debug)]
pub struct CliCommand {
    pub command: ManagementCommand,
    pub success_actions: Vec<DomainActionKey>,
}

/// Runs one command in-process against the stores under `runtime_root`.
pub async fn execute(runtime_root: &Path, cli_command: CliCommand) -> Result<i32, CliError> {
    let response = dispatch(runtime_root, cli_command.command).await?;
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit_code = render_response(
        &response,
        &cli_command.success_actions,
        &mut stdout,
        &mut stderr,
    );
    for line in stdout {
        println!("{}", line);
    }
    for line in stderr {
        eprintln!("{}", line);
    }
    Ok(exit_code)
}

async fn dispatch(
    runtime_root: &Path,
    command: ManagementCommand,
) -> Result<ManagementResponse, CliError> {
    let registry = build_default_registry().map_err(|err| CliError::connector(err.to_string()))?;
    let context = ManagementContext::from_runtime_root(runtime_root)?;
    let bus = ManagementBus::start(registry, context);
    Ok(bus.call(command).await?)
}

/// Renders `response` into output lines and returns the process exit code.
fn render_response(
    response: &ManagementResponse,
    success_actions: &[DomainActionKey],
    stdout: &mut Vec<String>,
    stderr: &mut Vec<String>,
) -> i32 {
    let key = DomainActionKey::new(response.domain_id, response.action_id);
    if !success_actions.contains(&key) {
        let line = match &response.payload {
            ResponsePayload::Error(error) => format!("{}: {}", error.kind, error.message),
            ResponsePayload::Message(message) => message.message.clone(),
            _ => format!(
                "Unexpected response (domain {} action {})",
                response.domain_id, response.action_id
            ),
        };
        stderr.push(line);
        return 1;
    }

    match &response.payload {
        ResponsePayload::Message(payload) => stdout.push(payload.message.clone()),
        ResponsePayload::Error(payload) => {
            stderr.push(format!("{}: {}", payload.kind, payload.message));
            return 1;
        }
        ResponsePayload::TagList(payload) => tag_list_lines(payload, stdout),
        ResponsePayload::ScopeOverrides(payload) => scope_override_lines(payload, stdout),
        ResponsePayload::MemberShow(payload) => member_lines(payload, stdout),
        ResponsePayload::Resolve(payload) => resolve_lines(payload, stdout),
        ResponsePayload::Effective(payload) => effective_lines(payload, stdout),
    }
    0
}

fn tag_list_lines(payload: &TagListResponse, out: &mut Vec<String>) {
    let rank_header = "Rank";
    let id_header = "Id";
    let id_width = payload
        .tags
        .iter()
        .map(|tag| tag.id.chars().count())
        .fold(id_header.len(), usize::max);
    out.push(format!("version {}", payload.version));
    out.push(format!(
        "{:<4}  {:<width$}  Origin",
        rank_header,
        id_header,
        width = id_width
    ));
    for tag in &payload.tags {
        let rank = tag
            .rank
            .map(|rank| rank.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push(format!(
            "{:<4}  {:<width$}  {}",
            rank,
            tag.id,
            tag.origin.as_str(),
            width = id_width
        ));
    }
}

fn scope_override_lines(payload: &ScopeOverridesResponse, out: &mut Vec<String>) {
    if payload.overrides.is_empty() {
        out.push(format!("{}: (no overrides)", payload.scope));
        return;
    }
    for (key, value) in &payload.overrides {
        out.push(format!("{}={}", key, render_value(value)));
    }
}

fn member_lines(payload: &MemberShowResponse, out: &mut Vec<String>) {
    out.push(format!("User: {}", payload.user));
    out.push(format!("User tag: {}", payload.user_tag));
    if payload.tags.is_empty() {
        out.push("Tags: (none)".to_string());
    } else {
        out.push(format!("Tags: {}", payload.tags.join(", ")));
    }
}

fn resolve_lines(payload: &ResolveResponse, out: &mut Vec<String>) {
    match (&payload.value, &payload.source) {
        (Some(value), Some(source)) if payload.found => {
            out.push(format!("{}={} (from {})", payload.key, render_value(value), source));
        }
        _ => out.push(format!("{}: no override", payload.key)),
    }
}

fn effective_lines(payload: &EffectiveResponse, out: &mut Vec<String>) {
    out.push(format!("Sequence: {}", payload.sequence.join(" > ")));
    for (key, setting) in &payload.settings {
        out.push(format!(
            "{}={} (from {})",
            key,
            render_value(&setting.value),
            setting.source
        ));
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl From<ManagementError> for CliError {
    fn from(err: ManagementError) -> Self {
        CliError::connector(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::cli::build_registry;
    use crate::management::{ManagementErrorKind, TAG_ACTION_REMOVE_OK, TAGS_DOMAIN_ID};
    use crate::util::test_fixtures::TestFixtureRoot;

    fn command(raw: &[&str]) -> CliCommand {
        let tokens: Vec<String> = raw.iter().map(|token| token.to_string()).collect();
        build_registry().unwrap().resolve_command(&tokens).unwrap()
    }

    #[tokio::test]
    async fn commands_persist_across_invocations() {
        let fixture = TestFixtureRoot::new_unique("cli-persist").unwrap();
        let root = fixture.path();

        assert_eq!(execute(root, command(&["tag", "create", "staff"])).await.unwrap(), 0);
        assert_eq!(
            execute(root, command(&["override", "set", "staff", "quota", "5"]))
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            execute(root, command(&["member", "assign", "alice", "staff"]))
                .await
                .unwrap(),
            0
        );

        let context = ManagementContext::from_runtime_root(root).unwrap();
        let tags = context.tag_registry.list_tags().unwrap();
        assert_eq!(tags[1].id, "staff");
        let resolved = context.resolution_engine.resolve("alice", "quota").unwrap();
        assert_eq!(
            resolved,
            crate::management::Resolution::Found {
                value: serde_json::json!(5),
                source: "staff".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn failing_command_exits_with_one() {
        let fixture = TestFixtureRoot::new_unique("cli-fail").unwrap();
        let exit_code = execute(fixture.path(), command(&["tag", "remove", "admin"]))
            .await
            .unwrap();
        assert_eq!(exit_code, 1);
    }

    #[test]
    fn error_payload_renders_kind_and_message() {
        let response = ManagementResponse::error(
            TAGS_DOMAIN_ID,
            302,
            1,
            ManagementErrorKind::Forbidden,
            "Tag 'admin' is pinned",
        );
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = render_response(
            &response,
            &[DomainActionKey::new(TAGS_DOMAIN_ID, TAG_ACTION_REMOVE_OK)],
            &mut stdout,
            &mut stderr,
        );
        assert_eq!(code, 1);
        assert!(stdout.is_empty());
        assert_eq!(stderr, vec!["forbidden: Tag 'admin' is pinned"]);
    }

    #[test]
    fn tag_list_renders_admin_without_rank() {
        let order = crate::management::TagOrder {
            version: 3,
            tags: vec![crate::management::TagRecord {
                id: "staff".to_string(),
                origin: crate::management::TagOrigin::Implicit,
            }],
        };
        let mut out = Vec::new();
        tag_list_lines(&TagListResponse::from(&order), &mut out);
        assert_eq!(out[0], "version 3");
        assert!(out[2].starts_with("-     admin"));
        assert!(out[3].starts_with("0     staff"));
        assert!(out[3].ends_with("implicit"));
    }
}
