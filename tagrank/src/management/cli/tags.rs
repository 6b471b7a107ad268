// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::cli::parse_utils::{next_value, parse_required_arg, reject_extra};
use crate::management::cli::{CliError, CommandSpec, DomainSpec};
use crate::management::cli_helper::CliCommand;
use crate::management::{
    DomainActionKey, ManagementCommand, TAG_ACTION_CREATE_OK, TAG_ACTION_LIST_OK,
    TAG_ACTION_REMOVE_OK, TAG_ACTION_REORDER_OK, TAG_ACTION_SETTINGS_OK, TAGS_DOMAIN_ID,
    TagCommand, TagCreateRequest, TagListRequest, TagRemoveRequest, TagReorderRequest,
    TagSettingsRequest,
};

pub fn domain() -> DomainSpec {
    DomainSpec {
        name: "tag",
        aliases: &["t"],
        commands: vec![
            CommandSpec {
                name: "list",
                aliases: &["ls"],
                usage: &["tag list"],
                parser: parse_list,
            },
            CommandSpec {
                name: "create",
                aliases: &["add"],
                usage: &["tag create <id>"],
                parser: parse_create,
            },
            CommandSpec {
                name: "remove",
                aliases: &["rm"],
                usage: &["tag remove <id>"],
                parser: parse_remove,
            },
            CommandSpec {
                name: "reorder",
                aliases: &[],
                usage: &["tag reorder <id> [<id> ...] [--version <n>]"],
                parser: parse_reorder,
            },
            CommandSpec {
                name: "settings",
                aliases: &[],
                usage: &["tag settings <id>"],
                parser: parse_settings,
            },
        ],
    }
}

fn command(tag_command: TagCommand, ok_action: u32) -> CliCommand {
    CliCommand {
        command: ManagementCommand::Tags(tag_command),
        success_actions: vec![DomainActionKey::new(TAGS_DOMAIN_ID, ok_action)],
    }
}

fn parse_list(args: &[String]) -> Result<CliCommand, CliError> {
    reject_extra(args, "tag list")?;
    Ok(command(
        TagCommand::List(TagListRequest {}),
        TAG_ACTION_LIST_OK,
    ))
}

fn parse_create(args: &[String]) -> Result<CliCommand, CliError> {
    let (id, rest) = parse_required_arg(args, "tag id")?;
    reject_extra(rest, "tag create")?;
    Ok(command(
        TagCommand::Create(TagCreateRequest { id }),
        TAG_ACTION_CREATE_OK,
    ))
}

fn parse_remove(args: &[String]) -> Result<CliCommand, CliError> {
    let (id, rest) = parse_required_arg(args, "tag id")?;
    reject_extra(rest, "tag remove")?;
    Ok(command(
        TagCommand::Remove(TagRemoveRequest { id }),
        TAG_ACTION_REMOVE_OK,
    ))
}

/// Positional ids give the complete new order, highest priority first.
fn parse_reorder(args: &[String]) -> Result<CliCommand, CliError> {
    let mut order = Vec::new();
    let mut version = None;

    let mut idx = 0;
    while idx < args.len() {
        match args[idx].as_str() {
            "--version" => {
                if version.is_some() {
                    return Err(CliError::usage("Duplicate --version"));
                }
                idx += 1;
                let raw = next_value(args, &mut idx, "--version")?;
                let parsed = raw
                    .parse::<u64>()
                    .map_err(|_| CliError::usage(format!("Invalid --version: {}", raw)))?;
                version = Some(parsed);
            }
            flag if flag.starts_with("--") => {
                return Err(CliError::usage(format!(
                    "Unknown flag for tag reorder: {}",
                    flag
                )));
            }
            id => {
                order.push(id.to_string());
                idx += 1;
            }
        }
    }

    Ok(command(
        TagCommand::Reorder(TagReorderRequest { order, version }),
        TAG_ACTION_REORDER_OK,
    ))
}

fn parse_settings(args: &[String]) -> Result<CliCommand, CliError> {
    let (id, rest) = parse_required_arg(args, "tag id")?;
    reject_extra(rest, "tag settings")?;
    Ok(command(
        TagCommand::Settings(TagSettingsRequest { id }),
        TAG_ACTION_SETTINGS_OK,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn reorder_collects_ids_and_version() {
        let parsed = parse_reorder(&args(&["b", "--version", "7", "a"])).unwrap();
        match parsed.command {
            ManagementCommand::Tags(TagCommand::Reorder(request)) => {
                assert_eq!(request.order, vec!["b", "a"]);
                assert_eq!(request.version, Some(7));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(
            parsed.success_actions,
            vec![DomainActionKey::new(TAGS_DOMAIN_ID, TAG_ACTION_REORDER_OK)]
        );
    }

    #[test]
    fn reorder_rejects_bad_flags() {
        assert!(parse_reorder(&args(&["a", "--version", "x"])).is_err());
        assert!(parse_reorder(&args(&["a", "--version"])).is_err());
        assert!(parse_reorder(&args(&["a", "--force"])).is_err());
        assert!(parse_reorder(&args(&["--version", "1", "--version", "2"])).is_err());
    }

    #[test]
    fn create_requires_single_id() {
        assert!(parse_create(&args(&[])).is_err());
        assert!(parse_create(&args(&["a", "b"])).is_err());
        assert!(parse_create(&args(&["a"])).is_ok());
    }
}
