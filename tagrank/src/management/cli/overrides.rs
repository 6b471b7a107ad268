// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::cli::parse_utils::{parse_required_arg, parse_value, reject_extra};
use crate::management::cli::{CliError, CommandSpec, DomainSpec};
use crate::management::cli_helper::CliCommand;
use crate::management::{
    DomainActionKey, ManagementCommand, OVERRIDE_ACTION_CLEAR_OK, OVERRIDE_ACTION_SET_OK,
    OVERRIDE_ACTION_SHOW_OK, OVERRIDES_DOMAIN_ID, OverrideClearRequest, OverrideCommand,
    OverrideSetRequest, OverrideShowRequest,
};

pub fn domain() -> DomainSpec {
    DomainSpec {
        name: "override",
        aliases: &["o"],
        commands: vec![
            CommandSpec {
                name: "set",
                aliases: &[],
                usage: &["override set <scope> <key> <value>"],
                parser: parse_set,
            },
            CommandSpec {
                name: "clear",
                aliases: &["unset"],
                usage: &["override clear <scope> <key>"],
                parser: parse_clear,
            },
            CommandSpec {
                name: "show",
                aliases: &[],
                usage: &["override show <scope>"],
                parser: parse_show,
            },
        ],
    }
}

fn command(override_command: OverrideCommand, ok_action: u32) -> CliCommand {
    CliCommand {
        command: ManagementCommand::Overrides(override_command),
        success_actions: vec![DomainActionKey::new(OVERRIDES_DOMAIN_ID, ok_action)],
    }
}

fn parse_set(args: &[String]) -> Result<CliCommand, CliError> {
    let (scope, rest) = parse_required_arg(args, "scope")?;
    let (key, rest) = parse_required_arg(rest, "setting key")?;
    let (raw_value, rest) = parse_required_arg(rest, "value")?;
    reject_extra(rest, "override set")?;
    Ok(command(
        OverrideCommand::Set(OverrideSetRequest {
            scope,
            key,
            value: parse_value(&raw_value),
        }),
        OVERRIDE_ACTION_SET_OK,
    ))
}

fn parse_clear(args: &[String]) -> Result<CliCommand, CliError> {
    let (scope, rest) = parse_required_arg(args, "scope")?;
    let (key, rest) = parse_required_arg(rest, "setting key")?;
    reject_extra(rest, "override clear")?;
    Ok(command(
        OverrideCommand::Clear(OverrideClearRequest { scope, key }),
        OVERRIDE_ACTION_CLEAR_OK,
    ))
}

fn parse_show(args: &[String]) -> Result<CliCommand, CliError> {
    let (scope, rest) = parse_required_arg(args, "scope")?;
    reject_extra(rest, "override show")?;
    Ok(command(
        OverrideCommand::Show(OverrideShowRequest { scope }),
        OVERRIDE_ACTION_SHOW_OK,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_parses_json_value() {
        let args: Vec<String> = ["editors", "quota", "50"]
            .iter()
            .map(|arg| arg.to_string())
            .collect();
        match parse_set(&args).unwrap().command {
            ManagementCommand::Overrides(OverrideCommand::Set(request)) => {
                assert_eq!(request.scope, "editors");
                assert_eq!(request.key, "quota");
                assert_eq!(request.value, json!(50));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn set_requires_value() {
        let args = vec!["editors".to_string(), "quota".to_string()];
        let err = parse_set(&args).map(|_| ()).unwrap_err();
        assert!(err.to_string().contains("Missing value"));
    }
}
