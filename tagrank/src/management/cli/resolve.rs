// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::cli::parse_utils::{parse_required_arg, reject_extra};
use crate::management::cli::{CliError, CommandSpec, DomainSpec};
use crate::management::cli_helper::CliCommand;
use crate::management::{
    DomainActionKey, ManagementCommand, RESOLVE_ACTION_EFFECTIVE_OK, RESOLVE_ACTION_KEY_OK,
    RESOLVE_DOMAIN_ID, ResolveCommand, ResolveEffectiveRequest, ResolveKeyRequest,
};

pub fn domain() -> DomainSpec {
    DomainSpec {
        name: "resolve",
        aliases: &["r"],
        commands: vec![
            CommandSpec {
                name: "key",
                aliases: &["get"],
                usage: &["resolve key <user> <key>"],
                parser: parse_key,
            },
            CommandSpec {
                name: "effective",
                aliases: &["explain"],
                usage: &["resolve effective <user>"],
                parser: parse_effective,
            },
        ],
    }
}

fn parse_key(args: &[String]) -> Result<CliCommand, CliError> {
    let (user, rest) = parse_required_arg(args, "user id")?;
    let (key, rest) = parse_required_arg(rest, "setting key")?;
    reject_extra(rest, "resolve key")?;
    Ok(CliCommand {
        command: ManagementCommand::Resolve(ResolveCommand::Key(ResolveKeyRequest { user, key })),
        success_actions: vec![DomainActionKey::new(
            RESOLVE_DOMAIN_ID,
            RESOLVE_ACTION_KEY_OK,
        )],
    })
}

fn parse_effective(args: &[String]) -> Result<CliCommand, CliError> {
    let (user, rest) = parse_required_arg(args, "user id")?;
    reject_extra(rest, "resolve effective")?;
    Ok(CliCommand {
        command: ManagementCommand::Resolve(ResolveCommand::Effective(ResolveEffectiveRequest {
            user,
        })),
        success_actions: vec![DomainActionKey::new(
            RESOLVE_DOMAIN_ID,
            RESOLVE_ACTION_EFFECTIVE_OK,
        )],
    })
}
