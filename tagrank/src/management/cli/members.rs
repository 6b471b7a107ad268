// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::cli::parse_utils::{parse_required_arg, reject_extra};
use crate::management::cli::{CliError, CommandSpec, DomainSpec};
use crate::management::cli_helper::CliCommand;
use crate::management::{
    DomainActionKey, MEMBER_ACTION_ASSIGN_OK, MEMBER_ACTION_SHOW_OK, MEMBER_ACTION_UNASSIGN_OK,
    MEMBERS_DOMAIN_ID, ManagementCommand, MemberAssignRequest, MemberCommand, MemberShowRequest,
    MemberUnassignRequest,
};

pub fn domain() -> DomainSpec {
    DomainSpec {
        name: "member",
        aliases: &["m"],
        commands: vec![
            CommandSpec {
                name: "assign",
                aliases: &[],
                usage: &["member assign <user> <tag>"],
                parser: parse_assign,
            },
            CommandSpec {
                name: "unassign",
                aliases: &[],
                usage: &["member unassign <user> <tag>"],
                parser: parse_unassign,
            },
            CommandSpec {
                name: "show",
                aliases: &[],
                usage: &["member show <user>"],
                parser: parse_show,
            },
        ],
    }
}

fn command(member_command: MemberCommand, ok_action: u32) -> CliCommand {
    CliCommand {
        command: ManagementCommand::Members(member_command),
        success_actions: vec![DomainActionKey::new(MEMBERS_DOMAIN_ID, ok_action)],
    }
}

fn parse_user_and_tag(args: &[String], label: &str) -> Result<(String, String), CliError> {
    let (user, rest) = parse_required_arg(args, "user id")?;
    let (tag, rest) = parse_required_arg(rest, "tag id")?;
    reject_extra(rest, label)?;
    Ok((user, tag))
}

fn parse_assign(args: &[String]) -> Result<CliCommand, CliError> {
    let (user, tag) = parse_user_and_tag(args, "member assign")?;
    Ok(command(
        MemberCommand::Assign(MemberAssignRequest { user, tag }),
        MEMBER_ACTION_ASSIGN_OK,
    ))
}

fn parse_unassign(args: &[String]) -> Result<CliCommand, CliError> {
    let (user, tag) = parse_user_and_tag(args, "member unassign")?;
    Ok(command(
        MemberCommand::Unassign(MemberUnassignRequest { user, tag }),
        MEMBER_ACTION_UNASSIGN_OK,
    ))
}

fn parse_show(args: &[String]) -> Result<CliCommand, CliError> {
    let (user, rest) = parse_required_arg(args, "user id")?;
    reject_extra(rest, "member show")?;
    Ok(command(
        MemberCommand::Show(MemberShowRequest { user }),
        MEMBER_ACTION_SHOW_OK,
    ))
}
