// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod members;
pub mod overrides;
pub(crate) mod parse_utils;
pub mod resolve;
pub mod tags;

use crate::management::cli_helper::CliCommand;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorKind {
    Usage,
    Connector,
}

#[derive(Debug, Clone)]
pub struct CliError {
    kind: CliErrorKind,
    message: String,
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Usage,
            message: message.into(),
        }
    }

    pub fn connector(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Connector,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> CliErrorKind {
        self.kind
    }

    /// 2 for bad invocations, 1 when the command could not be carried out.
    pub fn exit_code(&self) -> i32 {
        match self.kind {
            CliErrorKind::Usage => 2,
            CliErrorKind::Connector => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub type CommandParser = fn(&[String]) -> Result<CliCommand, CliError>;

pub struct DomainSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub commands: Vec<CommandSpec>,
}

pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static [&'static str],
    pub parser: CommandParser,
}

/// Something addressable on the command line by name, alias or unambiguous prefix.
trait Named {
    fn name(&self) -> &'static str;
    fn aliases(&self) -> &'static [&'static str];

    fn spellings(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name()).chain(self.aliases().iter().copied())
    }

    fn matches_exact(&self, token: &str) -> bool {
        self.spellings()
            .any(|spelling| spelling.eq_ignore_ascii_case(token))
    }

    fn matches_prefix(&self, token: &str) -> bool {
        self.spellings()
            .any(|spelling| spelling.to_ascii_lowercase().starts_with(token))
    }
}

impl Named for DomainSpec {
    fn name(&self) -> &'static str {
        self.name
    }

    fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }
}

impl Named for CommandSpec {
    fn name(&self) -> &'static str {
        self.name
    }

    fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }
}

#[derive(Default)]
pub struct CliRegistry {
    domains: Vec<DomainSpec>,
    spellings: BTreeSet<String>,
}

impl CliRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_domain(&mut self, domain: DomainSpec) -> Result<(), CliError> {
        for spelling in domain.spellings() {
            if !self.spellings.insert(spelling.to_ascii_lowercase()) {
                return Err(CliError::usage(format!(
                    "Duplicate domain name or alias '{}'",
                    spelling
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for command in &domain.commands {
            for spelling in command.spellings() {
                if !seen.insert(spelling.to_ascii_lowercase()) {
                    return Err(CliError::usage(format!(
                        "Duplicate command name or alias '{}' in domain '{}'",
                        spelling, domain.name
                    )));
                }
            }
        }

        self.domains.push(domain);
        Ok(())
    }

    pub fn resolve_command(&self, tokens: &[String]) -> Result<CliCommand, CliError> {
        let Some(domain_token) = tokens.first() else {
            return Err(CliError::usage("Missing command domain"));
        };
        let domain = resolve_named(&domain_token.to_ascii_lowercase(), &self.domains, "domain")?;
        let Some(command_token) = tokens.get(1) else {
            return Err(CliError::usage(format!(
                "Missing command for domain '{}'",
                domain.name
            )));
        };
        let command = resolve_named(
            &command_token.to_ascii_lowercase(),
            &domain.commands,
            "command",
        )?;
        (command.parser)(&tokens[2..])
    }
}

pub fn build_registry() -> Result<CliRegistry, CliError> {
    let mut registry = CliRegistry::new();
    registry.register_domain(tags::domain())?;
    registry.register_domain(overrides::domain())?;
    registry.register_domain(members::domain())?;
    registry.register_domain(resolve::domain())?;
    Ok(registry)
}

pub fn help_text() -> String {
    let registry = match build_registry() {
        Ok(registry) => registry,
        Err(err) => return format!("Failed to build CLI registry: {}", err),
    };

    let mut lines = vec![
        "Usage:".to_string(),
        "  tagrank [options]".to_string(),
        "  tagrank [options] <domain> <command> [args]".to_string(),
        "  tagrank help".to_string(),
        String::new(),
        "Options:".to_string(),
        "  -C <root>   Set the runtime root (default: .).".to_string(),
        "  -h, --help  Show this help.".to_string(),
        String::new(),
        "Without a command the admin HTTP server is started.".to_string(),
        String::new(),
        "Domains and commands:".to_string(),
    ];
    for domain in &registry.domains {
        lines.push(format!("  {}{}", domain.name, format_aliases(domain.aliases)));
        for command in &domain.commands {
            lines.push(format!(
                "    {}{}",
                command.name,
                format_aliases(command.aliases)
            ));
            lines.extend(command.usage.iter().map(|usage| format!("      {}", usage)));
        }
    }
    lines.push(String::new());
    lines.push("Notes:".to_string());
    lines.push(
        "  Domains and commands are case-insensitive and accept unambiguous prefixes.".to_string(),
    );
    lines.push(
        "  Override values are read as JSON; anything that is not JSON is stored as a string."
            .to_string(),
    );

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub async fn run_cli(runtime_root: &Path, tokens: Vec<String>) -> i32 {
    let command = match build_registry().and_then(|registry| registry.resolve_command(&tokens)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{}", err);
            return err.exit_code();
        }
    };

    match crate::management::cli_helper::execute(runtime_root, command).await {
        Ok(exit_code) => exit_code,
        Err(err) => {
            eprintln!("{}", err);
            err.exit_code()
        }
    }
}

fn format_aliases(aliases: &[&str]) -> String {
    if aliases.is_empty() {
        String::new()
    } else {
        format!(" (aliases: {})", aliases.join(", "))
    }
}

fn resolve_named<'a, T: Named>(token: &str, items: &'a [T], kind: &str) -> Result<&'a T, CliError> {
    if let Some(item) = items.iter().find(|item| item.matches_exact(token)) {
        return Ok(item);
    }
    let matched: Vec<&T> = items.iter().filter(|item| item.matches_prefix(token)).collect();
    match matched.as_slice() {
        [item] => Ok(item),
        [] => Err(CliError::usage(format!("Unknown {} '{}'", kind, token))),
        _ => {
            let mut names: Vec<&str> = matched.iter().map(|item| item.name()).collect();
            names.sort();
            Err(CliError::usage(format!(
                "Ambiguous {} prefix '{}': {}",
                kind,
                token,
                names.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::{ManagementCommand, TagCommand};

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn resolves_names_aliases_and_prefixes() {
        let registry = build_registry().unwrap();
        for raw in [
            &["tag", "list"][..],
            &["t", "ls"][..],
            &["TAG", "LI"][..],
            &["ta", "list"][..],
        ] {
            let command = registry.resolve_command(&tokens(raw)).unwrap();
            assert!(
                matches!(command.command, ManagementCommand::Tags(TagCommand::List(_))),
                "{:?}",
                raw
            );
        }
    }

    #[test]
    fn unique_prefix_reaches_parser_and_shared_prefix_is_ambiguous() {
        let registry = build_registry().unwrap();
        let err = registry
            .resolve_command(&tokens(&["member", "s"]))
            .map(|_| ())
            .unwrap_err();
        assert_eq!(err.kind(), CliErrorKind::Usage);
        assert!(err.to_string().contains("Missing user id"));

        let err = registry
            .resolve_command(&tokens(&["tag", "re"]))
            .map(|_| ())
            .unwrap_err();
        assert!(err.to_string().contains("Ambiguous"));
        assert!(err.to_string().contains("remove, reorder"));
    }

    #[test]
    fn detects_unknown_domain_and_missing_command() {
        let registry = build_registry().unwrap();
        let err = registry
            .resolve_command(&tokens(&["unknown", "list"]))
            .map(|_| ())
            .unwrap_err();
        assert!(err.to_string().contains("Unknown domain"));

        let err = registry
            .resolve_command(&tokens(&["resolve"]))
            .map(|_| ())
            .unwrap_err();
        assert!(err.to_string().contains("Missing command"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rejects_duplicate_spellings() {
        let mut registry = CliRegistry::new();
        registry.register_domain(tags::domain()).unwrap();
        let err = registry.register_domain(tags::domain()).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn help_lists_every_domain() {
        let help = help_text();
        for domain in ["tag", "override", "member", "resolve"] {
            assert!(help.contains(&format!("  {}", domain)), "{}", domain);
        }
        assert!(help.contains("tag reorder <id>"));
    }
}
