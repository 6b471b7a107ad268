// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::CliError;
use serde_json::Value;

pub(crate) fn parse_required_arg<'a>(
    args: &'a [String],
    label: &str,
) -> Result<(String, &'a [String]), CliError> {
    match args.split_first() {
        Some((first, rest)) => Ok((first.clone(), rest)),
        None => Err(CliError::usage(format!("Missing {}", label))),
    }
}

pub(crate) fn next_value(args: &[String], idx: &mut usize, flag: &str) -> Result<String, CliError> {
    let value = args
        .get(*idx)
        .cloned()
        .ok_or_else(|| CliError::usage(format!("{} requires a value", flag)))?;
    *idx += 1;
    Ok(value)
}

pub(crate) fn reject_extra(args: &[String], command: &str) -> Result<(), CliError> {
    match args.first() {
        Some(extra) => Err(CliError::usage(format!(
            "Unexpected argument for {}: {}",
            command, extra
        ))),
        None => Ok(()),
    }
}

/// JSON when it parses, otherwise the raw text as a string.
pub(crate) fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
