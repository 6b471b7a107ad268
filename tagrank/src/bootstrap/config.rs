// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action};
use crate::config::default_config_yaml;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Writes the default `config.yaml` unless one is already present.
///
/// Returns whether a file was created. A concurrent writer winning the race
/// counts as "already present".
pub fn ensure_config(root: &Path) -> Result<bool, BootstrapError> {
    let config_path = root.join("config.yaml");

    if config_path.exists() {
        return Ok(false);
    }

    let contents = default_config_yaml();

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&config_path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(BootstrapError::Io(err)),
    };

    file.write_all(contents.as_bytes())?;
    file.sync_all()?;

    log_action(format!("created {}", config_path.display()));

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    #[test]
    fn ensure_config_writes_once() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-config").unwrap();
        assert!(ensure_config(fixture.path()).unwrap());
        let first = std::fs::read_to_string(fixture.path().join("config.yaml")).unwrap();
        assert!(first.contains("user_tag_prefix"));

        assert!(!ensure_config(fixture.path()).unwrap());
        let second = std::fs::read_to_string(fixture.path().join("config.yaml")).unwrap();
        assert_eq!(first, second);
    }
}
