// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const EXPECTED_ROOT_ENTRIES: [&str; 3] = ["config.yaml", "state", "logs"];

/// Refuses to bootstrap into a directory that holds anything but a runtime root.
pub fn ensure_root_is_clean(root: &Path) -> Result<PathBuf, BootstrapError> {
    let root_path = normalize_root(root)?;
    verify_root_entries(&root_path)?;
    Ok(root_path)
}

fn normalize_root(root: &Path) -> Result<PathBuf, BootstrapError> {
    let root_path = if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root.to_path_buf()
    };

    if root_path.exists() {
        if !root_path.is_dir() {
            return Err(BootstrapError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Runtime root is not a directory: {}", root_path.display()),
            )));
        }
        return Ok(root_path);
    }

    fs::create_dir_all(&root_path)?;
    log_action(format!(
        "created runtime root directory {}",
        root_path.display()
    ));
    Ok(root_path)
}

fn verify_root_entries(root: &Path) -> Result<(), BootstrapError> {
    let mut unexpected: Vec<String> = fs::read_dir(root)?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|name| !EXPECTED_ROOT_ENTRIES.contains(&name.as_str()))
        .collect();

    if unexpected.is_empty() {
        return Ok(());
    }

    unexpected.sort();
    Err(BootstrapError::Io(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!(
            "Runtime root '{}' contains unexpected entries: {}. Expected only: {}.",
            root.display(),
            unexpected.join(", "),
            EXPECTED_ROOT_ENTRIES.join(", ")
        ),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    #[test]
    fn accepts_empty_and_runtime_roots() {
        let fixture = TestFixtureRoot::new_unique("root-guard-ok").unwrap();
        assert!(ensure_root_is_clean(fixture.path()).is_ok());
        fixture.init_runtime_layout().unwrap();
        std::fs::write(fixture.path().join("config.yaml"), "").unwrap();
        assert!(ensure_root_is_clean(fixture.path()).is_ok());
    }

    #[test]
    fn creates_missing_root() {
        let fixture = TestFixtureRoot::new_unique("root-guard-create").unwrap();
        let nested = fixture.path().join("state").join("nested-root");
        let root = ensure_root_is_clean(&nested).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn rejects_file_as_root() {
        let fixture = TestFixtureRoot::new_unique("root-guard-file").unwrap();
        let file = fixture.path().join("config.yaml");
        std::fs::write(&file, "").unwrap();
        assert!(ensure_root_is_clean(&file).is_err());
    }
}
