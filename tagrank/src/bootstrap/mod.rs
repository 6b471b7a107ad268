// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::{Config, ConfigError, ValidatedConfig};
use crate::runtime_paths::RuntimePaths;
use std::error::Error;
use std::fmt;
use std::path::Path;

pub mod config;
pub mod root_guard;

#[derive(Debug)]
pub struct BootstrapResult {
    pub validated_config: ValidatedConfig,
    pub runtime_paths: RuntimePaths,
    pub created_config: bool,
}

#[derive(Debug)]
pub enum BootstrapError {
    Config(ConfigError),
    Io(std::io::Error),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::Config(err) => write!(f, "{}", err),
            BootstrapError::Io(err) => write!(f, "Bootstrap I/O error: {}", err),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BootstrapError::Config(err) => Some(err),
            BootstrapError::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for BootstrapError {
    fn from(err: ConfigError) -> Self {
        BootstrapError::Config(err)
    }
}

impl From<std::io::Error> for BootstrapError {
    fn from(err: std::io::Error) -> Self {
        BootstrapError::Io(err)
    }
}

/// Prepares a runtime root: seeds `config.yaml` when absent, validates it and
/// lays out `state/sys` for the YAML stores.
pub fn bootstrap_runtime(root: &Path) -> Result<BootstrapResult, BootstrapError> {
    let root_path = root_guard::ensure_root_is_clean(root)?;

    let created_config = config::ensure_config(&root_path)?;

    let validated_config = Config::load_and_validate(&root_path).map_err(BootstrapError::Config)?;

    let runtime_paths = RuntimePaths::from_root(&root_path)?;

    Ok(BootstrapResult {
        validated_config,
        runtime_paths,
        created_config,
    })
}

pub(crate) fn log_action(message: impl AsRef<str>) {
    eprintln!("[bootstrap] {}", message.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;
    use std::fs;

    #[test]
    fn bootstrap_creates_defaults_when_missing() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-default").unwrap();
        let result = bootstrap_runtime(fixture.path()).expect("bootstrap should succeed");

        assert!(result.created_config);
        assert_eq!(result.validated_config.admin.path, "/admin");
        assert_eq!(result.validated_config.tags.user_tag_prefix, "user:");
        assert!(fixture.path().join("config.yaml").exists());
        assert!(result.runtime_paths.state_sys_dir.is_dir());
    }

    #[test]
    fn bootstrap_keeps_existing_config() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-existing").unwrap();
        let yaml = "server:\n  host: 127.0.0.1\n  port: 9100\nadmin:\n  path: /console\nlogging:\n  level: warn\napp:\n  name: kept\n";
        fs::write(fixture.path().join("config.yaml"), yaml).unwrap();

        let result = bootstrap_runtime(fixture.path()).expect("bootstrap should succeed");
        assert!(!result.created_config);
        assert_eq!(result.validated_config.server.port, 9100);
        assert_eq!(result.validated_config.admin.path, "/console");
        assert_eq!(
            fs::read_to_string(fixture.path().join("config.yaml")).unwrap(),
            yaml
        );
    }

    #[test]
    fn bootstrap_reports_invalid_config() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-invalid").unwrap();
        fs::write(fixture.path().join("config.yaml"), "server: [").unwrap();

        let err = bootstrap_runtime(fixture.path()).unwrap_err();
        assert!(matches!(err, BootstrapError::Config(_)));
    }

    #[test]
    fn bootstrap_rejects_foreign_root() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-foreign").unwrap();
        fs::write(fixture.path().join("notes.txt"), "hello").unwrap();

        let err = bootstrap_runtime(fixture.path()).unwrap_err();
        assert!(err.to_string().contains("notes.txt"));
    }
}
