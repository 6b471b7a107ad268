// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub state_sys_dir: PathBuf,
}

impl RuntimePaths {
    pub fn from_root(root: &Path) -> Result<Self, ConfigError> {
        let root_path = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root.to_path_buf()
        };

        if !root_path.exists() {
            fs::create_dir_all(&root_path).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "Failed to create runtime root '{}': {}",
                    root_path.display(),
                    e
                ))
            })?;
        }

        let root_canonical = canonicalize(&root_path, "runtime root")?;
        let config_file = root_canonical.join("config.yaml");

        let state_dir = root_canonical.join("state");
        let state_sys_dir = state_dir.join("sys");
        ensure_dir_exists(&state_dir)?;
        ensure_dir_exists(&state_sys_dir)?;

        Ok(Self {
            root: root_canonical,
            config_file,
            state_dir: canonicalize(&state_dir, "state directory")?,
            state_sys_dir: canonicalize(&state_sys_dir, "state/sys directory")?,
        })
    }
}

fn canonicalize(path: &Path, label: &str) -> Result<PathBuf, ConfigError> {
    path.canonicalize().map_err(|e| {
        ConfigError::ValidationError(format!(
            "Failed to canonicalize {} '{}': {}",
            label,
            path.display(),
            e
        ))
    })
}

fn ensure_dir_exists(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to create directory '{}': {}",
                path.display(),
                e
            ))
        })?;
    }

    ensure_dir_writable(path)
}

fn ensure_dir_writable(path: &Path) -> Result<(), ConfigError> {
    if !path.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "Directory must be writable (not a directory): {}",
            path.display()
        )));
    }

    let probe_path = path.join(format!(".tagrank-write-check-{}", Uuid::new_v4()));
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe_path)
        .map_err(|err| {
            ConfigError::ValidationError(format!(
                "Directory must be writable ({}): {}",
                path.display(),
                err
            ))
        })?;
    fs::remove_file(&probe_path).map_err(|err| {
        ConfigError::ValidationError(format!(
            "Directory must be writable (unable to clean probe file {}): {}",
            probe_path.display(),
            err
        ))
    })
}
