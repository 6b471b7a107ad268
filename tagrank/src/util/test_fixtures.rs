// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::runtime_paths::RuntimePaths;

/// Scratch runtime root under `target/test-fixtures`, removed on drop.
#[derive(Debug)]
pub struct TestFixtureRoot {
    path: PathBuf,
}

impl TestFixtureRoot {
    pub fn new_fixed(name: &str) -> std::io::Result<Self> {
        let root = fixtures_root().join(name);
        if root.exists() {
            fs::remove_dir_all(&root)?;
        }
        fs::create_dir_all(&root)?;
        Ok(Self { path: root })
    }

    pub fn new_unique(prefix: &str) -> std::io::Result<Self> {
        let name = format!("{}-{}", prefix, Uuid::new_v4());
        Self::new_fixed(&name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state_sys_dir(&self) -> PathBuf {
        self.path.join("state").join("sys")
    }

    pub fn init_runtime_layout(&self) -> std::io::Result<()> {
        fs::create_dir_all(self.state_sys_dir())
    }

    /// Writes a `state/sys` document verbatim, for seeding stores before they load.
    pub fn write_state_file(&self, file_name: &str, contents: &str) -> std::io::Result<()> {
        self.init_runtime_layout()?;
        fs::write(self.state_sys_dir().join(file_name), contents)
    }

    pub fn read_state_file(&self, file_name: &str) -> std::io::Result<String> {
        fs::read_to_string(self.state_sys_dir().join(file_name))
    }

    pub fn runtime_paths(&self) -> std::io::Result<RuntimePaths> {
        self.init_runtime_layout()?;
        RuntimePaths::from_root(&self.path)
            .map_err(|err| std::io::Error::other(err.to_string()))
    }
}

impl Drop for TestFixtureRoot {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn fixtures_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let repo_root = manifest_dir.parent().unwrap_or(&manifest_dir);
    repo_root.join("target").join("test-fixtures")
}
