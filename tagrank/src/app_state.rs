// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::ManagementBus;
use crate::runtime_paths::RuntimePaths;

pub struct AppState {
    pub runtime_paths: RuntimePaths,
    pub management_bus: ManagementBus,
}

impl AppState {
    pub fn new(runtime_paths: RuntimePaths, management_bus: ManagementBus) -> Self {
        Self {
            runtime_paths,
            management_bus,
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn new_for_tests(
        runtime_paths: RuntimePaths,
        config: crate::config::ValidatedConfig,
    ) -> Self {
        let registry =
            crate::management::build_default_registry().expect("test management registry");
        let context = crate::management::ManagementContext::from_components(
            std::sync::Arc::new(config),
            runtime_paths.clone(),
        )
        .expect("test management context");
        let bus = crate::management::ManagementBus::start(registry, context);
        Self::new(runtime_paths, bus)
    }
}
