// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use serde_json::Value;
use std::sync::Arc;
use tagrank::admin;
use tagrank::app_state::AppState;
use tagrank::bootstrap::bootstrap_runtime;
use tagrank::config::ValidatedConfig;
use tagrank::management::{
    ManagementBus, ManagementContext, TagOrigin, build_default_registry,
};
use tagrank::util::test_fixtures::TestFixtureRoot;

pub struct TestHarness {
    pub fixture: TestFixtureRoot,
    pub config: Arc<ValidatedConfig>,
    pub app_state: Arc<AppState>,
}

impl TestHarness {
    /// Fresh runtime root with the default config and empty stores.
    pub fn new(prefix: &str) -> Self {
        let fixture = TestFixtureRoot::new_unique(prefix).expect("fixture root");
        let bootstrap = bootstrap_runtime(fixture.path()).expect("bootstrap");
        let config = Arc::new(bootstrap.validated_config);
        let context = ManagementContext::from_components(config.clone(), bootstrap.runtime_paths)
            .expect("management context");
        let runtime_paths = context.runtime_paths.clone();
        let bus = ManagementBus::start(build_default_registry().expect("registry"), context);
        let app_state = Arc::new(AppState::new(runtime_paths, bus));
        Self {
            fixture,
            config,
            app_state,
        }
    }

    pub fn context(&self) -> Arc<ManagementContext> {
        self.app_state.management_bus.context()
    }

    pub fn bundle(&self) -> AppBundle {
        AppBundle {
            config: self.config.clone(),
            app_state: self.app_state.clone(),
            admin_path: self.admin_path(),
        }
    }

    pub fn admin_path(&self) -> String {
        self.config.admin.path.clone()
    }

    pub fn create_tags(&self, ids: &[&str]) {
        let context = self.context();
        for id in ids {
            context
                .tag_registry
                .create_tag(id, TagOrigin::Explicit)
                .expect("create tag");
        }
    }

    pub fn assign(&self, user: &str, tags: &[&str]) {
        let context = self.context();
        for tag in tags {
            context.member_store.assign(user, tag).expect("assign");
        }
    }

    pub fn set_override(&self, scope: &str, key: &str, value: Value) {
        self.context()
            .override_store
            .set_override(scope, key, value)
            .expect("set override");
    }

    pub fn listed_ids(&self) -> Vec<String> {
        self.context()
            .tag_registry
            .list_tags()
            .expect("list tags")
            .into_iter()
            .map(|tag| tag.id)
            .collect()
    }
}

/// Owned pieces of an admin app, so the app does not borrow the harness.
pub struct AppBundle {
    pub config: Arc<ValidatedConfig>,
    pub app_state: Arc<AppState>,
    pub admin_path: String,
}

pub fn build_test_app(
    bundle: AppBundle,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let admin_path = bundle.admin_path;
    App::new()
        .app_data(web::Data::from(bundle.config))
        .app_data(web::Data::from(bundle.app_state))
        .configure(move |cfg| admin::configure(cfg, &admin_path))
}

pub async fn read_json(response: ServiceResponse<impl MessageBody>) -> Value {
    let body = test::read_body(response).await;
    serde_json::from_slice(&body).expect("json body")
}
