// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod members;
mod overrides;
mod resolve;
pub mod shared;
mod tags;

use actix_web::{HttpResponse, Result, web};
use serde_json::json;

/// Mounts the admin JSON API under `admin_path`.
pub fn configure(cfg: &mut web::ServiceConfig, admin_path: &str) {
    cfg.service(
        web::scope(admin_path)
            .route("", web::get().to(admin_index))
            .configure(|cfg| {
                tags::configure(cfg, "/tags");
                overrides::configure(cfg, "/overrides");
                members::configure(cfg, "/members");
                resolve::configure(cfg, "/resolve-api");
            }),
    );
}

async fn admin_index(config: web::Data<crate::config::ValidatedConfig>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "app": config.app.name,
        "description": config.app.description,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use crate::config::test_config;
    use crate::util::test_fixtures::TestFixtureRoot;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn routes_are_mounted_under_admin_path() {
        let fixture = TestFixtureRoot::new_unique("admin-routes").unwrap();
        let config = test_config();
        let app_state = AppState::new_for_tests(fixture.runtime_paths().unwrap(), config.clone());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .app_data(web::Data::new(app_state))
                .configure(|cfg| configure(cfg, "/admin")),
        )
        .await;

        let index = test::TestRequest::get().uri("/admin").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, index).await;
        assert_eq!(body["app"], "Test App");

        let list = test::TestRequest::get()
            .uri("/admin/tags/list-api")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, list).await;
        assert_eq!(body["tags"][0]["id"], "admin");
        assert!(body["tags"][0]["rank"].is_null());

        let outside = test::TestRequest::get().uri("/tags/list-api").to_request();
        let response = test::call_service(&app, outside).await;
        assert_eq!(response.status(), 404);
    }
}
