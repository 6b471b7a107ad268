// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::admin::shared::{self, dispatch};
use crate::app_state::AppState;
use crate::management::{
    ManagementCommand, OVERRIDE_ACTION_CLEAR_OK, OVERRIDE_ACTION_SET_OK, OverrideClearRequest,
    OverrideCommand, OverrideSetRequest,
};
use actix_web::{HttpResponse, Result, web};

pub fn configure(cfg: &mut web::ServiceConfig, path: &str) {
    cfg.service(
        web::scope(path)
            .route("/set-api", web::post().to(set_override))
            .route("/clear-api", web::post().to(clear_override)),
    );
}

async fn set_override(
    app_state: web::Data<AppState>,
    body: web::Json<OverrideSetRequest>,
) -> Result<HttpResponse> {
    let command = ManagementCommand::Overrides(OverrideCommand::Set(body.into_inner()));
    Ok(match dispatch(&app_state, command, OVERRIDE_ACTION_SET_OK).await {
        Ok(payload) => shared::success_message(payload),
        Err(response) => response,
    })
}

async fn clear_override(
    app_state: web::Data<AppState>,
    body: web::Json<OverrideClearRequest>,
) -> Result<HttpResponse> {
    let command = ManagementCommand::Overrides(OverrideCommand::Clear(body.into_inner()));
    Ok(match dispatch(&app_state, command, OVERRIDE_ACTION_CLEAR_OK).await {
        Ok(payload) => shared::success_message(payload),
        Err(response) => response,
    })
}
