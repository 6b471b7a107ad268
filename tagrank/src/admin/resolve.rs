// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::admin::shared::{self, dispatch};
use crate::app_state::AppState;
use crate::management::{
    ManagementCommand, RESOLVE_ACTION_EFFECTIVE_OK, RESOLVE_ACTION_KEY_OK, ResolveCommand,
    ResolveEffectiveRequest, ResolveKeyRequest, ResponsePayload,
};
use actix_web::{HttpResponse, Result, web};

pub fn configure(cfg: &mut web::ServiceConfig, path: &str) {
    cfg.service(
        web::scope(path)
            .route("", web::get().to(resolve_key))
            .route("/effective", web::get().to(resolve_effective)),
    );
}

async fn resolve_key(
    app_state: web::Data<AppState>,
    query: web::Query<ResolveKeyRequest>,
) -> Result<HttpResponse> {
    let command = ManagementCommand::Resolve(ResolveCommand::Key(query.into_inner()));
    Ok(match dispatch(&app_state, command, RESOLVE_ACTION_KEY_OK).await {
        Ok(ResponsePayload::Resolve(resolved)) => HttpResponse::Ok().json(resolved),
        Ok(_) => shared::unexpected_payload(),
        Err(response) => response,
    })
}

async fn resolve_effective(
    app_state: web::Data<AppState>,
    query: web::Query<ResolveEffectiveRequest>,
) -> Result<HttpResponse> {
    let command = ManagementCommand::Resolve(ResolveCommand::Effective(query.into_inner()));
    Ok(match dispatch(&app_state, command, RESOLVE_ACTION_EFFECTIVE_OK).await {
        Ok(ResponsePayload::Effective(effective)) => HttpResponse::Ok().json(effective),
        Ok(_) => shared::unexpected_payload(),
        Err(response) => response,
    })
}
