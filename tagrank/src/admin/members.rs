// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::admin::shared::{self, dispatch};
use crate::app_state::AppState;
use crate::management::{
    MEMBER_ACTION_ASSIGN_OK, MEMBER_ACTION_SHOW_OK, MEMBER_ACTION_UNASSIGN_OK, ManagementCommand,
    MemberAssignRequest, MemberCommand, MemberShowRequest, MemberUnassignRequest, ResponsePayload,
};
use actix_web::{HttpResponse, Result, web};

pub fn configure(cfg: &mut web::ServiceConfig, path: &str) {
    cfg.service(
        web::scope(path)
            .route("/assign-api", web::post().to(assign_member))
            .route("/unassign-api", web::post().to(unassign_member))
            .route("/show-api", web::get().to(show_member)),
    );
}

async fn assign_member(
    app_state: web::Data<AppState>,
    body: web::Json<MemberAssignRequest>,
) -> Result<HttpResponse> {
    let command = ManagementCommand::Members(MemberCommand::Assign(body.into_inner()));
    Ok(match dispatch(&app_state, command, MEMBER_ACTION_ASSIGN_OK).await {
        Ok(payload) => shared::success_message(payload),
        Err(response) => response,
    })
}

async fn unassign_member(
    app_state: web::Data<AppState>,
    body: web::Json<MemberUnassignRequest>,
) -> Result<HttpResponse> {
    let command = ManagementCommand::Members(MemberCommand::Unassign(body.into_inner()));
    Ok(match dispatch(&app_state, command, MEMBER_ACTION_UNASSIGN_OK).await {
        Ok(payload) => shared::success_message(payload),
        Err(response) => response,
    })
}

async fn show_member(
    app_state: web::Data<AppState>,
    query: web::Query<MemberShowRequest>,
) -> Result<HttpResponse> {
    let command = ManagementCommand::Members(MemberCommand::Show(query.into_inner()));
    Ok(match dispatch(&app_state, command, MEMBER_ACTION_SHOW_OK).await {
        Ok(ResponsePayload::MemberShow(show)) => HttpResponse::Ok().json(show),
        Ok(_) => shared::unexpected_payload(),
        Err(response) => response,
    })
}
