// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::admin::shared::{self, dispatch};
use crate::app_state::AppState;
use crate::management::{
    ManagementCommand, ResponsePayload, TAG_ACTION_CREATE_OK, TAG_ACTION_LIST_OK,
    TAG_ACTION_REMOVE_OK, TAG_ACTION_REORDER_OK, TAG_ACTION_SETTINGS_OK, TagCommand,
    TagCreateRequest, TagListRequest, TagRemoveRequest, TagReorderRequest, TagSettingsRequest,
};
use actix_web::{HttpResponse, Result, web};
use serde::Deserialize;
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig, path: &str) {
    cfg.service(
        web::scope(path)
            .route("/list-api", web::get().to(list_tags))
            .route("/reorder-api", web::post().to(reorder_tags))
            .route("/remove-api", web::post().to(remove_tag))
            .route("/create-api", web::post().to(create_tag))
            .route("/settings-api/{id}", web::get().to(tag_settings)),
    );
}

#[derive(Deserialize)]
pub struct RemoveTagForm {
    pub id: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

async fn list_tags(app_state: web::Data<AppState>) -> Result<HttpResponse> {
    let command = ManagementCommand::Tags(TagCommand::List(TagListRequest {}));
    Ok(match dispatch(&app_state, command, TAG_ACTION_LIST_OK).await {
        Ok(ResponsePayload::TagList(list)) => HttpResponse::Ok().json(list),
        Ok(_) => shared::unexpected_payload(),
        Err(response) => response,
    })
}

/// Never redirects: a rejected order answers with the error so the console can
/// reload the authoritative list.
async fn reorder_tags(
    app_state: web::Data<AppState>,
    body: web::Json<TagReorderRequest>,
) -> Result<HttpResponse> {
    let command = ManagementCommand::Tags(TagCommand::Reorder(body.into_inner()));
    Ok(match dispatch(&app_state, command, TAG_ACTION_REORDER_OK).await {
        Ok(ResponsePayload::TagList(list)) => {
            log::info!("Tag order updated to version {}", list.version);
            HttpResponse::Ok().json(json!({
                "success": true,
                "version": list.version,
                "tags": list.tags,
            }))
        }
        Ok(_) => shared::unexpected_payload(),
        Err(response) => response,
    })
}

async fn remove_tag(
    app_state: web::Data<AppState>,
    body: web::Json<RemoveTagForm>,
) -> Result<HttpResponse> {
    let RemoveTagForm { id, redirect } = body.into_inner();
    let command = ManagementCommand::Tags(TagCommand::Remove(TagRemoveRequest { id }));
    let payload = match dispatch(&app_state, command, TAG_ACTION_REMOVE_OK).await {
        Ok(payload) => payload,
        Err(response) => return Ok(response),
    };
    match redirect {
        Some(target) if shared::is_local_redirect(&target) => Ok(HttpResponse::SeeOther()
            .insert_header(("Location", target))
            .finish()),
        Some(target) => {
            log::warn!("Ignoring non-local redirect target '{}'", target);
            Ok(shared::success_message(payload))
        }
        None => Ok(shared::success_message(payload)),
    }
}

async fn create_tag(
    app_state: web::Data<AppState>,
    body: web::Json<TagCreateRequest>,
) -> Result<HttpResponse> {
    let command = ManagementCommand::Tags(TagCommand::Create(body.into_inner()));
    Ok(match dispatch(&app_state, command, TAG_ACTION_CREATE_OK).await {
        Ok(payload) => shared::success_message(payload),
        Err(response) => response,
    })
}

async fn tag_settings(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let command = ManagementCommand::Tags(TagCommand::Settings(TagSettingsRequest {
        id: path.into_inner(),
    }));
    Ok(match dispatch(&app_state, command, TAG_ACTION_SETTINGS_OK).await {
        Ok(ResponsePayload::ScopeOverrides(overrides)) => HttpResponse::Ok().json(overrides),
        Ok(_) => shared::unexpected_payload(),
        Err(response) => response,
    })
}
