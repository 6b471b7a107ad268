// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::app_state::AppState;
use crate::management::{
    DomainActionKey, ErrorResponse, ManagementCommand, ManagementErrorKind, ManagementResponse,
    ResponsePayload,
};
use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;

pub fn json_error_response(kind: ManagementErrorKind, message: &str) -> HttpResponse {
    HttpResponse::build(status_for_kind(kind)).json(json!({
        "success": false,
        "kind": kind,
        "message": message,
    }))
}

pub fn status_for_kind(kind: ManagementErrorKind) -> StatusCode {
    match kind {
        ManagementErrorKind::NotFound => StatusCode::NOT_FOUND,
        ManagementErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ManagementErrorKind::InvalidOrder | ManagementErrorKind::Conflict => StatusCode::CONFLICT,
        ManagementErrorKind::Validation => StatusCode::BAD_REQUEST,
        ManagementErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Internal details stay in the log; the client gets a generic message.
pub fn error_response(error: &ErrorResponse) -> HttpResponse {
    if error.kind == ManagementErrorKind::Internal {
        log::error!("Management request failed: {}", error.message);
        return json_error_response(error.kind, "An internal error occurred");
    }
    json_error_response(error.kind, &error.message)
}

/// Sends `command` over the bus and returns the payload when the reply carries `ok_action`.
///
/// Any other reply is already rendered as the matching HTTP error.
pub async fn dispatch(
    app_state: &AppState,
    command: ManagementCommand,
    ok_action: u32,
) -> Result<ResponsePayload, HttpResponse> {
    let domain_id = command.domain_id();
    let response = app_state
        .management_bus
        .call(command)
        .await
        .map_err(|err| {
            log::error!("Management bus failure: {}", err);
            json_error_response(ManagementErrorKind::Internal, "An internal error occurred")
        })?;
    into_payload(response, DomainActionKey::new(domain_id, ok_action))
}

fn into_payload(
    response: ManagementResponse,
    expected: DomainActionKey,
) -> Result<ResponsePayload, HttpResponse> {
    if let ResponsePayload::Error(error) = &response.payload {
        return Err(error_response(error));
    }
    if DomainActionKey::new(response.domain_id, response.action_id) != expected {
        log::error!(
            "Unexpected management reply: domain {} action {}",
            response.domain_id,
            response.action_id
        );
        return Err(json_error_response(
            ManagementErrorKind::Internal,
            "An internal error occurred",
        ));
    }
    Ok(response.payload)
}

pub fn success_message(payload: ResponsePayload) -> HttpResponse {
    let message = match payload {
        ResponsePayload::Message(message) => message.message,
        _ => String::new(),
    };
    HttpResponse::Ok().json(json!({ "success": true, "message": message }))
}

pub fn unexpected_payload() -> HttpResponse {
    log::error!("Management reply carried an unexpected payload");
    json_error_response(ManagementErrorKind::Internal, "An internal error occurred")
}

/// Accepts same-origin absolute paths only.
pub fn is_local_redirect(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control)
}
