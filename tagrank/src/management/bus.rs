// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::core::{
    ManagementCommand, ManagementContext, ManagementRequest, ManagementResponse,
};
use crate::management::errors::{DomainError, DomainResult, ManagementError, ManagementErrorKind};
use crate::management::ids::{next_connection_id, next_workflow_id};
use crate::management::registry::{DomainActionKey, ManagementRegistry};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

const BUS_CHANNEL_DEPTH: usize = 64;

/// Single task that runs management mutations one at a time, in arrival order.
///
/// Read-only commands are answered on the caller's task from the registry
/// snapshot, so a lookup never queues behind a reorder or a removal.
#[derive(Clone)]
pub struct ManagementBus {
    sender: mpsc::Sender<BusMessage>,
    registry: Arc<ManagementRegistry>,
    context: Arc<ManagementContext>,
}

struct BusMessage {
    request: ManagementRequest,
    reply: oneshot::Sender<Result<ManagementResponse, ManagementError>>,
}

impl ManagementBus {
    pub fn start(registry: ManagementRegistry, context: ManagementContext) -> Self {
        let (sender, mut receiver) = mpsc::channel::<BusMessage>(BUS_CHANNEL_DEPTH);
        let registry = Arc::new(registry);
        let registry_for_task = registry.clone();
        let context = Arc::new(context);
        let context_for_task = context.clone();

        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                let result = dispatch(&registry_for_task, &context_for_task, message.request).await;
                let _ = message.reply.send(result);
            }
            log::debug!("Management bus stopped");
        });

        Self {
            sender,
            registry,
            context,
        }
    }

    pub fn registry(&self) -> Arc<ManagementRegistry> {
        self.registry.clone()
    }

    /// Read access to the stores, for callers that only need a snapshot.
    pub fn context(&self) -> Arc<ManagementContext> {
        self.context.clone()
    }

    /// Sends `command` under fresh connection and workflow ids.
    pub async fn call(
        &self,
        command: ManagementCommand,
    ) -> Result<ManagementResponse, ManagementError> {
        self.send(next_connection_id(), next_workflow_id(), command)
            .await
    }

    pub async fn send(
        &self,
        connection_id: u32,
        workflow_id: u32,
        command: ManagementCommand,
    ) -> Result<ManagementResponse, ManagementError> {
        self.send_request(ManagementRequest {
            workflow_id,
            connection_id,
            command,
        })
        .await
    }

    pub async fn send_request(
        &self,
        request: ManagementRequest,
    ) -> Result<ManagementResponse, ManagementError> {
        if request.connection_id == 0 {
            return Err(ManagementError::new(
                ManagementErrorKind::Validation,
                None,
                None,
                "connection_id must be non-zero",
            ));
        }
        if request.workflow_id == 0 {
            return Err(ManagementError::new(
                ManagementErrorKind::Validation,
                None,
                None,
                "workflow_id must be non-zero",
            ));
        }
        if request.command.is_read_only() {
            return dispatch(&self.registry, &self.context, request).await;
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        let message = BusMessage {
            request,
            reply: reply_tx,
        };

        self.sender
            .send(message)
            .await
            .map_err(|_| ManagementError::internal("Management bus is unavailable"))?;

        reply_rx
            .await
            .map_err(|_| ManagementError::internal("Management bus dropped response"))?
    }
}

async fn dispatch(
    registry: &Arc<ManagementRegistry>,
    context: &Arc<ManagementContext>,
    request: ManagementRequest,
) -> Result<ManagementResponse, ManagementError> {
    log::trace!(
        "Management bus request (domain={}, action={}, connection_id={}, workflow_id={})",
        request.domain_id(),
        request.action_id(),
        request.connection_id,
        request.workflow_id
    );
    let key = DomainActionKey::new(request.domain_id(), request.action_id());
    let handler = registry.handler(&key).ok_or_else(|| {
        ManagementError::new(
            ManagementErrorKind::NotFound,
            Some(key.domain_id),
            Some(key.action_id),
            "No handler registered for command",
        )
    })?;

    let result: DomainResult<ManagementResponse> = handler(request, context.clone()).await;
    result.map_err(|err| normalize_error(err.as_ref(), key.domain_id, key.action_id))
}

fn normalize_error(err: &dyn DomainError, domain_id: u32, action_id: u32) -> ManagementError {
    ManagementError::new(err.kind(), None, None, err.to_string()).with_request(domain_id, action_id)
}
