// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::management::core::{ManagementContext, ManagementRequest, ManagementResponse};
use crate::management::errors::DomainResult;
use futures_util::future::BoxFuture;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainActionKey {
    pub domain_id: u32,
    pub action_id: u32,
}

impl DomainActionKey {
    pub fn new(domain_id: u32, action_id: u32) -> Self {
        Self {
            domain_id,
            action_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub name: &'static str,
    pub id: u32,
}

impl ActionDescriptor {
    pub const fn new(name: &'static str, id: u32) -> Self {
        Self { name, id }
    }
}

#[derive(Debug, Clone)]
pub struct DomainDescriptor {
    pub name: &'static str,
    pub id: u32,
    /// Request actions only; `_OK`/`_ERR` ids are derived as `action * 100 + 1/2`.
    pub actions: Vec<ActionDescriptor>,
}

impl DomainDescriptor {
    pub fn action_name(&self, action_id: u32) -> Option<&'static str> {
        self.actions
            .iter()
            .find(|action| action.id == action_id)
            .map(|action| action.name)
    }
}

#[derive(Debug)]
pub struct RegistryError {
    message: String,
}

impl RegistryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "registry error: {}", self.message)
    }
}

impl Error for RegistryError {}

pub type ManagementHandler = Arc<
    dyn Fn(
            ManagementRequest,
            Arc<ManagementContext>,
        ) -> BoxFuture<'static, DomainResult<ManagementResponse>>
        + Send
        + Sync,
>;

#[derive(Default)]
pub struct ManagementRegistry {
    handlers: BTreeMap<DomainActionKey, ManagementHandler>,
    domains: BTreeMap<u32, DomainDescriptor>,
}

impl ManagementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a domain and routes each of its actions to `handler`.
    pub fn register_domain(
        &mut self,
        domain: DomainDescriptor,
        handler: ManagementHandler,
    ) -> Result<(), RegistryError> {
        if self.domains.contains_key(&domain.id) {
            return Err(RegistryError::new(format!(
                "Domain ID {} already registered",
                domain.id
            )));
        }
        for action in &domain.actions {
            self.register_handler(DomainActionKey::new(domain.id, action.id), handler.clone())?;
        }
        self.domains.insert(domain.id, domain);
        Ok(())
    }

    pub fn domains(&self) -> Vec<DomainDescriptor> {
        self.domains.values().cloned().collect()
    }

    pub fn domain(&self, domain_id: u32) -> Option<&DomainDescriptor> {
        self.domains.get(&domain_id)
    }

    pub fn register_handler(
        &mut self,
        key: DomainActionKey,
        handler: ManagementHandler,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(&key) {
            return Err(RegistryError::new(format!(
                "Handler already registered for domain {} action {}",
                key.domain_id, key.action_id
            )));
        }
        self.handlers.insert(key, handler);
        Ok(())
    }

    pub fn handler(&self, key: &DomainActionKey) -> Option<&ManagementHandler> {
        self.handlers.get(key)
    }
}
