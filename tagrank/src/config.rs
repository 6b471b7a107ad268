// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const MAX_TAG_LIMIT: usize = 10000;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub tags: TagsConfig,
}

/// Configuration that passed [`Config::load_and_validate`]; the only form the
/// server and the management context accept.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
    pub app: AppConfig,
    pub tags: TagsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    4
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TagsConfig {
    /// Prefix that turns a user id into that user's own tag, e.g. `user:alice`.
    #[serde(default = "default_user_tag_prefix")]
    pub user_tag_prefix: String,
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            user_tag_prefix: default_user_tag_prefix(),
            max_tags: default_max_tags(),
        }
    }
}

fn default_user_tag_prefix() -> String {
    "user:".to_string()
}

fn default_max_tags() -> usize {
    1000
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join("config.yaml");
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&config_content).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            ))
        })
    }

    /// Loads and validates configuration at startup. If validation fails, the application should not start.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        Self::load(root)?.validate()
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        Self::validate_server(&self.server)?;
        Self::validate_admin(&self.admin)?;
        Self::validate_logging(&self.logging)?;
        Self::validate_tags(&self.tags)?;

        Ok(ValidatedConfig {
            server: self.server,
            admin: self.admin,
            logging: self.logging,
            app: self.app,
            tags: self.tags,
        })
    }

    fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
        if server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host cannot be empty".to_string(),
            ));
        }
        if server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be greater than 0".to_string(),
            ));
        }
        if server.workers == 0 {
            return Err(ConfigError::ValidationError(
                "server.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_admin(admin: &AdminConfig) -> Result<(), ConfigError> {
        if !admin.path.starts_with('/') || admin.path.len() < 2 {
            return Err(ConfigError::ValidationError(format!(
                "admin.path must start with '/' and name a segment, got: '{}'",
                admin.path
            )));
        }
        if admin.path.ends_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "admin.path must not end with '/', got: '{}'",
                admin.path
            )));
        }
        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let level = logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {}, got: '{}'",
                LOG_LEVELS.join(", "),
                logging.level
            )));
        }
        Ok(())
    }

    fn validate_tags(tags: &TagsConfig) -> Result<(), ConfigError> {
        let prefix = &tags.user_tag_prefix;
        if !prefix.ends_with(':') || prefix.len() < 2 {
            return Err(ConfigError::ValidationError(format!(
                "tags.user_tag_prefix must be a name followed by ':', got: '{}'",
                prefix
            )));
        }
        if !prefix[..prefix.len() - 1]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(ConfigError::ValidationError(format!(
                "tags.user_tag_prefix contains invalid characters: '{}'",
                prefix
            )));
        }
        if !(1..=MAX_TAG_LIMIT).contains(&tags.max_tags) {
            return Err(ConfigError::ValidationError(format!(
                "tags.max_tags must be between 1 and {}, got: {}",
                MAX_TAG_LIMIT, tags.max_tags
            )));
        }
        Ok(())
    }
}

impl ValidatedConfig {
    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        }
    }
}

/// Contents written by bootstrap when the runtime root has no `config.yaml`.
pub fn default_config_yaml() -> String {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 7080,
            workers: default_workers(),
        },
        admin: AdminConfig {
            path: "/admin".to_string(),
        },
        logging: LoggingConfig {
            level: "info".to_string(),
        },
        app: AppConfig {
            name: "tagrank".to_string(),
            description: "Tag priority console".to_string(),
        },
        tags: TagsConfig::default(),
    };
    serde_yaml::to_string(&config).unwrap_or_default()
}

#[cfg(test)]
pub fn test_config() -> ValidatedConfig {
    ValidatedConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 7080,
            workers: 1,
        },
        admin: AdminConfig {
            path: "/admin".to_string(),
        },
        logging: LoggingConfig {
            level: "info".to_string(),
        },
        app: AppConfig {
            name: "Test App".to_string(),
            description: "Test Description".to_string(),
        },
        tags: TagsConfig::default(),
    }
}
