//! Operator configuration.
//!
//! Read from a TOML file, then overridden by `HAPPYDOMAIN_*` environment
//! variables:
//!
//! ```toml
//! disable_providers = false
//! disable_registration = true
//! base_url = "https://dns.example.net"
//! database_url = "/var/lib/happydomain/happydomain.db"
//! ```

use std::path::Path;

use happydomain_core::CoreOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_DISABLE_PROVIDERS: &str = "HAPPYDOMAIN_DISABLE_PROVIDERS";
pub const ENV_DISABLE_REGISTRATION: &str = "HAPPYDOMAIN_DISABLE_REGISTRATION";
pub const ENV_BASE_URL: &str = "HAPPYDOMAIN_BASE_URL";
pub const ENV_DATABASE_URL: &str = "HAPPYDOMAIN_DATABASE_URL";

const DEFAULT_DATABASE_URL: &str = "happydomain.db";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {var}, expected a boolean")]
    InvalidBool { var: String, value: String },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Refuse provider changes and domain creation.
    pub disable_providers: bool,
    /// Refuse new accounts.
    pub disable_registration: bool,
    /// Public URL the instance is served from.
    pub base_url: String,
    /// SQLite database path, or a full `sqlite:` URL.
    pub database_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            disable_providers: false,
            disable_registration: false,
            base_url: String::new(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document. Missing keys keep their default.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path` (defaults when it does not exist) and apply the
    /// environment on top.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No configuration at {}, using defaults", path.display());
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Override fields from `lookup`, called with each variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DISABLE_PROVIDERS) {
            self.disable_providers = parse_bool(ENV_DISABLE_PROVIDERS, &value)?;
        }
        if let Some(value) = lookup(ENV_DISABLE_REGISTRATION) {
            self.disable_registration = parse_bool(ENV_DISABLE_REGISTRATION, &value)?;
        }
        if let Some(value) = lookup(ENV_BASE_URL) {
            self.base_url = value;
        }
        if let Some(value) = lookup(ENV_DATABASE_URL) {
            self.database_url = value;
        }
        Ok(())
    }

    #[must_use]
    pub fn core_options(&self) -> CoreOptions {
        CoreOptions {
            disable_providers: self.disable_providers,
            disable_registration: self.disable_registration,
        }
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}
