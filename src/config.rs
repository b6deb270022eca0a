//! Layered configuration.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `~/.config/civic-desk/config.toml`
//! 3. `.civic-desk/config.toml` in the working directory
//! 4. `CIVIC_DESK_*` environment variables (`__` separates sections, so
//!    `CIVIC_DESK_GEO__TIMEOUT_SECS` sets `geo.timeout_secs`)
//!
//! Command-line flags are applied on top by the binary.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credential::FileCredentialStore;
use crate::geo::{CommandLocator, GeoOptions};
use crate::models::StatusLabels;

pub const ENV_PREFIX: &str = "CIVIC_DESK_";
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Figment(#[from] figment::Error),

    /// No value was configured for a path setting and there is no platform
    /// default to fall back on.
    #[error("no location for '{key}'; set it in config.toml or {}", env_var(.key))]
    MissingPath { key: &'static str },

    #[error("invalid '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

fn env_var(key: &str) -> String {
    format!("{}{}", ENV_PREFIX, key.replace('.', "__").to_ascii_uppercase())
}

const fn default_geo_timeout() -> u64 {
    10
}

const fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeoConfig {
    /// Location command line, split on whitespace. Unset means geolocation
    /// is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default = "default_geo_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_true")]
    pub high_accuracy: bool,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: default_geo_timeout(),
            high_accuracy: true,
        }
    }
}

impl GeoConfig {
    pub fn options(&self) -> GeoOptions {
        GeoOptions {
            high_accuracy: self.high_accuracy,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn locator(&self) -> Option<CommandLocator> {
        let argv: Vec<String> = self
            .command
            .as_deref()?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        CommandLocator::from_argv(&argv)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeskConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Where the admin secret is kept between runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_path: Option<PathBuf>,

    #[serde(default)]
    pub status_labels: StatusLabels,

    #[serde(default)]
    pub geo: GeoConfig,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            credential_path: None,
            status_labels: StatusLabels::default(),
            geo: GeoConfig::default(),
        }
    }
}

impl DeskConfig {
    /// Load from defaults, TOML files and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), after reading a `.env` file from the
    /// working directory if there is one.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".civic-desk/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // LOG and ADMIN_SECRET share the prefix but belong to the CLI.
        figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["log", "admin_secret"])
                .split("__"),
        )
    }

    /// Replace the base URL, as the `--base-url` flag does.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = base_url.to_string();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "base_url",
                reason: format!("'{}' must start with http:// or https://", self.base_url),
            });
        }
        if self.geo.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "geo.timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn credential_path(&self) -> Result<PathBuf, ConfigError> {
        self.credential_path
            .clone()
            .or_else(FileCredentialStore::default_path)
            .ok_or(ConfigError::MissingPath { key: "credential_path" })
    }

    pub fn credential_store(&self) -> Result<FileCredentialStore, ConfigError> {
        Ok(FileCredentialStore::new(self.credential_path()?))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("civic-desk").join("config.toml"))
    }
}
