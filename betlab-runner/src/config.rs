//! Application configuration (`betlab.toml`).
//!
//! ```toml
//! output_dir = "reports"
//!
//! [store]
//! kind = "http"              # or "file"
//! url = "http://localhost:3000"
//! timeout_secs = 10
//!
//! [audit]
//! unit_stake = 100.0
//! base_bank = 10000.0
//! ```
//!
//! Every key is optional. Stake sizing lives in `BankConfig`, which is
//! persisted with the picks, not here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_STORE_PATH: &str = "betlab-data.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UNIT_STAKE: f64 = 100.0;
pub const DEFAULT_BASE_BANK: f64 = 10_000.0;

/// Errors from loading or validating the application config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    File,
    Http,
}

/// Where picks and bank configuration are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub kind: StoreKind,
    /// JSON file for the file store.
    pub path: PathBuf,
    /// Base URL for the HTTP store (`{url}/api/data`).
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            kind: StoreKind::File,
            path: PathBuf::from(DEFAULT_STORE_PATH),
            url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Nominal figures for the audit CSV, independent of the real stake config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    pub unit_stake: f64,
    pub base_bank: f64,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            unit_stake: DEFAULT_UNIT_STAKE,
            base_bank: DEFAULT_BASE_BANK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreSettings,
    pub audit: AuditSettings,
    /// Root for report artifact bundles.
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            audit: AuditSettings::default(),
            output_dir: PathBuf::from("reports"),
        }
    }
}

impl AppConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load `path` if it exists, otherwise the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.kind == StoreKind::Http
            && self.store.url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(ConfigError::Invalid("store.kind = \"http\" requires store.url".into()));
        }
        if self.store.timeout_secs == 0 {
            return Err(ConfigError::Invalid("store.timeout_secs must be > 0".into()));
        }
        if !(self.audit.unit_stake.is_finite() && self.audit.unit_stake > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "audit.unit_stake must be positive, got {}",
                self.audit.unit_stake
            )));
        }
        if !(self.audit.base_bank.is_finite() && self.audit.base_bank > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "audit.base_bank must be positive, got {}",
                self.audit.base_bank
            )));
        }
        Ok(())
    }
}
