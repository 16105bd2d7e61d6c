//! Persistence collaborators for the pick log and bank configuration.
//!
//! Both stores hold the same document, `{ "picks": [...], "config": {...} }`,
//! and replace it wholesale on save (last writer wins). Invalid stored picks
//! are dropped with a warning on load rather than failing the whole load.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use betlab_core::{BankConfig, Pick};

use crate::config::{StoreKind, StoreSettings};
use crate::import::picks_from_values;

/// Errors from loading or saving the store document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("store misconfigured: {0}")]
    Config(String),
}

/// The persisted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreData {
    pub picks: Vec<Pick>,
    pub config: BankConfig,
}

/// Stored shape before pick validation.
#[derive(Deserialize)]
struct WireData {
    #[serde(default)]
    picks: Vec<serde_json::Value>,
    #[serde(default)]
    config: BankConfig,
}

impl StoreData {
    /// Parse a stored document, dropping picks that fail validation.
    pub fn from_json(bytes: &[u8]) -> Result<Self, StoreError> {
        let wire: WireData = serde_json::from_slice(bytes)?;
        let report = picks_from_values(wire.picks);
        if report.skipped > 0 {
            warn!(skipped = report.skipped, "dropped invalid stored picks");
        }
        Ok(Self {
            picks: report.picks,
            config: wire.config,
        })
    }
}

/// A place the pick log can be loaded from and saved to.
pub trait PickStore: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    fn load(&self) -> Result<StoreData, StoreError>;

    fn save(&self, data: &StoreData) -> Result<(), StoreError>;
}

/// Build the store selected by the application config.
pub fn open_store(settings: &StoreSettings) -> Result<Box<dyn PickStore>, StoreError> {
    match settings.kind {
        StoreKind::File => Ok(Box::new(FileStore::new(&settings.path))),
        StoreKind::Http => {
            let url = settings
                .url
                .as_deref()
                .ok_or_else(|| StoreError::Config("http store needs a url".into()))?;
            Ok(Box::new(HttpStore::new(url, Duration::from_secs(settings.timeout_secs))?))
        }
    }
}

// ─── File store ─────────────────────────────────────────────────────

/// JSON file on local disk. A missing file loads as an empty store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PickStore for FileStore {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn load(&self) -> Result<StoreData, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "store file missing, starting empty");
            return Ok(StoreData::default());
        }
        let bytes = std::fs::read(&self.path).map_err(|e| self.io_err(e))?;
        StoreData::from_json(&bytes)
    }

    /// Write to a sibling temp file, then rename over the target.
    fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let json = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        debug!(path = %self.path.display(), picks = data.picks.len(), "store saved");
        Ok(())
    }
}

// ─── HTTP store ─────────────────────────────────────────────────────

/// Remote store: `GET {base}/api/data` and `POST {base}/api/data`.
pub struct HttpStore {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("betlab/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/api/data", base_url.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn check(&self, resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(StoreError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            })
        }
    }
}

impl PickStore for HttpStore {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn load(&self) -> Result<StoreData, StoreError> {
        let resp = self.check(self.client.get(&self.url).send()?)?;
        let bytes = resp.bytes()?;
        StoreData::from_json(&bytes)
    }

    fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        self.check(self.client.post(&self.url).json(data).send()?)?;
        debug!(url = %self.url, picks = data.picks.len(), "store saved");
        Ok(())
    }
}
