//! The mutable working state behind every front end.
//!
//! A [`Session`] owns the pick log, bank configuration and active filters,
//! and talks to one [`PickStore`]. Analysis always runs over a frozen
//! [`Snapshot`] taken from the session, never over the live state.

use chrono::{NaiveDate, Utc};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use betlab_core::{analyze, dedup, BankConfig, Filters, Pick, Plan, Report, Snapshot};

use crate::import::{import_path, ImportError, ImportReport};
use crate::store::{PickStore, StoreData, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("store could not be loaded; refusing to overwrite it")]
    NotLoaded,
}

/// What an import changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records parsed from the source.
    pub parsed: usize,
    /// Records the parser rejected.
    pub skipped: usize,
    /// Duplicates collapsed after merging.
    pub duplicates: usize,
}

pub struct Session {
    pub picks: Vec<Pick>,
    pub config: BankConfig,
    pub filters: Filters,
    store: Box<dyn PickStore>,
    loaded: bool,
}

impl Session {
    /// Load from `store`. On failure the session starts from defaults and
    /// [`Session::is_loaded`] reports false.
    pub fn open(store: Box<dyn PickStore>) -> Self {
        let (data, loaded) = match store.load() {
            Ok(data) => (data, true),
            Err(e) => {
                warn!(store = %store.describe(), error = %e, "failed to load store, using defaults");
                (StoreData::default(), false)
            }
        };
        let clean = dedup(data.picks);
        info!(store = %store.describe(), picks = clean.picks.len(), "session opened");
        Self {
            picks: clean.picks,
            config: data.config,
            filters: Filters::default(),
            store,
            loaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn store(&self) -> &dyn PickStore {
        self.store.as_ref()
    }

    // ─── Pick log ───────────────────────────────────────────────────

    /// Merge imported picks into the log, then collapse duplicates.
    pub fn merge(&mut self, report: ImportReport) -> ImportSummary {
        let parsed = report.picks.len();
        self.picks.extend(report.picks);
        let duplicates = self.dedup();
        ImportSummary {
            parsed,
            skipped: report.skipped,
            duplicates,
        }
    }

    /// Discard the current pick log and take the imported picks instead,
    /// deduplicated. Used to restore a backup.
    pub fn replace(&mut self, report: ImportReport) -> ImportSummary {
        let previous = std::mem::take(&mut self.picks);
        info!(previous = previous.len(), incoming = report.picks.len(), "replacing pick log");
        self.merge(report)
    }

    /// Import a file and merge it; ingestion timestamps start at now (ms).
    pub fn import_file(&mut self, path: &Path, plan: Option<Plan>) -> Result<ImportSummary, SessionError> {
        let report = import_path(path, plan, Utc::now().timestamp_millis())?;
        Ok(self.merge(report))
    }

    /// Import a file and replace the pick log with it. The log is left
    /// untouched if the file cannot be parsed.
    pub fn restore_file(&mut self, path: &Path, plan: Option<Plan>) -> Result<ImportSummary, SessionError> {
        let report = import_path(path, plan, Utc::now().timestamp_millis())?;
        Ok(self.replace(report))
    }

    /// Collapse duplicates in place; returns how many were removed.
    pub fn dedup(&mut self) -> usize {
        let clean = dedup(std::mem::take(&mut self.picks));
        self.picks = clean.picks;
        clean.removed
    }

    /// Dedup, sort by (date, ts) and persist. On failure the in-memory
    /// state is kept and the error returned.
    pub fn save(&mut self) -> Result<(), SessionError> {
        if !self.loaded {
            return Err(SessionError::NotLoaded);
        }
        self.dedup();
        self.picks.sort_by_key(|p| (p.date, p.ts));
        let data = StoreData {
            picks: self.picks.clone(),
            config: self.config.clone(),
        };
        self.store.save(&data).map_err(|e| {
            warn!(store = %self.store.describe(), error = %e, "failed to save store");
            SessionError::Store(e)
        })?;
        info!(picks = self.picks.len(), "session saved");
        Ok(())
    }

    // ─── Bank configuration edits ───────────────────────────────────

    /// Set the global bank from text; invalid input keeps the old value.
    pub fn set_bank(&mut self, text: &str) -> bool {
        apply_amount("bank", text, &mut self.config.bank)
    }

    pub fn set_stake_pct(&mut self, text: &str) -> bool {
        apply_amount("stake_pct", text, &mut self.config.stake_pct)
    }

    pub fn set_plan_bank(&mut self, plan: Plan, text: &str) -> bool {
        let Some(value) = parse_amount("plan_bank", text) else {
            return false;
        };
        self.config.plan_banks.insert(plan, value);
        true
    }

    pub fn set_plan_stake(&mut self, plan: Plan, text: &str) -> bool {
        let Some(value) = parse_amount("plan_stake", text) else {
            return false;
        };
        self.config.plan_stake_pcts.insert(plan, value);
        true
    }

    /// Flip between the shared global bank and per-plan banks.
    pub fn toggle_global(&mut self) -> bool {
        self.config.use_global_bank = !self.config.use_global_bank;
        self.config.use_global_bank
    }

    // ─── Analysis ───────────────────────────────────────────────────

    pub fn snapshot(&self, today: NaiveDate) -> Snapshot {
        Snapshot {
            picks: self.picks.clone(),
            config: self.config.clone(),
            filters: self.filters.clone(),
            today,
        }
    }

    pub fn analyze(&self, today: NaiveDate) -> Report {
        analyze(&self.snapshot(today))
    }
}

fn parse_amount(field: &str, text: &str) -> Option<f64> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            debug!(field, input = text, "ignoring non-numeric config value");
            None
        }
    }
}

fn apply_amount(field: &str, text: &str, slot: &mut f64) -> bool {
    match parse_amount(field, text) {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}
