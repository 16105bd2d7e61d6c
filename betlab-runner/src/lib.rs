//! BetLab Runner: everything at the boundary of the analytics core.
//!
//! This crate builds on `betlab-core` to provide:
//! - Application configuration (`betlab.toml`)
//! - Pick import from JSON, audit/legacy CSV and pasted text blocks
//! - File and HTTP persistence behind the [`PickStore`] trait
//! - The mutable [`Session`] that owns picks, bank config and filters
//! - Export: JSON, audit CSV, equity/pick CSV, Markdown, artifact bundles
//! - Seeded synthetic pick logs

pub mod config;
pub mod export;
pub mod import;
pub mod session;
pub mod store;
pub mod synthetic;

pub use config::{AppConfig, AuditSettings, ConfigError, StoreKind, StoreSettings};
pub use export::{
    export_audit_csv, export_equity_csv, export_json, export_picks_csv, generate_report,
    save_artifacts,
};
pub use import::{import_csv, import_json, import_path, import_text, ImportError, ImportReport};
pub use session::{ImportSummary, Session, SessionError};
pub use store::{open_store, FileStore, HttpStore, PickStore, StoreData, StoreError};
