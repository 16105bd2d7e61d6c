//! BetLab Core: pick domain types, settlement and the analytics pipeline.
//!
//! This crate is pure and synchronous:
//! - Domain types (picks, legs, plans, bank configuration), validated at
//!   deserialization
//! - Settlement of result tokens and split-line Asian totals
//! - Market labels and odds bands
//! - Deduplication with settled-over-pending merging
//! - Filter engine with date presets
//! - Single-pass equity walk with a drawdown state machine and bucketed totals
//! - Portfolio metrics
//!
//! [`analyze`] ties them together: a frozen [`Snapshot`] in, a [`Report`] out.

pub mod dedup;
pub mod domain;
pub mod engine;
pub mod filter;
pub mod market;
pub mod metrics;
pub mod pipeline;
pub mod settlement;

pub use dedup::{canonical_key, dedup, Dedup};
pub use domain::{BankConfig, Leg, Pick, PickError, Plan};
pub use filter::{DateRange, DateWindow, Filters};
pub use market::{market_label, OddsRange};
pub use metrics::PortfolioMetrics;
pub use pipeline::{analyze, PlanStats, Report, Snapshot};
pub use settlement::{resolve, Outcome, Settlement};
