//! Domain types for BetLab

pub mod config;
pub mod pick;
pub mod plan;

pub use config::BankConfig;
pub use pick::{Leg, Pick, PickError, RawLeg, RawPick};
pub use plan::Plan;
