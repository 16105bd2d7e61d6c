//! Bankroll configuration: global bank, stake percentages, per-plan pools.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use super::plan::Plan;

pub const DEFAULT_BANK: f64 = 10_000.0;
pub const DEFAULT_STAKE_PCT: f64 = 1.0;
pub const DEFAULT_PLAN_BANK: f64 = 2_500.0;
/// Share of the global bank used for a plan with no configured bankroll.
pub const DEFAULT_PLAN_BANK_FALLBACK_SHARE: f64 = 0.25;

/// Stake-sizing configuration, persisted next to the picks.
///
/// Field names are camelCase on the wire. Every field defaults, so an empty
/// `{}` from a fresh store deserializes to the stock configuration.
///
/// Amounts are read leniently: a non-numeric or non-finite bank or stake
/// falls back to its default, and plan map entries with an unknown plan or
/// a non-finite value are dropped (the plan then uses its fallback).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankConfig {
    /// Global bankroll.
    #[serde(deserialize_with = "bank_or_default")]
    pub bank: f64,
    /// Global stake, in percent of the applicable bankroll.
    #[serde(deserialize_with = "stake_pct_or_default")]
    pub stake_pct: f64,
    /// Per-plan stake percentages (override `stake_pct`).
    #[serde(rename = "planConfigs", deserialize_with = "lenient_plan_map")]
    pub plan_stake_pcts: BTreeMap<Plan, f64>,
    /// Per-plan bankrolls, used when `use_global_bank` is off.
    #[serde(deserialize_with = "lenient_plan_map")]
    pub plan_banks: BTreeMap<Plan, f64>,
    /// Size every stake from the shared global bank instead of per-plan banks.
    pub use_global_bank: bool,
    pub plan_bank_fallback_share: f64,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            bank: DEFAULT_BANK,
            stake_pct: DEFAULT_STAKE_PCT,
            plan_stake_pcts: Plan::ALL.iter().map(|p| (*p, DEFAULT_STAKE_PCT)).collect(),
            plan_banks: Plan::ALL.iter().map(|p| (*p, DEFAULT_PLAN_BANK)).collect(),
            use_global_bank: true,
            plan_bank_fallback_share: DEFAULT_PLAN_BANK_FALLBACK_SHARE,
        }
    }
}

impl BankConfig {
    /// Configured bankroll of a plan, or the fallback share of the global bank.
    pub fn plan_bank(&self, plan: Plan) -> f64 {
        self.plan_banks
            .get(&plan)
            .copied()
            .unwrap_or(self.bank * self.plan_bank_fallback_share)
    }

    /// Stake percentage for a plan: its own value, else the global one.
    pub fn stake_pct_for(&self, plan: Plan) -> f64 {
        self.plan_stake_pcts.get(&plan).copied().unwrap_or(self.stake_pct)
    }

    /// Flat stake for a pick of this plan.
    ///
    /// Sized from the starting bankroll (global or per-plan), never from the
    /// running balance: stakes do not compound.
    pub fn stake_for(&self, plan: Plan) -> f64 {
        let base = if self.use_global_bank {
            self.bank
        } else {
            self.plan_bank(plan)
        };
        base * self.stake_pct_for(plan) / 100.0
    }

    /// Starting bankroll of a simulation restricted to `plans` (empty = all).
    pub fn initial_bank(&self, plans: &[Plan]) -> f64 {
        if self.use_global_bank {
            return self.bank;
        }
        let relevant: &[Plan] = if plans.is_empty() { &Plan::ALL } else { plans };
        relevant.iter().map(|p| self.plan_bank(*p)).sum()
    }
}

// ─── Lenient wire parsing ───────────────────────────────────────────

fn finite(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

fn amount_or<'de, D>(deserializer: D, key: &str, default: f64) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(finite(&value).unwrap_or_else(|| {
        warn!(field = key, %value, "invalid amount in bank config, using default");
        default
    }))
}

fn bank_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    amount_or(deserializer, "bank", DEFAULT_BANK)
}

fn stake_pct_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    amount_or(deserializer, "stakePct", DEFAULT_STAKE_PCT)
}

fn lenient_plan_map<'de, D>(deserializer: D) -> Result<BTreeMap<Plan, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        warn!("plan map in bank config is not an object, ignoring");
        return Ok(BTreeMap::new());
    };
    let mut map = BTreeMap::new();
    for (key, value) in entries {
        match (key.parse::<Plan>(), finite(&value)) {
            (Ok(plan), Some(amount)) => {
                map.insert(plan, amount);
            }
            _ => warn!(plan = %key, %value, "dropped invalid plan entry in bank config"),
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg: BankConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, BankConfig::default());
    }

    #[test]
    fn invalid_plan_entries_are_dropped() {
        let json = r#"{"bank": 8000, "planBanks": {"ELITE": null, "PREMIUM": 3000},
                       "planConfigs": {"VIP": 1, "STANDARD": 2.5}}"#;
        let cfg: BankConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.bank, 8_000.0);
        assert_eq!(cfg.plan_banks.len(), 1);
        assert_eq!(cfg.plan_banks[&Plan::Premium], 3_000.0);
        assert!((cfg.plan_bank(Plan::Elite) - 2_000.0).abs() < 1e-9);
        assert_eq!(cfg.plan_stake_pcts.len(), 1);
        assert_eq!(cfg.stake_pct_for(Plan::Standard), 2.5);
        assert_eq!(cfg.stake_pct_for(Plan::Elite), DEFAULT_STAKE_PCT);
    }

    #[test]
    fn non_numeric_amounts_fall_back_to_defaults() {
        let json = r#"{"bank": null, "stakePct": "abc", "planBanks": [1, 2]}"#;
        let cfg: BankConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.bank, DEFAULT_BANK);
        assert_eq!(cfg.stake_pct, DEFAULT_STAKE_PCT);
        assert!(cfg.plan_banks.is_empty());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = serde_json::to_string(&BankConfig::default()).unwrap();
        assert!(json.contains("\"stakePct\""));
        assert!(json.contains("\"planConfigs\""));
        assert!(json.contains("\"planBanks\""));
        assert!(json.contains("\"useGlobalBank\""));
    }

    #[test]
    fn stake_uses_global_bank_and_plan_pct() {
        let mut cfg = BankConfig::default();
        cfg.plan_stake_pcts.insert(Plan::Elite, 2.0);
        assert!((cfg.stake_for(Plan::Elite) - 200.0).abs() < 1e-9);
        assert!((cfg.stake_for(Plan::Premium) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn stake_uses_plan_bank_when_independent() {
        let mut cfg = BankConfig {
            use_global_bank: false,
            ..BankConfig::default()
        };
        cfg.plan_banks.insert(Plan::Standard, 4_000.0);
        assert!((cfg.stake_for(Plan::Standard) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn missing_plan_bank_falls_back_to_quarter_of_global() {
        let mut cfg = BankConfig {
            use_global_bank: false,
            ..BankConfig::default()
        };
        cfg.plan_banks.remove(&Plan::Personal);
        assert!((cfg.plan_bank(Plan::Personal) - 2_500.0).abs() < 1e-9);
        cfg.bank = 20_000.0;
        assert!((cfg.plan_bank(Plan::Personal) - 5_000.0).abs() < 1e-9);
    }

    #[test]
    fn missing_plan_pct_falls_back_to_global_pct() {
        let mut cfg = BankConfig::default();
        cfg.plan_stake_pcts.clear();
        cfg.stake_pct = 3.0;
        assert!((cfg.stake_for(Plan::Elite) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn initial_bank_sums_selected_plans() {
        let mut cfg = BankConfig {
            use_global_bank: false,
            ..BankConfig::default()
        };
        cfg.plan_banks.insert(Plan::Elite, 1_000.0);
        assert!((cfg.initial_bank(&[]) - 8_500.0).abs() < 1e-9);
        assert!((cfg.initial_bank(&[Plan::Elite, Plan::Premium]) - 3_500.0).abs() < 1e-9);
        cfg.use_global_bank = true;
        assert!((cfg.initial_bank(&[Plan::Elite]) - 10_000.0).abs() < 1e-9);
    }
}
