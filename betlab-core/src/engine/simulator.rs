//! Equity simulator state: running bankroll, drawdown state machine,
//! per-plan ledgers and streaks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{BankConfig, Plan};
use crate::settlement::Outcome;

/// One point of the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Display label: the pick date, or the synthetic start marker.
    pub label: String,
    /// `None` for the leading start point.
    pub date: Option<NaiveDate>,
    pub bankroll: f64,
    /// Peak-to-current shortfall at this point (≥ 0).
    pub drawdown: f64,
    pub units: f64,
    pub plan_banks: BTreeMap<Plan, f64>,
    pub plan_drawdowns: BTreeMap<Plan, f64>,
}

/// A peak-to-trough drawdown episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownEpisode {
    pub peak_date: Option<NaiveDate>,
    pub trough_date: Option<NaiveDate>,
    /// First later date at which the bankroll regained `peak_value`.
    pub recovery_date: Option<NaiveDate>,
    pub peak_value: f64,
    pub peak_units: f64,
    /// Drawdown magnitude in currency.
    pub value: f64,
    /// Drawdown magnitude in units.
    pub units: f64,
}

// ─── Drawdown state machine ─────────────────────────────────────────

/// Peak/drawdown tracking across the walk.
///
/// Magnitude and duration maxima are tracked independently: the longest
/// episode need not be the deepest one.
#[derive(Debug, Clone)]
pub struct DrawdownState {
    pub peak: f64,
    pub peak_units: f64,
    pub peak_date: Option<NaiveDate>,
    pub max_value: f64,
    pub max_duration_days: i64,
    pub max_episode: DrawdownEpisode,
    /// `YYYY-MM` → largest drawdown observed on a pick of that month.
    pub monthly: BTreeMap<String, f64>,
}

impl DrawdownState {
    /// `first_date` seeds the peak date so a loss on the first pick measures
    /// its duration from that day.
    pub fn new(initial_bank: f64, first_date: Option<NaiveDate>) -> Self {
        Self {
            peak: initial_bank,
            peak_units: 0.0,
            peak_date: first_date,
            max_value: 0.0,
            max_duration_days: 0,
            max_episode: DrawdownEpisode {
                peak_value: initial_bank,
                ..DrawdownEpisode::default()
            },
            monthly: BTreeMap::new(),
        }
    }

    /// Advance the machine with the bankroll after a pick; returns the
    /// drawdown at that point.
    pub fn observe(&mut self, date: NaiveDate, bankroll: f64, units: f64) -> f64 {
        if bankroll >= self.peak {
            self.peak = bankroll;
            self.peak_units = units;
            self.peak_date = Some(date);
            return 0.0;
        }

        let drawdown = self.peak - bankroll;
        if drawdown > self.max_value {
            self.max_value = drawdown;
            self.max_episode = DrawdownEpisode {
                peak_date: self.peak_date,
                trough_date: Some(date),
                recovery_date: None,
                peak_value: self.peak,
                peak_units: self.peak_units,
                value: drawdown,
                units: self.peak_units - units,
            };
        }

        let month = date.format("%Y-%m").to_string();
        let slot = self.monthly.entry(month).or_insert(0.0);
        *slot = slot.max(drawdown);

        let duration = self.peak_date.map_or(0, |p| (date - p).num_days());
        if duration > self.max_duration_days {
            self.max_duration_days = duration;
        }
        drawdown
    }

    pub fn is_recovering(&self, bankroll: f64) -> bool {
        bankroll < self.peak
    }

    /// Fill in the recovery date of the max-magnitude episode from the
    /// per-pick `(date, bankroll)` trail.
    pub fn close_max_episode(&mut self, trail: &[(NaiveDate, f64)]) {
        let Some(trough) = self.max_episode.trough_date else {
            return;
        };
        let peak = self.max_episode.peak_value;
        self.max_episode.recovery_date = trail
            .iter()
            .find(|(date, bank)| *date > trough && *bank >= peak)
            .map(|(date, _)| *date);
    }

    /// Episode open at the end of the walk (zero when fully recovered).
    ///
    /// The trough is the lowest bankroll seen at or after the peak date.
    pub fn current_episode(&self, trail: &[(NaiveDate, f64)], bankroll: f64, units: f64) -> DrawdownEpisode {
        let mut trough = (self.peak_date, self.peak);
        for (date, bank) in trail {
            let after_peak = self.peak_date.map_or(true, |p| *date >= p);
            if after_peak && *bank < trough.1 {
                trough = (Some(*date), *bank);
            }
        }
        DrawdownEpisode {
            peak_date: self.peak_date,
            trough_date: trough.0,
            recovery_date: None,
            peak_value: self.peak,
            peak_units: self.peak_units,
            value: self.peak - bankroll,
            units: self.peak_units - units,
        }
    }
}

// ─── Per-plan ledger ────────────────────────────────────────────────

/// Running bankroll and peak of every plan.
///
/// Every plan starts from its configured bankroll regardless of the stake
/// mode, so the per-plan curves stay comparable.
#[derive(Debug, Clone)]
pub struct PlanLedger {
    banks: BTreeMap<Plan, f64>,
    peaks: BTreeMap<Plan, f64>,
}

impl PlanLedger {
    pub fn new(config: &BankConfig) -> Self {
        let banks: BTreeMap<Plan, f64> = Plan::ALL.iter().map(|p| (*p, config.plan_bank(*p))).collect();
        Self {
            peaks: banks.clone(),
            banks,
        }
    }

    /// Peaks advance only on a strictly higher bankroll.
    pub fn apply(&mut self, plan: Plan, profit: f64) {
        let bank = self.banks.entry(plan).or_insert(0.0);
        *bank += profit;
        let peak = self.peaks.entry(plan).or_insert(*bank);
        if *bank > *peak {
            *peak = *bank;
        }
    }

    pub fn banks(&self) -> &BTreeMap<Plan, f64> {
        &self.banks
    }

    pub fn drawdowns(&self) -> BTreeMap<Plan, f64> {
        self.banks
            .iter()
            .map(|(plan, bank)| {
                let peak = self.peaks.get(plan).copied().unwrap_or(*bank);
                (*plan, peak - bank)
            })
            .collect()
    }
}

// ─── Streaks ────────────────────────────────────────────────────────

/// Win/loss streaks. Outcomes that are neither (void, pending, push, ...)
/// leave both counters untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakTracker {
    pub current_win: usize,
    pub current_loss: usize,
    pub max_win: usize,
    pub max_loss: usize,
}

impl StreakTracker {
    pub fn record(&mut self, outcome: Outcome) {
        if outcome.is_win() {
            self.current_win += 1;
            self.current_loss = 0;
            self.max_win = self.max_win.max(self.current_win);
        } else if outcome.is_loss() {
            self.current_loss += 1;
            self.current_win = 0;
            self.max_loss = self.max_loss.max(self.current_loss);
        }
    }
}
