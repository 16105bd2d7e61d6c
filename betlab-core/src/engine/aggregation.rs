//! Bucketed totals accumulated alongside the equity walk.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::Plan;
use crate::market::{odds_bin, ODDS_BINS};
use crate::settlement::{Outcome, Settlement};

/// Staked / profit / wins / count for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub staked: f64,
    pub profit: f64,
    pub wins: usize,
    pub count: usize,
}

impl Totals {
    fn add(&mut self, stake: f64, profit: f64, won: bool) {
        self.staked += stake;
        self.profit += profit;
        self.count += 1;
        if won {
            self.wins += 1;
        }
    }

    /// Profit over staked, in percent; 0 when nothing was staked.
    pub fn roi(&self) -> f64 {
        if self.staked > 0.0 {
            self.profit / self.staked * 100.0
        } else {
            0.0
        }
    }
}

/// Totals of one fixed odds bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsBinTotals {
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub totals: Totals,
}

/// How many picks settled into each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StatusCounts {
    pub win: usize,
    pub loss: usize,
    pub half_win: usize,
    pub half_loss: usize,
    pub push: usize,
    pub mixed: usize,
    pub void: usize,
    pub canceled: usize,
    pub pending: usize,
    pub unhandled: usize,
}

impl StatusCounts {
    pub fn record(&mut self, outcome: Outcome) {
        let slot = match outcome {
            Outcome::Win => &mut self.win,
            Outcome::Loss => &mut self.loss,
            Outcome::HalfWin => &mut self.half_win,
            Outcome::HalfLoss => &mut self.half_loss,
            Outcome::Push => &mut self.push,
            Outcome::Mixed => &mut self.mixed,
            Outcome::Void => &mut self.void,
            Outcome::Canceled => &mut self.canceled,
            Outcome::Pending => &mut self.pending,
            Outcome::Unhandled => &mut self.unhandled,
        };
        *slot += 1;
    }

    /// Full and half wins.
    pub fn wins(&self) -> usize {
        self.win + self.half_win
    }

    /// Full and half losses.
    pub fn losses(&self) -> usize {
        self.loss + self.half_loss
    }
}

/// Week-of-month key: `W{1..5} {MM}`.
pub fn week_key(date: NaiveDate) -> String {
    format!("W{} {:02}", date.day().div_ceil(7), date.month())
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Every bucketed total of one walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub weeks: BTreeMap<String, f64>,
    pub months: BTreeMap<String, f64>,
    /// Profit by weekday, index 0 = Sunday.
    pub weekdays: [f64; 7],
    pub month_plan: BTreeMap<String, BTreeMap<Plan, f64>>,
    pub plans: BTreeMap<Plan, Totals>,
    /// Keyed by the first leg's market label.
    pub markets: BTreeMap<String, Totals>,
    pub odds_bins: Vec<OddsBinTotals>,
    pub status: StatusCounts,
}

impl Default for Aggregates {
    fn default() -> Self {
        Self {
            weeks: BTreeMap::new(),
            months: BTreeMap::new(),
            weekdays: [0.0; 7],
            month_plan: BTreeMap::new(),
            plans: BTreeMap::new(),
            markets: BTreeMap::new(),
            odds_bins: ODDS_BINS
                .iter()
                .map(|b| OddsBinTotals {
                    label: b.label.to_string(),
                    min: b.min,
                    max: b.max,
                    totals: Totals::default(),
                })
                .collect(),
            status: StatusCounts::default(),
        }
    }
}

impl Aggregates {
    /// Fold one settled pick into every bucket.
    pub fn record(
        &mut self,
        date: NaiveDate,
        plan: Plan,
        market: &str,
        odds: f64,
        stake: f64,
        settlement: &Settlement,
    ) {
        let profit = settlement.profit;
        let won = settlement.outcome.is_win();
        let month = month_key(date);

        *self.weeks.entry(week_key(date)).or_insert(0.0) += profit;
        *self.months.entry(month.clone()).or_insert(0.0) += profit;
        self.weekdays[date.weekday().num_days_from_sunday() as usize] += profit;
        *self
            .month_plan
            .entry(month)
            .or_default()
            .entry(plan)
            .or_insert(0.0) += profit;

        self.plans.entry(plan).or_default().add(stake, profit, won);
        self.markets
            .entry(market.to_string())
            .or_default()
            .add(stake, profit, won);
        if let Some(idx) = odds_bin(odds) {
            self.odds_bins[idx].totals.add(stake, profit, won);
        }
        self.status.record(settlement.outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::resolve;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_keys_split_month_in_sevens() {
        assert_eq!(week_key(d(2024, 3, 1)), "W1 03");
        assert_eq!(week_key(d(2024, 3, 7)), "W1 03");
        assert_eq!(week_key(d(2024, 3, 8)), "W2 03");
        assert_eq!(week_key(d(2024, 3, 31)), "W5 03");
    }

    #[test]
    fn weekday_zero_is_sunday() {
        let mut agg = Aggregates::default();
        let s = resolve("WIN", 2.0, 100.0, "1");
        // 2024-03-10 is a Sunday.
        agg.record(d(2024, 3, 10), Plan::Elite, "1", 2.0, 100.0, &s);
        assert_eq!(agg.weekdays[0], 100.0);
    }

    #[test]
    fn buckets_accumulate_consistently() {
        let mut agg = Aggregates::default();
        let win = resolve("WIN", 1.5, 100.0, "Over 2.5");
        let loss = resolve("LOSS", 2.2, 100.0, "BTTS");
        let void = resolve("VOID", 5.0, 100.0, "BTTS");
        agg.record(d(2024, 3, 4), Plan::Elite, "OVERS", 1.5, 100.0, &win);
        agg.record(d(2024, 3, 5), Plan::Premium, "BTTS", 2.2, 100.0, &loss);
        agg.record(d(2024, 4, 1), Plan::Premium, "BTTS", 5.0, 100.0, &void);

        assert_eq!(agg.months["2024-03"], -50.0);
        assert_eq!(agg.months["2024-04"], 0.0);
        assert_eq!(agg.markets["BTTS"].count, 2);
        assert_eq!(agg.markets["OVERS"].wins, 1);
        assert_eq!(agg.plans[&Plan::Premium].staked, 200.0);
        assert_eq!(agg.month_plan["2024-03"][&Plan::Elite], 50.0);
        assert_eq!(agg.odds_bins[1].totals.count, 1);
        assert_eq!(agg.odds_bins[4].totals.profit, -100.0);
        assert_eq!(agg.odds_bins[7].totals.count, 1);
        assert_eq!(agg.status.win, 1);
        assert_eq!(agg.status.loss, 1);
        assert_eq!(agg.status.void, 1);
    }

    #[test]
    fn totals_roi() {
        let t = Totals {
            staked: 1000.0,
            profit: 150.0,
            wins: 0,
            count: 0,
        };
        assert!((t.roi() - 15.0).abs() < 1e-10);
        assert_eq!(Totals::default().roi(), 0.0);
    }
}
