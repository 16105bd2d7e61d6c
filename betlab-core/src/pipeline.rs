//! Pipeline entry point: frozen snapshot in, report out.
//!
//! `analyze` is pure and infallible. Re-running it on an equal snapshot
//! yields an equal report (and the same fingerprint).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::domain::{BankConfig, Pick, Plan};
use crate::engine::{self, Aggregates, DrawdownReport, EquityPoint, ProcessedPick};
use crate::filter::{DateWindow, Filters};
use crate::market::{market_label, OTHER_MARKET};
use crate::metrics::PortfolioMetrics;

/// Immutable input of one computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub picks: Vec<Pick>,
    pub config: BankConfig,
    pub filters: Filters,
    /// Evaluation date for presets and month-to-date figures.
    pub today: NaiveDate,
}

impl Snapshot {
    /// BLAKE3 over the canonical JSON of the snapshot.
    pub fn fingerprint(&self) -> String {
        // Plain structs and unit-variant map keys: serialization cannot fail.
        let bytes = serde_json::to_vec(self).expect("snapshot serializes to JSON");
        blake3::hash(&bytes).to_hex().to_string()
    }
}

/// Per-plan summary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStats {
    pub plan: Plan,
    pub bank: f64,
    pub stake_pct: f64,
    /// Nominal stake from the plan's own bank.
    pub stake: f64,
    pub profit: f64,
    pub count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Everything the presentation layer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub fingerprint: String,
    pub today: NaiveDate,
    /// Resolved date window of the active preset.
    pub window: DateWindow,
    /// Days spanned by the window (or by the filtered picks), at least 1.
    pub total_days: i64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub processed: Vec<ProcessedPick>,
    pub equity: Vec<EquityPoint>,
    pub drawdown: DrawdownReport,
    pub aggregates: Aggregates,
    pub metrics: PortfolioMetrics,
    pub plan_stats: Vec<PlanStats>,
    /// Sum of every plan's nominal stake.
    pub stake_sum: f64,
    /// Distinct market labels of the whole (unfiltered) log.
    pub markets: Vec<String>,
}

/// Run the full pipeline: filter, walk, aggregate, derive metrics.
pub fn analyze(snapshot: &Snapshot) -> Report {
    let Snapshot {
        picks,
        config,
        filters,
        today,
    } = snapshot;

    let window = filters.date_range.resolve(*today);
    let filtered = filters.apply(picks, *today);
    let initial_bank = config.initial_bank(&filters.plans);
    let walk = engine::run(&filtered, config, initial_bank);

    let first_date = filtered.first().map(|p| p.date);
    let last_date = filtered.last().map(|p| p.date);
    let total_days = total_days(&window, first_date, last_date, *today);
    let metrics = PortfolioMetrics::compute(&walk, total_days, *today);
    let plan_stats = plan_stats(config, &walk.processed);
    let stake_sum: f64 = plan_stats.iter().map(|s| s.stake).sum();

    debug!(
        total = picks.len(),
        filtered = walk.processed.len(),
        profit = metrics.profit,
        max_drawdown = metrics.max_drawdown,
        "analysis complete"
    );

    Report {
        fingerprint: snapshot.fingerprint(),
        today: *today,
        window,
        total_days,
        first_date,
        last_date,
        processed: walk.processed,
        equity: walk.equity,
        drawdown: walk.drawdown,
        aggregates: walk.aggregates,
        metrics,
        plan_stats,
        stake_sum,
        markets: market_universe(picks),
    }
}

/// Inclusive day count between the window bounds, falling back to the
/// filtered picks' first/last dates, then to `today`. Never below 1.
pub fn total_days(
    window: &DateWindow,
    first: Option<NaiveDate>,
    last: Option<NaiveDate>,
    today: NaiveDate,
) -> i64 {
    let start = window.start.or(first).unwrap_or(today);
    let end = window.end.or(last).unwrap_or(today);
    ((end - start).num_days() + 1).max(1)
}

/// Sorted distinct market labels, excluding the fallback label.
pub fn market_universe(picks: &[Pick]) -> Vec<String> {
    picks
        .iter()
        .map(|p| market_label(p.first_bet()))
        .filter(|m| *m != OTHER_MARKET)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn plan_stats(config: &BankConfig, processed: &[ProcessedPick]) -> Vec<PlanStats> {
    Plan::ALL
        .iter()
        .map(|&plan| {
            let bank = config.plan_bank(plan);
            let stake_pct = config.stake_pct_for(plan);
            let rows: Vec<&ProcessedPick> = processed.iter().filter(|p| p.pick.plan == plan).collect();
            PlanStats {
                plan,
                bank,
                stake_pct,
                stake: bank * stake_pct / 100.0,
                profit: rows.iter().map(|r| r.profit).sum(),
                count: rows.len(),
                first_date: rows.first().map(|p| p.pick.date),
                last_date: rows.last().map(|p| p.pick.date),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Leg;
    use crate::filter::DateRange;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn pick(id: &str, date: NaiveDate, bet: &str, result: &str, plan: Plan) -> Pick {
        Pick::new(id, date, vec![Leg::new("A v B", bet)], 2.0, result, plan, 0).unwrap()
    }

    fn snapshot(picks: Vec<Pick>) -> Snapshot {
        Snapshot {
            picks,
            config: BankConfig::default(),
            filters: Filters::default(),
            today: d(2024, 5, 20),
        }
    }

    #[test]
    fn total_days_prefers_window_then_picks_then_today() {
        let today = d(2024, 5, 20);
        let window = DateRange::Month.resolve(today);
        assert_eq!(total_days(&window, None, None, today), 20);
        let open = DateWindow::default();
        assert_eq!(total_days(&open, Some(d(2024, 5, 1)), Some(d(2024, 5, 10)), today), 10);
        assert_eq!(total_days(&open, None, None, today), 1);
    }

    #[test]
    fn market_universe_is_sorted_and_skips_fallback() {
        let picks = vec![
            pick("a", d(2024, 5, 1), "Over 2.5", "WIN", Plan::Elite),
            pick("b", d(2024, 5, 2), "Scorer", "WIN", Plan::Elite),
            pick("c", d(2024, 5, 3), "BTTS", "WIN", Plan::Elite),
            pick("e", d(2024, 5, 4), "Over 1.5", "WIN", Plan::Elite),
        ];
        assert_eq!(market_universe(&picks), vec!["BTTS", "OVERS"]);
    }

    #[test]
    fn analyze_reports_profit_and_plan_stats() {
        let report = analyze(&snapshot(vec![
            pick("a", d(2024, 5, 1), "1", "WIN", Plan::Elite),
            pick("b", d(2024, 5, 3), "1", "LOSS", Plan::Premium),
            pick("c", d(2024, 5, 5), "1", "WIN", Plan::Elite),
        ]));
        assert!((report.metrics.profit - 100.0).abs() < 1e-10);
        assert_eq!(report.total_days, 5);
        assert!((report.metrics.profit_current_month - 100.0).abs() < 1e-10);
        let elite = &report.plan_stats[0];
        assert_eq!(elite.plan, Plan::Elite);
        assert_eq!(elite.count, 2);
        assert_eq!(elite.first_date, Some(d(2024, 5, 1)));
        assert_eq!(elite.last_date, Some(d(2024, 5, 5)));
        assert!((report.stake_sum - 100.0).abs() < 1e-10);
        assert_eq!(report.plan_stats[3].count, 0);
    }

    #[test]
    fn fingerprint_tracks_snapshot_content() {
        let a = snapshot(vec![pick("a", d(2024, 5, 1), "1", "WIN", Plan::Elite)]);
        let mut b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.today = d(2024, 5, 21);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(analyze(&a), analyze(&a));
    }

    #[test]
    fn independent_banks_sum_filtered_plans() {
        let mut snap = snapshot(vec![pick("a", d(2024, 5, 1), "1", "LOSS", Plan::Elite)]);
        snap.config.use_global_bank = false;
        snap.filters.plans = vec![Plan::Elite, Plan::Premium];
        let report = analyze(&snap);
        assert!((report.metrics.initial_bank - 5_000.0).abs() < 1e-10);
        // Stake is 1% of the Elite bank.
        assert!((report.metrics.profit + 25.0).abs() < 1e-10);
    }
}
