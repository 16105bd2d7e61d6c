//! End-to-end pipeline tests over hand-computed pick logs.

use betlab_core::settlement::Outcome;
use betlab_core::{
    analyze, dedup, BankConfig, DateRange, Filters, Leg, OddsRange, Pick, Plan, Snapshot,
};
use chrono::NaiveDate;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn pick(id: &str, date: NaiveDate, bet: &str, odds: f64, result: &str, plan: Plan, ts: i64) -> Pick {
    Pick::new(id, date, vec![Leg::new("Home v Away", bet)], odds, result, plan, ts).unwrap()
}

/// A small month of picks with a clear drawdown and recovery.
fn log() -> Vec<Pick> {
    vec![
        pick("1", d(2024, 4, 1), "Over 2.5", 2.0, "WIN", Plan::Elite, 1),
        pick("2", d(2024, 4, 2), "BTTS", 2.0, "LOSS", Plan::Elite, 2),
        pick("3", d(2024, 4, 3), "Over 2.25", 2.0, "1-1", Plan::Premium, 3),
        pick("4", d(2024, 4, 5), "1", 1.5, "VOID", Plan::Standard, 4),
        pick("5", d(2024, 4, 8), "X2", 3.0, "WIN", Plan::Personal, 5),
        pick("6", d(2024, 4, 9), "Corners 10+", 1.8, "PENDING", Plan::Elite, 6),
        pick("7", d(2024, 4, 10), "Under 2.5", 1.9, "LOSS", Plan::Premium, 7),
    ]
}

fn snapshot(picks: Vec<Pick>, filters: Filters) -> Snapshot {
    Snapshot {
        picks,
        config: BankConfig::default(),
        filters,
        today: d(2024, 4, 30),
    }
}

#[test]
fn full_pipeline_numbers() {
    let report = analyze(&snapshot(log(), Filters::default()));
    let m = &report.metrics;

    // +100, -100, -50, 0, +200, 0, -100
    assert_eq!(m.count, 7);
    assert!((m.profit - 50.0).abs() < 1e-9);
    assert!((m.total_staked - 700.0).abs() < 1e-9);
    assert!((m.final_bank - 10_050.0).abs() < 1e-9);
    assert!((m.roi_stake - 50.0 / 700.0 * 100.0).abs() < 1e-9);
    assert!((m.roi_bank - 0.5).abs() < 1e-9);

    // Peak 10_100 on 04-01, trough 9_950 on 04-03, regained on 04-08.
    assert!((m.max_drawdown - 150.0).abs() < 1e-9);
    let ep = &report.drawdown.max_episode;
    assert_eq!(ep.peak_date, Some(d(2024, 4, 1)));
    assert_eq!(ep.trough_date, Some(d(2024, 4, 3)));
    assert_eq!(ep.recovery_date, Some(d(2024, 4, 8)));

    // New peak 10_150 from 04-08 (held through 04-09), then -100.
    assert!((report.drawdown.current.value - 100.0).abs() < 1e-9);
    assert_eq!(report.drawdown.current.trough_date, Some(d(2024, 4, 10)));
    assert!(m.is_recovering);

    assert_eq!(m.status.win, 2);
    assert_eq!(m.status.loss, 2);
    assert_eq!(m.status.half_loss, 1);
    assert_eq!(m.status.void, 1);
    assert_eq!(m.status.pending, 1);
    assert!((m.winrate - 40.0).abs() < 1e-9);
    assert!((m.profit_factor - 300.0 / 250.0).abs() < 1e-9);

    assert_eq!(report.equity.len(), 8);
    assert_eq!(report.equity[0].label, "2024-04-01 (start)");
    assert_eq!(report.total_days, 10);
    assert!((m.profit_current_month - 50.0).abs() < 1e-9);
    assert_eq!(report.processed[2].outcome, Outcome::HalfLoss);
    assert_eq!(report.processed[5].market, "CORNERS");
}

#[test]
fn filters_narrow_the_walk() {
    let filters = Filters {
        plans: vec![Plan::Premium],
        odds_range: Some(OddsRange::Med),
        ..Filters::default()
    };
    let report = analyze(&snapshot(log(), filters));
    assert_eq!(report.metrics.count, 2);
    assert!((report.metrics.profit + 150.0).abs() < 1e-9);
    // The market universe always covers the whole log.
    assert_eq!(report.markets, vec!["1", "BTTS", "CORNERS", "OVERS", "UNDERS", "X2"]);
}

#[test]
fn date_preset_uses_evaluation_date() {
    let filters = Filters {
        date_range: DateRange::Week,
        ..Filters::default()
    };
    // 2024-04-10 is a Wednesday: the week starts Monday 04-08.
    let mut snap = snapshot(log(), filters);
    snap.today = d(2024, 4, 10);
    let report = analyze(&snap);
    assert_eq!(report.metrics.count, 3);
    assert_eq!(report.total_days, 3);
}

#[test]
fn empty_selection_is_well_defined() {
    let filters = Filters {
        search: "no such team".into(),
        ..Filters::default()
    };
    let report = analyze(&snapshot(log(), filters));
    let m = &report.metrics;
    assert_eq!(m.count, 0);
    assert_eq!(m.roi_stake, 0.0);
    assert_eq!(m.kelly, 0.0);
    assert_eq!(m.sharpe, 0.0);
    assert_eq!(report.equity.len(), 1);
    assert_eq!(report.equity[0].label, "start");
    assert_eq!(report.total_days, 1);
}

#[test]
fn snapshot_round_trips_through_json() {
    let snap = snapshot(log(), Filters::default());
    let json = serde_json::to_string(&snap).unwrap();
    let back: Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.fingerprint(), snap.fingerprint());
    assert_eq!(analyze(&back), analyze(&snap));
}

#[test]
fn dedup_then_analyze_counts_settled_copy() {
    let mut picks = log();
    let mut dup = picks[0].clone();
    dup.id = "1-dup".into();
    dup.result = "PENDING".into();
    picks.insert(0, dup);
    let clean = dedup(picks);
    assert_eq!(clean.removed, 1);
    let report = analyze(&snapshot(clean.picks, Filters::default()));
    assert!((report.metrics.profit - 50.0).abs() < 1e-9);
}
