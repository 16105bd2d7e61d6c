//! Equity engine: the single chronological pass over filtered picks.
//!
//! For each pick, in (date, ts) order:
//!
//! 1. Size the flat stake from the configured bankroll (never compounded)
//! 2. Settle it
//! 3. Advance bankroll, units, the drawdown machine and the plan ledger
//! 4. Fold it into the bucketed aggregates and streaks
//! 5. Emit an equity point
//!
//! A synthetic leading point carries the starting bankroll.

pub mod aggregation;
pub mod simulator;

pub use aggregation::{month_key, week_key, Aggregates, OddsBinTotals, StatusCounts, Totals};
pub use simulator::{DrawdownEpisode, DrawdownState, EquityPoint, PlanLedger, StreakTracker};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{BankConfig, Pick};
use crate::market::market_label;
use crate::settlement::{self, Outcome};

/// A filtered pick with its simulated settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedPick {
    pub pick: Pick,
    pub market: String,
    pub stake: f64,
    pub profit: f64,
    pub units: f64,
    pub outcome: Outcome,
    pub asian: bool,
    /// Global bankroll after this pick.
    pub bankroll: f64,
    /// Cumulative unit profit after this pick.
    pub cumulative_units: f64,
}

/// Running sums needed by the metrics stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningTotals {
    pub count: usize,
    pub staked: f64,
    pub profit: f64,
    pub gross_wins: f64,
    pub gross_losses: f64,
    /// Σ odds × stake.
    pub weighted_odds: f64,
    /// Σ odds.
    pub odds: f64,
    pub units: f64,
}

/// Drawdown summary after the walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownReport {
    pub max_value: f64,
    pub max_duration_days: i64,
    pub max_episode: DrawdownEpisode,
    pub current: DrawdownEpisode,
    pub monthly: BTreeMap<String, f64>,
    pub is_recovering: bool,
}

/// Everything produced by one walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walk {
    pub initial_bank: f64,
    pub final_bank: f64,
    pub processed: Vec<ProcessedPick>,
    pub equity: Vec<EquityPoint>,
    pub drawdown: DrawdownReport,
    pub streaks: StreakTracker,
    pub totals: RunningTotals,
    pub aggregates: Aggregates,
}

/// Run the equity walk. `picks` must already be in (date, ts) order.
pub fn run(picks: &[&Pick], config: &BankConfig, initial_bank: f64) -> Walk {
    let first_date = picks.first().map(|p| p.date);
    let mut bankroll = initial_bank;
    let mut units = 0.0;
    let mut drawdown = DrawdownState::new(initial_bank, first_date);
    let mut ledger = PlanLedger::new(config);
    let mut streaks = StreakTracker::default();
    let mut totals = RunningTotals::default();
    let mut aggregates = Aggregates::default();

    let mut equity = Vec::with_capacity(picks.len() + 1);
    equity.push(EquityPoint {
        label: start_label(first_date),
        date: None,
        bankroll: initial_bank,
        drawdown: 0.0,
        units: 0.0,
        plan_banks: ledger.banks().clone(),
        plan_drawdowns: ledger.drawdowns(),
    });

    let mut processed = Vec::with_capacity(picks.len());
    let mut trail: Vec<(NaiveDate, f64)> = Vec::with_capacity(picks.len());

    for pick in picks {
        let stake = config.stake_for(pick.plan);
        let settled = settlement::resolve(&pick.result, pick.odds, stake, pick.first_bet());
        let market = market_label(pick.first_bet());

        bankroll += settled.profit;
        units += settled.units;
        ledger.apply(pick.plan, settled.profit);
        let dd = drawdown.observe(pick.date, bankroll, units);
        trail.push((pick.date, bankroll));

        totals.count += 1;
        totals.staked += stake;
        totals.profit += settled.profit;
        totals.weighted_odds += pick.odds * stake;
        totals.odds += pick.odds;
        totals.units += settled.units;
        if settled.outcome.is_win() {
            totals.gross_wins += settled.profit;
        } else if settled.outcome.is_loss() {
            totals.gross_losses += settled.profit.abs();
        }
        streaks.record(settled.outcome);
        aggregates.record(pick.date, pick.plan, market, pick.odds, stake, &settled);

        equity.push(EquityPoint {
            label: pick.date.to_string(),
            date: Some(pick.date),
            bankroll,
            drawdown: dd,
            units,
            plan_banks: ledger.banks().clone(),
            plan_drawdowns: ledger.drawdowns(),
        });
        processed.push(ProcessedPick {
            pick: (*pick).clone(),
            market: market.to_string(),
            stake,
            profit: settled.profit,
            units: settled.units,
            outcome: settled.outcome,
            asian: settled.asian,
            bankroll,
            cumulative_units: units,
        });
    }

    drawdown.close_max_episode(&trail);
    let current = drawdown.current_episode(&trail, bankroll, units);

    Walk {
        initial_bank,
        final_bank: bankroll,
        processed,
        equity,
        drawdown: DrawdownReport {
            max_value: drawdown.max_value,
            max_duration_days: drawdown.max_duration_days,
            max_episode: drawdown.max_episode.clone(),
            current,
            is_recovering: drawdown.is_recovering(bankroll),
            monthly: drawdown.monthly,
        },
        streaks,
        totals,
        aggregates,
    }
}

fn start_label(first_date: Option<NaiveDate>) -> String {
    match first_date {
        Some(d) => format!("{d} (start)"),
        None => "start".to_string(),
    }
}
