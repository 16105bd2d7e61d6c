//! Portfolio metrics: pure functions over the walk's totals.
//!
//! Every ratio degrades to 0 on an empty or degenerate denominator; nothing
//! here returns NaN or infinity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::{month_key, StatusCounts, Walk};

/// Profit factor reported when there are wins but no losses.
pub const PROFIT_FACTOR_CAP: f64 = 99.9;

/// Average days per month used for monthly averages.
pub const DAYS_PER_MONTH: f64 = 30.4375;

/// Summary statistics of one filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub count: usize,
    pub status: StatusCounts,
    pub total_staked: f64,
    pub avg_stake: f64,
    pub profit: f64,
    pub gross_wins: f64,
    pub gross_losses: f64,
    pub roi_stake: f64,
    pub roi_bank: f64,
    pub yield_pct: f64,
    pub cagr: f64,
    /// Percent of decided picks won.
    pub winrate: f64,
    pub profit_factor: f64,
    pub avg_odds: f64,
    pub avg_weighted_odds: f64,
    pub profit_per_pick: f64,
    pub breakeven: f64,
    /// Winrate minus breakeven, in percentage points.
    pub edge: f64,
    pub max_win_streak: usize,
    pub max_loss_streak: usize,
    pub volatility: f64,
    /// Mean per-pick profit over its standard deviation; no risk-free rate,
    /// no annualization.
    pub sharpe: f64,
    /// Kelly fraction in percent.
    pub kelly: f64,
    pub initial_bank: f64,
    pub final_bank: f64,
    pub profit_per_day: f64,
    pub profit_month_avg: f64,
    /// Profit booked in the evaluation date's month.
    pub profit_current_month: f64,
    pub avg_staked_daily: f64,
    pub avg_staked_weekly: f64,
    pub avg_staked_monthly: f64,
    /// One unit per pick.
    pub units_staked: f64,
    pub units_profit: f64,
    pub max_drawdown: f64,
    pub max_drawdown_days: i64,
    /// Max drawdown over the initial bank, in percent.
    pub drawdown_relative: f64,
    pub current_drawdown: f64,
    pub is_recovering: bool,
}

impl PortfolioMetrics {
    /// Derive every metric from a finished walk.
    ///
    /// `total_days` is the span of the active window (≥ 1); `today` picks the
    /// month for `profit_current_month`.
    pub fn compute(walk: &Walk, total_days: i64, today: NaiveDate) -> Self {
        let t = &walk.totals;
        let status = walk.aggregates.status;
        let days = total_days.max(1) as f64;
        let profits: Vec<f64> = walk.processed.iter().map(|p| p.profit).collect();

        let avg_weighted_odds = weighted_odds(t.weighted_odds, t.staked);
        let wr = winrate(status.wins(), status.losses());
        let be = breakeven(avg_weighted_odds);
        let vol = volatility(&profits);

        Self {
            count: t.count,
            status,
            total_staked: t.staked,
            avg_stake: per(t.staked, t.count as f64),
            profit: t.profit,
            gross_wins: t.gross_wins,
            gross_losses: t.gross_losses,
            roi_stake: roi(t.profit, t.staked),
            roi_bank: roi(t.profit, walk.initial_bank),
            yield_pct: roi(t.profit, t.staked),
            cagr: cagr(walk.initial_bank, walk.final_bank, total_days),
            winrate: wr * 100.0,
            profit_factor: profit_factor(t.gross_wins, t.gross_losses),
            avg_odds: per(t.odds, t.count as f64),
            avg_weighted_odds,
            profit_per_pick: per(t.profit, t.count as f64),
            breakeven: be,
            edge: wr * 100.0 - be,
            max_win_streak: walk.streaks.max_win,
            max_loss_streak: walk.streaks.max_loss,
            volatility: vol,
            sharpe: sharpe_proxy(&profits),
            kelly: kelly_fraction(wr, avg_weighted_odds) * 100.0,
            initial_bank: walk.initial_bank,
            final_bank: walk.final_bank,
            profit_per_day: t.profit / days,
            profit_month_avg: t.profit / (days / DAYS_PER_MONTH),
            profit_current_month: walk
                .aggregates
                .months
                .get(&month_key(today))
                .copied()
                .unwrap_or(0.0),
            avg_staked_daily: t.staked / days,
            avg_staked_weekly: t.staked / (days / 7.0),
            avg_staked_monthly: t.staked / (days / DAYS_PER_MONTH),
            units_staked: t.count as f64,
            units_profit: t.units,
            max_drawdown: walk.drawdown.max_value,
            max_drawdown_days: walk.drawdown.max_duration_days,
            drawdown_relative: roi(walk.drawdown.max_value, walk.initial_bank),
            current_drawdown: walk.drawdown.current.value,
            is_recovering: walk.drawdown.is_recovering,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

fn per(total: f64, n: f64) -> f64 {
    if n > 0.0 {
        total / n
    } else {
        0.0
    }
}

/// Return on a base, in percent: profit / base × 100. 0 if base ≤ 0.
pub fn roi(profit: f64, base: f64) -> f64 {
    if base > 0.0 {
        profit / base * 100.0
    } else {
        0.0
    }
}

/// Stake-weighted mean odds: Σ(odds × stake) / Σ stake.
pub fn weighted_odds(weighted_sum: f64, staked: f64) -> f64 {
    per(weighted_sum, staked)
}

/// Fraction of decided picks won (0..1). Void and pending picks are not
/// decided.
pub fn winrate(wins: usize, losses: usize) -> f64 {
    per(wins as f64, (wins + losses) as f64)
}

/// Win rate needed to break even at these odds, in percent.
pub fn breakeven(avg_odds: f64) -> f64 {
    if avg_odds > 0.0 {
        100.0 / avg_odds
    } else {
        0.0
    }
}

/// Kelly fraction (0..1 scale, may be negative): (p·b − q) / b with b = odds − 1.
pub fn kelly_fraction(winrate: f64, avg_odds: f64) -> f64 {
    let b = avg_odds - 1.0;
    if b <= 0.0 {
        return 0.0;
    }
    (winrate * b - (1.0 - winrate)) / b
}

/// Compound annual growth in percent over `days` (minimum 1).
pub fn cagr(initial: f64, final_bank: f64, days: i64) -> f64 {
    if initial <= 0.0 || final_bank <= 0.0 {
        return 0.0;
    }
    let days = days.max(1) as f64;
    let growth = ((final_bank / initial).powf(365.0 / days) - 1.0) * 100.0;
    if growth.is_finite() {
        growth
    } else {
        0.0
    }
}

/// Population standard deviation of per-pick profit.
pub fn volatility(profits: &[f64]) -> f64 {
    if profits.is_empty() {
        return 0.0;
    }
    let n = profits.len() as f64;
    let mean = profits.iter().sum::<f64>() / n;
    let var = profits.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

/// Mean profit over volatility.
pub fn sharpe_proxy(profits: &[f64]) -> f64 {
    let vol = volatility(profits);
    if vol <= 0.0 {
        return 0.0;
    }
    profits.iter().sum::<f64>() / profits.len() as f64 / vol
}

/// Gross wins over gross losses, capped when nothing was lost.
pub fn profit_factor(gross_wins: f64, gross_losses: f64) -> f64 {
    if gross_losses > 0.0 {
        gross_wins / gross_losses
    } else if gross_wins > 0.0 {
        PROFIT_FACTOR_CAP
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── roi ──

    #[test]
    fn roi_stake_example() {
        assert!((roi(150.0, 1000.0) - 15.0).abs() < 1e-10);
        assert_eq!(roi(150.0, 0.0), 0.0);
    }

    // ── kelly ──

    #[test]
    fn kelly_example() {
        assert!((kelly_fraction(0.55, 2.0) * 100.0 - 10.0).abs() < 1e-10);
    }

    #[test]
    fn kelly_degenerate_odds() {
        assert_eq!(kelly_fraction(0.9, 1.0), 0.0);
        assert_eq!(kelly_fraction(0.9, 0.0), 0.0);
    }

    #[test]
    fn kelly_negative_edge() {
        assert!(kelly_fraction(0.4, 2.0) < 0.0);
    }

    // ── winrate / breakeven ──

    #[test]
    fn winrate_excludes_undecided() {
        assert!((winrate(3, 1) - 0.75).abs() < 1e-10);
        assert_eq!(winrate(0, 0), 0.0);
    }

    #[test]
    fn breakeven_at_even_money() {
        assert!((breakeven(2.0) - 50.0).abs() < 1e-10);
        assert_eq!(breakeven(0.0), 0.0);
    }

    // ── cagr ──

    #[test]
    fn cagr_one_year_is_total_return() {
        assert!((cagr(1000.0, 1100.0, 365) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn cagr_zero_days_treated_as_one() {
        assert_eq!(cagr(1000.0, 1000.0, 0), 0.0);
        assert_eq!(cagr(0.0, 1000.0, 10), 0.0);
    }

    #[test]
    fn cagr_overflow_reports_zero() {
        // 10x in one day annualizes past f64::MAX.
        assert_eq!(cagr(1000.0, 10_000.0, 1), 0.0);
        assert!(cagr(1000.0, 1010.0, 1).is_finite());
    }

    // ── volatility / sharpe ──

    #[test]
    fn volatility_is_population_std() {
        let v = volatility(&[100.0, -100.0]);
        assert!((v - 100.0).abs() < 1e-10);
        assert_eq!(volatility(&[]), 0.0);
    }

    #[test]
    fn sharpe_proxy_mean_over_std() {
        let s = sharpe_proxy(&[100.0, -50.0, 100.0, -50.0]);
        assert!((s - 25.0 / 75.0).abs() < 1e-10);
        assert_eq!(sharpe_proxy(&[10.0, 10.0]), 0.0);
    }

    // ── profit factor ──

    #[test]
    fn profit_factor_cases() {
        assert!((profit_factor(300.0, 150.0) - 2.0).abs() < 1e-10);
        assert_eq!(profit_factor(300.0, 0.0), PROFIT_FACTOR_CAP);
        assert_eq!(profit_factor(0.0, 0.0), 0.0);
    }
}
