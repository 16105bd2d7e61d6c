//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: the pick log as stored records, or a full [`Report`]
//! - **CSV**: the audit ledger (re-importable), the equity curve and the
//!   processed pick tape
//! - **Markdown**: a human-readable summary of one report

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use betlab_core::engine::{DrawdownEpisode, EquityPoint, ProcessedPick};
use betlab_core::{resolve, Leg, Pick, Plan, Report};

use crate::config::AuditSettings;

pub const AUDIT_TITLE: &str = "--- REPORTE DE AUDITORÍA BETLAB ---";
pub const AUDIT_HEADER: [&str; 9] = [
    "FECHA",
    "PLAN",
    "MERCADO",
    "EVENTO / PARTIDO",
    "APUESTA / DETALLE",
    "CUOTA",
    "STAKE",
    "RESULTADO",
    "PROFIT ($ SIM)",
];
const LEG_SEPARATOR: &str = " | ";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize picks to pretty JSON, re-importable by `import_json`.
pub fn export_json(picks: &[Pick]) -> Result<String> {
    serde_json::to_string_pretty(picks).context("failed to serialize picks to JSON")
}

pub fn export_report_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report to JSON")
}

/// Deserialize a report previously written by [`export_report_json`].
pub fn import_report_json(json: &str) -> Result<Report> {
    serde_json::from_str(json).context("failed to deserialize report from JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the audit ledger: a manifest block, then one row per pick in
/// (date, ts) order with its profit simulated at a fixed unit stake.
///
/// The output re-imports through `import_csv` (extended layout).
pub fn export_audit_csv(
    picks: &[Pick],
    audit: &AuditSettings,
    generated_at: NaiveDateTime,
) -> Result<String> {
    let mut sorted: Vec<&Pick> = picks.iter().collect();
    sorted.sort_by_key(|p| (p.date, p.ts));

    let period = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => format!("{} a {}", first.date, last.date),
        _ => "N/A".to_string(),
    };

    // Manifest rows are shorter than ledger rows.
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(vec![]);
    wtr.write_record([AUDIT_TITLE])?;
    wtr.write_record(["BANCA SIMULADA (BASE)", &money(audit.base_bank)])?;
    wtr.write_record(["STAKE SIMULADO (1.0u)", &money(audit.unit_stake)])?;
    wtr.write_record(["TOTAL TRANSACCIONES", &sorted.len().to_string()])?;
    wtr.write_record(["PERIODO", &period])?;
    wtr.write_record([
        "GENERADO EL",
        &generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ])?;
    wtr.write_record([""])?;
    wtr.write_record(AUDIT_HEADER)?;

    for p in sorted {
        let sim = resolve(&p.result, p.odds, audit.unit_stake, p.first_bet());
        wtr.write_record([
            p.date.to_string().as_str(),
            p.plan.as_str(),
            &audit_market(p),
            &join_legs(p, |l| &l.event),
            &join_legs(p, |l| &l.bet),
            &format!("{:.2}", p.odds),
            "1.0u",
            &p.result,
            &format!("{:.2}", sim.profit),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// `MULTI` for multi-leg picks, else the first word of the bet (`VAR` if blank).
fn audit_market(pick: &Pick) -> String {
    if pick.is_multi() {
        return "MULTI".to_string();
    }
    pick.first_bet()
        .split_whitespace()
        .next()
        .unwrap_or("VAR")
        .to_string()
}

fn join_legs(pick: &Pick, field: impl Fn(&Leg) -> &String) -> String {
    pick.legs
        .iter()
        .map(|l| field(l).as_str())
        .collect::<Vec<_>>()
        .join(LEG_SEPARATOR)
}

/// `$12,345.67`
fn money(value: f64) -> String {
    let cents = format!("{:.2}", value.abs());
    let (int, frac) = cents.split_once('.').unwrap_or((&cents, "00"));
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}

/// Export the equity curve, one row per point (the first is the start).
pub fn export_equity_csv(equity: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["index", "label", "date", "bankroll", "drawdown", "units"])?;
    for (i, pt) in equity.iter().enumerate() {
        wtr.write_record([
            &i.to_string(),
            &pt.label,
            &pt.date.map(|d| d.to_string()).unwrap_or_default(),
            &format!("{:.2}", pt.bankroll),
            &format!("{:.2}", pt.drawdown),
            &format!("{:.4}", pt.units),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the processed pick tape with simulated stake, profit and running totals.
pub fn export_picks_csv(processed: &[ProcessedPick]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "plan",
        "market",
        "events",
        "bets",
        "odds",
        "result",
        "outcome",
        "stake",
        "profit",
        "units",
        "bankroll",
        "cumulative_units",
    ])?;
    for p in processed {
        wtr.write_record([
            p.pick.date.to_string().as_str(),
            p.pick.plan.as_str(),
            &p.market,
            &join_legs(&p.pick, |l| &l.event),
            &join_legs(&p.pick, |l| &l.bet),
            &format!("{:.2}", p.pick.odds),
            &p.pick.result,
            p.outcome.label(),
            &format!("{:.2}", p.stake),
            &format!("{:.2}", p.profit),
            &format!("{:.4}", p.units),
            &format!("{:.2}", p.bankroll),
            &format!("{:.4}", p.cumulative_units),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one report.
///
/// Creates `{fingerprint prefix}_{timestamp}/` under `output_dir` containing
/// `report.json`, `equity.csv`, `picks.csv` and `report.md`. Returns the
/// directory path.
pub fn save_artifacts(report: &Report, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = report.fingerprint.chars().take(8).collect();
    let dirname = format!("{}_{}", prefix, chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("report.json"), &export_report_json(report)?)?;
    write(&run_dir.join("equity.csv"), &export_equity_csv(&report.equity)?)?;
    write(&run_dir.join("picks.csv"), &export_picks_csv(&report.processed)?)?;
    write(&run_dir.join("report.md"), &generate_report(report))?;

    Ok(run_dir)
}

/// Load the report from an artifact directory's report.json.
pub fn load_artifacts(dir: &Path) -> Result<Report> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_report_json(&json)
}

fn write(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Generate a Markdown report for one analysis.
pub fn generate_report(report: &Report) -> String {
    let m = &report.metrics;
    let mut md = String::with_capacity(4096);

    md.push_str("# BetLab Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Evaluated | {} |\n", report.today));
    md.push_str(&format!(
        "| Period | {} to {} ({} days) |\n",
        opt_date(report.first_date),
        opt_date(report.last_date),
        report.total_days
    ));
    md.push_str(&format!("| Picks | {} |\n", m.count));
    md.push_str(&format!("| Snapshot | {} |\n", report.fingerprint));
    md.push('\n');

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Initial Bank | {:.2} |\n", m.initial_bank));
    md.push_str(&format!("| Final Bank | {:.2} |\n", m.final_bank));
    md.push_str(&format!("| Profit | {:.2} |\n", m.profit));
    md.push_str(&format!("| Units | {:+.2}u |\n", m.units_profit));
    md.push_str(&format!("| Total Staked | {:.2} |\n", m.total_staked));
    md.push_str(&format!("| ROI (stake) | {:.2}% |\n", m.roi_stake));
    md.push_str(&format!("| ROI (bank) | {:.2}% |\n", m.roi_bank));
    md.push_str(&format!("| CAGR | {:.2}% |\n", m.cagr));
    md.push_str(&format!("| Win Rate | {:.2}% |\n", m.winrate));
    md.push_str(&format!("| Profit Factor | {:.2} |\n", m.profit_factor));
    md.push_str(&format!("| Avg Weighted Odds | {:.2} |\n", m.avg_weighted_odds));
    md.push_str(&format!("| Breakeven | {:.2}% |\n", m.breakeven));
    md.push_str(&format!("| Edge | {:.2}% |\n", m.edge));
    md.push_str(&format!("| Kelly | {:.2}% |\n", m.kelly));
    md.push_str(&format!("| Volatility | {:.2} |\n", m.volatility));
    md.push_str(&format!("| Sharpe (per pick) | {:.3} |\n", m.sharpe));
    md.push_str(&format!(
        "| Streaks | {}W / {}L |\n",
        m.max_win_streak, m.max_loss_streak
    ));
    md.push_str(&format!("| Profit / Day | {:.2} |\n", m.profit_per_day));
    md.push_str(&format!("| Profit / Month | {:.2} |\n", m.profit_month_avg));
    md.push_str(&format!("| This Month | {:.2} |\n", m.profit_current_month));
    md.push('\n');

    md.push_str("## Drawdown\n\n");
    md.push_str("| Episode | Value | Units | Peak | Trough | Recovered |\n");
    md.push_str("| --- | --- | --- | --- | --- | --- |\n");
    md.push_str(&episode_row("Max", &report.drawdown.max_episode));
    md.push_str(&episode_row("Current", &report.drawdown.current));
    md.push('\n');
    md.push_str(&format!(
        "Max drawdown {:.2} ({:.2}% of initial bank), longest {} days underwater.",
        m.max_drawdown, m.drawdown_relative, m.max_drawdown_days
    ));
    if m.is_recovering {
        md.push_str(" Currently recovering.");
    }
    md.push_str("\n\n");

    md.push_str("## Results\n\n");
    let s = &m.status;
    md.push_str("| WIN | LOSS | HALF WIN | HALF LOSS | PUSH | MIXED | VOID | CANCELED | PENDING |\n");
    md.push_str("| --- | --- | --- | --- | --- | --- | --- | --- | --- |\n");
    md.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n\n",
        s.win, s.loss, s.half_win, s.half_loss, s.push, s.mixed, s.void, s.canceled, s.pending
    ));

    md.push_str("## Plans\n\n");
    md.push_str("| Plan | Bank | Stake % | Stake | Picks | Profit | First | Last |\n");
    md.push_str("| --- | --- | --- | --- | --- | --- | --- | --- |\n");
    for ps in &report.plan_stats {
        md.push_str(&format!(
            "| {} | {:.2} | {:.2} | {:.2} | {} | {:.2} | {} | {} |\n",
            ps.plan,
            ps.bank,
            ps.stake_pct,
            ps.stake,
            ps.count,
            ps.profit,
            opt_date(ps.first_date),
            opt_date(ps.last_date)
        ));
    }
    md.push_str(&format!("\nNominal stake across plans: {:.2}\n\n", report.stake_sum));

    if !report.aggregates.markets.is_empty() {
        md.push_str("## Markets\n\n");
        md.push_str("| Market | Picks | Staked | Profit | ROI |\n");
        md.push_str("| --- | --- | --- | --- | --- |\n");
        for (market, t) in &report.aggregates.markets {
            md.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {:.2}% |\n",
                market,
                t.count,
                t.staked,
                t.profit,
                t.roi()
            ));
        }
        md.push('\n');
    }

    md.push_str("## Odds Bands\n\n");
    md.push_str("| Odds | Picks | Wins | Profit | ROI |\n");
    md.push_str("| --- | --- | --- | --- | --- |\n");
    for bin in report.aggregates.odds_bins.iter().filter(|b| b.totals.count > 0) {
        md.push_str(&format!(
            "| {} | {} | {} | {:.2} | {:.2}% |\n",
            bin.label,
            bin.totals.count,
            bin.totals.wins,
            bin.totals.profit,
            bin.totals.roi()
        ));
    }
    md.push('\n');

    if !report.aggregates.months.is_empty() {
        md.push_str("## Monthly\n\n");
        md.push_str("| Month | Profit | Max DD |");
        for plan in Plan::ALL {
            md.push_str(&format!(" {} |", plan));
        }
        md.push_str("\n| --- | --- | --- |");
        md.push_str(&" --- |".repeat(Plan::ALL.len()));
        md.push('\n');
        for (month, profit) in &report.aggregates.months {
            let dd = report.drawdown.monthly.get(month).copied().unwrap_or(0.0);
            md.push_str(&format!("| {} | {:.2} | {:.2} |", month, profit, dd));
            let by_plan = report.aggregates.month_plan.get(month);
            for plan in Plan::ALL {
                let v = by_plan.and_then(|m| m.get(&plan)).copied().unwrap_or(0.0);
                md.push_str(&format!(" {:.2} |", v));
            }
            md.push('\n');
        }
        md.push('\n');
    }

    md
}

fn episode_row(name: &str, ep: &DrawdownEpisode) -> String {
    format!(
        "| {} | {:.2} | {:.2} | {} | {} | {} |\n",
        name,
        ep.value,
        ep.units,
        opt_date(ep.peak_date),
        opt_date(ep.trough_date),
        opt_date(ep.recovery_date)
    )
}

fn opt_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}
