//! BetLab CLI: report, import/export, dedup and bank configuration commands.
//!
//! Commands:
//! - `report`: run the analytics pipeline over the stored picks
//! - `import`: merge picks from JSON, CSV or a text paste into the store,
//!   or replace the stored log with `--replace`
//! - `export`: write the pick log as JSON or as the audit CSV
//! - `dedup`: collapse duplicate picks and save
//! - `config`: show or edit the bank configuration
//! - `sample`: write a synthetic pick log

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

use betlab_core::{DateRange, OddsRange, Plan, Report};
use betlab_runner::synthetic::generate;
use betlab_runner::{
    export_audit_csv, export_json, open_store, save_artifacts, AppConfig, Session,
};

#[derive(Parser)]
#[command(name = "betlab", about = "BetLab CLI: betting pick analytics")]
struct Cli {
    /// Application config (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "betlab.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline over the stored picks and print a summary.
    Report {
        /// Date preset: today, yesterday, week, month, last-month, ytd, last-year, all.
        #[arg(long)]
        range: Option<DateRange>,

        /// Custom window start (YYYY-MM-DD). Overrides --range.
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Custom window end (YYYY-MM-DD). Overrides --range.
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Restrict to plans (repeatable).
        #[arg(long)]
        plan: Vec<Plan>,

        /// Restrict to market labels (repeatable), e.g. OVERS, BTTS.
        #[arg(long)]
        market: Vec<String>,

        /// Substring of the result text, e.g. WIN.
        #[arg(long)]
        result: Option<String>,

        /// Free-text search over events and bets.
        #[arg(long)]
        search: Option<String>,

        /// Odds band: low, med, high.
        #[arg(long)]
        odds: Option<OddsRange>,

        /// Evaluation date. Defaults to the local date.
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Print the full report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Write the artifact bundle under the configured output dir.
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Merge picks from a .json, .csv or .txt paste into the store (or replace it).
    Import {
        file: PathBuf,

        /// Plan for text pastes.
        #[arg(long)]
        plan: Option<Plan>,

        /// Replace the stored pick log instead of merging (backup restore).
        #[arg(long, default_value_t = false)]
        replace: bool,
    },
    /// Export the pick log.
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Collapse duplicate picks and save.
    Dedup,
    /// Show or edit the bank configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Write a synthetic pick log as JSON.
    Sample {
        #[arg(long, default_value_t = 300)]
        count: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// First pick date. Defaults to 90 days ago.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the bank configuration as JSON.
    Show,
    /// Set the global bankroll.
    SetBank { value: String },
    /// Set the global stake percentage.
    SetStake { value: String },
    /// Set one plan's bankroll.
    SetPlanBank { plan: Plan, value: String },
    /// Set one plan's stake percentage.
    SetPlanStake { plan: Plan, value: String },
    /// Switch between the shared global bank and per-plan banks.
    ToggleGlobal,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command {
        Commands::Report {
            range,
            from,
            to,
            plan,
            market,
            result,
            search,
            odds,
            today,
            json,
            save,
        } => {
            let mut session = open_session(&app)?;
            session.filters.date_range = match (from, to) {
                (None, None) => range.unwrap_or_default(),
                (start, end) => DateRange::Custom { start, end },
            };
            session.filters.plans = plan;
            session.filters.markets = market;
            session.filters.result = result;
            session.filters.search = search.unwrap_or_default();
            session.filters.odds_range = odds;
            let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
            run_report(&session, &app, today, json, save)
        }
        Commands::Import { file, plan, replace } => {
            let mut session = open_session(&app)?;
            let summary = if replace {
                session.restore_file(&file, plan)?
            } else {
                session.import_file(&file, plan)?
            };
            session.save()?;
            println!(
                "Imported {} pick(s) ({} skipped, {} duplicate(s) merged). Store now holds {}.",
                summary.parsed,
                summary.skipped,
                summary.duplicates,
                session.picks.len()
            );
            Ok(())
        }
        Commands::Export { format, out } => {
            let session = open_session(&app)?;
            let content = match format {
                ExportFormat::Json => export_json(&session.picks)?,
                ExportFormat::Csv => export_audit_csv(
                    &session.picks,
                    &app.audit,
                    chrono::Local::now().naive_local(),
                )?,
            };
            emit(&content, out.as_deref())
        }
        Commands::Dedup => {
            let mut session = open_session(&app)?;
            let removed = session.dedup();
            session.save()?;
            println!("Removed {removed} duplicate(s); {} pick(s) remain.", session.picks.len());
            Ok(())
        }
        Commands::Config { action } => run_config(&app, action),
        Commands::Sample {
            count,
            seed,
            start,
            out,
        } => {
            let start = start
                .unwrap_or_else(|| chrono::Local::now().date_naive() - chrono::Duration::days(90));
            let picks = generate(count, seed, start);
            emit(&export_json(&picks)?, out.as_deref())
        }
    }
}

fn open_session(app: &AppConfig) -> Result<Session> {
    let store = open_store(&app.store)?;
    Ok(Session::open(store))
}

fn run_report(session: &Session, app: &AppConfig, today: NaiveDate, json: bool, save: bool) -> Result<()> {
    let report = session.analyze(today);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if save {
        let run_dir = save_artifacts(&report, &app.output_dir)?;
        info!(dir = %run_dir.display(), "artifacts saved");
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_config(app: &AppConfig, action: ConfigAction) -> Result<()> {
    let mut session = open_session(app)?;
    let accepted = match &action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&session.config)?);
            return Ok(());
        }
        ConfigAction::SetBank { value } => session.set_bank(value),
        ConfigAction::SetStake { value } => session.set_stake_pct(value),
        ConfigAction::SetPlanBank { plan, value } => session.set_plan_bank(*plan, value),
        ConfigAction::SetPlanStake { plan, value } => session.set_plan_stake(*plan, value),
        ConfigAction::ToggleGlobal => {
            let global = session.toggle_global();
            println!("Global bank {}", if global { "on" } else { "off" });
            true
        }
    };
    if !accepted {
        bail!("value must be a finite number");
    }
    session.save()?;
    println!("{}", serde_json::to_string_pretty(&session.config)?);
    Ok(())
}

fn emit(content: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn print_summary(report: &Report) {
    let m = &report.metrics;
    println!();
    println!("=== BetLab Report ({}) ===", report.today);
    println!(
        "Period:         {} to {} ({} days)",
        opt_date(report.first_date),
        opt_date(report.last_date),
        report.total_days
    );
    println!("Picks:          {}", m.count);
    println!(
        "Results:        {}W {}L {}HW {}HL {}P {}M {}V {}C {}pending",
        m.status.win,
        m.status.loss,
        m.status.half_win,
        m.status.half_loss,
        m.status.push,
        m.status.mixed,
        m.status.void,
        m.status.canceled,
        m.status.pending
    );
    println!();
    println!("--- Performance ---");
    println!("Bank:           {:.2} -> {:.2}", m.initial_bank, m.final_bank);
    println!("Profit:         {:.2} ({:+.2}u)", m.profit, m.units_profit);
    println!("ROI (stake):    {:.2}%", m.roi_stake);
    println!("ROI (bank):     {:.2}%", m.roi_bank);
    println!("CAGR:           {:.2}%", m.cagr);
    println!("Win Rate:       {:.1}%", m.winrate);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Avg W. Odds:    {:.2}", m.avg_weighted_odds);
    println!("Edge:           {:.2}%", m.edge);
    println!("Kelly:          {:.2}%", m.kelly);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Streaks:        {}W / {}L", m.max_win_streak, m.max_loss_streak);
    println!(
        "Max Drawdown:   {:.2} ({:.2}%, {} days)",
        m.max_drawdown, m.drawdown_relative, m.max_drawdown_days
    );
    println!(
        "Current DD:     {:.2}{}",
        m.current_drawdown,
        if m.is_recovering { " (recovering)" } else { "" }
    );
    println!();
    println!("{:<10} {:>6} {:>12} {:>12}", "Plan", "Picks", "Stake", "Profit");
    println!("{}", "-".repeat(43));
    for ps in &report.plan_stats {
        println!("{:<10} {:>6} {:>12.2} {:>12.2}", ps.plan, ps.count, ps.stake, ps.profit);
    }
    println!();
}

fn opt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}
