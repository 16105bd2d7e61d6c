//! Pick import: JSON arrays, audit/legacy CSV and pasted text blocks.
//!
//! Every format ends in validated [`Pick`]s. Records that cannot be
//! validated are skipped with a warning and counted; they never abort the
//! whole import. Records without an id get a content-derived one salted
//! with their row index.

use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

use betlab_core::domain::RawPick;
use betlab_core::{Leg, Pick, Plan};

/// Placeholder legs for legacy CSV rows, which carry no event/bet columns.
const LEGACY_EVENT: &str = "Imported from CSV";
const LEGACY_BET: &str = "Unknown";

/// Errors that abort an import as a whole.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV has no FECHA,PLAN header row")]
    MissingHeader,

    #[error("text import needs a plan to assign the picks to")]
    PlanRequired,

    #[error("unsupported import format '{0}' (expected .json, .csv or .txt)")]
    UnsupportedFormat(String),
}

/// Picks accepted by an import, plus how many records were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub picks: Vec<Pick>,
    pub skipped: usize,
}

impl ImportReport {
    fn accept(&mut self, pick: Pick) {
        self.picks.push(pick);
    }

    fn skip(&mut self, row: usize, reason: impl std::fmt::Display) {
        warn!(row, %reason, "skipping import record");
        self.skipped += 1;
    }
}

/// Import a file, choosing the format from its extension.
///
/// `plan` is required for text pastes; `ts_base` seeds ingestion timestamps
/// (row `i` gets `ts_base + i`).
pub fn import_path(path: &Path, plan: Option<Plan>, ts_base: i64) -> Result<ImportReport, ImportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let report = match ext.as_str() {
        "json" => import_json(&content)?,
        "csv" => import_csv(&content, ts_base)?,
        "txt" | "text" => import_text(&content, plan.ok_or(ImportError::PlanRequired)?, ts_base),
        other => return Err(ImportError::UnsupportedFormat(other.to_string())),
    };
    debug!(
        path = %path.display(),
        accepted = report.picks.len(),
        skipped = report.skipped,
        "import finished"
    );
    Ok(report)
}

// ─── JSON ───────────────────────────────────────────────────────────

/// Import a JSON array of stored pick records (legacy shapes included).
pub fn import_json(content: &str) -> Result<ImportReport, ImportError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(content)?;
    Ok(picks_from_values(values))
}

/// Validate loosely-typed stored records one by one.
pub fn picks_from_values(values: Vec<serde_json::Value>) -> ImportReport {
    let mut report = ImportReport::default();

    for (idx, value) in values.into_iter().enumerate() {
        let raw: RawPick = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                report.skip(idx, e);
                continue;
            }
        };
        let has_id = raw.id.as_deref().is_some_and(|id| !id.trim().is_empty());
        match Pick::try_from(raw) {
            Ok(mut pick) => {
                if !has_id {
                    pick.id = Pick::content_id(pick.date, pick.plan, &pick.legs, pick.odds, idx as u64);
                }
                report.accept(pick);
            }
            Err(e) => report.skip(idx, e),
        }
    }
    report
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Extended layout marker column.
const EXTENDED_MARKER: &str = "EVENTO / PARTIDO";

/// Import an audit CSV (extended layout) or a legacy 5-column CSV.
///
/// Rows before the `FECHA,PLAN,...` header (the manifest block) are ignored.
/// Extended: `FECHA,PLAN,MERCADO,EVENTO / PARTIDO,APUESTA / DETALLE,CUOTA,STAKE,RESULTADO,...`
/// with multi-leg events and bets joined by ` | `.
/// Legacy: `FECHA,PLAN,CUOTA,STAKE,RESULTADO`.
pub fn import_csv(content: &str, ts_base: i64) -> Result<ImportReport, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = rdr.records();
    let mut extended = None;
    for record in records.by_ref() {
        let record = record?;
        if is_header(&record) {
            extended = Some(record.iter().any(|f| f.eq_ignore_ascii_case(EXTENDED_MARKER)));
            break;
        }
    }
    let extended = extended.ok_or(ImportError::MissingHeader)?;

    let mut report = ImportReport::default();
    for (idx, record) in records.enumerate() {
        let record = record?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        if record.len() < 5 {
            report.skip(idx, format!("expected at least 5 columns, got {}", record.len()));
            continue;
        }
        match csv_row(&record, extended, idx, ts_base) {
            Ok(pick) => report.accept(pick),
            Err(e) => report.skip(idx, e),
        }
    }
    Ok(report)
}

fn is_header(record: &csv::StringRecord) -> bool {
    matches!(
        (record.get(0), record.get(1)),
        (Some(a), Some(b)) if a.eq_ignore_ascii_case("FECHA") && b.eq_ignore_ascii_case("PLAN")
    )
}

fn csv_row(record: &csv::StringRecord, extended: bool, idx: usize, ts_base: i64) -> Result<Pick, String> {
    let field = |i: usize| record.get(i).unwrap_or("");

    let date = NaiveDate::parse_from_str(field(0), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}'", field(0)))?;
    let plan: Plan = field(1).parse().map_err(|e| format!("{e}"))?;
    let (odds_col, result_col) = if extended { (5, 7) } else { (2, 4) };
    let odds: f64 = field(odds_col)
        .parse()
        .map_err(|_| format!("invalid odds '{}'", field(odds_col)))?;
    let result = field(result_col).to_uppercase();

    let legs = if extended {
        let events: Vec<&str> = field(3).split(" | ").collect();
        let bets: Vec<&str> = field(4).split(" | ").collect();
        events
            .iter()
            .enumerate()
            .map(|(i, event)| Leg::new(*event, bets.get(i).or(bets.first()).copied().unwrap_or("")))
            .collect()
    } else {
        vec![Leg::new(LEGACY_EVENT, LEGACY_BET)]
    };

    let id = Pick::content_id(date, plan, &legs, odds, idx as u64);
    Pick::new(id, date, legs, odds, result, plan, ts_base + idx as i64).map_err(|e| e.to_string())
}

// ─── Pasted text blocks ─────────────────────────────────────────────

fn date_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2})\.(\d{2})\.(\d{2}|\d{4})$").expect("static regex"))
}

fn month_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(january|february|march|april|may|june|july|august|september|october|november|december)")
            .expect("static regex")
    })
}

const BLOCK_TYPES: [&str; 4] = ["single", "double", "triple", "system"];

/// A pick under construction while scanning a pasted block.
struct Draft {
    date: Option<NaiveDate>,
    date_text: String,
    legs: Vec<Leg>,
    pending_event: Option<String>,
    odds: f64,
    result: String,
    metadata: std::collections::BTreeMap<String, serde_json::Value>,
}

impl Draft {
    fn new(date_text: &str, date: Option<NaiveDate>) -> Self {
        Self {
            date,
            date_text: date_text.to_string(),
            legs: Vec::new(),
            pending_event: None,
            odds: 0.0,
            result: "PENDING".to_string(),
            metadata: Default::default(),
        }
    }

    fn flush_event(&mut self) {
        if let Some(event) = self.pending_event.take() {
            self.legs.push(Leg::new(event, ""));
        }
    }

    fn finish(mut self, plan: Plan, idx: usize, ts_base: i64) -> Result<Pick, String> {
        self.flush_event();
        let date = self
            .date
            .ok_or_else(|| format!("invalid date '{}'", self.date_text))?;
        let id = Pick::content_id(date, plan, &self.legs, self.odds, idx as u64);
        let mut pick = Pick::new(id, date, self.legs, self.odds, self.result, plan, ts_base + idx as i64)
            .map_err(|e| e.to_string())?;
        pick.metadata = self.metadata;
        Ok(pick)
    }
}

/// Import pasted pick blocks, all assigned to `plan`.
///
/// A block starts at a `DD.MM.YY` (or `DD.MM.YYYY`) line. Inside a block an
/// event line followed by `Bet: ...` forms a leg; `Odds`, `FT`, `Unit` and
/// `Rate` take their value from the next line.
pub fn import_text(content: &str, plan: Plan, ts_base: i64) -> ImportReport {
    let lines: Vec<&str> = content.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let mut drafts: Vec<Draft> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let low = line.to_lowercase();

        if let Some(caps) = date_line_re().captures(line) {
            let year = if caps[3].len() == 2 {
                format!("20{}", &caps[3])
            } else {
                caps[3].to_string()
            };
            let date = NaiveDate::parse_from_str(&format!("{year}-{}-{}", &caps[2], &caps[1]), "%Y-%m-%d").ok();
            drafts.push(Draft::new(line, date));
        } else if let Some(draft) = drafts.last_mut() {
            let next = lines.get(i + 1).copied();
            if low.starts_with("bet:") {
                if let Some(event) = draft.pending_event.take() {
                    draft.legs.push(Leg::new(event, line.get(4..).unwrap_or("").trim()));
                }
            } else if low == "odds" {
                if let Some(val) = next.and_then(|n| n.parse::<f64>().ok()) {
                    draft.odds = val;
                    i += 1;
                }
            } else if low == "ft" {
                draft.result = next.unwrap_or("").to_uppercase();
                i += 1;
            } else if low == "unit" || low == "rate" {
                draft
                    .metadata
                    .insert(low.clone(), serde_json::Value::String(next.unwrap_or("").to_string()));
                i += 1;
            } else if BLOCK_TYPES.contains(&low.as_str()) {
                // block type marker
            } else if is_event_line(line) {
                draft.flush_event();
                draft.pending_event = Some(line.to_string());
            }
        }
        i += 1;
    }

    let mut report = ImportReport::default();
    for (idx, draft) in drafts.into_iter().enumerate() {
        match draft.finish(plan, idx, ts_base) {
            Ok(pick) => report.accept(pick),
            Err(e) => report.skip(idx, e),
        }
    }
    report
}

fn is_event_line(line: &str) -> bool {
    line.chars().count() > 3
        && !line.contains('/')
        && !line.contains('%')
        && !line.contains("Bet:")
        && !line.contains("Odds")
        && !month_line_re().is_match(line)
}
