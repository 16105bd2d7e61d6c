//! Filter engine: date window resolution and pick predicates.
//!
//! All predicates are conjunctive and independent. The output is always
//! ordered by (date, ingestion timestamp); the simulator relies on that order
//! and never re-sorts.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{Pick, Plan};
use crate::market::{market_label, OddsRange};

// ─── Date window ────────────────────────────────────────────────────

/// Date-range preset, resolved against an explicit evaluation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "snake_case")]
pub enum DateRange {
    Today,
    Yesterday,
    /// Monday of the current week through today.
    Week,
    /// First of the current month through today.
    Month,
    /// The whole previous calendar month.
    LastMonth,
    YearToDate,
    /// The whole previous calendar year.
    LastYear,
    /// Explicit bounds; a missing side is unbounded.
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    #[default]
    All,
}

/// Inclusive date bounds; `None` means unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

impl DateRange {
    /// Concrete window for this preset as seen from `today`.
    pub fn resolve(&self, today: NaiveDate) -> DateWindow {
        match *self {
            DateRange::Today => DateWindow::new(today, today),
            DateRange::Yesterday => {
                let y = today - Duration::days(1);
                DateWindow::new(y, y)
            }
            DateRange::Week => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                DateWindow::new(monday, today)
            }
            DateRange::Month => DateWindow::new(month_start(today), today),
            DateRange::LastMonth => {
                let last_day = month_start(today) - Duration::days(1);
                DateWindow::new(month_start(last_day), last_day)
            }
            DateRange::YearToDate => DateWindow::new(year_start(today.year()).unwrap_or(today), today),
            DateRange::LastYear => {
                let year = today.year() - 1;
                match (year_start(year), NaiveDate::from_ymd_opt(year, 12, 31)) {
                    (Some(s), Some(e)) => DateWindow::new(s, e),
                    _ => DateWindow::default(),
                }
            }
            DateRange::Custom { start, end } => DateWindow { start, end },
            DateRange::All => DateWindow::default(),
        }
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn year_start(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRange::Today => f.write_str("today"),
            DateRange::Yesterday => f.write_str("yesterday"),
            DateRange::Week => f.write_str("week"),
            DateRange::Month => f.write_str("month"),
            DateRange::LastMonth => f.write_str("last-month"),
            DateRange::YearToDate => f.write_str("ytd"),
            DateRange::LastYear => f.write_str("last-year"),
            DateRange::Custom { start, end } => {
                let fmt_bound = |d: &Option<NaiveDate>| d.map_or("…".to_string(), |d| d.to_string());
                write!(f, "{} → {}", fmt_bound(start), fmt_bound(end))
            }
            DateRange::All => f.write_str("all"),
        }
    }
}

impl FromStr for DateRange {
    type Err = String;

    /// Parses the preset names; custom windows are built from explicit dates.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "today" => Ok(DateRange::Today),
            "yesterday" => Ok(DateRange::Yesterday),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            "last-month" => Ok(DateRange::LastMonth),
            "ytd" | "year" => Ok(DateRange::YearToDate),
            "last-year" => Ok(DateRange::LastYear),
            "all" => Ok(DateRange::All),
            other => Err(format!(
                "unknown date range '{other}' (expected today, yesterday, week, month, last-month, ytd, last-year, all)"
            )),
        }
    }
}

// ─── Predicates ─────────────────────────────────────────────────────

/// Active filter set. The default filters nothing out.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub date_range: DateRange,
    /// Plan membership; empty means every plan.
    pub plans: Vec<Plan>,
    /// Market-label membership; empty means every market.
    pub markets: Vec<String>,
    /// Substring of the result text (case-insensitive); `None` means any.
    pub result: Option<String>,
    /// Substring of the legs' "event bet" text (case-insensitive).
    pub search: String,
    pub odds_range: Option<OddsRange>,
}

impl Filters {
    /// Does `pick` pass every predicate except the date window?
    pub fn matches(&self, pick: &Pick) -> bool {
        if !self.search.is_empty() && !pick.search_text().contains(&self.search.to_lowercase()) {
            return false;
        }
        if !self.plans.is_empty() && !self.plans.contains(&pick.plan) {
            return false;
        }
        if !self.markets.is_empty() {
            let label = market_label(pick.first_bet());
            if !self.markets.iter().any(|m| m.eq_ignore_ascii_case(label)) {
                return false;
            }
        }
        if let Some(result) = &self.result {
            // Stored results mix "Win" and "WIN"; compare uppercased.
            if !pick.result.to_uppercase().contains(&result.to_uppercase()) {
                return false;
            }
        }
        if let Some(range) = self.odds_range {
            if !range.contains(pick.odds) {
                return false;
            }
        }
        true
    }

    /// Filtered picks, ordered by (date, ts). Ties keep input order.
    pub fn apply<'a>(&self, picks: &'a [Pick], today: NaiveDate) -> Vec<&'a Pick> {
        let window = self.date_range.resolve(today);
        let mut out: Vec<&Pick> = picks
            .iter()
            .filter(|p| window.contains(p.date) && self.matches(p))
            .collect();
        out.sort_by_key(|p| (p.date, p.ts));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Leg;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn pick(id: &str, date: NaiveDate, bet: &str, odds: f64, result: &str, plan: Plan, ts: i64) -> Pick {
        Pick::new(id, date, vec![Leg::new("Home v Away", bet)], odds, result, plan, ts).unwrap()
    }

    // ── Date presets ──

    #[test]
    fn week_starts_on_monday() {
        // 2024-05-16 is a Thursday.
        let w = DateRange::Week.resolve(d(2024, 5, 16));
        assert_eq!(w, DateWindow::new(d(2024, 5, 13), d(2024, 5, 16)));
        // A Sunday belongs to the week that started six days earlier.
        let w = DateRange::Week.resolve(d(2024, 5, 19));
        assert_eq!(w.start, Some(d(2024, 5, 13)));
    }

    #[test]
    fn last_month_spans_whole_month() {
        let w = DateRange::LastMonth.resolve(d(2024, 3, 10));
        assert_eq!(w, DateWindow::new(d(2024, 2, 1), d(2024, 2, 29)));
        let w = DateRange::LastMonth.resolve(d(2024, 1, 5));
        assert_eq!(w, DateWindow::new(d(2023, 12, 1), d(2023, 12, 31)));
    }

    #[test]
    fn year_presets() {
        let today = d(2024, 7, 4);
        assert_eq!(DateRange::YearToDate.resolve(today), DateWindow::new(d(2024, 1, 1), today));
        assert_eq!(
            DateRange::LastYear.resolve(today),
            DateWindow::new(d(2023, 1, 1), d(2023, 12, 31))
        );
        assert_eq!(DateRange::Yesterday.resolve(today), DateWindow::new(d(2024, 7, 3), d(2024, 7, 3)));
    }

    #[test]
    fn custom_and_all_are_open_ended() {
        let w = DateRange::Custom { start: Some(d(2024, 1, 1)), end: None }.resolve(d(2024, 6, 1));
        assert!(w.contains(d(2030, 1, 1)));
        assert!(!w.contains(d(2023, 12, 31)));
        assert!(DateRange::All.resolve(d(2024, 6, 1)).contains(d(1999, 1, 1)));
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("last_month".parse::<DateRange>().unwrap(), DateRange::LastMonth);
        assert_eq!("YTD".parse::<DateRange>().unwrap(), DateRange::YearToDate);
        assert!("fortnight".parse::<DateRange>().is_err());
    }

    // ── Predicates ──

    #[test]
    fn output_sorted_by_date_then_ts() {
        let picks = vec![
            pick("c", d(2024, 2, 2), "1", 2.0, "WIN", Plan::Elite, 5),
            pick("b", d(2024, 2, 1), "1", 2.0, "WIN", Plan::Elite, 9),
            pick("a", d(2024, 2, 1), "1", 2.0, "WIN", Plan::Elite, 3),
        ];
        let out = Filters::default().apply(&picks, d(2024, 3, 1));
        let ids: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn predicates_are_conjunctive() {
        let picks = vec![
            pick("a", d(2024, 2, 1), "Over 2.5", 1.9, "WIN", Plan::Elite, 0),
            pick("b", d(2024, 2, 1), "Over 2.5", 3.2, "WIN", Plan::Elite, 0),
            pick("c", d(2024, 2, 1), "BTTS", 1.9, "WIN", Plan::Elite, 0),
            pick("d", d(2024, 2, 1), "Over 2.5", 1.9, "LOSS", Plan::Elite, 0),
            pick("e", d(2024, 2, 1), "Over 2.5", 1.9, "WIN", Plan::Premium, 0),
        ];
        let filters = Filters {
            plans: vec![Plan::Elite],
            markets: vec!["OVERS".into()],
            result: Some("win".into()),
            odds_range: Some(OddsRange::Med),
            ..Filters::default()
        };
        let out = filters.apply(&picks, d(2024, 3, 1));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn search_spans_all_legs() {
        let multi = Pick::new(
            "m",
            d(2024, 2, 1),
            vec![Leg::new("Arsenal v Spurs", "1"), Leg::new("Celtic v Rangers", "BTTS")],
            3.5,
            "WIN",
            Plan::Standard,
            0,
        )
        .unwrap();
        let filters = Filters {
            search: "RANGERS".into(),
            ..Filters::default()
        };
        assert!(filters.matches(&multi));
        let filters = Filters {
            search: "chelsea".into(),
            ..Filters::default()
        };
        assert!(!filters.matches(&multi));
    }

    #[test]
    fn date_window_excludes_outside_picks() {
        let picks = vec![
            pick("jan", d(2024, 1, 31), "1", 2.0, "WIN", Plan::Elite, 0),
            pick("feb", d(2024, 2, 10), "1", 2.0, "WIN", Plan::Elite, 0),
        ];
        let filters = Filters {
            date_range: DateRange::Month,
            ..Filters::default()
        };
        let out = filters.apply(&picks, d(2024, 2, 15));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "feb");
    }
}
