//! Market labels and odds bands.
//!
//! The label vocabulary (`BTTS`, `OVERS`, `UNDERS`, `CORNERS`, `DNB`, `1X2`,
//! `1`, `X`, `2`, `1X`, `X2`, `AH`, `OTRO`) is consumed verbatim by filters,
//! aggregation and reports. The rule order below is part of that contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fallback label for bets that match no rule.
pub const OTHER_MARKET: &str = "OTRO";

#[derive(Debug, Clone, Copy)]
enum Pattern {
    /// Substring anywhere in the uppercased bet.
    Contains(&'static str),
    /// Whole bet equals the token, or starts with the token plus a space.
    Token(&'static str),
}

impl Pattern {
    fn matches(&self, bet: &str) -> bool {
        match *self {
            Pattern::Contains(s) => bet.contains(s),
            Pattern::Token(t) => {
                bet == t || (bet.starts_with(t) && bet[t.len()..].starts_with(' '))
            }
        }
    }
}

/// Ordered (pattern → label) table; first match wins.
const MARKET_RULES: &[(Pattern, &str)] = &[
    (Pattern::Contains("BTTS"), "BTTS"),
    (Pattern::Contains("OVER"), "OVERS"),
    (Pattern::Contains("UNDER"), "UNDERS"),
    (Pattern::Contains("CORNER"), "CORNERS"),
    (Pattern::Contains("DNB"), "DNB"),
    (Pattern::Contains("DRAW NO BET"), "DNB"),
    (Pattern::Contains("1X2"), "1X2"),
    (Pattern::Token("1"), "1"),
    (Pattern::Token("X"), "X"),
    (Pattern::Token("2"), "2"),
    (Pattern::Token("1X"), "1X"),
    (Pattern::Token("X2"), "X2"),
    (Pattern::Contains("AH"), "AH"),
    (Pattern::Contains("ASIAN HANDICAP"), "AH"),
];

/// Market label of a bet text (normally the first leg's bet).
///
/// Matching is on the trimmed, uppercased text, so pasted bets with stray
/// padding (" 1 ", "X2\n") still hit the exact-token rules.
pub fn market_label(bet: &str) -> &'static str {
    let upper = bet.trim().to_uppercase();
    MARKET_RULES
        .iter()
        .find(|(pattern, _)| pattern.matches(&upper))
        .map(|(_, label)| *label)
        .unwrap_or(OTHER_MARKET)
}

// ─── Odds range filter ──────────────────────────────────────────────

/// Coarse odds band used by the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OddsRange {
    /// Below 1.60.
    Low,
    /// 1.60 to 2.50 inclusive.
    Med,
    /// Above 2.50.
    High,
}

impl OddsRange {
    pub fn contains(&self, odds: f64) -> bool {
        match self {
            OddsRange::Low => odds < 1.6,
            OddsRange::Med => (1.6..=2.5).contains(&odds),
            OddsRange::High => odds > 2.5,
        }
    }
}

impl fmt::Display for OddsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OddsRange::Low => "LOW",
            OddsRange::Med => "MED",
            OddsRange::High => "HIGH",
        };
        f.write_str(s)
    }
}

impl FromStr for OddsRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(OddsRange::Low),
            "MED" | "MEDIUM" => Ok(OddsRange::Med),
            "HIGH" => Ok(OddsRange::High),
            other => Err(format!("unknown odds range '{other}' (expected LOW, MED or HIGH)")),
        }
    }
}

// ─── Odds bins (aggregation) ────────────────────────────────────────

/// Half-open odds bin `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OddsBand {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

pub const ODDS_BINS: [OddsBand; 8] = [
    OddsBand { label: "1.0-1.4", min: 1.0, max: 1.4 },
    OddsBand { label: "1.4-1.6", min: 1.4, max: 1.6 },
    OddsBand { label: "1.6-1.8", min: 1.6, max: 1.8 },
    OddsBand { label: "1.8-2.0", min: 1.8, max: 2.0 },
    OddsBand { label: "2.0-2.5", min: 2.0, max: 2.5 },
    OddsBand { label: "2.5-3.0", min: 2.5, max: 3.0 },
    OddsBand { label: "3.0-4.0", min: 3.0, max: 4.0 },
    OddsBand { label: "4.0-99", min: 4.0, max: 99.0 },
];

/// Index into [`ODDS_BINS`]; `None` for odds outside every bin.
pub fn odds_bin(odds: f64) -> Option<usize> {
    ODDS_BINS
        .iter()
        .position(|b| odds >= b.min && odds < b.max)
}
