//! Settlement: profit and unit delta of one pick from its result text.
//!
//! Two paths:
//! 1. **Asian totals.** When the result holds a score (or a bare goal count)
//!    and the first leg's bet is an over/under line, the bet is settled as two
//!    half-stake sub-bets on the two component lines (quarter lines split to
//!    the adjacent .0/.5 lines).
//! 2. **Result tokens.** Otherwise the uppercased result text is matched
//!    against [`RESULT_RULES`] in priority order.
//!
//! Nothing here fails: text that matches no rule settles at zero with
//! [`Outcome::Unhandled`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Settled state of a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Win,
    Loss,
    HalfWin,
    HalfLoss,
    /// Asian line returned in full.
    Push,
    /// Asian split with one sub-bet won and the other lost.
    Mixed,
    Void,
    Canceled,
    Pending,
    /// Result text matched no rule (including bare scores on non-Asian bets).
    Unhandled,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
            Outcome::HalfWin => "HALF WIN",
            Outcome::HalfLoss => "HALF LOSS",
            Outcome::Push => "PUSH",
            Outcome::Mixed => "MIXED",
            Outcome::Void => "VOID",
            Outcome::Canceled => "CANCELED",
            Outcome::Pending => "PENDING",
            Outcome::Unhandled => "UNHANDLED",
        }
    }

    /// Counts as a won bet for win rate and streaks.
    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win | Outcome::HalfWin)
    }

    /// Counts as a lost bet for win rate and streaks.
    pub fn is_loss(&self) -> bool {
        matches!(self, Outcome::Loss | Outcome::HalfLoss)
    }
}

/// Result of settling one pick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub profit: f64,
    pub units: f64,
    pub outcome: Outcome,
    /// Settled through the Asian split-line path.
    pub asian: bool,
}

impl Settlement {
    pub fn label(&self) -> &'static str {
        self.outcome.label()
    }

    fn flat(outcome: Outcome, odds: f64, stake: f64) -> Self {
        let (profit, units) = match outcome {
            Outcome::Win => (stake * (odds - 1.0), odds - 1.0),
            Outcome::Loss => (-stake, -1.0),
            Outcome::HalfWin => (stake / 2.0 * (odds - 1.0), (odds - 1.0) / 2.0),
            Outcome::HalfLoss => (-stake / 2.0, -0.5),
            _ => (0.0, 0.0),
        };
        Self {
            profit,
            units,
            outcome,
            asian: false,
        }
    }
}

/// Settle one pick.
///
/// `first_bet` is the bet text of the pick's first leg; multi-leg picks are
/// not decomposed.
pub fn resolve(result: &str, odds: f64, stake: f64, first_bet: &str) -> Settlement {
    let upper = result.to_uppercase();

    if let Some(total) = extract_total(&upper) {
        if let Some(line) = AsianTotal::parse(first_bet) {
            return line.settle(total, odds, stake);
        }
    }

    Settlement::flat(classify_result(&upper), odds, stake)
}

// ─── Result token rules ─────────────────────────────────────────────

/// One entry of the result classifier: first matching rule wins.
pub struct ResultRule {
    pub outcome: Outcome,
    pub matches: fn(&str) -> bool,
}

/// Ordered result rules, evaluated against the uppercased result text.
///
/// Order matters: a full WIN/LOSS token is checked before the HALF variants,
/// and status tokens come last.
pub const RESULT_RULES: &[ResultRule] = &[
    ResultRule {
        outcome: Outcome::Win,
        matches: |t| contains_full(t, "WIN"),
    },
    ResultRule {
        outcome: Outcome::Loss,
        matches: |t| contains_full(t, "LOSS"),
    },
    ResultRule {
        outcome: Outcome::HalfWin,
        matches: |t| contains_half(t, "WIN"),
    },
    ResultRule {
        outcome: Outcome::HalfLoss,
        matches: |t| contains_half(t, "LOSS"),
    },
    ResultRule {
        outcome: Outcome::Void,
        matches: |t| t.contains("VOID"),
    },
    ResultRule {
        outcome: Outcome::Canceled,
        matches: |t| t.contains("CANCEL"),
    },
    ResultRule {
        outcome: Outcome::Pending,
        matches: |t| t.contains("PENDING"),
    },
];

/// Classify uppercased result text through [`RESULT_RULES`].
pub fn classify_result(upper: &str) -> Outcome {
    RESULT_RULES
        .iter()
        .find(|rule| (rule.matches)(upper))
        .map(|rule| rule.outcome)
        .unwrap_or(Outcome::Unhandled)
}

/// `token` occurs somewhere not immediately preceded by "HALF".
fn contains_full(text: &str, token: &str) -> bool {
    text.match_indices(token).any(|(i, _)| !preceded_by_half(text, i))
}

/// `token` occurs as "HALF <token>" (space, dash or underscore separated).
fn contains_half(text: &str, token: &str) -> bool {
    text.match_indices(token).any(|(i, _)| preceded_by_half(text, i))
}

fn preceded_by_half(text: &str, at: usize) -> bool {
    text[..at]
        .trim_end_matches(|c: char| c == ' ' || c == '-' || c == '_')
        .ends_with("HALF")
}

// ─── Score extraction ───────────────────────────────────────────────

fn score_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*[-: ]\s*(\d+)").expect("static regex"))
}

/// Total goals from a result: "N-N", "N:N" or "N N" summed, or a bare integer.
///
/// A score too large for `u64` yields `None`, leaving the pick to text
/// classification.
pub fn extract_total(result: &str) -> Option<u64> {
    if let Some(caps) = score_re().captures(result) {
        let home: u64 = caps[1].parse().ok()?;
        let away: u64 = caps[2].parse().ok()?;
        return home.checked_add(away);
    }
    let trimmed = result.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed.parse().ok();
    }
    None
}

// ─── Asian totals ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Over,
    Under,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineResult {
    Win,
    Push,
    Loss,
}

/// An over/under bet resolved to its two component lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsianTotal {
    pub side: Side,
    pub lines: (f64, f64),
}

fn split_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(over|under)\s+(\d+(?:\.\d+)?),(\d+(?:\.\d+)?)")
            .expect("static regex")
    })
}

fn single_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(over|under)\s+(\d+(?:\.\d+)?)").expect("static regex")
    })
}

const LINE_EPS: f64 = 1e-3;

impl AsianTotal {
    /// Parse "Over 2.25", "Under 3.5" or an explicit pair "Over 2,2.5".
    ///
    /// Returns `None` for text that is not an over/under line, or for an
    /// explicit pair whose lines are neither equal nor half a goal apart.
    pub fn parse(bet: &str) -> Option<Self> {
        let (side_text, l1, l2) = if let Some(c) = split_line_re().captures(bet) {
            (
                c[1].to_lowercase(),
                c[2].parse::<f64>().ok()?,
                c[3].parse::<f64>().ok()?,
            )
        } else {
            let c = single_line_re().captures(bet)?;
            let line = c[2].parse::<f64>().ok()?;
            let frac = line.fract();
            let (lo, hi) = if (frac - 0.25).abs() < LINE_EPS || (frac - 0.75).abs() < LINE_EPS {
                (line - 0.25, line + 0.25)
            } else {
                (line, line)
            };
            (c[1].to_lowercase(), lo, hi)
        };

        let gap = (l2 - l1).abs();
        if gap > LINE_EPS && (gap - 0.5).abs() > LINE_EPS {
            return None;
        }
        let side = if side_text == "over" { Side::Over } else { Side::Under };
        Some(Self {
            side,
            lines: (l1, l2),
        })
    }

    fn settle_line(&self, line: f64, total: f64) -> LineResult {
        if (total - line).abs() < LINE_EPS {
            return LineResult::Push;
        }
        let over_wins = total > line;
        match (self.side, over_wins) {
            (Side::Over, true) | (Side::Under, false) => LineResult::Win,
            _ => LineResult::Loss,
        }
    }

    /// Settle both halves on `stake / 2` each and combine.
    pub fn settle(&self, total: u64, odds: f64, stake: f64) -> Settlement {
        let total = total as f64;
        let half = stake / 2.0;
        let r1 = self.settle_line(self.lines.0, total);
        let r2 = self.settle_line(self.lines.1, total);

        let leg = |r: LineResult| match r {
            LineResult::Win => (half * (odds - 1.0), (odds - 1.0) / 2.0),
            LineResult::Loss => (-half, -0.5),
            LineResult::Push => (0.0, 0.0),
        };
        let (p1, u1) = leg(r1);
        let (p2, u2) = leg(r2);

        use LineResult::*;
        let outcome = match (r1, r2) {
            (Win, Win) => Outcome::Win,
            (Loss, Loss) => Outcome::Loss,
            (Push, Push) => Outcome::Push,
            (Win, Push) | (Push, Win) => Outcome::HalfWin,
            (Loss, Push) | (Push, Loss) => Outcome::HalfLoss,
            (Win, Loss) | (Loss, Win) => Outcome::Mixed,
        };

        Settlement {
            profit: p1 + p2,
            units: u1 + u2,
            outcome,
            asian: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // ── Result tokens ──

    #[test]
    fn win_at_even_odds() {
        let s = resolve("WIN", 2.0, 100.0, "1");
        assert!(approx(s.profit, 100.0));
        assert!(approx(s.units, 1.0));
        assert_eq!(s.outcome, Outcome::Win);
    }

    #[test]
    fn loss_at_even_odds() {
        let s = resolve("LOSS", 2.0, 100.0, "1");
        assert!(approx(s.profit, -100.0));
        assert!(approx(s.units, -1.0));
    }

    #[test]
    fn half_win_is_not_a_full_win() {
        let s = resolve("HALF WIN", 2.0, 100.0, "AH -0.25");
        assert!(approx(s.profit, 50.0));
        assert!(approx(s.units, 0.5));
        assert_eq!(s.outcome, Outcome::HalfWin);
    }

    #[test]
    fn half_loss_is_not_a_full_loss() {
        let s = resolve("half loss", 1.9, 100.0, "AH +0.25");
        assert!(approx(s.profit, -50.0));
        assert_eq!(s.outcome, Outcome::HalfLoss);
    }

    #[test]
    fn void_settles_flat() {
        let s = resolve("VOID", 2.0, 100.0, "1");
        assert!(approx(s.profit, 0.0));
        assert_eq!(s.outcome, Outcome::Void);
    }

    #[test]
    fn canceled_and_pending_settle_flat() {
        assert_eq!(resolve("CANCELLED", 2.0, 100.0, "1").outcome, Outcome::Canceled);
        assert_eq!(resolve("PENDING", 2.0, 100.0, "1").outcome, Outcome::Pending);
        assert!(approx(resolve("PENDING", 2.0, 100.0, "1").profit, 0.0));
    }

    #[test]
    fn unknown_text_is_unhandled() {
        let s = resolve("¿?", 2.0, 100.0, "1");
        assert_eq!(s.outcome, Outcome::Unhandled);
        assert!(approx(s.profit, 0.0));
    }

    #[test]
    fn score_on_non_asian_bet_is_unhandled() {
        let s = resolve("2-1", 2.0, 100.0, "1X2 Home");
        assert_eq!(s.outcome, Outcome::Unhandled);
        assert!(approx(s.profit, 0.0));
        assert!(!s.asian);
    }

    #[test]
    fn rule_order_prefers_full_win() {
        assert_eq!(classify_result("WIN"), Outcome::Win);
        assert_eq!(classify_result("HALF WIN"), Outcome::HalfWin);
        assert_eq!(classify_result("HALF-LOSS"), Outcome::HalfLoss);
        assert_eq!(classify_result("HALF_WIN"), Outcome::HalfWin);
    }

    // ── Score extraction ──

    #[test]
    fn extracts_score_totals() {
        assert_eq!(extract_total("2-1"), Some(3));
        assert_eq!(extract_total("0:0"), Some(0));
        assert_eq!(extract_total("3 2"), Some(5));
        assert_eq!(extract_total("FT 1 - 1"), Some(2));
        assert_eq!(extract_total("4"), Some(4));
        assert_eq!(extract_total("WIN"), None);
        assert_eq!(extract_total(""), None);
    }

    #[test]
    fn oversized_score_falls_back_to_text() {
        assert_eq!(extract_total("4000000000-4000000000"), Some(8_000_000_000));
        assert_eq!(extract_total("18446744073709551615-1"), None);
        assert_eq!(extract_total("99999999999999999999999"), None);

        let s = resolve("18446744073709551615-1 WIN", 2.0, 100.0, "Over 2.5");
        assert_eq!(s.outcome, Outcome::Win);
        assert!(!s.asian);
        let s = resolve("4000000000-4000000000", 2.0, 100.0, "Over 2.5");
        assert!(s.asian);
        assert!(approx(s.profit, 100.0));
    }

    // ── Asian totals ──

    #[test]
    fn quarter_line_splits_to_adjacent_lines() {
        let a = AsianTotal::parse("Over 2.25").unwrap();
        assert_eq!(a.side, Side::Over);
        assert!(approx(a.lines.0, 2.0) && approx(a.lines.1, 2.5));
        let b = AsianTotal::parse("under 2.75 goals").unwrap();
        assert_eq!(b.side, Side::Under);
        assert!(approx(b.lines.0, 2.5) && approx(b.lines.1, 3.0));
    }

    #[test]
    fn explicit_pair_is_used_as_given() {
        let a = AsianTotal::parse("Over 2,2.5").unwrap();
        assert!(approx(a.lines.0, 2.0) && approx(a.lines.1, 2.5));
        assert!(AsianTotal::parse("Over 2,3.5").is_none());
    }

    #[test]
    fn non_total_bet_does_not_parse() {
        assert!(AsianTotal::parse("BTTS Yes").is_none());
        assert!(AsianTotal::parse("1X2 Home").is_none());
    }

    #[test]
    fn over_quarter_line_half_loss() {
        let s = resolve("1-1", 2.0, 100.0, "Over 2.25");
        assert!(approx(s.profit, -50.0));
        assert!(approx(s.units, -0.5));
        assert_eq!(s.label(), "HALF LOSS");
        assert!(s.asian);
    }

    #[test]
    fn over_quarter_line_full_win() {
        let s = resolve("2-1", 2.0, 100.0, "Over 2.25");
        assert!(approx(s.profit, 100.0));
        assert_eq!(s.label(), "WIN");
    }

    #[test]
    fn over_three_quarter_line_half_win() {
        // 2.5 wins, 3.0 pushes
        let s = resolve("2-1", 1.8, 100.0, "Over 2.75");
        assert!(approx(s.profit, 40.0));
        assert_eq!(s.outcome, Outcome::HalfWin);
    }

    #[test]
    fn under_half_line_stands_alone() {
        let s = resolve("1-0", 1.9, 100.0, "Under 2.5");
        assert!(approx(s.profit, 90.0));
        assert_eq!(s.outcome, Outcome::Win);
        let l = resolve("2-1", 1.9, 100.0, "Under 2.5");
        assert!(approx(l.profit, -100.0));
        assert_eq!(l.outcome, Outcome::Loss);
    }

    #[test]
    fn whole_line_push() {
        let s = resolve("1-1", 1.9, 100.0, "Over 2");
        assert!(approx(s.profit, 0.0));
        assert_eq!(s.outcome, Outcome::Push);
    }

    #[test]
    fn lines_straddling_total_are_mixed() {
        let a = AsianTotal {
            side: Side::Over,
            lines: (1.5, 2.5),
        };
        let s = a.settle(2, 2.0, 100.0);
        assert!(approx(s.profit, 0.0));
        assert_eq!(s.outcome, Outcome::Mixed);
    }
}
