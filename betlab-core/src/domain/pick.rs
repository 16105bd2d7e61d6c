//! Pick: one logged bet with its legs, odds, plan and recorded result.
//!
//! Picks are validated once, when they cross the ingestion boundary. Every
//! deserialization goes through [`RawPick`] (the loosely-typed stored shape)
//! and `TryFrom`, so the analytics core never sees an empty leg list, a
//! non-positive price or an unknown plan.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::plan::Plan;

/// Errors raised when a record cannot become a valid [`Pick`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PickError {
    #[error("pick has no legs")]
    EmptyLegs,

    #[error("invalid odds: {0}")]
    InvalidOdds(String),

    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("unknown plan '{0}'")]
    UnknownPlan(String),
}

/// One selection within a (possibly multi-leg) pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub event: String,
    pub bet: String,
}

impl Leg {
    pub fn new(event: impl Into<String>, bet: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            bet: bet.into(),
        }
    }
}

/// A validated pick.
///
/// Serialized field names (`matches`, `source`, `ts`) follow the stored
/// record format so exported JSON re-imports unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPick")]
pub struct Pick {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "matches")]
    pub legs: Vec<Leg>,
    pub odds: f64,
    pub result: String,
    #[serde(rename = "source")]
    pub plan: Plan,
    /// Ingestion timestamp (ms); tiebreak for picks on the same date.
    pub ts: i64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Pick {
    /// Build a pick, enforcing the ingestion invariants.
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        legs: Vec<Leg>,
        odds: f64,
        result: impl Into<String>,
        plan: Plan,
        ts: i64,
    ) -> Result<Self, PickError> {
        if legs.is_empty() {
            return Err(PickError::EmptyLegs);
        }
        if !odds.is_finite() || odds <= 0.0 {
            return Err(PickError::InvalidOdds(odds.to_string()));
        }
        Ok(Self {
            id: id.into(),
            date,
            legs,
            odds,
            result: result.into(),
            plan,
            ts,
            metadata: BTreeMap::new(),
        })
    }

    /// Bet text of the first leg; drives market labels and Asian settlement.
    pub fn first_bet(&self) -> &str {
        self.legs.first().map(|l| l.bet.as_str()).unwrap_or("")
    }

    pub fn is_multi(&self) -> bool {
        self.legs.len() > 1
    }

    pub fn is_pending(&self) -> bool {
        self.result.trim().eq_ignore_ascii_case("PENDING")
    }

    /// All legs as "event bet" joined by spaces, lowercased (free-text search).
    pub fn search_text(&self) -> String {
        self.legs
            .iter()
            .map(|l| format!("{} {}", l.event, l.bet))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Deterministic content-derived id for records that arrive without one.
    ///
    /// `salt` separates otherwise identical records (e.g. the source row index).
    pub fn content_id(date: NaiveDate, plan: Plan, legs: &[Leg], odds: f64, salt: u64) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(date.to_string().as_bytes());
        hasher.update(plan.as_str().as_bytes());
        for leg in legs {
            hasher.update(leg.event.as_bytes());
            hasher.update(b"\x1f");
            hasher.update(leg.bet.as_bytes());
            hasher.update(b"\x1e");
        }
        hasher.update(&odds.to_le_bytes());
        hasher.update(&salt.to_le_bytes());
        hasher.finalize().to_hex().as_str()[..12].to_string()
    }
}

// ─── Stored (loosely-typed) shape ───────────────────────────────────

/// A leg as stored; missing text degrades to an empty string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLeg {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub bet: Option<String>,
}

/// A pick exactly as it may appear in a store or import file.
///
/// Odds and timestamps may be numbers or numeric strings; very old records
/// carry a single top-level `event`/`bet` pair instead of `matches`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPick {
    #[serde(default)]
    pub id: Option<String>,
    pub date: String,
    #[serde(default, alias = "legs")]
    pub matches: Option<Vec<RawLeg>>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub bet: Option<String>,
    #[serde(default)]
    pub odds: serde_json::Value,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(alias = "plan")]
    pub source: String,
    #[serde(default)]
    pub ts: serde_json::Value,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

const LEGACY_PLACEHOLDER: &str = "---";

impl TryFrom<RawPick> for Pick {
    type Error = PickError;

    fn try_from(raw: RawPick) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(raw.date.trim(), "%Y-%m-%d")
            .map_err(|_| PickError::InvalidDate(raw.date.clone()))?;
        let plan: Plan = raw.source.parse()?;
        let odds = numeric(&raw.odds).ok_or_else(|| PickError::InvalidOdds(raw.odds.to_string()))?;

        let legs = match raw.matches {
            Some(matches) => matches
                .into_iter()
                .map(|m| Leg::new(m.event.unwrap_or_default(), m.bet.unwrap_or_default()))
                .collect(),
            None => vec![Leg::new(
                raw.event.unwrap_or_else(|| LEGACY_PLACEHOLDER.to_string()),
                raw.bet.unwrap_or_else(|| LEGACY_PLACEHOLDER.to_string()),
            )],
        };

        let ts = numeric(&raw.ts).map(|t| t as i64).unwrap_or(0);
        let id = match raw.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => Pick::content_id(date, plan, &legs, odds, ts as u64),
        };

        let mut pick = Pick::new(id, date, legs, odds, raw.result.unwrap_or_default(), plan, ts)?;
        pick.metadata = raw.metadata.unwrap_or_default();
        Ok(pick)
    }
}

/// Accept a JSON number or a numeric string.
fn numeric(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_rejects_empty_legs() {
        let err = Pick::new("a", date(2024, 1, 1), vec![], 2.0, "WIN", Plan::Elite, 0).unwrap_err();
        assert_eq!(err, PickError::EmptyLegs);
    }

    #[test]
    fn new_rejects_non_positive_odds() {
        let legs = vec![Leg::new("A v B", "Over 2.5")];
        assert!(Pick::new("a", date(2024, 1, 1), legs.clone(), 0.0, "WIN", Plan::Elite, 0).is_err());
        assert!(Pick::new("a", date(2024, 1, 1), legs, f64::NAN, "WIN", Plan::Elite, 0).is_err());
    }

    #[test]
    fn deserializes_stored_record() {
        let json = r#"{
            "id": "abc",
            "date": "2024-03-09",
            "matches": [{"event": "Arsenal v Spurs", "bet": "Over 2.25"}],
            "odds": 1.95,
            "result": "WIN",
            "source": "ELITE",
            "ts": 1710000000000
        }"#;
        let pick: Pick = serde_json::from_str(json).unwrap();
        assert_eq!(pick.id, "abc");
        assert_eq!(pick.plan, Plan::Elite);
        assert_eq!(pick.first_bet(), "Over 2.25");
        assert_eq!(pick.ts, 1_710_000_000_000);
    }

    #[test]
    fn accepts_string_odds_and_missing_id() {
        let json = r#"{"date": "2024-03-09", "matches": [{"event": "A", "bet": "1"}],
                       "odds": "2.10", "result": "LOSS", "source": "premium"}"#;
        let pick: Pick = serde_json::from_str(json).unwrap();
        assert!((pick.odds - 2.10).abs() < 1e-12);
        assert_eq!(pick.id.len(), 12);
        assert_eq!(pick.plan, Plan::Premium);
    }

    #[test]
    fn migrates_legacy_single_leg_record() {
        let json = r#"{"date": "2023-12-01", "event": "Old match", "odds": 1.8,
                       "result": "PENDING", "source": "STANDARD"}"#;
        let pick: Pick = serde_json::from_str(json).unwrap();
        assert_eq!(pick.legs, vec![Leg::new("Old match", "---")]);
        assert!(pick.is_pending());
    }

    #[test]
    fn rejects_bad_date_and_plan() {
        let bad_date = r#"{"date": "09/03/2024", "matches": [{"event":"A","bet":"B"}], "odds": 2, "source": "ELITE"}"#;
        assert!(serde_json::from_str::<Pick>(bad_date).is_err());
        let bad_plan = r#"{"date": "2024-03-09", "matches": [{"event":"A","bet":"B"}], "odds": 2, "source": "VIP"}"#;
        assert!(serde_json::from_str::<Pick>(bad_plan).is_err());
    }

    #[test]
    fn serialization_round_trips() {
        let pick = Pick::new(
            "x1",
            date(2024, 5, 1),
            vec![Leg::new("A v B", "BTTS"), Leg::new("C v D", "1")],
            3.4,
            "HALF WIN",
            Plan::Personal,
            42,
        )
        .unwrap();
        let json = serde_json::to_string(&pick).unwrap();
        assert!(json.contains("\"matches\""));
        assert!(json.contains("\"source\":\"PERSONAL\""));
        let back: Pick = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pick);
    }

    #[test]
    fn content_id_is_deterministic_and_salted() {
        let legs = vec![Leg::new("A", "B")];
        let d = date(2024, 1, 1);
        let a = Pick::content_id(d, Plan::Elite, &legs, 2.0, 1);
        let b = Pick::content_id(d, Plan::Elite, &legs, 2.0, 1);
        let c = Pick::content_id(d, Plan::Elite, &legs, 2.0, 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
