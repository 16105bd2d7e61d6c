//! Plans: the named capital pools a pick is staked from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::pick::PickError;

/// A named capital pool with its own bankroll and stake percentage.
///
/// The set is fixed; ordering follows declaration order so per-plan maps
/// iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Plan {
    Elite,
    Premium,
    Standard,
    Personal,
}

impl Plan {
    pub const ALL: [Plan; 4] = [Plan::Elite, Plan::Premium, Plan::Standard, Plan::Personal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Elite => "ELITE",
            Plan::Premium => "PREMIUM",
            Plan::Standard => "STANDARD",
            Plan::Personal => "PERSONAL",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = PickError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Plan::ALL
            .into_iter()
            .find(|p| p.as_str() == upper)
            .ok_or_else(|| PickError::UnknownPlan(s.trim().to_string()))
    }
}
