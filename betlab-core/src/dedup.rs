//! Deduplication of the pick log.
//!
//! Two picks are duplicates when they share a canonical key: date, plan,
//! the sorted set of `event-bet` legs (trimmed, lowercased) and the odds at
//! two decimals. The first occurrence keeps its position; a later settled
//! duplicate replaces a PENDING one in place.

use std::collections::HashMap;
use tracing::info;

use crate::domain::Pick;

/// Canonical identity of a pick for duplicate detection.
pub fn canonical_key(pick: &Pick) -> String {
    let mut legs: Vec<String> = pick
        .legs
        .iter()
        .map(|l| {
            format!(
                "{}-{}",
                l.event.trim().to_lowercase(),
                l.bet.trim().to_lowercase()
            )
        })
        .collect();
    legs.sort();
    format!(
        "{}-{}-{}-{:.2}",
        pick.date,
        pick.plan.as_str(),
        legs.join("|"),
        pick.odds
    )
}

/// Outcome of a dedup pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Dedup {
    pub picks: Vec<Pick>,
    pub removed: usize,
}

/// Collapse duplicates, preserving first-appearance order.
pub fn dedup(picks: Vec<Pick>) -> Dedup {
    let original = picks.len();
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(original);
    let mut kept: Vec<Pick> = Vec::with_capacity(original);

    for pick in picks {
        let key = canonical_key(&pick);
        match slots.get(&key) {
            Some(&idx) => {
                if kept[idx].is_pending() && !pick.is_pending() {
                    kept[idx] = pick;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(pick);
            }
        }
    }

    let removed = original - kept.len();
    if removed > 0 {
        info!(removed, remaining = kept.len(), "removed duplicate picks");
    }
    Dedup {
        picks: kept,
        removed,
    }
}
