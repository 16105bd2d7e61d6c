//! Seeded synthetic pick logs for demos and benchmarks.
//!
//! The same `(count, seed, start)` always yields the same picks. Every pick
//! is tagged `synthetic: true` in its metadata.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use betlab_core::{Leg, Pick, Plan};

const TEAMS: [&str; 12] = [
    "Arsenal", "Benfica", "Celtic", "Dortmund", "Espanyol", "Feyenoord", "Galatasaray",
    "Hajduk", "Inter", "Juventus", "Lazio", "Monaco",
];

const BETS: [&str; 12] = [
    "Over 2.5", "Under 2.5", "Over 2.25", "Under 3.75", "Over 1.75", "BTTS", "1", "X2",
    "1X", "Corners Over 9.5", "Cards Over 4.5", "DNB 2",
];

/// Generate `count` picks from `start`, about three per day.
pub fn generate(count: usize, seed: u64, start: NaiveDate) -> Vec<Pick> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picks = Vec::with_capacity(count);

    for i in 0..count {
        let date = start + Duration::days((i / 3) as i64);
        let plan = Plan::ALL[rng.gen_range(0..Plan::ALL.len())];
        let n_legs = if rng.gen_bool(0.1) { rng.gen_range(2..=3) } else { 1 };
        let legs: Vec<Leg> = (0..n_legs).map(|_| random_leg(&mut rng)).collect();
        let odds = (rng.gen_range(1.3..3.6_f64) * 100.0).round() / 100.0;
        let result = random_result(&mut rng, &legs[0].bet, odds);

        let id = Pick::content_id(date, plan, &legs, odds, i as u64);
        if let Ok(mut pick) = Pick::new(id, date, legs, odds, result, plan, i as i64) {
            pick.metadata.insert("synthetic".into(), serde_json::Value::Bool(true));
            picks.push(pick);
        }
    }
    picks
}

fn random_leg(rng: &mut StdRng) -> Leg {
    let home = rng.gen_range(0..TEAMS.len());
    let away = (home + rng.gen_range(1..TEAMS.len())) % TEAMS.len();
    let bet = BETS[rng.gen_range(0..BETS.len())];
    Leg::new(format!("{} v {}", TEAMS[home], TEAMS[away]), bet)
}

/// Goal lines settle from a scoreline; everything else from a token.
/// The win probability sits slightly above the implied price.
fn random_result(rng: &mut StdRng, bet: &str, odds: f64) -> String {
    if rng.gen_bool(0.02) {
        return "VOID".into();
    }
    let is_goal_line = bet.starts_with("Over") || bet.starts_with("Under");
    if is_goal_line && rng.gen_bool(0.6) {
        return format!("{}-{}", rng.gen_range(0..4), rng.gen_range(0..4));
    }
    let p_win = (1.05 / odds).clamp(0.05, 0.95);
    if rng.gen_bool(p_win) { "WIN" } else { "LOSS" }.into()
}
