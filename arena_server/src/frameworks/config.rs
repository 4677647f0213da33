use crate::domain::tuning::MatchTuning;
use std::{env, str::FromStr, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub const COMMAND_CHANNEL_CAPACITY: usize = 1024;
pub const UPDATE_BROADCAST_CAPACITY: usize = 128;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);

pub const DEFAULT_MATCH_ID: &str = "test";

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

pub fn http_port() -> u16 {
    env_parse("ARENA_SERVER_PORT").unwrap_or(3001)
}

/// Fixed seed for every match; unset means a fresh seed per match.
pub fn match_seed() -> Option<u64> {
    env_parse("MATCH_SEED")
}

/// Default rules with `MATCH_DURATION_SECS` / `SUDDEN_DEATH_SECS` applied.
pub fn match_tuning() -> MatchTuning {
    let mut tuning = MatchTuning::default();
    if let Some(secs) = env_parse::<f32>("MATCH_DURATION_SECS").filter(|s| *s > 0.0) {
        tuning.arena.game_duration = secs;
    }
    if let Some(secs) = env_parse::<f32>("SUDDEN_DEATH_SECS").filter(|s| *s >= 0.0) {
        tuning.arena.sudden_death_time = secs;
    }
    tuning
}
