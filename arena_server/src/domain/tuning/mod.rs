// Gameplay tuning, kept apart from runtime/server configuration.

pub mod arena;
pub mod bomb;
pub mod player;

use arena::ArenaTuning;
use bomb::BombTuning;
use player::PlayerTuning;

/// Everything a match needs to know about its rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchTuning {
    pub arena: ArenaTuning,
    pub bomb: BombTuning,
    pub player: PlayerTuning,
}
