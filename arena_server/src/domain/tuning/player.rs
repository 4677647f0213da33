// Gameplay tuning for players.

/// Hard ceiling for simultaneous bombs per player.
pub const MAX_BOMBS: u8 = 6;
/// Hard ceiling for explosion range.
pub const MAX_RANGE: u8 = 6;
/// Hard ceiling for speed upgrades.
pub const MAX_SPEED_LEVEL: u8 = 5;

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Seconds a dead player waits before respawning.
    pub respawn_delay: f32,

    /// Seconds the rare-item boost lasts.
    pub rare_mode_duration: f32,

    /// Score lost on every death.
    pub death_penalty: i32,

    /// Random draws tried when looking for a safe respawn cell.
    pub spawn_attempts: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            respawn_delay: 3.0,
            rare_mode_duration: 5.0,
            death_penalty: 10,
            spawn_attempts: 20,
        }
    }
}
