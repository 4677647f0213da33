use crate::domain::ArenaBounds;

/// Gameplay tuning for the arena, the match clock and item spawning.
#[derive(Debug, Clone, Copy)]
pub struct ArenaTuning {
    /// Playable area at match start.
    pub bounds: ArenaBounds,

    /// Side length (as `max - min`) the sudden-death spiral shrinks down to.
    pub final_arena_size: i32,

    /// Seconds between consecutive sudden-death walls.
    pub wall_step_delay: f32,

    /// Match length in seconds.
    pub game_duration: f32,

    /// Remaining clock value at which sudden death begins.
    pub sudden_death_time: f32,

    /// Seconds between coin spawn attempts.
    pub spawn_interval: f32,

    /// Random cells tried per coin spawn before skipping the cycle.
    pub spawn_attempts: u32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            bounds: ArenaBounds {
                min_x: -10,
                max_x: 10,
                min_y: -10,
                max_y: 10,
            },
            final_arena_size: 15,
            wall_step_delay: 0.1,
            game_duration: 120.0,
            sudden_death_time: 40.0,
            spawn_interval: 1.0,
            spawn_attempts: 10,
        }
    }
}
