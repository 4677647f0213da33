// Gameplay tuning for bombs and their explosions.

#[derive(Debug, Clone, Copy)]
pub struct BombTuning {
    /// Seconds between placement and automatic detonation.
    pub fuse_time: f32,

    /// Seconds an explosion stays visible. Lethality is not tied to this.
    pub explosion_ttl: f32,
}

impl Default for BombTuning {
    fn default() -> Self {
        Self {
            fuse_time: 2.0,
            explosion_ttl: 0.5,
        }
    }
}
