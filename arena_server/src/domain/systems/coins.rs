use super::players;
use crate::domain::items::{LOOT_ROLL_MAX, roll_item};
use crate::domain::schedule::Timer;
use crate::domain::state::{ArenaEvent, EntityKind};
use crate::domain::world::World;
use crate::domain::{Cell, EntityId, PlayerId};
use rand::Rng;
use tracing::debug;

/// Periodic item spawner. Stopping it lets the pending tick lapse.
#[derive(Debug, Default)]
pub struct CoinSpawner {
    running: bool,
    // Incremented on every start so ticks from an earlier run are ignored.
    generation: u64,
}

impl CoinSpawner {
    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Starts spawning; the first item appears immediately.
pub fn start(world: &mut World) {
    if world.spawner.running {
        return;
    }
    world.spawner.running = true;
    world.spawner.generation += 1;
    let generation = world.spawner.generation;
    world.schedule_in(0.0, Timer::CoinSpawn { generation });
}

pub fn stop(world: &mut World) {
    world.spawner.running = false;
}

/// Spawn timer handler: place one item and queue the next attempt.
pub fn spawn_tick(world: &mut World, generation: u64) {
    if !world.spawner.running || world.spawner.generation != generation {
        return;
    }

    spawn_item(world);
    let interval = world.tuning.arena.spawn_interval;
    world.schedule_in(interval, Timer::CoinSpawn { generation });
}

/// Places one random item on a free cell, or skips if none was found.
pub fn spawn_item(world: &mut World) -> Option<EntityId> {
    let attempts = world.tuning.arena.spawn_attempts;
    let Some(cell) = world.find_free_cell(attempts) else {
        debug!(attempts, "no free cell for item; skipping cycle");
        return None;
    };

    let draw: f32 = world.rng.random_range(0.0..LOOT_ROLL_MAX);
    let kind = roll_item(draw);
    let id = world.alloc_id();
    world.grid.insert_coin(cell, id, kind);
    world.emit(ArenaEvent::EntitySpawned {
        kind: EntityKind::Item(kind),
        id,
        position: cell,
    });
    Some(id)
}

/// Picks up whatever item lies in `cell`.
pub fn collect(world: &mut World, player_id: PlayerId, cell: Cell) {
    let Some((id, kind)) = world.grid.remove_coin(cell) else {
        return;
    };
    world.emit(ArenaEvent::EntityDespawned { id });

    let delta = kind.score_delta();
    if delta != 0 {
        world.adjust_score(player_id, delta);
    }
    if let Some(upgrade) = kind.upgrade() {
        if let Err(reason) = players::apply_upgrade(world, player_id, upgrade) {
            debug!(player_id, ?upgrade, ?reason, "item effect not applied");
        }
    }
    debug!(player_id, item_id = id, ?kind, "item collected");
}

/// Removes an item without awarding it (used by walls).
pub fn destroy_at(world: &mut World, cell: Cell) {
    if let Some((id, _)) = world.grid.remove_coin(cell) {
        world.emit(ArenaEvent::EntityDespawned { id });
    }
}

pub fn despawn_all(world: &mut World) {
    for id in world.grid.drain_coins() {
        world.emit(ArenaEvent::EntityDespawned { id });
    }
}
