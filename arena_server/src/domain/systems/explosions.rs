use super::{bombs, players};
use crate::domain::grid::ArenaGrid;
use crate::domain::schedule::Timer;
use crate::domain::state::{ArenaEvent, EntityKind, SimExplosion};
use crate::domain::world::World;
use crate::domain::{Cell, Direction, EntityId};
use std::collections::BTreeSet;

/// Cells a blast of `range` covers from `origin`.
///
/// Each arm stops *before* the first wall it meets, so wall cells are never
/// part of the result. Bombs and players don't block propagation.
pub fn blast_cells(grid: &ArenaGrid, origin: Cell, range: u8) -> BTreeSet<Cell> {
    let mut cells = BTreeSet::from([origin]);
    for dir in Direction::ALL {
        for distance in 1..=range as i32 {
            let next = origin.offset(dir, distance);
            if grid.is_wall(next) {
                break;
            }
            cells.insert(next);
        }
    }
    cells
}

/// Applies a blast: kills live players in range and chain-detonates bombs.
///
/// Lethality is evaluated right here; the explosion record kept afterwards
/// only exists for presentation. Returns every cell hit, including those of
/// chained bombs.
pub fn explode(world: &mut World, origin: Cell, range: u8) -> BTreeSet<Cell> {
    let cells = blast_cells(&world.grid, origin, range);

    let id = world.alloc_id();
    let ttl = world.tuning.bomb.explosion_ttl;
    world.explosions.insert(
        id,
        SimExplosion {
            id,
            origin,
            cells: cells.clone(),
            expires_at: world.now + ttl as f64,
        },
    );
    world.schedule_in(ttl, Timer::ExplosionExpired { explosion_id: id });
    world.emit(ArenaEvent::EntitySpawned {
        kind: EntityKind::Explosion,
        id,
        position: origin,
    });

    let mut affected = cells.clone();
    for cell in cells {
        for player_id in world.players_at(cell) {
            players::kill_player(world, player_id);
        }
        // Recursion ends because every bomb detonates at most once.
        if let Some(bomb_id) = world.grid.bomb_at(cell) {
            affected.extend(bombs::detonate(world, bomb_id));
        }
    }
    affected
}

/// Explosion TTL handler.
pub fn expire(world: &mut World, explosion_id: EntityId) {
    if world.explosions.remove(&explosion_id).is_some() {
        world.emit(ArenaEvent::EntityDespawned { id: explosion_id });
    }
}
