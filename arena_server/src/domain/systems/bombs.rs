use super::explosions;
use crate::domain::errors::RejectedAction;
use crate::domain::schedule::Timer;
use crate::domain::state::{ArenaEvent, EntityKind, SimBomb};
use crate::domain::world::World;
use crate::domain::{Cell, EntityId, PlayerId};
use std::collections::BTreeSet;
use tracing::debug;

/// Plants a bomb on the player's current cell.
pub fn place_bomb(world: &mut World, player_id: PlayerId) -> Result<EntityId, RejectedAction> {
    let player = world
        .player(player_id)
        .ok_or(RejectedAction::UnknownPlayer)?;
    if !player.is_alive() {
        return Err(RejectedAction::PlayerDead);
    }
    let cell = player.cell;
    if world.grid.bomb_at(cell).is_some() {
        return Err(RejectedAction::CellHasBomb);
    }

    // Range is copied now; upgrades picked up during the fuse don't apply.
    let range = world
        .with_player(player_id, |p| p.reserve_bomb())
        .ok_or(RejectedAction::UnknownPlayer)??;

    let id = world.alloc_id();
    let fuse_time = world.tuning.bomb.fuse_time;
    world.bombs.insert(
        id,
        SimBomb {
            id,
            owner_id: player_id,
            cell,
            range,
            fuse_deadline: world.now + fuse_time as f64,
            detonated: false,
            solid: false,
        },
    );
    world.grid.insert_bomb(cell, id);
    world.schedule_in(fuse_time, Timer::Fuse { bomb_id: id });
    world.emit(ArenaEvent::EntitySpawned {
        kind: EntityKind::Bomb {
            owner_id: player_id,
        },
        id,
        position: cell,
    });

    debug!(player_id, bomb_id = id, x = cell.x, y = cell.y, range, "bomb placed");
    Ok(id)
}

/// Detonates a bomb and everything it chains into.
///
/// Returns the union of cells hit by this bomb and any bomb it set off. A
/// bomb that already went off (or no longer exists) yields an empty set.
pub fn detonate(world: &mut World, bomb_id: EntityId) -> BTreeSet<Cell> {
    let Some(bomb) = world.bombs.get_mut(&bomb_id) else {
        return BTreeSet::new();
    };
    if bomb.detonated {
        return BTreeSet::new();
    }
    bomb.detonated = true;
    let (cell, range, owner_id) = (bomb.cell, bomb.range, bomb.owner_id);

    debug!(bomb_id, owner_id, x = cell.x, y = cell.y, "bomb detonated");
    let affected = explosions::explode(world, cell, range);

    // Owner may have left the match; then there is nobody to refund.
    world.with_player(owner_id, |p| p.release_bomb());

    world.bombs.remove(&bomb_id);
    world.grid.remove_bomb(cell, bomb_id);
    world.emit(ArenaEvent::EntityDespawned { id: bomb_id });
    affected
}

/// Fuse timer handler.
pub fn fuse_expired(world: &mut World, bomb_id: EntityId) {
    detonate(world, bomb_id);
}

/// Makes bombs solid once their owner is seen outside the bomb's cell.
pub fn refresh_solidity(world: &mut World) {
    for bomb in world.bombs.values_mut().filter(|b| !b.solid) {
        let owner_inside = world
            .players
            .iter()
            .any(|p| p.id == bomb.owner_id && p.cell == bomb.cell);
        if !owner_inside {
            bomb.solid = true;
        }
    }
}

/// Whether a walker may not enter `cell`.
pub fn blocks_movement(world: &World, cell: Cell) -> bool {
    if world.grid.is_wall(cell) {
        return true;
    }
    world
        .grid
        .bomb_at(cell)
        .and_then(|id| world.bombs.get(&id))
        .is_some_and(|b| b.solid)
}
