use super::{bombs, coins};
use crate::domain::errors::RejectedAction;
use crate::domain::items::Upgrade;
use crate::domain::player::{PlayerState, UpgradeOutcome};
use crate::domain::schedule::Timer;
use crate::domain::state::ArenaEvent;
use crate::domain::world::World;
use crate::domain::{Cell, Direction, PlayerId};
use tracing::{debug, info};

/// Adds a player at a safe cell and opens their score entry.
pub fn join(
    world: &mut World,
    player_id: PlayerId,
    display_name: impl Into<String>,
) -> Result<Cell, RejectedAction> {
    if world.player(player_id).is_some() {
        return Err(RejectedAction::AlreadyJoined);
    }

    let display_name = display_name.into();
    let cell = safe_spawn_cell(world);
    world
        .players
        .push(PlayerState::new(player_id, display_name.clone(), cell));
    world.scores.register(player_id, display_name.clone());
    world.emit(ArenaEvent::PlayerJoined {
        player_id,
        display_name,
        position: cell,
    });
    Ok(cell)
}

/// Removes a player. Their bombs stay armed.
pub fn leave(world: &mut World, player_id: PlayerId) -> bool {
    let before = world.players.len();
    world.players.retain(|p| p.id != player_id);
    if world.players.len() == before {
        return false;
    }

    world.scores.unregister(player_id);
    world.emit(ArenaEvent::PlayerLeft { player_id });
    true
}

/// Kills a live player: death penalty, rare mode cancelled, respawn queued.
pub fn kill_player(world: &mut World, player_id: PlayerId) {
    let Some(Some(life_epoch)) = world.with_player(player_id, |p| p.kill()) else {
        return;
    };

    let penalty = world.tuning.player.death_penalty;
    world.adjust_score(player_id, -penalty);
    let delay = world.tuning.player.respawn_delay;
    world.schedule_in(
        delay,
        Timer::Respawn {
            player_id,
            life_epoch,
        },
    );
    info!(player_id, "player died");
}

/// Respawn timer handler.
pub fn respawn(world: &mut World, player_id: PlayerId, life_epoch: u64) {
    if !world.player(player_id).is_some_and(|p| !p.is_alive()) {
        return;
    }

    let cell = safe_spawn_cell(world);
    let revived = world
        .with_player(player_id, |p| p.respawn(life_epoch, cell))
        .unwrap_or(false);
    if revived {
        world.emit(ArenaEvent::PlayerMoved {
            player_id,
            position: cell,
        });
        bombs::refresh_solidity(world);
        debug!(player_id, x = cell.x, y = cell.y, "player respawned");
    }
}

/// Applies an item effect. A rare boost schedules its own expiry.
pub fn apply_upgrade(
    world: &mut World,
    player_id: PlayerId,
    upgrade: Upgrade,
) -> Result<(), RejectedAction> {
    let outcome = world
        .with_player(player_id, |p| p.upgrade(upgrade))
        .ok_or(RejectedAction::UnknownPlayer)??;

    if let UpgradeOutcome::BoostStarted { epoch } = outcome {
        let duration = world.tuning.player.rare_mode_duration;
        world.schedule_in(duration, Timer::BoostExpired { player_id, epoch });
        info!(player_id, "rare mode activated");
    }
    Ok(())
}

/// Boost expiry timer handler.
pub fn end_boost(world: &mut World, player_id: PlayerId, epoch: u64) {
    let restored = world
        .with_player(player_id, |p| p.end_boost(epoch))
        .unwrap_or(false);
    if restored {
        info!(player_id, "rare mode ended");
    }
}

/// Accepts a cell resolved by the external motion collaborator. Cells outside
/// the initial arena and wall cells are refused.
pub fn report_position(
    world: &mut World,
    player_id: PlayerId,
    cell: Cell,
) -> Result<(), RejectedAction> {
    check_mobile(world, player_id)?;
    if !world.tuning.arena.bounds.contains(cell) || world.grid.is_wall(cell) {
        return Err(RejectedAction::Blocked);
    }
    enter_cell(world, player_id, cell);
    Ok(())
}

/// Moves one cell on the grid, refusing walls, solid bombs and the arena edge.
pub fn step(world: &mut World, player_id: PlayerId, dir: Direction) -> Result<Cell, RejectedAction> {
    let from = check_mobile(world, player_id)?;
    let to = from.offset(dir, 1);
    if !world.tuning.arena.bounds.contains(to) || bombs::blocks_movement(world, to) {
        return Err(RejectedAction::Blocked);
    }
    enter_cell(world, player_id, to);
    Ok(to)
}

fn check_mobile(world: &World, player_id: PlayerId) -> Result<Cell, RejectedAction> {
    let player = world
        .player(player_id)
        .ok_or(RejectedAction::UnknownPlayer)?;
    if !player.is_alive() {
        return Err(RejectedAction::PlayerDead);
    }
    Ok(player.cell)
}

fn enter_cell(world: &mut World, player_id: PlayerId, cell: Cell) {
    let moved = world
        .with_player(player_id, |p| std::mem::replace(&mut p.cell, cell) != cell)
        .unwrap_or(false);
    if !moved {
        return;
    }

    world.emit(ArenaEvent::PlayerMoved {
        player_id,
        position: cell,
    });
    bombs::refresh_solidity(world);
    coins::collect(world, player_id, cell);
}

/// A free cell inside the current bounds, or the arena centre if none turns up.
pub fn safe_spawn_cell(world: &mut World) -> Cell {
    let attempts = world.tuning.player.spawn_attempts;
    world
        .find_free_cell(attempts)
        .unwrap_or_else(|| world.bounds.center())
}
