use super::{bombs, coins, players};
use crate::domain::schedule::Timer;
use crate::domain::state::{ArenaEvent, EntityKind};
use crate::domain::world::World;
use crate::domain::{ArenaBounds, Cell};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    fn next(self) -> Self {
        match self {
            Side::Top => Side::Right,
            Side::Right => Side::Bottom,
            Side::Bottom => Side::Left,
            Side::Left => Side::Top,
        }
    }
}

/// Sudden-death spiral: yields wall cells ring by ring, clockwise from the
/// top-left corner, until the arena is no larger than `target` on both axes.
///
/// A side is walked only while its axis is still above `target`, so the
/// bounds never invert. Every side walked shrinks one axis by one, which
/// bounds the number of cells yielded.
#[derive(Debug, Clone)]
pub struct SpiralShrink {
    bounds: ArenaBounds,
    target: i32,
    side: Side,
    // Position along the current side; `None` between sides.
    cursor: Option<i32>,
    finished: bool,
}

impl SpiralShrink {
    pub fn new(bounds: ArenaBounds, target: i32) -> Self {
        Self {
            bounds,
            target: target.max(0),
            side: Side::Top,
            cursor: None,
            finished: false,
        }
    }

    /// Open area left inside the walls placed so far.
    pub fn bounds(&self) -> ArenaBounds {
        self.bounds
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn side_applies(&self, side: Side) -> bool {
        match side {
            Side::Top | Side::Bottom => self.bounds.height() > self.target,
            Side::Right | Side::Left => self.bounds.width() > self.target,
        }
    }

    // (start, end, step) along the side's walking axis.
    fn walk(&self, side: Side) -> (i32, i32, i32) {
        let b = self.bounds;
        match side {
            Side::Top => (b.min_x, b.max_x, 1),
            Side::Right => (b.max_y, b.min_y, -1),
            Side::Bottom => (b.max_x, b.min_x, -1),
            Side::Left => (b.min_y, b.max_y, 1),
        }
    }

    fn cell_on(&self, side: Side, at: i32) -> Cell {
        let b = self.bounds;
        match side {
            Side::Top => Cell::new(at, b.max_y),
            Side::Right => Cell::new(b.max_x, at),
            Side::Bottom => Cell::new(at, b.min_y),
            Side::Left => Cell::new(b.min_x, at),
        }
    }

    fn close_side(&mut self) {
        match self.side {
            Side::Top => self.bounds.max_y -= 1,
            Side::Right => self.bounds.max_x -= 1,
            Side::Bottom => self.bounds.min_y += 1,
            Side::Left => self.bounds.min_x += 1,
        }
        self.side = self.side.next();
        self.cursor = None;
    }
}

impl Iterator for SpiralShrink {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if self.finished {
            return None;
        }

        if self.cursor.is_none() {
            if self.bounds.width() <= self.target && self.bounds.height() <= self.target {
                self.finished = true;
                return None;
            }
            // At least one axis is above target, so this finds a side within four turns.
            while !self.side_applies(self.side) {
                self.side = self.side.next();
            }
            self.cursor = Some(self.walk(self.side).0);
        }

        let at = self.cursor?;
        let (_, end, step) = self.walk(self.side);
        let cell = self.cell_on(self.side, at);
        if at == end {
            self.close_side();
        } else {
            self.cursor = Some(at + step);
        }
        Some(cell)
    }
}

/// Begins sudden death from the current bounds. The first wall drops at once.
pub fn start(world: &mut World) {
    if world.shrink.is_some() {
        return;
    }
    let target = world.tuning.arena.final_arena_size;
    world.shrink = Some(SpiralShrink::new(world.bounds, target));
    world.schedule_in(0.0, Timer::ShrinkStep);
    info!(target, "sudden death started");
}

pub fn stop(world: &mut World) {
    world.shrink = None;
}

/// Shrink timer handler: place the next wall and queue the following one.
pub fn shrink_step(world: &mut World) {
    let Some(spiral) = world.shrink.as_mut() else {
        return;
    };

    let Some(cell) = spiral.next() else {
        world.shrink = None;
        info!("final arena reached");
        return;
    };
    let bounds = spiral.bounds();

    place_wall(world, cell);
    world.bounds = bounds;
    let delay = world.tuning.arena.wall_step_delay;
    world.schedule_in(delay, Timer::ShrinkStep);
}

/// Drops a permanent wall, clearing the cell first: items are removed, bombs
/// detonate and players standing there die.
pub fn place_wall(world: &mut World, cell: Cell) {
    coins::destroy_at(world, cell);
    if let Some(bomb_id) = world.grid.bomb_at(cell) {
        bombs::detonate(world, bomb_id);
    }
    for player_id in world.players_at(cell) {
        players::kill_player(world, player_id);
    }

    if world.grid.insert_wall(cell) {
        let id = world.alloc_id();
        world.emit(ArenaEvent::EntitySpawned {
            kind: EntityKind::Wall,
            id,
            position: cell,
        });
        debug!(x = cell.x, y = cell.y, "wall placed");
    }
}
