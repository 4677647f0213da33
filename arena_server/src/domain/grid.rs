// Arena coordinates and the occupancy index for walls, bombs and coins.

use super::{EntityId, ItemKind};
use std::collections::{BTreeMap, BTreeSet};

/// Integer cell on the arena grid. `y` grows upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction, distance: i32) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x.saturating_add(dx.saturating_mul(distance)),
            y: self.y.saturating_add(dy.saturating_mul(distance)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Inclusive rectangle of playable cells.
///
/// Width and height are measured as `max - min`, so a 21x21 block of cells
/// reports a width of 20.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl ArenaBounds {
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, cell: Cell) -> bool {
        (self.min_x..=self.max_x).contains(&cell.x) && (self.min_y..=self.max_y).contains(&cell.y)
    }

    pub fn center(&self) -> Cell {
        Cell::new(
            self.min_x + self.width() / 2,
            self.min_y + self.height() / 2,
        )
    }
}

/// Occupancy of the play-field.
///
/// Players are not tracked here; they live in the match world and are looked
/// up by cell when needed.
#[derive(Debug, Default)]
pub struct ArenaGrid {
    walls: BTreeSet<Cell>,
    bombs: BTreeMap<Cell, EntityId>,
    coins: BTreeMap<Cell, (EntityId, ItemKind)>,
}

impl ArenaGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_wall(&self, cell: Cell) -> bool {
        self.walls.contains(&cell)
    }

    /// Returns false if the cell already holds a wall.
    pub fn insert_wall(&mut self, cell: Cell) -> bool {
        self.walls.insert(cell)
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    pub fn walls(&self) -> impl Iterator<Item = Cell> + '_ {
        self.walls.iter().copied()
    }

    pub fn bomb_at(&self, cell: Cell) -> Option<EntityId> {
        self.bombs.get(&cell).copied()
    }

    pub fn insert_bomb(&mut self, cell: Cell, bomb_id: EntityId) {
        self.bombs.insert(cell, bomb_id);
    }

    pub fn remove_bomb(&mut self, cell: Cell, bomb_id: EntityId) {
        // Only clear the slot if it still belongs to this bomb.
        if self.bombs.get(&cell) == Some(&bomb_id) {
            self.bombs.remove(&cell);
        }
    }

    pub fn coin_at(&self, cell: Cell) -> Option<(EntityId, ItemKind)> {
        self.coins.get(&cell).copied()
    }

    pub fn insert_coin(&mut self, cell: Cell, coin_id: EntityId, kind: ItemKind) {
        self.coins.insert(cell, (coin_id, kind));
    }

    pub fn remove_coin(&mut self, cell: Cell) -> Option<(EntityId, ItemKind)> {
        self.coins.remove(&cell)
    }

    /// Removes every coin, returning their ids.
    pub fn drain_coins(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.coins)
            .into_values()
            .map(|(id, _)| id)
            .collect()
    }

    pub fn coins(&self) -> impl Iterator<Item = (Cell, EntityId, ItemKind)> + '_ {
        self.coins.iter().map(|(cell, (id, kind))| (*cell, *id, *kind))
    }

    /// True when nothing static occupies the cell (wall, bomb or coin).
    pub fn is_free(&self, cell: Cell) -> bool {
        !self.walls.contains(&cell) && !self.bombs.contains_key(&cell) && !self.coins.contains_key(&cell)
    }

    pub fn clear(&mut self) {
        self.walls.clear();
        self.bombs.clear();
        self.coins.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_measure_distance_between_edges() {
        let bounds = ArenaBounds {
            min_x: -10,
            max_x: 10,
            min_y: -4,
            max_y: 4,
        };

        assert_eq!(bounds.width(), 20);
        assert_eq!(bounds.height(), 8);
        assert_eq!(bounds.center(), Cell::new(0, 0));
        assert!(bounds.contains(Cell::new(10, -4)));
        assert!(!bounds.contains(Cell::new(11, 0)));
    }

    #[test]
    fn offset_clamps_at_the_integer_edge() {
        let edge = Cell::new(i32::MAX, i32::MIN);
        assert_eq!(edge.offset(Direction::Right, 3), edge);
        assert_eq!(edge.offset(Direction::Down, 3), edge);
        assert_eq!(
            edge.offset(Direction::Left, 2),
            Cell::new(i32::MAX - 2, i32::MIN)
        );
    }

    #[test]
    fn remove_bomb_ignores_stale_ids() {
        let mut grid = ArenaGrid::new();
        let cell = Cell::new(1, 1);
        grid.insert_bomb(cell, 7);

        grid.remove_bomb(cell, 3);
        assert_eq!(grid.bomb_at(cell), Some(7));

        grid.remove_bomb(cell, 7);
        assert_eq!(grid.bomb_at(cell), None);
    }

    #[test]
    fn walls_coins_and_bombs_all_occupy_a_cell() {
        let mut grid = ArenaGrid::new();
        let a = Cell::new(0, 0);
        let b = Cell::new(1, 0);
        let c = Cell::new(2, 0);
        grid.insert_wall(a);
        grid.insert_bomb(b, 1);
        grid.insert_coin(c, 2, ItemKind::Score);

        assert!(!grid.is_free(a));
        assert!(!grid.is_free(b));
        assert!(!grid.is_free(c));
        assert!(grid.is_free(Cell::new(3, 0)));
        assert!(!grid.insert_wall(a));
    }
}
