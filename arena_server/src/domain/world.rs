// Authoritative state of a single match, shared by all simulation systems.

use super::grid::ArenaGrid;
use super::player::PlayerState;
use super::schedule::{Scheduler, Timer};
use super::score::ScoreBoard;
use super::state::{ArenaEvent, SimBomb, SimExplosion};
use super::systems::coins::CoinSpawner;
use super::systems::shrink::SpiralShrink;
use super::tuning::MatchTuning;
use super::{ArenaBounds, Cell, EntityId, PlayerId};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::collections::BTreeMap;

/// Everything the systems read and write during a tick.
///
/// Only the match loop owns a `World`; no other task ever touches it.
pub struct World {
    pub tuning: MatchTuning,
    /// Simulation time in seconds. Keeps running in every phase.
    pub now: f64,
    /// Current playable area. Only the shrinker narrows it.
    pub bounds: ArenaBounds,
    pub grid: ArenaGrid,
    /// Join order is preserved so iteration is deterministic.
    pub players: Vec<PlayerState>,
    pub bombs: BTreeMap<EntityId, SimBomb>,
    pub explosions: BTreeMap<EntityId, SimExplosion>,
    pub scores: ScoreBoard,
    pub timers: Scheduler<Timer>,
    pub spawner: CoinSpawner,
    pub shrink: Option<SpiralShrink>,
    pub rng: Pcg32,

    events: Vec<ArenaEvent>,
    next_entity_id: EntityId,
}

impl World {
    pub fn new(tuning: MatchTuning, seed: u64) -> Self {
        Self {
            tuning,
            now: 0.0,
            bounds: tuning.arena.bounds,
            grid: ArenaGrid::new(),
            players: Vec::new(),
            bombs: BTreeMap::new(),
            explosions: BTreeMap::new(),
            scores: ScoreBoard::new(),
            timers: Scheduler::new(),
            spawner: CoinSpawner::default(),
            shrink: None,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_entity_id: 1,
        }
    }

    pub fn alloc_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    pub fn emit(&mut self, event: ArenaEvent) {
        self.events.push(event);
    }

    /// Hands over everything emitted since the last call.
    pub fn take_events(&mut self) -> Vec<ArenaEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn schedule_in(&mut self, delay: f32, timer: Timer) {
        self.timers.schedule(self.now + delay as f64, timer);
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Runs `f` on the player and emits a `StatChanged` for every replicated
    /// field it changed.
    pub fn with_player<R>(
        &mut self,
        player_id: PlayerId,
        f: impl FnOnce(&mut PlayerState) -> R,
    ) -> Option<R> {
        let player = self.players.iter_mut().find(|p| p.id == player_id)?;
        let before = player.sheet();
        let out = f(player);
        let changes = before.changes(&player.sheet());

        for (stat, value) in changes {
            self.events.push(ArenaEvent::StatChanged {
                player_id,
                stat,
                value,
            });
        }
        Some(out)
    }

    /// Live players standing in `cell`.
    pub fn players_at(&self, cell: Cell) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_alive() && p.cell == cell)
            .map(|p| p.id)
            .collect()
    }

    /// Routes a score delta through the ledger and reports real changes.
    pub fn adjust_score(&mut self, player_id: PlayerId, delta: i32) {
        let before = self.scores.score(player_id);
        let after = self.scores.adjust(player_id, delta);
        if let Some(score) = after.filter(|s| before != Some(*s)) {
            self.events
                .push(ArenaEvent::ScoreChanged { player_id, score });
        }
    }

    /// Walls, bombs, coins and live players all block spawning.
    pub fn is_obstructed(&self, cell: Cell) -> bool {
        !self.grid.is_free(cell) || self.players.iter().any(|p| p.is_alive() && p.cell == cell)
    }

    pub fn random_cell(&mut self) -> Cell {
        let b = self.bounds;
        Cell::new(
            self.rng.random_range(b.min_x..=b.max_x),
            self.rng.random_range(b.min_y..=b.max_y),
        )
    }

    /// Draws up to `attempts` random cells and returns the first free one.
    pub fn find_free_cell(&mut self, attempts: u32) -> Option<Cell> {
        for _ in 0..attempts {
            let cell = self.random_cell();
            if !self.is_obstructed(cell) {
                return Some(cell);
            }
        }
        None
    }
}
