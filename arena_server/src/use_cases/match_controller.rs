// Phase machine for one match: Lobby -> Active -> SuddenDeath -> Ended.

use super::types::{MatchCommand, MatchUpdate};
use crate::domain::state::{BombSnapshot, ExplosionSnapshot, ItemSnapshot, PlayerSnapshot};
use crate::domain::systems::{bombs, coins, players, shrink, timers};
use crate::domain::tuning::MatchTuning;
use crate::domain::{ArenaEvent, MatchSnapshot, Phase, RejectedAction, Winner, World};
use tracing::{debug, info};

/// Owns a match's world and advances it one tick at a time.
///
/// Nothing here is shared: the loop task holds the only instance, so several
/// matches can run side by side without coordination.
pub struct MatchController {
    phase: Phase,
    clock: f32,
    sudden_death_started: bool,
    resync: bool,
    tick: u64,
    world: World,
}

impl MatchController {
    pub fn new(tuning: MatchTuning, seed: u64) -> Self {
        Self {
            phase: Phase::Lobby,
            clock: tuning.arena.game_duration,
            sudden_death_started: false,
            resync: false,
            tick: 0,
            world: World::new(tuning, seed),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Remaining match time in seconds; frozen at 0 once ended.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Applies one command. Rejections leave the match untouched.
    pub fn handle_command(&mut self, command: MatchCommand) -> Result<(), RejectedAction> {
        let result = match command {
            MatchCommand::Join {
                player_id,
                display_name,
            } => players::join(&mut self.world, player_id, display_name).map(drop),
            MatchCommand::Leave { player_id } => {
                if players::leave(&mut self.world, player_id) {
                    Ok(())
                } else {
                    Err(RejectedAction::UnknownPlayer)
                }
            }
            MatchCommand::Move {
                player_id,
                direction,
            } => players::step(&mut self.world, player_id, direction).map(drop),
            MatchCommand::Position { player_id, cell } => {
                players::report_position(&mut self.world, player_id, cell)
            }
            MatchCommand::PlaceBomb { player_id } => {
                if self.phase == Phase::Ended {
                    Err(RejectedAction::WrongPhase)
                } else {
                    bombs::place_bomb(&mut self.world, player_id).map(drop)
                }
            }
            MatchCommand::StartMatch => self.start(),
            MatchCommand::Reset => self.reset(),
        };

        result.inspect_err(|reason| debug!(?reason, "command rejected"))
    }

    /// Moves simulation time forward by `dt` seconds and returns what changed.
    pub fn advance(&mut self, dt: f32) -> MatchUpdate {
        self.world.now += dt as f64;

        if matches!(self.phase, Phase::Active | Phase::SuddenDeath) {
            self.clock = (self.clock - dt).max(0.0);
            if !self.sudden_death_started
                && self.clock <= self.world.tuning.arena.sudden_death_time
            {
                self.begin_sudden_death();
            }
            if self.clock <= 0.0 {
                self.end();
            }
        }

        timers::run_due_timers(&mut self.world);
        bombs::refresh_solidity(&mut self.world);

        self.tick += 1;
        let snapshot = std::mem::take(&mut self.resync).then(|| self.snapshot());
        MatchUpdate {
            tick: self.tick,
            phase: self.phase,
            clock: self.clock,
            events: self.world.take_events(),
            snapshot,
        }
    }

    /// Full visible state, for late joiners and clients that fell behind.
    pub fn snapshot(&self) -> MatchSnapshot {
        let w = &self.world;
        MatchSnapshot {
            phase: self.phase,
            clock: self.clock,
            bounds: w.bounds,
            players: w
                .players
                .iter()
                .map(|p| PlayerSnapshot::new(p, w.scores.score(p.id).unwrap_or(0)))
                .collect(),
            bombs: w
                .bombs
                .values()
                .map(|b| BombSnapshot::new(b, w.now))
                .collect(),
            items: w
                .grid
                .coins()
                .map(|(position, id, kind)| ItemSnapshot { id, kind, position })
                .collect(),
            explosions: w
                .explosions
                .values()
                .map(|e| ExplosionSnapshot::new(e, w.now))
                .collect(),
            walls: w.grid.walls().collect(),
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.world.emit(ArenaEvent::PhaseChanged {
            phase,
            clock: self.clock,
        });
        info!(?phase, clock = self.clock, "phase changed");
    }

    fn start(&mut self) -> Result<(), RejectedAction> {
        if self.phase != Phase::Lobby {
            return Err(RejectedAction::WrongPhase);
        }

        self.clock = self.world.tuning.arena.game_duration;
        self.sudden_death_started = false;
        self.set_phase(Phase::Active);
        coins::start(&mut self.world);
        Ok(())
    }

    fn begin_sudden_death(&mut self) {
        self.sudden_death_started = true;
        coins::stop(&mut self.world);
        shrink::start(&mut self.world);
        self.set_phase(Phase::SuddenDeath);
    }

    fn end(&mut self) {
        self.clock = 0.0;
        coins::stop(&mut self.world);
        shrink::stop(&mut self.world);
        coins::despawn_all(&mut self.world);

        let event = match self.world.scores.declare_winner() {
            Winner::Player(entry) => {
                info!(
                    player_id = entry.player_id,
                    display_name = %entry.display_name,
                    score = entry.score,
                    "winner declared"
                );
                ArenaEvent::WinnerDeclared {
                    player_id: Some(entry.player_id),
                    display_name: Some(entry.display_name),
                    score: entry.score,
                }
            }
            Winner::NoPlayers => {
                info!("match ended without players");
                ArenaEvent::WinnerDeclared {
                    player_id: None,
                    display_name: None,
                    score: 0,
                }
            }
        };
        self.world.emit(event);
        self.set_phase(Phase::Ended);
    }

    /// Clears the arena and returns every player to base stats in the lobby.
    fn reset(&mut self) -> Result<(), RejectedAction> {
        if self.phase != Phase::Ended {
            return Err(RejectedAction::WrongPhase);
        }

        let w = &mut self.world;
        coins::stop(w);
        shrink::stop(w);
        w.timers.clear();
        w.grid.clear();
        w.bombs.clear();
        w.explosions.clear();
        w.bounds = w.tuning.arena.bounds;
        w.scores.reset_scores();

        let ids: Vec<_> = w.players.iter().map(|p| p.id).collect();
        for player_id in ids {
            let cell = players::safe_spawn_cell(w);
            w.with_player(player_id, |p| p.reset(cell));
        }

        self.clock = self.world.tuning.arena.game_duration;
        self.sudden_death_started = false;
        self.resync = true;
        self.set_phase(Phase::Lobby);
        Ok(())
    }
}
