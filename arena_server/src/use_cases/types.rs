// Use-case level inputs/outputs for the match loop.

use crate::domain::{ArenaEvent, Cell, Direction, MatchSnapshot, Phase, PlayerId};

/// Everything that can be asked of a running match, in issue order.
#[derive(Debug, Clone)]
pub enum MatchCommand {
    Join {
        player_id: PlayerId,
        display_name: String,
    },
    Leave {
        player_id: PlayerId,
    },
    Move {
        player_id: PlayerId,
        direction: Direction,
    },
    /// Cell resolved by the external motion collaborator.
    Position {
        player_id: PlayerId,
        cell: Cell,
    },
    PlaceBomb {
        player_id: PlayerId,
    },
    StartMatch,
    Reset,
}

/// Per-tick diff produced by the match loop.
#[derive(Debug, Clone)]
pub struct MatchUpdate {
    pub tick: u64,
    pub phase: Phase,
    pub clock: f32,
    pub events: Vec<ArenaEvent>,
    /// Present when clients must drop their view and rebuild it (after a reset).
    pub snapshot: Option<MatchSnapshot>,
}
