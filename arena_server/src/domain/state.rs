// Domain-level simulation entities, outbound events and snapshot types.

use super::player::{PlayerState, Stat};
use super::{ArenaBounds, Cell, ItemKind};
use std::collections::BTreeSet;

pub type PlayerId = u64;
pub type EntityId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    Active,
    SuddenDeath,
    Ended,
}

#[derive(Debug, Clone)]
pub struct SimBomb {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub cell: Cell,
    // Captured at placement; later upgrades do not change it.
    pub range: u8,
    pub fuse_deadline: f64,
    pub detonated: bool,
    // Becomes true once the owner has stepped off; never reverts.
    pub solid: bool,
}

#[derive(Debug, Clone)]
pub struct SimExplosion {
    pub id: EntityId,
    pub origin: Cell,
    pub cells: BTreeSet<Cell>,
    pub expires_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Bomb { owner_id: PlayerId },
    Explosion,
    Item(ItemKind),
    Wall,
}

/// Facts emitted by the simulation for replication and presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum ArenaEvent {
    EntitySpawned {
        kind: EntityKind,
        id: EntityId,
        position: Cell,
    },
    EntityDespawned {
        id: EntityId,
    },
    PlayerJoined {
        player_id: PlayerId,
        display_name: String,
        position: Cell,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    PlayerMoved {
        player_id: PlayerId,
        position: Cell,
    },
    StatChanged {
        player_id: PlayerId,
        stat: Stat,
        value: i32,
    },
    ScoreChanged {
        player_id: PlayerId,
        score: u32,
    },
    PhaseChanged {
        phase: Phase,
        clock: f32,
    },
    WinnerDeclared {
        player_id: Option<PlayerId>,
        display_name: Option<String>,
        score: u32,
    },
}

#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub display_name: String,
    pub position: Cell,
    pub alive: bool,
    pub speed_level: u8,
    pub max_bombs: u8,
    pub explosion_range: u8,
    pub active_bombs: u8,
    pub rare_mode: bool,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct BombSnapshot {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub position: Cell,
    pub range: u8,
    pub solid: bool,
    pub fuse_remaining: f32,
}

#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub id: EntityId,
    pub kind: ItemKind,
    pub position: Cell,
}

#[derive(Debug, Clone)]
pub struct ExplosionSnapshot {
    pub id: EntityId,
    pub origin: Cell,
    pub cells: Vec<Cell>,
    pub ttl_remaining: f32,
}

/// Full visible state of one match, used for late joiners and lag recovery.
#[derive(Debug, Clone)]
pub struct MatchSnapshot {
    pub phase: Phase,
    pub clock: f32,
    pub bounds: ArenaBounds,
    pub players: Vec<PlayerSnapshot>,
    pub bombs: Vec<BombSnapshot>,
    pub items: Vec<ItemSnapshot>,
    pub explosions: Vec<ExplosionSnapshot>,
    pub walls: Vec<Cell>,
}

impl PlayerSnapshot {
    pub fn new(p: &PlayerState, score: u32) -> Self {
        Self {
            id: p.id,
            display_name: p.display_name.clone(),
            position: p.cell,
            alive: p.is_alive(),
            speed_level: p.effective_speed_level(),
            max_bombs: p.max_bombs(),
            explosion_range: p.explosion_range(),
            active_bombs: p.active_bombs(),
            rare_mode: p.is_rare_mode(),
            score,
        }
    }
}

impl BombSnapshot {
    pub fn new(b: &SimBomb, now: f64) -> Self {
        Self {
            id: b.id,
            owner_id: b.owner_id,
            position: b.cell,
            range: b.range,
            solid: b.solid,
            fuse_remaining: (b.fuse_deadline - now).max(0.0) as f32,
        }
    }
}

impl ExplosionSnapshot {
    pub fn new(e: &SimExplosion, now: f64) -> Self {
        Self {
            id: e.id,
            origin: e.origin,
            cells: e.cells.iter().copied().collect(),
            ttl_remaining: (e.expires_at - now).max(0.0) as f32,
        }
    }
}
