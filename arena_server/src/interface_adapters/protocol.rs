// Wire protocol DTOs and conversions for public arena server messages.
// Internal service-to-service DTOs live next to their handlers.

use crate::domain::state::{BombSnapshot, ExplosionSnapshot, ItemSnapshot, PlayerSnapshot};
use crate::domain::{
    ArenaBounds, ArenaEvent, Cell, Direction, EntityKind, ItemKind, MatchSnapshot, Phase, Stat,
};
use crate::use_cases::MatchUpdate;
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection after Join is accepted.
    Identity { player_id: String, spectator: bool },
    // Events produced by one tick.
    MatchUpdate(MatchUpdateDto),
    // Full state for late joiners and lag recovery.
    MatchSnapshot(MatchSnapshotDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Initial handshake; must be the first message.
    Join(JoinPayload),
    Move { direction: DirectionDto },
    // Cell resolved by the client-side motion controller.
    Position { x: i32, y: i32 },
    PlaceBomb,
    StartMatch,
    Reset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    pub display_name: String,
    // Required for restricted matches; open matches assign a guest id.
    #[serde(default)]
    pub player_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum DirectionDto {
    Up,
    Down,
    Left,
    Right,
}

impl From<DirectionDto> for Direction {
    fn from(dir: DirectionDto) -> Self {
        match dir {
            DirectionDto::Up => Direction::Up,
            DirectionDto::Down => Direction::Down,
            DirectionDto::Left => Direction::Left,
            DirectionDto::Right => Direction::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CellDto {
    pub x: i32,
    pub y: i32,
}

impl From<Cell> for CellDto {
    fn from(cell: Cell) -> Self {
        Self {
            x: cell.x,
            y: cell.y,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum PhaseDto {
    Lobby,
    Active,
    SuddenDeath,
    Ended,
}

impl From<Phase> for PhaseDto {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Lobby => PhaseDto::Lobby,
            Phase::Active => PhaseDto::Active,
            Phase::SuddenDeath => PhaseDto::SuddenDeath,
            Phase::Ended => PhaseDto::Ended,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum ItemKindDto {
    Score,
    Diamond,
    Trap,
    Speed,
    BombUp,
    Fire,
    Rare,
}

impl From<ItemKind> for ItemKindDto {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Score => ItemKindDto::Score,
            ItemKind::Diamond => ItemKindDto::Diamond,
            ItemKind::Trap => ItemKindDto::Trap,
            ItemKind::Speed => ItemKindDto::Speed,
            ItemKind::BombUp => ItemKindDto::BombUp,
            ItemKind::Fire => ItemKindDto::Fire,
            ItemKind::Rare => ItemKindDto::Rare,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum StatDto {
    Alive,
    SpeedLevel,
    MaxBombs,
    ExplosionRange,
    RareMode,
}

impl From<Stat> for StatDto {
    fn from(stat: Stat) -> Self {
        match stat {
            Stat::Alive => StatDto::Alive,
            Stat::SpeedLevel => StatDto::SpeedLevel,
            Stat::MaxBombs => StatDto::MaxBombs,
            Stat::ExplosionRange => StatDto::ExplosionRange,
            Stat::RareMode => StatDto::RareMode,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum EntityKindDto {
    Bomb { owner_id: String },
    Explosion,
    Item { item: ItemKindDto },
    Wall,
}

impl From<EntityKind> for EntityKindDto {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Bomb { owner_id } => EntityKindDto::Bomb {
                owner_id: owner_id.to_string(),
            },
            EntityKind::Explosion => EntityKindDto::Explosion,
            EntityKind::Item(item) => EntityKindDto::Item { item: item.into() },
            EntityKind::Wall => EntityKindDto::Wall,
        }
    }
}

/// One simulation event. Player ids go out as strings since guest ids can
/// exceed what JSON numbers carry exactly.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum EventDto {
    EntitySpawned {
        entity: EntityKindDto,
        id: u64,
        position: CellDto,
    },
    EntityDespawned {
        id: u64,
    },
    PlayerJoined {
        player_id: String,
        display_name: String,
        position: CellDto,
    },
    PlayerLeft {
        player_id: String,
    },
    PlayerMoved {
        player_id: String,
        position: CellDto,
    },
    StatChanged {
        player_id: String,
        stat: StatDto,
        value: i32,
    },
    ScoreChanged {
        player_id: String,
        score: u32,
    },
    PhaseChanged {
        phase: PhaseDto,
        clock: f32,
    },
    WinnerDeclared {
        player_id: Option<String>,
        display_name: Option<String>,
        score: u32,
    },
}

impl From<ArenaEvent> for EventDto {
    fn from(event: ArenaEvent) -> Self {
        match event {
            ArenaEvent::EntitySpawned { kind, id, position } => EventDto::EntitySpawned {
                entity: kind.into(),
                id,
                position: position.into(),
            },
            ArenaEvent::EntityDespawned { id } => EventDto::EntityDespawned { id },
            ArenaEvent::PlayerJoined {
                player_id,
                display_name,
                position,
            } => EventDto::PlayerJoined {
                player_id: player_id.to_string(),
                display_name,
                position: position.into(),
            },
            ArenaEvent::PlayerLeft { player_id } => EventDto::PlayerLeft {
                player_id: player_id.to_string(),
            },
            ArenaEvent::PlayerMoved {
                player_id,
                position,
            } => EventDto::PlayerMoved {
                player_id: player_id.to_string(),
                position: position.into(),
            },
            ArenaEvent::StatChanged {
                player_id,
                stat,
                value,
            } => EventDto::StatChanged {
                player_id: player_id.to_string(),
                stat: stat.into(),
                value,
            },
            ArenaEvent::ScoreChanged { player_id, score } => EventDto::ScoreChanged {
                player_id: player_id.to_string(),
                score,
            },
            ArenaEvent::PhaseChanged { phase, clock } => EventDto::PhaseChanged {
                phase: phase.into(),
                clock,
            },
            ArenaEvent::WinnerDeclared {
                player_id,
                display_name,
                score,
            } => EventDto::WinnerDeclared {
                player_id: player_id.map(|id| id.to_string()),
                display_name,
                score,
            },
        }
    }
}

/// Events of one tick, sent to every client.
#[derive(Debug, Clone, Serialize)]
pub struct MatchUpdateDto {
    pub tick: u64,
    pub phase: PhaseDto,
    pub clock: f32,
    pub events: Vec<EventDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<MatchSnapshotDto>,
}

impl From<MatchUpdate> for MatchUpdateDto {
    fn from(update: MatchUpdate) -> Self {
        Self {
            tick: update.tick,
            phase: update.phase.into(),
            clock: update.clock,
            events: update.events.into_iter().map(EventDto::from).collect(),
            snapshot: update.snapshot.as_ref().map(MatchSnapshotDto::from),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BoundsDto {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl From<ArenaBounds> for BoundsDto {
    fn from(b: ArenaBounds) -> Self {
        Self {
            min_x: b.min_x,
            max_x: b.max_x,
            min_y: b.min_y,
            max_y: b.max_y,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerStateDto {
    pub id: String,
    pub display_name: String,
    pub position: CellDto,
    pub alive: bool,
    pub speed_level: u8,
    pub max_bombs: u8,
    pub explosion_range: u8,
    pub active_bombs: u8,
    pub rare_mode: bool,
    pub score: u32,
}

impl From<&PlayerSnapshot> for PlayerStateDto {
    fn from(p: &PlayerSnapshot) -> Self {
        Self {
            id: p.id.to_string(),
            display_name: p.display_name.clone(),
            position: p.position.into(),
            alive: p.alive,
            speed_level: p.speed_level,
            max_bombs: p.max_bombs,
            explosion_range: p.explosion_range,
            active_bombs: p.active_bombs,
            rare_mode: p.rare_mode,
            score: p.score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BombStateDto {
    pub id: u64,
    pub owner_id: String,
    pub position: CellDto,
    pub range: u8,
    pub solid: bool,
    pub fuse_remaining: f32,
}

impl From<&BombSnapshot> for BombStateDto {
    fn from(b: &BombSnapshot) -> Self {
        Self {
            id: b.id,
            owner_id: b.owner_id.to_string(),
            position: b.position.into(),
            range: b.range,
            solid: b.solid,
            fuse_remaining: b.fuse_remaining,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemStateDto {
    pub id: u64,
    pub item: ItemKindDto,
    pub position: CellDto,
}

impl From<&ItemSnapshot> for ItemStateDto {
    fn from(i: &ItemSnapshot) -> Self {
        Self {
            id: i.id,
            item: i.kind.into(),
            position: i.position.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplosionStateDto {
    pub id: u64,
    pub origin: CellDto,
    pub cells: Vec<CellDto>,
    pub ttl_remaining: f32,
}

impl From<&ExplosionSnapshot> for ExplosionStateDto {
    fn from(e: &ExplosionSnapshot) -> Self {
        Self {
            id: e.id,
            origin: e.origin.into(),
            cells: e.cells.iter().copied().map(CellDto::from).collect(),
            ttl_remaining: e.ttl_remaining,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSnapshotDto {
    pub phase: PhaseDto,
    pub clock: f32,
    pub bounds: BoundsDto,
    pub players: Vec<PlayerStateDto>,
    pub bombs: Vec<BombStateDto>,
    pub items: Vec<ItemStateDto>,
    pub explosions: Vec<ExplosionStateDto>,
    pub walls: Vec<CellDto>,
}

impl From<&MatchSnapshot> for MatchSnapshotDto {
    fn from(s: &MatchSnapshot) -> Self {
        Self {
            phase: s.phase.into(),
            clock: s.clock,
            bounds: s.bounds.into(),
            players: s.players.iter().map(PlayerStateDto::from).collect(),
            bombs: s.bombs.iter().map(BombStateDto::from).collect(),
            items: s.items.iter().map(ItemStateDto::from).collect(),
            explosions: s.explosions.iter().map(ExplosionStateDto::from).collect(),
            walls: s.walls.iter().copied().map(CellDto::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_tagged_layout() {
        let join: ClientMessage =
            serde_json::from_str(r#"{"type":"Join","data":{"display_name":"Ana"}}"#).unwrap();
        assert!(matches!(
            join,
            ClientMessage::Join(JoinPayload { player_id: None, .. })
        ));

        let bomb: ClientMessage = serde_json::from_str(r#"{"type":"PlaceBomb"}"#).unwrap();
        assert!(matches!(bomb, ClientMessage::PlaceBomb));

        let step: ClientMessage =
            serde_json::from_str(r#"{"type":"Move","data":{"direction":"Left"}}"#).unwrap();
        assert!(matches!(
            step,
            ClientMessage::Move {
                direction: DirectionDto::Left
            }
        ));
    }

    #[test]
    fn events_serialize_with_string_player_ids() {
        let dto = EventDto::from(ArenaEvent::ScoreChanged {
            player_id: 42,
            score: 5,
        });
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "ScoreChanged", "data": {"player_id": "42", "score": 5}})
        );
    }

    #[test]
    fn wall_spawn_carries_entity_kind() {
        let dto = EventDto::from(ArenaEvent::EntitySpawned {
            kind: EntityKind::Wall,
            id: 9,
            position: Cell::new(-10, 10),
        });
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["data"]["entity"]["kind"], "Wall");
        assert_eq!(json["data"]["position"]["x"], -10);
    }
}
