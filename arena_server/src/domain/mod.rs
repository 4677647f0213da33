// Domain layer: arena rules and simulation state, free of any I/O.

pub mod errors;
pub mod grid;
pub mod items;
pub mod player;
pub mod schedule;
pub mod score;
pub mod state;
pub mod systems;
pub mod tuning;
pub mod world;

pub use errors::RejectedAction;
pub use grid::{ArenaBounds, ArenaGrid, Cell, Direction};
pub use items::ItemKind;
pub use player::{PlayerState, Stat};
pub use score::{ScoreBoard, ScoreEntry, Winner};
pub use state::{
    ArenaEvent, BombSnapshot, EntityId, EntityKind, ExplosionSnapshot, ItemSnapshot,
    MatchSnapshot, Phase, PlayerId, PlayerSnapshot,
};
pub use world::World;
