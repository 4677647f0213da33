// Use cases layer: match lifecycle and the loops that drive it.

pub mod game;
pub mod match_controller;
pub mod registry;
pub mod types;

pub use match_controller::MatchController;
pub use registry::{MatchError, MatchHandle, MatchRegistry, MatchSettings, Seat};
pub use types::{MatchCommand, MatchUpdate};
