// Simulation systems. Each one is a set of free functions over `&mut World`.

pub mod bombs;
pub mod coins;
pub mod explosions;
pub mod players;
pub mod shrink;
pub mod timers;
