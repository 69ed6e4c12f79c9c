//! Match simulation modules

pub mod ai;
pub mod combat;
pub mod engine;
pub mod entity;
pub mod grid;
pub mod map;
pub mod movement;
pub mod respawn;
pub mod runner;
pub mod snapshot;

pub use engine::{EngineConfig, EngineError, MatchEngine};
pub use runner::{MatchHandle, MatchRegistry, MatchRunner};
pub use snapshot::{StateSnapshot, Winner};

use serde::{Deserialize, Serialize};

use entity::Direction;

/// Active rule set for a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Humans defend the base against quota-spawned AI opponents
    Cooperative,
    /// All-vs-all elimination scoring among humans
    Deathmatch,
    /// Deathmatch with AI bot participants filling the roster
    DeathmatchBots,
}

impl GameMode {
    pub fn is_deathmatch(self) -> bool {
        matches!(self, GameMode::Deathmatch | GameMode::DeathmatchBots)
    }
}

/// Standing input intent for one human, delivered out-of-band.
///
/// Each delivery replaces the previous intent wholesale; the engine holds it
/// as the intent for all subsequent ticks until overwritten.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InputIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

impl InputIntent {
    /// The one direction honored this tick, in fixed priority order:
    /// up, then down, then left, then right.
    pub fn direction(&self) -> Option<Direction> {
        if self.up {
            Some(Direction::Up)
        } else if self.down {
            Some(Direction::Down)
        } else if self.left {
            Some(Direction::Left)
        } else if self.right {
            Some(Direction::Right)
        } else {
            None
        }
    }
}
