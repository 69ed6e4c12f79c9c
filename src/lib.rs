//! Arena Server - authoritative match engine for a top-down, tile-based
//! arena combat game.
//!
//! The crate owns the full server-side simulation: tile-grid terrain with
//! destructible cells, AABB movement and collision, projectile combat, two
//! AI policies, mode-specific respawn and win conditions, and a client-safe
//! snapshot projection. The network transport and room lifecycle are
//! external collaborators; they talk to a match exclusively through
//! [`game::MatchHandle`] (or drive [`game::MatchEngine`] directly in tests
//! and tools).

pub mod config;
pub mod game;
pub mod util;
