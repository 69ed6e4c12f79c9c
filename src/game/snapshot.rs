//! Client-safe state projection and per-tick event records

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::engine::{MatchPhase, MatchState};
use super::entity::{CombatantKind, Direction};
use super::GameMode;

/// Terminal outcome of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "side", rename_all = "snake_case")]
pub enum Winner {
    /// Cooperative defenders held out
    Humans,
    /// The AI side destroyed the base or eliminated every defender
    Enemies,
    /// Deathmatch participant that reached the frag target
    Participant { id: Uuid },
}

/// Events that occurred during a tick, for broadcast alongside snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Projectile fired
    Shot {
        shooter_id: Uuid,
        projectile_id: Uuid,
    },
    /// A destructible cell was cleared
    TerrainDestroyed { col: usize, row: usize },
    /// The cooperative objective fell
    BaseDestroyed,
    /// A cooperative human lost a life but respawned in place
    LifeLost { id: Uuid, lives_left: i32 },
    /// A combatant was eliminated
    Kill {
        killer_id: Option<Uuid>,
        victim_id: Uuid,
    },
    /// A classic enemy entered the field
    EnemySpawned { id: Uuid },
    /// A deathmatch participant came back from the respawn queue
    Respawned { id: Uuid },
    /// The match reached a terminal state
    MatchOver { winner: Winner },
}

/// Public view of one combatant.
///
/// Exposes the derived shielded boolean, never the raw countdown; unbounded
/// lives appear as the -1 sentinel. AI scratch and buffered input stay
/// server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantView {
    pub id: Uuid,
    pub name: String,
    pub kind: CombatantKind,
    pub x: f32,
    pub y: f32,
    pub facing: Direction,
    pub alive: bool,
    pub lives: i32,
    pub score: u32,
    pub deaths: u32,
    pub color: u8,
    pub shielded: bool,
    pub moving: bool,
}

impl CombatantView {
    pub fn of(c: &super::entity::Combatant) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            kind: c.kind,
            x: c.x,
            y: c.y,
            facing: c.facing,
            alive: c.alive,
            lives: c.lives,
            score: c.score,
            deaths: c.deaths,
            color: c.color,
            shielded: c.shielded(),
            moving: c.moving,
        }
    }
}

/// Public view of one live projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub facing: Direction,
    /// Firing side, for client-side tinting
    pub kind: CombatantKind,
}

/// Current terrain, with destroyed cells reflected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridView {
    pub cols: usize,
    pub rows: usize,
    /// Row-major material wire codes
    pub cells: Vec<u8>,
}

/// Read-only projection of match state for network broadcast.
///
/// Reflects the most recently completed tick only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub mode: GameMode,
    pub tick: u64,
    pub grid: GridView,
    pub combatants: Vec<CombatantView>,
    pub projectiles: Vec<ProjectileView>,
    pub finished: bool,
    pub winner: Option<Winner>,
    /// Cooperative: AI opponents not yet spawned
    pub enemies_remaining: u32,
    /// Cooperative: AI opponents currently on the field
    pub enemies_on_field: u32,
    /// Deathmatch: score that ends the match
    pub frag_target: u32,
}

impl StateSnapshot {
    pub fn capture(state: &MatchState) -> Self {
        Self {
            mode: state.mode,
            tick: state.tick,
            grid: GridView {
                cols: state.grid.cols(),
                rows: state.grid.rows(),
                cells: state.grid.codes(),
            },
            combatants: state.roster.iter().map(CombatantView::of).collect(),
            projectiles: state
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    id: p.id,
                    x: p.x,
                    y: p.y,
                    facing: p.facing,
                    kind: p.owner_kind,
                })
                .collect(),
            finished: state.phase == MatchPhase::Ended,
            winner: state.winner,
            enemies_remaining: state.enemies_to_spawn,
            enemies_on_field: state.enemies_on_field,
            frag_target: state.config.frag_target,
        }
    }
}

/// Decides which ticks get their snapshot broadcast.
///
/// The simulation runs faster than the network needs; one snapshot every
/// `interval` ticks is enough, except around important transitions.
pub struct SnapshotCadence {
    ticks_since_send: u32,
    interval: u32,
}

impl SnapshotCadence {
    pub fn new(interval: u32) -> Self {
        Self {
            ticks_since_send: 0,
            interval: interval.max(1),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_send += 1;
        if self.ticks_since_send >= self.interval {
            self.ticks_since_send = 0;
            true
        } else {
            false
        }
    }

    /// Force the next check to send (used around terminal transitions)
    pub fn force_next(&mut self) {
        self.ticks_since_send = self.interval;
    }
}
