//! Combat units and projectiles - the unified entity model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::grid::{PROJECTILE_SIZE, UNIT_SIZE};
use super::InputIntent;

/// Cardinal facing direction.
///
/// The discriminant ordering is fixed: rotation arithmetic `(dir + 1) % 4`
/// is a quarter turn clockwise and is relied on by the unstick heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

/// All directions in discriminant order
pub const DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::Left,
];

impl Direction {
    /// Unit displacement vector for this direction
    pub fn delta(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Right => (1.0, 0.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
        }
    }

    /// Quarter turn clockwise
    pub fn rotated(self) -> Self {
        DIRECTIONS[(self as usize + 1) % 4]
    }
}

/// Discriminant for the three combatant roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantKind {
    /// Human-controlled participant
    Human,
    /// Cooperative-mode AI opponent, spawned from a quota
    Enemy,
    /// Deathmatch AI participant
    Bot,
}

impl CombatantKind {
    pub fn is_ai(self) -> bool {
        !matches!(self, CombatantKind::Human)
    }
}

/// Per-kind movement and weapon constants
#[derive(Debug, Clone, Copy)]
pub struct UnitStats {
    /// Displacement per tick in pixels
    pub speed: f32,
    /// Cooldown set after firing (ms)
    pub fire_cooldown_ms: f32,
}

impl UnitStats {
    pub fn for_kind(kind: CombatantKind) -> Self {
        match kind {
            CombatantKind::Human => Self {
                speed: 4.0,
                fire_cooldown_ms: 600.0,
            },
            CombatantKind::Enemy => Self {
                speed: 2.0,
                fire_cooldown_ms: 1000.0,
            },
            CombatantKind::Bot => Self {
                speed: 3.0,
                fire_cooldown_ms: 800.0,
            },
        }
    }
}

/// AI-private scratch state, populated only for AI kinds
#[derive(Debug, Clone, Default)]
pub struct AiState {
    /// Countdown until the next movement decision (ms)
    pub move_timer_ms: f32,
    /// Countdown until the next fire attempt (ms)
    pub fire_timer_ms: f32,
    /// Current chase target (bots)
    pub target: Option<Uuid>,
}

/// Any tank-like unit: human player, classic enemy, or deathmatch bot.
///
/// Shared logic (movement, collision, shield, cooldown) operates on this
/// record uniformly; kind-specific branches stay explicit.
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: Uuid,
    pub name: String,
    pub kind: CombatantKind,
    /// Stable join-order index, assigned at creation and decoupled from any
    /// container's iteration order; selects the cooperative spawn slot
    pub join_slot: usize,

    // Position and movement (top-left of the bounding box)
    pub x: f32,
    pub y: f32,
    pub facing: Direction,
    pub speed: f32,
    /// Animation hint - raised whenever a move was attempted this tick
    pub moving: bool,

    // Combat
    pub alive: bool,
    /// Remaining lives; -1 is the unbounded sentinel
    pub lives: i32,
    pub score: u32,
    pub deaths: u32,
    /// Post-spawn invulnerability remaining (ms)
    pub shield_ms: f32,
    /// Fire cooldown remaining (ms)
    pub cooldown_ms: f32,

    /// Cosmetic palette index
    pub color: u8,
    /// Standing input intent (human kinds); last write wins
    pub input: InputIntent,
    /// AI scratch, present only for AI kinds
    pub ai: Option<AiState>,
}

impl Combatant {
    pub fn new(
        id: Uuid,
        name: String,
        kind: CombatantKind,
        join_slot: usize,
        x: f32,
        y: f32,
        lives: i32,
    ) -> Self {
        let stats = UnitStats::for_kind(kind);
        Self {
            id,
            name,
            kind,
            join_slot,
            x,
            y,
            // enemies enter facing the defended half of the arena
            facing: if kind == CombatantKind::Enemy {
                Direction::Down
            } else {
                Direction::Up
            },
            speed: stats.speed,
            moving: false,
            alive: true,
            lives,
            score: 0,
            deaths: 0,
            shield_ms: 0.0,
            cooldown_ms: 0.0,
            color: (join_slot % 8) as u8,
            input: InputIntent::default(),
            ai: kind.is_ai().then(AiState::default),
        }
    }

    /// Center of the bounding box
    pub fn center(&self) -> (f32, f32) {
        (self.x + UNIT_SIZE / 2.0, self.y + UNIT_SIZE / 2.0)
    }

    /// Derived invulnerability flag - the snapshot exposes this, never the
    /// raw countdown
    pub fn shielded(&self) -> bool {
        self.shield_ms > 0.0
    }

    /// Advance shield and weapon countdowns by elapsed simulated time
    pub fn tick_timers(&mut self, elapsed_ms: f32) {
        self.shield_ms = (self.shield_ms - elapsed_ms).max(0.0);
        self.cooldown_ms = (self.cooldown_ms - elapsed_ms).max(0.0);
    }
}

/// A live shot. Exists only between the tick it is fired and the tick it
/// resolves; at most one resolution event per projectile.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: Uuid,
    /// Owning combatant, for self-hit exclusion and kill attribution
    pub owner: Uuid,
    pub owner_kind: CombatantKind,
    pub x: f32,
    pub y: f32,
    pub facing: Direction,
    /// Displacement per tick in pixels
    pub speed: f32,
}

impl Projectile {
    /// Spawn a shot at the shooter's muzzle: centered on the combatant,
    /// offset half a unit length along the facing direction.
    pub fn fired_by(shooter: &Combatant) -> Self {
        let (cx, cy) = shooter.center();
        let (dx, dy) = shooter.facing.delta();
        let half = UNIT_SIZE / 2.0;
        Self {
            id: Uuid::new_v4(),
            owner: shooter.id,
            owner_kind: shooter.kind,
            x: cx + dx * half - PROJECTILE_SIZE / 2.0,
            y: cy + dy * half - PROJECTILE_SIZE / 2.0,
            facing: shooter.facing,
            speed: 8.0,
        }
    }

    /// Center of the projectile box
    pub fn center(&self) -> (f32, f32) {
        (
            self.x + PROJECTILE_SIZE / 2.0,
            self.y + PROJECTILE_SIZE / 2.0,
        )
    }
}
