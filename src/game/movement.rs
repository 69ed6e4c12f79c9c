//! Movement and collision resolution against the grid and other entities

use uuid::Uuid;

use super::entity::{Combatant, Direction};
use super::grid::{TileGrid, UNIT_SIZE};

/// Open-interval AABB intersection: boxes that merely touch do not overlap
pub fn aabb_overlap(ax: f32, ay: f32, a_size: f32, bx: f32, by: f32, b_size: f32) -> bool {
    ax < bx + b_size && bx < ax + a_size && ay < by + b_size && by < ay + a_size
}

/// Whether a unit box at this position collides with neither terrain nor any
/// other live combatant
pub fn position_clear(grid: &TileGrid, roster: &[Combatant], mover: Uuid, x: f32, y: f32) -> bool {
    grid.area_passable(x, y, UNIT_SIZE)
        && roster.iter().all(|other| {
            other.id == mover
                || !other.alive
                || !aabb_overlap(x, y, UNIT_SIZE, other.x, other.y, UNIT_SIZE)
        })
}

/// Attempt one displacement step for `roster[idx]`.
///
/// Facing is set before the attempt. The move is all-or-nothing: a blocked
/// position is rejected outright with no partial slide, and the rejection is
/// silent - normal control flow, not an error. Returns whether the entity
/// actually moved.
pub fn step(grid: &TileGrid, roster: &mut [Combatant], idx: usize, dir: Direction) -> bool {
    let (dx, dy) = dir.delta();
    let (nx, ny, id) = {
        let c = &roster[idx];
        (c.x + dx * c.speed, c.y + dy * c.speed, c.id)
    };
    roster[idx].facing = dir;
    if position_clear(grid, roster, id, nx, ny) {
        roster[idx].x = nx;
        roster[idx].y = ny;
        true
    } else {
        false
    }
}
