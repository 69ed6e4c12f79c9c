//! Map resource consumed at match creation - parsed grid plus spawn lists

use serde::{Deserialize, Serialize};

use super::grid::{Material, TileGrid};
use super::GameMode;

/// Immutable map resource handed to the engine by the room collaborator.
///
/// The engine copies the tile grid on initialization and mutates its own
/// copy only; the resource itself is never written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapResource {
    /// Rule set this map is declared for
    pub mode: GameMode,
    pub cols: usize,
    pub rows: usize,
    /// Row-major material cells
    pub cells: Vec<Material>,
    /// Per-join-slot spawn cells (cooperative humans)
    pub player_spawns: Vec<(usize, usize)>,
    /// Contention-scored respawn cells (deathmatch)
    pub dm_spawns: Vec<(usize, usize)>,
    /// Classic-enemy entry cells (cooperative)
    pub ai_spawns: Vec<(usize, usize)>,
}

impl MapResource {
    /// Defensive working copy of the terrain
    pub fn grid(&self) -> TileGrid {
        TileGrid::new(self.cols, self.rows, self.cells.clone())
    }

    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Stock cooperative arena: steel shell, brick lanes, a water channel, and
/// the base walled into the bottom row.
pub fn cooperative_arena() -> MapResource {
    let cols = 15;
    let rows = 13;
    let mut cells = vec![Material::Empty; cols * rows];
    let idx = |c: usize, r: usize| r * cols + c;

    for c in 0..cols {
        cells[idx(c, 0)] = Material::Steel;
        cells[idx(c, rows - 1)] = Material::Steel;
    }
    for r in 0..rows {
        cells[idx(0, r)] = Material::Steel;
        cells[idx(cols - 1, r)] = Material::Steel;
    }

    // brick lanes above and below the water channel
    for &c in &[2, 4, 6, 8, 10, 12] {
        for &r in &[2, 3, 4, 8, 9] {
            cells[idx(c, r)] = Material::Brick;
        }
    }

    // water channel with tree cover on the banks
    for &c in &[6, 7, 8] {
        cells[idx(c, 6)] = Material::Water;
    }
    cells[idx(2, 6)] = Material::Trees;
    cells[idx(12, 6)] = Material::Trees;

    // the base, ringed by brick
    cells[idx(7, 11)] = Material::Base;
    for &(c, r) in &[(6, 10), (7, 10), (8, 10), (6, 11), (8, 11)] {
        cells[idx(c, r)] = Material::Brick;
    }

    MapResource {
        mode: GameMode::Cooperative,
        cols,
        rows,
        cells,
        player_spawns: vec![(4, 11), (10, 11)],
        dm_spawns: Vec::new(),
        ai_spawns: vec![(1, 1), (7, 1), (13, 1)],
    }
}

/// Stock deathmatch arena: steel shell, scattered brick cover, spawn points
/// spread to the corners and mid-lanes.
pub fn deathmatch_arena() -> MapResource {
    let cols = 15;
    let rows = 13;
    let mut cells = vec![Material::Empty; cols * rows];
    let idx = |c: usize, r: usize| r * cols + c;

    for c in 0..cols {
        cells[idx(c, 0)] = Material::Steel;
        cells[idx(c, rows - 1)] = Material::Steel;
    }
    for r in 0..rows {
        cells[idx(0, r)] = Material::Steel;
        cells[idx(cols - 1, r)] = Material::Steel;
    }

    for &(c, r) in &[
        (3, 3),
        (4, 3),
        (10, 3),
        (11, 3),
        (7, 5),
        (7, 6),
        (7, 7),
        (3, 9),
        (4, 9),
        (10, 9),
        (11, 9),
    ] {
        cells[idx(c, r)] = Material::Brick;
    }
    cells[idx(2, 6)] = Material::Trees;
    cells[idx(12, 6)] = Material::Trees;

    MapResource {
        mode: GameMode::Deathmatch,
        cols,
        rows,
        cells,
        player_spawns: Vec::new(),
        dm_spawns: vec![(1, 1), (13, 1), (1, 11), (13, 11), (7, 2), (7, 10)],
        ai_spawns: Vec::new(),
    }
}
