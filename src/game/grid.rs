//! Tile grid terrain - material codes, passability, cell mutation

use serde::{Deserialize, Serialize};

/// Side length of one grid tile in world pixels
pub const TILE_SIZE: f32 = 32.0;

/// Bounding-box side length of a combatant (slightly under one tile)
pub const UNIT_SIZE: f32 = 28.0;

/// Bounding-box side length of a projectile
pub const PROJECTILE_SIZE: f32 = 8.0;

/// Guard against a box edge landing exactly on a cell boundary
const EDGE_EPS: f32 = 1e-3;

/// Terrain material occupying one grid cell.
///
/// The numeric codes are part of the wire format and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    /// Open ground
    Empty,
    /// Destructible wall - cleared by one projectile hit
    Brick,
    /// Indestructible wall - absorbs projectiles without changing
    Steel,
    /// Impassable liquid; projectiles fly over it
    Water,
    /// Foliage - passable, rendered above units
    Trees,
    /// The defended objective structure (cooperative mode)
    Base,
}

impl Material {
    /// Wire code for this material
    pub fn code(self) -> u8 {
        match self {
            Material::Empty => 0,
            Material::Brick => 1,
            Material::Steel => 2,
            Material::Water => 3,
            Material::Trees => 4,
            Material::Base => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Material::Empty),
            1 => Some(Material::Brick),
            2 => Some(Material::Steel),
            3 => Some(Material::Water),
            4 => Some(Material::Trees),
            5 => Some(Material::Base),
            _ => None,
        }
    }

    /// Whether a combatant may occupy a cell of this material
    pub fn is_passable(self) -> bool {
        matches!(self, Material::Empty | Material::Trees)
    }
}

/// Fixed-size 2-D terrain buffer, row-major.
///
/// Dimensions never change for the lifetime of a match; only brick and base
/// cells may change (to empty) during play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    cols: usize,
    rows: usize,
    cells: Vec<Material>,
}

impl TileGrid {
    pub fn new(cols: usize, rows: usize, cells: Vec<Material>) -> Self {
        debug_assert_eq!(cells.len(), cols * rows, "cell buffer must match dimensions");
        Self { cols, rows, cells }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid extent in world pixels
    pub fn width_px(&self) -> f32 {
        self.cols as f32 * TILE_SIZE
    }

    pub fn height_px(&self) -> f32 {
        self.rows as f32 * TILE_SIZE
    }

    pub fn get(&self, col: usize, row: usize) -> Option<Material> {
        if col < self.cols && row < self.rows {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn set(&mut self, col: usize, row: usize, material: Material) {
        if col < self.cols && row < self.rows {
            self.cells[row * self.cols + col] = material;
        }
    }

    /// Cell containing a world-space point, if inside the grid
    pub fn cell_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let col = (x / TILE_SIZE) as usize;
        let row = (y / TILE_SIZE) as usize;
        if col < self.cols && row < self.rows {
            Some((col, row))
        } else {
            None
        }
    }

    /// Test whether an axis-aligned box may occupy this position.
    ///
    /// The box covers the inclusive range of cells under `[pos, pos + size)`;
    /// the test fails if any covered cell is out of bounds or impassable.
    pub fn area_passable(&self, x: f32, y: f32, size: f32) -> bool {
        if x < 0.0 || y < 0.0 {
            return false;
        }
        let c0 = (x / TILE_SIZE) as usize;
        let r0 = (y / TILE_SIZE) as usize;
        let c1 = ((x + size - EDGE_EPS) / TILE_SIZE) as usize;
        let r1 = ((y + size - EDGE_EPS) / TILE_SIZE) as usize;
        if c1 >= self.cols || r1 >= self.rows {
            return false;
        }
        for row in r0..=r1 {
            for col in c0..=c1 {
                if !self.cells[row * self.cols + col].is_passable() {
                    return false;
                }
            }
        }
        true
    }

    /// Locate the objective structure, if this grid carries one
    pub fn find_base(&self) -> Option<(usize, usize)> {
        self.cells
            .iter()
            .position(|&m| m == Material::Base)
            .map(|i| (i % self.cols, i / self.cols))
    }

    /// Flat wire-code view of the cells, row-major
    pub fn codes(&self) -> Vec<u8> {
        self.cells.iter().map(|m| m.code()).collect()
    }
}

/// World-pixel position that centers a unit box inside a tile
pub fn spawn_px(cell: (usize, usize)) -> (f32, f32) {
    let pad = (TILE_SIZE - UNIT_SIZE) / 2.0;
    (cell.0 as f32 * TILE_SIZE + pad, cell.1 as f32 * TILE_SIZE + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(cols: usize, rows: usize) -> TileGrid {
        TileGrid::new(cols, rows, vec![Material::Empty; cols * rows])
    }

    #[test]
    fn material_codes_round_trip() {
        for code in 0..=5u8 {
            let m = Material::from_code(code).unwrap();
            assert_eq!(m.code(), code);
        }
        assert!(Material::from_code(6).is_none());
    }

    #[test]
    fn box_on_cell_boundary_covers_one_cell() {
        let mut grid = open_grid(4, 4);
        grid.set(1, 0, Material::Steel);
        // box spans [4, 32) - never reaches the steel cell starting at 32
        assert!(grid.area_passable(4.0, 0.0, UNIT_SIZE));
        // one pixel further and the covered range includes column 1
        assert!(!grid.area_passable(5.0, 0.0, UNIT_SIZE));
    }

    #[test]
    fn out_of_bounds_is_impassable() {
        let grid = open_grid(4, 4);
        assert!(!grid.area_passable(-1.0, 0.0, UNIT_SIZE));
        assert!(!grid.area_passable(0.0, 4.0 * TILE_SIZE - 10.0, UNIT_SIZE));
    }

    #[test]
    fn trees_pass_water_blocks() {
        let mut grid = open_grid(3, 1);
        grid.set(1, 0, Material::Trees);
        grid.set(2, 0, Material::Water);
        assert!(grid.area_passable(TILE_SIZE + 2.0, 2.0, UNIT_SIZE));
        assert!(!grid.area_passable(2.0 * TILE_SIZE + 2.0, 2.0, UNIT_SIZE));
    }

    #[test]
    fn find_base_reports_cell() {
        let mut grid = open_grid(5, 5);
        assert_eq!(grid.find_base(), None);
        grid.set(3, 4, Material::Base);
        assert_eq!(grid.find_base(), Some((3, 4)));
    }
}
