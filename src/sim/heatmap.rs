//! Occupancy heatmap
//!
//! A coarse grid over the arena remembering where anchors have recently been
//! placed. Anchor scoring prefers cool cells, which spreads movers out.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{HEAT_COLS, HEAT_DECAY, HEAT_ROWS};

/// Grid coordinate (row, col)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatMap {
    /// Heat values, row-major, never negative
    cells: Vec<f32>,
}

impl Default for HeatMap {
    fn default() -> Self {
        Self::new()
    }
}

impl HeatMap {
    pub fn new() -> Self {
        Self {
            cells: vec![0.0; HEAT_COLS * HEAT_ROWS],
        }
    }

    /// Geometric decay of every cell; runs once per frame before scheduling
    pub fn decay(&mut self) {
        for cell in &mut self.cells {
            *cell *= HEAT_DECAY;
        }
    }

    /// Map a screen position to its (clamped) cell. `half` is the arena half-extent.
    pub fn cell_for(&self, pos: Vec2, half: Vec2) -> Cell {
        let fx = (pos.x + half.x) / (2.0 * half.x).max(1e-3);
        let fy = (pos.y + half.y) / (2.0 * half.y).max(1e-3);
        let col = (fx * HEAT_COLS as f32).floor().clamp(0.0, (HEAT_COLS - 1) as f32) as usize;
        let row = (fy * HEAT_ROWS as f32).floor().clamp(0.0, (HEAT_ROWS - 1) as f32) as usize;
        Cell { row, col }
    }

    /// Screen-space rectangle of a cell as (min corner, size)
    pub fn cell_rect(&self, cell: Cell, half: Vec2) -> (Vec2, Vec2) {
        let size = Vec2::new(
            2.0 * half.x / HEAT_COLS as f32,
            2.0 * half.y / HEAT_ROWS as f32,
        );
        let min = Vec2::new(
            -half.x + cell.col as f32 * size.x,
            -half.y + cell.row as f32 * size.y,
        );
        (min, size)
    }

    pub fn increment(&mut self, cell: Cell, amount: f32) {
        let idx = cell.row * HEAT_COLS + cell.col;
        if let Some(heat) = self.cells.get_mut(idx) {
            *heat += amount.max(0.0);
        }
    }

    pub fn heat(&self, cell: Cell) -> f32 {
        self.cells
            .get(cell.row * HEAT_COLS + cell.col)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f32 {
        self.cells.iter().sum()
    }

    pub fn clear(&mut self) {
        self.cells.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HALF: Vec2 = Vec2::new(640.0, 360.0);

    #[test]
    fn test_cell_for_corners_clamp() {
        let map = HeatMap::new();
        assert_eq!(map.cell_for(Vec2::new(-10_000.0, -10_000.0), HALF), Cell { row: 0, col: 0 });
        assert_eq!(
            map.cell_for(Vec2::new(10_000.0, 10_000.0), HALF),
            Cell { row: HEAT_ROWS - 1, col: HEAT_COLS - 1 }
        );
        assert_eq!(map.cell_for(Vec2::ZERO, HALF), Cell { row: HEAT_ROWS / 2, col: HEAT_COLS / 2 });
    }

    #[test]
    fn test_cell_rect_contains_its_points() {
        let map = HeatMap::new();
        let cell = Cell { row: 3, col: 11 };
        let (min, size) = map.cell_rect(cell, HALF);
        assert_eq!(map.cell_for(min + size * 0.5, HALF), cell);
    }

    #[test]
    fn test_increment_never_negative() {
        let mut map = HeatMap::new();
        let cell = Cell { row: 1, col: 1 };
        map.increment(cell, -5.0);
        assert_eq!(map.heat(cell), 0.0);
        map.increment(cell, 2.0);
        assert_eq!(map.heat(cell), 2.0);
    }

    proptest! {
        #[test]
        fn prop_decay_is_geometric(initial in 0.0f32..50.0, frames in 0u32..200) {
            let mut map = HeatMap::new();
            let cell = Cell { row: 4, col: 7 };
            map.increment(cell, initial);
            for _ in 0..frames {
                map.decay();
            }
            let expected = initial * HEAT_DECAY.powi(frames as i32);
            prop_assert!((map.heat(cell) - expected).abs() <= 1e-3 * initial.max(1.0));
            prop_assert!(map.heat(cell) >= 0.0);
        }

        #[test]
        fn prop_decay_converges(initial in 0.01f32..100.0) {
            let mut map = HeatMap::new();
            let cell = Cell { row: 0, col: 15 };
            map.increment(cell, initial);
            // 0.98^n * 100 < 1e-3 once n >= 570
            for _ in 0..600 {
                map.decay();
            }
            prop_assert!(map.heat(cell) < 1e-3);
        }
    }
}
