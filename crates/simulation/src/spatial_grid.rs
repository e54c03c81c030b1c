//! Viewport-anchored spatial grid.
//!
//! The fog lattice is rebuilt from the current viewport every tick: a grid of
//! `CELL_SIZE` cells covering the screen plus `BUFFER_CELLS` of padding on
//! each side, with its origin snapped down to a cell boundary. It is never
//! persisted or diffed, only recreated, so camera motion costs nothing.

use bevy::prelude::*;

use crate::config::{BUFFER_CELLS, CELL_SIZE};
use crate::world::Viewport;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewGrid {
    /// World pixels per cell.
    pub cell_size: f32,
    /// Cells of padding beyond the viewport on each side.
    pub buffer_cells: usize,
    /// World-space top-left of the padded grid, snapped to a cell boundary.
    pub origin: Vec2,
    /// Viewport-covering cell counts (without padding).
    pub cols: usize,
    pub rows: usize,
    /// Padded cell counts: cols/rows + 2 * buffer_cells.
    pub ext_cols: usize,
    pub ext_rows: usize,
}

impl ViewGrid {
    /// Build a grid for the given viewport. Pure; cell counts and size are
    /// clamped so the result is always usable.
    pub fn build(
        viewport_top_left: Vec2,
        viewport_size: Vec2,
        cell_size: f32,
        buffer_cells: usize,
    ) -> Self {
        let cell = cell_size.max(1.0);
        let cols = ((viewport_size.x / cell).ceil() as usize).max(1);
        let rows = ((viewport_size.y / cell).ceil() as usize).max(1);
        let buffered = viewport_top_left - Vec2::splat(buffer_cells as f32 * cell);
        let origin = (buffered / cell).floor() * cell;
        Self {
            cell_size: cell,
            buffer_cells,
            origin,
            cols,
            rows,
            ext_cols: cols + 2 * buffer_cells,
            ext_rows: rows + 2 * buffer_cells,
        }
    }

    /// Cell coordinates containing `pos`. May be out of range; callers must
    /// bounds-check via `cell_index`.
    #[inline]
    pub fn cell_for_position(&self, pos: Vec2) -> (i32, i32) {
        let rel = (pos - self.origin) / self.cell_size;
        (rel.x.floor() as i32, rel.y.floor() as i32)
    }

    /// Flat index for in-range cell coordinates, `None` when off the padded
    /// grid.
    #[inline]
    pub fn cell_index(&self, col: i32, row: i32) -> Option<usize> {
        if col >= 0 && row >= 0 && (col as usize) < self.ext_cols && (row as usize) < self.ext_rows
        {
            Some(row as usize * self.ext_cols + col as usize)
        } else {
            None
        }
    }

    /// Total padded cell count.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.ext_cols * self.ext_rows
    }

    /// World bounds of a padded-grid cell by flat index.
    pub fn cell_bounds(&self, index: usize) -> Rect {
        let col = (index % self.ext_cols) as f32;
        let row = (index / self.ext_cols) as f32;
        let min = self.origin + Vec2::new(col, row) * self.cell_size;
        Rect::from_corners(min, min + Vec2::splat(self.cell_size))
    }

    /// World bounds of the whole padded grid, used for offscreen culling.
    pub fn extended_bounds(&self) -> Rect {
        Rect::from_corners(
            self.origin,
            self.origin
                + Vec2::new(
                    self.ext_cols as f32 * self.cell_size,
                    self.ext_rows as f32 * self.cell_size,
                ),
        )
    }
}

impl Default for ViewGrid {
    fn default() -> Self {
        Self::build(Vec2::ZERO, Vec2::ZERO, CELL_SIZE, BUFFER_CELLS)
    }
}

/// The grid for the current tick.
#[derive(Resource, Debug, Default)]
pub struct ActiveGrid(pub ViewGrid);

/// Recreate the grid from the current viewport. Runs first in the tick.
pub fn rebuild_view_grid(viewport: Res<Viewport>, mut grid: ResMut<ActiveGrid>) {
    grid.0 = ViewGrid::build(viewport.top_left, viewport.size, CELL_SIZE, BUFFER_CELLS);
}
