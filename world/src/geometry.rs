//! Affine mapping between grid cells and the continuous ground plane.
//!
//! World positions are [`Vec2`] values on the ground plane: `x` follows grid
//! columns and `y` follows grid rows (the scene's z axis). The configured
//! origin sits at the geometric center of the grid.

use block_jam_core::{CellCoord, CellRectSize};
use glam::Vec2;

use crate::occupancy::clamp_anchor_for;

/// Smallest cell size accepted by [`GridGeometry::new`].
pub const MIN_CELL_SIZE: f32 = 0.01;

/// Dimensions, scale, and placement of the grid on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    columns: u32,
    rows: u32,
    cell_size: f32,
    origin: Vec2,
}

impl GridGeometry {
    /// Configures a grid centered on `origin`.
    ///
    /// Dimensions are raised to at least one cell and the cell size to at least
    /// [`MIN_CELL_SIZE`].
    #[must_use]
    pub fn new(columns: u32, rows: u32, cell_size: f32, origin: Vec2) -> Self {
        let cell_size = if cell_size.is_finite() {
            cell_size.max(MIN_CELL_SIZE)
        } else {
            MIN_CELL_SIZE
        };

        Self {
            columns: columns.max(1),
            rows: rows.max(1),
            cell_size,
            origin,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single cell expressed in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World position of the grid's center.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// World position of the grid's minimum corner.
    #[must_use]
    pub fn bottom_left(&self) -> Vec2 {
        let half = Vec2::new(self.columns as f32, self.rows as f32) * self.cell_size * 0.5;
        self.origin - half
    }

    /// Cell containing the provided world position, if it lies on the grid.
    #[must_use]
    pub fn world_to_cell(&self, position: Vec2) -> Option<CellCoord> {
        let local = (position - self.bottom_left()) / self.cell_size;
        let column = local.x.floor();
        let row = local.y.floor();

        if !column.is_finite() || !row.is_finite() || column < 0.0 || row < 0.0 {
            return None;
        }
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }

        Some(CellCoord::new(column as u32, row as u32))
    }

    /// World position of the center of the rectangle anchored at `anchor`.
    #[must_use]
    pub fn cell_rect_to_world_center(&self, anchor: CellCoord, size: CellRectSize) -> Vec2 {
        let center_in_cells = Vec2::new(
            anchor.column() as f32 + size.width() as f32 * 0.5,
            anchor.row() as f32 + size.height() as f32 * 0.5,
        );
        self.bottom_left() + center_in_cells * self.cell_size
    }

    /// Half extents of a rectangle of `size` cells in world units.
    #[must_use]
    pub fn half_extents(&self, size: CellRectSize) -> Vec2 {
        Vec2::new(size.width() as f32, size.height() as f32) * self.cell_size * 0.5
    }

    /// Clamps each anchor axis into `[0, dimension - size]`.
    #[must_use]
    pub fn clamp_anchor(&self, anchor: CellCoord, size: CellRectSize) -> CellCoord {
        clamp_anchor_for(self.columns, self.rows, anchor, size)
    }

    /// Snaps a rectangle center to the nearest grid-aligned anchor for `size`.
    ///
    /// Returns the snapped world center together with the anchor. The anchor is
    /// clamped so the rectangle stays inside the grid.
    #[must_use]
    pub fn snap_to_grid_rect(&self, position: Vec2, size: CellRectSize) -> (Vec2, CellCoord) {
        let local = (position - self.bottom_left()) / self.cell_size;
        let anchor_x = local.x - size.width() as f32 * 0.5;
        let anchor_y = local.y - size.height() as f32 * 0.5;

        let anchor = CellCoord::new(
            clamp_axis(anchor_x.round(), self.columns, size.width()),
            clamp_axis(anchor_y.round(), self.rows, size.height()),
        );

        (self.cell_rect_to_world_center(anchor, size), anchor)
    }
}

fn clamp_axis(value: f32, dimension: u32, extent: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }

    let max = dimension.saturating_sub(extent);
    if value >= max as f32 {
        max
    } else {
        value as u32
    }
}
