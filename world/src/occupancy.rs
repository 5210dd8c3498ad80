//! Dense occupancy grid shared by the level session and the generator.

use block_jam_core::{CellCoord, CellRect, CellRectSize, PlacementError};

/// Row-major boolean map of the cells currently covered by a footprint.
///
/// A cell is `true` exactly when one placed footprint covers it. The grid never
/// validates writes: callers check a rectangle with [`OccupancyGrid::can_place`]
/// before marking it, and clear precisely the rectangle they marked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    columns: u32,
    rows: u32,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// Creates an empty grid with the provided dimensions.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![false; capacity],
        }
    }

    /// Provides the dimensions of the grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Reports whether the cell is covered by a footprint.
    ///
    /// Cells outside the grid are reported as free; bounds are enforced by the
    /// placement checks instead.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(false)
    }

    /// Number of covered cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|occupied| **occupied).count()
    }

    /// Explains why a rectangle cannot be placed, if it cannot.
    pub fn check_placement(
        &self,
        anchor: CellCoord,
        size: CellRectSize,
    ) -> Result<(), PlacementError> {
        let rect = CellRect::from_origin_and_size(anchor, size);
        if !rect.fits_within(self.columns, self.rows) {
            return Err(PlacementError::OutOfBounds);
        }

        if rect.cells().any(|cell| self.is_occupied(cell)) {
            return Err(PlacementError::Occupied);
        }

        Ok(())
    }

    /// Reports whether the rectangle lies inside the grid and covers only free cells.
    #[must_use]
    pub fn can_place(&self, anchor: CellCoord, size: CellRectSize) -> bool {
        self.check_placement(anchor, size).is_ok()
    }

    /// Marks every in-bounds cell of the rectangle as covered.
    pub fn place(&mut self, anchor: CellCoord, size: CellRectSize) {
        self.fill(CellRect::from_origin_and_size(anchor, size), true);
    }

    /// Clears every in-bounds cell of the rectangle.
    pub fn remove(&mut self, anchor: CellCoord, size: CellRectSize) {
        self.fill(CellRect::from_origin_and_size(anchor, size), false);
    }

    /// Clamps each anchor axis into `[0, dimension - size]`.
    #[must_use]
    pub fn clamp_anchor(&self, anchor: CellCoord, size: CellRectSize) -> CellCoord {
        clamp_anchor_for(self.columns, self.rows, anchor, size)
    }

    fn fill(&mut self, rect: CellRect, value: bool) {
        for cell in rect.cells() {
            if let Some(index) = self.index(cell) {
                if let Some(slot) = self.cells.get_mut(index) {
                    *slot = value;
                }
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Clamps an anchor so a rectangle of `size` fits a `columns × rows` grid where possible.
///
/// Rectangles larger than the grid clamp to the zero anchor.
#[must_use]
pub fn clamp_anchor_for(
    columns: u32,
    rows: u32,
    anchor: CellCoord,
    size: CellRectSize,
) -> CellCoord {
    let max_column = columns.saturating_sub(size.width());
    let max_row = rows.saturating_sub(size.height());
    CellCoord::new(anchor.column().min(max_column), anchor.row().min(max_row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grid_accepts_rect_inside_bounds() {
        let grid = OccupancyGrid::new(5, 5);
        assert!(grid.can_place(CellCoord::new(1, 1), CellRectSize::new(4, 1)));
        assert!(grid.can_place(CellCoord::new(0, 1), CellRectSize::new(1, 4)));
    }

    #[test]
    fn rect_crossing_edge_is_out_of_bounds() {
        let grid = OccupancyGrid::new(5, 5);
        assert_eq!(
            grid.check_placement(CellCoord::new(2, 0), CellRectSize::new(4, 1)),
            Err(PlacementError::OutOfBounds)
        );
        assert_eq!(
            grid.check_placement(CellCoord::new(0, 0), CellRectSize::new(0, 1)),
            Err(PlacementError::OutOfBounds)
        );
    }

    #[test]
    fn placed_rect_blocks_overlapping_rects_until_removed() {
        let mut grid = OccupancyGrid::new(6, 6);
        let anchor = CellCoord::new(2, 2);
        let size = CellRectSize::new(1, 3);
        grid.place(anchor, size);

        assert_eq!(grid.occupied_count(), 3);
        assert_eq!(
            grid.check_placement(CellCoord::new(0, 3), CellRectSize::new(4, 1)),
            Err(PlacementError::Occupied)
        );
        assert!(grid.can_place(CellCoord::new(3, 3), CellRectSize::new(3, 1)));

        grid.remove(anchor, size);
        assert_eq!(grid.occupied_count(), 0);
        assert!(grid.can_place(CellCoord::new(0, 3), CellRectSize::new(4, 1)));
    }

    #[test]
    fn clamp_anchor_keeps_rect_inside() {
        let grid = OccupancyGrid::new(10, 8);
        let clamped = grid.clamp_anchor(CellCoord::new(9, 7), CellRectSize::new(4, 1));
        assert_eq!(clamped, CellCoord::new(6, 7));
        let clamped = grid.clamp_anchor(CellCoord::new(3, 7), CellRectSize::new(1, 4));
        assert_eq!(clamped, CellCoord::new(3, 4));
    }

    #[test]
    fn clamp_anchor_handles_oversized_rects() {
        let clamped = clamp_anchor_for(2, 2, CellCoord::new(1, 1), CellRectSize::new(4, 1));
        assert_eq!(clamped, CellCoord::new(0, 1));
    }
}
