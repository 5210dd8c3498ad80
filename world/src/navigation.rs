//! Breadth-first reachability over footprint anchors.
//!
//! The search walks anchor space rather than cell space: a node is the anchor
//! of a fixed-size footprint, an edge is a single-cell step in one of the four
//! cardinal directions, and a node is enterable only when the whole footprint
//! fits on free cells. Callers clear the moving footprint's own cells from the
//! grid before searching.

use std::collections::VecDeque;

use block_jam_core::{CellCoord, CellRectSize};

use crate::OccupancyGrid;

const UNVISITED: u32 = u32::MAX;

/// Reports whether a footprint of `size` can travel from `start` to `target`.
///
/// The start anchor is accepted as-is; every other anchor on the way must fit.
#[must_use]
pub fn reachable(
    grid: &OccupancyGrid,
    size: CellRectSize,
    start: CellCoord,
    target: CellCoord,
) -> bool {
    find_path(grid, size, start, target).is_some()
}

/// Finds a shortest anchor path from `start` to `target`, both included.
///
/// Returns `None` when the start lies outside the grid or no path exists.
#[must_use]
pub fn find_path(
    grid: &OccupancyGrid,
    size: CellRectSize,
    start: CellCoord,
    target: CellCoord,
) -> Option<Vec<CellCoord>> {
    let mut search = AnchorSearch::new(grid, size, start)?;
    let found = search.run(|anchor| anchor == target);
    found.then(|| search.path_to(target))
}

/// Enumerates every anchor reachable from `start`, including `start` itself.
///
/// Anchors are listed in breadth-first discovery order.
#[must_use]
pub fn reachable_anchors(
    grid: &OccupancyGrid,
    size: CellRectSize,
    start: CellCoord,
) -> Vec<CellCoord> {
    let Some(mut search) = AnchorSearch::new(grid, size, start) else {
        return Vec::new();
    };
    let _ = search.run(|_| false);
    search.discovered
}

struct AnchorSearch<'a> {
    grid: &'a OccupancyGrid,
    size: CellRectSize,
    width: usize,
    parents: Vec<u32>,
    queue: VecDeque<CellCoord>,
    discovered: Vec<CellCoord>,
}

impl<'a> AnchorSearch<'a> {
    fn new(grid: &'a OccupancyGrid, size: CellRectSize, start: CellCoord) -> Option<Self> {
        let (columns, rows) = grid.dimensions();
        if start.column() >= columns || start.row() >= rows {
            return None;
        }

        let width = usize::try_from(columns).ok()?;
        let height = usize::try_from(rows).ok()?;
        let cell_count = width.checked_mul(height)?;

        let mut search = Self {
            grid,
            size,
            width,
            parents: vec![UNVISITED; cell_count],
            queue: VecDeque::new(),
            discovered: Vec::new(),
        };

        let start_index = index(width, start)?;
        search.parents[start_index] = u32::try_from(start_index).ok()?;
        search.queue.push_back(start);
        search.discovered.push(start);
        Some(search)
    }

    fn run<F>(&mut self, mut is_target: F) -> bool
    where
        F: FnMut(CellCoord) -> bool,
    {
        let (columns, rows) = self.grid.dimensions();

        while let Some(anchor) = self.queue.pop_front() {
            if is_target(anchor) {
                return true;
            }

            let Some(current_index) = index(self.width, anchor) else {
                continue;
            };
            let Ok(parent) = u32::try_from(current_index) else {
                continue;
            };

            for neighbor in neighbors(anchor, columns, rows) {
                let Some(neighbor_index) = index(self.width, neighbor) else {
                    continue;
                };

                if self.parents[neighbor_index] != UNVISITED {
                    continue;
                }

                if !self.grid.can_place(neighbor, self.size) {
                    continue;
                }

                self.parents[neighbor_index] = parent;
                self.queue.push_back(neighbor);
                self.discovered.push(neighbor);
            }
        }

        false
    }

    fn path_to(&self, target: CellCoord) -> Vec<CellCoord> {
        let mut path = Vec::new();
        let Some(mut current) = index(self.width, target) else {
            return path;
        };

        loop {
            path.push(cell_at(self.width, current));
            let parent = self.parents[current] as usize;
            if parent == current {
                break;
            }
            current = parent;
        }

        path.reverse();
        path
    }
}

fn neighbors(cell: CellCoord, width: u32, height: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(column) = cell.column().checked_add(1) {
        if column < width {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < height {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

fn cell_at(width: usize, index: usize) -> CellCoord {
    let column = index % width;
    let row = index / width;
    CellCoord::new(column as u32, row as u32)
}
