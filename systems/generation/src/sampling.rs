//! Bias-weighted anchor sampling over the grid.

use block_jam_core::CellCoord;
use rand::Rng;

const UNIFORM_BIAS_THRESHOLD: f32 = 0.001;
const MIN_CELL_SCORE: f32 = 0.001;
const CENTER_WEIGHT: f32 = 0.65;
const CLUSTER_WEIGHT: f32 = 0.35;

/// Samples a cell by inverse CDF over per-cell weights.
///
/// Each cell weighs `(1 - bias) + bias * max(0.001, score(cell))`, so a zero
/// bias degenerates to a uniform pick and a full bias follows `score`.
pub(crate) fn biased_anchor<R, F>(
    rng: &mut R,
    columns: u32,
    rows: u32,
    bias: f32,
    score: F,
) -> CellCoord
where
    R: Rng,
    F: Fn(CellCoord) -> f32,
{
    let bias = bias.clamp(0.0, 1.0);
    if bias <= UNIFORM_BIAS_THRESHOLD {
        return uniform_cell(rng, columns, rows);
    }

    let cells: Vec<CellCoord> = (0..rows)
        .flat_map(|row| (0..columns).map(move |column| CellCoord::new(column, row)))
        .collect();
    let weights: Vec<f32> = cells
        .iter()
        .map(|cell| {
            let score = score(*cell).clamp(0.0, 1.0);
            (1.0 - bias) + bias * score.max(MIN_CELL_SCORE)
        })
        .collect();
    let total: f32 = weights.iter().sum();

    let pick = rng.gen::<f32>() * total;
    let mut accumulated = 0.0;
    for (cell, weight) in cells.iter().zip(&weights) {
        accumulated += weight;
        if pick <= accumulated {
            return *cell;
        }
    }

    uniform_cell(rng, columns, rows)
}

fn uniform_cell<R: Rng>(rng: &mut R, columns: u32, rows: u32) -> CellCoord {
    CellCoord::new(
        rng.gen_range(0..columns.max(1)),
        rng.gen_range(0..rows.max(1)),
    )
}

/// Blend of [`center_score`] and [`cluster_score`] used for shuffle destinations.
pub(crate) fn destination_score(
    cell: CellCoord,
    columns: u32,
    rows: u32,
    other_anchors: &[CellCoord],
) -> f32 {
    let blended = CENTER_WEIGHT * center_score(cell, columns, rows)
        + CLUSTER_WEIGHT * cluster_score(cell, other_anchors);
    blended.clamp(0.0, 1.0)
}

/// Scores 1 at the grid center falling to 0 at the corners.
pub(crate) fn center_score(cell: CellCoord, columns: u32, rows: u32) -> f32 {
    let center_x = (columns as f32 - 1.0) * 0.5;
    let center_y = (rows as f32 - 1.0) * 0.5;

    let normalized_x = normalized_offset(cell.column() as f32, center_x);
    let normalized_y = normalized_offset(cell.row() as f32, center_y);

    1.0 - ((normalized_x + normalized_y) * 0.5).clamp(0.0, 1.0)
}

fn normalized_offset(value: f32, center: f32) -> f32 {
    if center <= 0.0 {
        0.0
    } else {
        (value - center).abs() / center
    }
}

/// Scores `1 / d` for the Manhattan distance `d` to the nearest other anchor.
///
/// Distances below one count as one; no other anchors scores zero.
pub(crate) fn cluster_score(cell: CellCoord, other_anchors: &[CellCoord]) -> f32 {
    other_anchors
        .iter()
        .map(|anchor| cell.manhattan_distance(*anchor))
        .min()
        .map_or(0.0, |nearest| (1.0 / nearest.max(1) as f32).clamp(0.0, 1.0))
}
