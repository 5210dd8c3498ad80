use std::collections::BTreeSet;

use block_jam_core::{CellCoord, CellRectSize};
use block_jam_world::{navigation, OccupancyGrid};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Grows the reachable set until it stops changing, without any queue.
fn brute_force_reachable(
    grid: &OccupancyGrid,
    size: CellRectSize,
    start: CellCoord,
) -> BTreeSet<CellCoord> {
    let (columns, rows) = grid.dimensions();
    let mut reached = BTreeSet::from([start]);

    loop {
        let mut grew = false;
        for row in 0..rows {
            for column in 0..columns {
                let anchor = CellCoord::new(column, row);
                if reached.contains(&anchor) || !grid.can_place(anchor, size) {
                    continue;
                }
                let touches = reached
                    .iter()
                    .any(|other| other.manhattan_distance(anchor) == 1);
                if touches {
                    let _ = reached.insert(anchor);
                    grew = true;
                }
            }
        }
        if !grew {
            return reached;
        }
    }
}

fn random_grid(rng: &mut ChaCha8Rng, columns: u32, rows: u32, density: f64) -> OccupancyGrid {
    let mut grid = OccupancyGrid::new(columns, rows);
    for row in 0..rows {
        for column in 0..columns {
            if rng.gen_bool(density) {
                grid.place(CellCoord::new(column, row), CellRectSize::new(1, 1));
            }
        }
    }
    grid
}

#[test]
fn breadth_first_search_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let sizes = [
        CellRectSize::new(1, 1),
        CellRectSize::new(2, 1),
        CellRectSize::new(1, 3),
        CellRectSize::new(4, 1),
    ];

    for _ in 0..40 {
        let columns = rng.gen_range(1..=6);
        let rows = rng.gen_range(1..=6);
        let grid = random_grid(&mut rng, columns, rows, 0.3);
        let size = sizes[rng.gen_range(0..sizes.len())];
        let start = CellCoord::new(rng.gen_range(0..columns), rng.gen_range(0..rows));

        let expected = brute_force_reachable(&grid, size, start);
        let listed: BTreeSet<CellCoord> = navigation::reachable_anchors(&grid, size, start)
            .into_iter()
            .collect();
        assert_eq!(listed, expected);

        for row in 0..rows {
            for column in 0..columns {
                let target = CellCoord::new(column, row);
                assert_eq!(
                    navigation::reachable(&grid, size, start, target),
                    expected.contains(&target),
                    "grid {columns}x{rows}, size {size:?}, {start:?} -> {target:?}"
                );
            }
        }
    }
}
