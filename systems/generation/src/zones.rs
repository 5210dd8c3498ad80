//! Goal strip placement in wall and center zones.

use block_jam_core::{BlockColor, CellCoord, CellRectSize, Footprint, GoalSpawn, Orientation};
use block_jam_world::OccupancyGrid;
use rand::Rng;
use tracing::{debug, warn};

use crate::{GenerationConfig, GenerationDiagnostic};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WallSide {
    Left,
    Right,
    Bottom,
    Top,
}

impl WallSide {
    const ALL: [WallSide; 4] = [Self::Left, Self::Right, Self::Bottom, Self::Top];

    const fn orientation(self) -> Orientation {
        match self {
            Self::Left | Self::Right => Orientation::AlongZ,
            Self::Bottom | Self::Top => Orientation::AlongX,
        }
    }
}

/// Places one goal strip per color, skipping colors that run out of attempts.
///
/// Goals never overlap each other. Every skipped color is reported through
/// `diagnostics`.
pub(crate) fn place_goals<R: Rng>(
    config: &GenerationConfig,
    colors: &[BlockColor],
    rng: &mut R,
    diagnostics: &mut Vec<GenerationDiagnostic>,
) -> Vec<GoalSpawn> {
    let mut occupancy = OccupancyGrid::new(config.grid_width, config.grid_height);
    let mut goals = Vec::with_capacity(colors.len());

    for &color in colors {
        match place_goal(config, &occupancy, rng) {
            Some(footprint) => {
                occupancy.place(footprint.anchor(), footprint.size());
                debug!(%color, anchor = ?footprint.anchor(), orientation = ?footprint.orientation(), "goal placed");
                goals.push(GoalSpawn { color, footprint });
            }
            None => {
                warn!(%color, "goal placement attempts exhausted");
                diagnostics.push(GenerationDiagnostic::GoalPlacementFailed { color });
            }
        }
    }

    goals
}

fn place_goal<R: Rng>(
    config: &GenerationConfig,
    occupancy: &OccupancyGrid,
    rng: &mut R,
) -> Option<Footprint> {
    for _ in 0..config.goal_placement_attempts {
        let candidate = if rng.gen::<f32>() < config.goal_wall_chance {
            wall_candidate(config, occupancy, rng)
        } else {
            center_candidate(config, occupancy, rng)
        };

        if candidate.is_some() {
            return candidate;
        }
    }

    None
}

fn wall_candidate<R: Rng>(
    config: &GenerationConfig,
    occupancy: &OccupancyGrid,
    rng: &mut R,
) -> Option<Footprint> {
    let side = WallSide::ALL[rng.gen_range(0..WallSide::ALL.len())];
    let orientation = side.orientation();
    let size = orientation.size_for(config.goal_length);
    let (columns, rows) = occupancy.dimensions();

    let max_column = columns.checked_sub(size.width())?;
    let max_row = rows.checked_sub(size.height())?;
    let anchor = match side {
        WallSide::Left => CellCoord::new(0, rng.gen_range(0..=max_row)),
        WallSide::Right => CellCoord::new(max_column, rng.gen_range(0..=max_row)),
        WallSide::Bottom => CellCoord::new(rng.gen_range(0..=max_column), 0),
        WallSide::Top => CellCoord::new(rng.gen_range(0..=max_column), max_row),
    };

    occupancy
        .can_place(anchor, size)
        .then(|| Footprint::new(anchor, config.goal_length, orientation))
}

fn center_candidate<R: Rng>(
    config: &GenerationConfig,
    occupancy: &OccupancyGrid,
    rng: &mut R,
) -> Option<Footprint> {
    let orientation = if rng.gen_bool(0.5) {
        Orientation::AlongX
    } else {
        Orientation::AlongZ
    };
    let size = orientation.size_for(config.goal_length);
    let (columns, rows) = occupancy.dimensions();
    let max_column = columns.checked_sub(size.width())?;
    let max_row = rows.checked_sub(size.height())?;

    for _ in 0..config.center_samples_per_attempt {
        let anchor = CellCoord::new(rng.gen_range(0..=max_column), rng.gen_range(0..=max_row));
        if !near_center(anchor, size, columns, rows, config.center_radius) {
            continue;
        }
        if !occupancy.can_place(anchor, size) {
            continue;
        }
        return Some(Footprint::new(anchor, config.goal_length, orientation));
    }

    None
}

/// Reports whether the rectangle's center lies within `radius` of the grid
/// center, measured as a Manhattan distance of per-axis offsets rounded half
/// to even.
pub(crate) fn near_center(
    anchor: CellCoord,
    size: CellRectSize,
    columns: u32,
    rows: u32,
    radius: u32,
) -> bool {
    let rect_x = anchor.column() as f32 + size.width() as f32 * 0.5;
    let rect_y = anchor.row() as f32 + size.height() as f32 * 0.5;
    let grid_x = columns as f32 * 0.5;
    let grid_y = rows as f32 * 0.5;

    let dx = (rect_x - grid_x).round_ties_even().abs();
    let dy = (rect_y - grid_y).round_ties_even().abs();
    dx + dy <= radius as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn center_distance_rounds_half_to_even() {
        // Center of a 1x4 strip at (4, 3) on 10x10 is (4.5, 5.0); offset -0.5 rounds to 0.
        assert!(near_center(
            CellCoord::new(4, 3),
            CellRectSize::new(1, 4),
            10,
            10,
            1
        ));
        // Offset 1.5 rounds to 2.
        assert!(!near_center(
            CellCoord::new(6, 3),
            CellRectSize::new(1, 4),
            10,
            10,
            1
        ));
        assert!(near_center(
            CellCoord::new(6, 3),
            CellRectSize::new(1, 4),
            10,
            10,
            2
        ));
    }

    #[test]
    fn wall_only_goals_hug_an_edge_with_matching_orientation() {
        let config = GenerationConfig {
            goal_wall_chance: 1.0,
            ..GenerationConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut diagnostics = Vec::new();
        let goals = place_goals(&config, &BlockColor::ALL, &mut rng, &mut diagnostics);

        assert_eq!(goals.len(), 4);
        assert!(diagnostics.is_empty());
        for goal in &goals {
            let anchor = goal.footprint.anchor();
            match goal.footprint.orientation() {
                Orientation::AlongZ => assert!(anchor.column() == 0 || anchor.column() == 9),
                Orientation::AlongX => assert!(anchor.row() == 0 || anchor.row() == 9),
            }
            assert_eq!(goal.footprint.length(), 4);
        }
        for (index, first) in goals.iter().enumerate() {
            for second in &goals[index + 1..] {
                assert!(!first.footprint.rect().intersects(&second.footprint.rect()));
            }
        }
    }

    #[test]
    fn center_only_goals_stay_within_radius() {
        let config = GenerationConfig {
            goal_wall_chance: 0.0,
            pair_count: 2,
            ..GenerationConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut diagnostics = Vec::new();
        let goals = place_goals(
            &config,
            &[BlockColor::Red, BlockColor::Green],
            &mut rng,
            &mut diagnostics,
        );

        assert_eq!(goals.len(), 2);
        for goal in &goals {
            assert!(near_center(
                goal.footprint.anchor(),
                goal.footprint.size(),
                10,
                10,
                config.center_radius
            ));
        }
    }

    #[test]
    fn impossible_goal_is_reported() {
        let config = GenerationConfig {
            grid_width: 3,
            grid_height: 3,
            goal_placement_attempts: 20,
            ..GenerationConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut diagnostics = Vec::new();
        let goals = place_goals(&config, &[BlockColor::Blue], &mut rng, &mut diagnostics);

        assert!(goals.is_empty());
        assert_eq!(
            diagnostics,
            vec![GenerationDiagnostic::GoalPlacementFailed {
                color: BlockColor::Blue
            }]
        );
    }
}
