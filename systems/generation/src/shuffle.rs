//! Scrambles a solved board by relocating blocks along reachable paths.

use block_jam_core::{
    BlockSpawn, CellCoord, Footprint, GoalSpawn, Orientation, MAX_FOOTPRINT_LENGTH,
    MIN_FOOTPRINT_LENGTH,
};
use block_jam_world::{navigation, OccupancyGrid};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::sampling::{biased_anchor, destination_score};
use crate::{GenerationConfig, GenerationDiagnostic};

/// Single committed shuffle step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleMove {
    /// Position of the moved block in the level's block list.
    pub block_index: usize,
    /// Footprint held before the step.
    pub from: Footprint,
    /// Footprint held after the step; length and orientation may differ.
    pub to: Footprint,
}

/// Applies up to `steps` shuffle steps to `blocks` in place.
///
/// Each step picks a block uniformly, samples a new footprint, and accepts the
/// first candidate that keeps its distance from the block's own goal, fits on
/// the block layer, and is reachable from the old anchor with the old size.
/// Failed steps are retried until `shuffle_retry_budget` is spent.
pub(crate) fn shuffle_blocks<R: Rng>(
    config: &GenerationConfig,
    goals: &[GoalSpawn],
    blocks: &mut [BlockSpawn],
    steps: u32,
    rng: &mut R,
    diagnostics: &mut Vec<GenerationDiagnostic>,
) -> Vec<ShuffleMove> {
    let mut occupancy = OccupancyGrid::new(config.grid_width, config.grid_height);
    for block in blocks.iter() {
        occupancy.place(block.footprint.anchor(), block.footprint.size());
    }

    let mut log = Vec::new();
    if blocks.is_empty() {
        return log;
    }

    let mut failures = 0_u32;
    while (log.len() as u64) < u64::from(steps) {
        let index = rng.gen_range(0..blocks.len());
        let block = blocks[index];
        let from = block.footprint;
        occupancy.remove(from.anchor(), from.size());

        let own_goal = goals
            .iter()
            .find(|goal| goal.color == block.color)
            .map(|goal| goal.footprint.anchor());
        let other_anchors: Vec<CellCoord> = blocks
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .map(|(_, other)| other.footprint.anchor())
            .collect();

        match find_destination(config, &occupancy, from, own_goal, &other_anchors, rng) {
            Some(to) => {
                occupancy.place(to.anchor(), to.size());
                blocks[index].footprint = to;
                debug!(block = index, from = ?from.anchor(), to = ?to.anchor(), length = to.length(), "shuffle step committed");
                log.push(ShuffleMove {
                    block_index: index,
                    from,
                    to,
                });
            }
            None => {
                occupancy.place(from.anchor(), from.size());
                failures = failures.saturating_add(1);
                debug!(block = index, failures, "shuffle step found no destination");
                if failures > config.shuffle_retry_budget {
                    let completed = log.len() as u32;
                    warn!(requested = steps, completed, "shuffle aborted");
                    diagnostics.push(GenerationDiagnostic::ShuffleAborted {
                        requested: steps,
                        completed,
                    });
                    break;
                }
            }
        }
    }

    log
}

fn find_destination<R: Rng>(
    config: &GenerationConfig,
    occupancy: &OccupancyGrid,
    from: Footprint,
    own_goal: Option<CellCoord>,
    other_anchors: &[CellCoord],
    rng: &mut R,
) -> Option<Footprint> {
    let (columns, rows) = occupancy.dimensions();

    for _ in 0..config.attempts_per_shuffle_step {
        let length = rng.gen_range(MIN_FOOTPRINT_LENGTH..=MAX_FOOTPRINT_LENGTH);
        let orientation = if rng.gen_bool(0.5) {
            Orientation::AlongX
        } else {
            Orientation::AlongZ
        };
        let size = orientation.size_for(length);

        let sampled = biased_anchor(rng, columns, rows, config.block_center_bias, |cell| {
            destination_score(cell, columns, rows, other_anchors)
        });
        let anchor = occupancy.clamp_anchor(sampled, size);

        if let Some(goal_anchor) = own_goal {
            if anchor.manhattan_distance(goal_anchor) < config.min_dist_from_own_goal {
                continue;
            }
        }
        if !occupancy.can_place(anchor, size) {
            continue;
        }
        if !navigation::reachable(occupancy, from.size(), from.anchor(), anchor) {
            continue;
        }

        return Some(Footprint::new(anchor, length, orientation));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_jam_core::BlockColor;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn solved_pair(footprint: Footprint) -> (Vec<GoalSpawn>, Vec<BlockSpawn>) {
        (
            vec![GoalSpawn {
                color: BlockColor::Red,
                footprint,
            }],
            vec![BlockSpawn {
                color: BlockColor::Red,
                footprint,
            }],
        )
    }

    #[test]
    fn single_step_moves_block_away_from_wall_goal() {
        let config = GenerationConfig {
            pair_count: 1,
            min_dist_from_own_goal: 2,
            ..GenerationConfig::default()
        };
        let goal = Footprint::new(CellCoord::new(0, 3), 4, Orientation::AlongZ);

        for seed in 0..16 {
            let (goals, mut blocks) = solved_pair(goal);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut diagnostics = Vec::new();
            let log = shuffle_blocks(&config, &goals, &mut blocks, 1, &mut rng, &mut diagnostics);

            assert_eq!(log.len(), 1);
            assert!(diagnostics.is_empty());
            let moved = blocks[0].footprint;
            assert_eq!(log[0].to, moved);
            assert!(moved.anchor().manhattan_distance(CellCoord::new(0, 3)) >= 2);
            assert!(OccupancyGrid::new(10, 10).can_place(moved.anchor(), moved.size()));
        }
    }

    #[test]
    fn trapped_block_aborts_after_retry_budget() {
        let config = GenerationConfig {
            grid_width: 1,
            grid_height: 1,
            pair_count: 1,
            attempts_per_shuffle_step: 5,
            shuffle_retry_budget: 3,
            ..GenerationConfig::default()
        };
        let start = Footprint::new(CellCoord::new(0, 0), 1, Orientation::AlongX);
        let (goals, mut blocks) = solved_pair(start);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut diagnostics = Vec::new();

        let log = shuffle_blocks(&config, &goals, &mut blocks, 2, &mut rng, &mut diagnostics);

        assert!(log.is_empty());
        assert_eq!(blocks[0].footprint, start);
        assert_eq!(
            diagnostics,
            vec![GenerationDiagnostic::ShuffleAborted {
                requested: 2,
                completed: 0,
            }]
        );
    }

    #[test]
    fn shuffled_blocks_never_overlap() {
        let config = GenerationConfig::default();
        let goals: Vec<GoalSpawn> = [
            (BlockColor::Blue, CellCoord::new(0, 0), Orientation::AlongZ),
            (BlockColor::Red, CellCoord::new(9, 0), Orientation::AlongZ),
            (BlockColor::Green, CellCoord::new(3, 9), Orientation::AlongX),
            (BlockColor::Yellow, CellCoord::new(3, 4), Orientation::AlongX),
        ]
        .into_iter()
        .map(|(color, anchor, orientation)| GoalSpawn {
            color,
            footprint: Footprint::new(anchor, 4, orientation),
        })
        .collect();
        let mut blocks: Vec<BlockSpawn> = goals
            .iter()
            .map(|goal| BlockSpawn {
                color: goal.color,
                footprint: goal.footprint,
            })
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut diagnostics = Vec::new();
        let log = shuffle_blocks(&config, &goals, &mut blocks, 12, &mut rng, &mut diagnostics);

        assert_eq!(log.len(), 12);
        for (index, first) in blocks.iter().enumerate() {
            assert!(first.footprint.rect().fits_within(10, 10));
            for second in &blocks[index + 1..] {
                assert!(!first.footprint.rect().intersects(&second.footprint.rect()));
            }
        }
    }
}
