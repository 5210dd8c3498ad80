#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic procedural level generation for Block Jam.
//!
//! A level starts solved: goal strips are placed in wall or center zones and
//! every block is spawned on top of its own goal. The shuffler then walks the
//! blocks away along reachable paths, and the move budget is derived from the
//! number of shuffle steps requested.

mod config;
mod sampling;
mod shuffle;
pub mod solvability;
mod zones;

use std::fmt;

use block_jam_core::{BlockColor, BlockSpawn, LevelDefinition, LevelError};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub use config::{ConfigError, GenerationConfig};
pub use shuffle::ShuffleMove;

/// Soft failures recorded while generating a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationDiagnostic {
    /// No goal strip of this color could be placed, so the pair was dropped.
    GoalPlacementFailed {
        /// Color of the dropped pair.
        color: BlockColor,
    },
    /// Shuffling stopped before the requested number of steps.
    ShuffleAborted {
        /// Steps requested for the level.
        requested: u32,
        /// Steps that were committed.
        completed: u32,
    },
    /// A block never left its own goal strip.
    BlockOnOwnGoal {
        /// Color of the block.
        color: BlockColor,
    },
    /// The planner found no placement sequence within the move budget.
    NoPlanFound {
        /// Move budget of the level.
        max_moves: u32,
    },
}

impl fmt::Display for GenerationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoalPlacementFailed { color } => {
                write!(f, "could not place the {color} goal; pair dropped")
            }
            Self::ShuffleAborted {
                requested,
                completed,
            } => write!(f, "shuffle stopped after {completed} of {requested} steps"),
            Self::BlockOnOwnGoal { color } => {
                write!(f, "{color} block still rests on its own goal")
            }
            Self::NoPlanFound { max_moves } => {
                write!(f, "no solution found within {max_moves} moves")
            }
        }
    }
}

/// Errors that prevent a batch from being generated.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The configuration is out of range.
    #[error("invalid generation config")]
    Config(#[from] ConfigError),
    /// The assembled level failed validation.
    #[error("level {index} failed validation")]
    Level {
        /// One-based number of the level.
        index: u32,
        /// Validation failure.
        #[source]
        source: LevelError,
    },
}

/// Level produced by the generator together with its provenance.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedLevel {
    /// Zero-based position of the level in its batch.
    pub index: u32,
    /// Playable level.
    pub definition: LevelDefinition,
    /// Committed shuffle steps in order.
    pub shuffle_log: Vec<ShuffleMove>,
    /// Soft failures encountered while generating the level.
    pub diagnostics: Vec<GenerationDiagnostic>,
}

/// Generator bound to a validated configuration.
#[derive(Clone, Debug)]
pub struct LevelGenerator {
    config: GenerationConfig,
}

impl LevelGenerator {
    /// Validates the configuration and builds a generator for it.
    pub fn new(config: GenerationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration the generator was built with.
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generates every level of the batch in order.
    pub fn generate_batch(&self) -> Result<Vec<GeneratedLevel>, GenerationError> {
        let levels = (0..self.config.level_count)
            .map(|index| self.generate(index))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            levels = levels.len(),
            seed = self.config.seed,
            "batch generated"
        );
        Ok(levels)
    }

    /// Generates the level at `level_index`.
    ///
    /// Every level draws from its own random stream, so the result does not
    /// depend on which other levels were generated.
    pub fn generate(&self, level_index: u32) -> Result<GeneratedLevel, GenerationError> {
        let config = &self.config;
        let mut rng = level_rng(config.seed, level_index);
        let mut diagnostics = Vec::new();

        let mut palette = BlockColor::ALL;
        palette.shuffle(&mut rng);
        let colors = &palette[..config.effective_pair_count()];

        let goals = zones::place_goals(config, colors, &mut rng, &mut diagnostics);
        let mut blocks: Vec<BlockSpawn> = goals
            .iter()
            .map(|goal| BlockSpawn {
                color: goal.color,
                footprint: goal.footprint,
            })
            .collect();

        let steps = config.shuffle_steps_for(level_index);
        let shuffle_log =
            shuffle::shuffle_blocks(config, &goals, &mut blocks, steps, &mut rng, &mut diagnostics);

        for block in &blocks {
            let on_own_goal = goals.iter().any(|goal| {
                goal.color == block.color
                    && goal.footprint.rect().intersects(&block.footprint.rect())
            });
            if on_own_goal {
                warn!(level = level_index + 1, color = %block.color, "block left on its own goal");
                diagnostics.push(GenerationDiagnostic::BlockOnOwnGoal { color: block.color });
            }
        }

        let max_moves = config.max_moves_for(level_index);
        let definition = LevelDefinition::new(
            config.grid_width,
            config.grid_height,
            config.cell_size,
            max_moves,
            goals,
            blocks,
        )
        .map_err(|source| GenerationError::Level {
            index: level_index + 1,
            source,
        })?;

        if !solvability::is_solvable(&definition) {
            warn!(level = level_index + 1, max_moves, "no solution found");
            diagnostics.push(GenerationDiagnostic::NoPlanFound { max_moves });
        }

        info!(
            level = level_index + 1,
            pairs = definition.blocks().len(),
            steps = shuffle_log.len(),
            max_moves,
            diagnostics = diagnostics.len(),
            "level generated"
        );

        Ok(GeneratedLevel {
            index: level_index,
            definition,
            shuffle_log,
            diagnostics,
        })
    }
}

/// Generates a full batch for `config`.
pub fn generate_levels(config: &GenerationConfig) -> Result<Vec<GeneratedLevel>, GenerationError> {
    LevelGenerator::new(config.clone())?.generate_batch()
}

/// Generates a full batch for `config`, keeping only the level definitions.
pub fn generate_definitions(
    config: &GenerationConfig,
) -> Result<Vec<LevelDefinition>, GenerationError> {
    Ok(generate_levels(config)?
        .into_iter()
        .map(|level| level.definition)
        .collect())
}

fn level_rng(seed: u64, level_index: u32) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(u64::from(level_index));
    rng
}
