//! Tunable options controlling batch level generation.

use block_jam_core::{BlockColor, MAX_FOOTPRINT_LENGTH, MIN_FOOTPRINT_LENGTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Knobs steering goal placement, shuffling, and move budgets for a batch of levels.
///
/// Missing fields fall back to [`GenerationConfig::default`] when deserializing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of levels produced by one batch.
    pub level_count: u32,
    /// Base seed; every level derives an independent stream from it.
    pub seed: u64,
    /// Number of grid columns.
    pub grid_width: u32,
    /// Number of grid rows.
    pub grid_height: u32,
    /// Side length of a cell in world units, copied into every level.
    pub cell_size: f32,
    /// Requested number of block/goal color pairs; clamped to the available colors.
    pub pair_count: u32,
    /// Probability that a goal is attempted flush against a wall rather than near the center.
    pub goal_wall_chance: f32,
    /// Largest rounded Manhattan distance between a center goal and the grid center.
    pub center_radius: u32,
    /// Shuffle steps applied to the first level.
    pub shuffle_steps_base: i32,
    /// Extra shuffle steps added per level index; negative values ease later levels.
    pub shuffle_steps_step: i32,
    /// Moves granted on top of the shuffle steps.
    pub max_moves_buffer: u32,
    /// Smallest Manhattan distance between a shuffled block's anchor and its goal's anchor.
    pub min_dist_from_own_goal: u32,
    /// Candidate destinations sampled before a shuffle step gives up.
    pub attempts_per_shuffle_step: u32,
    /// Blend between uniform destinations (0) and center/cluster weighted ones (1).
    pub block_center_bias: f32,
    /// Length of every goal strip.
    pub goal_length: u8,
    /// Placement attempts per goal before the pair is dropped.
    pub goal_placement_attempts: u32,
    /// Anchor samples tried inside a single center-zone attempt.
    pub center_samples_per_attempt: u32,
    /// Failed shuffle steps tolerated per level before shuffling stops early.
    pub shuffle_retry_budget: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            level_count: 20,
            seed: 12_345,
            grid_width: 10,
            grid_height: 10,
            cell_size: 1.0,
            pair_count: 4,
            goal_wall_chance: 0.6,
            center_radius: 2,
            shuffle_steps_base: 6,
            shuffle_steps_step: 1,
            max_moves_buffer: 3,
            min_dist_from_own_goal: 2,
            attempts_per_shuffle_step: 200,
            block_center_bias: 0.75,
            goal_length: 4,
            goal_placement_attempts: 800,
            center_samples_per_attempt: 200,
            shuffle_retry_budget: 20,
        }
    }
}

impl GenerationConfig {
    /// Checks that every option lies in its supported range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        check_unit_interval("goal_wall_chance", self.goal_wall_chance)?;
        check_unit_interval("block_center_bias", self.block_center_bias)?;
        if self.center_radius == 0 {
            return Err(ConfigError::ZeroCenterRadius);
        }
        if !(MIN_FOOTPRINT_LENGTH..=MAX_FOOTPRINT_LENGTH).contains(&self.goal_length) {
            return Err(ConfigError::InvalidGoalLength(self.goal_length));
        }
        Ok(())
    }

    /// Number of color pairs actually generated per level.
    #[must_use]
    pub fn effective_pair_count(&self) -> usize {
        (self.pair_count as usize).clamp(1, BlockColor::ALL.len())
    }

    /// Shuffle steps requested for the level at `level_index`; never below one.
    #[must_use]
    pub fn shuffle_steps_for(&self, level_index: u32) -> u32 {
        let index = i64::from(level_index);
        let steps = i64::from(self.shuffle_steps_base) + index * i64::from(self.shuffle_steps_step);
        u32::try_from(steps.max(1)).unwrap_or(u32::MAX)
    }

    /// Move budget granted for the level at `level_index`.
    #[must_use]
    pub fn max_moves_for(&self, level_index: u32) -> u32 {
        self.shuffle_steps_for(level_index)
            .saturating_add(self.max_moves_buffer)
    }
}

fn check_unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { field, value })
    }
}

/// Reasons a [`GenerationConfig`] is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid has no cells.
    #[error("grid {width}x{height} has no cells")]
    EmptyGrid {
        /// Configured grid width.
        width: u32,
        /// Configured grid height.
        height: u32,
    },
    /// The cell size is not a positive finite number.
    #[error("cell size {0} must be positive and finite")]
    InvalidCellSize(f32),
    /// A probability-like option lies outside `[0, 1]`.
    #[error("{field} must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange {
        /// Name of the offending option.
        field: &'static str,
        /// Configured value.
        value: f32,
    },
    /// The center zone has no radius.
    #[error("center radius must be at least 1")]
    ZeroCenterRadius,
    /// The goal length lies outside the supported footprint range.
    #[error("goal length {0} must lie in 1..=4")]
    InvalidGoalLength(u8),
}
