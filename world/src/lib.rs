#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level session state for Block Jam.
//!
//! A [`World`] is built from a validated [`LevelDefinition`] and mutated only
//! through [`apply`]. Blocks are value records keyed by [`BlockId`]; the block
//! occupancy grid is kept in lockstep with their footprints. Goals never move
//! and never enter the occupancy grid, so a block may rest on a goal strip.

pub mod geometry;
pub mod navigation;
pub mod occupancy;

use std::collections::BTreeMap;

use block_jam_core::{
    BlockColor, BlockId, CellCoord, Command, Event, Footprint, GoalId, LevelDefinition,
    LevelError, PlacementError,
};
use glam::Vec2;
use tracing::{debug, info};

pub use geometry::GridGeometry;
pub use occupancy::OccupancyGrid;

/// Final result of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelOutcome {
    /// Every block reached a goal of its color.
    Completed,
    /// The move budget ran out first.
    Failed,
}

#[derive(Clone, Copy, Debug)]
struct Block {
    color: BlockColor,
    footprint: Footprint,
}

#[derive(Clone, Copy, Debug)]
struct Goal {
    id: GoalId,
    color: BlockColor,
    footprint: Footprint,
}

/// Represents one play session of a level.
#[derive(Clone, Debug)]
pub struct World {
    level: LevelDefinition,
    geometry: GridGeometry,
    goals: Vec<Goal>,
    blocks: BTreeMap<BlockId, Block>,
    occupancy: OccupancyGrid,
    moves: u32,
    consumed: u32,
    total_blocks: u32,
    outcome: Option<LevelOutcome>,
}

impl World {
    /// Starts a session for the level with the grid centered on the world origin.
    pub fn new(level: LevelDefinition) -> Result<Self, LevelError> {
        Self::with_origin(level, Vec2::ZERO)
    }

    /// Starts a session for the level with the grid centered on `origin`.
    ///
    /// The definition is validated again because it may have been deserialized.
    pub fn with_origin(level: LevelDefinition, origin: Vec2) -> Result<Self, LevelError> {
        level.validate()?;

        let geometry = GridGeometry::new(
            level.grid_width(),
            level.grid_height(),
            level.cell_size(),
            origin,
        );
        let goals = level
            .goals()
            .iter()
            .enumerate()
            .map(|(index, goal)| Goal {
                id: GoalId::new(index as u32),
                color: goal.color,
                footprint: goal.footprint,
            })
            .collect();

        let mut world = Self {
            occupancy: OccupancyGrid::new(level.grid_width(), level.grid_height()),
            geometry,
            goals,
            blocks: BTreeMap::new(),
            moves: 0,
            consumed: 0,
            total_blocks: 0,
            outcome: None,
            level,
        };
        world.reset_blocks();
        Ok(world)
    }

    fn reset_blocks(&mut self) {
        self.occupancy = OccupancyGrid::new(self.level.grid_width(), self.level.grid_height());
        self.blocks = self
            .level
            .blocks()
            .iter()
            .enumerate()
            .map(|(index, spawn)| {
                (
                    BlockId::new(index as u32),
                    Block {
                        color: spawn.color,
                        footprint: spawn.footprint,
                    },
                )
            })
            .collect();
        for block in self.blocks.values() {
            self.occupancy
                .place(block.footprint.anchor(), block.footprint.size());
        }

        self.total_blocks = self.blocks.len() as u32;
        self.moves = 0;
        self.consumed = 0;
        self.outcome = None;
    }

    fn place_block(&mut self, id: BlockId, anchor: CellCoord, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            reject(id, anchor, PlacementError::SessionLocked, out_events);
            return;
        }

        let Some(block) = self.blocks.get(&id).copied() else {
            reject(id, anchor, PlacementError::MissingBlock, out_events);
            return;
        };

        let from = block.footprint.anchor();
        let size = block.footprint.size();
        self.occupancy.remove(from, size);
        if let Err(reason) = self.occupancy.check_placement(anchor, size) {
            self.occupancy.place(from, size);
            reject(id, anchor, reason, out_events);
            return;
        }

        let footprint = block.footprint.with_anchor(anchor);
        self.occupancy.place(anchor, size);
        if let Some(stored) = self.blocks.get_mut(&id) {
            stored.footprint = footprint;
        }

        self.moves = self.moves.saturating_add(1);
        out_events.push(Event::MoveRegistered {
            block: id,
            from,
            to: anchor,
            moves: self.moves,
        });

        let matching_goal = self.goals.iter().find(|goal| {
            goal.color == block.color && goal.footprint.rect().intersects(&footprint.rect())
        });
        if let Some(goal) = matching_goal.copied() {
            self.occupancy.remove(anchor, size);
            let _ = self.blocks.remove(&id);
            self.consumed = self.consumed.saturating_add(1);
            debug!(block = id.get(), goal = goal.id.get(), color = %goal.color, "block consumed");
            out_events.push(Event::EntityConsumed {
                block: id,
                goal: goal.id,
                color: goal.color,
            });
        }

        self.evaluate_outcome(out_events);
    }

    fn evaluate_outcome(&mut self, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }

        if self.consumed >= self.total_blocks {
            self.outcome = Some(LevelOutcome::Completed);
            info!(moves = self.moves, "level completed");
            out_events.push(Event::LevelCompleted { moves: self.moves });
        } else if self.moves >= self.level.max_moves() {
            self.outcome = Some(LevelOutcome::Failed);
            info!(
                moves = self.moves,
                remaining = self.total_blocks - self.consumed,
                "level failed"
            );
            out_events.push(Event::LevelFailed { moves: self.moves });
        }
    }
}

fn reject(block: BlockId, anchor: CellCoord, reason: PlacementError, out_events: &mut Vec<Event>) {
    debug!(block = block.get(), ?anchor, %reason, "placement rejected");
    out_events.push(Event::PlacementRejected {
        block,
        anchor,
        reason,
    });
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceBlock { block, anchor } => world.place_block(block, anchor, out_events),
        Command::RestartLevel => {
            world.reset_blocks();
            info!(
                blocks = world.total_blocks,
                max_moves = world.level.max_moves(),
                "level started"
            );
            out_events.push(Event::LevelStarted {
                blocks: world.total_blocks,
                max_moves: world.level.max_moves(),
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use block_jam_core::{BlockColor, BlockId, CellCoord, Footprint, GoalId, LevelDefinition};
    use glam::Vec2;

    use super::{GridGeometry, LevelOutcome, OccupancyGrid, World};

    /// Mapping between grid cells and world positions for the session.
    #[must_use]
    pub fn geometry(world: &World) -> &GridGeometry {
        &world.geometry
    }

    /// Level definition the session was started from.
    #[must_use]
    pub fn level(world: &World) -> &LevelDefinition {
        &world.level
    }

    /// Occupancy of every block still on the board.
    #[must_use]
    pub fn occupancy(world: &World) -> &OccupancyGrid {
        &world.occupancy
    }

    /// Occupancy with the provided block's cells cleared.
    ///
    /// This is the grid a block sees while it is being moved.
    #[must_use]
    pub fn occupancy_without(world: &World, block: BlockId) -> OccupancyGrid {
        let mut grid = world.occupancy.clone();
        if let Some(entry) = world.blocks.get(&block) {
            grid.remove(entry.footprint.anchor(), entry.footprint.size());
        }
        grid
    }

    /// Captures a read-only view of the blocks remaining on the board.
    #[must_use]
    pub fn block_view(world: &World) -> BlockView {
        BlockView {
            snapshots: world
                .blocks
                .iter()
                .map(|(id, block)| BlockSnapshot {
                    id: *id,
                    color: block.color,
                    footprint: block.footprint,
                })
                .collect(),
        }
    }

    /// Snapshot of a single block, if it is still on the board.
    #[must_use]
    pub fn block(world: &World, id: BlockId) -> Option<BlockSnapshot> {
        world.blocks.get(&id).map(|block| BlockSnapshot {
            id,
            color: block.color,
            footprint: block.footprint,
        })
    }

    /// Snapshots of every goal strip in definition order.
    #[must_use]
    pub fn goals(world: &World) -> Vec<GoalSnapshot> {
        world
            .goals
            .iter()
            .map(|goal| GoalSnapshot {
                id: goal.id,
                color: goal.color,
                footprint: goal.footprint,
            })
            .collect()
    }

    /// Block covering the provided cell, if any.
    #[must_use]
    pub fn block_at(world: &World, cell: CellCoord) -> Option<BlockId> {
        world
            .blocks
            .iter()
            .find(|(_, block)| block.footprint.rect().contains(cell))
            .map(|(id, _)| *id)
    }

    /// Block under the provided world position, if any.
    #[must_use]
    pub fn block_at_point(world: &World, point: Vec2) -> Option<BlockId> {
        let cell = world.geometry.world_to_cell(point)?;
        block_at(world, cell)
    }

    /// Committed moves so far.
    #[must_use]
    pub fn moves(world: &World) -> u32 {
        world.moves
    }

    /// Committed moves allowed before the level fails.
    #[must_use]
    pub fn max_moves(world: &World) -> u32 {
        world.level.max_moves()
    }

    /// Moves left before the budget runs out.
    #[must_use]
    pub fn remaining_moves(world: &World) -> u32 {
        world.level.max_moves().saturating_sub(world.moves)
    }

    /// Number of blocks consumed by goals.
    #[must_use]
    pub fn consumed(world: &World) -> u32 {
        world.consumed
    }

    /// Number of blocks the level started with.
    #[must_use]
    pub fn total_blocks(world: &World) -> u32 {
        world.total_blocks
    }

    /// Outcome of the session, once reached.
    #[must_use]
    pub fn outcome(world: &World) -> Option<LevelOutcome> {
        world.outcome
    }

    /// Reports whether the session stopped accepting placements.
    #[must_use]
    pub fn is_locked(world: &World) -> bool {
        world.outcome.is_some()
    }

    /// Read-only snapshot describing all blocks on the board.
    #[derive(Clone, Debug)]
    pub struct BlockView {
        snapshots: Vec<BlockSnapshot>,
    }

    impl BlockView {
        /// Iterator over the captured block snapshots ordered by identifier.
        pub fn iter(&self) -> impl Iterator<Item = &BlockSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<BlockSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a block used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BlockSnapshot {
        /// Identifier assigned to the block.
        pub id: BlockId,
        /// Color of the block.
        pub color: BlockColor,
        /// Cells currently covered by the block.
        pub footprint: Footprint,
    }

    /// Immutable representation of a goal strip used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct GoalSnapshot {
        /// Identifier assigned to the goal.
        pub id: GoalId,
        /// Color of blocks the goal accepts.
        pub color: BlockColor,
        /// Cells covered by the goal strip.
        pub footprint: Footprint,
    }
}
