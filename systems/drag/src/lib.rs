#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pointer-driven block dragging with swept collision and grid snapping.
//!
//! The resolver never mutates the session. While a block is held it tracks a
//! continuous position that slides along obstacles; on release it snaps that
//! position to the grid and emits a [`Command::PlaceBlock`]. The session stays
//! authoritative: it commits a free footprint as a counted move and answers a
//! blocked one with [`Event::PlacementRejected`], leaving the block at its
//! start anchor.

pub mod sweep;

use block_jam_core::{BlockId, CellCoord, CellRectSize, Command, Event};
use block_jam_world::{query, GridGeometry, World};
use glam::Vec2;
use thiserror::Error;
use tracing::debug;

pub use sweep::{Aabb, AabbObstacles, SpatialQuery, SweepHit};

const MIN_MOVE_DISTANCE: f32 = 0.0001;
const MIN_SLIDE_LENGTH_SQUARED: f32 = 0.000_001;
const MIN_HALF_EXTENT: f32 = 0.001;

/// Collision margins and smoothing applied while dragging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragTuning {
    /// Gap kept between the dragged box and the obstacle it stopped against.
    pub skin: f32,
    /// Amount trimmed from each half extent of the swept box so flush neighbours do not snag.
    pub cast_shrink: f32,
    /// Amount trimmed from each half extent when checking the snapped footprint for overlaps.
    pub overlap_shrink: f32,
    /// Exponential follow rate per second toward the resolved target; `None` jumps straight to it.
    pub smoothing: Option<f32>,
}

impl Default for DragTuning {
    fn default() -> Self {
        Self {
            skin: 0.01,
            cast_shrink: 0.02,
            overlap_shrink: 0.01,
            smoothing: None,
        }
    }
}

/// Reasons a drag cannot begin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DragError {
    /// The level already completed or failed.
    #[error("level already finished")]
    SessionLocked,
    /// No block lies under the pointer.
    #[error("no block under the pointer")]
    NothingToPick,
    /// The requested block is not on the board.
    #[error("block {} is not on the board", .0.get())]
    MissingBlock(BlockId),
    /// A block is already being dragged.
    #[error("block {} is already being dragged", .0.get())]
    AlreadyDragging(BlockId),
}

/// Outcome of releasing a held block, as predicted from the spatial query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The snapped footprint is free; the session will commit it as a move.
    Placed {
        /// Block that was released.
        block: BlockId,
        /// Anchor requested for the block, possibly its start anchor.
        anchor: CellCoord,
    },
    /// The snapped footprint overlaps another block; the session will reject
    /// the placement and the block returns to its start.
    Reverted {
        /// Block that was released.
        block: BlockId,
        /// Anchor the block returns to.
        anchor: CellCoord,
    },
}

#[derive(Clone, Copy, Debug)]
struct HeldBlock {
    block: BlockId,
    start_anchor: CellCoord,
    size: CellRectSize,
    geometry: GridGeometry,
    grab_offset: Vec2,
    position: Vec2,
}

/// Drag state machine: idle, or holding exactly one block.
#[derive(Clone, Debug, Default)]
pub struct DragResolver {
    tuning: DragTuning,
    held: Option<HeldBlock>,
}

impl DragResolver {
    /// Creates an idle resolver with the provided tuning.
    #[must_use]
    pub fn new(tuning: DragTuning) -> Self {
        Self { tuning, held: None }
    }

    /// Tuning the resolver was created with.
    #[must_use]
    pub fn tuning(&self) -> &DragTuning {
        &self.tuning
    }

    /// Block currently held, if any.
    #[must_use]
    pub fn held_block(&self) -> Option<BlockId> {
        self.held.map(|held| held.block)
    }

    /// Continuous center of the held block, if any.
    #[must_use]
    pub fn position(&self) -> Option<Vec2> {
        self.held.map(|held| held.position)
    }

    /// Picks up the block under `pointer`.
    pub fn pick_up(&mut self, world: &World, pointer: Vec2) -> Result<BlockId, DragError> {
        let block = query::block_at_point(world, pointer).ok_or(DragError::NothingToPick)?;
        self.pick_up_block(world, block, pointer)?;
        Ok(block)
    }

    /// Picks up `block`, remembering where it was grabbed relative to `pointer`.
    pub fn pick_up_block(
        &mut self,
        world: &World,
        block: BlockId,
        pointer: Vec2,
    ) -> Result<(), DragError> {
        if let Some(held) = self.held {
            return Err(DragError::AlreadyDragging(held.block));
        }
        if query::is_locked(world) {
            return Err(DragError::SessionLocked);
        }

        let snapshot = query::block(world, block).ok_or(DragError::MissingBlock(block))?;
        let geometry = *query::geometry(world);
        let size = snapshot.footprint.size();
        let center = geometry.cell_rect_to_world_center(snapshot.footprint.anchor(), size);

        debug!(block = block.get(), anchor = ?snapshot.footprint.anchor(), "block picked up");
        self.held = Some(HeldBlock {
            block,
            start_anchor: snapshot.footprint.anchor(),
            size,
            geometry,
            grab_offset: center - pointer,
            position: center,
        });
        Ok(())
    }

    /// Moves the held block toward `pointer`, sliding along obstacles.
    ///
    /// Returns the block's new continuous center, or `None` when idle.
    pub fn drag<Q: SpatialQuery>(&mut self, pointer: Vec2, dt: f32, space: &Q) -> Option<Vec2> {
        let tuning = self.tuning;
        let held = self.held.as_mut()?;

        let desired = pointer + held.grab_offset;
        let half_extents = (held.geometry.half_extents(held.size) - Vec2::splat(tuning.cast_shrink))
            .max(Vec2::splat(MIN_HALF_EXTENT));
        let target = resolve_blocked_move(
            space,
            held.block,
            held.position,
            desired,
            half_extents,
            tuning.skin,
        );

        held.position = match tuning.smoothing {
            Some(rate) => held.position.lerp(target, (dt * rate).clamp(0.0, 1.0)),
            None => target,
        };
        Some(held.position)
    }

    /// Releases the held block, snapping it to the grid.
    ///
    /// Always pushes a [`Command::PlaceBlock`] for the snapped anchor onto
    /// `out`, including when it equals the start anchor. Returns `None` when idle.
    pub fn release<Q: SpatialQuery>(
        &mut self,
        space: &Q,
        out: &mut Vec<Command>,
    ) -> Option<ReleaseOutcome> {
        let held = self.held.take()?;
        let (snapped_center, anchor) = held.geometry.snap_to_grid_rect(held.position, held.size);

        let shrunk_extents = (held.geometry.half_extents(held.size)
            - Vec2::splat(self.tuning.overlap_shrink))
        .max(Vec2::splat(MIN_HALF_EXTENT));
        let blocked = space
            .overlap(snapped_center, shrunk_extents)
            .into_iter()
            .any(|other| other != held.block);

        out.push(Command::PlaceBlock {
            block: held.block,
            anchor,
        });
        if blocked {
            debug!(block = held.block.get(), ?anchor, "snapped footprint overlaps; reverting");
            return Some(ReleaseOutcome::Reverted {
                block: held.block,
                anchor: held.start_anchor,
            });
        }
        Some(ReleaseOutcome::Placed {
            block: held.block,
            anchor,
        })
    }

    /// Drops the held block without emitting anything.
    pub fn cancel(&mut self) {
        self.held = None;
    }

    /// Cancels the drag when the session ends, restarts, or consumes the held block.
    pub fn handle_events(&mut self, events: &[Event]) {
        let Some(held) = self.held else {
            return;
        };

        let interrupted = events.iter().any(|event| match event {
            Event::LevelStarted { .. } | Event::LevelCompleted { .. } | Event::LevelFailed { .. } => {
                true
            }
            Event::EntityConsumed { block, .. } => *block == held.block,
            Event::MoveRegistered { .. } | Event::PlacementRejected { .. } => false,
        });
        if interrupted {
            debug!(block = held.block.get(), "drag interrupted");
            self.cancel();
        }
    }
}

/// Resolves a desired move of a box against the scene.
///
/// The box is swept from `from` toward `desired`. Without a hit the desired
/// position is returned. On a hit the box stops `skin` short of contact, the
/// leftover displacement is projected onto the struck face, and a second sweep
/// along that slide stops short of any further obstacle. Both sweeps look
/// through `block` itself.
pub fn resolve_blocked_move<Q: SpatialQuery>(
    space: &Q,
    block: BlockId,
    from: Vec2,
    desired: Vec2,
    half_extents: Vec2,
    skin: f32,
) -> Vec2 {
    let delta = desired - from;
    let distance = delta.length();
    if distance < MIN_MOVE_DISTANCE {
        return from;
    }
    let direction = delta / distance;

    let Some(hit) = space.sweep(from, half_extents, direction, distance, Some(block)) else {
        return desired;
    };

    let first_stop = from + direction * (hit.distance - skin).max(0.0);
    let remaining = desired - first_stop;
    let slide = remaining - hit.normal * remaining.dot(hit.normal);
    if slide.length_squared() < MIN_SLIDE_LENGTH_SQUARED {
        return first_stop;
    }

    let slide_distance = slide.length();
    if slide_distance < MIN_MOVE_DISTANCE {
        return first_stop;
    }
    let slide_direction = slide / slide_distance;

    match space.sweep(
        first_stop,
        half_extents,
        slide_direction,
        slide_distance,
        Some(block),
    ) {
        Some(second) => first_stop + slide_direction * (second.distance - skin).max(0.0),
        None => first_stop + slide,
    }
}
