#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Block Jam engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative level session, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the session executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what actually happened. Level content travels as an immutable
//! [`LevelDefinition`] that is validated before any session is built from it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest footprint a block or goal may span, measured in cells.
pub const MIN_FOOTPRINT_LENGTH: u8 = 1;

/// Longest footprint a block or goal may span, measured in cells.
pub const MAX_FOOTPRINT_LENGTH: u8 = 4;

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests that a block be committed at the provided anchor cell.
    PlaceBlock {
        /// Identifier of the block being placed.
        block: BlockId,
        /// Lower-left cell that anchors the block's footprint after the move.
        anchor: CellCoord,
    },
    /// Rebuilds the session from the level definition it was created with.
    RestartLevel,
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a fresh play session started.
    LevelStarted {
        /// Number of blocks that must be consumed to complete the level.
        blocks: u32,
        /// Number of committed moves allowed before the level fails.
        max_moves: u32,
    },
    /// Confirms that a block was committed to a new anchor and a move was counted.
    MoveRegistered {
        /// Identifier of the block that moved.
        block: BlockId,
        /// Anchor held by the block before the move.
        from: CellCoord,
        /// Anchor held by the block after the move.
        to: CellCoord,
        /// Total committed moves after this one.
        moves: u32,
    },
    /// Reports that a placement was rejected and the block kept its previous anchor.
    PlacementRejected {
        /// Identifier of the block whose placement failed.
        block: BlockId,
        /// Anchor that was requested.
        anchor: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a block reached a goal of its color and left the board.
    ///
    /// Presentation layers start their disappear animation on this event; the
    /// session has already cleared the block's cells when it is emitted.
    EntityConsumed {
        /// Identifier of the consumed block.
        block: BlockId,
        /// Goal that accepted the block.
        goal: GoalId,
        /// Shared color of the block and goal.
        color: BlockColor,
    },
    /// Announces that every block of the level has been consumed.
    LevelCompleted {
        /// Committed moves spent to complete the level.
        moves: u32,
    },
    /// Announces that the move budget ran out before the level was completed.
    LevelFailed {
        /// Committed moves spent when the budget ran out.
        moves: u32,
    },
}

/// Colors available to blocks and goals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockColor {
    /// Blue block or goal.
    Blue,
    /// Red block or goal.
    Red,
    /// Green block or goal.
    Green,
    /// Yellow block or goal.
    Yellow,
}

impl BlockColor {
    /// Every color in declaration order.
    pub const ALL: [BlockColor; 4] = [Self::Blue, Self::Red, Self::Green, Self::Yellow];

    /// Single-character symbol used by text adapters.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Blue => 'b',
            Self::Red => 'r',
            Self::Green => 'g',
            Self::Yellow => 'y',
        }
    }
}

impl fmt::Display for BlockColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
        };
        f.write_str(name)
    }
}

/// Axis along which a footprint extends its length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Footprint spans `length` columns and a single row.
    AlongX,
    /// Footprint spans a single column and `length` rows.
    AlongZ,
}

impl Orientation {
    /// Both orientations in declaration order.
    pub const ALL: [Orientation; 2] = [Self::AlongX, Self::AlongZ];

    /// Size of a footprint with the provided length laid out along this axis.
    #[must_use]
    pub const fn size_for(self, length: u8) -> CellRectSize {
        let length = length as u32;
        match self {
            Self::AlongX => CellRectSize::new(length, 1),
            Self::AlongZ => CellRectSize::new(1, length),
        }
    }
}

/// Unique identifier assigned to a block within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(u32);

impl BlockId {
    /// Creates a new block identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a goal within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GoalId(u32);

impl GoalId {
    /// Creates a new goal identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the goal identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell (the x axis).
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell (the z axis).
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Minimum-coordinate cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the rectangle lies entirely inside a `columns × rows` grid.
    ///
    /// Empty rectangles never fit.
    #[must_use]
    pub fn fits_within(&self, columns: u32, rows: u32) -> bool {
        if self.size.width() == 0 || self.size.height() == 0 {
            return false;
        }

        let Some(end_column) = self.origin.column().checked_add(self.size.width()) else {
            return false;
        };
        let Some(end_row) = self.origin.row().checked_add(self.size.height()) else {
            return false;
        };

        end_column <= columns && end_row <= rows
    }

    /// Reports whether the provided cell lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let column = u64::from(cell.column());
        let row = u64::from(cell.row());
        let start_column = u64::from(self.origin.column());
        let start_row = u64::from(self.origin.row());

        column >= start_column
            && row >= start_row
            && column < start_column + u64::from(self.size.width())
            && row < start_row + u64::from(self.size.height())
    }

    /// Reports whether two rectangles share at least one cell.
    #[must_use]
    pub fn intersects(&self, other: &CellRect) -> bool {
        fn span(start: u32, length: u32) -> (u64, u64) {
            (u64::from(start), u64::from(start) + u64::from(length))
        }

        let (a_left, a_right) = span(self.origin.column(), self.size.width());
        let (a_bottom, a_top) = span(self.origin.row(), self.size.height());
        let (b_left, b_right) = span(other.origin.column(), other.size.width());
        let (b_bottom, b_top) = span(other.origin.row(), other.size.height());

        a_left < b_right && b_left < a_right && a_bottom < b_top && b_bottom < a_top
    }

    /// Iterates every cell covered by the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        (0..size.height()).flat_map(move |dy| {
            (0..size.width())
                .map(move |dx| CellCoord::new(origin.column() + dx, origin.row() + dy))
        })
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Rectangle of cells occupied by a block or goal.
///
/// Exactly one side of the rectangle equals `length`; the other is a single
/// cell, chosen by `orientation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    anchor: CellCoord,
    length: u8,
    orientation: Orientation,
}

impl Footprint {
    /// Creates a footprint anchored at the provided cell.
    #[must_use]
    pub const fn new(anchor: CellCoord, length: u8, orientation: Orientation) -> Self {
        Self {
            anchor,
            length,
            orientation,
        }
    }

    /// Minimum-coordinate cell of the footprint.
    #[must_use]
    pub const fn anchor(&self) -> CellCoord {
        self.anchor
    }

    /// Number of cells spanned along the orientation axis.
    #[must_use]
    pub const fn length(&self) -> u8 {
        self.length
    }

    /// Axis the footprint extends along.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Width and height of the footprint in cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.orientation.size_for(self.length)
    }

    /// Rectangle of cells covered by the footprint.
    #[must_use]
    pub const fn rect(&self) -> CellRect {
        CellRect::from_origin_and_size(self.anchor, self.size())
    }

    /// Returns the same footprint moved to a new anchor.
    #[must_use]
    pub const fn with_anchor(self, anchor: CellCoord) -> Self {
        Self { anchor, ..self }
    }

    /// Reports whether the length lies within the supported range.
    #[must_use]
    pub const fn has_valid_length(&self) -> bool {
        self.length >= MIN_FOOTPRINT_LENGTH && self.length <= MAX_FOOTPRINT_LENGTH
    }
}

/// Movable block described by a level definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SpawnEntry", into = "SpawnEntry")]
pub struct BlockSpawn {
    /// Color the block must be matched with.
    pub color: BlockColor,
    /// Cells occupied by the block when the level starts.
    pub footprint: Footprint,
}

/// Stationary goal strip described by a level definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SpawnEntry", into = "SpawnEntry")]
pub struct GoalSpawn {
    /// Color of blocks accepted by the goal.
    pub color: BlockColor,
    /// Cells covered by the goal strip.
    pub footprint: Footprint,
}

/// Flat exchange shape shared by block and goal entries in level files.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct SpawnEntry {
    color: BlockColor,
    anchor_cell: CellCoord,
    length: u8,
    orientation: Orientation,
}

impl SpawnEntry {
    fn new(color: BlockColor, footprint: Footprint) -> Self {
        Self {
            color,
            anchor_cell: footprint.anchor(),
            length: footprint.length(),
            orientation: footprint.orientation(),
        }
    }

    fn footprint(&self) -> Footprint {
        Footprint::new(self.anchor_cell, self.length, self.orientation)
    }
}

impl From<SpawnEntry> for BlockSpawn {
    fn from(entry: SpawnEntry) -> Self {
        Self {
            color: entry.color,
            footprint: entry.footprint(),
        }
    }
}

impl From<BlockSpawn> for SpawnEntry {
    fn from(spawn: BlockSpawn) -> Self {
        Self::new(spawn.color, spawn.footprint)
    }
}

impl From<SpawnEntry> for GoalSpawn {
    fn from(entry: SpawnEntry) -> Self {
        Self {
            color: entry.color,
            footprint: entry.footprint(),
        }
    }
}

impl From<GoalSpawn> for SpawnEntry {
    fn from(spawn: GoalSpawn) -> Self {
        Self::new(spawn.color, spawn.footprint)
    }
}

/// Reasons a block placement may be rejected by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested footprint extends beyond the grid bounds.
    OutOfBounds,
    /// The requested footprint overlaps another block.
    Occupied,
    /// No block with the provided identifier remains on the board.
    MissingBlock,
    /// The level already completed or failed, so no further moves are accepted.
    SessionLocked,
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::OutOfBounds => "footprint leaves the grid",
            Self::Occupied => "footprint overlaps another block",
            Self::MissingBlock => "block is not on the board",
            Self::SessionLocked => "level already finished",
        };
        f.write_str(reason)
    }
}

/// Kind of level entity referenced by a [`LevelError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A movable block.
    Block,
    /// A goal strip.
    Goal,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => f.write_str("block"),
            Self::Goal => f.write_str("goal"),
        }
    }
}

/// Reasons a level definition fails validation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LevelError {
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
    /// The move budget is zero.
    #[error("move budget must allow at least one move")]
    ZeroMoveBudget,
    /// A footprint length lies outside the supported range.
    #[error("{entity} #{index} has length {length}, expected 1..=4")]
    InvalidLength {
        /// Kind of entity carrying the footprint.
        entity: EntityKind,
        /// Position of the entity in its list.
        index: usize,
        /// Offending length.
        length: u8,
    },
    /// A footprint extends beyond the grid.
    #[error("{entity} #{index} does not fit inside the grid")]
    OutOfBounds {
        /// Kind of entity carrying the footprint.
        entity: EntityKind,
        /// Position of the entity in its list.
        index: usize,
    },
    /// Two footprints of the same kind share at least one cell.
    #[error("{entity} #{first} overlaps {entity} #{second}")]
    Overlap {
        /// Kind of the overlapping entities.
        entity: EntityKind,
        /// Position of the first entity.
        first: usize,
        /// Position of the second entity.
        second: usize,
    },
    /// Two entities of the same kind share a color.
    #[error("more than one {entity} uses color {color}")]
    DuplicateColor {
        /// Kind of the entities sharing the color.
        entity: EntityKind,
        /// Shared color.
        color: BlockColor,
    },
    /// The level holds no block/goal pair and could never be played.
    #[error("level has no block/goal pairs")]
    NoPairs,
    /// A block has no goal of its color, or a goal has no block of its color.
    #[error("color {color} has no matching {missing}")]
    UnpairedColor {
        /// Color lacking a partner.
        color: BlockColor,
        /// Kind of entity that is missing.
        missing: EntityKind,
    },
}

/// Immutable description of a playable level.
///
/// Blocks and goals form two separate layers: blocks may rest on goal strips
/// (that is how they are consumed) but never on each other, and goals never
/// overlap other goals. Every color appears exactly once per layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    grid_width: u32,
    grid_height: u32,
    cell_size: f32,
    max_moves: u32,
    goals: Vec<GoalSpawn>,
    blocks: Vec<BlockSpawn>,
}

impl LevelDefinition {
    /// Assembles and validates a level definition.
    pub fn new(
        grid_width: u32,
        grid_height: u32,
        cell_size: f32,
        max_moves: u32,
        goals: Vec<GoalSpawn>,
        blocks: Vec<BlockSpawn>,
    ) -> Result<Self, LevelError> {
        let level = Self {
            grid_width,
            grid_height,
            cell_size,
            max_moves,
            goals,
            blocks,
        };
        level.validate()?;
        Ok(level)
    }

    /// Number of grid columns.
    #[must_use]
    pub const fn grid_width(&self) -> u32 {
        self.grid_width
    }

    /// Number of grid rows.
    #[must_use]
    pub const fn grid_height(&self) -> u32 {
        self.grid_height
    }

    /// Side length of a single cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Committed moves allowed before the level fails.
    #[must_use]
    pub const fn max_moves(&self) -> u32 {
        self.max_moves
    }

    /// Goal strips in definition order.
    #[must_use]
    pub fn goals(&self) -> &[GoalSpawn] {
        &self.goals
    }

    /// Blocks in definition order.
    #[must_use]
    pub fn blocks(&self) -> &[BlockSpawn] {
        &self.blocks
    }

    /// Checks every structural invariant of the level.
    ///
    /// Definitions produced by [`LevelDefinition::new`] already passed this
    /// check; definitions obtained through deserialization have not.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(LevelError::EmptyGrid {
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(LevelError::InvalidCellSize(self.cell_size));
        }
        if self.max_moves == 0 {
            return Err(LevelError::ZeroMoveBudget);
        }
        if self.blocks.is_empty() && self.goals.is_empty() {
            return Err(LevelError::NoPairs);
        }

        let goals: Vec<(BlockColor, Footprint)> = self
            .goals
            .iter()
            .map(|goal| (goal.color, goal.footprint))
            .collect();
        let blocks: Vec<(BlockColor, Footprint)> = self
            .blocks
            .iter()
            .map(|block| (block.color, block.footprint))
            .collect();

        self.validate_layer(EntityKind::Goal, &goals)?;
        self.validate_layer(EntityKind::Block, &blocks)?;

        for (color, _) in &blocks {
            if !goals.iter().any(|(goal_color, _)| goal_color == color) {
                return Err(LevelError::UnpairedColor {
                    color: *color,
                    missing: EntityKind::Goal,
                });
            }
        }
        for (color, _) in &goals {
            if !blocks.iter().any(|(block_color, _)| block_color == color) {
                return Err(LevelError::UnpairedColor {
                    color: *color,
                    missing: EntityKind::Block,
                });
            }
        }

        Ok(())
    }

    fn validate_layer(
        &self,
        entity: EntityKind,
        entries: &[(BlockColor, Footprint)],
    ) -> Result<(), LevelError> {
        for (index, (_, footprint)) in entries.iter().enumerate() {
            if !footprint.has_valid_length() {
                return Err(LevelError::InvalidLength {
                    entity,
                    index,
                    length: footprint.length(),
                });
            }
            if !footprint
                .rect()
                .fits_within(self.grid_width, self.grid_height)
            {
                return Err(LevelError::OutOfBounds { entity, index });
            }
        }

        for (first, (first_color, first_footprint)) in entries.iter().enumerate() {
            for (offset, (second_color, second_footprint)) in
                entries.iter().enumerate().skip(first + 1)
            {
                if first_color == second_color {
                    return Err(LevelError::DuplicateColor {
                        entity,
                        color: *first_color,
                    });
                }
                if first_footprint.rect().intersects(&second_footprint.rect()) {
                    return Err(LevelError::Overlap {
                        entity,
                        first,
                        second: offset,
                    });
                }
            }
        }

        Ok(())
    }
}
