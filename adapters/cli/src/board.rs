//! Plain-text rendering of level layouts.

use std::fmt::Write as _;

use block_jam_core::{CellCoord, LevelDefinition};

const EMPTY_CELL: char = '.';

/// Renders the level as rows of characters, top row first.
///
/// Blocks are drawn with upper-case color symbols and win over the goal strip
/// they rest on, which is drawn in lower case.
pub(crate) fn render(level: &LevelDefinition) -> String {
    let mut output = String::new();
    for row in (0..level.grid_height()).rev() {
        for column in 0..level.grid_width() {
            output.push(symbol_at(level, CellCoord::new(column, row)));
        }
        output.push('\n');
    }
    let _ = writeln!(
        output,
        "{}x{} grid, {} pair(s), {} move(s)",
        level.grid_width(),
        level.grid_height(),
        level.blocks().len(),
        level.max_moves()
    );
    output
}

fn symbol_at(level: &LevelDefinition, cell: CellCoord) -> char {
    if let Some(block) = level
        .blocks()
        .iter()
        .find(|block| block.footprint.rect().contains(cell))
    {
        return block.color.symbol().to_ascii_uppercase();
    }
    level
        .goals()
        .iter()
        .find(|goal| goal.footprint.rect().contains(cell))
        .map_or(EMPTY_CELL, |goal| goal.color.symbol())
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_jam_core::{BlockColor, BlockSpawn, Footprint, GoalSpawn, Orientation};

    #[test]
    fn blocks_cover_goals_and_rows_read_top_down() {
        let level = LevelDefinition::new(
            4,
            3,
            1.0,
            2,
            vec![GoalSpawn {
                color: BlockColor::Red,
                footprint: Footprint::new(CellCoord::new(0, 0), 4, Orientation::AlongX),
            }],
            vec![BlockSpawn {
                color: BlockColor::Red,
                footprint: Footprint::new(CellCoord::new(1, 0), 2, Orientation::AlongZ),
            }],
        )
        .expect("valid level");

        assert_eq!(
            render(&level),
            "....\n.R..\nrRrr\n4x3 grid, 1 pair(s), 2 move(s)\n"
        );
    }
}
