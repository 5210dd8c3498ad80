//! Planner that searches for a placement sequence consuming every block.
//!
//! Consuming a block only ever frees cells and every block needs at least one
//! move, so consuming placements are taken greedily. The search branches only
//! over relocations, breadth first, so the plan found uses the fewest moves.

use std::collections::{HashSet, VecDeque};

use block_jam_core::{BlockId, Command, Event, Footprint, LevelDefinition};
use block_jam_world::query::{self, GoalSnapshot};
use block_jam_world::{apply, navigation, LevelOutcome, World};
use tracing::debug;

/// Distinct block layouts explored before the search gives up.
const SEARCH_STATE_LIMIT: usize = 50_000;

#[derive(Clone)]
struct Node {
    world: World,
    plan: Vec<Command>,
}

impl Node {
    fn layout(&self) -> Vec<(BlockId, Footprint)> {
        query::block_view(&self.world)
            .iter()
            .map(|block| (block.id, block.footprint))
            .collect()
    }

    fn push(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(&mut self.world, command.clone(), &mut events);
        self.plan.push(command);
        events
    }

    /// Consumes every block that can reach its goal. Returns `false` once the
    /// session has failed.
    fn consume_greedily(&mut self, goals: &[GoalSnapshot]) -> bool {
        loop {
            match query::outcome(&self.world) {
                Some(LevelOutcome::Completed) => return true,
                Some(LevelOutcome::Failed) => return false,
                None => {}
            }
            let Some(command) = next_consuming_move(&self.world, goals) else {
                return true;
            };
            let events = self.push(command);
            if !events
                .iter()
                .any(|event| matches!(event, Event::EntityConsumed { .. }))
            {
                return false;
            }
        }
    }

    fn is_completed(&self) -> bool {
        query::outcome(&self.world) == Some(LevelOutcome::Completed)
    }
}

/// Plans a shortest sequence of placements that consumes every block.
///
/// Returns `None` when no plan fits the level's move budget or the search
/// exhausts its state limit.
#[must_use]
pub fn plan_solution(level: &LevelDefinition) -> Option<Vec<Command>> {
    let mut root = Node {
        world: World::new(level.clone()).ok()?,
        plan: Vec::new(),
    };
    let goals = query::goals(&root.world);
    if !root.consume_greedily(&goals) {
        return None;
    }
    if root.is_completed() {
        return Some(root.plan);
    }

    let mut seen = HashSet::from([root.layout()]);
    let mut frontier = VecDeque::from([root]);

    while let Some(node) = frontier.pop_front() {
        let world = &node.world;
        let remaining = query::total_blocks(world) - query::consumed(world);
        // A relocation only pays off if every remaining block can still move afterwards.
        if query::moves(world) + 1 + remaining > query::max_moves(world) {
            continue;
        }

        for block in query::block_view(world).iter() {
            let grid = query::occupancy_without(world, block.id);
            let anchors =
                navigation::reachable_anchors(&grid, block.footprint.size(), block.footprint.anchor());
            for anchor in anchors.into_iter().skip(1) {
                let mut child = node.clone();
                let _ = child.push(Command::PlaceBlock {
                    block: block.id,
                    anchor,
                });
                if !child.consume_greedily(&goals) {
                    continue;
                }
                if child.is_completed() {
                    debug!(moves = child.plan.len(), explored = seen.len(), "plan found");
                    return Some(child.plan);
                }
                if seen.insert(child.layout()) {
                    if seen.len() > SEARCH_STATE_LIMIT {
                        debug!(explored = seen.len(), "search state limit reached");
                        return None;
                    }
                    frontier.push_back(child);
                }
            }
        }
    }

    debug!(explored = seen.len(), "no plan within the move budget");
    None
}

/// Reports whether [`plan_solution`] finds a plan within the level's move budget.
#[must_use]
pub fn is_solvable(level: &LevelDefinition) -> bool {
    plan_solution(level).is_some()
}

fn next_consuming_move(world: &World, goals: &[GoalSnapshot]) -> Option<Command> {
    query::block_view(world).iter().find_map(|block| {
        let goal = goals.iter().find(|goal| goal.color == block.color)?;
        let grid = query::occupancy_without(world, block.id);
        navigation::reachable_anchors(&grid, block.footprint.size(), block.footprint.anchor())
            .into_iter()
            .find(|anchor| {
                block
                    .footprint
                    .with_anchor(*anchor)
                    .rect()
                    .intersects(&goal.footprint.rect())
            })
            .map(|anchor| Command::PlaceBlock {
                block: block.id,
                anchor,
            })
    })
}
