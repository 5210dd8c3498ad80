use std::collections::HashSet;

use block_jam_core::{BlockSpawn, Command, Event, LevelDefinition};
use block_jam_system_generation::{
    generate_definitions, generate_levels, solvability, ConfigError, GenerationConfig,
    GenerationDiagnostic, GenerationError, LevelGenerator,
};
use block_jam_world::{apply, navigation, query, LevelOutcome, OccupancyGrid, World};

fn small_batch(seed: u64) -> GenerationConfig {
    GenerationConfig {
        level_count: 6,
        seed,
        ..GenerationConfig::default()
    }
}

fn assert_layer_is_disjoint(level: &LevelDefinition) {
    let blocks = level.blocks();
    for (index, first) in blocks.iter().enumerate() {
        let rect = first.footprint.rect();
        assert!(rect.fits_within(level.grid_width(), level.grid_height()));
        for second in &blocks[index + 1..] {
            assert!(!rect.intersects(&second.footprint.rect()));
        }
    }
}

#[test]
fn batches_are_deterministic_per_seed() {
    let first = generate_levels(&small_batch(77)).expect("first batch");
    let second = generate_levels(&small_batch(77)).expect("second batch");
    assert_eq!(first, second);

    let other = generate_definitions(&small_batch(78)).expect("other batch");
    let first_definitions: Vec<LevelDefinition> =
        first.into_iter().map(|level| level.definition).collect();
    assert_ne!(first_definitions, other);
}

#[test]
fn levels_do_not_depend_on_their_neighbours() {
    let config = small_batch(5);
    let generator = LevelGenerator::new(config.clone()).expect("valid config");
    let batch = generator.generate_batch().expect("batch");
    let alone = generator.generate(3).expect("single level");
    assert_eq!(batch[3], alone);
}

#[test]
fn generated_levels_respect_structural_invariants() {
    for seed in 0..8 {
        let config = small_batch(seed);
        for level in generate_levels(&config).expect("batch") {
            let definition = &level.definition;
            assert_eq!(definition.validate(), Ok(()));
            assert_layer_is_disjoint(definition);
            assert_eq!(definition.goals().len(), definition.blocks().len());

            let colors: HashSet<_> = definition.blocks().iter().map(|block| block.color).collect();
            assert_eq!(colors.len(), definition.blocks().len());
            assert_eq!(
                definition.max_moves(),
                config.shuffle_steps_for(level.index) + config.max_moves_buffer
            );
        }
    }
}

#[test]
fn shuffle_log_replays_into_final_layout() {
    let config = small_batch(42);
    for level in generate_levels(&config).expect("batch") {
        let definition = &level.definition;
        let mut blocks: Vec<BlockSpawn> = definition
            .goals()
            .iter()
            .map(|goal| BlockSpawn {
                color: goal.color,
                footprint: goal.footprint,
            })
            .collect();
        let mut grid = OccupancyGrid::new(definition.grid_width(), definition.grid_height());
        for block in &blocks {
            grid.place(block.footprint.anchor(), block.footprint.size());
        }

        for step in &level.shuffle_log {
            let current = blocks[step.block_index];
            assert_eq!(current.footprint, step.from);
            grid.remove(step.from.anchor(), step.from.size());

            let goal_anchor = definition.goals()[step.block_index].footprint.anchor();
            assert!(step.to.anchor().manhattan_distance(goal_anchor) >= config.min_dist_from_own_goal);
            assert!(grid.can_place(step.to.anchor(), step.to.size()));
            assert!(navigation::reachable(
                &grid,
                step.from.size(),
                step.from.anchor(),
                step.to.anchor()
            ));

            grid.place(step.to.anchor(), step.to.size());
            blocks[step.block_index].footprint = step.to;
        }

        assert_eq!(blocks.as_slice(), definition.blocks());
    }
}

#[test]
fn generated_levels_are_solvable_within_budget() {
    for seed in 0..16 {
        for level in generate_levels(&small_batch(seed)).expect("batch") {
            assert!(!level
                .diagnostics
                .iter()
                .any(|diagnostic| matches!(diagnostic, GenerationDiagnostic::NoPlanFound { .. })));
            let definition = level.definition;
            let plan = solvability::plan_solution(&definition).expect("solvable level");
            assert!(plan.len() as u32 <= definition.max_moves());

            let mut world = World::new(definition).expect("world");
            let mut events = Vec::new();
            for command in plan {
                apply(&mut world, command, &mut events);
            }
            assert_eq!(query::outcome(&world), Some(LevelOutcome::Completed));
            assert_eq!(
                events
                    .iter()
                    .filter(|event| matches!(event, Event::LevelCompleted { .. }))
                    .count(),
                1
            );
        }
    }
}

#[test]
fn restarting_a_generated_level_restores_the_scramble() {
    let level = generate_levels(&small_batch(9))
        .expect("batch")
        .remove(0)
        .definition;
    let mut world = World::new(level.clone()).expect("world");
    let plan = solvability::plan_solution(&level).expect("solvable level");
    let mut events = Vec::new();
    apply(&mut world, plan[0].clone(), &mut events);
    apply(&mut world, Command::RestartLevel, &mut events);

    let restored: Vec<_> = query::block_view(&world)
        .iter()
        .map(|block| block.footprint)
        .collect();
    let spawned: Vec<_> = level.blocks().iter().map(|block| block.footprint).collect();
    assert_eq!(restored, spawned);
}

#[test]
fn invalid_config_is_rejected_before_generation() {
    let config = GenerationConfig {
        grid_width: 0,
        ..GenerationConfig::default()
    };
    assert!(matches!(
        generate_levels(&config),
        Err(GenerationError::Config(ConfigError::EmptyGrid { .. }))
    ));
}

#[test]
fn single_pair_levels_use_one_color() {
    let config = GenerationConfig {
        level_count: 3,
        pair_count: 1,
        ..GenerationConfig::default()
    };
    for level in generate_levels(&config).expect("batch") {
        assert_eq!(level.definition.blocks().len(), 1);
        assert_eq!(level.definition.goals().len(), 1);
        assert_eq!(
            level.definition.blocks()[0].color,
            level.definition.goals()[0].color
        );
    }
}
