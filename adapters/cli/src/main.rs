#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for generating, inspecting and sharing Block Jam levels.

mod board;
mod level_transfer;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use block_jam_core::{Command as LevelCommand, Event, LevelDefinition};
use block_jam_system_generation::{solvability, GenerationConfig, LevelGenerator};
use block_jam_world::{apply, query, World};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Block Jam level tooling.
#[derive(Debug, Parser)]
#[command(name = "block-jam", version, about)]
struct CliArgs {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Generates a batch of levels and writes them as JSON files.
    Generate(GenerateArgs),
    /// Checks level files against every layout invariant.
    Validate {
        /// Level files to check.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Prints a level as a character grid.
    Show {
        /// Level file to draw.
        file: PathBuf,
    },
    /// Plans and replays a solution for a level.
    Solve {
        /// Level file to solve.
        file: PathBuf,
    },
    /// Prints a single-line share string for a level.
    Share {
        /// Level file to encode.
        file: PathBuf,
    },
    /// Decodes a share string back into a level file.
    Unshare {
        /// Share string produced by `share`.
        code: String,
        /// Destination file; the level is printed when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// TOML file with generation options; omitted fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory receiving `level_XX.json` and `summary.json`.
    #[arg(long, default_value = "levels")]
    out: PathBuf,
    /// Overrides the base seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the number of levels.
    #[arg(long)]
    levels: Option<u32>,
    /// Overrides the number of color pairs per level.
    #[arg(long)]
    pairs: Option<u32>,
    /// Overrides the grid width.
    #[arg(long)]
    width: Option<u32>,
    /// Overrides the grid height.
    #[arg(long)]
    height: Option<u32>,
}

impl GenerateArgs {
    fn load_config(&self) -> Result<GenerationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => GenerationConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(levels) = self.levels {
            config.level_count = levels;
        }
        if let Some(pairs) = self.pairs {
            config.pair_count = pairs;
        }
        if let Some(width) = self.width {
            config.grid_width = width;
        }
        if let Some(height) = self.height {
            config.grid_height = height;
        }
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct BatchSummary {
    seed: u64,
    levels: Vec<LevelSummary>,
}

#[derive(Debug, Serialize)]
struct LevelSummary {
    file: String,
    pairs: usize,
    max_moves: u32,
    shuffle_steps: usize,
    diagnostics: Vec<String>,
}

/// Entry point for the Block Jam command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    match args.command {
        CliCommand::Generate(generate_args) => generate(&generate_args),
        CliCommand::Validate { files } => validate(&files),
        CliCommand::Show { file } => {
            let level = read_level(&file)?;
            print!("{}", board::render(&level));
            Ok(())
        }
        CliCommand::Solve { file } => solve(&file),
        CliCommand::Share { file } => {
            let level = read_level(&file)?;
            println!("{}", level_transfer::encode(&level)?);
            Ok(())
        }
        CliCommand::Unshare { code, out } => unshare(&code, out.as_deref()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn generate(args: &GenerateArgs) -> Result<()> {
    let config = args.load_config()?;
    let generator = LevelGenerator::new(config).context("invalid generation config")?;
    let levels = generator
        .generate_batch()
        .context("generating level batch")?;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating output directory {}", args.out.display()))?;

    let mut summary = BatchSummary {
        seed: generator.config().seed,
        levels: Vec::with_capacity(levels.len()),
    };
    for level in &levels {
        let file = format!("level_{:02}.json", level.index + 1);
        write_json(&args.out.join(&file), &level.definition)?;
        for diagnostic in &level.diagnostics {
            warn!(file = %file, "{diagnostic}");
        }
        summary.levels.push(LevelSummary {
            file,
            pairs: level.definition.blocks().len(),
            max_moves: level.definition.max_moves(),
            shuffle_steps: level.shuffle_log.len(),
            diagnostics: level.diagnostics.iter().map(ToString::to_string).collect(),
        });
    }
    write_json(&args.out.join("summary.json"), &summary)?;

    info!(
        levels = levels.len(),
        out = %args.out.display(),
        "level batch written"
    );
    Ok(())
}

fn validate(files: &[PathBuf]) -> Result<()> {
    let mut failures = 0_usize;
    for file in files {
        match read_level(file) {
            Ok(level) => println!(
                "{}: ok ({} pair(s), {} move(s))",
                file.display(),
                level.blocks().len(),
                level.max_moves()
            ),
            Err(error) => {
                failures += 1;
                println!("{}: {error:#}", file.display());
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} level file(s) are invalid", files.len());
    }
    Ok(())
}

fn solve(file: &Path) -> Result<()> {
    let level = read_level(file)?;
    let Some(plan) = solvability::plan_solution(&level) else {
        bail!("no solution found for {}", file.display());
    };

    let mut world = World::new(level).context("building level session")?;
    let mut events = Vec::new();
    for (step, command) in plan.into_iter().enumerate() {
        if let LevelCommand::PlaceBlock { block, anchor } = &command {
            println!(
                "{:>2}. block {} -> ({}, {})",
                step + 1,
                block.get(),
                anchor.column(),
                anchor.row()
            );
        }
        apply(&mut world, command, &mut events);
    }

    let completed = events
        .iter()
        .any(|event| matches!(event, Event::LevelCompleted { .. }));
    println!(
        "{} in {} of {} move(s)",
        if completed { "completed" } else { "unfinished" },
        query::moves(&world),
        query::max_moves(&world)
    );
    Ok(())
}

fn unshare(code: &str, out: Option<&Path>) -> Result<()> {
    let level = level_transfer::decode(code)?;
    match out {
        Some(path) => write_json(path, &level)?,
        None => println!("{}", serde_json::to_string_pretty(&level)?),
    }
    Ok(())
}

fn read_level(path: &Path) -> Result<LevelDefinition> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading level {}", path.display()))?;
    let level: LevelDefinition = serde_json::from_str(&text)
        .with_context(|| format!("parsing level {}", path.display()))?;
    level
        .validate()
        .with_context(|| format!("checking level {}", path.display()))?;
    Ok(level)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
