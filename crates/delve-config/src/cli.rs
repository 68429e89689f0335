//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, SearchMode};

/// Find a route through a generated cave world.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "delve", about = "Voxel cave route finder")]
pub struct CliArgs {
    /// Start position as `x,y,z`.
    #[arg(long, value_parser = parse_position)]
    pub start: Option<[i32; 3]>,

    /// Goal position as `x,y,z`.
    #[arg(long, value_parser = parse_position)]
    pub goal: Option<[i32; 3]>,

    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Search resolution.
    #[arg(long, value_enum)]
    pub mode: Option<SearchMode>,

    /// Generation worker threads (0 = automatic).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Node expansions before giving up with a partial route.
    #[arg(long)]
    pub max_expansions: Option<usize>,

    /// Wall-clock limit in milliseconds (0 = none).
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Parses `x,y,z` into a coordinate triple.
pub fn parse_position(s: &str) -> Result<[i32; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got `{s}`"));
    };
    let parse = |v: &str| {
        v.parse::<i32>()
            .map_err(|e| format!("invalid coordinate `{v}`: {e}"))
    };
    Ok([parse(*x)?, parse(*y)?, parse(*z)?])
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(start) = args.start {
            self.world.start = start;
        }
        if let Some(goal) = args.goal {
            self.world.goal = goal;
        }
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(threads) = args.threads {
            self.world.threads = threads;
        }
        if let Some(mode) = args.mode {
            self.search.mode = mode;
        }
        if let Some(max) = args.max_expansions {
            self.search.max_expansions = max;
        }
        if let Some(ms) = args.timeout_ms {
            self.search.timeout_ms = ms;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
