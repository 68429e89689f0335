//! Wires configuration into the generator, cache and search.

use std::sync::Arc;
use std::time::Duration;

use delve_config::{Config, SearchConfig, SearchMode, WorldConfig};
use delve_path::{CancellationToken, Path, PathError, ResolutionPolicy, SearchLimits, find_path};
use delve_terrain::{CaveConfig, CaveGenerator, ChunkCache, ExecutorError, ParallelExecutor};
use delve_voxel::Position;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("failed to start generation workers: {0}")]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Search(#[from] PathError),
}

/// Search policy for the configured mode and limits.
pub fn policy_from(search: &SearchConfig) -> ResolutionPolicy {
    let base = match search.mode {
        SearchMode::Coarse => ResolutionPolicy::coarse(),
        SearchMode::Fine => ResolutionPolicy::fine(),
    };
    let limits = SearchLimits {
        max_expansions: search.max_expansions,
        timeout: (search.timeout_ms > 0).then(|| Duration::from_millis(search.timeout_ms)),
        prefetch_radius: search.prefetch_radius.max(0),
    };
    ResolutionPolicy {
        goal_tolerance: search.goal_tolerance.max(0.0),
        ..base.with_limits(limits)
    }
}

pub fn cave_config_from(world: &WorldConfig) -> CaveConfig {
    CaveConfig {
        threshold: world.cave_threshold,
        frequency: world.cave_frequency,
        octaves: world.cave_octaves.max(1),
        ..CaveConfig::default()
    }
}

/// A cache over the configured cave world, prefetching on its own pool.
pub fn build_cache(world: &WorldConfig) -> Result<ChunkCache, ExecutorError> {
    let executor = match world.threads {
        0 => ParallelExecutor::with_defaults()?,
        n => ParallelExecutor::new(n)?,
    };
    debug!(threads = executor.thread_count(), "generation pool ready");
    let generator = Arc::new(CaveGenerator::new(cave_config_from(world)));
    Ok(ChunkCache::with_executor(generator, world.seed, Arc::new(executor)))
}

/// Runs one search from the configured start to the configured goal.
pub fn run(config: &Config) -> Result<Option<Path>, RouteError> {
    let cache = build_cache(&config.world)?;
    let start = Position::from(config.world.start);
    let goal = Position::from(config.world.goal);
    info!(%start, %goal, "searching for route");

    let path = find_path(
        start,
        goal,
        &cache,
        policy_from(&config.search),
        &CancellationToken::new(),
    )?;
    Ok(path)
}

pub fn log_summary(path: &Path, each_waypoint: bool) {
    info!(
        kind = ?path.kind,
        start = %path.start,
        end = %path.end_pos(),
        waypoints = path.waypoints.len(),
        nodes = path.stats.nodes,
        expansions = path.stats.expansions,
        length = format_args!("{:.1}", path.total_length()),
        elapsed_ms = path.stats.elapsed.as_millis() as u64,
        chunks = path.cache().generated_count(),
        "route"
    );
    for (size, count) in path.size_histogram() {
        info!(size = size.width(), count, "expanded nodes");
    }
    if each_waypoint {
        for (i, waypoint) in path.waypoints.iter().enumerate() {
            info!(index = i, %waypoint, "waypoint");
        }
    }
}
