//! Terrain generation and chunk materialization: a reference cave generator,
//! a fixed worker pool, and a single-flight chunk cache that prefetches on it.

mod cache;
mod cave;
mod executor;
mod seed;

pub use cache::ChunkCache;
pub use cave::{CaveConfig, CaveGenerator};
pub use executor::{ExecutorError, ParallelExecutor, TaskHandle};
pub use seed::{chunk_rng, derive_chunk_seed, noise_seed};
