//! Single-flight memoization of generated chunks.
//!
//! Each chunk coordinate owns one slot. Whoever reaches an empty slot first
//! (a searching thread or a prefetch job on the executor) runs the generator;
//! everybody else blocks on the same slot and observes its result. Results,
//! including failures, are published once and never replaced.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use delve_voxel::{Chunk, ChunkPos, GenerationError, Position, VoxelGenerator};
use tracing::{trace, warn};

use crate::executor::ParallelExecutor;

type ChunkResult = Result<Arc<Chunk>, GenerationError>;
type Slot = Arc<OnceLock<ChunkResult>>;

/// State shared by every clone of a cache and by its prefetch jobs.
struct Shared {
    generator: Arc<dyn VoxelGenerator>,
    seed: u64,
    generated: AtomicUsize,
}

impl Shared {
    fn resolve(&self, pos: ChunkPos, slot: &OnceLock<ChunkResult>) -> ChunkResult {
        slot.get_or_init(|| {
            self.generated.fetch_add(1, Ordering::Relaxed);
            trace!(%pos, "generating chunk");
            match self.generator.generate(pos, self.seed) {
                Ok(chunk) => Ok(Arc::new(chunk)),
                Err(e) => {
                    warn!(%pos, error = %e, "chunk generation failed");
                    Err(e)
                }
            }
        })
        .clone()
    }
}

/// Shared, cheaply clonable handle to the world's generated chunks.
///
/// The executor is held next to, not inside, the shared state: prefetch jobs
/// capture only the shared state, so the last handle to the pool is never
/// dropped on one of its own workers.
#[derive(Clone)]
pub struct ChunkCache {
    shared: Arc<Shared>,
    slots: Arc<DashMap<ChunkPos, Slot>>,
    executor: Option<Arc<ParallelExecutor>>,
}

impl ChunkCache {
    /// A cache that generates chunks on the calling thread only.
    pub fn new(generator: Arc<dyn VoxelGenerator>, seed: u64) -> Self {
        Self {
            shared: Arc::new(Shared {
                generator,
                seed,
                generated: AtomicUsize::new(0),
            }),
            slots: Arc::new(DashMap::new()),
            executor: None,
        }
    }

    /// A cache that can also generate ahead of demand on `executor`.
    pub fn with_executor(
        generator: Arc<dyn VoxelGenerator>,
        seed: u64,
        executor: Arc<ParallelExecutor>,
    ) -> Self {
        Self {
            executor: Some(executor),
            ..Self::new(generator, seed)
        }
    }

    /// The world seed passed to the generator.
    pub fn seed(&self) -> u64 {
        self.shared.seed
    }

    /// Returns the chunk at `pos`, generating it if no one has yet.
    ///
    /// Blocks while another thread is generating the same chunk. A failed
    /// generation is returned to every caller; it is not retried.
    pub fn get(&self, pos: ChunkPos) -> Result<Arc<Chunk>, GenerationError> {
        let slot = self.slot(pos);
        self.shared.resolve(pos, &slot)
    }

    /// Returns the chunk at `pos` only if it has already been published.
    pub fn get_if_ready(&self, pos: ChunkPos) -> Option<Result<Arc<Chunk>, GenerationError>> {
        self.slots
            .get(&pos)
            .and_then(|slot| slot.value().get().cloned())
    }

    /// Schedules generation of `pos` on the executor if nobody has asked for
    /// it yet. Without an executor, or when the pool refuses the job, the
    /// chunk is left for the next [`get`](Self::get).
    pub fn prefetch(&self, pos: ChunkPos) {
        let Some(executor) = &self.executor else {
            return;
        };
        if self.slots.contains_key(&pos) {
            return;
        }
        let slot = self.slot(pos);
        if slot.get().is_some() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        if let Err(e) = executor.execute(move || {
            let _ = shared.resolve(pos, &slot);
        }) {
            trace!(%pos, error = %e, "prefetch not scheduled");
        }
    }

    /// Whether voxel `pos` is solid. Positions outside the vertical world
    /// bounds are solid and never trigger generation.
    pub fn is_solid(&self, pos: Position) -> Result<bool, GenerationError> {
        let Some((x, y, z)) = pos.local() else {
            return Ok(true);
        };
        Ok(self.get(pos.chunk_pos())?.is_solid(x, y, z))
    }

    /// Whether a slot exists for `pos` (generated, in flight, or queued).
    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.slots.contains_key(&pos)
    }

    /// Number of coordinates with a slot.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no chunk has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of times the generator has been invoked.
    pub fn generated_count(&self) -> usize {
        self.shared.generated.load(Ordering::Relaxed)
    }

    /// Linearizable get-or-create of the slot for `pos`.
    fn slot(&self, pos: ChunkPos) -> Slot {
        if let Some(slot) = self.slots.get(&pos) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(pos).or_default().value())
    }
}

impl std::fmt::Debug for ChunkCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkCache")
            .field("seed", &self.shared.seed)
            .field("chunks", &self.slots.len())
            .field("generated", &self.generated_count())
            .field("prefetching", &self.executor.is_some())
            .finish()
    }
}
