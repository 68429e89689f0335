//! Deterministic seed derivation for generation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use delve_voxel::ChunkPos;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Derive a u64 seed for a chunk from the world seed and chunk coordinate.
///
/// Uses SipHash (via std's `DefaultHasher`) to combine the world seed with
/// the coordinate into a well-distributed u64.
pub fn derive_chunk_seed(world_seed: u64, pos: &ChunkPos) -> u64 {
    let mut hasher = DefaultHasher::new();
    world_seed.hash(&mut hasher);
    pos.x.hash(&mut hasher);
    pos.z.hash(&mut hasher);
    hasher.finish()
}

/// Derive a deterministic RNG for a specific chunk.
///
/// Identical `(world_seed, pos)` pairs produce identical sequences regardless
/// of which worker thread generates the chunk.
pub fn chunk_rng(world_seed: u64, pos: &ChunkPos) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_chunk_seed(world_seed, pos))
}

/// Fold a 64-bit world seed into the 32-bit seed the noise functions take.
pub fn noise_seed(world_seed: u64) -> u32 {
    (world_seed ^ (world_seed >> 32)) as u32
}
