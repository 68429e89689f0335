//! Voxel world primitives: block and chunk coordinates, immutable solid/air
//! chunks with a precomputed occupancy pyramid, and the generator boundary.

pub mod bit_mask;
pub mod chunk;
pub mod generator;
pub mod position;

pub use chunk::{CHUNK_HEIGHT, CHUNK_VOLUME, CHUNK_WIDTH, Chunk, ChunkBuilder, Occupancy};
pub use generator::{GenerationError, VoxelGenerator};
pub use position::{COORDINATE_LIMIT, ChunkPos, Position, WORLD_MAX_Y, WORLD_MIN_Y};
