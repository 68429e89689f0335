//! The boundary to terrain generation.

use crate::chunk::Chunk;
use crate::position::ChunkPos;

/// Errors a [`VoxelGenerator`] may report.
///
/// A failed chunk is never interpreted as all-solid or all-air by callers.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The generator does not produce chunks at this coordinate.
    #[error("chunk {pos} is outside the generated world")]
    InvalidCoordinate { pos: ChunkPos },

    /// The generator ran out of some resource (memory, handles, ...).
    #[error("generator exhausted while producing chunk {pos}: {reason}")]
    Exhausted { pos: ChunkPos, reason: String },

    /// Any other generator fault.
    #[error("failed to generate chunk {pos}: {reason}")]
    Failed { pos: ChunkPos, reason: String },
}

impl GenerationError {
    /// The chunk whose generation failed.
    pub fn pos(&self) -> ChunkPos {
        match self {
            Self::InvalidCoordinate { pos }
            | Self::Exhausted { pos, .. }
            | Self::Failed { pos, .. } => *pos,
        }
    }
}

/// Deterministic source of chunks.
///
/// `generate` must be pure: the same `(pos, seed)` always yields a
/// voxel-for-voxel identical chunk. Caching and parallel prefetch rely on it.
pub trait VoxelGenerator: Send + Sync {
    fn generate(&self, pos: ChunkPos, seed: u64) -> Result<Chunk, GenerationError>;
}

impl<F> VoxelGenerator for F
where
    F: Fn(ChunkPos, u64) -> Result<Chunk, GenerationError> + Send + Sync,
{
    fn generate(&self, pos: ChunkPos, seed: u64) -> Result<Chunk, GenerationError> {
        self(pos, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_generator() {
        let generator = |pos: ChunkPos, _seed: u64| {
            if pos.x < 0 {
                Err(GenerationError::InvalidCoordinate { pos })
            } else {
                Ok(Chunk::empty())
            }
        };
        assert!(generator.generate(ChunkPos::new(0, 0), 1).is_ok());
        let err = generator.generate(ChunkPos::new(-1, 4), 1).unwrap_err();
        assert_eq!(err.pos(), ChunkPos::new(-1, 4));
        assert!(err.to_string().contains("[-1, 4]"));
    }
}
