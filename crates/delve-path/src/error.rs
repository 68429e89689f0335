use delve_voxel::{GenerationError, Position};

/// Failures of a search or of the nearest-passable lookup.
///
/// Running out of open nodes and being cancelled are not errors: both yield
/// a partial path.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// The generator could not produce a chunk the search needed.
    #[error("terrain generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// A search input lies outside the supported coordinate range.
    #[error("{pos} is outside the supported coordinate range")]
    OutOfRange { pos: Position },

    /// No air voxel exists within the lookup radius.
    #[error("no passable voxel within {radius} blocks of {origin}")]
    NearestPassableNotFound { origin: Position, radius: i32 },
}
