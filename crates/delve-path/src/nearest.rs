use delve_terrain::ChunkCache;
use delve_voxel::Position;
use tracing::debug;

use crate::error::PathError;
use crate::view::WorldView;

/// Largest Chebyshev radius searched for an air voxel.
pub const MAX_NEAREST_PASSABLE_RADIUS: i32 = 16;

/// Finds the air voxel closest to `pos`.
///
/// Shells of growing Chebyshev radius are scanned outward. Among air voxels
/// the smallest Euclidean distance wins, then the smallest `y`, `x` and `z`.
/// A candidate is only accepted once no unscanned shell can hold a closer
/// voxel, so the answer does not depend on scan order.
pub fn find_nearest_passable(pos: Position, cache: &ChunkCache) -> Result<Position, PathError> {
    nearest_passable(pos, &mut WorldView::new(cache))
}

pub(crate) fn nearest_passable(pos: Position, view: &mut WorldView<'_>) -> Result<Position, PathError> {
    if !pos.in_coordinate_range() {
        return Err(PathError::OutOfRange { pos });
    }
    let mut best: Option<(i64, Position)> = None;

    for radius in 0..=MAX_NEAREST_PASSABLE_RADIUS {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    let candidate = pos.offset(dx, dy, dz);
                    if pos.chebyshev_distance(&candidate) != i64::from(radius) {
                        continue;
                    }
                    if !candidate.in_world() || view.is_solid(candidate)? {
                        continue;
                    }
                    let dist = pos.distance_sq(&candidate);
                    if best.is_none_or(|(d, p)| rank(dist, candidate) < rank(d, p)) {
                        best = Some((dist, candidate));
                    }
                }
            }
        }

        let next = i64::from(radius + 1);
        if let Some((dist, found)) = best
            && dist < next * next
        {
            debug!(origin = %pos, %found, radius, "found nearest passable voxel");
            return Ok(found);
        }
    }

    match best {
        Some((_, found)) => Ok(found),
        None => Err(PathError::NearestPassableNotFound {
            origin: pos,
            radius: MAX_NEAREST_PASSABLE_RADIUS,
        }),
    }
}

fn rank(dist: i64, p: Position) -> (i64, i32, i32, i32) {
    (dist, p.y, p.x, p.z)
}
