use std::collections::hash_map::Entry;
use std::sync::Arc;

use delve_terrain::ChunkCache;
use delve_voxel::{Chunk, ChunkPos, GenerationError, Occupancy, Position, WORLD_MAX_Y, WORLD_MIN_Y};
use rustc_hash::FxHashMap;

use crate::node::NodePos;

/// A search's window onto the chunk cache.
///
/// Chunks are pinned locally after the first lookup so the hot path does not
/// touch the shared map again.
pub(crate) struct WorldView<'a> {
    cache: &'a ChunkCache,
    chunks: FxHashMap<ChunkPos, Arc<Chunk>>,
}

impl<'a> WorldView<'a> {
    pub fn new(cache: &'a ChunkCache) -> Self {
        Self {
            cache,
            chunks: FxHashMap::default(),
        }
    }

    pub fn cache(&self) -> &'a ChunkCache {
        self.cache
    }

    pub fn chunk(&mut self, pos: ChunkPos) -> Result<&Chunk, GenerationError> {
        let chunk = match self.chunks.entry(pos) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(self.cache.get(pos)?),
        };
        Ok(&**chunk)
    }

    /// Whether voxel `pos` is solid. Outside the world everything is.
    pub fn is_solid(&mut self, pos: Position) -> Result<bool, GenerationError> {
        let Some((x, y, z)) = pos.local() else {
            return Ok(true);
        };
        Ok(self.chunk(pos.chunk_pos())?.is_solid(x, y, z))
    }

    /// Exact occupancy of a node's cube.
    pub fn classify(&mut self, node: &NodePos) -> Result<Occupancy, GenerationError> {
        let (min_y, max_y) = (node.origin.y, node.max_corner().y);
        if max_y < WORLD_MIN_Y || min_y >= WORLD_MAX_Y {
            return Ok(Occupancy::Solid);
        }
        let Some((x, y, z)) = node.origin.local() else {
            // Aligned cubes never straddle the edges of the world.
            return Ok(Occupancy::Solid);
        };
        let width = node.width() as usize;
        Ok(self.chunk(node.chunk_pos())?.occupancy(width, x, y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeSize;
    use delve_voxel::COORDINATE_LIMIT;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_classify_and_bounds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = ChunkCache::new(
            Arc::new(move |_pos: ChunkPos, _seed: u64| -> Result<Chunk, GenerationError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Chunk::from_fn(|x, y, _| x == 3 && y < 64))
            }),
            0,
        );
        let mut view = WorldView::new(&cache);

        let below = NodePos::containing(Position::new(0, -1, 0), NodeSize::X16);
        let above = NodePos::containing(Position::new(0, 128, 0), NodeSize::X8);
        assert_eq!(view.classify(&below).unwrap(), Occupancy::Solid);
        assert_eq!(view.classify(&above).unwrap(), Occupancy::Solid);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let low = NodePos::containing(Position::new(0, 0, 0), NodeSize::X16);
        let high = NodePos::containing(Position::new(0, 64, 0), NodeSize::X16);
        let wall = NodePos::containing(Position::new(3, 10, 7), NodeSize::X1);
        let beside = NodePos::containing(Position::new(4, 10, 7), NodeSize::X4);
        assert_eq!(view.classify(&low).unwrap(), Occupancy::Mixed);
        assert_eq!(view.classify(&high).unwrap(), Occupancy::Open);
        assert_eq!(view.classify(&wall).unwrap(), Occupancy::Solid);
        assert_eq!(view.classify(&beside).unwrap(), Occupancy::Open);
        assert!(view.is_solid(Position::new(3, 0, 0)).unwrap());
        assert!(!view.is_solid(Position::new(3, 64, 0)).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let edge = NodePos::containing(Position::new(COORDINATE_LIMIT - 1, 64, 0), NodeSize::X16);
        assert_eq!(view.classify(&edge).unwrap(), Occupancy::Open);
        assert_eq!(view.classify(&edge.neighbor((1, 0, 0))).unwrap(), Occupancy::Solid);
        assert!(view.is_solid(Position::new(COORDINATE_LIMIT, 64, 0)).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
