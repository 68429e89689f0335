//! Immutable solid/air storage for a 16×128×16 chunk column.
//!
//! Besides the per-voxel bits, every chunk carries an occupancy pyramid: for
//! each aligned cube of edge 2, 4, 8 and 16 it records whether the cube is
//! fully open, fully solid, or mixed. The pyramid is built once, bottom-up,
//! when the chunk is constructed, so classifying a search node is a single
//! lookup and never samples.

use std::fmt;

use crate::bit_mask::BitMask;

/// Horizontal edge length of a chunk in voxels.
pub const CHUNK_WIDTH: usize = 16;

/// Vertical extent of a chunk in voxels.
pub const CHUNK_HEIGHT: usize = 128;

/// Total number of voxels in a chunk (16 × 128 × 16).
pub const CHUNK_VOLUME: usize = CHUNK_WIDTH * CHUNK_HEIGHT * CHUNK_WIDTH;

/// Cube edges summarized by the pyramid, finest first.
const PYRAMID_WIDTHS: [usize; 4] = [2, 4, 8, 16];

/// Occupancy classification of a cubic region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupancy {
    /// Every voxel in the cube is air.
    Open,
    /// Every voxel in the cube is solid.
    Solid,
    /// The cube contains both solid and air voxels.
    Mixed,
}

impl Occupancy {
    fn from_solid(solid: bool) -> Self {
        if solid { Self::Solid } else { Self::Open }
    }

    /// Combines two classifications of disjoint regions.
    #[must_use]
    pub fn merge(self, other: Occupancy) -> Occupancy {
        if self == other { self } else { Occupancy::Mixed }
    }
}

/// One level of the occupancy pyramid.
#[derive(Clone, PartialEq, Eq)]
struct Level {
    width: usize,
    cells: Vec<Occupancy>,
}

impl Level {
    fn dims(width: usize) -> (usize, usize, usize) {
        (CHUNK_WIDTH / width, CHUNK_HEIGHT / width, CHUNK_WIDTH / width)
    }

    fn index(width: usize, cx: usize, cy: usize, cz: usize) -> usize {
        let (nx, _, nz) = Self::dims(width);
        (cy * nz + cz) * nx + cx
    }
}

/// A generated chunk. Read-only once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    solid: BitMask,
    levels: Vec<Level>,
}

impl Chunk {
    /// A chunk with no solid voxels.
    pub fn empty() -> Self {
        ChunkBuilder::new().build()
    }

    /// A chunk made entirely of solid voxels.
    pub fn filled() -> Self {
        ChunkBuilder::filled().build()
    }

    /// Builds a chunk by evaluating `is_solid(x, y, z)` for every local voxel.
    pub fn from_fn(mut is_solid: impl FnMut(usize, usize, usize) -> bool) -> Self {
        let mut builder = ChunkBuilder::new();
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_WIDTH {
                for x in 0..CHUNK_WIDTH {
                    if is_solid(x, y, z) {
                        builder.set_solid(x, y, z, true);
                    }
                }
            }
        }
        builder.build()
    }

    /// Whether the local voxel `(x, y, z)` is solid.
    ///
    /// `x` and `z` must be in `0..16`, `y` in `0..128`.
    #[inline]
    pub fn is_solid(&self, x: usize, y: usize, z: usize) -> bool {
        self.solid.get(linear_index(x, y, z))
    }

    /// Classifies the cube of edge `width` whose minimum corner is the local
    /// voxel `(x, y, z)`.
    ///
    /// Widths of 1, 2, 4, 8 and 16 at aligned corners are answered from the
    /// pyramid. Any other cube that fits in the chunk is scanned.
    pub fn occupancy(&self, width: usize, x: usize, y: usize, z: usize) -> Occupancy {
        if width == 1 {
            return Occupancy::from_solid(self.is_solid(x, y, z));
        }
        let aligned = x % width == 0 && y % width == 0 && z % width == 0;
        if aligned && let Some(level) = self.levels.iter().find(|l| l.width == width) {
            let idx = Level::index(width, x / width, y / width, z / width);
            return level.cells[idx];
        }
        self.scan_occupancy(width, x, y, z)
    }

    /// Number of solid voxels.
    pub fn solid_count(&self) -> usize {
        self.solid.count_ones()
    }

    fn scan_occupancy(&self, width: usize, x: usize, y: usize, z: usize) -> Occupancy {
        debug_assert!(x + width <= CHUNK_WIDTH && z + width <= CHUNK_WIDTH);
        debug_assert!(y + width <= CHUNK_HEIGHT);
        let mut result = Occupancy::from_solid(self.is_solid(x, y, z));
        for yy in y..y + width {
            for zz in z..z + width {
                for xx in x..x + width {
                    result = result.merge(Occupancy::from_solid(self.is_solid(xx, yy, zz)));
                    if result == Occupancy::Mixed {
                        return result;
                    }
                }
            }
        }
        result
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("solid_count", &self.solid_count())
            .finish_non_exhaustive()
    }
}

/// Mutable staging area for a chunk. Generators fill a builder and call
/// [`ChunkBuilder::build`] once.
#[derive(Clone, Debug)]
pub struct ChunkBuilder {
    solid: BitMask,
}

impl ChunkBuilder {
    /// A builder with every voxel set to air.
    pub fn new() -> Self {
        Self {
            solid: BitMask::new(CHUNK_VOLUME),
        }
    }

    /// A builder with every voxel set to solid.
    pub fn filled() -> Self {
        Self {
            solid: BitMask::filled(CHUNK_VOLUME),
        }
    }

    /// Marks the local voxel `(x, y, z)` as solid or air.
    pub fn set_solid(&mut self, x: usize, y: usize, z: usize, solid: bool) -> &mut Self {
        self.solid.set(linear_index(x, y, z), solid);
        self
    }

    /// Whether the local voxel `(x, y, z)` is currently solid.
    pub fn is_solid(&self, x: usize, y: usize, z: usize) -> bool {
        self.solid.get(linear_index(x, y, z))
    }

    /// Sets every voxel in the half-open local box `min..max` (clamped to the
    /// chunk) to `solid`.
    pub fn fill_box(&mut self, min: [usize; 3], max: [usize; 3], solid: bool) -> &mut Self {
        let max = [
            max[0].min(CHUNK_WIDTH),
            max[1].min(CHUNK_HEIGHT),
            max[2].min(CHUNK_WIDTH),
        ];
        for y in min[1]..max[1] {
            for z in min[2]..max[2] {
                for x in min[0]..max[0] {
                    self.solid.set(linear_index(x, y, z), solid);
                }
            }
        }
        self
    }

    /// Freezes the voxels and computes the occupancy pyramid.
    pub fn build(self) -> Chunk {
        let mut levels: Vec<Level> = Vec::with_capacity(PYRAMID_WIDTHS.len());
        for &width in &PYRAMID_WIDTHS {
            let (nx, ny, nz) = Level::dims(width);
            let mut cells = Vec::with_capacity(nx * ny * nz);
            let half = width / 2;
            for cy in 0..ny {
                for cz in 0..nz {
                    for cx in 0..nx {
                        let mut merged: Option<Occupancy> = None;
                        for (oy, oz, ox) in OCTANTS {
                            let child = match levels.last() {
                                Some(prev) => {
                                    let idx = Level::index(
                                        half,
                                        cx * 2 + ox,
                                        cy * 2 + oy,
                                        cz * 2 + oz,
                                    );
                                    prev.cells[idx]
                                }
                                None => Occupancy::from_solid(self.solid.get(linear_index(
                                    cx * 2 + ox,
                                    cy * 2 + oy,
                                    cz * 2 + oz,
                                ))),
                            };
                            merged = Some(merged.map_or(child, |m| m.merge(child)));
                        }
                        cells.push(merged.unwrap_or(Occupancy::Open));
                    }
                }
            }
            levels.push(Level { width, cells });
        }

        Chunk {
            solid: self.solid,
            levels,
        }
    }
}

impl Default for ChunkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Child offsets `(y, z, x)` of the eight octants of a cube.
const OCTANTS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (0, 0, 1),
    (0, 1, 0),
    (0, 1, 1),
    (1, 0, 0),
    (1, 0, 1),
    (1, 1, 0),
    (1, 1, 1),
];

/// Converts local `(x, y, z)` to a linear index (x varies fastest, then z).
#[inline]
fn linear_index(x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x < CHUNK_WIDTH && y < CHUNK_HEIGHT && z < CHUNK_WIDTH);
    (y * CHUNK_WIDTH + z) * CHUNK_WIDTH + x
}
