//! Integer block and chunk coordinates.

use std::fmt;

use crate::chunk::{CHUNK_HEIGHT, CHUNK_WIDTH};

/// Lowest block layer that exists in the world (inclusive).
pub const WORLD_MIN_Y: i32 = 0;

/// Highest block layer that exists in the world (exclusive).
pub const WORLD_MAX_Y: i32 = CHUNK_HEIGHT as i32;

/// Every coordinate of a usable position lies in `-COORDINATE_LIMIT..COORDINATE_LIMIT`.
/// Horizontally the world ends there, so stepping a chunk's width past any
/// in-range position can never overflow `i32`.
pub const COORDINATE_LIMIT: i32 = 1 << 30;

/// A block position in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    /// The world origin.
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns this position shifted by `(dx, dy, dz)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Squared Euclidean distance, computed in `i64` so far-apart positions
    /// never overflow.
    pub fn distance_sq(&self, other: &Position) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.distance_sq(other) as f64).sqrt()
    }

    /// Chebyshev (maximum-axis) distance to `other`.
    pub fn chebyshev_distance(&self, other: &Position) -> i64 {
        let dx = (i64::from(self.x) - i64::from(other.x)).abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).abs();
        let dz = (i64::from(self.z) - i64::from(other.z)).abs();
        dx.max(dy).max(dz)
    }

    /// The chunk column containing this position.
    pub fn chunk_pos(&self) -> ChunkPos {
        ChunkPos {
            x: self.x.div_euclid(CHUNK_WIDTH as i32),
            z: self.z.div_euclid(CHUNK_WIDTH as i32),
        }
    }

    /// Coordinates of this position inside its chunk.
    ///
    /// Returns `None` when the position lies outside the world.
    pub fn local(&self) -> Option<(usize, usize, usize)> {
        if !self.in_world() {
            return None;
        }
        let lx = self.x.rem_euclid(CHUNK_WIDTH as i32) as usize;
        let lz = self.z.rem_euclid(CHUNK_WIDTH as i32) as usize;
        Some((lx, self.y as usize, lz))
    }

    /// Whether `y` lies inside `WORLD_MIN_Y..WORLD_MAX_Y`.
    pub fn in_vertical_bounds(&self) -> bool {
        (WORLD_MIN_Y..WORLD_MAX_Y).contains(&self.y)
    }

    /// Whether every coordinate lies inside [`COORDINATE_LIMIT`].
    pub fn in_coordinate_range(&self) -> bool {
        let range = -COORDINATE_LIMIT..COORDINATE_LIMIT;
        range.contains(&self.x) && range.contains(&self.y) && range.contains(&self.z)
    }

    /// Whether the voxel exists: inside the vertical bounds and the
    /// horizontal coordinate range.
    pub fn in_world(&self) -> bool {
        self.in_vertical_bounds() && self.in_coordinate_range()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<[i32; 3]> for Position {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Identifies a chunk column. Chunks span the full world height, so only the
/// horizontal axes are needed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the chunk offset by `(dx, dz)` columns.
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// World position of the chunk's `(0, 0, 0)` voxel.
    pub fn origin(&self) -> Position {
        Position::new(
            self.x * CHUNK_WIDTH as i32,
            WORLD_MIN_Y,
            self.z * CHUNK_WIDTH as i32,
        )
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}
