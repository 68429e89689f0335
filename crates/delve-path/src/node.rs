//! The multi-resolution node model and the arena that owns a search tree.

use delve_voxel::{ChunkPos, Position};
use rustc_hash::FxHashMap;

/// Edge length of a node cube.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeSize {
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl NodeSize {
    /// All sizes, finest first.
    pub const ALL: [NodeSize; 5] = [Self::X1, Self::X2, Self::X4, Self::X8, Self::X16];

    /// Edge length in voxels.
    pub const fn width(self) -> i32 {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
            Self::X16 => 16,
        }
    }

    /// The next finer size, if any.
    pub const fn half(self) -> Option<NodeSize> {
        match self {
            Self::X1 => None,
            Self::X2 => Some(Self::X1),
            Self::X4 => Some(Self::X2),
            Self::X8 => Some(Self::X4),
            Self::X16 => Some(Self::X8),
        }
    }

    /// The next coarser size, if any.
    pub const fn double(self) -> Option<NodeSize> {
        match self {
            Self::X1 => Some(Self::X2),
            Self::X2 => Some(Self::X4),
            Self::X4 => Some(Self::X8),
            Self::X8 => Some(Self::X16),
            Self::X16 => None,
        }
    }
}

/// The six axis-aligned step directions.
pub(crate) const DIRECTIONS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// A cube of the world: its size and its minimum corner, which is always
/// aligned to a multiple of the size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodePos {
    pub size: NodeSize,
    pub origin: Position,
}

impl NodePos {
    /// The aligned cube of `size` that contains `pos`.
    pub fn containing(pos: Position, size: NodeSize) -> Self {
        let w = size.width();
        Self {
            size,
            origin: Position::new(
                pos.x.div_euclid(w) * w,
                pos.y.div_euclid(w) * w,
                pos.z.div_euclid(w) * w,
            ),
        }
    }

    pub fn width(&self) -> i32 {
        self.size.width()
    }

    /// Inclusive maximum corner.
    pub fn max_corner(&self) -> Position {
        let w = self.width() - 1;
        self.origin.offset(w, w, w)
    }

    /// The voxel used as the node's reference point for costs and waypoints.
    pub fn center(&self) -> Position {
        let h = self.width() / 2;
        self.origin.offset(h, h, h)
    }

    pub fn contains(&self, pos: Position) -> bool {
        let max = self.max_corner();
        (self.origin.x..=max.x).contains(&pos.x)
            && (self.origin.y..=max.y).contains(&pos.y)
            && (self.origin.z..=max.z).contains(&pos.z)
    }

    /// The voxel of this cube nearest to `pos`.
    pub fn closest_point(&self, pos: Position) -> Position {
        let max = self.max_corner();
        Position::new(
            pos.x.clamp(self.origin.x, max.x),
            pos.y.clamp(self.origin.y, max.y),
            pos.z.clamp(self.origin.z, max.z),
        )
    }

    /// Euclidean distance from `pos` to the nearest voxel of this cube.
    pub fn distance_to(&self, pos: Position) -> f64 {
        self.closest_point(pos).distance_to(&pos)
    }

    /// Whether the two cubes share at least one voxel.
    pub fn overlaps(&self, other: &NodePos) -> bool {
        let (a_min, a_max) = (self.origin, self.max_corner());
        let (b_min, b_max) = (other.origin, other.max_corner());
        a_min.x <= b_max.x
            && b_min.x <= a_max.x
            && a_min.y <= b_max.y
            && b_min.y <= a_max.y
            && a_min.z <= b_max.z
            && b_min.z <= a_max.z
    }

    /// The same-size cube across the face in direction `dir`. Cubes inside
    /// the coordinate range have neighbours that fit in `i32`.
    pub fn neighbor(&self, (dx, dy, dz): (i32, i32, i32)) -> NodePos {
        let w = self.width();
        NodePos {
            size: self.size,
            origin: self.origin.offset(dx * w, dy * w, dz * w),
        }
    }

    /// The aligned cube of `size` (coarser or equal) enclosing this one.
    pub fn enclosing(&self, size: NodeSize) -> NodePos {
        NodePos::containing(self.origin, size)
    }

    /// The four half-size octants on the face of this cube that points
    /// against `dir`, i.e. the face a step in direction `dir` enters through.
    pub fn entry_children(&self, (dx, dy, dz): (i32, i32, i32)) -> Option<[NodePos; 4]> {
        let child = self.size.half()?;
        let h = child.width();
        // Along the step axis the entry face is the low side for a positive
        // step and the high side for a negative one.
        let pick = |d: i32| -> [i32; 2] {
            match d {
                1 => [0, 0],
                -1 => [h, h],
                _ => [0, h],
            }
        };
        let (xs, ys, zs) = (pick(dx), pick(dy), pick(dz));
        // Exactly one of the three axes is fixed; iterate the other two.
        let offsets: [(i32, i32, i32); 4] = if dx != 0 {
            [(xs[0], ys[0], zs[0]), (xs[0], ys[0], zs[1]), (xs[0], ys[1], zs[0]), (xs[0], ys[1], zs[1])]
        } else if dy != 0 {
            [(xs[0], ys[0], zs[0]), (xs[0], ys[0], zs[1]), (xs[1], ys[0], zs[0]), (xs[1], ys[0], zs[1])]
        } else {
            [(xs[0], ys[0], zs[0]), (xs[0], ys[1], zs[0]), (xs[1], ys[0], zs[0]), (xs[1], ys[1], zs[0])]
        };
        Some(offsets.map(|(ox, oy, oz)| NodePos {
            size: child,
            origin: self.origin.offset(ox, oy, oz),
        }))
    }

    /// The chunk column holding this cube. Cubes never straddle columns
    /// because every size divides the chunk width.
    pub fn chunk_pos(&self) -> ChunkPos {
        self.origin.chunk_pos()
    }
}

/// Index of a node in its search's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A discovered node of the search tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub pos: NodePos,
    /// Reference point used for costs and as the node's waypoint.
    pub point: Position,
    /// Accumulated travel cost from the start (`g`).
    pub cost: f64,
    /// Straight-line distance from `point` to the goal (`h`).
    pub heuristic: f64,
    /// The node this one was discovered from. `None` only for the root.
    pub parent: Option<NodeId>,
}

impl Node {
    /// Search priority `f = g + h`.
    pub fn estimate(&self) -> f64 {
        self.cost + self.heuristic
    }
}

/// Owns every node of one search. Nodes reference their parents by index and
/// the whole tree is released together when the arena is dropped.
#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    nodes: Vec<Node>,
    index: FxHashMap<NodePos, NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node unless one already exists at the same cube. The first
    /// discovery keeps its parent, so the tree never gains a cycle.
    pub fn insert(&mut self, node: Node) -> Option<NodeId> {
        if self.index.contains_key(&node.pos) {
            return None;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.index.insert(node.pos, id);
        self.nodes.push(node);
        Some(id)
    }

    pub fn contains(&self, pos: &NodePos) -> bool {
        self.index.contains_key(pos)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Node ids from the root down to `id`.
    pub fn chain(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut cursor = self.get(id).parent;
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.get(parent).parent;
        }
        chain.reverse();
        chain
    }
}
