use std::collections::BTreeMap;
use std::time::Duration;

use delve_terrain::ChunkCache;
use delve_voxel::Position;

use crate::node::{Node, NodeSize};

/// Whether a path reaches the goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// The search stopped early; the path ends at the node closest to the
    /// goal. Callers may search again from its end.
    Segment,
    /// The path ends within the goal tolerance.
    Finished,
}

/// Why the search loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopReason {
    GoalReached,
    Cancelled,
    TimedOut,
    BudgetExhausted,
    OpenSetExhausted,
}

/// Counters describing one search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchStats {
    pub expansions: usize,
    /// Nodes admitted to the search tree, including the start node.
    pub nodes: usize,
    pub elapsed: Duration,
    pub stop: StopReason,
}

/// The result of a search.
#[derive(Clone, Debug)]
pub struct Path {
    pub kind: PathKind,
    /// Start of the path. Differs from the requested start when that voxel
    /// was solid and had to be relocated.
    pub start: Position,
    pub goal: Position,
    /// Route from `start` to the furthest point reached.
    pub waypoints: Vec<Position>,
    /// Nodes in the order they were expanded.
    pub nodes: Vec<Node>,
    /// Accumulated travel cost along `waypoints`.
    pub cost: f64,
    pub stats: SearchStats,
    pub(crate) cache: ChunkCache,
}

impl Path {
    pub fn is_finished(&self) -> bool {
        self.kind == PathKind::Finished
    }

    /// The last waypoint, or the start when there are none.
    pub fn end_pos(&self) -> Position {
        self.waypoints.last().copied().unwrap_or(self.start)
    }

    /// Length of the waypoint polyline.
    pub fn total_length(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }

    /// How many expanded nodes had each size.
    pub fn size_histogram(&self) -> BTreeMap<NodeSize, usize> {
        let mut histogram = BTreeMap::new();
        for node in &self.nodes {
            *histogram.entry(node.pos.size).or_insert(0) += 1;
        }
        histogram
    }

    /// The cache the path was searched through, for inspecting the terrain
    /// along it.
    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }
}
