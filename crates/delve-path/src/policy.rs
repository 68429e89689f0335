use std::time::Duration;

use delve_voxel::Position;

use crate::node::{NodePos, NodeSize};

/// Bounds on how much work one search may do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchLimits {
    /// Node expansions before the search gives up with a segment.
    pub max_expansions: usize,
    /// Wall-clock limit, checked at the cancellation poll cadence.
    pub timeout: Option<Duration>,
    /// Chunk rings around the expanded node handed to the cache's prefetch.
    pub prefetch_radius: i32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_expansions: 2_000_000,
            timeout: None,
            prefetch_radius: 2,
        }
    }
}

/// Which node sizes a search may use, and where.
///
/// Nodes never grow beyond `max_size` and never shrink below `min_size`,
/// except within `endpoint_radius` voxels of the start or the goal, where
/// `endpoint_min_size` applies. A mixed cube already at the floor is
/// impassable, and so is an open cube that cannot be grown to the floor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolutionPolicy {
    pub max_size: NodeSize,
    pub min_size: NodeSize,
    pub endpoint_min_size: NodeSize,
    pub endpoint_radius: f64,
    /// A node whose cube lies within this distance of the goal finishes the
    /// search.
    pub goal_tolerance: f64,
    pub limits: SearchLimits,
}

impl ResolutionPolicy {
    /// Every size from 16 down to single voxels, everywhere.
    pub fn fine() -> Self {
        Self {
            max_size: NodeSize::X16,
            min_size: NodeSize::X1,
            endpoint_min_size: NodeSize::X1,
            endpoint_radius: 0.0,
            goal_tolerance: 1.0,
            limits: SearchLimits::default(),
        }
    }

    /// Sizes 16 down to 4, refined to single voxels near the start and the goal.
    pub fn coarse() -> Self {
        Self {
            min_size: NodeSize::X4,
            endpoint_radius: 16.0,
            ..Self::fine()
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Smallest node size allowed at `node`.
    pub fn floor_for(&self, node: &NodePos, start: Position, goal: Position) -> NodeSize {
        if node.distance_to(goal) <= self.endpoint_radius
            || node.distance_to(start) <= self.endpoint_radius
        {
            self.endpoint_min_size.min(self.min_size)
        } else {
            self.min_size
        }
    }
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self::coarse()
    }
}
