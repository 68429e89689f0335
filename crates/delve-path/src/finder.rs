//! Best-first search over multi-resolution nodes.
//!
//! Open terrain is covered by the largest aligned cube that fits. When a
//! step lands in a cube that is partly solid, the cube is split and only the
//! octants on the face being entered are tried, so resolution is spent next
//! to obstacles and nowhere else.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use delve_terrain::ChunkCache;
use delve_voxel::{ChunkPos, GenerationError, Occupancy, Position};
use tracing::{debug, info, trace};

use crate::cancel::CancellationToken;
use crate::error::PathError;
use crate::nearest::nearest_passable;
use crate::node::{DIRECTIONS, Node, NodeArena, NodeId, NodePos, NodeSize};
use crate::path::{Path, PathKind, SearchStats, StopReason};
use crate::policy::ResolutionPolicy;
use crate::view::WorldView;

/// Expansions between two checks of the cancellation token and the timeout.
pub const CANCEL_POLL_INTERVAL: usize = 64;

/// Searches for a route from `start` toward `goal`.
///
/// Returns `Ok(None)` when the start is buried in rock with no air nearby, a
/// [`PathKind::Finished`] path when the goal was reached, and otherwise a
/// [`PathKind::Segment`] ending at the node that got closest to the goal.
/// That segment is just the start when nothing closer was reachable.
pub fn find_path(
    start: Position,
    goal: Position,
    cache: &ChunkCache,
    policy: ResolutionPolicy,
    cancel: &CancellationToken,
) -> Result<Option<Path>, PathError> {
    PathFinder::new(policy)
        .with_cancellation(cancel.clone())
        .find_path(start, goal, cache)
}

/// Reusable search configuration.
#[derive(Clone, Debug, Default)]
pub struct PathFinder {
    policy: ResolutionPolicy,
    cancel: CancellationToken,
}

impl PathFinder {
    pub fn new(policy: ResolutionPolicy) -> Self {
        Self {
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Observe `token` instead of the finder's own.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    /// A handle that cancels searches run by this finder.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn find_path(
        &self,
        start: Position,
        goal: Position,
        cache: &ChunkCache,
    ) -> Result<Option<Path>, PathError> {
        let started = Instant::now();
        for pos in [start, goal] {
            if !pos.in_coordinate_range() {
                return Err(PathError::OutOfRange { pos });
            }
        }
        let mut view = WorldView::new(cache);

        let start = if view.is_solid(start)? {
            match nearest_passable(start, &mut view) {
                Ok(relocated) => {
                    debug!(requested = %start, %relocated, "start is solid, relocated");
                    relocated
                }
                Err(PathError::NearestPassableNotFound { .. }) => {
                    debug!(%start, "start is buried, no path");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        } else {
            start
        };

        debug!(%start, %goal, "searching");
        let mut search = Search::new(&self.policy, goal, view);
        search.plant(start)?;
        let stop = search.run(&self.cancel, started)?;
        let path = search.into_path(start, stop, started);

        info!(
            kind = ?path.kind,
            reason = ?stop,
            expansions = path.stats.expansions,
            nodes = path.stats.nodes,
            waypoints = path.waypoints.len(),
            elapsed_ms = path.stats.elapsed.as_millis() as u64,
            "search complete"
        );
        Ok(Some(path))
    }
}

/// Open-set entry. Ordered so the max-heap yields the smallest `f`, then
/// the smallest `h`, then the earliest insertion.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f: f64,
    h: f64,
    seq: u64,
    id: NodeId,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

/// State of a single search.
struct Search<'a> {
    policy: &'a ResolutionPolicy,
    start: Position,
    goal: Position,
    view: WorldView<'a>,
    arena: NodeArena,
    open: BinaryHeap<OpenEntry>,
    seq: u64,
    best: NodeId,
    reached: Option<NodeId>,
    expanded: Vec<NodeId>,
}

impl<'a> Search<'a> {
    fn new(policy: &'a ResolutionPolicy, goal: Position, view: WorldView<'a>) -> Self {
        Self {
            policy,
            start: Position::ZERO,
            goal,
            view,
            arena: NodeArena::new(),
            open: BinaryHeap::new(),
            seq: 0,
            best: NodeId(0),
            reached: None,
            expanded: Vec::new(),
        }
    }

    /// Admits the start node: the largest open aligned cube around `start`.
    fn plant(&mut self, start: Position) -> Result<(), GenerationError> {
        self.start = start;
        let mut pos = NodePos::containing(start, NodeSize::X1);
        while let Some(size) = pos.size.double() {
            if size > self.policy.max_size {
                break;
            }
            let candidate = NodePos::containing(start, size);
            if self.view.classify(&candidate)? != Occupancy::Open {
                break;
            }
            pos = candidate;
        }

        let root = Node {
            pos,
            point: start,
            cost: 0.0,
            heuristic: start.distance_to(&self.goal),
            parent: None,
        };
        if let Some(id) = self.arena.insert(root) {
            self.best = id;
            self.push(id);
            self.check_goal(id);
        }
        Ok(())
    }

    fn run(&mut self, cancel: &CancellationToken, started: Instant) -> Result<StopReason, PathError> {
        let limits = self.policy.limits;
        let mut expansions = 0usize;
        let mut prefetched: Option<ChunkPos> = None;

        loop {
            if self.reached.is_some() {
                return Ok(StopReason::GoalReached);
            }
            if expansions % CANCEL_POLL_INTERVAL == 0 {
                if cancel.is_cancelled() {
                    return Ok(StopReason::Cancelled);
                }
                if let Some(timeout) = limits.timeout
                    && started.elapsed() >= timeout
                {
                    return Ok(StopReason::TimedOut);
                }
            }
            if expansions >= limits.max_expansions {
                return Ok(StopReason::BudgetExhausted);
            }
            let Some(entry) = self.open.pop() else {
                return Ok(StopReason::OpenSetExhausted);
            };

            expansions += 1;
            self.expanded.push(entry.id);

            let chunk = self.arena.get(entry.id).pos.chunk_pos();
            if prefetched != Some(chunk) && !cancel.is_cancelled() {
                self.prefetch_around(chunk);
                prefetched = Some(chunk);
            }

            self.expand(entry.id)?;
        }
    }

    fn prefetch_around(&self, center: ChunkPos) {
        let radius = self.policy.limits.prefetch_radius;
        let cache = self.view.cache();
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                cache.prefetch(center.offset(dx, dz));
            }
        }
    }

    fn expand(&mut self, id: NodeId) -> Result<(), GenerationError> {
        let from = self.arena.get(id).pos;
        for dir in DIRECTIONS {
            self.enter(from.neighbor(dir), dir, id)?;
            if self.reached.is_some() {
                break;
            }
        }
        Ok(())
    }

    /// Tries to step from node `from` into `cube`, which lies across the
    /// face of `from` in direction `dir` (or is an octant of such a cube on
    /// that face).
    fn enter(
        &mut self,
        cube: NodePos,
        dir: (i32, i32, i32),
        from: NodeId,
    ) -> Result<(), GenerationError> {
        if self.arena.contains(&cube) {
            return Ok(());
        }
        match self.view.classify(&cube)? {
            Occupancy::Open => {
                let promoted = self.promote(cube, from)?;
                if promoted.size < self.floor_for(&promoted) {
                    trace!(origin = %promoted.origin, size = ?promoted.size, "open cube below floor");
                    return Ok(());
                }
                self.admit(promoted, from);
            }
            Occupancy::Solid => {}
            Occupancy::Mixed => {
                if cube.size <= self.floor_for(&cube) {
                    trace!(origin = %cube.origin, size = ?cube.size, "mixed cube at floor");
                    return Ok(());
                }
                if let Some(children) = cube.entry_children(dir) {
                    for child in children {
                        self.enter(child, dir, from)?;
                        if self.reached.is_some() {
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn floor_for(&self, cube: &NodePos) -> NodeSize {
        self.policy.floor_for(cube, self.start, self.goal)
    }

    /// Grows an open cube to the largest open aligned cube enclosing it that
    /// stays clear of the node it is entered from.
    fn promote(&mut self, cube: NodePos, from: NodeId) -> Result<NodePos, GenerationError> {
        let current = self.arena.get(from).pos;
        let mut promoted = cube;
        while let Some(size) = promoted.size.double() {
            if size > self.policy.max_size {
                break;
            }
            let candidate = cube.enclosing(size);
            if candidate.overlaps(&current)
                || self.view.classify(&candidate)? != Occupancy::Open
            {
                break;
            }
            promoted = candidate;
        }
        Ok(promoted)
    }

    fn admit(&mut self, pos: NodePos, parent: NodeId) {
        let (parent_point, parent_cost) = {
            let p = self.arena.get(parent);
            (p.point, p.cost)
        };
        let point = pos.center();
        let node = Node {
            pos,
            point,
            cost: parent_cost + parent_point.distance_to(&point),
            heuristic: point.distance_to(&self.goal),
            parent: Some(parent),
        };
        let Some(id) = self.arena.insert(node) else {
            return;
        };
        self.push(id);
        if self.arena.get(id).heuristic < self.arena.get(self.best).heuristic {
            self.best = id;
        }
        self.check_goal(id);
    }

    fn push(&mut self, id: NodeId) {
        let node = self.arena.get(id);
        self.open.push(OpenEntry {
            f: node.estimate(),
            h: node.heuristic,
            seq: self.seq,
            id,
        });
        self.seq += 1;
    }

    fn check_goal(&mut self, id: NodeId) {
        if self.reached.is_some() {
            return;
        }
        if self.arena.get(id).pos.distance_to(self.goal) <= self.policy.goal_tolerance {
            self.reached = Some(id);
        }
    }

    fn into_path(self, start: Position, stop: StopReason, started: Instant) -> Path {
        let (kind, terminal) = match (stop, self.reached) {
            (StopReason::GoalReached, Some(id)) => (PathKind::Finished, id),
            // `best` is still the root when nothing got closer.
            _ => (PathKind::Segment, self.best),
        };

        let chain = self.arena.chain(terminal);
        let mut waypoints = Vec::with_capacity(chain.len() + 1);
        waypoints.push(start);
        let cost;
        if kind == PathKind::Finished {
            let last = self.arena.get(terminal);
            let end = last.pos.closest_point(self.goal);
            // The terminal node is represented by the point nearest the goal.
            let interior = chain.len().saturating_sub(2);
            for &id in chain.iter().skip(1).take(interior) {
                waypoints.push(self.arena.get(id).point);
            }
            cost = match last.parent {
                Some(parent) => {
                    let parent = self.arena.get(parent);
                    parent.cost + parent.point.distance_to(&end)
                }
                None => start.distance_to(&end),
            };
            waypoints.push(end);
        } else {
            for &id in &chain[1..] {
                waypoints.push(self.arena.get(id).point);
            }
            cost = self.arena.get(terminal).cost;
        }
        waypoints.dedup();

        let nodes = self
            .expanded
            .iter()
            .map(|&id| self.arena.get(id).clone())
            .collect();
        let stats = SearchStats {
            expansions: self.expanded.len(),
            nodes: self.arena.len(),
            elapsed: started.elapsed(),
            stop,
        };

        Path {
            kind,
            start,
            goal: self.goal,
            waypoints,
            nodes,
            cost,
            stats,
            cache: self.view.cache().clone(),
        }
    }
}
