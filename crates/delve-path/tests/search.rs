use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use delve_path::{
    CANCEL_POLL_INTERVAL, CancellationToken, NodeSize, PathError, PathFinder, PathKind,
    ResolutionPolicy, SearchLimits, StopReason, find_path,
};
use delve_terrain::{ChunkCache, ParallelExecutor};
use delve_voxel::{COORDINATE_LIMIT, Chunk, ChunkPos, GenerationError, Position};

/// A cache over a world described by a world-space solidity predicate.
fn world(solid: impl Fn(Position) -> bool + Send + Sync + 'static) -> ChunkCache {
    ChunkCache::new(Arc::new(generator(solid, Duration::ZERO)), 7)
}

fn slow_world(solid: impl Fn(Position) -> bool + Send + Sync + 'static, delay: Duration) -> ChunkCache {
    ChunkCache::new(Arc::new(generator(solid, delay)), 7)
}

fn generator(
    solid: impl Fn(Position) -> bool + Send + Sync + 'static,
    delay: Duration,
) -> impl Fn(ChunkPos, u64) -> Result<Chunk, GenerationError> + Send + Sync + 'static {
    move |pos: ChunkPos, _seed: u64| -> Result<Chunk, GenerationError> {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let origin = pos.origin();
        Ok(Chunk::from_fn(|x, y, z| {
            solid(origin.offset(x as i32, y as i32, z as i32))
        }))
    }
}

fn never_cancelled() -> CancellationToken {
    CancellationToken::new()
}

#[test]
fn test_degenerate_search_finishes_in_place() {
    let cache = world(|_| false);
    let p = Position::new(5, 60, 5);
    let path = find_path(p, p, &cache, ResolutionPolicy::fine(), &never_cancelled())
        .unwrap()
        .unwrap();
    assert_eq!(path.kind, PathKind::Finished);
    assert_eq!(path.end_pos(), p);
    assert_eq!(path.waypoints, vec![p]);
    assert_eq!(path.cost, 0.0);
    assert_eq!(path.stats.expansions, 0);
}

#[test]
fn test_buried_start_has_no_path() {
    let cache = world(|_| true);
    let result = find_path(
        Position::new(0, 64, 0),
        Position::new(100, 64, 0),
        &cache,
        ResolutionPolicy::fine(),
        &never_cancelled(),
    )
    .unwrap();
    assert!(result.is_none());
}

#[test]
fn test_sealed_pocket_yields_start_segment() {
    let pocket = Position::new(4, 64, 4);
    let cache = world(move |p| p != pocket);
    let path = find_path(
        pocket,
        Position::new(100, 64, 0),
        &cache,
        ResolutionPolicy::fine(),
        &never_cancelled(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(path.kind, PathKind::Segment);
    assert_eq!(path.stats.stop, StopReason::OpenSetExhausted);
    assert_eq!(path.waypoints, vec![pocket]);
    assert_eq!(path.end_pos(), pocket);
    assert_eq!(path.cost, 0.0);
}

#[test]
fn test_dead_end_facing_away_yields_start_segment() {
    // A short gallery running away from the goal, sealed at both ends.
    let cache = world(|p| !(p.y == 64 && p.z == 0 && (-6..=0).contains(&p.x)));
    let start = Position::new(0, 64, 0);
    let path = find_path(
        start,
        Position::new(100, 64, 0),
        &cache,
        ResolutionPolicy::fine(),
        &never_cancelled(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(path.kind, PathKind::Segment);
    assert_eq!(path.stats.stop, StopReason::OpenSetExhausted);
    assert_eq!(path.waypoints, vec![start]);
    assert!(path.stats.expansions > 1);
}

#[test]
fn test_solid_start_is_relocated() {
    let cache = world(|p| p.y < 60);
    let goal = Position::new(0, 60, 40);
    let path = find_path(
        Position::new(0, 50, 0),
        goal,
        &cache,
        ResolutionPolicy::fine(),
        &never_cancelled(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(path.start, Position::new(0, 60, 0));
    assert_eq!(path.waypoints[0], path.start);
    assert!(path.is_finished());
}

/// Breadth-first step counts from `goal` through the air voxels of a small
/// bounded world.
fn bfs_distances(
    goal: Position,
    solid: &dyn Fn(Position) -> bool,
    min: Position,
    max: Position,
) -> HashMap<Position, i64> {
    let mut dist = HashMap::new();
    let mut queue = VecDeque::new();
    dist.insert(goal, 0);
    queue.push_back(goal);
    while let Some(p) = queue.pop_front() {
        let d = dist[&p];
        for (dx, dy, dz) in [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)] {
            let n = p.offset(dx, dy, dz);
            let inside = (min.x..=max.x).contains(&n.x)
                && (min.y..=max.y).contains(&n.y)
                && (min.z..=max.z).contains(&n.z);
            if inside && !solid(n) && !dist.contains_key(&n) {
                dist.insert(n, d + 1);
                queue.push_back(n);
            }
        }
    }
    dist
}

#[test]
fn test_heuristic_never_overestimates() {
    let (min, max) = (Position::new(0, 32, 0), Position::new(15, 47, 15));
    let solid = move |p: Position| {
        let inside = (min.x..=max.x).contains(&p.x)
            && (min.y..=max.y).contains(&p.y)
            && (min.z..=max.z).contains(&p.z);
        !inside || (p.x == 8 && p.y < 44)
    };
    let cache = world(solid);
    let start = Position::new(2, 34, 8);
    let goal = Position::new(13, 34, 8);

    let path = find_path(start, goal, &cache, ResolutionPolicy::fine(), &never_cancelled())
        .unwrap()
        .unwrap();
    assert!(path.is_finished());

    let truth = bfs_distances(goal, &solid, min, max);
    assert!(!path.nodes.is_empty());
    for node in &path.nodes {
        let real = truth[&node.point] as f64;
        assert!(
            node.heuristic <= real + 1e-9,
            "h={} exceeds true distance {} at {}",
            node.heuristic,
            real,
            node.point
        );
    }
    // The wall forces a climb over y = 44, so the route is much longer than
    // the straight line.
    assert!(path.cost > start.distance_to(&goal) + 10.0);
    assert!(path.waypoints.iter().any(|w| w.y >= 44));
}

#[test]
fn test_pre_cancelled_search_returns_start_segment() {
    let cache = world(|_| false);
    let token = CancellationToken::new();
    token.cancel();
    let start = Position::new(0, 40, 0);
    let path = find_path(start, Position::new(900, 40, 0), &cache, ResolutionPolicy::coarse(), &token)
        .unwrap()
        .unwrap();
    assert_eq!(path.kind, PathKind::Segment);
    assert_eq!(path.stats.stop, StopReason::Cancelled);
    assert_eq!(path.stats.expansions, 0);
    assert_eq!(path.end_pos(), start);
}

#[test]
fn test_cancellation_mid_search_is_prompt() {
    let cache = slow_world(|_| false, Duration::from_millis(5));
    let finder = PathFinder::new(ResolutionPolicy::fine());
    let token = finder.cancellation_token();
    let controller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        token.cancel();
    });

    let start = Position::new(0, 40, 0);
    let goal = Position::new(1_000_000, 40, 0);
    let began = Instant::now();
    let path = finder.find_path(start, goal, &cache).unwrap().unwrap();
    controller.join().unwrap();

    assert_eq!(path.kind, PathKind::Segment);
    assert_eq!(path.stats.stop, StopReason::Cancelled);
    assert!(began.elapsed() < Duration::from_secs(30));
    assert!(path.end_pos().distance_to(&goal) < start.distance_to(&goal));
}

#[test]
fn test_cancellation_stops_within_one_poll_interval() {
    let token = CancellationToken::new();
    let generated = Arc::new(AtomicUsize::new(0));
    let after_cancel = Arc::new(AtomicUsize::new(0));
    let cache = {
        let (token, generated, after_cancel) =
            (token.clone(), Arc::clone(&generated), Arc::clone(&after_cancel));
        ChunkCache::new(
            Arc::new(move |_: ChunkPos, _: u64| -> Result<Chunk, GenerationError> {
                if token.is_cancelled() {
                    after_cancel.fetch_add(1, Ordering::SeqCst);
                } else if generated.fetch_add(1, Ordering::SeqCst) + 1 == 8 {
                    token.cancel();
                }
                Ok(Chunk::empty())
            }),
            7,
        )
    };

    let path = find_path(
        Position::new(0, 40, 0),
        Position::new(1_000_000, 40, 0),
        &cache,
        ResolutionPolicy::fine(),
        &token,
    )
    .unwrap()
    .unwrap();

    assert_eq!(path.kind, PathKind::Segment);
    assert_eq!(path.stats.stop, StopReason::Cancelled);
    assert!(path.stats.expansions > 0);
    assert_eq!(path.stats.expansions % CANCEL_POLL_INTERVAL, 0);
    // Each expansion reaches at most one new chunk per face.
    let late = after_cancel.load(Ordering::SeqCst);
    assert!(
        late <= 6 * CANCEL_POLL_INTERVAL,
        "{late} chunks generated after cancellation"
    );
}

#[test]
fn test_timeout_returns_segment() {
    let cache = slow_world(|_| false, Duration::from_millis(2));
    let policy = ResolutionPolicy::fine().with_limits(SearchLimits {
        timeout: Some(Duration::from_millis(50)),
        ..SearchLimits::default()
    });
    let path = find_path(
        Position::new(0, 40, 0),
        Position::new(1_000_000, 40, 0),
        &cache,
        policy,
        &never_cancelled(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(path.kind, PathKind::Segment);
    assert_eq!(path.stats.stop, StopReason::TimedOut);
}

#[test]
fn test_expansion_budget_returns_segment() {
    let cache = world(|_| false);
    let policy = ResolutionPolicy::coarse().with_limits(SearchLimits {
        max_expansions: 10,
        ..SearchLimits::default()
    });
    let start = Position::new(0, 40, 0);
    let goal = Position::new(5000, 40, 0);
    let path = find_path(start, goal, &cache, policy, &never_cancelled())
        .unwrap()
        .unwrap();
    assert_eq!(path.kind, PathKind::Segment);
    assert_eq!(path.stats.stop, StopReason::BudgetExhausted);
    assert_eq!(path.stats.expansions, 10);
    assert_eq!(path.nodes.len(), 10);
    assert_eq!(path.waypoints[0], start);
    assert!(path.end_pos().x > start.x);
}

#[test]
fn test_open_world_long_route() {
    let executor = Arc::new(ParallelExecutor::new(2).unwrap());
    let cache = ChunkCache::with_executor(Arc::new(generator(|_| false, Duration::ZERO)), 7, executor);
    let start = Position::new(0, 40, 0);
    let goal = Position::new(1000, 64, 0);

    let path = find_path(start, goal, &cache, ResolutionPolicy::fine(), &never_cancelled())
        .unwrap()
        .unwrap();

    assert_eq!(path.kind, PathKind::Finished);
    assert_eq!(path.waypoints[0], start);
    assert!(path.end_pos().distance_to(&goal) <= 1.0);
    let straight = start.distance_to(&goal);
    assert!(
        path.total_length() <= straight * 1.05,
        "length {} vs straight line {}",
        path.total_length(),
        straight
    );
    // Nothing but open terrain, so nothing is ever split.
    assert_eq!(path.size_histogram().keys().copied().collect::<Vec<_>>(), vec![NodeSize::X16]);
}

#[test]
fn test_wall_forces_fine_nodes_and_detour() {
    let wall = |p: Position| p.x == 49 && p.y < 101 && (-41..41).contains(&p.z);
    let cache = world(wall);
    let start = Position::new(20, 40, 0);
    let goal = Position::new(80, 40, 0);

    let path = find_path(start, goal, &cache, ResolutionPolicy::fine(), &never_cancelled())
        .unwrap()
        .unwrap();

    assert_eq!(path.kind, PathKind::Finished);
    assert!(path.end_pos().distance_to(&goal) <= 1.0);
    assert!(
        path.nodes
            .iter()
            .any(|n| n.pos.size == NodeSize::X1 && (n.pos.origin.x == 48 || n.pos.origin.x == 50)),
        "no single-voxel nodes next to the wall"
    );
    assert!(
        path.waypoints.iter().any(|w| w.z.abs() >= 41 || w.y >= 101),
        "route does not go around the wall: {:?}",
        path.waypoints
    );
    for w in &path.waypoints {
        assert!(!path.cache().is_solid(*w).unwrap(), "waypoint {w} is solid");
    }
}

#[test]
fn test_coarse_policy_keeps_small_nodes_near_endpoints() {
    // A one-voxel tunnel is only passable at single-voxel resolution.
    let cache = world(|p| !(p.y == 40 && p.z == 0 && (0..=200).contains(&p.x)));
    let start = Position::new(0, 40, 0);
    let goal = Position::new(200, 40, 0);
    let policy = ResolutionPolicy::coarse();

    let path = find_path(start, goal, &cache, policy, &never_cancelled())
        .unwrap()
        .unwrap();

    assert_eq!(path.kind, PathKind::Segment);
    assert_eq!(path.stats.stop, StopReason::OpenSetExhausted);
    assert_eq!(path.end_pos(), Position::new(16, 40, 0));
    for node in &path.nodes {
        if node.pos.size < NodeSize::X4 {
            let near_end = node.pos.distance_to(start) <= policy.endpoint_radius
                || node.pos.distance_to(goal) <= policy.endpoint_radius;
            assert!(near_end, "{:?} node at {} far from both ends", node.pos.size, node.pos.origin);
        }
    }

    let fine = find_path(start, goal, &cache, ResolutionPolicy::fine(), &never_cancelled())
        .unwrap()
        .unwrap();
    assert!(fine.is_finished());
    assert!(fine.end_pos().distance_to(&goal) <= 1.0);
    assert!(fine.waypoints.iter().all(|w| w.y == 40 && w.z == 0));
}

#[test]
fn test_coarse_policy_avoids_small_nodes_in_open_terrain() {
    let cache = world(|p| p.y < 32 || (p.x == 100 && p.y < 60 && (-20..20).contains(&p.z)));
    let start = Position::new(0, 40, 0);
    let goal = Position::new(200, 40, 0);
    let policy = ResolutionPolicy::coarse();

    let path = find_path(start, goal, &cache, policy, &never_cancelled())
        .unwrap()
        .unwrap();

    assert!(path.is_finished());
    for node in &path.nodes {
        let near_end = node.pos.distance_to(start) <= policy.endpoint_radius
            || node.pos.distance_to(goal) <= policy.endpoint_radius;
        assert!(
            near_end || node.pos.size >= NodeSize::X4,
            "{:?} node at {} far from both ends",
            node.pos.size,
            node.pos.origin
        );
    }
}

#[test]
fn test_search_near_world_edge() {
    let cache = world(|_| false);
    let start = Position::new(COORDINATE_LIMIT - 3, 40, 0);
    let goal = Position::new(COORDINATE_LIMIT - 1, 40, 200);

    let path = find_path(start, goal, &cache, ResolutionPolicy::fine(), &never_cancelled())
        .unwrap()
        .unwrap();
    assert!(path.is_finished());
    assert!(path.nodes.iter().all(|n| n.pos.max_corner().x < COORDINATE_LIMIT));
    assert!(path.waypoints.iter().all(|w| w.x < COORDINATE_LIMIT));
}

#[test]
fn test_out_of_range_inputs_are_rejected() {
    let cache = world(|_| false);
    let inside = Position::new(0, 40, 0);
    for outside in [
        Position::new(i32::MAX, 40, 0),
        Position::new(0, 40, i32::MIN),
        Position::new(0, i32::MAX, 0),
    ] {
        let err = find_path(inside, outside, &cache, ResolutionPolicy::fine(), &never_cancelled())
            .unwrap_err();
        assert!(matches!(err, PathError::OutOfRange { pos } if pos == outside));
        let err = find_path(outside, inside, &cache, ResolutionPolicy::fine(), &never_cancelled())
            .unwrap_err();
        assert!(matches!(err, PathError::OutOfRange { .. }));
    }
    assert!(cache.is_empty());
}

#[test]
fn test_generation_failure_aborts_search() {
    let cache = ChunkCache::new(
        Arc::new(|pos: ChunkPos, _seed: u64| -> Result<Chunk, GenerationError> {
            if pos.x >= 2 {
                Err(GenerationError::Failed {
                    pos,
                    reason: "corrupt region file".into(),
                })
            } else {
                Ok(Chunk::empty())
            }
        }),
        0,
    );
    let err = find_path(
        Position::new(0, 40, 0),
        Position::new(200, 40, 0),
        &cache,
        ResolutionPolicy::fine(),
        &never_cancelled(),
    )
    .unwrap_err();
    assert!(matches!(err, PathError::Generation(GenerationError::Failed { .. })));
}

#[test]
fn test_concurrent_searches_share_one_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let base = generator(|p| p.y < 32, Duration::from_millis(1));
    let cache = ChunkCache::new(
        Arc::new(move |pos: ChunkPos, seed: u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            base(pos, seed)
        }),
        7,
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                find_path(
                    Position::new(0, 40, 0),
                    Position::new(150, 40, 30),
                    &cache,
                    ResolutionPolicy::coarse(),
                    &CancellationToken::new(),
                )
                .unwrap()
                .unwrap()
            })
        })
        .collect();
    let paths: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(paths.iter().all(|p| p.is_finished()));
    assert!(paths.iter().all(|p| p.waypoints == paths[0].waypoints));
    assert_eq!(calls.load(Ordering::SeqCst), cache.generated_count());
    assert_eq!(cache.generated_count(), cache.len());
}
