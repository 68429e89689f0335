//! Hierarchical best-first path search through a lazily generated voxel world.
//!
//! Nodes are axis-aligned cubes of edge 1, 2, 4, 8 or 16. Open terrain is
//! crossed with large cubes; cubes that straddle solid and air are split
//! near obstacles and near the goal, down to the floor allowed by the
//! [`ResolutionPolicy`].

mod cancel;
mod error;
mod finder;
mod nearest;
mod node;
mod path;
mod policy;
mod view;

pub use cancel::CancellationToken;
pub use error::PathError;
pub use finder::{CANCEL_POLL_INTERVAL, PathFinder, find_path};
pub use nearest::{MAX_NEAREST_PASSABLE_RADIUS, find_nearest_passable};
pub use node::{Node, NodeId, NodePos, NodeSize};
pub use path::{Path, PathKind, SearchStats, StopReason};
pub use policy::{ResolutionPolicy, SearchLimits};
