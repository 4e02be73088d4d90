//! AI and navigation module
//!
//! Grid pathfinding and the per-actor path walker.

mod pathfinding;
mod walker;

pub use pathfinding::{
    DEFAULT_GOAL_SEARCH_RADIUS, DEFAULT_MAX_ITERATIONS, Path, PathSearch, Pathfinder,
    SearchOutcome,
};
pub use walker::{ActorMovementState, ActorSnapshot, NavError, PathWalker, WalkerState};
