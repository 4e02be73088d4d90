//! Tile navigation for a growing 2D world
//!
//! This crate provides:
//! - Collision grids derived from a nested scene tree
//! - Grid resizing that preserves collision through world expansion
//! - A* pathfinding with blocked-goal substitution and a work cap
//! - A per-actor path walker driven by authoritative destinations

pub mod ai;
pub mod core;
pub mod grid;
pub mod scene;
pub mod world;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{ActorSnapshot, NavError, Path, PathSearch, Pathfinder, SearchOutcome, WalkerState};
    pub use crate::core::{EventQueue, NavConfig, NavEvent, NavStats, UnreachablePolicy};
    pub use crate::grid::CollisionGrid;
    pub use crate::scene::{NodeKind, SceneError, SceneNode, TileCoord, TileRect};
    pub use crate::world::{Direction, ExpansionRequest, ExpansionResponse, NavWorld, plan_expansion};
    pub use glam::Vec2;
}
