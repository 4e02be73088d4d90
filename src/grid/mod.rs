//! Collision grid module
//!
//! Derives a boolean walkability grid from the scene tree and keeps it in
//! step with world expansion.

mod builder;
mod collision;
mod resize;

pub use builder::CellMark;
pub use collision::CollisionGrid;
