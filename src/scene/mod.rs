//! Scene tree module
//!
//! The nested area/object description every other module consumes.

mod loader;
mod node;
mod traverse;

pub use loader::SceneError;
pub use node::{NodeKind, SceneNode, TileCoord, TileRect};
pub use traverse::PreOrder;
