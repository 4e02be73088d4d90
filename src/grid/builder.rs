//! Collision derivation from the scene tree
//!
//! Each node applies at most one mark to its own footprint. Nodes are
//! processed parent-first, so a child's mark always overwrites its parent's
//! on the cells they share.

use log::debug;

use super::CollisionGrid;
use crate::scene::{NodeKind, SceneNode, TileRect};

/// Mark a node applies to its footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMark {
    Open,
    Blocked,
}

impl CellMark {
    /// Mark for a node, `None` for a non-walkable area (its children still apply theirs)
    #[must_use]
    pub const fn for_node(kind: NodeKind, walkable: bool) -> Option<Self> {
        match (kind.is_area(), walkable) {
            (_, true) => Some(Self::Open),
            (true, false) => None,
            (false, false) => Some(Self::Blocked),
        }
    }

    const fn is_blocked(self) -> bool {
        matches!(self, Self::Blocked)
    }
}

impl CollisionGrid {
    /// Create a grid from a root node's footprint and derive collision for the whole tree
    #[must_use]
    pub fn from_scene(root: &SceneNode, tile_size: f32) -> Self {
        let mut grid = Self::new(root.footprint(), tile_size);
        grid.build_collision(root);
        grid
    }

    /// Apply the collision rules to `node` and every descendant, pre-order.
    ///
    /// Footprints reaching past the grid are clipped.
    pub fn build_collision(&mut self, node: &SceneNode) {
        let mut marked = 0usize;
        for current in node.iter() {
            if let Some(mark) = CellMark::for_node(current.kind, current.walkable) {
                self.fill_rect(current.footprint(), mark.is_blocked());
                marked += 1;
            }
        }
        debug!(
            "Built collision for '{}': {} of {} nodes applied a mark",
            node.id,
            marked,
            node.node_count()
        );
    }

    /// Apply the collision rules to `node` and every descendant, pre-order,
    /// but only on cells outside `keep`.
    ///
    /// Used after a resize so existing nodes reach the newly exposed region
    /// without touching cells derived earlier.
    pub fn mark_outside(&mut self, node: &SceneNode, keep: TileRect) {
        let bounds = self.bounds();
        for current in node.iter() {
            let Some(mark) = CellMark::for_node(current.kind, current.walkable) else {
                continue;
            };
            let Some(area) = current.footprint().intersection(&bounds) else {
                continue;
            };
            for tile in area.tiles().filter(|tile| !keep.contains(*tile)) {
                self.set_blocked(tile, mark.is_blocked());
            }
        }
    }
}
