//! Re-basing the grid when the world boundary moves

use log::debug;

use super::CollisionGrid;
use crate::scene::TileRect;

impl CollisionGrid {
    /// Re-base the grid onto `new_bounds`, keeping every previously derived
    /// cell that still falls inside.
    ///
    /// Cells with no old counterpart start blocked.
    pub fn resize(&mut self, new_bounds: TileRect) {
        let old_bounds = self.bounds();
        if old_bounds == new_bounds {
            return;
        }

        let new_width = new_bounds.w as usize;
        let mut cells = vec![true; new_width * new_bounds.h as usize];

        // Copy the overlapping rows in one slice per row
        if let Some(overlap) = old_bounds.intersection(&new_bounds) {
            let old_width = old_bounds.w as usize;
            let run = overlap.w as usize;
            for y in overlap.y..overlap.bottom() {
                let old_start = (y - old_bounds.y) as usize * old_width
                    + (overlap.x - old_bounds.x) as usize;
                let new_start = (y - new_bounds.y) as usize * new_width
                    + (overlap.x - new_bounds.x) as usize;
                cells[new_start..new_start + run]
                    .copy_from_slice(&self.cells[old_start..old_start + run]);
            }
        }

        self.offset = new_bounds.origin();
        self.width = new_bounds.w;
        self.height = new_bounds.h;
        self.cells = cells;
        debug!("Resized collision grid {old_bounds} -> {new_bounds}");
    }
}
