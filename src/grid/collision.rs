//! Dense walkability grid with a tile-space origin offset

use glam::Vec2;

use crate::scene::{TileCoord, TileRect};

/// A 2D collision grid.
///
/// Cells are stored row-major in a flat `Vec<bool>` (true = blocked). The
/// cell for world tile `(tx, ty)` lives at
/// `(ty - offset.y) * width + (tx - offset.x)`; any tile outside the grid is
/// blocked.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionGrid {
    /// World tile of cell (0, 0)
    pub(super) offset: TileCoord,
    /// Width in cells
    pub(super) width: u32,
    /// Height in cells
    pub(super) height: u32,
    /// Pixel size of one tile
    tile_size: f32,
    /// Blocked cells
    pub(super) cells: Vec<bool>,
}

impl CollisionGrid {
    /// Create a grid covering `bounds`, every cell blocked
    #[must_use]
    pub fn new(bounds: TileRect, tile_size: f32) -> Self {
        Self {
            offset: bounds.origin(),
            width: bounds.w,
            height: bounds.h,
            tile_size,
            cells: vec![true; bounds.w as usize * bounds.h as usize],
        }
    }

    /// World tile of the grid's first cell
    #[must_use]
    pub const fn offset(&self) -> TileCoord {
        self.offset
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Tile rectangle the grid covers
    #[must_use]
    pub const fn bounds(&self) -> TileRect {
        TileRect::new(self.offset.x, self.offset.y, self.width, self.height)
    }

    /// Flat index of a world tile, `None` outside the grid
    #[inline]
    pub(super) fn index_of(&self, tile: TileCoord) -> Option<usize> {
        let local_x = i64::from(tile.x) - i64::from(self.offset.x);
        let local_y = i64::from(tile.y) - i64::from(self.offset.y);
        if local_x < 0
            || local_y < 0
            || local_x >= i64::from(self.width)
            || local_y >= i64::from(self.height)
        {
            return None;
        }
        Some(local_y as usize * self.width as usize + local_x as usize)
    }

    /// Check whether a world tile is blocked. Out of bounds is blocked.
    #[must_use]
    #[inline]
    pub fn is_blocked(&self, tile_x: i32, tile_y: i32) -> bool {
        self.is_blocked_tile(TileCoord::new(tile_x, tile_y))
    }

    /// Same as [`is_blocked`](Self::is_blocked) for a `TileCoord`
    #[must_use]
    #[inline]
    pub fn is_blocked_tile(&self, tile: TileCoord) -> bool {
        self.index_of(tile).is_none_or(|index| self.cells[index])
    }

    /// Check a pixel position, flooring to the containing tile
    #[must_use]
    pub fn is_blocked_px(&self, px: f32, py: f32) -> bool {
        self.is_blocked_tile(self.tile_at_px(Vec2::new(px, py)))
    }

    /// Set a single cell; tiles outside the grid are ignored
    pub fn set_blocked(&mut self, tile: TileCoord, blocked: bool) {
        if let Some(index) = self.index_of(tile) {
            self.cells[index] = blocked;
        }
    }

    /// Set every cell in `rect`, clipped to the grid
    pub fn fill_rect(&mut self, rect: TileRect, blocked: bool) {
        let Some(clipped) = rect.intersection(&self.bounds()) else {
            return;
        };
        let width = self.width as usize;
        for y in clipped.y..clipped.bottom() {
            let row = (y - self.offset.y) as usize * width;
            let start = row + (clipped.x - self.offset.x) as usize;
            self.cells[start..start + clipped.w as usize].fill(blocked);
        }
    }

    /// Number of blocked cells inside the grid
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|&&blocked| blocked).count()
    }

    /// Tile containing a pixel position
    #[must_use]
    pub fn tile_at_px(&self, pos: Vec2) -> TileCoord {
        TileCoord::new(
            (pos.x / self.tile_size).floor() as i32,
            (pos.y / self.tile_size).floor() as i32,
        )
    }

    /// Pixel position of a tile's center
    #[must_use]
    pub fn tile_center_px(&self, tile: TileCoord) -> Vec2 {
        Vec2::new(
            (tile.x as f32 + 0.5) * self.tile_size,
            (tile.y as f32 + 0.5) * self.tile_size,
        )
    }

    /// Walkable 4-neighbours of a tile
    pub(crate) fn open_neighbors(&self, tile: TileCoord) -> smallvec::SmallVec<[TileCoord; 4]> {
        [
            tile.offset(0, 1),
            tile.offset(1, 0),
            tile.offset(0, -1),
            tile.offset(-1, 0),
        ]
        .into_iter()
        .filter(|&n| !self.is_blocked_tile(n))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_blocked() {
        let grid = CollisionGrid::new(TileRect::new(-2, -2, 4, 4), 32.0);
        assert_eq!(grid.blocked_count(), 16);
        assert!(grid.is_blocked(-2, -2));
        assert!(grid.is_blocked(1, 1));
    }

    #[test]
    fn test_out_of_bounds_is_blocked() {
        let mut grid = CollisionGrid::new(TileRect::new(0, 0, 3, 3), 32.0);
        grid.fill_rect(TileRect::new(0, 0, 3, 3), false);
        assert!(!grid.is_blocked(2, 2));
        assert!(grid.is_blocked(3, 0));
        assert!(grid.is_blocked(-1, 0));
        assert!(grid.is_blocked(0, i32::MAX));
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut grid = CollisionGrid::new(TileRect::new(0, 0, 4, 4), 16.0);
        grid.fill_rect(TileRect::new(2, 2, 10, 10), false);
        assert_eq!(grid.blocked_count(), 12);
        assert!(!grid.is_blocked(3, 3));
        assert!(grid.is_blocked(1, 3));
    }

    #[test]
    fn test_offset_indexing() {
        let mut grid = CollisionGrid::new(TileRect::new(-6, 0, 8, 2), 32.0);
        grid.set_blocked(TileCoord::new(-6, 1), false);
        assert!(!grid.is_blocked(-6, 1));
        assert_eq!(grid.blocked_count(), 15);
    }

    #[test]
    fn test_pixel_query_floors() {
        let mut grid = CollisionGrid::new(TileRect::new(-1, 0, 2, 1), 32.0);
        grid.set_blocked(TileCoord::new(-1, 0), false);
        assert!(!grid.is_blocked_px(-0.5, 10.0));
        assert!(grid.is_blocked_px(0.5, 10.0));
        assert_eq!(grid.tile_at_px(Vec2::new(63.9, 32.0)), TileCoord::new(1, 1));
        assert_eq!(grid.tile_center_px(TileCoord::new(1, 1)), Vec2::new(48.0, 48.0));
    }
}
