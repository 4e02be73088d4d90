//! Scene tree data types
//!
//! The world is described as a tree of nested areas and objects, each with a
//! tile-space footprint and a walkability flag.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tile coordinate in world space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another tile
    #[must_use]
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Tile offset by `(dx, dy)`
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(i32, i32)> for TileCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned tile rectangle: origin plus size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl TileRect {
    #[must_use]
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Top-left tile
    #[must_use]
    pub const fn origin(&self) -> TileCoord {
        TileCoord::new(self.x, self.y)
    }

    /// Exclusive right edge
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.w as i32
    }

    /// Exclusive bottom edge
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.h as i32
    }

    #[must_use]
    pub const fn contains(&self, tile: TileCoord) -> bool {
        tile.x >= self.x && tile.x < self.right() && tile.y >= self.y && tile.y < self.bottom()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Overlap of two rectangles, `None` when they do not touch
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32))
    }

    /// Smallest rectangle covering both
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Self::new(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32)
    }

    /// Every tile in row-major order
    pub fn tiles(self) -> impl Iterator<Item = TileCoord> {
        let (x0, x1) = (self.x, self.right());
        (self.y..self.bottom()).flat_map(move |y| (x0..x1).map(move |x| TileCoord::new(x, y)))
    }
}

impl fmt::Display for TileRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {}x{}", self.x, self.y, self.w, self.h)
    }
}

/// Kind of scene node.
///
/// The four area kinds behave identically for collision; only objects differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The world root
    #[serde(alias = "root")]
    World,
    /// Outdoor area (town square, park)
    Zone,
    /// Interior space (kitchen, bedroom)
    Room,
    /// Structure with interior rooms
    Building,
    /// Interactable thing (stove, bench)
    #[default]
    Object,
}

impl NodeKind {
    /// Whether this kind is an area (anything but a leaf object)
    #[must_use]
    pub const fn is_area(self) -> bool {
        !matches!(self, Self::Object)
    }
}

const fn default_extent() -> u32 {
    1
}

const fn default_walkable() -> bool {
    true
}

/// A node in the world tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    /// Unique identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Area or object kind
    #[serde(rename = "node_type", default)]
    pub kind: NodeKind,
    /// Asset key used by the presentation layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_key: Option<String>,
    /// Position in tile units
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    /// Footprint in tile units
    #[serde(default = "default_extent")]
    pub w: u32,
    #[serde(default = "default_extent")]
    pub h: u32,
    /// Whether the occupied tiles are passable
    #[serde(default = "default_walkable")]
    pub walkable: bool,
    /// Children in insertion order
    #[serde(default)]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create a walkable 1x1 node at the origin
    #[must_use]
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            kind,
            tile_key: None,
            x: 0,
            y: 0,
            w: 1,
            h: 1,
            walkable: true,
            children: Vec::new(),
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set position and footprint
    #[must_use]
    pub fn with_rect(mut self, x: i32, y: i32, w: u32, h: u32) -> Self {
        self.x = x;
        self.y = y;
        self.w = w;
        self.h = h;
        self
    }

    /// Set the walkability flag
    #[must_use]
    pub fn with_walkable(mut self, walkable: bool) -> Self {
        self.walkable = walkable;
        self
    }

    /// Append a child
    #[must_use]
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Footprint rectangle; a zero extent counts as 1
    #[must_use]
    pub fn footprint(&self) -> TileRect {
        TileRect::new(self.x, self.y, self.w.max(1), self.h.max(1))
    }

    /// Overwrite position and size from a rectangle
    pub fn set_footprint(&mut self, rect: TileRect) {
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.w;
        self.h = rect.h;
    }
}
