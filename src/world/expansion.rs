//! World expansion bookkeeping
//!
//! Requests go out through an external transport and come back as
//! responses some ticks later. This module owns the geometry of a new
//! region and the gate that keeps requests from piling up: one request per
//! direction in flight, and a cooldown after every successful expansion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::scene::{SceneNode, TileCoord, TileRect};

/// Cardinal direction of an expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::North, Self::South, Self::East, Self::West];

    /// Unit step in tile space (y grows southward)
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised direction token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid direction '{0}'")]
pub struct ParseDirectionError(String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|direction| direction.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseDirectionError(s.to_string()))
    }
}

/// Outgoing request for a new region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionRequest {
    pub direction: Direction,
    /// Tile that triggered the request
    pub trigger: TileCoord,
}

/// Transport's answer to an [`ExpansionRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionResponse {
    pub direction: Direction,
    pub success: bool,
    /// New subtree, present on success
    #[serde(default)]
    pub subtree: Option<SceneNode>,
    /// Root bounds after the expansion, present on success
    #[serde(default)]
    pub root_bounds: Option<TileRect>,
    /// Node the subtree hangs under; the root when absent
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl ExpansionResponse {
    /// A successful response appending `subtree` under the root
    #[must_use]
    pub fn success(direction: Direction, subtree: SceneNode, root_bounds: TileRect) -> Self {
        Self {
            direction,
            success: true,
            subtree: Some(subtree),
            root_bounds: Some(root_bounds),
            parent_id: None,
        }
    }

    /// A failed or timed-out request
    #[must_use]
    pub fn failure(direction: Direction) -> Self {
        Self {
            direction,
            success: false,
            subtree: None,
            root_bounds: None,
            parent_id: None,
        }
    }
}

/// Region and grown root bounds for one expansion step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionPlan {
    /// Footprint of the new region
    pub region: TileRect,
    /// Root bounds once the region is attached
    pub root_bounds: TileRect,
}

/// Where a `size`-deep region goes when the world grows toward `direction`
#[must_use]
pub fn plan_expansion(root: TileRect, direction: Direction, size: u32) -> ExpansionPlan {
    let depth = size as i32;
    match direction {
        Direction::North => ExpansionPlan {
            region: TileRect::new(root.x, root.y - depth, root.w, size),
            root_bounds: TileRect::new(root.x, root.y - depth, root.w, root.h + size),
        },
        Direction::South => ExpansionPlan {
            region: TileRect::new(root.x, root.bottom(), root.w, size),
            root_bounds: TileRect::new(root.x, root.y, root.w, root.h + size),
        },
        Direction::East => ExpansionPlan {
            region: TileRect::new(root.right(), root.y, size, root.h),
            root_bounds: TileRect::new(root.x, root.y, root.w + size, root.h),
        },
        Direction::West => ExpansionPlan {
            region: TileRect::new(root.x - depth, root.y, size, root.h),
            root_bounds: TileRect::new(root.x - depth, root.y, root.w + size, root.h),
        },
    }
}

/// Edges of `bounds` that `tile` is within `margin` tiles of
#[must_use]
pub fn edge_directions(bounds: TileRect, tile: TileCoord, margin: u32) -> SmallVec<[Direction; 2]> {
    let margin = margin as i32;
    let mut directions = SmallVec::new();
    if !bounds.contains(tile) {
        return directions;
    }
    if tile.y < bounds.y + margin {
        directions.push(Direction::North);
    } else if tile.y >= bounds.bottom() - margin {
        directions.push(Direction::South);
    }
    if tile.x >= bounds.right() - margin {
        directions.push(Direction::East);
    } else if tile.x < bounds.x + margin {
        directions.push(Direction::West);
    }
    directions
}

/// In-flight set and cooldown gate for expansion requests
#[derive(Debug, Clone)]
pub struct ExpansionTracker {
    in_flight: SmallVec<[Direction; 4]>,
    /// Clock time of the last successful expansion
    last_success: Option<f64>,
    cooldown: f64,
}

impl ExpansionTracker {
    #[must_use]
    pub fn new(cooldown_secs: f32) -> Self {
        Self {
            in_flight: SmallVec::new(),
            last_success: None,
            cooldown: f64::from(cooldown_secs),
        }
    }

    #[must_use]
    pub fn is_in_flight(&self, direction: Direction) -> bool {
        self.in_flight.contains(&direction)
    }

    /// Directions waiting on a response
    #[must_use]
    pub fn in_flight(&self) -> &[Direction] {
        &self.in_flight
    }

    /// Seconds until requests are allowed again
    #[must_use]
    pub fn cooldown_remaining(&self, now: f64) -> f64 {
        self.last_success
            .map_or(0.0, |last| (last + self.cooldown - now).max(0.0))
    }

    /// Mark `direction` as requested if it is not in flight and the cooldown has passed
    pub fn try_request(&mut self, direction: Direction, now: f64) -> bool {
        if self.is_in_flight(direction) || self.cooldown_remaining(now) > 0.0 {
            return false;
        }
        self.in_flight.push(direction);
        true
    }

    /// Release `direction`; a success starts the cooldown.
    ///
    /// Returns whether the direction was in flight.
    pub fn complete(&mut self, direction: Direction, success: bool, now: f64) -> bool {
        let Some(pos) = self.in_flight.iter().position(|&d| d == direction) else {
            return false;
        };
        self.in_flight.remove(pos);
        if success {
            self.last_success = Some(now);
        }
        true
    }
}
