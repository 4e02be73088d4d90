//! Navigation configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{DEFAULT_GOAL_SEARCH_RADIUS, DEFAULT_MAX_ITERATIONS};

/// What to do with an actor whose destination cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachablePolicy {
    /// Snap the actor straight onto the requested tile
    #[default]
    Teleport,
    /// Leave the actor where it is
    Hold,
}

/// World expansion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Distance in tiles from a root edge that triggers a request
    pub edge_margin_tiles: u32,
    /// Seconds after a successful expansion before the next request
    pub cooldown_secs: f32,
    /// Depth in tiles of each new region
    pub region_size: u32,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            edge_margin_tiles: 2,
            cooldown_secs: 5.0,
            region_size: 12,
        }
    }
}

/// Navigation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Pixel size of one tile
    pub tile_size_px: f32,
    /// Walking speed in pixels per second
    pub walk_speed_px: f32,
    /// Distance at which an actor snaps onto its waypoint
    pub arrival_threshold_px: f32,
    /// Nodes a single path search may expand
    pub max_search_iterations: usize,
    /// Largest ring radius tried around a blocked goal
    pub goal_search_radius: u32,
    /// Fallback for unreachable destinations
    pub unreachable_policy: UnreachablePolicy,
    /// World expansion settings
    pub expansion: ExpansionConfig,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            tile_size_px: 32.0,
            walk_speed_px: 96.0,
            arrival_threshold_px: 1.0,
            max_search_iterations: DEFAULT_MAX_ITERATIONS,
            goal_search_radius: DEFAULT_GOAL_SEARCH_RADIUS,
            unreachable_policy: UnreachablePolicy::Teleport,
            expansion: ExpansionConfig::default(),
        }
    }
}

impl NavConfig {
    /// Set the tile size in pixels
    pub fn with_tile_size(mut self, tile_size_px: f32) -> Self {
        self.tile_size_px = tile_size_px;
        self
    }

    /// Set walking speed in pixels per second
    pub fn with_walk_speed(mut self, walk_speed_px: f32) -> Self {
        self.walk_speed_px = walk_speed_px;
        self
    }

    /// Set the path search bounds
    pub fn with_search_limits(mut self, max_iterations: usize, goal_search_radius: u32) -> Self {
        self.max_search_iterations = max_iterations;
        self.goal_search_radius = goal_search_radius;
        self
    }

    /// Set the unreachable-destination fallback
    pub fn with_unreachable_policy(mut self, policy: UnreachablePolicy) -> Self {
        self.unreachable_policy = policy;
        self
    }

    /// Set expansion cooldown in seconds
    pub fn with_expansion_cooldown(mut self, cooldown_secs: f32) -> Self {
        self.expansion.cooldown_secs = cooldown_secs;
        self
    }

    /// Set the edge margin that triggers expansion
    pub fn with_edge_margin(mut self, edge_margin_tiles: u32) -> Self {
        self.expansion.edge_margin_tiles = edge_margin_tiles;
        self
    }

    /// Parse a configuration from RON text; missing fields keep their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid RON for this struct
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load a configuration from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}
