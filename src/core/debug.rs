//! Navigation statistics

use crate::ai::{PathSearch, SearchOutcome};
use crate::scene::TileCoord;

/// Counters over the lifetime of a navigation world
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavStats {
    /// Path searches run
    pub searches: u64,
    /// Searches that produced no path and needed a fallback
    pub failed_searches: u64,
    /// Blocked goals replaced by a ring tile
    pub goal_substitutions: u64,
    /// Nodes expanded across all searches
    pub nodes_expanded: u64,
    /// Largest single search, in expanded nodes
    pub max_nodes_expanded: u64,
    /// Expansion responses applied
    pub expansions_applied: u64,
    /// Expansion responses that reported failure
    pub expansions_failed: u64,
}

impl NavStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one search
    pub fn record_search(&mut self, requested: TileCoord, search: &PathSearch) {
        self.searches += 1;
        let expanded = search.expanded as u64;
        self.nodes_expanded += expanded;
        self.max_nodes_expanded = self.max_nodes_expanded.max(expanded);
        if search.substituted(requested) {
            self.goal_substitutions += 1;
        }
        if !matches!(search.outcome, SearchOutcome::Found | SearchOutcome::AlreadyThere) {
            self.failed_searches += 1;
        }
    }

    /// Average nodes expanded per search
    pub fn average_nodes_expanded(&self) -> f32 {
        if self.searches == 0 {
            return 0.0;
        }
        self.nodes_expanded as f32 / self.searches as f32
    }
}
