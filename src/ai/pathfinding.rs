//! A* pathfinding on the collision grid
//!
//! 4-directional movement with uniform step cost and a Manhattan heuristic.
//! A blocked goal is swapped for the nearest open tile on a small ring
//! around it before the search runs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::grid::CollisionGrid;
use crate::scene::TileCoord;

/// Default cap on expanded nodes per search
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Default largest ring radius searched around a blocked goal
pub const DEFAULT_GOAL_SEARCH_RADIUS: u32 = 3;

/// Waypoints from (exclusive) the start tile to (inclusive) the goal tile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    waypoints: Vec<TileCoord>,
}

impl Path {
    /// Wrap an explicit waypoint list
    #[must_use]
    pub fn from_waypoints(waypoints: Vec<TileCoord>) -> Self {
        Self { waypoints }
    }

    /// Check if the path has no steps (arrived or unreachable)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<TileCoord> {
        self.waypoints.get(index).copied()
    }

    /// Final waypoint
    #[must_use]
    pub fn destination(&self) -> Option<TileCoord> {
        self.waypoints.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileCoord> {
        self.waypoints.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[TileCoord] {
        &self.waypoints
    }
}

/// Why a search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Reached the (possibly substituted) goal
    Found,
    /// Start already equals the goal
    AlreadyThere,
    /// Goal blocked and no open tile within the ring bound
    NoOpenGoal,
    /// Open set exhausted
    Unreachable,
    /// Iteration cap hit
    IterationLimit,
}

/// Full result of a search, for callers that want more than the path
#[derive(Debug, Clone)]
pub struct PathSearch {
    /// Resulting path, empty unless `outcome` is `Found`
    pub path: Path,
    /// Goal actually searched for
    pub effective_goal: Option<TileCoord>,
    /// Nodes expanded
    pub expanded: usize,
    pub outcome: SearchOutcome,
}

impl PathSearch {
    /// Whether the goal was replaced by a ring tile
    #[must_use]
    pub fn substituted(&self, requested: TileCoord) -> bool {
        self.effective_goal.is_some_and(|goal| goal != requested)
    }
}

/// A* node for priority queue
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    tile: TileCoord,
    f_cost: u32,
    insertion: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.insertion == other.insertion
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap, earlier insertion wins ties
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.insertion.cmp(&self.insertion))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Grid pathfinder with bounded work per request
#[derive(Debug, Clone, Copy)]
pub struct Pathfinder {
    /// Maximum nodes expanded before giving up
    pub max_iterations: usize,
    /// Largest ring radius tried around a blocked goal
    pub goal_search_radius: u32,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            goal_search_radius: DEFAULT_GOAL_SEARCH_RADIUS,
        }
    }
}

impl Pathfinder {
    #[must_use]
    pub fn new(max_iterations: usize, goal_search_radius: u32) -> Self {
        Self {
            max_iterations,
            goal_search_radius,
        }
    }

    /// Find a path from `start` to `goal`; empty when already there or unreachable
    #[must_use]
    pub fn find_path(&self, grid: &CollisionGrid, start: TileCoord, goal: TileCoord) -> Path {
        self.search(grid, start, goal).path
    }

    /// Resolve the goal tile: itself if open, otherwise the nearest open tile
    /// on the smallest ring (radius 1..=bound) that has one.
    ///
    /// Within a ring the lowest Manhattan distance wins, ties by row-major order.
    #[must_use]
    pub fn resolve_goal(&self, grid: &CollisionGrid, goal: TileCoord) -> Option<TileCoord> {
        if !grid.is_blocked_tile(goal) {
            return Some(goal);
        }
        let bound = i32::try_from(self.goal_search_radius).unwrap_or(i32::MAX);
        for radius in 1..=bound {
            let mut best: Option<(u32, TileCoord)> = None;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let tile = goal.offset(dx, dy);
                    if grid.is_blocked_tile(tile) {
                        continue;
                    }
                    let distance = tile.manhattan(goal);
                    if best.is_none_or(|(d, _)| distance < d) {
                        best = Some((distance, tile));
                    }
                }
            }
            if let Some((_, tile)) = best {
                return Some(tile);
            }
        }
        None
    }

    /// Run a full search and report how it went
    #[must_use]
    pub fn search(&self, grid: &CollisionGrid, start: TileCoord, goal: TileCoord) -> PathSearch {
        let Some(effective) = self.resolve_goal(grid, goal) else {
            debug!("No open tile within {} of blocked goal {goal}", self.goal_search_radius);
            return PathSearch {
                path: Path::default(),
                effective_goal: None,
                expanded: 0,
                outcome: SearchOutcome::NoOpenGoal,
            };
        };
        if effective != goal {
            debug!("Goal {goal} is blocked, using {effective}");
        }

        if start == effective {
            return PathSearch {
                path: Path::default(),
                effective_goal: Some(effective),
                expanded: 0,
                outcome: SearchOutcome::AlreadyThere,
            };
        }

        let (path, expanded, outcome) = self.astar(grid, start, effective);
        PathSearch {
            path,
            effective_goal: Some(effective),
            expanded,
            outcome,
        }
    }

    fn astar(
        &self,
        grid: &CollisionGrid,
        start: TileCoord,
        goal: TileCoord,
    ) -> (Path, usize, SearchOutcome) {
        let mut open_set = BinaryHeap::new();
        let mut came_from: FxHashMap<TileCoord, TileCoord> = FxHashMap::default();
        let mut g_score: FxHashMap<TileCoord, u32> = FxHashMap::default();
        let mut closed: FxHashSet<TileCoord> = FxHashSet::default();
        let mut insertion = 0u64;
        let mut expanded = 0usize;

        g_score.insert(start, 0);
        open_set.push(OpenNode {
            tile: start,
            f_cost: start.manhattan(goal),
            insertion,
        });

        while let Some(current) = open_set.pop() {
            if !closed.insert(current.tile) {
                continue;
            }

            if current.tile == goal {
                return (reconstruct(&came_from, start, goal), expanded, SearchOutcome::Found);
            }

            if expanded >= self.max_iterations {
                trace!("Search {start} -> {goal} hit the cap of {} nodes", self.max_iterations);
                return (Path::default(), expanded, SearchOutcome::IterationLimit);
            }
            expanded += 1;

            let current_g = g_score.get(&current.tile).copied().unwrap_or(u32::MAX);
            for neighbor in grid.open_neighbors(current.tile) {
                if closed.contains(&neighbor) {
                    continue;
                }
                let tentative_g = current_g.saturating_add(1);
                if tentative_g >= g_score.get(&neighbor).copied().unwrap_or(u32::MAX) {
                    continue;
                }

                came_from.insert(neighbor, current.tile);
                g_score.insert(neighbor, tentative_g);
                insertion += 1;
                open_set.push(OpenNode {
                    tile: neighbor,
                    f_cost: tentative_g.saturating_add(neighbor.manhattan(goal)),
                    insertion,
                });
            }
        }

        (Path::default(), expanded, SearchOutcome::Unreachable)
    }
}

fn reconstruct(
    came_from: &FxHashMap<TileCoord, TileCoord>,
    start: TileCoord,
    goal: TileCoord,
) -> Path {
    let mut waypoints = vec![goal];
    let mut cursor = goal;
    while let Some(&prev) = came_from.get(&cursor) {
        if prev == start {
            break;
        }
        waypoints.push(prev);
        cursor = prev;
    }
    waypoints.reverse();
    Path { waypoints }
}
