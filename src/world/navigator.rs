//! Navigation world
//!
//! Single owner of the scene tree, the collision grid and every actor's
//! movement. All mutation happens inside [`NavWorld::tick`], in a fixed
//! order: pending expansion responses, then path planning and walking, then
//! boundary checks that may queue new expansion requests.

use std::collections::VecDeque;

use log::{debug, info, warn};

use super::expansion::{ExpansionRequest, ExpansionResponse, ExpansionTracker, edge_directions};
use super::Direction;
use crate::ai::{ActorMovementState, ActorSnapshot, NavError, PathWalker, Pathfinder};
use crate::core::{EventQueue, NavConfig, NavEvent, NavStats};
use crate::grid::CollisionGrid;
use crate::scene::{SceneNode, TileCoord, TileRect};

/// The collision grid, actors and expansion state of one world
#[derive(Debug)]
pub struct NavWorld {
    config: NavConfig,
    root: SceneNode,
    grid: CollisionGrid,
    pathfinder: Pathfinder,
    walker: PathWalker,
    tracker: ExpansionTracker,
    /// Requests waiting for the transport
    outbox: Vec<ExpansionRequest>,
    /// Responses waiting for the next tick
    inbox: VecDeque<ExpansionResponse>,
    events: EventQueue,
    stats: NavStats,
    /// Seconds of simulated time
    clock: f64,
}

impl NavWorld {
    /// Build the collision grid for `root` and start with no actors
    #[must_use]
    pub fn new(root: SceneNode, config: NavConfig) -> Self {
        let grid = CollisionGrid::from_scene(&root, config.tile_size_px);
        info!(
            "World '{}' ready: {} nodes, bounds {}, {} blocked tiles",
            root.id,
            root.node_count(),
            grid.bounds(),
            grid.blocked_count()
        );
        Self {
            pathfinder: Pathfinder::new(config.max_search_iterations, config.goal_search_radius),
            walker: PathWalker::new(&config),
            tracker: ExpansionTracker::new(config.expansion.cooldown_secs),
            outbox: Vec::new(),
            inbox: VecDeque::new(),
            events: EventQueue::new(),
            stats: NavStats::new(),
            clock: 0.0,
            config,
            root,
            grid,
        }
    }

    #[must_use]
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    #[must_use]
    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    #[must_use]
    pub fn grid(&self) -> &CollisionGrid {
        &self.grid
    }

    #[must_use]
    pub fn stats(&self) -> &NavStats {
        &self.stats
    }

    /// Events from the previous tick
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Take the previous tick's events
    pub fn drain_events(&mut self) -> Vec<NavEvent> {
        self.events.drain().collect()
    }

    /// Seconds of simulated time so far
    #[must_use]
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Whether a world tile is blocked. Out of bounds is blocked.
    #[must_use]
    pub fn is_blocked(&self, tile_x: i32, tile_y: i32) -> bool {
        self.grid.is_blocked(tile_x, tile_y)
    }

    /// Whether the tile under a pixel position is blocked
    #[must_use]
    pub fn is_blocked_px(&self, px: f32, py: f32) -> bool {
        self.grid.is_blocked_px(px, py)
    }

    /// Spawn an autonomous actor
    ///
    /// # Errors
    ///
    /// Returns `NavError::DuplicateActor` if the id is taken
    pub fn spawn_actor(&mut self, id: impl Into<String>, tile: TileCoord) -> Result<(), NavError> {
        self.walker.spawn(&self.grid, id, tile, false)
    }

    /// Spawn the user-controlled actor; lingering near an edge requests expansion
    ///
    /// # Errors
    ///
    /// Returns `NavError::DuplicateActor` if the id is taken
    pub fn spawn_player(&mut self, id: impl Into<String>, tile: TileCoord) -> Result<(), NavError> {
        self.walker.spawn(&self.grid, id, tile, true)
    }

    #[must_use]
    pub fn actor(&self, id: &str) -> Option<&ActorMovementState> {
        self.walker.get(id)
    }

    #[must_use]
    pub fn actor_tile(&self, id: &str) -> Option<TileCoord> {
        self.walker.current_tile(id)
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<ActorSnapshot> {
        self.walker.snapshot()
    }

    /// Feed an actor's authoritative destination; unchanged values are ignored
    ///
    /// # Errors
    ///
    /// Returns `NavError::UnknownActor` if no actor has that id
    pub fn set_destination(&mut self, id: &str, tile: TileCoord) -> Result<bool, NavError> {
        self.walker.set_destination(id, tile)
    }

    /// Open tile inside a walkable area, for feeds that speak location ids
    #[must_use]
    pub fn destination_for_location(&self, location_id: &str) -> Option<TileCoord> {
        let node = self.root.find(location_id)?;
        if !node.kind.is_area() || !node.walkable {
            return None;
        }
        Some(node.open_tile())
    }

    /// Send an actor to a named location.
    ///
    /// Returns the chosen tile, or `None` if the location is not a walkable area.
    ///
    /// # Errors
    ///
    /// Returns `NavError::UnknownActor` if no actor has that id
    pub fn move_to_location(
        &mut self,
        id: &str,
        location_id: &str,
    ) -> Result<Option<TileCoord>, NavError> {
        let Some(tile) = self.destination_for_location(location_id) else {
            if self.walker.get(id).is_none() {
                return Err(NavError::UnknownActor(id.to_string()));
            }
            warn!("'{id}' asked for '{location_id}', which is not a walkable area");
            return Ok(None);
        };
        self.walker.set_destination(id, tile)?;
        Ok(Some(tile))
    }

    /// Queue an expansion request unless that direction is in flight or
    /// the post-expansion cooldown is running
    pub fn request_expansion(&mut self, direction: Direction, trigger: TileCoord) -> bool {
        if !self.tracker.try_request(direction, self.clock) {
            return false;
        }
        debug!("Requesting expansion {direction} (trigger {trigger})");
        self.outbox.push(ExpansionRequest { direction, trigger });
        self.events
            .push(NavEvent::ExpansionRequested { direction, trigger });
        true
    }

    /// Requests for the transport to send
    pub fn drain_expansion_requests(&mut self) -> Vec<ExpansionRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Directions waiting on a response
    #[must_use]
    pub fn expansions_in_flight(&self) -> &[Direction] {
        self.tracker.in_flight()
    }

    /// Hand over a transport response; it is applied at the start of the next tick
    pub fn receive_expansion(&mut self, response: ExpansionResponse) {
        self.inbox.push_back(response);
    }

    /// Advance the world by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        self.events.swap();
        self.clock += f64::from(dt.max(0.0));

        while let Some(response) = self.inbox.pop_front() {
            self.apply_expansion(response);
        }

        self.walker.update(
            dt,
            &self.grid,
            &self.pathfinder,
            &mut self.events,
            &mut self.stats,
        );

        self.check_boundaries();
    }

    fn check_boundaries(&mut self) {
        let bounds = self.grid.bounds();
        let margin = self.config.expansion.edge_margin_tiles;
        let triggers: Vec<(Direction, TileCoord)> = self
            .walker
            .tiles()
            .filter(|(_, _, movement)| movement.triggers_expansion())
            .flat_map(|(_, tile, _)| {
                edge_directions(bounds, tile, margin)
                    .into_iter()
                    .map(move |direction| (direction, tile))
            })
            .collect();
        for (direction, tile) in triggers {
            self.request_expansion(direction, tile);
        }
    }

    fn apply_expansion(&mut self, response: ExpansionResponse) {
        let direction = response.direction;
        let applied = match (response.success, response.subtree, response.root_bounds) {
            (true, Some(subtree), Some(bounds)) => Some((subtree, bounds)),
            (true, _, _) => {
                warn!("Expansion {direction} reported success without a subtree and bounds");
                None
            }
            _ => None,
        };
        if !self.tracker.complete(direction, applied.is_some(), self.clock) {
            warn!("Expansion response for {direction}, which was not in flight");
        }

        let Some((subtree, bounds)) = applied else {
            info!("Expansion {direction} failed, keeping bounds {}", self.grid.bounds());
            self.stats.expansions_failed += 1;
            self.events.push(NavEvent::ExpansionFailed { direction });
            return;
        };

        let parent_id = match response.parent_id {
            Some(id) if self.root.find(&id).is_some() => id,
            Some(id) => {
                warn!("Expansion parent '{id}' not found, attaching '{}' to the root", subtree.id);
                self.root.id.clone()
            }
            None => self.root.id.clone(),
        };

        let bounds = self.expand(bounds, &parent_id, subtree);
        self.stats.expansions_applied += 1;
        self.events.push(NavEvent::ExpansionApplied { direction, bounds });
    }

    /// Grow the root to cover `bounds`, attach `subtree` under `parent_id`
    /// and derive its collision. Returns the new root bounds.
    ///
    /// The root never shrinks: bounds planned from an older root are merged
    /// with the current ones. When the subtree lands last in pre-order only
    /// the newly exposed cells and the subtree are derived; otherwise later
    /// siblings may overwrite it and the whole tree is rebuilt.
    fn expand(&mut self, bounds: TileRect, parent_id: &str, subtree: SceneNode) -> TileRect {
        let old_bounds = self.grid.bounds();
        let new_bounds = old_bounds.union(&bounds);
        if new_bounds != bounds {
            debug!("Expansion bounds {bounds} do not cover {old_bounds}, growing to {new_bounds}");
        }
        self.grid.resize(new_bounds);
        self.root.set_footprint(new_bounds);

        let subtree_id = subtree.id.clone();
        let subtree_nodes = subtree.node_count();
        let delta = self.root.on_last_branch(parent_id);
        if delta {
            self.grid.mark_outside(&self.root, old_bounds);
            self.grid.build_collision(&subtree);
        }
        if let Err(err) = self.root.append_subtree(parent_id, subtree) {
            warn!("Could not attach expansion subtree: {err}");
        }
        if !delta {
            self.grid.fill_rect(new_bounds, true);
            self.grid.build_collision(&self.root);
        }

        info!(
            "Expanded world with '{subtree_id}' ({subtree_nodes} nodes): {old_bounds} -> {new_bounds}"
        );
        new_bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::WalkerState;
    use crate::core::UnreachablePolicy;
    use crate::scene::NodeKind;
    use crate::world::plan_expansion;

    const DT: f32 = 1.0 / 60.0;

    fn town() -> SceneNode {
        SceneNode::new("town", NodeKind::World)
            .with_rect(0, 0, 10, 10)
            .with_child(
                SceneNode::new("well", NodeKind::Object)
                    .with_rect(2, 2, 1, 1)
                    .with_walkable(false),
            )
            .with_child(
                SceneNode::new("cafe", NodeKind::Building)
                    .with_name("Cafe")
                    .with_rect(6, 6, 4, 4)
                    .with_walkable(false)
                    .with_child(
                        SceneNode::new("cafe_floor", NodeKind::Room)
                            .with_name("Cafe Floor")
                            .with_rect(7, 7, 2, 2)
                            .with_child(
                                SceneNode::new("counter", NodeKind::Object)
                                    .with_rect(7, 7, 1, 1)
                                    .with_walkable(false),
                            ),
                    ),
            )
    }

    fn west_field() -> SceneNode {
        SceneNode::new("field", NodeKind::Zone)
            .with_rect(-6, 0, 6, 6)
            .with_child(
                SceneNode::new("haystack", NodeKind::Object)
                    .with_rect(-4, 1, 1, 1)
                    .with_walkable(false),
            )
    }

    fn run(world: &mut NavWorld, frames: usize) {
        for _ in 0..frames {
            world.tick(DT);
        }
    }

    #[test]
    fn test_query_surface() {
        let world = NavWorld::new(town(), NavConfig::default());
        assert!(world.is_blocked(2, 2));
        assert!(!world.is_blocked(0, 0));
        assert!(world.is_blocked(-1, 0));
        assert!(world.is_blocked_px(2.0 * 32.0 + 5.0, 2.0 * 32.0 + 31.0));
        assert!(!world.is_blocked_px(5.0, 5.0));
    }

    #[test]
    fn test_actor_walks_around_obstacle() {
        let mut world = NavWorld::new(town(), NavConfig::default());
        world.spawn_actor("maya", TileCoord::new(2, 0)).unwrap();
        world.set_destination("maya", TileCoord::new(2, 4)).unwrap();

        run(&mut world, 600);
        assert_eq!(world.actor_tile("maya"), Some(TileCoord::new(2, 4)));
        assert_eq!(*world.actor("maya").unwrap().state(), WalkerState::Idle);
        assert_eq!(world.stats().searches, 1);
    }

    #[test]
    fn test_move_to_location_uses_open_tile() {
        let mut world = NavWorld::new(town(), NavConfig::default());
        world.spawn_actor("maya", TileCoord::new(0, 0)).unwrap();

        assert_eq!(world.destination_for_location("cafe"), None);
        assert_eq!(world.destination_for_location("counter"), None);
        assert_eq!(
            world.move_to_location("maya", "cafe_floor").unwrap(),
            Some(TileCoord::new(8, 7))
        );
        assert_eq!(world.move_to_location("maya", "nowhere").unwrap(), None);
        assert!(world.move_to_location("ghost", "cafe_floor").is_err());
    }

    #[test]
    fn test_west_expansion_keeps_old_cells() {
        let mut world = NavWorld::new(town(), NavConfig::default());
        assert!(world.request_expansion(Direction::West, TileCoord::new(0, 3)));
        assert_eq!(world.drain_expansion_requests().len(), 1);

        let plan = plan_expansion(world.grid().bounds(), Direction::West, 6);
        assert_eq!(plan.region, TileRect::new(-6, 0, 6, 10));
        world.receive_expansion(ExpansionResponse::success(
            Direction::West,
            west_field(),
            plan.root_bounds,
        ));
        // Not applied until the next tick
        assert_eq!(world.grid().offset(), TileCoord::new(0, 0));
        world.tick(DT);

        assert_eq!(world.grid().offset(), TileCoord::new(-6, 0));
        assert_eq!(world.root().footprint(), TileRect::new(-6, 0, 16, 10));
        assert!(world.is_blocked(2, 2), "pre-expansion blocked tile survives");
        assert!(world.is_blocked(-4, 1));
        assert!(!world.is_blocked(-6, 0));
        assert!(world.root().find("field").is_some());
        assert!(world.expansions_in_flight().is_empty());
        assert_eq!(world.stats().expansions_applied, 1);

        let rebuilt = CollisionGrid::from_scene(world.root(), 32.0);
        assert_eq!(*world.grid(), rebuilt);

        world.tick(DT);
        assert!(world.events().iter().any(|e| matches!(
            e,
            NavEvent::ExpansionApplied { direction: Direction::West, .. }
        )));
    }

    #[test]
    fn test_path_into_expanded_area() {
        let mut world = NavWorld::new(town(), NavConfig::default());
        world.spawn_actor("maya", TileCoord::new(0, 3)).unwrap();
        world.request_expansion(Direction::West, TileCoord::new(0, 3));
        let plan = plan_expansion(world.grid().bounds(), Direction::West, 6);
        world.receive_expansion(ExpansionResponse::success(
            Direction::West,
            west_field(),
            plan.root_bounds,
        ));
        world.tick(DT);

        world.set_destination("maya", TileCoord::new(-5, 1)).unwrap();
        run(&mut world, 1200);
        assert_eq!(world.actor_tile("maya"), Some(TileCoord::new(-5, 1)));
    }

    #[test]
    fn test_failed_expansion_releases_direction() {
        let mut world = NavWorld::new(town(), NavConfig::default());
        let before = world.grid().clone();
        assert!(world.request_expansion(Direction::North, TileCoord::new(4, 0)));
        assert!(!world.request_expansion(Direction::North, TileCoord::new(5, 0)));

        world.receive_expansion(ExpansionResponse::failure(Direction::North));
        world.tick(DT);

        assert_eq!(*world.grid(), before);
        assert_eq!(world.stats().expansions_failed, 1);
        assert!(world.request_expansion(Direction::North, TileCoord::new(4, 0)));
    }

    #[test]
    fn test_success_without_subtree_counts_as_failure() {
        let mut world = NavWorld::new(town(), NavConfig::default());
        world.request_expansion(Direction::East, TileCoord::new(9, 4));
        world.receive_expansion(ExpansionResponse {
            direction: Direction::East,
            success: true,
            subtree: None,
            root_bounds: None,
            parent_id: None,
        });
        world.tick(DT);
        assert_eq!(world.grid().bounds(), TileRect::new(0, 0, 10, 10));
        assert_eq!(world.stats().expansions_failed, 1);
        assert!(world.request_expansion(Direction::West, TileCoord::new(0, 4)));
    }

    #[test]
    fn test_player_near_edge_requests_once() {
        let config = NavConfig::default().with_expansion_cooldown(2.0);
        let mut world = NavWorld::new(town(), config);
        world.spawn_player("player", TileCoord::new(5, 0)).unwrap();
        world.spawn_actor("maya", TileCoord::new(0, 5)).unwrap();

        run(&mut world, 30);
        let requests = world.drain_expansion_requests();
        assert_eq!(
            requests,
            vec![ExpansionRequest {
                direction: Direction::North,
                trigger: TileCoord::new(5, 0),
            }]
        );

        let plan = plan_expansion(world.grid().bounds(), Direction::North, 12);
        let region = SceneNode::new("orchard", NodeKind::Zone).with_rect(
            plan.region.x,
            plan.region.y,
            plan.region.w,
            plan.region.h,
        );
        world.receive_expansion(ExpansionResponse::success(
            Direction::North,
            region,
            plan.root_bounds,
        ));

        // The root grew north, so the player is no longer near an edge
        run(&mut world, 30);
        assert!(world.drain_expansion_requests().is_empty());
        assert!(!world.is_blocked(5, -12));
    }

    #[test]
    fn test_cooldown_blocks_requests_after_success() {
        let config = NavConfig::default().with_expansion_cooldown(1.0);
        let mut world = NavWorld::new(town(), config);
        world.request_expansion(Direction::East, TileCoord::new(9, 5));
        let plan = plan_expansion(world.grid().bounds(), Direction::East, 2);
        world.receive_expansion(ExpansionResponse::success(
            Direction::East,
            SceneNode::new("path", NodeKind::Zone).with_rect(10, 0, 2, 10),
            plan.root_bounds,
        ));
        world.tick(DT);

        assert!(!world.request_expansion(Direction::South, TileCoord::new(5, 9)));
        run(&mut world, 61);
        assert!(world.request_expansion(Direction::South, TileCoord::new(5, 9)));
    }

    #[test]
    fn test_three_destination_changes_in_one_tick() {
        let mut world = NavWorld::new(town(), NavConfig::default());
        world.spawn_actor("maya", TileCoord::new(0, 0)).unwrap();
        world.set_destination("maya", TileCoord::new(9, 0)).unwrap();
        run(&mut world, 20);
        let here = world.actor_tile("maya").unwrap();

        world.set_destination("maya", TileCoord::new(0, 9)).unwrap();
        world.set_destination("maya", TileCoord::new(5, 5)).unwrap();
        world.set_destination("maya", TileCoord::new(4, 1)).unwrap();
        world.tick(DT);

        let WalkerState::Walking { path, .. } = world.actor("maya").unwrap().state() else {
            panic!("expected walking");
        };
        assert_eq!(path.destination(), Some(TileCoord::new(4, 1)));
        assert_eq!(path.len() as u32, here.manhattan(TileCoord::new(4, 1)));
        assert_eq!(world.stats().searches, 2);

        world.tick(DT);
        let started: Vec<_> = world
            .events()
            .iter()
            .filter(|e| matches!(e, NavEvent::PathStarted { .. }))
            .collect();
        assert_eq!(started.len(), 1);
    }

    #[test]
    fn test_unreachable_hold_policy() {
        let config = NavConfig::default()
            .with_unreachable_policy(UnreachablePolicy::Hold)
            .with_search_limits(10_000, 0);
        let mut world = NavWorld::new(town(), config);
        world.spawn_actor("maya", TileCoord::new(0, 0)).unwrap();
        world.set_destination("maya", TileCoord::new(2, 2)).unwrap();
        world.tick(DT);
        assert_eq!(world.actor_tile("maya"), Some(TileCoord::new(0, 0)));

        world.tick(DT);
        assert!(world.events().iter().any(|e| matches!(
            e,
            NavEvent::PathUnreachable { fallback: UnreachablePolicy::Hold, .. }
        )));
    }

    #[test]
    fn test_expansion_under_inner_parent_matches_full_rebuild() {
        let root = SceneNode::new("garden", NodeKind::World)
            .with_rect(0, 0, 4, 4)
            .with_child(SceneNode::new("yard", NodeKind::Zone).with_rect(0, 0, 4, 4))
            .with_child(
                SceneNode::new("rock", NodeKind::Object)
                    .with_rect(1, 1, 1, 1)
                    .with_walkable(false),
            );
        let mut world = NavWorld::new(root, NavConfig::default());
        world.request_expansion(Direction::East, TileCoord::new(3, 1));

        let plan = plan_expansion(world.grid().bounds(), Direction::East, 2);
        let mut response = ExpansionResponse::success(
            Direction::East,
            SceneNode::new("rug", NodeKind::Object).with_rect(1, 1, 1, 1),
            plan.root_bounds,
        );
        response.parent_id = Some("yard".to_string());
        world.receive_expansion(response);
        world.tick(DT);

        assert_eq!(world.root().find("yard").unwrap().children.len(), 1);
        assert!(world.is_blocked(1, 1), "the later rock still wins over the rug");
        assert!(!world.is_blocked(5, 3));
        let rebuilt = CollisionGrid::from_scene(world.root(), 32.0);
        assert_eq!(*world.grid(), rebuilt);
    }

    #[test]
    fn test_two_expansions_planned_from_same_bounds() {
        let mut world = NavWorld::new(town(), NavConfig::default());
        assert!(world.request_expansion(Direction::North, TileCoord::new(9, 0)));
        assert!(world.request_expansion(Direction::East, TileCoord::new(9, 0)));

        let bounds = world.grid().bounds();
        let north = plan_expansion(bounds, Direction::North, 12);
        let east = plan_expansion(bounds, Direction::East, 12);
        world.receive_expansion(ExpansionResponse::success(
            Direction::North,
            SceneNode::new("hills", NodeKind::Zone).with_rect(
                north.region.x,
                north.region.y,
                north.region.w,
                north.region.h,
            ),
            north.root_bounds,
        ));
        world.receive_expansion(ExpansionResponse::success(
            Direction::East,
            SceneNode::new("river", NodeKind::Zone).with_rect(
                east.region.x,
                east.region.y,
                east.region.w,
                east.region.h,
            ),
            east.root_bounds,
        ));
        world.tick(DT);

        let grown = TileRect::new(0, -12, 22, 22);
        assert_eq!(world.grid().bounds(), grown);
        assert_eq!(world.root().footprint(), grown);
        assert!(!world.is_blocked(5, -5), "north region survives the east resize");
        assert!(!world.is_blocked(15, 5));
        assert!(world.is_blocked(2, 2));
        assert!(world.expansions_in_flight().is_empty());
        assert_eq!(*world.grid(), CollisionGrid::from_scene(world.root(), 32.0));

        world.tick(DT);
        assert!(world.events().iter().any(|e| matches!(
            e,
            NavEvent::ExpansionApplied { direction: Direction::East, bounds } if *bounds == grown
        )));
    }

    #[test]
    fn test_edge_margin() {
        let mut world = NavWorld::new(town(), NavConfig::default().with_edge_margin(0));
        world.spawn_player("player", TileCoord::new(5, 0)).unwrap();
        run(&mut world, 5);
        assert!(world.drain_expansion_requests().is_empty());

        let mut world = NavWorld::new(town(), NavConfig::default().with_edge_margin(1));
        world.spawn_player("player", TileCoord::new(5, 0)).unwrap();
        run(&mut world, 5);
        assert_eq!(world.expansions_in_flight(), &[Direction::North]);
    }
}
