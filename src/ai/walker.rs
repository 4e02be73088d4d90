//! Per-actor path walking
//!
//! Each actor is an explicit state machine:
//!
//! ```text
//! Idle --destination--> PathComputing --path--> Walking --last waypoint--> Idle
//!                             |
//!                             +--no path (fallback applied)--> Idle
//! ```
//!
//! A destination change while walking goes back to `PathComputing` and the
//! next update searches from the actor's current tile. Only the last
//! destination set before an update is ever searched for.

use glam::Vec2;
use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

use super::{Path, Pathfinder, SearchOutcome};
use crate::core::{EventQueue, NavConfig, NavEvent, NavStats, UnreachablePolicy};
use crate::grid::CollisionGrid;
use crate::scene::TileCoord;

/// Errors from actor bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("actor '{0}' already exists")]
    DuplicateActor(String),
    #[error("no actor named '{0}'")]
    UnknownActor(String),
}

/// Movement state of one actor
#[derive(Debug, Clone, PartialEq)]
pub enum WalkerState {
    /// Standing still
    Idle,
    /// Destination accepted, path not yet computed
    PathComputing { destination: TileCoord },
    /// Following a non-empty path
    Walking {
        destination: TileCoord,
        path: Path,
        next_waypoint: usize,
    },
}

impl WalkerState {
    #[must_use]
    pub fn is_walking(&self) -> bool {
        matches!(self, Self::Walking { .. })
    }

    /// Waypoint the actor is heading for, if walking
    #[must_use]
    pub fn current_waypoint(&self) -> Option<TileCoord> {
        match self {
            Self::Walking {
                path,
                next_waypoint,
                ..
            } => path.get(*next_waypoint),
            _ => None,
        }
    }
}

/// Per-actor movement data, written only by [`PathWalker`]
#[derive(Debug, Clone, PartialEq)]
pub struct ActorMovementState {
    /// Pixel position of the actor's tile-center anchor
    position: Vec2,
    /// Tile containing `position`
    tile: TileCoord,
    state: WalkerState,
    /// Last destination accepted from the feed
    last_destination: Option<TileCoord>,
    /// Whether standing near the world edge requests expansion
    triggers_expansion: bool,
}

impl ActorMovementState {
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[must_use]
    pub fn tile(&self) -> TileCoord {
        self.tile
    }

    #[must_use]
    pub fn state(&self) -> &WalkerState {
        &self.state
    }

    #[must_use]
    pub fn last_destination(&self) -> Option<TileCoord> {
        self.last_destination
    }

    #[must_use]
    pub fn triggers_expansion(&self) -> bool {
        self.triggers_expansion
    }
}

/// Read-only view of an actor for the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorSnapshot {
    pub id: String,
    pub position: Vec2,
    pub tile: TileCoord,
    pub walking: bool,
    pub destination: Option<TileCoord>,
}

#[derive(Debug, Clone)]
struct Actor {
    id: String,
    movement: ActorMovementState,
}

/// Owner of every actor's movement state
#[derive(Debug, Clone)]
pub struct PathWalker {
    /// Actors in spawn order
    actors: Vec<Actor>,
    index: FxHashMap<String, usize>,
    speed: f32,
    arrival_threshold: f32,
    policy: UnreachablePolicy,
}

impl PathWalker {
    #[must_use]
    pub fn new(config: &NavConfig) -> Self {
        Self {
            actors: Vec::new(),
            index: FxHashMap::default(),
            speed: config.walk_speed_px,
            arrival_threshold: config.arrival_threshold_px,
            policy: config.unreachable_policy,
        }
    }

    /// Place a new idle actor at the center of `tile`
    ///
    /// # Errors
    ///
    /// Returns `NavError::DuplicateActor` if the id is taken
    pub fn spawn(
        &mut self,
        grid: &CollisionGrid,
        id: impl Into<String>,
        tile: TileCoord,
        triggers_expansion: bool,
    ) -> Result<(), NavError> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(NavError::DuplicateActor(id));
        }
        self.index.insert(id.clone(), self.actors.len());
        self.actors.push(Actor {
            id,
            movement: ActorMovementState {
                position: grid.tile_center_px(tile),
                tile,
                state: WalkerState::Idle,
                last_destination: None,
                triggers_expansion,
            },
        });
        Ok(())
    }

    /// Feed a new authoritative destination.
    ///
    /// Returns `Ok(false)` when it matches the last accepted destination.
    ///
    /// # Errors
    ///
    /// Returns `NavError::UnknownActor` if no actor has that id
    pub fn set_destination(&mut self, id: &str, destination: TileCoord) -> Result<bool, NavError> {
        let movement = self.movement_mut(id)?;
        if movement.last_destination == Some(destination) {
            return Ok(false);
        }
        movement.last_destination = Some(destination);
        movement.state = WalkerState::PathComputing { destination };
        Ok(true)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ActorMovementState> {
        self.index.get(id).map(|&i| &self.actors[i].movement)
    }

    #[must_use]
    pub fn state(&self, id: &str) -> Option<&WalkerState> {
        self.get(id).map(ActorMovementState::state)
    }

    /// Tile containing the actor's anchor
    #[must_use]
    pub fn current_tile(&self, id: &str) -> Option<TileCoord> {
        self.get(id).map(ActorMovementState::tile)
    }

    /// Ids and current tiles of every actor, in spawn order
    pub fn tiles(&self) -> impl Iterator<Item = (&str, TileCoord, &ActorMovementState)> {
        self.actors
            .iter()
            .map(|actor| (actor.id.as_str(), actor.movement.tile, &actor.movement))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Snapshot every actor for presentation
    #[must_use]
    pub fn snapshot(&self) -> Vec<ActorSnapshot> {
        self.actors
            .iter()
            .map(|actor| ActorSnapshot {
                id: actor.id.clone(),
                position: actor.movement.position,
                tile: actor.movement.tile,
                walking: actor.movement.state.is_walking(),
                destination: actor.movement.last_destination,
            })
            .collect()
    }

    /// Advance every actor by one frame of `dt` seconds.
    ///
    /// Pending destinations are searched first; an actor whose path is ready
    /// starts walking in the same frame.
    pub fn update(
        &mut self,
        dt: f32,
        grid: &CollisionGrid,
        pathfinder: &Pathfinder,
        events: &mut EventQueue,
        stats: &mut NavStats,
    ) {
        let step = self.speed * dt.max(0.0);
        let threshold = self.arrival_threshold;
        let policy = self.policy;

        for actor in &mut self.actors {
            if let WalkerState::PathComputing { destination } = actor.movement.state {
                let next = plan(actor, destination, grid, pathfinder, policy, events, stats);
                actor.movement.state = next;
            }
            advance(actor, step, grid, threshold, events);
        }
    }

    fn movement_mut(&mut self, id: &str) -> Result<&mut ActorMovementState, NavError> {
        let &i = self
            .index
            .get(id)
            .ok_or_else(|| NavError::UnknownActor(id.to_string()))?;
        Ok(&mut self.actors[i].movement)
    }
}

/// Resolve a pending destination into the next state
fn plan(
    actor: &mut Actor,
    destination: TileCoord,
    grid: &CollisionGrid,
    pathfinder: &Pathfinder,
    policy: UnreachablePolicy,
    events: &mut EventQueue,
    stats: &mut NavStats,
) -> WalkerState {
    let start = actor.movement.tile;
    let search = pathfinder.search(grid, start, destination);
    stats.record_search(destination, &search);

    match search.outcome {
        SearchOutcome::Found => {
            let steps = search.path.len();
            let end = search.path.destination().unwrap_or(destination);
            debug!(
                "'{}' walking {start} -> {end} in {steps} steps ({} nodes expanded)",
                actor.id, search.expanded
            );
            events.push(NavEvent::PathStarted {
                actor: actor.id.clone(),
                destination: end,
                steps,
            });
            WalkerState::Walking {
                destination,
                path: search.path,
                next_waypoint: 0,
            }
        }
        SearchOutcome::AlreadyThere => {
            // Interrupted mid-step: finish onto the tile center
            let center = grid.tile_center_px(start);
            if actor.movement.position.distance(center) > f32::EPSILON {
                WalkerState::Walking {
                    destination,
                    path: Path::from_waypoints(vec![start]),
                    next_waypoint: 0,
                }
            } else {
                WalkerState::Idle
            }
        }
        SearchOutcome::NoOpenGoal | SearchOutcome::Unreachable | SearchOutcome::IterationLimit => {
            warn!(
                "'{}' cannot reach {destination} from {start} ({:?}), applying {:?}",
                actor.id, search.outcome, policy
            );
            match policy {
                UnreachablePolicy::Teleport => {
                    actor.movement.position = grid.tile_center_px(destination);
                    actor.movement.tile = destination;
                }
                // Unlatch so a repeated destination is searched again
                UnreachablePolicy::Hold => actor.movement.last_destination = None,
            }
            events.push(NavEvent::PathUnreachable {
                actor: actor.id.clone(),
                requested: destination,
                fallback: policy,
            });
            WalkerState::Idle
        }
    }
}

/// Move a walking actor toward its current waypoint
fn advance(
    actor: &mut Actor,
    step: f32,
    grid: &CollisionGrid,
    threshold: f32,
    events: &mut EventQueue,
) {
    let WalkerState::Walking {
        path,
        next_waypoint,
        ..
    } = &mut actor.movement.state
    else {
        return;
    };
    let Some(waypoint) = path.get(*next_waypoint) else {
        actor.movement.state = WalkerState::Idle;
        return;
    };

    let target = grid.tile_center_px(waypoint);
    let to_target = target - actor.movement.position;
    let distance = to_target.length();
    let position = if distance <= step {
        target
    } else {
        actor.movement.position + to_target / distance * step
    };

    if position.distance(target) > threshold {
        actor.movement.position = position;
        actor.movement.tile = grid.tile_at_px(position);
        return;
    }

    actor.movement.position = target;
    actor.movement.tile = waypoint;
    *next_waypoint += 1;
    if *next_waypoint >= path.len() {
        debug!("'{}' arrived at {waypoint}", actor.id);
        actor.movement.state = WalkerState::Idle;
        events.push(NavEvent::ActorArrived {
            actor: actor.id.clone(),
            tile: waypoint,
        });
    }
}
