//! Navigation events
//!
//! A double-buffered queue that lets the rendering layer and agent logic
//! react to movement and expansion without reaching into engine state.
//! Events pushed during tick N are readable after the swap at the start of
//! tick N+1.

use std::collections::VecDeque;

use crate::core::UnreachablePolicy;
use crate::scene::{TileCoord, TileRect};
use crate::world::Direction;

/// Something that happened to an actor or the world
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum NavEvent {
    /// A path was computed and the actor started walking.
    PathStarted {
        actor: String,
        /// Final waypoint (may differ from the request when the goal was blocked)
        destination: TileCoord,
        steps: usize,
    },

    /// The actor reached the end of its path.
    ActorArrived { actor: String, tile: TileCoord },

    /// No path existed; the fallback policy was applied.
    PathUnreachable {
        actor: String,
        requested: TileCoord,
        fallback: UnreachablePolicy,
    },

    /// An expansion request was queued for the transport.
    ExpansionRequested {
        direction: Direction,
        trigger: TileCoord,
    },

    /// A successful expansion was applied to the grid.
    ExpansionApplied {
        direction: Direction,
        bounds: TileRect,
    },

    /// The transport reported a failed expansion.
    ExpansionFailed { direction: Direction },
}

/// Double-buffered event queue for frame-consistent event processing.
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<NavEvent>,
    /// Events from the previous tick, ready for processing
    processing: VecDeque<NavEvent>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 64;

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event to be processed next tick.
    #[inline]
    pub fn push(&mut self, event: NavEvent) {
        self.pending.push_back(event);
    }

    /// Swap the pending and processing queues.
    ///
    /// After swapping, `iter()` returns the previous tick's events and
    /// `push()` writes to a fresh pending queue.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events from the previous tick.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &NavEvent> {
        self.processing.iter()
    }

    /// Drain all events from the previous tick.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = NavEvent> + '_ {
        self.processing.drain(..)
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Number of events waiting for the next swap.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
