//! Core module
//!
//! Configuration, events and statistics shared by the navigation systems.

mod config;
mod debug;
mod events;

pub use config::{ConfigError, ExpansionConfig, NavConfig, UnreachablePolicy};
pub use debug::NavStats;
pub use events::{EventQueue, NavEvent};
