//! World module
//!
//! The navigation world and its growth through expansion responses.

mod expansion;
mod navigator;

pub use expansion::{
    Direction, ExpansionPlan, ExpansionRequest, ExpansionResponse, ExpansionTracker,
    ParseDirectionError, edge_directions, plan_expansion,
};
pub use navigator::NavWorld;
