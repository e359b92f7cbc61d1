//! Core reinforcement learning traits and types for the Pac-Man grid world
//!
//! This crate provides the shared vocabulary between the simulator and the
//! learners: the closed action set, grid positions, rewards, transitions and
//! the `Environment` / `Agent` seams the training loop drives.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod agent;
pub mod environment;
pub mod error;
pub mod reward;
pub mod state;
pub mod trajectory;

// Re-export core traits and types
pub use action::{Action, Direction, ACTIONS};
pub use agent::{Agent, AgentStats};
pub use environment::{
    EndReason, Environment, EpisodeRecord, Step, StepInfo, TrackedEnvironment,
};
pub use error::{RLError, Result};
pub use reward::Reward;
pub use state::GridPos;
pub use trajectory::Transition;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, Agent, Direction, EndReason, Environment, GridPos, Result, Reward, Step,
        StepInfo, Transition, ACTIONS,
    };
}
