//! Pac-Man grid world for reinforcement learning
//!
//! This crate provides:
//! - Procedural maze generation with a corner-to-corner connectivity check
//! - The grid simulator (agent, ghosts, coins, power-ups, lives)
//! - The hand-engineered state abstraction the tabular learner sees
//! - Text rendering and a step-cap wrapper

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod abstraction;
pub mod config;
pub mod grid;
pub mod maze;
pub mod render;
pub mod wrappers;

// Re-export environments
pub use abstraction::{nearest_direction, AbstractState};
pub use config::{GhostBehavior, GridConfig, Layout, RewardConfig};
pub use grid::{EpisodeState, GridEnv, RawState};
pub use maze::{Maze, MazeGenerator};
pub use wrappers::TimeLimit;

// Re-export core types
pub use pacman_rl_core::{
    Action, EndReason, Environment, EpisodeRecord, GridPos, Reward, Step, StepInfo,
    TrackedEnvironment, ACTIONS,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{AbstractState, GhostBehavior, GridConfig, GridEnv, Layout, TimeLimit};
    pub use pacman_rl_core::prelude::*;
}
