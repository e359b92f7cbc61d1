//! Agents for the Pac-Man grid world
//!
//! This crate provides:
//! - A tabular Q-learning agent with prioritized replay and adaptive decay
//! - A uniformly random baseline
//! - JSON model persistence

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod persistence;
pub mod q_learning;
pub mod q_table;
pub mod random;
pub mod regression;
pub mod schedule;

// Re-export agents
pub use q_learning::{QLearningAgent, QLearningConfig};
pub use random::RandomAgent;

// Re-export utilities
pub use buffer::ReplayBuffer;
pub use persistence::SavedAgent;
pub use q_table::{QTable, StateKey};
pub use regression::{RegressionMonitor, Trend};
pub use schedule::ExponentialDecay;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{QLearningAgent, QLearningConfig, QTable, RandomAgent, ReplayBuffer};
    pub use pacman_rl_core::prelude::*;
}
