//! Agent traits and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Action;

/// Snapshot of an agent's learning parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    /// Number of (state, action) entries in the value table
    pub q_table_size: usize,
    /// Episodes seen by `decay_epsilon`
    pub episodes_trained: usize,
    /// Current exploration rate
    pub epsilon: f64,
    /// Current learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
}

/// Core agent trait
///
/// Learning agents override the update hooks; baselines keep the no-op
/// defaults.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Abstracted state type the agent reasons over
    type State: Send + Sync;

    /// Human readable agent name
    fn name(&self) -> &str;

    /// Select an action; `explore = false` means pure exploitation
    fn choose_action(&mut self, state: &Self::State, explore: bool) -> Action;

    /// Learn from a single transition
    fn update(
        &mut self,
        _state: &Self::State,
        _action: Action,
        _reward: f64,
        _next_state: &Self::State,
        _done: bool,
    ) {
    }

    /// End-of-episode hook: adapt exploration and learning rate
    fn decay_epsilon(&mut self, _episode_reward: f64) {}

    /// Re-apply stored transitions
    fn replay_experience(&mut self, _batch_size: usize) {}

    /// Get agent statistics
    fn stats(&self) -> AgentStats {
        AgentStats::default()
    }

    /// Save the agent
    async fn save(&self, path: &std::path::Path) -> crate::Result<()>;

    /// Load the agent
    async fn load(&mut self, path: &std::path::Path) -> crate::Result<()>;
}
