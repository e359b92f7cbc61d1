//! Transition storage

use serde::{Deserialize, Serialize};

use crate::Action;

/// Single transition, as stored for experience replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition<S> {
    /// State the action was taken in
    pub state: S,
    /// Action taken
    pub action: Action,
    /// Reward received
    pub reward: f64,
    /// State observed after the action
    pub next_state: S,
    /// Whether the episode ended with this transition
    pub done: bool,
}

impl<S> Transition<S> {
    /// Create a new transition
    pub fn new(state: S, action: Action, reward: f64, next_state: S, done: bool) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }

    /// Replay priority: larger rewards or punishments are replayed more often
    #[must_use]
    pub fn priority(&self) -> f64 {
        self.reward.abs() + 0.1
    }
}
