//! Tabular Q-learning agent
//!
//! Epsilon-greedy selection over a [`QTable`], one-step Q-learning updates,
//! prioritized replay of past transitions and per-episode decay of both the
//! exploration and learning rates. When recent episode rewards regress the
//! exploration rate is boosted back up.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

use pacman_rl_core::{Action, Agent, AgentStats, RLError, Result, Transition, ACTIONS};

use crate::buffer::{ReplayBuffer, DEFAULT_CAPACITY};
use crate::persistence::{
    self, SavedAgent, DEFAULT_ALPHA_DECAY, DEFAULT_ALPHA_MIN, DEFAULT_EPSILON_MIN, EPSILON_FLOOR,
};
use crate::q_table::{QTable, StateKey};
use crate::regression::{RegressionMonitor, Trend};
use crate::schedule::ExponentialDecay;

/// Factor applied to epsilon on a regression
const REGRESSION_BOOST: f64 = 1.2;
/// Epsilon never gets boosted above this
const REGRESSION_CAP: f64 = 0.3;
/// Replay learning rate relative to alpha
const REPLAY_ALPHA_SCALE: f64 = 0.7;
/// Replay learning-rate floor
const REPLAY_ALPHA_MIN: f64 = 0.02;

/// Q-learning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Initial exploration rate
    pub epsilon: f64,
    /// Exploration floor; raised to at least 0.05
    pub epsilon_min: f64,
    /// Exploration decay per episode
    pub epsilon_decay: f64,
    /// Learning-rate floor
    pub alpha_min: f64,
    /// Learning-rate decay per episode
    pub alpha_decay: f64,
    /// Replay buffer capacity
    pub buffer_capacity: usize,
    /// Random seed
    pub seed: Option<u64>,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.3,
            epsilon_min: DEFAULT_EPSILON_MIN,
            epsilon_decay: 0.995,
            alpha_min: DEFAULT_ALPHA_MIN,
            alpha_decay: DEFAULT_ALPHA_DECAY,
            buffer_capacity: DEFAULT_CAPACITY,
            seed: None,
        }
    }
}

/// Tabular Q-learning agent over states of type `S`
#[derive(Debug)]
pub struct QLearningAgent<S> {
    q_table: QTable<S>,
    buffer: ReplayBuffer<S>,
    monitor: RegressionMonitor,
    alpha: ExponentialDecay,
    alpha_initial: f64,
    epsilon: ExponentialDecay,
    gamma: f64,
    episodes_trained: usize,
    rng: StdRng,
}

impl<S: StateKey> QLearningAgent<S> {
    /// Create a new agent with an empty table
    #[must_use]
    pub fn new(config: QLearningConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            q_table: QTable::new(),
            buffer: ReplayBuffer::new(config.buffer_capacity),
            monitor: RegressionMonitor::default(),
            alpha: ExponentialDecay::new(config.alpha, config.alpha_min, config.alpha_decay),
            alpha_initial: config.alpha,
            epsilon: ExponentialDecay::new(
                config.epsilon,
                config.epsilon_min.max(EPSILON_FLOOR),
                config.epsilon_decay,
            ),
            gamma: config.gamma,
            episodes_trained: 0,
            rng,
        }
    }

    /// `Q(state, action)`, 0.0 when never updated
    #[must_use]
    pub fn value(&self, state: &S, action: Action) -> f64 {
        self.q_table.get(state, action)
    }

    /// Epsilon-greedy selection; ties among the best actions break uniformly
    pub fn choose_action(&mut self, state: &S, explore: bool) -> Action {
        if explore && self.rng.gen::<f64>() < self.epsilon.value() {
            return Action::sample(&mut self.rng);
        }
        self.q_table
            .best_actions(state)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(ACTIONS[0])
    }

    /// Store the transition and apply one Q-learning update
    pub fn update(&mut self, state: &S, action: Action, reward: f64, next_state: &S, done: bool) {
        self.buffer.push(Transition::new(
            state.clone(),
            action,
            reward,
            next_state.clone(),
            done,
        ));
        self.q_table.td_update(
            state,
            action,
            reward,
            next_state,
            done,
            self.alpha.value(),
            self.gamma,
        );
    }

    /// End-of-episode adaptation
    ///
    /// Boosts epsilon when the newer half of the last 50 episode rewards
    /// regressed, then decays epsilon and alpha toward their floors.
    pub fn decay_epsilon(&mut self, episode_reward: f64) {
        match self.monitor.record(episode_reward) {
            Trend::Regressed { recent, previous } => {
                let epsilon = self.epsilon.boost(REGRESSION_BOOST, REGRESSION_CAP);
                tracing::debug!(recent, previous, epsilon, "reward regression, boosting exploration");
            }
            Trend::Steady { .. } | Trend::Warming => {}
        }
        self.epsilon.step();
        self.alpha.step();
        self.episodes_trained += 1;
    }

    /// Re-apply `batch_size` transitions drawn by reward magnitude
    ///
    /// Does nothing while the buffer holds fewer than `batch_size`.
    pub fn replay_experience(&mut self, batch_size: usize) {
        let Some(batch) = self.buffer.sample_prioritized(batch_size, &mut self.rng) else {
            return;
        };
        let alpha = (self.alpha.value() * REPLAY_ALPHA_SCALE).max(REPLAY_ALPHA_MIN);
        for transition in batch {
            self.q_table.td_update(
                &transition.state,
                transition.action,
                transition.reward,
                &transition.next_state,
                transition.done,
                alpha,
                self.gamma,
            );
        }
    }

    /// Greedy action per state, first maximum on ties
    #[must_use]
    pub fn policy(&self, states: &[S]) -> Vec<Action> {
        states
            .iter()
            .map(|state| self.q_table.first_best(state))
            .collect()
    }

    /// Snapshot of learning parameters
    #[must_use]
    pub fn stats(&self) -> AgentStats {
        AgentStats {
            q_table_size: self.q_table.len(),
            episodes_trained: self.episodes_trained,
            epsilon: self.epsilon.value(),
            alpha: self.alpha.value(),
            gamma: self.gamma,
        }
    }

    /// Value table
    #[must_use]
    pub fn q_table(&self) -> &QTable<S> {
        &self.q_table
    }

    /// Current exploration rate
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon.value()
    }

    /// Current learning rate
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha.value()
    }

    /// Transitions available for replay
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Best non-regressed recent mean reward
    #[must_use]
    pub fn best_average_reward(&self) -> Option<f64> {
        self.monitor.best_average()
    }

    /// Serializable snapshot of the agent
    pub fn to_saved(&self) -> Result<SavedAgent> {
        Ok(SavedAgent {
            actions: ACTIONS.to_vec(),
            alpha: self.alpha.value,
            alpha_initial: Some(self.alpha_initial),
            alpha_min: Some(self.alpha.min_value),
            alpha_decay: Some(self.alpha.decay_rate),
            gamma: self.gamma,
            epsilon: self.epsilon.value,
            epsilon_min: Some(self.epsilon.min_value),
            epsilon_decay: self.epsilon.decay_rate,
            episodes_trained: self.episodes_trained,
            recent_rewards: self.monitor.rewards().collect(),
            best_average_reward: self.monitor.best_average(),
            q_table: self.q_table.to_keyed()?,
        })
    }

    /// Replace the learned state with `saved`, filling in defaults for
    /// optional fields
    pub fn restore(&mut self, saved: SavedAgent) -> Result<()> {
        if saved.actions != ACTIONS {
            return Err(RLError::Persistence(format!(
                "model was trained on actions {:?}, expected {:?}",
                saved.actions, ACTIONS
            )));
        }

        self.q_table = QTable::from_keyed(saved.q_table)?;
        self.alpha = ExponentialDecay::new(
            saved.alpha,
            saved.alpha_min.unwrap_or(DEFAULT_ALPHA_MIN),
            saved.alpha_decay.unwrap_or(DEFAULT_ALPHA_DECAY),
        );
        self.alpha_initial = saved.alpha_initial.unwrap_or(saved.alpha);
        self.epsilon = ExponentialDecay::new(
            saved.epsilon,
            saved
                .epsilon_min
                .unwrap_or(DEFAULT_EPSILON_MIN)
                .max(EPSILON_FLOOR),
            saved.epsilon_decay,
        );
        self.gamma = saved.gamma;
        self.episodes_trained = saved.episodes_trained;
        self.monitor
            .restore(saved.recent_rewards, saved.best_average_reward);
        self.buffer.clear();
        Ok(())
    }
}

#[async_trait]
impl<S: StateKey> Agent for QLearningAgent<S> {
    type State = S;

    fn name(&self) -> &str {
        "q-learning"
    }

    fn choose_action(&mut self, state: &S, explore: bool) -> Action {
        QLearningAgent::choose_action(self, state, explore)
    }

    fn update(&mut self, state: &S, action: Action, reward: f64, next_state: &S, done: bool) {
        QLearningAgent::update(self, state, action, reward, next_state, done);
    }

    fn decay_epsilon(&mut self, episode_reward: f64) {
        QLearningAgent::decay_epsilon(self, episode_reward);
    }

    fn replay_experience(&mut self, batch_size: usize) {
        QLearningAgent::replay_experience(self, batch_size);
    }

    fn stats(&self) -> AgentStats {
        QLearningAgent::stats(self)
    }

    async fn save(&self, path: &Path) -> Result<()> {
        let saved = self.to_saved()?;
        persistence::write_json(path, &saved).await?;
        tracing::debug!(path = %path.display(), entries = saved.q_table.len(), "saved q-learning agent");
        Ok(())
    }

    async fn load(&mut self, path: &Path) -> Result<()> {
        let saved: SavedAgent = persistence::read_json(path).await?;
        self.restore(saved)?;
        tracing::debug!(path = %path.display(), entries = self.q_table.len(), "loaded q-learning agent");
        Ok(())
    }
}
