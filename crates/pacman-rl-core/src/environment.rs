//! Environment traits and types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Action, Reward};

/// Why a step ended (or interrupted) the current episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Last life lost to a ghost
    GameOver,
    /// Every coin picked up
    AllCoinsCollected,
    /// A life was lost but the episode goes on after a respawn
    LifeLost,
    /// The caller's step cap was reached
    StepLimit,
}

impl EndReason {
    /// Snake-case name of the reason
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GameOver => "game_over",
            Self::AllCoinsCollected => "all_coins_collected",
            Self::LifeLost => "life_lost",
            Self::StepLimit => "step_limit",
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Additional information from a step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Set when the step ended the episode or cost a life
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<EndReason>,
    /// Coins collected so far this episode
    pub coins_collected: usize,
    /// Steps taken so far this episode
    pub steps: usize,
    /// Power-ups collected so far this episode
    pub powerups_collected: usize,
    /// Whether the agent is currently invincible
    pub invincible: bool,
    /// Remaining invincibility steps
    pub invincibility_timer: u32,
    /// Ghosts eaten so far this episode
    pub ghosts_eaten: usize,
    /// Lives left
    pub lives_remaining: u32,
    /// Lives lost so far this episode
    pub lives_lost: u32,
}

/// Result of a single environment step
#[derive(Debug, Clone)]
pub struct Step<O> {
    /// Raw observation from the environment
    pub observation: O,
    /// Reward signal
    pub reward: Reward,
    /// Whether the episode is done
    pub done: bool,
    /// Whether the episode was truncated (e.g., time limit)
    pub truncated: bool,
    /// Additional info from the environment
    pub info: StepInfo,
}

impl<O> Step<O> {
    /// Whether the caller should stop stepping this episode
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.done || self.truncated
    }
}

/// Core environment trait
///
/// Simulation is synchronous; one instance is owned by one training run.
pub trait Environment {
    /// Raw, unabstracted observation type
    type Observation;
    /// Abstracted state the learner reasons over
    type State;

    /// The fixed, ordered action set
    fn actions(&self) -> &'static [Action] {
        &crate::ACTIONS
    }

    /// Reset the environment for a new episode
    fn reset(&mut self) -> crate::Result<Self::Observation>;

    /// Take a step in the environment
    fn step(&mut self, action: Action) -> crate::Result<Step<Self::Observation>>;

    /// Abstracted view of the current episode state
    fn abstract_state(&self) -> Self::State;

    /// Diagnostic text snapshot
    fn render(&self) -> String;
}

/// Episode information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Episode ID
    pub id: String,
    /// Total reward
    pub total_reward: f64,
    /// Number of steps
    pub steps: usize,
    /// Whether episode was truncated
    pub truncated: bool,
    /// Terminal reason, once known
    pub reason: Option<EndReason>,
    /// Start time
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// End time
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// Wrapper for environments that tracks episodes
pub struct TrackedEnvironment<E> {
    /// Inner environment
    pub env: E,
    /// Current episode
    pub episode: Option<EpisodeRecord>,
    /// Step counter
    pub step_count: usize,
}

impl<E> TrackedEnvironment<E> {
    /// Create a new tracked environment
    pub fn new(env: E) -> Self {
        Self {
            env,
            episode: None,
            step_count: 0,
        }
    }

    /// Get current episode info
    pub fn episode_info(&self) -> Option<&EpisodeRecord> {
        self.episode.as_ref()
    }
}

impl<E> Environment for TrackedEnvironment<E>
where
    E: Environment,
{
    type Observation = E::Observation;
    type State = E::State;

    fn reset(&mut self) -> crate::Result<Self::Observation> {
        // End current episode if exists
        if let Some(ref mut episode) = self.episode {
            if episode.end_time.is_none() {
                episode.end_time = Some(chrono::Utc::now());
            }
        }

        self.episode = Some(EpisodeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            total_reward: 0.0,
            steps: 0,
            truncated: false,
            reason: None,
            start_time: chrono::Utc::now(),
            end_time: None,
        });
        self.step_count = 0;

        self.env.reset()
    }

    fn step(&mut self, action: Action) -> crate::Result<Step<Self::Observation>> {
        let step = self.env.step(action)?;

        self.step_count += 1;
        if let Some(ref mut episode) = self.episode {
            episode.total_reward += step.reward.0;
            episode.steps = self.step_count;

            if step.is_last() {
                episode.truncated = step.truncated;
                episode.reason = step.info.reason;
                episode.end_time = Some(chrono::Utc::now());
                tracing::debug!(
                    episode = %episode.id,
                    steps = episode.steps,
                    reward = episode.total_reward,
                    "episode ended"
                );
            }
        }

        Ok(step)
    }

    fn abstract_state(&self) -> Self::State {
        self.env.abstract_state()
    }

    fn render(&self) -> String {
        self.env.render()
    }
}
