// Training sessions: episode loop, greedy evaluation and episode recording

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use pacman_rl_core::{
    Action, Agent, EndReason, Environment, GridPos, Result, StepInfo, TrackedEnvironment,
};
use pacman_rl_env::{AbstractState, GridEnv, TimeLimit};

use crate::config::TrainingConfig;

/// Per-episode results and aggregates of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Session that produced these stats
    pub session_id: Uuid,
    /// When training started
    pub started_at: DateTime<Utc>,
    /// Episodes trained
    pub num_episodes: usize,
    /// Step cap per episode
    pub max_steps: usize,
    /// Wall-clock training time in seconds
    pub training_time: f64,
    /// Total reward per episode
    pub rewards_per_episode: Vec<f64>,
    /// Coins collected per episode
    pub coins_per_episode: Vec<usize>,
    /// Steps per episode
    pub steps_per_episode: Vec<usize>,
    /// Whether each episode cleared the board
    pub success_per_episode: Vec<bool>,
    /// Mean episode reward
    pub avg_reward: f64,
    /// Mean coins per episode
    pub avg_coins: f64,
    /// Mean steps per episode
    pub avg_steps: f64,
    /// Fraction of episodes that cleared the board
    pub success_rate: f64,
    /// Exploration rate after training
    pub final_epsilon: f64,
    /// Value-table entries after training
    pub q_table_size: usize,
}

/// Aggregates over greedy rollouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationStats {
    /// Episodes evaluated
    pub num_episodes: usize,
    /// Mean episode reward
    pub avg_reward: f64,
    /// Population standard deviation of episode rewards
    pub std_reward: f64,
    /// Mean coins per episode
    pub avg_coins: f64,
    /// Mean steps per episode
    pub avg_steps: f64,
    /// Fraction of episodes that cleared the board
    pub success_rate: f64,
}

/// Board snapshot after one step of a recorded episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Step index, 0 for the state after reset
    pub step: usize,
    /// Agent cell
    pub agent: GridPos,
    /// Ghost cells
    pub ghosts: Vec<GridPos>,
    /// Remaining coins
    pub coins: Vec<GridPos>,
    /// Remaining power-ups
    pub powerups: Vec<GridPos>,
    /// Action that led here
    pub action: Option<Action>,
    /// Reward of that action
    pub reward: f64,
    /// Whether the episode ended here
    pub done: bool,
    /// Step info
    pub info: StepInfo,
    /// Text rendering of the board
    pub board: String,
}

/// A recorded greedy episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeTrace {
    /// Side length of the grid
    pub grid_size: i32,
    /// Wall cells
    pub walls: Vec<GridPos>,
    /// Frames, starting with the state after reset
    pub frames: Vec<Frame>,
}

/// Outcome of a single episode
#[derive(Debug, Clone, Copy)]
struct EpisodeOutcome {
    reward: f64,
    coins: usize,
    steps: usize,
    reason: Option<EndReason>,
}

impl EpisodeOutcome {
    fn success(&self) -> bool {
        self.reason == Some(EndReason::AllCoinsCollected)
    }
}

/// One agent trained against one environment
pub struct TrainingSession<A> {
    id: Uuid,
    env: TrackedEnvironment<TimeLimit<GridEnv>>,
    agent: A,
    config: TrainingConfig,
}

impl<A> TrainingSession<A>
where
    A: Agent<State = AbstractState>,
{
    /// Create a new session
    pub fn new(env: GridEnv, agent: A, config: TrainingConfig) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, agent = agent.name(), "creating training session");
        Self {
            id,
            env: TrackedEnvironment::new(TimeLimit::new(env, config.max_steps)),
            agent,
            config,
        }
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The agent
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// The environment
    pub fn env(&self) -> &GridEnv {
        &self.env.env.env
    }

    /// Run the configured number of learning episodes
    pub fn train(&mut self) -> Result<TrainingStats> {
        let started_at = Utc::now();
        let started = Instant::now();
        let episodes = self.config.episodes;
        tracing::info!(
            session = %self.id,
            agent = self.agent.name(),
            episodes,
            max_steps = self.config.max_steps,
            "training started"
        );

        let mut outcomes = Vec::with_capacity(episodes);
        for episode in 1..=episodes {
            let outcome = self.run_episode(true)?;

            if episode % self.config.replay_interval == 0 {
                self.agent.replay_experience(self.config.replay_batch);
            }
            self.agent.decay_epsilon(outcome.reward);
            outcomes.push(outcome);

            if episode % self.config.log_interval == 0 {
                let window = &outcomes[outcomes.len().saturating_sub(self.config.log_interval)..];
                let summary = summarize(window);
                tracing::info!(
                    episode,
                    avg_reward = summary.avg_reward,
                    avg_coins = summary.avg_coins,
                    avg_steps = summary.avg_steps,
                    success_rate = summary.success_rate,
                    epsilon = self.agent.stats().epsilon,
                    "training progress"
                );
            }
        }

        let summary = summarize(&outcomes);
        let agent_stats = self.agent.stats();
        let stats = TrainingStats {
            session_id: self.id,
            started_at,
            num_episodes: episodes,
            max_steps: self.config.max_steps,
            training_time: started.elapsed().as_secs_f64(),
            rewards_per_episode: outcomes.iter().map(|o| o.reward).collect(),
            coins_per_episode: outcomes.iter().map(|o| o.coins).collect(),
            steps_per_episode: outcomes.iter().map(|o| o.steps).collect(),
            success_per_episode: outcomes.iter().map(EpisodeOutcome::success).collect(),
            avg_reward: summary.avg_reward,
            avg_coins: summary.avg_coins,
            avg_steps: summary.avg_steps,
            success_rate: summary.success_rate,
            final_epsilon: agent_stats.epsilon,
            q_table_size: agent_stats.q_table_size,
        };
        tracing::info!(
            session = %self.id,
            seconds = stats.training_time,
            avg_reward = stats.avg_reward,
            success_rate = stats.success_rate,
            q_table_size = stats.q_table_size,
            "training finished"
        );
        Ok(stats)
    }

    /// Greedy rollouts without learning
    pub fn evaluate(&mut self, episodes: usize) -> Result<EvaluationStats> {
        let outcomes = (0..episodes)
            .map(|_| self.run_episode(false))
            .collect::<Result<Vec<_>>>()?;
        Ok(summarize(&outcomes))
    }

    /// Play one greedy episode and capture every frame
    pub fn record_episode(&mut self) -> Result<EpisodeTrace> {
        self.env.reset()?;
        let mut frames = vec![self.frame(0, None, 0.0, false, self.initial_info())];
        let mut state = self.env.abstract_state();

        loop {
            let action = self.agent.choose_action(&state, false);
            let step = self.env.step(action)?;
            state = self.env.abstract_state();
            let last = step.is_last();
            frames.push(self.frame(frames.len(), Some(action), step.reward.value(), step.done, step.info));
            if last {
                break;
            }
        }

        let grid = self.env();
        Ok(EpisodeTrace {
            grid_size: grid.grid_size(),
            walls: grid.maze().walls().iter().copied().collect(),
            frames,
        })
    }

    /// Consume the session, returning the agent
    pub fn into_agent(self) -> A {
        self.agent
    }

    fn run_episode(&mut self, learn: bool) -> Result<EpisodeOutcome> {
        self.env.reset()?;
        let mut state = self.env.abstract_state();

        loop {
            let action = self.agent.choose_action(&state, learn);
            let step = self.env.step(action)?;
            let next_state = self.env.abstract_state();
            if learn {
                self.agent
                    .update(&state, action, step.reward.value(), &next_state, step.done);
            }
            state = next_state;

            if step.is_last() {
                let (reward, steps) = self
                    .env
                    .episode_info()
                    .map_or((0.0, 0), |record| (record.total_reward, record.steps));
                return Ok(EpisodeOutcome {
                    reward,
                    coins: step.info.coins_collected,
                    steps,
                    reason: step.info.reason,
                });
            }
        }
    }

    fn initial_info(&self) -> StepInfo {
        let episode = self.env().episode();
        StepInfo {
            lives_remaining: episode.lives,
            ..StepInfo::default()
        }
    }

    fn frame(
        &self,
        step: usize,
        action: Option<Action>,
        reward: f64,
        done: bool,
        info: StepInfo,
    ) -> Frame {
        let grid = self.env();
        let episode = grid.episode();
        Frame {
            step,
            agent: episode.agent,
            ghosts: episode.ghosts.clone(),
            coins: episode.coins.iter().copied().collect(),
            powerups: episode.powerups.iter().copied().collect(),
            action,
            reward,
            done,
            info,
            board: self.env.render(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn summarize(outcomes: &[EpisodeOutcome]) -> EvaluationStats {
    let n = outcomes.len();
    if n == 0 {
        return EvaluationStats {
            num_episodes: 0,
            avg_reward: 0.0,
            std_reward: 0.0,
            avg_coins: 0.0,
            avg_steps: 0.0,
            success_rate: 0.0,
        };
    }

    let count = n as f64;
    let avg_reward = outcomes.iter().map(|o| o.reward).sum::<f64>() / count;
    let variance = outcomes
        .iter()
        .map(|o| (o.reward - avg_reward).powi(2))
        .sum::<f64>()
        / count;

    EvaluationStats {
        num_episodes: n,
        avg_reward,
        std_reward: variance.sqrt(),
        avg_coins: outcomes.iter().map(|o| o.coins as f64).sum::<f64>() / count,
        avg_steps: outcomes.iter().map(|o| o.steps as f64).sum::<f64>() / count,
        success_rate: outcomes.iter().filter(|o| o.success()).count() as f64 / count,
    }
}
