// Settings file for pacmanctl: environment, agent and training loop

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use pacman_rl_agent::QLearningConfig;
use pacman_rl_env::GridConfig;

/// Training loop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Episodes to train
    pub episodes: usize,
    /// Step cap per episode
    pub max_steps: usize,
    /// Replay every this many episodes
    pub replay_interval: usize,
    /// Transitions per replay
    pub replay_batch: usize,
    /// Progress log every this many episodes
    pub log_interval: usize,
    /// Greedy episodes per evaluation
    pub eval_episodes: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            max_steps: 300,
            replay_interval: 5,
            replay_batch: 32,
            log_interval: 50,
            eval_episodes: 20,
        }
    }
}

/// Everything a settings file may contain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Environment parameters
    pub env: GridConfig,
    /// Agent hyperparameters
    pub agent: QLearningConfig,
    /// Training loop parameters
    pub training: TrainingConfig,
    /// Session seed; derives the environment and agent seeds unless they
    /// are set explicitly
    pub seed: Option<u64>,
}

impl Settings {
    /// Read settings from a JSON file, or defaults when no path is given
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Fill in component seeds from the session seed
    #[must_use]
    pub fn seeded(mut self) -> Self {
        if let Some(seed) = self.seed {
            self.env.seed.get_or_insert(seed);
            self.agent.seed.get_or_insert(seed.wrapping_add(1));
        }
        self
    }

    /// Reject loop parameters that would never make progress
    pub fn validate(&self) -> Result<()> {
        let training = &self.training;
        anyhow::ensure!(training.max_steps > 0, "max_steps must be positive");
        anyhow::ensure!(training.replay_interval > 0, "replay_interval must be positive");
        anyhow::ensure!(training.log_interval > 0, "log_interval must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"training": {"episodes": 10}, "seed": 4}"#).unwrap();
        assert_eq!(settings.training.episodes, 10);
        assert_eq!(settings.training.max_steps, 300);
        assert_eq!(settings.env, GridConfig::default());

        let seeded = settings.seeded();
        assert_eq!(seeded.env.seed, Some(4));
        assert_eq!(seeded.agent.seed, Some(5));
    }

    #[test]
    fn test_explicit_component_seed_wins() {
        let mut settings = Settings {
            seed: Some(1),
            ..Settings::default()
        };
        settings.env.seed = Some(99);
        let seeded = settings.seeded();
        assert_eq!(seeded.env.seed, Some(99));
        assert_eq!(seeded.agent.seed, Some(2));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut settings = Settings::default();
        settings.training.replay_interval = 0;
        assert!(settings.validate().is_err());
    }

    #[tokio::test]
    async fn test_missing_path_means_defaults() {
        assert_eq!(Settings::load(None).await.unwrap(), Settings::default());
    }
}
