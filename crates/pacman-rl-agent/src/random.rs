//! Random agent for baseline comparisons

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::path::Path;

use pacman_rl_core::{Action, Agent, RLError, Result};

use crate::persistence;

/// Random agent that selects actions uniformly at random
pub struct RandomAgent<S> {
    rng: StdRng,
    _state: PhantomData<fn(&S)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedRandomAgent {
    agent: String,
}

impl<S> RandomAgent<S> {
    /// Create a new random agent
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
            _state: PhantomData,
        }
    }
}

#[async_trait]
impl<S: Send + Sync> Agent for RandomAgent<S> {
    type State = S;

    fn name(&self) -> &str {
        "random"
    }

    fn choose_action(&mut self, _state: &S, _explore: bool) -> Action {
        Action::sample(&mut self.rng)
    }

    async fn save(&self, path: &Path) -> Result<()> {
        let saved = SavedRandomAgent {
            agent: self.name().to_string(),
        };
        persistence::write_json(path, &saved).await
    }

    async fn load(&mut self, path: &Path) -> Result<()> {
        let saved: SavedRandomAgent = persistence::read_json(path).await?;
        if saved.agent != self.name() {
            return Err(RLError::Persistence(format!(
                "expected a random agent file, found '{}'",
                saved.agent
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacman_rl_core::AgentStats;

    #[test]
    fn test_uses_every_action() {
        let mut agent: RandomAgent<()> = RandomAgent::new(Some(2));
        let picked: std::collections::HashSet<Action> =
            (0..100).map(|_| agent.choose_action(&(), false)).collect();
        assert_eq!(picked.len(), 4);
    }

    #[test]
    fn test_learning_hooks_are_noops() {
        let mut agent: RandomAgent<u8> = RandomAgent::new(Some(2));
        agent.update(&0, Action::Up, 5.0, &1, false);
        agent.decay_epsilon(5.0);
        agent.replay_experience(1);
        assert_eq!(agent.stats(), AgentStats::default());
    }

    #[tokio::test]
    async fn test_save_load() {
        let path = std::env::temp_dir().join(format!("random-{}.json", uuid::Uuid::new_v4()));
        let agent: RandomAgent<u8> = RandomAgent::new(None);
        agent.save(&path).await.unwrap();
        let mut other: RandomAgent<u8> = RandomAgent::new(None);
        other.load(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
