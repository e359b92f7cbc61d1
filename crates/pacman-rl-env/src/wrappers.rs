//! Environment wrappers

use pacman_rl_core::{Action, EndReason, Environment, Result, Step};

/// Time limit wrapper
///
/// Marks the step that reaches `max_steps` as truncated with reason
/// `step_limit` unless the episode ended on its own.
pub struct TimeLimit<E> {
    /// Inner environment
    pub env: E,
    /// Maximum steps
    pub max_steps: usize,
    /// Current step count
    pub steps: usize,
}

impl<E> TimeLimit<E> {
    /// Create a new time limit wrapper
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            steps: 0,
        }
    }

    /// Unwrap the inner environment
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E> Environment for TimeLimit<E>
where
    E: Environment,
{
    type Observation = E::Observation;
    type State = E::State;

    fn reset(&mut self) -> Result<Self::Observation> {
        self.steps = 0;
        self.env.reset()
    }

    fn step(&mut self, action: Action) -> Result<Step<Self::Observation>> {
        self.steps += 1;
        let mut step = self.env.step(action)?;

        if self.steps >= self.max_steps && !step.done {
            step.truncated = true;
            step.info.reason = Some(EndReason::StepLimit);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridConfig, GridEnv, GridPos, Layout};

    #[test]
    fn test_time_limit_truncates() {
        let config = GridConfig {
            grid_size: 6,
            seed: Some(4),
            ..GridConfig::default()
        };
        let layout = Layout {
            agent_start: GridPos::new(0, 0),
            ghosts: vec![GridPos::new(5, 5)],
            coins: vec![GridPos::new(5, 0)],
            ..Layout::default()
        };
        let mut env = TimeLimit::new(GridEnv::with_layout(config, layout).unwrap(), 3);
        env.reset().unwrap();

        // Bumping the top edge never reaches the coin
        for _ in 0..2 {
            let step = env.step(Action::Up).unwrap();
            assert!(!step.is_last());
        }
        let step = env.step(Action::Up).unwrap();
        assert!(step.truncated);
        assert!(!step.done);
        assert_eq!(step.info.reason, Some(EndReason::StepLimit));

        env.reset().unwrap();
        assert_eq!(env.steps, 0);
    }
}
