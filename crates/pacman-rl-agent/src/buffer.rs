//! Experience replay buffer

use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};
use std::collections::VecDeque;

use pacman_rl_core::Transition;

/// Default number of transitions kept
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Bounded FIFO of transitions with reward-prioritized sampling
#[derive(Debug, Clone)]
pub struct ReplayBuffer<S> {
    /// Buffer storage
    buffer: VecDeque<Transition<S>>,
    /// Maximum capacity
    capacity: usize,
}

impl<S: Clone> ReplayBuffer<S> {
    /// Create a new replay buffer
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    /// Add a transition, evicting the oldest one when full
    pub fn push(&mut self, transition: Transition<S>) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Draw `batch_size` transitions with replacement, weighted by
    /// `|reward| + 0.1`
    ///
    /// Returns `None` while fewer than `batch_size` transitions are stored.
    pub fn sample_prioritized<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Option<Vec<&Transition<S>>> {
        if batch_size == 0 || self.buffer.len() < batch_size {
            return None;
        }

        let weights = self.buffer.iter().map(Transition::priority);
        let dist = match WeightedIndex::new(weights) {
            Ok(dist) => dist,
            Err(e) => {
                tracing::warn!(error = %e, "cannot weight replay buffer; skipping replay");
                return None;
            }
        };

        Some(
            (0..batch_size)
                .map(|_| &self.buffer[dist.sample(rng)])
                .collect(),
        )
    }

    /// Get the current size of the buffer
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Maximum number of stored transitions
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl<S: Clone> Default for ReplayBuffer<S> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
