//! Decaying hyperparameters

use serde::{Deserialize, Serialize};

/// Multiplicative decay with a floor
///
/// Unlike a closed-form schedule the value is stateful, so it can be boosted
/// back up mid-training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialDecay {
    /// Current value
    pub value: f64,
    /// Floor
    pub min_value: f64,
    /// Factor applied per step
    pub decay_rate: f64,
}

impl ExponentialDecay {
    /// Create a new schedule
    #[must_use]
    pub fn new(value: f64, min_value: f64, decay_rate: f64) -> Self {
        Self {
            value,
            min_value,
            decay_rate,
        }
    }

    /// Current value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Apply one decay step
    pub fn step(&mut self) -> f64 {
        self.value = (self.value * self.decay_rate).max(self.min_value);
        self.value
    }

    /// Multiply by `factor`, never exceeding `cap`
    pub fn boost(&mut self, factor: f64, cap: f64) -> f64 {
        self.value = (self.value * factor).min(cap);
        self.value
    }
}
