//! Performance regression detection over recent episode rewards

use std::collections::VecDeque;

/// Outcome of recording one episode reward
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trend {
    /// Window not full yet
    Warming,
    /// Recent half fell below `threshold` times the older half
    Regressed {
        /// Mean of the newer half
        recent: f64,
        /// Mean of the older half
        previous: f64,
    },
    /// No regression
    Steady {
        /// Mean of the newer half
        recent: f64,
    },
}

/// Compares the newer and older halves of a sliding reward window
#[derive(Debug, Clone)]
pub struct RegressionMonitor {
    rewards: VecDeque<f64>,
    window: usize,
    threshold: f64,
    best_average: Option<f64>,
}

impl Default for RegressionMonitor {
    fn default() -> Self {
        Self::new(50, 0.85)
    }
}

impl RegressionMonitor {
    /// Window of `window` rewards (rounded up to even), regression below
    /// `threshold` times the older mean
    #[must_use]
    pub fn new(window: usize, threshold: f64) -> Self {
        let window = (window.max(2) + 1) & !1;
        Self {
            rewards: VecDeque::with_capacity(window),
            window,
            threshold,
            best_average: None,
        }
    }

    /// Record an episode reward and classify the trend
    pub fn record(&mut self, reward: f64) -> Trend {
        if self.rewards.len() == self.window {
            self.rewards.pop_front();
        }
        self.rewards.push_back(reward);
        if self.rewards.len() < self.window {
            return Trend::Warming;
        }

        let half = self.window / 2;
        let previous = mean(self.rewards.iter().take(half));
        let recent = mean(self.rewards.iter().skip(half));

        if recent < previous * self.threshold {
            Trend::Regressed { recent, previous }
        } else {
            self.best_average = Some(self.best_average.map_or(recent, |best| best.max(recent)));
            Trend::Steady { recent }
        }
    }

    /// Best newer-half mean seen without a regression
    #[must_use]
    pub fn best_average(&self) -> Option<f64> {
        self.best_average
    }

    /// Rewards in the window, oldest first
    pub fn rewards(&self) -> impl Iterator<Item = f64> + '_ {
        self.rewards.iter().copied()
    }

    /// Replace the window and best mean, e.g. after loading a model
    pub fn restore(&mut self, rewards: impl IntoIterator<Item = f64>, best_average: Option<f64>) {
        self.rewards.clear();
        for reward in rewards {
            if self.rewards.len() == self.window {
                self.rewards.pop_front();
            }
            self.rewards.push_back(reward);
        }
        self.best_average = best_average;
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
