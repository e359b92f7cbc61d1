//! JSON model files

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use pacman_rl_core::{Action, Result};

/// Learning-rate floor assumed when a model file omits it
pub const DEFAULT_ALPHA_MIN: f64 = 0.05;
/// Learning-rate decay assumed when a model file omits it
pub const DEFAULT_ALPHA_DECAY: f64 = 0.9998;
/// Exploration floor assumed when a model file omits it
pub const DEFAULT_EPSILON_MIN: f64 = 0.01;
/// Exploration never decays below this, whatever the model file says
pub const EPSILON_FLOOR: f64 = 0.05;

/// On-disk form of a Q-learning agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAgent {
    /// Action set the table was trained on
    pub actions: Vec<Action>,
    /// Current learning rate
    pub alpha: f64,
    /// Learning rate at construction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_initial: Option<f64>,
    /// Learning-rate floor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_min: Option<f64>,
    /// Learning-rate decay per episode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_decay: Option<f64>,
    /// Discount factor
    pub gamma: f64,
    /// Current exploration rate
    pub epsilon: f64,
    /// Exploration floor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsilon_min: Option<f64>,
    /// Exploration decay per episode
    pub epsilon_decay: f64,
    /// Episodes trained so far
    pub episodes_trained: usize,
    /// Regression window, oldest first
    #[serde(default)]
    pub recent_rewards: Vec<f64>,
    /// Best recent mean; `null` when none was recorded
    #[serde(default)]
    pub best_average_reward: Option<f64>,
    /// `serde_json((state, action))` to value
    pub q_table: IndexMap<String, f64>,
}

/// Write `value` as pretty JSON; the file is flushed and closed before
/// returning
pub async fn write_json<T: Serialize + Sync>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(&json).await?;
    file.flush().await?;
    Ok(())
}

/// Read a JSON file into `T`
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_fall_back() {
        let json = r#"{
            "actions": ["up", "down", "left", "right"],
            "alpha": 0.08,
            "gamma": 0.9,
            "epsilon": 0.2,
            "epsilon_decay": 0.995,
            "episodes_trained": 12,
            "q_table": {}
        }"#;
        let saved: SavedAgent = serde_json::from_str(json).unwrap();
        assert_eq!(saved.alpha_initial, None);
        assert_eq!(saved.epsilon_min, None);
        assert!(saved.recent_rewards.is_empty());
        assert_eq!(saved.best_average_reward, None);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join(format!("missing-{}.json", uuid::Uuid::new_v4()));
        let err = read_json::<SavedAgent>(&path).await.unwrap_err();
        assert!(matches!(err, pacman_rl_core::RLError::Io(_)));
    }
}
