//! Tabular action-value storage

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::Hash;

use pacman_rl_core::{Action, RLError, Result, ACTIONS};

/// Bounds a state must satisfy to key the value table
pub trait StateKey: Clone + Eq + Hash + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> StateKey for T where T: Clone + Eq + Hash + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Q(s, a) table with a default of 0.0 for unseen pairs
///
/// Entries keep their insertion order so exports are deterministic.
#[derive(Debug, Clone)]
pub struct QTable<S> {
    values: IndexMap<(S, Action), f64>,
}

impl<S: StateKey> Default for QTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateKey> QTable<S> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }

    /// Stored value, or 0.0 if the pair was never updated
    #[must_use]
    pub fn get(&self, state: &S, action: Action) -> f64 {
        // Keyed lookup needs an owned tuple
        self.values
            .get(&(state.clone(), action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Overwrite a value
    pub fn set(&mut self, state: S, action: Action, value: f64) {
        self.values.insert((state, action), value);
    }

    /// Values of every action in [`ACTIONS`] order
    #[must_use]
    pub fn action_values(&self, state: &S) -> [f64; 4] {
        ACTIONS.map(|action| self.get(state, action))
    }

    /// `max_a Q(state, a)`
    #[must_use]
    pub fn max_value(&self, state: &S) -> f64 {
        self.action_values(state)
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Every action tied for the maximum, in [`ACTIONS`] order
    #[must_use]
    pub fn best_actions(&self, state: &S) -> Vec<Action> {
        let values = self.action_values(state);
        let max = values.into_iter().fold(f64::NEG_INFINITY, f64::max);
        ACTIONS
            .into_iter()
            .zip(values)
            .filter(|&(_, value)| value == max)
            .map(|(action, _)| action)
            .collect()
    }

    /// First action reaching the maximum
    #[must_use]
    pub fn first_best(&self, state: &S) -> Action {
        self.best_actions(state)
            .first()
            .copied()
            .unwrap_or(ACTIONS[0])
    }

    /// One temporal-difference step toward `reward + gamma * max Q(next)`
    #[allow(clippy::too_many_arguments)]
    pub fn td_update(
        &mut self,
        state: &S,
        action: Action,
        reward: f64,
        next_state: &S,
        done: bool,
        alpha: f64,
        gamma: f64,
    ) {
        let old = self.get(state, action);
        let future = if done { 0.0 } else { self.max_value(next_state) };
        let updated = old + alpha * (reward + gamma * future - old);
        self.set(state.clone(), action, updated);
    }

    /// Number of stored pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been stored yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&S, Action, f64)> {
        self.values
            .iter()
            .map(|((state, action), value)| (state, *action, *value))
    }

    /// Export with each key encoded as the JSON of `(state, action)`
    pub fn to_keyed(&self) -> Result<IndexMap<String, f64>> {
        self.values
            .iter()
            .map(|(key, value)| Ok((serde_json::to_string(key)?, *value)))
            .collect()
    }

    /// Rebuild from [`QTable::to_keyed`] output
    pub fn from_keyed(keyed: IndexMap<String, f64>) -> Result<Self> {
        let values = keyed
            .into_iter()
            .map(|(key, value)| {
                let pair: (S, Action) = serde_json::from_str(&key).map_err(|e| {
                    RLError::Persistence(format!("malformed q-table key {key:?}: {e}"))
                })?;
                Ok((pair, value))
            })
            .collect::<Result<IndexMap<_, _>>>()?;
        Ok(Self { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_zero() {
        let table: QTable<(u8, u8)> = QTable::new();
        assert_eq!(table.get(&(1, 2), Action::Left), 0.0);
        assert_eq!(table.best_actions(&(1, 2)), ACTIONS.to_vec());
        assert_eq!(table.first_best(&(1, 2)), Action::Up);
        assert!(table.is_empty());
    }

    #[test]
    fn test_best_actions_reports_ties() {
        let mut table = QTable::new();
        table.set((0u8, 0u8), Action::Down, 2.0);
        table.set((0, 0), Action::Right, 2.0);
        table.set((0, 0), Action::Up, -1.0);
        assert_eq!(table.best_actions(&(0, 0)), vec![Action::Down, Action::Right]);
        assert_eq!(table.first_best(&(0, 0)), Action::Down);
        assert_eq!(table.max_value(&(0, 0)), 2.0);
    }

    #[test]
    fn test_td_update() {
        let mut table = QTable::new();
        table.set((1u8, 0u8), Action::Up, 5.0);
        table.td_update(&(0, 0), Action::Right, 1.0, &(1, 0), false, 0.5, 0.9);
        assert!((table.get(&(0, 0), Action::Right) - 2.75).abs() < 1e-12);

        table.td_update(&(0, 0), Action::Right, 1.0, &(1, 0), true, 1.0, 0.9);
        assert_eq!(table.get(&(0, 0), Action::Right), 1.0);
    }

    #[test]
    fn test_keyed_export_preserves_order() {
        let mut table = QTable::new();
        table.set((3u8, 1u8), Action::Left, 0.1);
        table.set((0, 0), Action::Up, -7.25);
        let keyed = table.to_keyed().unwrap();
        let keys: Vec<&String> = keyed.keys().collect();
        assert_eq!(keys, vec![r#"[[3,1],"left"]"#, r#"[[0,0],"up"]"#]);

        let restored: QTable<(u8, u8)> = QTable::from_keyed(keyed).unwrap();
        assert_eq!(restored.get(&(0, 0), Action::Up), -7.25);
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn test_malformed_key_is_rejected() {
        let mut keyed = IndexMap::new();
        keyed.insert("[[0,0],\"jump\"]".to_string(), 1.0);
        let err = QTable::<(u8, u8)>::from_keyed(keyed).unwrap_err();
        assert!(matches!(err, RLError::Persistence(_)));
    }
}
