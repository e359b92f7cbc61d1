//! Action representations and the closed action set

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RLError;

/// One of the four moves available to the agent (and to the ghosts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Decrease `y`
    Up,
    /// Increase `y`
    Down,
    /// Decrease `x`
    Left,
    /// Increase `x`
    Right,
}

/// The fixed, ordered action set
pub const ACTIONS: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

impl Action {
    /// Grid delta `(dx, dy)` of this move
    #[must_use]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// The move that undoes this one
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Whether `other` points the opposite way
    #[must_use]
    pub fn is_opposite(self, other: Self) -> bool {
        self.opposite() == other
    }

    /// Position of this action in [`ACTIONS`]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }

    /// Lowercase name, as used on the wire
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Sample a uniformly random action
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *ACTIONS.choose(rng).unwrap_or(&Self::Up)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(RLError::InvalidAction(format!(
                "'{other}' (expected one of up, down, left, right)"
            ))),
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = RLError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        ACTIONS
            .get(index)
            .copied()
            .ok_or_else(|| RLError::InvalidAction(format!("index {index} (expected 0..4)")))
    }
}

/// Coarse heading toward something on the grid, `None` when there is
/// nothing to point at or it is underfoot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Target lies above
    Up,
    /// Target lies below
    Down,
    /// Target lies to the left
    Left,
    /// Target lies to the right
    Right,
    /// No target, or distance zero
    None,
}

impl From<Action> for Direction {
    fn from(action: Action) -> Self {
        match action {
            Action::Up => Self::Up,
            Action::Down => Self::Down,
            Action::Left => Self::Left,
            Action::Right => Self::Right,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::None => "none",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_rejects_unknown_action() {
        assert_eq!("left".parse::<Action>().unwrap(), Action::Left);
        let err = "jump".parse::<Action>().unwrap_err();
        assert!(matches!(err, RLError::InvalidAction(_)));
        assert!(Action::try_from(4).is_err());
        assert_eq!(Action::try_from(3).unwrap(), Action::Right);
    }

    #[test]
    fn test_opposites() {
        for action in ACTIONS {
            assert!(action.is_opposite(action.opposite()));
            assert!(!action.is_opposite(action));
            let (dx, dy) = action.delta();
            let (ox, oy) = action.opposite().delta();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn test_index_matches_action_order() {
        for (i, action) in ACTIONS.iter().enumerate() {
            assert_eq!(action.index(), i);
        }
    }

    #[test]
    fn test_sample_covers_all_actions() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[Action::sample(&mut rng).index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Action::Down).unwrap(), "\"down\"");
        assert_eq!(serde_json::to_string(&Direction::None).unwrap(), "\"none\"");
    }
}
