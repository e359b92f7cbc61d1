//! State abstraction
//!
//! The tabular learner never sees raw coordinates. Each step the episode state
//! is compressed into a handful of small discrete features, giving roughly
//! 4 x 4 x 2 x 5 x 5 x 2 x 5 distinct keys regardless of grid size.

use serde::{Deserialize, Serialize};

use pacman_rl_core::{Direction, GridPos};

use crate::grid::EpisodeState;

/// Number of zones per axis
const ZONES: i32 = 4;
/// Ghosts this close (Manhattan) put the agent in danger
const DANGER_RADIUS: u32 = 2;

/// The compressed state the agent reasons over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbstractState {
    /// Column zone, `0..=3`
    pub zone_x: u8,
    /// Row zone, `0..=3`
    pub zone_y: u8,
    /// Nearest ghost within two cells while not invincible
    pub danger: bool,
    /// Direction of the current objective
    pub target: Direction,
    /// Collected coin fraction in quarters, `0..=4`
    pub progress: u8,
    /// Whether an invincibility timer is running
    pub invincible: bool,
    /// Direction of the nearest ghost (`None` while invincible)
    pub ghost: Direction,
}

impl AbstractState {
    /// Abstract the given episode on a `grid_size` grid
    #[must_use]
    pub fn from_episode(episode: &EpisodeState, grid_size: i32) -> Self {
        let agent = episode.agent;
        let invincible = episode.invincibility_timer > 0;

        let danger = !invincible
            && episode
                .ghosts
                .iter()
                .map(|ghost| agent.manhattan(*ghost))
                .min()
                .is_some_and(|distance| distance <= DANGER_RADIUS);

        let target = if danger && !episode.powerups.is_empty() {
            nearest_direction(agent, episode.powerups.iter().copied())
        } else {
            nearest_direction(agent, episode.coins.iter().copied())
        };

        let ghost = if invincible {
            Direction::None
        } else {
            nearest_direction(agent, episode.ghosts.iter().copied())
        };

        Self {
            zone_x: zone(agent.x, grid_size),
            zone_y: zone(agent.y, grid_size),
            danger,
            target,
            progress: progress_bucket(episode.coins_collected, episode.initial_coins),
            invincible,
            ghost,
        }
    }
}

/// Direction from `from` toward the Manhattan-nearest candidate
///
/// The first candidate wins distance ties. The axis with the larger offset
/// decides the direction, horizontal on equal offsets; `None` when there are
/// no candidates or the nearest one sits on `from`.
pub fn nearest_direction(from: GridPos, candidates: impl IntoIterator<Item = GridPos>) -> Direction {
    let Some(nearest) = candidates
        .into_iter()
        .min_by_key(|candidate| from.manhattan(*candidate))
    else {
        return Direction::None;
    };

    let dx = nearest.x - from.x;
    let dy = nearest.y - from.y;
    if dy.abs() > dx.abs() {
        if dy > 0 {
            Direction::Down
        } else {
            Direction::Up
        }
    } else if dx > 0 {
        Direction::Right
    } else if dx < 0 {
        Direction::Left
    } else {
        Direction::None
    }
}

fn zone(coord: i32, grid_size: i32) -> u8 {
    let width = (grid_size / ZONES).max(1);
    // Clamped to 0..=3 so the cast is lossless
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let zone = (coord / width).clamp(0, ZONES - 1) as u8;
    zone
}

fn progress_bucket(collected: usize, initial: usize) -> u8 {
    if initial == 0 {
        return 4;
    }
    // floor(collected / initial * 4), done in integers
    u8::try_from((collected * 4 / initial).min(4)).unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_direction_axis_priority() {
        let from = GridPos::new(2, 2);
        assert_eq!(nearest_direction(from, [GridPos::new(5, 3)]), Direction::Right);
        assert_eq!(nearest_direction(from, [GridPos::new(1, 6)]), Direction::Down);
        assert_eq!(nearest_direction(from, [GridPos::new(2, 0)]), Direction::Up);
        // Equal offsets go horizontal
        assert_eq!(nearest_direction(from, [GridPos::new(0, 0)]), Direction::Left);
        assert_eq!(nearest_direction(from, [GridPos::new(2, 2)]), Direction::None);
        assert_eq!(nearest_direction(from, []), Direction::None);
    }

    #[test]
    fn test_nearest_direction_first_found_on_ties() {
        let from = GridPos::new(2, 2);
        let candidates = [GridPos::new(2, 0), GridPos::new(4, 2)];
        assert_eq!(nearest_direction(from, candidates), Direction::Up);
        let reversed = [GridPos::new(4, 2), GridPos::new(2, 0)];
        assert_eq!(nearest_direction(from, reversed), Direction::Right);
    }

    #[test]
    fn test_zone_quantisation() {
        assert_eq!(zone(0, 10), 0);
        assert_eq!(zone(2, 10), 1);
        assert_eq!(zone(7, 10), 3);
        assert_eq!(zone(9, 10), 3);
        assert_eq!(zone(3, 4), 3);
        assert_eq!(zone(4, 5), 3);
    }

    #[test]
    fn test_progress_bucket() {
        assert_eq!(progress_bucket(0, 10), 0);
        assert_eq!(progress_bucket(2, 10), 0);
        assert_eq!(progress_bucket(3, 10), 1);
        assert_eq!(progress_bucket(5, 10), 2);
        assert_eq!(progress_bucket(10, 10), 4);
        assert_eq!(progress_bucket(0, 0), 4);
    }

    #[test]
    fn test_states_order_by_field() {
        let base = AbstractState {
            zone_x: 1,
            zone_y: 2,
            danger: false,
            target: Direction::Up,
            progress: 0,
            invincible: false,
            ghost: Direction::None,
        };
        let toward_right = AbstractState {
            target: Direction::Right,
            ..base
        };
        let next_zone = AbstractState { zone_x: 2, ..base };

        let keys: std::collections::BTreeSet<AbstractState> =
            [next_zone, toward_right, base, base].into_iter().collect();
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec![base, toward_right, next_zone]);
        assert!(Direction::Up < Direction::Right);
    }
}
