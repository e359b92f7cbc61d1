//! Grid positions shared by the simulator and its observers

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Action;

/// A cell on the square grid, `0 <= x, y < grid_size`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPos {
    /// Column
    pub x: i32,
    /// Row, growing downward
    pub y: i32,
}

impl GridPos {
    /// Create a new position
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`
    #[must_use]
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Neighbouring cell in the direction of `action`, unchecked
    #[must_use]
    pub fn offset(self, action: Action) -> Self {
        let (dx, dy) = action.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Whether the position lies on a `size` x `size` grid
    #[must_use]
    pub fn in_bounds(self, size: i32) -> bool {
        (0..size).contains(&self.x) && (0..size).contains(&self.y)
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan() {
        assert_eq!(GridPos::new(0, 0).manhattan(GridPos::new(3, 4)), 7);
        assert_eq!(GridPos::new(5, 1).manhattan(GridPos::new(2, 1)), 3);
    }

    #[test]
    fn test_offset_and_bounds() {
        let origin = GridPos::new(0, 0);
        assert!(!origin.offset(Action::Up).in_bounds(5));
        assert!(origin.offset(Action::Right).in_bounds(5));
        assert_eq!(origin.offset(Action::Down), GridPos::new(0, 1));
    }
}
