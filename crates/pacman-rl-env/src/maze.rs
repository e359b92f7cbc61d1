//! Procedural maze generation
//!
//! The generator lays a cross of walls through the grid midpoints, sprinkles
//! short segments into the larger quadrants, scatters single-cell obstacles up
//! to a target density and finally repairs corner-to-corner connectivity by
//! knocking out random walls. The repair budget is small, so connectivity is
//! best-effort: a layout that stays disconnected is kept and logged.

use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::{BTreeSet, VecDeque};

use pacman_rl_core::{Action, GridPos, ACTIONS};

/// Wall layout of a square grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    size: i32,
    walls: BTreeSet<GridPos>,
}

impl Maze {
    /// A grid without walls
    #[must_use]
    pub fn empty(size: i32) -> Self {
        Self {
            size,
            walls: BTreeSet::new(),
        }
    }

    /// A grid with the given walls; out-of-bounds cells are dropped
    pub fn from_walls(size: i32, walls: impl IntoIterator<Item = GridPos>) -> Self {
        Self {
            size,
            walls: walls.into_iter().filter(|w| w.in_bounds(size)).collect(),
        }
    }

    /// Side length of the grid
    #[must_use]
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Wall cells in sorted order
    #[must_use]
    pub fn walls(&self) -> &BTreeSet<GridPos> {
        &self.walls
    }

    /// Whether `pos` is a wall
    #[must_use]
    pub fn is_wall(&self, pos: GridPos) -> bool {
        self.walls.contains(&pos)
    }

    /// Whether `pos` is inside the grid and not a wall
    #[must_use]
    pub fn is_open(&self, pos: GridPos) -> bool {
        pos.in_bounds(self.size) && !self.is_wall(pos)
    }

    /// Attempt a move; returns the resulting cell and whether the move was
    /// rejected (edge or wall), in which case the cell is unchanged
    #[must_use]
    pub fn try_move(&self, pos: GridPos, action: Action) -> (GridPos, bool) {
        let next = pos.offset(action);
        if self.is_open(next) {
            (next, false)
        } else {
            (pos, true)
        }
    }

    /// Every open cell reachable from `start` over 4-connected open cells
    #[must_use]
    pub fn reachable_from(&self, start: GridPos) -> BTreeSet<GridPos> {
        let mut visited = BTreeSet::new();
        if !self.is_open(start) {
            return visited;
        }

        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(pos) = queue.pop_front() {
            for action in ACTIONS {
                let next = pos.offset(action);
                if self.is_open(next) && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    /// Breadth-first search for a path between two cells
    #[must_use]
    pub fn has_path(&self, start: GridPos, end: GridPos) -> bool {
        if !self.is_open(end) {
            return false;
        }
        self.reachable_from(start).contains(&end)
    }

    /// Whether the top-left and bottom-right corners are connected
    #[must_use]
    pub fn corners_connected(&self) -> bool {
        let far = self.size - 1;
        self.has_path(GridPos::new(0, 0), GridPos::new(far, far))
    }
}

/// Builds wall layouts
#[derive(Debug, Clone)]
pub struct MazeGenerator {
    /// Fraction of cells the scattered obstacles fill up to
    pub wall_density: f64,
    /// Random walls removed at most while repairing connectivity
    pub max_repairs: usize,
}

impl Default for MazeGenerator {
    fn default() -> Self {
        Self {
            wall_density: 0.12,
            max_repairs: 5,
        }
    }
}

impl MazeGenerator {
    /// Generate a layout for a `size` x `size` grid
    pub fn generate<R: Rng + ?Sized>(&self, size: i32, rng: &mut R) -> Maze {
        let mut maze = Maze::empty(size);
        if size < 3 {
            return maze;
        }

        Self::add_cross(&mut maze, rng);

        let mid = size / 2;
        for (x_start, x_end, y_start, y_end) in [
            (0, mid, 0, mid),
            (mid + 1, size, 0, mid),
            (0, mid, mid + 1, size),
            (mid + 1, size, mid + 1, size),
        ] {
            Self::add_quadrant_segments(&mut maze, (x_start, x_end), (y_start, y_end), rng);
        }

        // Truncation is intended: the density is a soft target
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let target = (f64::from(size * size) * self.wall_density) as usize;
        Self::scatter_obstacles(&mut maze, target, rng);

        self.repair_connectivity(&mut maze, rng);
        maze
    }

    /// Walls through both midlines, each arm leaving a gap of up to two cells
    fn add_cross<R: Rng + ?Sized>(maze: &mut Maze, rng: &mut R) {
        let size = maze.size;
        let mid = size / 2;

        let gap_y = rng.gen_range(1..=size - 2);
        for y in 1..size - 1 {
            if y != gap_y && y != gap_y + 1 {
                maze.walls.insert(GridPos::new(mid, y));
            }
        }

        let gap_x = rng.gen_range(1..=size - 2);
        for x in 1..size - 1 {
            if x != gap_x && x != gap_x + 1 {
                maze.walls.insert(GridPos::new(x, mid));
            }
        }
    }

    /// One or two short segments strictly inside a quadrant of at least 5x5
    fn add_quadrant_segments<R: Rng + ?Sized>(
        maze: &mut Maze,
        (x_start, x_end): (i32, i32),
        (y_start, y_end): (i32, i32),
        rng: &mut R,
    ) {
        let width = x_end - x_start;
        let height = y_end - y_start;
        if width < 5 || height < 5 {
            return;
        }

        for _ in 0..rng.gen_range(1..=2) {
            let max_length = 3.min(width - 3).min(height - 3);
            if max_length < 2 {
                continue;
            }
            let length = rng.gen_range(2..=max_length);

            let (dx, dy, max_x, max_y) = if rng.gen_bool(0.5) {
                (1, 0, x_end - length - 1, y_end - 2)
            } else {
                (0, 1, x_end - 2, y_end - length - 1)
            };
            let (min_x, min_y) = (x_start + 1, y_start + 1);
            if max_x < min_x || max_y < min_y {
                continue;
            }

            let x = rng.gen_range(min_x..=max_x);
            let y = rng.gen_range(min_y..=max_y);
            for i in 0..length {
                maze.walls.insert(GridPos::new(x + i * dx, y + i * dy));
            }
        }
    }

    /// Single interior obstacles until `target` walls exist; cells that would
    /// touch three or more walls are skipped
    fn scatter_obstacles<R: Rng + ?Sized>(maze: &mut Maze, target: usize, rng: &mut R) {
        let size = maze.size;
        let max_attempts = target * 3;
        let mut attempts = 0;

        while maze.walls.len() < target && attempts < max_attempts {
            attempts += 1;
            let pos = GridPos::new(rng.gen_range(1..=size - 2), rng.gen_range(1..=size - 2));
            if maze.is_wall(pos) {
                continue;
            }
            let adjacent = ACTIONS
                .iter()
                .filter(|&&action| maze.is_wall(pos.offset(action)))
                .count();
            if adjacent < 3 {
                maze.walls.insert(pos);
            }
        }
    }

    fn repair_connectivity<R: Rng + ?Sized>(&self, maze: &mut Maze, rng: &mut R) {
        let mut removals = 0;
        while !maze.corners_connected() && removals < self.max_repairs {
            let Some(&wall) = maze.walls.iter().choose(rng) else {
                break;
            };
            maze.walls.remove(&wall);
            removals += 1;
        }

        if removals > 0 {
            tracing::debug!(removals, "removed walls to reconnect corners");
        }
        if !maze.corners_connected() {
            tracing::warn!(
                size = maze.size,
                walls = maze.walls.len(),
                "maze corners still disconnected after repair budget; keeping layout"
            );
        }
    }
}
