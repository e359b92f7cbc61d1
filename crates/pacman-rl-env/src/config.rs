//! Environment configuration: grid parameters, reward constants and fixed
//! layouts

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use pacman_rl_core::{GridPos, RLError, Result};

/// Smallest supported grid; the 4x4 zone quantisation needs at least this
pub const MIN_GRID_SIZE: usize = 4;
/// Largest supported grid
pub const MAX_GRID_SIZE: usize = 256;

/// Scripted ghost movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GhostBehavior {
    /// Uniformly random direction every step
    #[default]
    Random,
    /// Step toward the agent when sharing a row or column, random otherwise
    Chase,
}

impl fmt::Display for GhostBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Random => "random",
            Self::Chase => "chase",
        })
    }
}

impl FromStr for GhostBehavior {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(Self::Random),
            "chase" => Ok(Self::Chase),
            other => Err(RLError::InvalidConfig(format!(
                "unknown ghost behavior '{other}' (expected random or chase)"
            ))),
        }
    }
}

/// Reward shaping constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Penalty for bumping into a wall or the grid edge
    pub blocked_move_penalty: f64,
    /// Bonus for the first visit of a cell
    pub new_cell_bonus: f64,
    /// Per-visit penalty factor for revisits
    pub revisit_penalty: f64,
    /// Penalty for an a,b,a,b back-and-forth
    pub oscillation_penalty: f64,
    /// Penalty for an a,a,b,b double-back
    pub double_back_penalty: f64,
    /// Penalty when the last cells fit inside a 3x3 box
    pub stuck_penalty: f64,
    /// Bonus when the nearest coin got closer
    pub approach_bonus: f64,
    /// Base coin reward
    pub coin_reward: f64,
    /// Extra coin reward scaled by the collected fraction
    pub coin_progress_bonus: f64,
    /// Power-up reward
    pub powerup_reward: f64,
    /// Invincibility granted by a power-up, in steps
    pub invincibility_steps: u32,
    /// Milestone bonuses at 25 %, 50 % and 75 % of coins
    pub milestone_bonuses: [f64; 3],
    /// Reward for eating a ghost
    pub ghost_eaten_reward: f64,
    /// Reward assigned (not added) on losing a life
    pub life_lost_reward: f64,
    /// Bonus for clearing every coin
    pub all_coins_bonus: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            blocked_move_penalty: 0.5,
            new_cell_bonus: 1.0,
            revisit_penalty: 0.2,
            oscillation_penalty: 1.0,
            double_back_penalty: 0.5,
            stuck_penalty: 0.3,
            approach_bonus: 0.1,
            coin_reward: 10.0,
            coin_progress_bonus: 5.0,
            powerup_reward: 20.0,
            invincibility_steps: 10,
            milestone_bonuses: [15.0, 25.0, 35.0],
            ghost_eaten_reward: 50.0,
            life_lost_reward: -10.0,
            all_coins_bonus: 100.0,
        }
    }
}

/// Configuration for the grid environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Side length of the square grid
    pub grid_size: usize,
    /// Number of ghosts, clamped to 1..=5
    pub num_ghosts: usize,
    /// Ghost movement script
    pub ghost_behavior: GhostBehavior,
    /// Desired coins per row (total = `coins_per_row * grid_size`)
    pub coins_per_row: usize,
    /// Lives per episode, clamped to 1..=10
    pub num_lives: u32,
    /// Place 2-3 power-ups per episode
    pub enable_powerups: bool,
    /// Random seed
    pub seed: Option<u64>,
    /// Reward constants
    pub rewards: RewardConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            num_ghosts: 3,
            ghost_behavior: GhostBehavior::Random,
            coins_per_row: 10,
            num_lives: 3,
            enable_powerups: true,
            seed: None,
            rewards: RewardConfig::default(),
        }
    }
}

impl GridConfig {
    /// Check the grid size and clamp counts into their supported ranges
    pub fn validated(mut self) -> Result<Self> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(RLError::InvalidConfig(format!(
                "grid_size {} outside {MIN_GRID_SIZE}..={MAX_GRID_SIZE}",
                self.grid_size
            )));
        }
        self.num_ghosts = self.num_ghosts.clamp(1, 5);
        self.num_lives = self.num_lives.clamp(1, 10);
        Ok(self)
    }
}

/// A hand-built board that every `reset()` restores verbatim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Impassable cells
    pub walls: Vec<GridPos>,
    /// Agent spawn
    pub agent_start: GridPos,
    /// Ghost spawns, in order
    pub ghosts: Vec<GridPos>,
    /// Coin cells
    pub coins: Vec<GridPos>,
    /// Power-up cells
    pub powerups: Vec<GridPos>,
}

impl Layout {
    /// Check bounds, ghost count and that no two entities share a cell
    pub fn validate(&self, grid_size: usize) -> Result<()> {
        let size = i32::try_from(grid_size)
            .map_err(|_| RLError::InvalidConfig(format!("grid_size {grid_size} too large")))?;
        if self.ghosts.is_empty() || self.ghosts.len() > 5 {
            return Err(RLError::InvalidConfig(format!(
                "layout needs 1..=5 ghosts, got {}",
                self.ghosts.len()
            )));
        }

        let mut occupied = BTreeSet::new();
        let cells = self
            .walls
            .iter()
            .chain(std::iter::once(&self.agent_start))
            .chain(&self.ghosts)
            .chain(&self.coins)
            .chain(&self.powerups);
        for &cell in cells {
            if !cell.in_bounds(size) {
                return Err(RLError::InvalidConfig(format!(
                    "layout cell {cell} outside {grid_size}x{grid_size} grid"
                )));
            }
            if !occupied.insert(cell) {
                return Err(RLError::InvalidConfig(format!(
                    "layout cell {cell} is used twice"
                )));
            }
        }
        Ok(())
    }
}
