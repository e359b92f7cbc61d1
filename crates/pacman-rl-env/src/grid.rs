//! The Pac-Man grid simulator

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

use pacman_rl_core::{
    Action, EndReason, Environment, GridPos, RLError, Result, Reward, Step, StepInfo,
};

use crate::abstraction::AbstractState;
use crate::config::{GhostBehavior, GridConfig, Layout, RewardConfig};
use crate::maze::{Maze, MazeGenerator};

/// Minimum spawn distance between a ghost and the agent or another ghost
const GHOST_SPAWN_DISTANCE: u32 = 3;
/// Actions remembered for oscillation detection
const ACTION_HISTORY: usize = 4;
/// Cells remembered for stuck detection
const CELL_HISTORY: usize = 10;
/// Bounding box side below which the agent counts as stuck
const STUCK_BOX: i32 = 3;

/// Unabstracted observation returned by `reset` and `step`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawState {
    /// Agent cell
    pub agent: GridPos,
    /// Ghost cells, in spawn order
    pub ghosts: Vec<GridPos>,
    /// Coins still on the board
    pub coins_remaining: usize,
}

/// Everything that changes during one episode
#[derive(Debug, Clone, Default)]
pub struct EpisodeState {
    /// Agent cell
    pub agent: GridPos,
    /// Respawn cell of the agent
    pub agent_start: GridPos,
    /// Ghost cells
    pub ghosts: Vec<GridPos>,
    /// Respawn cells of the ghosts, index-aligned with `ghosts`
    pub ghost_starts: Vec<GridPos>,
    /// Coins left
    pub coins: BTreeSet<GridPos>,
    /// Power-ups left
    pub powerups: BTreeSet<GridPos>,
    /// Coins placed at reset
    pub initial_coins: usize,
    /// Power-ups placed at reset
    pub initial_powerups: usize,
    /// Lives left
    pub lives: u32,
    /// Remaining invincible steps
    pub invincibility_timer: u32,
    /// Visits per cell, for exploration shaping
    pub visit_counts: HashMap<GridPos, u32>,
    /// Last actions, oldest first
    pub recent_actions: VecDeque<Action>,
    /// Last agent cells, oldest first
    pub recent_cells: VecDeque<GridPos>,
    /// Distance to the nearest coin at the previous step
    pub last_coin_distance: Option<u32>,
    /// 25 / 50 / 75 % milestones already paid out
    pub milestones: [bool; 3],
    /// Steps taken
    pub steps: usize,
    /// Coins picked up
    pub coins_collected: usize,
    /// Power-ups picked up
    pub powerups_collected: usize,
    /// Ghosts eaten while invincible
    pub ghosts_eaten: usize,
    /// Lives lost
    pub lives_lost: u32,
    /// Terminal reason once the episode is over
    pub finished: Option<EndReason>,
}

impl EpisodeState {
    fn new(
        agent_start: GridPos,
        ghost_starts: Vec<GridPos>,
        coins: BTreeSet<GridPos>,
        powerups: BTreeSet<GridPos>,
        lives: u32,
    ) -> Self {
        Self {
            agent: agent_start,
            agent_start,
            ghosts: ghost_starts.clone(),
            ghost_starts,
            initial_coins: coins.len(),
            initial_powerups: powerups.len(),
            coins,
            powerups,
            lives,
            ..Self::default()
        }
    }

    /// Raw view of the board
    #[must_use]
    pub fn raw(&self) -> RawState {
        RawState {
            agent: self.agent,
            ghosts: self.ghosts.clone(),
            coins_remaining: self.coins.len(),
        }
    }

    fn info(&self, reason: Option<EndReason>) -> StepInfo {
        StepInfo {
            reason,
            coins_collected: self.coins_collected,
            steps: self.steps,
            powerups_collected: self.powerups_collected,
            invincible: self.invincibility_timer > 0,
            invincibility_timer: self.invincibility_timer,
            ghosts_eaten: self.ghosts_eaten,
            lives_remaining: self.lives,
            lives_lost: self.lives_lost,
        }
    }

    fn respawn(&mut self) {
        self.agent = self.agent_start;
        self.ghosts.clone_from(&self.ghost_starts);
        self.invincibility_timer = 0;
    }
}

/// How entities are placed on every reset
#[derive(Debug, Clone)]
enum Setup {
    Random,
    Fixed(Layout),
}

/// Pac-Man grid world
///
/// Walls are generated once at construction; each `reset()` places fresh
/// entities on the same maze.
#[derive(Debug)]
pub struct GridEnv {
    config: GridConfig,
    size: i32,
    maze: Maze,
    setup: Setup,
    rng: StdRng,
    episode: EpisodeState,
}

impl GridEnv {
    /// Create an environment with a procedurally generated maze
    pub fn new(config: GridConfig) -> Result<Self> {
        let config = config.validated()?;
        let size = grid_dimension(config.grid_size)?;
        let mut rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let maze = MazeGenerator::default().generate(size, &mut rng);

        Self::build(config, size, maze, Setup::Random, rng)
    }

    /// Create an environment that restores `layout` on every reset
    pub fn with_layout(config: GridConfig, layout: Layout) -> Result<Self> {
        let config = config.validated()?;
        layout.validate(config.grid_size)?;
        let size = grid_dimension(config.grid_size)?;
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let maze = Maze::from_walls(size, layout.walls.iter().copied());

        Self::build(config, size, maze, Setup::Fixed(layout), rng)
    }

    fn build(config: GridConfig, size: i32, maze: Maze, setup: Setup, rng: StdRng) -> Result<Self> {
        tracing::debug!(
            grid_size = size,
            walls = maze.walls().len(),
            ghosts = config.num_ghosts,
            behavior = %config.ghost_behavior,
            "creating grid environment"
        );
        let mut env = Self {
            config,
            size,
            maze,
            setup,
            rng,
            episode: EpisodeState::default(),
        };
        env.reset()?;
        Ok(env)
    }

    /// Validated configuration
    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Side length of the grid
    #[must_use]
    pub fn grid_size(&self) -> i32 {
        self.size
    }

    /// Wall layout
    #[must_use]
    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    /// Current episode state
    #[must_use]
    pub fn episode(&self) -> &EpisodeState {
        &self.episode
    }

    /// Raw view of the board
    #[must_use]
    pub fn raw_state(&self) -> RawState {
        self.episode.raw()
    }

    /// Whether the current episode has ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.episode.finished.is_some()
    }

    fn spawn_random(&mut self) -> Result<EpisodeState> {
        let agent_start = GridPos::new(0, self.size - 1);
        let ghosts = self.place_ghosts(agent_start)?;

        let mut available: Vec<GridPos> = self
            .maze
            .reachable_from(agent_start)
            .into_iter()
            .filter(|cell| *cell != agent_start && !ghosts.contains(cell))
            .collect();

        let reserved = if self.config.enable_powerups {
            self.rng.gen_range(2..=3).min(available.len())
        } else {
            0
        };
        let wanted = self.config.coins_per_row.saturating_mul(self.config.grid_size);
        let coin_count = wanted.min(available.len() - reserved);

        let coins: BTreeSet<GridPos> = available
            .choose_multiple(&mut self.rng, coin_count)
            .copied()
            .collect();
        available.retain(|cell| !coins.contains(cell));

        // Farthest first; the stable sort keeps ties in cell order
        available.sort_by_key(|cell| std::cmp::Reverse(cell.manhattan(agent_start)));
        let powerups: BTreeSet<GridPos> = available.into_iter().take(reserved).collect();

        Ok(EpisodeState::new(
            agent_start,
            ghosts,
            coins,
            powerups,
            self.config.num_lives,
        ))
    }

    /// Ghost spawns at least three cells from the agent and from each other,
    /// relaxing the ghost spacing and then the agent spacing when the grid is
    /// too cramped
    fn place_ghosts(&mut self, agent: GridPos) -> Result<Vec<GridPos>> {
        let mut free: Vec<GridPos> = (0..self.size)
            .flat_map(|x| (0..self.size).map(move |y| GridPos::new(x, y)))
            .filter(|cell| self.maze.is_open(*cell) && *cell != agent)
            .collect();
        free.shuffle(&mut self.rng);

        let mut ghosts: Vec<GridPos> = Vec::with_capacity(self.config.num_ghosts);
        for _ in 0..self.config.num_ghosts {
            let unused = free.iter().copied().filter(|cell| !ghosts.contains(cell));
            let far_from_agent =
                |cell: &GridPos| cell.manhattan(agent) >= GHOST_SPAWN_DISTANCE;
            let spaced = |cell: &GridPos| {
                ghosts
                    .iter()
                    .all(|ghost| cell.manhattan(*ghost) >= GHOST_SPAWN_DISTANCE)
            };

            let pick = unused
                .clone()
                .find(|cell| far_from_agent(cell) && spaced(cell))
                .or_else(|| {
                    tracing::warn!("relaxing ghost spacing: grid too small");
                    unused.clone().find(far_from_agent)
                })
                .or_else(|| {
                    tracing::warn!("relaxing ghost distance to the agent: grid too small");
                    unused.clone().next()
                })
                .ok_or_else(|| {
                    RLError::InvalidConfig(format!(
                        "no free cell left for ghost {} of {}",
                        ghosts.len() + 1,
                        self.config.num_ghosts
                    ))
                })?;
            ghosts.push(pick);
        }
        Ok(ghosts)
    }

    fn spawn_fixed(layout: &Layout, lives: u32) -> EpisodeState {
        EpisodeState::new(
            layout.agent_start,
            layout.ghosts.clone(),
            layout.coins.iter().copied().collect(),
            layout.powerups.iter().copied().collect(),
            lives,
        )
    }

    fn move_ghosts(&mut self) {
        let agent = self.episode.agent;
        for ghost in &mut self.episode.ghosts {
            let chase = match self.config.ghost_behavior {
                GhostBehavior::Chase => chase_action(*ghost, agent),
                GhostBehavior::Random => None,
            };
            let action = chase.unwrap_or_else(|| Action::sample(&mut self.rng));
            *ghost = self.maze.try_move(*ghost, action).0;
        }
    }
}

impl Environment for GridEnv {
    type Observation = RawState;
    type State = AbstractState;

    fn reset(&mut self) -> Result<RawState> {
        let fixed = match &self.setup {
            Setup::Fixed(layout) => Some(Self::spawn_fixed(layout, self.config.num_lives)),
            Setup::Random => None,
        };
        self.episode = match fixed {
            Some(episode) => episode,
            None => self.spawn_random()?,
        };
        tracing::trace!(
            coins = self.episode.initial_coins,
            powerups = self.episode.initial_powerups,
            "episode reset"
        );
        Ok(self.episode.raw())
    }

    fn step(&mut self, action: Action) -> Result<Step<RawState>> {
        if let Some(reason) = self.episode.finished {
            return Err(RLError::EpisodeFinished {
                reason: reason.to_string(),
            });
        }

        let rewards = &self.config.rewards;
        let episode = &mut self.episode;
        episode.steps += 1;
        push_bounded(&mut episode.recent_actions, action, ACTION_HISTORY);

        // Agent movement and exploration shaping
        let (position, blocked) = self.maze.try_move(episode.agent, action);
        episode.agent = position;
        push_bounded(&mut episode.recent_cells, position, CELL_HISTORY);
        let visits = {
            let count = episode.visit_counts.entry(position).or_insert(0);
            *count += 1;
            *count
        };

        let mut reward = Reward::default();
        if blocked {
            reward -= rewards.blocked_move_penalty;
        }
        if visits == 1 {
            reward += rewards.new_cell_bonus;
        } else {
            reward -= rewards.revisit_penalty * f64::from(visits);
        }
        reward += loop_penalty(&episode.recent_actions, rewards);
        if is_stuck(&episode.recent_cells) {
            reward -= rewards.stuck_penalty;
        }

        if let Some(distance) = episode.coins.iter().map(|c| c.manhattan(position)).min() {
            if episode.last_coin_distance.map_or(true, |last| distance < last) {
                reward += rewards.approach_bonus;
            }
            episode.last_coin_distance = Some(distance);
        }

        // Pickups
        if episode.coins.remove(&position) {
            episode.coins_collected += 1;
            reward += rewards.coin_reward
                + rewards.coin_progress_bonus
                    * fraction(episode.coins_collected, episode.initial_coins);
            episode.last_coin_distance = None;
        }
        if episode.powerups.remove(&position) {
            episode.powerups_collected += 1;
            episode.invincibility_timer = rewards.invincibility_steps;
            reward += rewards.powerup_reward;
        }

        if episode.initial_coins > 0 {
            for (quarter, paid) in episode.milestones.iter_mut().enumerate() {
                if !*paid && episode.coins_collected * 4 >= episode.initial_coins * (quarter + 1) {
                    *paid = true;
                    reward += rewards.milestone_bonuses[quarter];
                }
            }
        }

        episode.invincibility_timer = episode.invincibility_timer.saturating_sub(1);

        self.move_ghosts();

        let rewards = &self.config.rewards;
        let episode = &mut self.episode;
        if let Some(index) = episode.ghosts.iter().position(|g| *g == episode.agent) {
            if episode.invincibility_timer > 0 {
                episode.ghosts[index] = episode.ghost_starts[index];
                episode.ghosts_eaten += 1;
                reward += rewards.ghost_eaten_reward;
                tracing::trace!(ghost = index, "ghost eaten");
            } else {
                episode.lives = episode.lives.saturating_sub(1);
                episode.lives_lost += 1;
                let reward = Reward::new(rewards.life_lost_reward);

                if episode.lives == 0 {
                    episode.finished = Some(EndReason::GameOver);
                    return Ok(Step {
                        observation: episode.raw(),
                        reward,
                        done: true,
                        truncated: false,
                        info: episode.info(Some(EndReason::GameOver)),
                    });
                }

                episode.respawn();
                return Ok(Step {
                    observation: episode.raw(),
                    reward,
                    done: false,
                    truncated: false,
                    info: episode.info(Some(EndReason::LifeLost)),
                });
            }
        }

        if episode.coins.is_empty() {
            reward += rewards.all_coins_bonus;
            episode.finished = Some(EndReason::AllCoinsCollected);
            return Ok(Step {
                observation: episode.raw(),
                reward,
                done: true,
                truncated: false,
                info: episode.info(Some(EndReason::AllCoinsCollected)),
            });
        }

        Ok(Step {
            observation: episode.raw(),
            reward,
            done: false,
            truncated: false,
            info: episode.info(None),
        })
    }

    fn abstract_state(&self) -> AbstractState {
        AbstractState::from_episode(&self.episode, self.size)
    }

    fn render(&self) -> String {
        crate::render::render_board(self)
    }
}

fn grid_dimension(grid_size: usize) -> Result<i32> {
    i32::try_from(grid_size)
        .map_err(|_| RLError::InvalidConfig(format!("grid_size {grid_size} too large")))
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, capacity: usize) {
    if queue.len() == capacity {
        queue.pop_front();
    }
    queue.push_back(item);
}

/// Penalty for a,b,a,b back-and-forth and a,a,b,b double-backs
fn loop_penalty(history: &VecDeque<Action>, rewards: &RewardConfig) -> f64 {
    let n = history.len();
    if n < ACTION_HISTORY {
        return 0.0;
    }
    let (a, b, c, d) = (history[n - 4], history[n - 3], history[n - 2], history[n - 1]);

    let mut penalty = 0.0;
    if d == b && c == a && d.is_opposite(c) {
        penalty -= rewards.oscillation_penalty;
    }
    if d == c && b == a && d.is_opposite(b) {
        penalty -= rewards.double_back_penalty;
    }
    penalty
}

/// Whether a full window of recent cells fits inside a 3x3 box
fn is_stuck(cells: &VecDeque<GridPos>) -> bool {
    if cells.len() < CELL_HISTORY {
        return false;
    }
    let (min_x, max_x) = cells
        .iter()
        .fold((i32::MAX, i32::MIN), |(lo, hi), c| (lo.min(c.x), hi.max(c.x)));
    let (min_y, max_y) = cells
        .iter()
        .fold((i32::MAX, i32::MIN), |(lo, hi), c| (lo.min(c.y), hi.max(c.y)));
    max_x - min_x < STUCK_BOX && max_y - min_y < STUCK_BOX
}

/// Step toward the agent when sharing a row or column
fn chase_action(ghost: GridPos, agent: GridPos) -> Option<Action> {
    use std::cmp::Ordering;

    if ghost.x == agent.x {
        match ghost.y.cmp(&agent.y) {
            Ordering::Less => return Some(Action::Down),
            Ordering::Greater => return Some(Action::Up),
            Ordering::Equal => {}
        }
    } else if ghost.y == agent.y {
        match ghost.x.cmp(&agent.x) {
            Ordering::Less => return Some(Action::Right),
            Ordering::Greater => return Some(Action::Left),
            Ordering::Equal => {}
        }
    }
    None
}

#[allow(clippy::cast_precision_loss)]
fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    /// 5x5 open board, agent top-left, ghost two cells to the right
    fn ambush(lives: u32, powerup: bool) -> GridEnv {
        let config = GridConfig {
            grid_size: 5,
            ghost_behavior: GhostBehavior::Chase,
            num_lives: lives,
            seed: Some(1),
            ..GridConfig::default()
        };
        let layout = Layout {
            agent_start: GridPos::new(0, 0),
            ghosts: vec![GridPos::new(2, 0)],
            coins: vec![GridPos::new(4, 4)],
            powerups: if powerup { vec![GridPos::new(1, 0)] } else { vec![] },
            ..Layout::default()
        };
        GridEnv::with_layout(config, layout).unwrap()
    }

    /// 5x5 open board with a ghost parked in the far corner
    fn quiet(coin: GridPos) -> GridEnv {
        let config = GridConfig {
            grid_size: 5,
            num_lives: 10,
            seed: Some(3),
            ..GridConfig::default()
        };
        let layout = Layout {
            agent_start: GridPos::new(0, 0),
            ghosts: vec![GridPos::new(4, 4)],
            coins: vec![coin],
            ..Layout::default()
        };
        GridEnv::with_layout(config, layout).unwrap()
    }

    fn seeded(seed: u64) -> GridEnv {
        GridEnv::new(GridConfig {
            seed: Some(seed),
            ..GridConfig::default()
        })
        .unwrap()
    }

    fn assert_disjoint(env: &GridEnv) {
        let episode = env.episode();
        let mut seen = HashSet::new();
        let cells = env
            .maze()
            .walls()
            .iter()
            .chain(std::iter::once(&episode.agent))
            .chain(&episode.ghosts)
            .chain(&episode.coins)
            .chain(&episode.powerups);
        for cell in cells {
            assert!(seen.insert(*cell), "cell {cell} used twice");
        }
    }

    #[test]
    fn test_reset_is_deterministic_under_seed() {
        let mut a = seeded(7);
        let mut b = seeded(7);
        assert_eq!(a.maze(), b.maze());
        assert_eq!(a.raw_state(), b.raw_state());
        assert_eq!(a.abstract_state(), b.abstract_state());

        assert_eq!(a.reset().unwrap(), b.reset().unwrap());
        assert_eq!(a.episode().coins, b.episode().coins);
        assert_eq!(a.episode().powerups, b.episode().powerups);
    }

    #[test]
    fn test_walls_survive_reset() {
        let mut env = seeded(11);
        let walls = env.maze().walls().clone();
        for _ in 0..5 {
            env.reset().unwrap();
            assert_eq!(env.maze().walls(), &walls);
        }
    }

    #[test]
    fn test_default_spawn() {
        let env = seeded(5);
        let episode = env.episode();
        assert_eq!(episode.agent, GridPos::new(0, 9));
        assert_eq!(episode.ghosts.len(), 3);
        assert!((2..=3).contains(&episode.powerups.len()));
        assert_eq!(episode.lives, 3);
        for ghost in &episode.ghosts {
            assert!(ghost.manhattan(episode.agent) >= GHOST_SPAWN_DISTANCE);
        }
        assert_disjoint(&env);
    }

    #[test]
    fn test_coin_conservation_under_random_play() {
        let mut env = seeded(21);
        let mut rng = StdRng::seed_from_u64(99);
        let mut initial = env.episode().initial_coins;
        for _ in 0..2_000 {
            let step = env.step(Action::sample(&mut rng)).unwrap();
            let episode = env.episode();
            assert_eq!(episode.coins_collected + episode.coins.len(), initial);
            assert_eq!(step.observation.coins_remaining, episode.coins.len());
            if step.done {
                env.reset().unwrap();
                initial = env.episode().initial_coins;
            }
        }
    }

    #[test]
    fn test_game_over_overwrites_reward() {
        let mut env = ambush(1, false);
        let step = env.step(Action::Right).unwrap();
        assert!(step.done);
        assert_eq!(step.reward.value(), -10.0);
        assert_eq!(step.info.reason, Some(EndReason::GameOver));
        assert_eq!(step.info.lives_remaining, 0);

        let err = env.step(Action::Left).unwrap_err();
        assert!(matches!(err, RLError::EpisodeFinished { .. }));

        env.reset().unwrap();
        assert!(env.step(Action::Down).is_ok());
    }

    #[test]
    fn test_life_lost_respawns_everyone() {
        let mut env = ambush(2, false);
        let step = env.step(Action::Right).unwrap();
        assert!(!step.done);
        assert_eq!(step.reward.value(), -10.0);
        assert_eq!(step.info.reason, Some(EndReason::LifeLost));
        assert_eq!(step.info.lives_remaining, 1);
        assert_eq!(step.observation.agent, GridPos::new(0, 0));
        assert_eq!(step.observation.ghosts, vec![GridPos::new(2, 0)]);
    }

    #[test]
    fn test_invincible_agent_eats_ghost() {
        let mut env = ambush(1, true);
        let step = env.step(Action::Right).unwrap();
        assert!(!step.done);
        assert_eq!(step.info.ghosts_eaten, 1);
        assert_eq!(step.info.lives_remaining, 1);
        assert_eq!(step.info.invincibility_timer, 9);
        assert!(step.info.invincible);
        assert_eq!(step.observation.ghosts, vec![GridPos::new(2, 0)]);
        // new cell + approach + power-up + ghost
        assert!((step.reward.value() - 71.1).abs() < 1e-9);
    }

    #[test]
    fn test_blocked_move_penalty() {
        let mut env = quiet(GridPos::new(0, 4));
        let step = env.step(Action::Up).unwrap();
        assert_eq!(step.observation.agent, GridPos::new(0, 0));
        // -0.5 blocked, +1.0 first visit, +0.1 first distance reading
        assert!((step.reward.value() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_oscillation_penalty() {
        let mut env = quiet(GridPos::new(0, 4));
        for action in [Action::Right, Action::Left, Action::Right] {
            env.step(action).unwrap();
        }
        let step = env.step(Action::Left).unwrap();
        // -0.4 second visit, -1.0 oscillation, +0.1 closer to the coin
        assert!((step.reward.value() + 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_double_back_penalty() {
        let mut env = quiet(GridPos::new(0, 4));
        let rewards: Vec<f64> = [Action::Right, Action::Right, Action::Left, Action::Left]
            .into_iter()
            .map(|action| env.step(action).unwrap().reward.value())
            .collect();
        // Last step: +1.0 first visit, -0.5 double-back, +0.1 closer to the coin
        let expected = [1.1, 1.0, -0.3, 0.6];
        for (got, want) in rewards.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{rewards:?}");
        }
    }

    #[test]
    fn test_milestones_pay_once_with_fractional_coin_reward() {
        let config = GridConfig {
            grid_size: 5,
            seed: Some(2),
            ..GridConfig::default()
        };
        // Ghost boxed into the bottom-left corner
        let layout = Layout {
            walls: vec![GridPos::new(0, 3), GridPos::new(1, 4)],
            agent_start: GridPos::new(0, 0),
            ghosts: vec![GridPos::new(0, 4)],
            coins: vec![
                GridPos::new(1, 0),
                GridPos::new(2, 0),
                GridPos::new(3, 0),
                GridPos::new(4, 0),
                GridPos::new(4, 1),
                GridPos::new(4, 2),
                GridPos::new(4, 3),
                GridPos::new(4, 4),
            ],
            ..Layout::default()
        };
        let mut env = GridEnv::with_layout(config, layout).unwrap();

        let path = [
            Action::Right,
            Action::Right,
            Action::Right,
            Action::Right,
            Action::Down,
            Action::Down,
            Action::Down,
            Action::Down,
        ];
        let mut rewards = Vec::new();
        for action in path {
            let step = env.step(action).unwrap();
            rewards.push(step.reward.value());
            assert_eq!(step.done, rewards.len() == path.len());
        }

        // Each pickup: +1 new cell, +0.1 approach, +10 + 5 * k/8, plus the
        // quarter milestones at k = 2, 4, 6 and the board bonus at k = 8
        let expected = [11.725, 27.35, 12.975, 38.6, 14.225, 49.85, 15.475, 116.1];
        for (got, want) in rewards.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{rewards:?}");
        }
        assert_eq!(env.episode().milestones, [true; 3]);
        assert_eq!(env.episode().ghosts, vec![GridPos::new(0, 4)]);
    }

    #[test]
    fn test_powerups_take_farthest_free_cells() {
        for seed in 0..50 {
            let env = GridEnv::new(GridConfig {
                coins_per_row: 1,
                seed: Some(seed),
                ..GridConfig::default()
            })
            .unwrap();
            let episode = env.episode();
            let start = episode.agent_start;
            let nearest_powerup = episode
                .powerups
                .iter()
                .map(|p| p.manhattan(start))
                .min()
                .unwrap();

            let empty = env.maze().reachable_from(start).into_iter().filter(|cell| {
                *cell != start
                    && !episode.ghosts.contains(cell)
                    && !episode.coins.contains(cell)
                    && !episode.powerups.contains(cell)
            });
            for cell in empty {
                assert!(
                    cell.manhattan(start) <= nearest_powerup,
                    "seed {seed}: empty {cell} farther than power-ups {:?}",
                    episode.powerups
                );
            }
        }
    }

    #[test]
    fn test_collecting_last_coin_ends_episode() {
        let mut env = quiet(GridPos::new(1, 0));
        let step = env.step(Action::Right).unwrap();
        assert!(step.done);
        assert_eq!(step.info.reason, Some(EndReason::AllCoinsCollected));
        assert_eq!(step.info.coins_collected, 1);
        // +1 new cell, +0.1 approach, +10 + 5 coin, +15 + 25 + 35 milestones, +100
        assert!((step.reward.value() - 191.1).abs() < 1e-9);
    }

    #[test]
    fn test_stuck_detection() {
        let mut cells = VecDeque::new();
        for i in 0..CELL_HISTORY {
            let x = i32::try_from(i % 3).unwrap();
            push_bounded(&mut cells, GridPos::new(x, 1), CELL_HISTORY);
        }
        assert!(is_stuck(&cells));
        push_bounded(&mut cells, GridPos::new(4, 1), CELL_HISTORY);
        assert!(!is_stuck(&cells));
    }

    #[test]
    fn test_chase_action() {
        let agent = GridPos::new(3, 3);
        assert_eq!(chase_action(GridPos::new(3, 0), agent), Some(Action::Down));
        assert_eq!(chase_action(GridPos::new(5, 3), agent), Some(Action::Left));
        assert_eq!(chase_action(GridPos::new(1, 1), agent), None);
    }

    #[test]
    fn test_rejects_tiny_grid() {
        let err = GridEnv::new(GridConfig {
            grid_size: 3,
            ..GridConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, RLError::InvalidConfig(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_spawns_are_disjoint(size in 4usize..16, ghosts in 1usize..=5, seed in any::<u64>()) {
            let mut env = GridEnv::new(GridConfig {
                grid_size: size,
                num_ghosts: ghosts,
                seed: Some(seed),
                ..GridConfig::default()
            })
            .unwrap();
            assert_disjoint(&env);
            env.reset().unwrap();
            assert_disjoint(&env);
            let episode = env.episode();
            prop_assert_eq!(episode.coins_collected + episode.coins.len(), episode.initial_coins);
        }
    }
}
