//! Text rendering of the board
//!
//! `P` agent (`P*` while invincible), `G` ghost, `O` power-up, `C` coin,
//! `#` wall, `.` empty.

use pacman_rl_core::GridPos;

use crate::grid::GridEnv;

/// Render the current episode of `env` as text
pub(crate) fn render_board(env: &GridEnv) -> String {
    let episode = env.episode();
    let size = env.grid_size();
    let mut out = String::new();

    out.push_str(&format!("Step {}\n", episode.steps));
    out.push_str(&format!(
        "Coins: {}/{} | Lives: {}/{} | Power-ups: {}/{}",
        episode.coins_collected,
        episode.initial_coins,
        episode.lives,
        env.config().num_lives,
        episode.powerups_collected,
        episode.initial_powerups,
    ));
    if episode.invincibility_timer > 0 {
        out.push_str(&format!(" | INVINCIBLE ({})", episode.invincibility_timer));
    }
    out.push('\n');

    let rule = "-".repeat(usize::try_from(size * 2 + 1).unwrap_or(1));
    out.push_str(&rule);
    out.push('\n');

    for y in 0..size {
        let row: Vec<&str> = (0..size)
            .map(|x| {
                let pos = GridPos::new(x, y);
                if pos == episode.agent {
                    if episode.invincibility_timer > 0 {
                        "P*"
                    } else {
                        "P"
                    }
                } else if episode.ghosts.contains(&pos) {
                    "G"
                } else if episode.powerups.contains(&pos) {
                    "O"
                } else if episode.coins.contains(&pos) {
                    "C"
                } else if env.maze().is_wall(pos) {
                    "#"
                } else {
                    "."
                }
            })
            .collect();
        out.push_str(&row.join(" "));
        out.push('\n');
    }

    out.push_str(&rule);
    out
}

#[cfg(test)]
mod tests {
    use crate::{Action, Environment, GridConfig, GridEnv, GridPos, Layout};

    #[test]
    fn test_render_symbols() {
        let layout = Layout {
            walls: vec![GridPos::new(1, 1)],
            agent_start: GridPos::new(0, 0),
            ghosts: vec![GridPos::new(3, 3)],
            coins: vec![GridPos::new(2, 0)],
            powerups: vec![GridPos::new(0, 3)],
        };
        let config = GridConfig {
            grid_size: 4,
            seed: Some(0),
            ..GridConfig::default()
        };
        let env = GridEnv::with_layout(config, layout).unwrap();
        let text = env.render();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Step 0");
        assert_eq!(lines[1], "Coins: 0/1 | Lives: 3/3 | Power-ups: 0/1");
        assert_eq!(lines[2], "---------");
        assert_eq!(lines[3], "P . C .");
        assert_eq!(lines[4], ". # . .");
        assert_eq!(lines[6], "O . . G");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_render_invincible_header() {
        let layout = Layout {
            agent_start: GridPos::new(0, 0),
            ghosts: vec![GridPos::new(3, 3)],
            coins: vec![GridPos::new(3, 0)],
            powerups: vec![GridPos::new(1, 0)],
            ..Layout::default()
        };
        let config = GridConfig {
            grid_size: 4,
            seed: Some(0),
            ..GridConfig::default()
        };
        let mut env = GridEnv::with_layout(config, layout).unwrap();
        env.step(Action::Right).unwrap();
        let text = env.render();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Step 1");
        assert_eq!(
            lines[1],
            "Coins: 0/1 | Lives: 3/3 | Power-ups: 1/1 | INVINCIBLE (9)"
        );
        assert!(lines[3].starts_with(". P* . C"));
    }
}
