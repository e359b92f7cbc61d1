// Subcommand implementations for pacmanctl

use anyhow::{Context, Result};
use std::path::Path;

use pacman_rl_agent::{QLearningAgent, RandomAgent};
use pacman_rl_core::{Agent, Environment};
use pacman_rl_env::{AbstractState, GridEnv};

use crate::config::Settings;
use crate::training::{EvaluationStats, TrainingSession};
use crate::{AgentKind, EnvArgs};

/// Layer command-line flags over the settings file
fn apply_env_args(mut settings: Settings, args: &EnvArgs) -> Settings {
    let env = &mut settings.env;
    if let Some(grid_size) = args.grid_size {
        env.grid_size = grid_size;
    }
    if let Some(ghosts) = args.ghosts {
        env.num_ghosts = ghosts;
    }
    if let Some(behavior) = args.ghost_behavior {
        env.ghost_behavior = behavior;
    }
    if let Some(lives) = args.lives {
        env.num_lives = lives;
    }
    if args.no_powerups {
        env.enable_powerups = false;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    settings.seeded()
}

fn build_env(settings: &Settings) -> Result<GridEnv> {
    GridEnv::new(settings.env.clone()).context("Failed to create grid environment")
}

async fn load_q_agent(settings: &Settings, model: &Path) -> Result<QLearningAgent<AbstractState>> {
    let mut agent = QLearningAgent::new(settings.agent.clone());
    agent
        .load(model)
        .await
        .with_context(|| format!("Failed to load model from {}", model.display()))?;
    Ok(agent)
}

fn print_evaluation(name: &str, stats: &EvaluationStats) {
    println!("📊 Evaluation ({name}, {} episodes)", stats.num_episodes);
    println!("   Avg reward:   {:.2} ± {:.2}", stats.avg_reward, stats.std_reward);
    println!("   Avg coins:    {:.2}", stats.avg_coins);
    println!("   Avg steps:    {:.1}", stats.avg_steps);
    println!("   Success rate: {:.1}%", stats.success_rate * 100.0);
}

pub async fn train(
    settings: Settings,
    args: &EnvArgs,
    episodes: Option<usize>,
    max_steps: Option<usize>,
    model: &Path,
    stats_path: Option<&Path>,
) -> Result<()> {
    let mut settings = apply_env_args(settings, args);
    if let Some(episodes) = episodes {
        settings.training.episodes = episodes;
    }
    if let Some(max_steps) = max_steps {
        settings.training.max_steps = max_steps;
    }
    settings.validate()?;

    println!("🤖 Starting Q-learning training");
    println!("   Grid: {0}x{0}", settings.env.grid_size);
    println!("   Ghosts: {} ({})", settings.env.num_ghosts, settings.env.ghost_behavior);
    println!("   Episodes: {}", settings.training.episodes);
    println!("   Max steps: {}", settings.training.max_steps);

    let env = build_env(&settings)?;
    let agent = QLearningAgent::new(settings.agent.clone());
    let eval_episodes = settings.training.eval_episodes;
    let mut session = TrainingSession::new(env, agent, settings.training.clone());

    let stats = session.train().context("Training failed")?;
    let evaluation = session.evaluate(eval_episodes).context("Evaluation failed")?;

    let session_id = session.id();
    let episodes_trained = session.agent().stats().episodes_trained;
    let agent = session.into_agent();
    agent
        .save(model)
        .await
        .with_context(|| format!("Failed to save model to {}", model.display()))?;

    if let Some(path) = stats_path {
        let json = serde_json::to_string_pretty(&stats)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    }

    println!("\n✅ Training completed in {:.1}s", stats.training_time);
    println!("   Session: {session_id}");
    println!("   Episodes trained: {episodes_trained}");
    println!("   Final epsilon: {:.4}", stats.final_epsilon);
    println!("   Q-table entries: {}", stats.q_table_size);
    println!("   Model: {}", model.display());
    print_evaluation("greedy", &evaluation);

    Ok(())
}

pub async fn evaluate(
    settings: Settings,
    args: &EnvArgs,
    kind: AgentKind,
    model: &Path,
    episodes: Option<usize>,
    max_steps: Option<usize>,
) -> Result<()> {
    let mut settings = apply_env_args(settings, args);
    if let Some(max_steps) = max_steps {
        settings.training.max_steps = max_steps;
    }
    settings.validate()?;
    let episodes = episodes.unwrap_or(settings.training.eval_episodes);
    let env = build_env(&settings)?;

    let stats = match kind {
        AgentKind::QLearning => {
            let agent = load_q_agent(&settings, model).await?;
            TrainingSession::new(env, agent, settings.training.clone()).evaluate(episodes)?
        }
        AgentKind::Random => {
            let agent: RandomAgent<AbstractState> = RandomAgent::new(settings.agent.seed);
            TrainingSession::new(env, agent, settings.training.clone()).evaluate(episodes)?
        }
    };

    let name = match kind {
        AgentKind::QLearning => "q-learning",
        AgentKind::Random => "random",
    };
    print_evaluation(name, &stats);
    Ok(())
}

pub async fn replay(
    settings: Settings,
    args: &EnvArgs,
    model: &Path,
    max_steps: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    let mut settings = apply_env_args(settings, args);
    if let Some(max_steps) = max_steps {
        settings.training.max_steps = max_steps;
    }
    settings.validate()?;

    let env = build_env(&settings)?;
    let agent = load_q_agent(&settings, model).await?;
    let mut session = TrainingSession::new(env, agent, settings.training.clone());
    let trace = session.record_episode().context("Replay failed")?;

    for frame in &trace.frames {
        match frame.action {
            Some(action) => println!("{action} → reward {:.2}", frame.reward),
            None => println!("start"),
        }
        println!("{}", frame.board);
    }
    if let Some(last) = trace.frames.last() {
        let reason = last.info.reason.map_or("none", |r| r.as_str());
        println!(
            "Episode ended after {} steps: {reason} ({} coins)",
            last.step, last.info.coins_collected
        );
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&trace)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write trace to {}", path.display()))?;
        println!("Trace written to {}", path.display());
    }
    Ok(())
}

pub fn maze(settings: Settings, args: &EnvArgs) -> Result<()> {
    let settings = apply_env_args(settings, args);
    let env = build_env(&settings)?;
    let maze = env.maze();

    println!(
        "Maze {0}x{0}: {1} walls, corners connected: {2}",
        maze.size(),
        maze.walls().len(),
        maze.corners_connected()
    );
    println!("{}", env.render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacman_rl_env::GhostBehavior;

    #[test]
    fn test_flags_override_settings() {
        let args = EnvArgs {
            grid_size: Some(6),
            ghost_behavior: Some(GhostBehavior::Chase),
            no_powerups: true,
            seed: Some(7),
            ..EnvArgs::default()
        };
        let settings = apply_env_args(Settings::default(), &args);
        assert_eq!(settings.env.grid_size, 6);
        assert_eq!(settings.env.num_ghosts, 3);
        assert_eq!(settings.env.ghost_behavior, GhostBehavior::Chase);
        assert!(!settings.env.enable_powerups);
        assert_eq!(settings.env.seed, Some(7));
        assert_eq!(settings.agent.seed, Some(8));
    }

    #[test]
    fn test_maze_command_rejects_tiny_grid() {
        let args = EnvArgs {
            grid_size: Some(2),
            ..EnvArgs::default()
        };
        assert!(maze(Settings::default(), &args).is_err());
    }
}
