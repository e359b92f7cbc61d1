// Pac-Man grid world control CLI
// Train, evaluate and replay tabular agents

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pacman_rl_env::GhostBehavior;

mod commands;
mod config;
mod training;

#[derive(Parser)]
#[command(name = "pacmanctl")]
#[command(about = "Pac-Man grid world trainer", version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON settings file (environment, agent and training loop)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Environment flags shared by every subcommand that builds a grid
#[derive(clap::Args, Debug, Clone, Default)]
pub struct EnvArgs {
    /// Side length of the grid
    #[arg(long)]
    pub grid_size: Option<usize>,

    /// Number of ghosts
    #[arg(long)]
    pub ghosts: Option<usize>,

    /// Ghost movement (random, chase)
    #[arg(long)]
    pub ghost_behavior: Option<GhostBehavior>,

    /// Lives per episode
    #[arg(long)]
    pub lives: Option<u32>,

    /// Disable power-ups
    #[arg(long)]
    pub no_powerups: bool,

    /// Session seed
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a Q-learning agent and save the model
    Train {
        #[command(flatten)]
        env: EnvArgs,

        /// Number of training episodes
        #[arg(long)]
        episodes: Option<usize>,

        /// Step cap per episode
        #[arg(long)]
        max_steps: Option<usize>,

        /// Where to write the trained model
        #[arg(short, long, default_value = "pacman_model.json")]
        model: PathBuf,

        /// Where to write per-episode training statistics
        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// Run greedy episodes and report aggregates
    Evaluate {
        #[command(flatten)]
        env: EnvArgs,

        /// Agent to evaluate
        #[arg(short, long, value_enum, default_value = "q-learning")]
        agent: AgentKind,

        /// Saved model (ignored for the random agent)
        #[arg(short, long, default_value = "pacman_model.json")]
        model: PathBuf,

        /// Number of evaluation episodes
        #[arg(short = 'n', long)]
        episodes: Option<usize>,

        /// Step cap per episode
        #[arg(long)]
        max_steps: Option<usize>,
    },

    /// Play one greedy episode and print every frame
    Replay {
        #[command(flatten)]
        env: EnvArgs,

        /// Saved model
        #[arg(short, long, default_value = "pacman_model.json")]
        model: PathBuf,

        /// Step cap for the episode
        #[arg(long)]
        max_steps: Option<usize>,

        /// Also write the trace as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a generated board
    Maze {
        #[command(flatten)]
        env: EnvArgs,
    },
}

/// Which agent drives an evaluation
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Greedy policy from a saved Q-table
    QLearning,
    /// Uniform random baseline
    Random,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = config::Settings::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Train {
            env,
            episodes,
            max_steps,
            model,
            stats,
        } => {
            commands::train(settings, &env, episodes, max_steps, &model, stats.as_deref()).await?;
        }

        Commands::Evaluate {
            env,
            agent,
            model,
            episodes,
            max_steps,
        } => {
            commands::evaluate(settings, &env, agent, &model, episodes, max_steps).await?;
        }

        Commands::Replay {
            env,
            model,
            max_steps,
            output,
        } => {
            commands::replay(settings, &env, &model, max_steps, output.as_deref()).await?;
        }

        Commands::Maze { env } => {
            commands::maze(settings, &env)?;
        }
    }

    Ok(())
}
