//! tabchess CLI - Command-line interface
//!
//! Commands:
//! - train: Train an agent against the heuristic opponent and print statistics
//! - evaluate: Train, then measure the agent over a batch of games
//! - play: Train, then play against the agent in the terminal

mod evaluate_cmd;
mod play_cmd;
mod train_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabchess")]
#[command(about = "Tabular Q-learning chess agent")]
struct Cli {
    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent and report training statistics
    Train(train_cmd::TrainArgs),
    /// Train an agent, then evaluate it against the heuristic opponent
    Evaluate(evaluate_cmd::EvaluateArgs),
    /// Train an agent, then play against it
    Play(play_cmd::PlayArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => train_cmd::run(args, cli.seed),
        Commands::Evaluate(args) => evaluate_cmd::run(args, cli.seed),
        Commands::Play(args) => play_cmd::run(args, cli.seed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_train_with_global_seed() {
        let cli = Cli::try_parse_from(["tabchess", "train", "--episodes", "5", "--seed", "11"])
            .unwrap();
        assert_eq!(cli.seed, Some(11));
        match cli.command {
            Commands::Train(args) => {
                assert_eq!(args.training.episodes, 5);
                assert_eq!(args.training.max_moves, 100);
                assert!(!args.json);
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_parse_play_flags() {
        let cli = Cli::try_parse_from(["tabchess", "play", "--greedy", "--agent-color", "black"])
            .unwrap();
        match cli.command {
            Commands::Play(args) => {
                assert!(args.greedy);
                assert_eq!(args.training.agent_color, train_cmd::Side::Black);
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn test_parse_evaluate_defaults() {
        let cli = Cli::try_parse_from(["tabchess", "evaluate"]).unwrap();
        match cli.command {
            Commands::Evaluate(args) => {
                assert_eq!(args.games, 20);
                assert_eq!(args.eval_epsilon, 0.0);
                assert!(!args.sequential);
            }
            _ => panic!("expected evaluate"),
        }
    }
}
