//! Train command - run Q-learning episodes against the heuristic opponent
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: train_agent(), report_results()
//! - Level 3: build_training_config(), progress bar wiring
//! - Level 4: formatting utilities

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use tabchess_core::Color;
use tabchess_learn::{AgentConfig, TabularAgent, Trainer, TrainingConfig, TrainingReport};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

/// Side played by the learning agent
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// Training parameters shared by every command that needs a trained agent
#[derive(Args, Clone, Debug)]
pub struct TrainingArgs {
    /// Number of training episodes
    #[arg(long, default_value = "1000")]
    pub episodes: usize,

    /// Maximum plies per episode
    #[arg(long, default_value = "100")]
    pub max_moves: usize,

    /// Learning rate (alpha)
    #[arg(long, default_value = "0.1")]
    pub alpha: f64,

    /// Discount factor (gamma)
    #[arg(long, default_value = "0.9")]
    pub gamma: f64,

    /// Initial exploration rate
    #[arg(long, default_value = "1.0")]
    pub epsilon_start: f64,

    /// Exploration floor
    #[arg(long, default_value = "0.01")]
    pub epsilon_min: f64,

    /// Per-episode exploration decay factor
    #[arg(long, default_value = "0.9999")]
    pub epsilon_decay: f64,

    /// Log progress every N episodes
    #[arg(long, default_value = "100")]
    pub report_interval: usize,

    /// Side the agent learns to play
    #[arg(long, value_enum, default_value = "white")]
    pub agent_color: Side,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct TrainArgs {
    #[command(flatten)]
    pub training: TrainingArgs,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run train command
pub fn run(args: TrainArgs, seed: Option<u64>) -> Result<()> {
    let started_at = Utc::now();
    let quiet = args.training.quiet || args.json;
    let (agent, report) = train_agent(&args.training, seed, quiet)?;

    report_results(&report, &agent, started_at, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Build, train and return an agent (shared by `evaluate` and `play`)
pub fn train_agent(
    args: &TrainingArgs,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(TabularAgent, TrainingReport)> {
    let config = build_training_config(args, seed);

    let mut agent = TabularAgent::new(config.agent.clone()).context("Invalid agent settings")?;
    let trainer = Trainer::new(config).context("Invalid training settings")?;

    let progress = create_progress_bar(args.episodes as u64, quiet)?;
    let report = trainer
        .train_with_callback(&mut agent, |_, summary, _| {
            progress.inc(1);
            progress.set_message(format!("eps {:.3}", summary.epsilon));
        })
        .context("Training aborted")?;
    progress.finish_and_clear();

    Ok((agent, report))
}

/// Print the run summary
fn report_results(
    report: &TrainingReport,
    agent: &TabularAgent,
    started_at: DateTime<Utc>,
    json: bool,
) -> Result<()> {
    if json {
        print_json_report(report, agent, started_at)
    } else {
        print_text_report(report);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Translate command-line flags into a training configuration
pub fn build_training_config(args: &TrainingArgs, seed: Option<u64>) -> TrainingConfig {
    let agent = AgentConfig {
        learning_rate: args.alpha,
        discount_factor: args.gamma,
        epsilon_start: args.epsilon_start,
        epsilon_min: args.epsilon_min,
        epsilon_decay: args.epsilon_decay,
        seed,
    };

    TrainingConfig {
        agent,
        episodes: args.episodes,
        max_moves: args.max_moves,
        report_interval: args.report_interval,
        agent_color: args.agent_color.into(),
        ..Default::default()
    }
}

fn create_progress_bar(len: u64, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let style = ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} episodes ({msg})",
    )
    .context("Invalid progress bar template")?
    .progress_chars("=>-");

    let bar = ProgressBar::new(len);
    bar.set_style(style);
    Ok(bar)
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn print_json_report(
    report: &TrainingReport,
    agent: &TabularAgent,
    started_at: DateTime<Utc>,
) -> Result<()> {
    #[derive(Serialize)]
    struct JsonOutput<'a> {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        learning_rate: f64,
        discount_factor: f64,
        report: &'a TrainingReport,
    }

    let output = JsonOutput {
        started_at,
        finished_at: Utc::now(),
        learning_rate: agent.config().learning_rate,
        discount_factor: agent.config().discount_factor,
        report,
    };

    let json = serde_json::to_string_pretty(&output).context("Failed to encode report")?;
    println!("{}", json);
    Ok(())
}

fn print_text_report(report: &TrainingReport) {
    let total = report.episodes;

    println!("\n=== Training Results ===");
    println!("Episodes:      {}", total);
    println!(
        "Agent wins:    {} ({:.1}%)",
        report.agent_wins,
        percent(report.agent_wins, total)
    );
    println!(
        "Opponent wins: {} ({:.1}%)",
        report.opponent_wins,
        percent(report.opponent_wins, total)
    );
    println!(
        "Draws:         {} ({:.1}%)",
        report.draws,
        percent(report.draws, total)
    );
    println!(
        "Move cap:      {} ({:.1}%)",
        report.move_cap,
        percent(report.move_cap, total)
    );
    println!("Avg plies:     {:.1}", report.avg_plies);
    println!("Avg reward:    {:.2}", report.avg_reward);
    println!("Final epsilon: {:.3}", report.final_epsilon);
    println!(
        "Value table:   {} states, {} entries",
        report.states, report.entries
    );
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn default_args() -> TrainingArgs {
        TrainingArgs {
            episodes: 3,
            max_moves: 10,
            alpha: 0.2,
            gamma: 0.8,
            epsilon_start: 1.0,
            epsilon_min: 0.1,
            epsilon_decay: 0.5,
            report_interval: 1,
            agent_color: Side::Black,
            quiet: true,
        }
    }

    #[test]
    fn test_build_training_config() {
        let config = build_training_config(&default_args(), Some(9));
        assert_eq!(config.episodes, 3);
        assert_eq!(config.max_moves, 10);
        assert_eq!(config.agent.learning_rate, 0.2);
        assert_eq!(config.agent.discount_factor, 0.8);
        assert_eq!(config.agent.seed, Some(9));
        assert_eq!(config.agent_color, Color::Black);
    }

    #[test]
    fn test_train_agent() {
        let (agent, report) = train_agent(&default_args(), Some(4), true).unwrap();
        assert_eq!(report.episodes, 3);
        assert_eq!(agent.epsilon(), 0.125_f64.max(0.1));
    }

    #[test]
    fn test_train_agent_rejects_bad_settings() {
        let args = TrainingArgs {
            alpha: 3.0,
            ..default_args()
        };
        assert!(train_agent(&args, Some(1), true).is_err());
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(3, 0), 0.0);
    }
}
