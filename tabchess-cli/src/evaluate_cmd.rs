//! Evaluate command - train an agent, then measure it over a batch of games
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: train phase, evaluation phase, reporting
//! - Level 3: build_eval_config()
//! - Level 4: create_rng(), printing

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use tabchess_learn::{evaluate, EvalConfig, GameRecord, GameResult, MatchResult, TrainingReport};

use crate::train_cmd::{train_agent, TrainingArgs};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub training: TrainingArgs,

    /// Number of evaluation games
    #[arg(long, default_value = "20")]
    pub games: usize,

    /// Exploration rate during evaluation games
    #[arg(long, default_value = "0.0")]
    pub eval_epsilon: f64,

    /// Play evaluation games one after another
    #[arg(long)]
    pub sequential: bool,

    /// Print every game's move list
    #[arg(long, short)]
    pub verbose: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run evaluate command
pub fn run(args: EvaluateArgs, seed: Option<u64>) -> Result<()> {
    let started_at = Utc::now();
    let quiet = args.training.quiet || args.json;

    let (agent, report) = train_agent(&args.training, seed, quiet)?;

    let config = build_eval_config(&args, seed);
    tracing::info!(
        "Evaluating over {} games (epsilon {:.3}, seed {})",
        config.games,
        config.epsilon,
        config.seed
    );
    let (results, records) = evaluate(&agent, &config).context("Evaluation failed")?;

    if args.json {
        print_json_results(started_at, &report, &results, &records, args.verbose)
    } else {
        print_text_results(&report, &results, &records, args.verbose);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn build_eval_config(args: &EvaluateArgs, seed: Option<u64>) -> EvalConfig {
    let mut rng = create_rng(seed);

    EvalConfig {
        games: args.games,
        max_moves: args.training.max_moves,
        epsilon: args.eval_epsilon,
        agent_color: args.training.agent_color.into(),
        parallel: !args.sequential,
        seed: rng.gen(),
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from optional seed
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        // Offset so evaluation games don't replay the training stream
        Some(s) => ChaCha8Rng::seed_from_u64(s.wrapping_add(1)),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn result_label(result: GameResult) -> &'static str {
    match result {
        GameResult::Win => "win",
        GameResult::Loss => "loss",
        GameResult::Draw => "draw",
    }
}

/// Print results as JSON
fn print_json_results(
    started_at: DateTime<Utc>,
    report: &TrainingReport,
    results: &MatchResult,
    records: &[GameRecord],
    verbose: bool,
) -> Result<()> {
    #[derive(Serialize)]
    struct JsonOutput<'a> {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        training: &'a TrainingReport,
        evaluation: &'a MatchResult,
        win_rate: f64,
        score: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        games: Option<&'a [GameRecord]>,
    }

    let output = JsonOutput {
        started_at,
        finished_at: Utc::now(),
        training: report,
        evaluation: results,
        win_rate: results.win_rate(),
        score: results.score(),
        games: verbose.then_some(records),
    };

    let json = serde_json::to_string_pretty(&output).context("Failed to encode results")?;
    println!("{}", json);
    Ok(())
}

/// Print results as human-readable text
fn print_text_results(
    report: &TrainingReport,
    results: &MatchResult,
    records: &[GameRecord],
    verbose: bool,
) {
    println!("\n=== Training ===");
    println!(
        "{} episodes, final epsilon {:.3}, {} states / {} entries",
        report.episodes, report.final_epsilon, report.states, report.entries
    );

    println!("\n=== Evaluation Results ===");
    println!("Games played: {}", results.games_played);
    println!("Agent wins:   {}", results.wins);
    println!("Agent losses: {}", results.losses);
    println!("Draws:        {}", results.draws);
    println!("Win rate:     {:.1}%", results.win_rate() * 100.0);
    println!("Score:        {:.1}%", results.score() * 100.0);
    println!("Avg plies:    {:.1}", results.avg_plies);

    if verbose {
        println!("\n=== Games ===");
        for record in records {
            let moves: Vec<&str> = record.moves.iter().map(|m| m.as_str()).collect();
            println!(
                "Game {:>3}: {:<4} ({} plies) {}",
                record.game_index + 1,
                result_label(record.result),
                record.plies,
                moves.join(" ")
            );
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
