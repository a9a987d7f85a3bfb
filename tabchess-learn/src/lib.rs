//! tabchess learn - tabular Q-learning against a fixed opponent
//!
//! This crate provides the learning side:
//! - Sparse state-action value table
//! - Epsilon-greedy agent with one-step Q-learning updates
//! - Episodic training loop with exploration annealing
//! - Evaluation matches against the heuristic opponent
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: train (orchestration)
//! - Level 2: run_episode_from, evaluate (phases)
//! - Level 3: select_action, update, best_move (steps)
//! - Level 4: value table, configuration

pub mod agent;
mod config;
mod evaluation;
mod trainer;
pub mod value_table;

pub use agent::{policy_index, TabularAgent};
pub use config::{AgentConfig, EvalConfig, TrainingConfig, DEFAULT_MAX_MOVES};
pub use evaluation::{evaluate, GameRecord, GameResult, MatchResult};
pub use trainer::{train, EpisodeOutcome, EpisodeSummary, Trainer, TrainingReport};
pub use value_table::ValueTable;
