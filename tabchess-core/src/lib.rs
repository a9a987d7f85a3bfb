//! tabchess core - chess environment for tabular learning
//!
//! This crate provides the pieces the learner plays against:
//! - Game state over the `shakmaty` rules engine (apply, undo, terminal detection)
//! - Canonical state and action keys
//! - Shaped reward model (material, position, board control, move quality)
//! - Deterministic heuristic opponent

pub mod encoding;
pub mod error;
pub mod opponent;
pub mod position;
pub mod reward;

// Re-exports for convenient access
pub use encoding::{ActionKey, StateKey};
pub use error::{Error, Result};
pub use opponent::HeuristicOpponent;
pub use position::{color_name, GameState, GameStatus};
pub use reward::{RewardModel, RewardWeights, CHECKMATE_REWARD, STALEMATE_REWARD};

pub use shakmaty::{Color, Move, Piece, Role, Square};
