//! Fixed heuristic opponent
//!
//! One-ply move scorer with no search and no randomness. Ties go to the move
//! generated first, so the same position always yields the same reply.

use shakmaty::Move;

use crate::position::GameState;
use crate::reward::{file_rank, piece_value};

/// Multiplier on the captured piece's value
const CAPTURE_WEIGHT: f64 = 20.0;

/// Flat bonus for giving check
const CHECK_BONUS: f64 = 8.0;

/// Weight of the centralization term
const CENTER_WEIGHT: f64 = 0.5;

/// Distance offset so that central destinations score highest
const CENTER_BASE: f64 = 8.0;

/// Board center in (file, rank) coordinates
const BOARD_CENTER: f64 = 3.5;

/// Greedy capture/check/center scorer
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicOpponent;

impl HeuristicOpponent {
    pub fn new() -> Self {
        Self
    }

    /// Best move for the side to move, or `None` if it has no legal moves
    pub fn best_move(&self, state: &GameState) -> Option<Move> {
        let moves = state.legal_moves();
        let mut scratch = state.clone();

        let mut best: Option<(usize, f64)> = None;
        for (index, mv) in moves.iter().enumerate() {
            let score = score_on(&mut scratch, mv);
            // Strictly greater keeps the earliest of equal scores
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((index, score));
            }
        }

        best.map(|(index, _)| moves[index].clone())
    }

    /// Score a single legal move of `state`
    pub fn score_move(&self, state: &GameState, mv: &Move) -> f64 {
        let mut scratch = state.clone();
        score_on(&mut scratch, mv)
    }
}

/// Score `mv` by playing it on `scratch` and taking it back
fn score_on(scratch: &mut GameState, mv: &Move) -> f64 {
    let mut score = 0.0;

    if let Some(captured) = mv.capture() {
        score += piece_value(captured) * CAPTURE_WEIGHT;
    }

    scratch.push_unchecked(mv);
    if scratch.is_check() {
        score += CHECK_BONUS;
    }
    scratch.undo();

    let (file, rank) = file_rank(mv.to());
    let center_distance = (BOARD_CENTER - file as f64).abs() + (BOARD_CENTER - rank as f64).abs();
    score += (CENTER_BASE - center_distance) * CENTER_WEIGHT;

    score
}
