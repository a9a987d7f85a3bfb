//! Shaped reward for a board transition
//!
//! The reward is evaluated on the position after the move has been applied and
//! is expressed from a fixed perspective color (the learning side).

use serde::{Deserialize, Serialize};
use shakmaty::{Color, Role, Square};

use crate::position::GameState;

/// Reward for delivering checkmate (negated for being mated)
pub const CHECKMATE_REWARD: f64 = 100.0;

/// Reward for stalemate
pub const STALEMATE_REWARD: f64 = 0.0;

/// Center weights indexed `[rank][file]`, 0.4 on d4/e4/d5/e5 down to 0.1 on the rim
pub const CENTER_WEIGHTS: [[f64; 8]; 8] = [
    [0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1],
    [0.1, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.1],
    [0.1, 0.2, 0.3, 0.3, 0.3, 0.3, 0.2, 0.1],
    [0.1, 0.2, 0.3, 0.4, 0.4, 0.3, 0.2, 0.1],
    [0.1, 0.2, 0.3, 0.4, 0.4, 0.3, 0.2, 0.1],
    [0.1, 0.2, 0.3, 0.3, 0.3, 0.3, 0.2, 0.1],
    [0.1, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.1],
    [0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1],
];

/// The four central squares
pub const CENTER_SQUARES: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

/// Material value of a piece (king is 0; it is never captured)
pub fn piece_value(role: Role) -> f64 {
    match role {
        Role::Pawn => 1.0,
        Role::Knight => 3.0,
        Role::Bishop => 3.0,
        Role::Rook => 5.0,
        Role::Queen => 9.0,
        Role::King => 0.0,
    }
}

/// (file, rank) indices of a square, both 0..8
pub fn file_rank(square: Square) -> (usize, usize) {
    let index = usize::from(square);
    (index % 8, index / 8)
}

/// Center weight of a square as seen by `color` (ranks mirrored for Black)
pub fn center_weight(square: Square, color: Color) -> f64 {
    let (file, rank) = file_rank(square);
    let rank = match color {
        Color::White => rank,
        Color::Black => 7 - rank,
    };
    CENTER_WEIGHTS[rank][file]
}

/// +1 for the perspective side, -1 for the other
fn side_sign(color: Color, perspective: Color) -> f64 {
    if color == perspective {
        1.0
    } else {
        -1.0
    }
}

// ============================================================================
// WEIGHTS
// ============================================================================

/// Blend weights for the reward components
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardWeights {
    pub material: f64,
    pub positional: f64,
    pub control: f64,
    pub check_bonus: f64,
    /// Fraction of the captured piece's value credited to the capture
    pub capture_fraction: f64,
    pub center_move_bonus: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            material: 1.0,
            positional: 0.3,
            control: 0.2,
            check_bonus: 0.8,
            capture_fraction: 0.5,
            center_move_bonus: 0.3,
        }
    }
}

// ============================================================================
// COMPONENTS
// ============================================================================

/// Sum of piece values, own minus opponent's
pub fn material_balance(state: &GameState, perspective: Color) -> f64 {
    state
        .pieces()
        .map(|(_, piece)| side_sign(piece.color, perspective) * piece_value(piece.role))
        .sum()
}

/// Sum of center weights under each piece, own minus opponent's
pub fn positional_balance(state: &GameState, perspective: Color) -> f64 {
    state
        .pieces()
        .map(|(sq, piece)| side_sign(piece.color, perspective) * center_weight(sq, piece.color))
        .sum()
}

/// Center weight of every attacked square, own attacks minus opponent attacks
pub fn control_balance(state: &GameState, perspective: Color) -> f64 {
    let mut control = 0.0;
    for square in Square::ALL {
        let weight = center_weight(square, Color::White);
        if state.is_attacked_by(square, perspective) {
            control += weight;
        }
        if state.is_attacked_by(square, !perspective) {
            control -= weight;
        }
    }
    control
}

/// Check, capture and centralization bonus for the last move played.
///
/// Check and capture count for the side that moved. The center bonus counts
/// for the side to move after it, so a black move into the center scores
/// positive for White.
pub fn move_quality(state: &GameState, perspective: Color, weights: &RewardWeights) -> f64 {
    let mv = match state.last_move() {
        Some(mv) => mv,
        None => return 0.0,
    };

    // The side to move now is the one that did not play `mv`
    let mover_sign = side_sign(!state.turn(), perspective);
    let mut bonus = 0.0;

    if state.is_check() {
        bonus += weights.check_bonus;
    }
    if let Some(captured) = mv.capture() {
        bonus += piece_value(captured) * weights.capture_fraction;
    }

    // Centralization is credited to the side now to move, not the mover
    let mut center = 0.0;
    if CENTER_SQUARES.contains(&mv.to()) {
        center = side_sign(state.turn(), perspective) * weights.center_move_bonus;
    }

    mover_sign * bonus + center
}

// ============================================================================
// REWARD MODEL
// ============================================================================

/// Scores positions for the learning side
#[derive(Clone, Debug)]
pub struct RewardModel {
    pub perspective: Color,
    pub weights: RewardWeights,
}

impl Default for RewardModel {
    fn default() -> Self {
        Self::new(Color::White)
    }
}

impl RewardModel {
    pub fn new(perspective: Color) -> Self {
        Self {
            perspective,
            weights: RewardWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: RewardWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Reward for arriving at `state` (the move has already been applied)
    pub fn score(&self, state: &GameState) -> f64 {
        // Terminal states short-circuit the shaped components
        if state.is_checkmate() {
            let mated = state.turn();
            return if mated == self.perspective {
                -CHECKMATE_REWARD
            } else {
                CHECKMATE_REWARD
            };
        }
        if state.is_stalemate() {
            return STALEMATE_REWARD;
        }

        let w = &self.weights;
        material_balance(state, self.perspective) * w.material
            + positional_balance(state, self.perspective) * w.positional
            + control_balance(state, self.perspective) * w.control
            + move_quality(state, self.perspective, w)
    }
}

// ============================================================================
// TESTS
// ============================================================================
