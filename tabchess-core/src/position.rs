//! Game state over the shakmaty rules engine

use std::fmt;

use shakmaty::fen::Fen;
use shakmaty::{Bitboard, CastlingMode, Chess, Color, EnPassantMode, Move, Piece, Position, Square};

use crate::encoding::{ActionKey, StateKey};
use crate::error::{Error, Result};

// ============================================================================
// STATUS
// ============================================================================

/// Game status as shown to a player
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != GameStatus::Ongoing
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Ongoing => f.write_str("In progress"),
            GameStatus::Checkmate { winner } => {
                write!(f, "Checkmate! {} wins!", color_name(*winner))
            }
            GameStatus::Stalemate => f.write_str("Stalemate! Draw!"),
            GameStatus::InsufficientMaterial => f.write_str("Insufficient material! Draw!"),
        }
    }
}

/// Human readable color name
pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Current position plus the moves that led to it (for undo)
#[derive(Clone, Debug, Default)]
pub struct GameState {
    position: Chess,
    history: Vec<(Chess, Move)>,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Standard starting position
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a full FEN string
    pub fn from_fen(fen: &str) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedState {
            key: fen.to_string(),
            reason,
        };

        let parsed = fen.parse::<Fen>().map_err(|e| malformed(e.to_string()))?;
        let position = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| malformed(e.to_string()))?;

        Ok(Self::from_position(position))
    }

    /// Decode a state key (history starts empty)
    pub fn from_key(key: &StateKey) -> Result<Self> {
        Ok(Self::from_position(key.to_position()?))
    }

    pub fn from_position(position: Chess) -> Self {
        Self {
            position,
            history: Vec::new(),
        }
    }

    /// Back to the starting position
    pub fn reset(&mut self) {
        self.position = Chess::default();
        self.history.clear();
    }

    // ========================================================================
    // ENCODING
    // ========================================================================

    pub fn key(&self) -> StateKey {
        StateKey::from_position(&self.position)
    }

    /// Full FEN including move counters
    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    // ========================================================================
    // MOVES
    // ========================================================================

    /// Legal moves for the side to move, in generator order
    pub fn legal_moves(&self) -> Vec<Move> {
        self.position.legal_moves().to_vec()
    }

    /// Legal moves as action keys, same order as [`GameState::legal_moves`]
    pub fn legal_actions(&self) -> Vec<ActionKey> {
        self.position
            .legal_moves()
            .iter()
            .map(ActionKey::from_move)
            .collect()
    }

    /// Apply a move, rejecting anything outside the legal set
    pub fn apply(&mut self, mv: &Move) -> Result<()> {
        if !self.position.is_legal(mv) {
            return Err(Error::IllegalAction {
                action: ActionKey::from_move(mv).into_string(),
                state: self.key().into_string(),
            });
        }
        self.push_unchecked(mv);
        Ok(())
    }

    /// Apply a move given as an action key
    pub fn apply_action(&mut self, action: &ActionKey) -> Result<Move> {
        let mv = action.to_move(&self.position)?;
        self.push_unchecked(&mv);
        Ok(mv)
    }

    /// Apply a move taken from [`GameState::legal_moves`] of this position
    pub(crate) fn push_unchecked(&mut self, mv: &Move) {
        let before = self.position.clone();
        self.position.play_unchecked(mv);
        self.history.push((before, mv.clone()));
    }

    /// Take back the last move
    pub fn undo(&mut self) -> Option<Move> {
        let (before, mv) = self.history.pop()?;
        self.position = before;
        Some(mv)
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.history.last().map(|(_, mv)| mv)
    }

    /// Number of moves applied since construction or reset
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position.board().piece_at(square)
    }

    /// Pieces of both colors with their squares
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        let board = self.position.board();
        board
            .occupied()
            .into_iter()
            .filter_map(move |sq| board.piece_at(sq).map(|piece| (sq, piece)))
    }

    /// True if any piece of `color` attacks `square`
    pub fn is_attacked_by(&self, square: Square, color: Color) -> bool {
        let board = self.position.board();
        let attackers: Bitboard = board.attacks_to(square, color, board.occupied());
        !attackers.is_empty()
    }

    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.position.is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.position.is_insufficient_material()
    }

    /// Checkmate, stalemate or insufficient material
    pub fn is_terminal(&self) -> bool {
        self.status().is_over()
    }

    pub fn status(&self) -> GameStatus {
        if self.is_checkmate() {
            GameStatus::Checkmate {
                winner: !self.turn(),
            }
        } else if self.is_stalemate() {
            GameStatus::Stalemate
        } else if self.is_insufficient_material() {
            GameStatus::InsufficientMaterial
        } else {
            GameStatus::Ongoing
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
