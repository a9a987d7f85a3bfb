//! Hashable state and action keys
//!
//! A [`StateKey`] is the first four FEN fields of a position (placement, side
//! to move, castling rights, legal en-passant square). Move counters are left
//! out so transpositions share a key. An [`ActionKey`] is the UCI text of a
//! move with standard castling notation.

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move};

use crate::error::{Error, Result};

/// Number of FEN fields kept in a state key
const KEY_FIELDS: usize = 4;

/// Counters appended when a key is turned back into a full FEN
const COUNTER_SUFFIX: &str = " 0 1";

/// Canonical position key
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey(String);

impl StateKey {
    /// Encode a position
    pub fn from_position(pos: &Chess) -> Self {
        let fen = Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string();
        let key = fen
            .split_whitespace()
            .take(KEY_FIELDS)
            .collect::<Vec<_>>()
            .join(" ");
        StateKey(key)
    }

    /// Wrap a raw key without checking it; decoding reports problems later
    pub fn from_raw(raw: impl Into<String>) -> Self {
        StateKey(raw.into())
    }

    /// Decode back into a playable position
    pub fn to_position(&self) -> Result<Chess> {
        let fields = self.0.split_whitespace().count();
        if fields != KEY_FIELDS {
            return Err(Error::MalformedState {
                key: self.0.clone(),
                reason: format!("expected {} fields, found {}", KEY_FIELDS, fields),
            });
        }

        let full = format!("{}{}", self.0, COUNTER_SUFFIX);
        let fen = full.parse::<Fen>().map_err(|e| Error::MalformedState {
            key: self.0.clone(),
            reason: e.to_string(),
        })?;

        fen.into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| Error::MalformedState {
                key: self.0.clone(),
                reason: e.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical move key (UCI text)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionKey(String);

impl ActionKey {
    pub fn from_move(mv: &Move) -> Self {
        ActionKey(mv.to_uci(CastlingMode::Standard).to_string())
    }

    /// Parse user or caller supplied UCI text
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        trimmed
            .parse::<UciMove>()
            .map_err(|e| Error::MalformedAction {
                action: trimmed.to_string(),
                reason: e.to_string(),
            })?;
        Ok(ActionKey(trimmed.to_string()))
    }

    /// Resolve to a legal move in `pos`
    pub fn to_move(&self, pos: &Chess) -> Result<Move> {
        let uci = self.0.parse::<UciMove>().map_err(|e| Error::MalformedAction {
            action: self.0.clone(),
            reason: e.to_string(),
        })?;

        uci.to_move(pos).map_err(|_| Error::IllegalAction {
            action: self.0.clone(),
            state: StateKey::from_position(pos).into_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
