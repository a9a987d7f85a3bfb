//! Sparse state-action value table

use rustc_hash::FxHashMap;
use tabchess_core::{ActionKey, StateKey};

/// Value of any pair that has never been written
pub const DEFAULT_VALUE: f64 = 0.0;

/// Two-level map `state -> action -> value`
///
/// Reads never create entries; only [`ValueTable::set`] does. Entries are
/// never removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueTable {
    entries: FxHashMap<StateKey, FxHashMap<ActionKey, f64>>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value, or [`DEFAULT_VALUE`] for an unseen pair
    pub fn get(&self, state: &StateKey, action: &ActionKey) -> f64 {
        self.entries
            .get(state)
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or(DEFAULT_VALUE)
    }

    /// Stored value without defaulting
    pub fn lookup(&self, state: &StateKey, action: &ActionKey) -> Option<f64> {
        self.entries.get(state)?.get(action).copied()
    }

    pub fn set(&mut self, state: &StateKey, action: &ActionKey, value: f64) {
        self.entries
            .entry(state.clone())
            .or_default()
            .insert(action.clone(), value);
    }

    /// Highest value over `actions`, `None` if `actions` is empty
    pub fn max_value(&self, state: &StateKey, actions: &[ActionKey]) -> Option<f64> {
        actions
            .iter()
            .map(|action| self.get(state, action))
            .fold(None, |best, value| match best {
                Some(top) if top >= value => Some(top),
                _ => Some(value),
            })
    }

    /// Recorded actions of one state
    pub fn actions(&self, state: &StateKey) -> Option<&FxHashMap<ActionKey, f64>> {
        self.entries.get(state)
    }

    pub fn contains_state(&self, state: &StateKey) -> bool {
        self.entries.contains_key(state)
    }

    /// Number of states with at least one recorded action
    pub fn state_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of recorded state-action pairs
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(|actions| actions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
