//! Epsilon-greedy tabular Q-learning agent

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tabchess_core::{ActionKey, GameState, Result, StateKey};

use crate::config::AgentConfig;
use crate::value_table::ValueTable;

// ============================================================================
// POLICY
// ============================================================================

/// Epsilon-greedy choice over `legal`, returning an index into it
///
/// With probability `epsilon` the pick is uniform over all legal actions;
/// otherwise it is uniform over the actions sharing the highest value.
pub fn policy_index<R: Rng + ?Sized>(
    table: &ValueTable,
    state: &StateKey,
    legal: &[ActionKey],
    epsilon: f64,
    rng: &mut R,
) -> Option<usize> {
    if legal.is_empty() {
        return None;
    }

    if rng.gen::<f64>() < epsilon {
        Some(rng.gen_range(0..legal.len()))
    } else {
        Some(greedy_index(table, state, legal, rng))
    }
}

/// Highest-valued action, ties broken uniformly at random
fn greedy_index<R: Rng + ?Sized>(
    table: &ValueTable,
    state: &StateKey,
    legal: &[ActionKey],
    rng: &mut R,
) -> usize {
    let mut best_value = f64::NEG_INFINITY;
    let mut best: Vec<usize> = Vec::new();

    for (index, action) in legal.iter().enumerate() {
        let value = table.get(state, action);
        if value > best_value {
            best_value = value;
            best.clear();
            best.push(index);
        } else if value == best_value {
            best.push(index);
        }
    }

    best.choose(rng).copied().unwrap_or(0)
}

// ============================================================================
// AGENT
// ============================================================================

/// Owns the value table, the exploration rate and its random source
#[derive(Clone, Debug)]
pub struct TabularAgent {
    table: ValueTable,
    epsilon: f64,
    config: AgentConfig,
    rng: ChaCha8Rng,
}

impl TabularAgent {
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            table: ValueTable::new(),
            epsilon: config.epsilon_start,
            config,
            rng,
        })
    }

    /// Pick an action for `state`; `None` when there is nothing legal
    pub fn select_action(&mut self, state: &StateKey, legal: &[ActionKey]) -> Option<ActionKey> {
        self.select_index(state, legal).map(|index| legal[index].clone())
    }

    /// Same as [`TabularAgent::select_action`] but returns the index into `legal`
    pub fn select_index(&mut self, state: &StateKey, legal: &[ActionKey]) -> Option<usize> {
        policy_index(&self.table, state, legal, self.epsilon, &mut self.rng)
    }

    /// Action for a front-end showing a position to a player.
    ///
    /// Uses whatever exploration rate training ended with, so post-training
    /// play can still be partly random. Callers that want pure exploitation
    /// must lower it with [`TabularAgent::set_epsilon`].
    pub fn choose_move(&mut self, state: &StateKey, legal: &[ActionKey]) -> Option<ActionKey> {
        self.select_action(state, legal)
    }

    /// One-step Q-learning update.
    ///
    /// `Q(s,a) <- (1-α)·Q(s,a) + α·(r + γ·max_a' Q(s',a'))`, where the legal
    /// actions at `s'` are re-derived by decoding `next_state`. A missing
    /// action is a no-op; an undecodable `next_state` aborts the update.
    pub fn update(
        &mut self,
        state: &StateKey,
        action: Option<&ActionKey>,
        reward: f64,
        next_state: &StateKey,
    ) -> Result<()> {
        let action = match action {
            Some(action) => action,
            None => return Ok(()),
        };

        let next_legal = GameState::from_key(next_state)?.legal_actions();
        let next_max = self.table.max_value(next_state, &next_legal).unwrap_or(0.0);

        let alpha = self.config.learning_rate;
        let target = reward + self.config.discount_factor * next_max;
        let old = self.table.get(state, action);
        self.table.set(state, action, (1.0 - alpha) * old + alpha * target);

        Ok(())
    }

    /// `ε <- max(ε_min, ε · decay)`; called once per finished episode
    pub fn decay_exploration(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Override the exploration rate (clamped to [0, 1])
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    pub fn value(&self, state: &StateKey, action: &ActionKey) -> f64 {
        self.table.get(state, action)
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tabchess_core::Error;

    fn agent(epsilon: f64, seed: u64) -> TabularAgent {
        let config = AgentConfig::default()
            .with_exploration(epsilon, 0.0, 0.5)
            .with_seed(seed);
        TabularAgent::new(config).unwrap()
    }

    fn action(raw: &str) -> ActionKey {
        ActionKey::parse(raw).unwrap()
    }

    fn after(moves: &[&str]) -> GameState {
        let mut game = GameState::new();
        for uci in moves {
            game.apply_action(&action(uci)).unwrap();
        }
        game
    }

    #[test]
    fn test_empty_legal_set_returns_none() {
        let state = GameState::new().key();
        for epsilon in [0.0, 0.3, 1.0] {
            let mut a = agent(epsilon, 1);
            assert_eq!(a.select_action(&state, &[]), None);
            assert_eq!(a.choose_move(&state, &[]), None);
        }
    }

    #[test]
    fn test_greedy_picks_highest_value() {
        let mut a = agent(0.0, 3);
        let game = GameState::new();
        let state = game.key();
        let legal = game.legal_actions();

        a.table.set(&state, &action("g1f3"), 0.7);
        a.table.set(&state, &action("e2e4"), 0.2);
        for _ in 0..20 {
            assert_eq!(a.select_action(&state, &legal), Some(action("g1f3")));
        }
    }

    #[test]
    fn test_greedy_breaks_ties_randomly() {
        // Empty table: every opening move is tied at 0.0
        let game = GameState::new();
        let state = game.key();
        let legal = game.legal_actions();

        let mut seen = HashSet::new();
        let mut a = agent(0.0, 11);
        for _ in 0..100 {
            seen.insert(a.select_action(&state, &legal).unwrap());
        }
        assert!(seen.len() > 1, "ties must not collapse to one move");

        // Reordering the legal list does not bias the choice to a position
        let mut reversed = legal.clone();
        reversed.reverse();
        let mut seen_reversed = HashSet::new();
        for _ in 0..100 {
            seen_reversed.insert(a.select_action(&state, &reversed).unwrap());
        }
        assert!(seen_reversed.len() > 1);
    }

    #[test]
    fn test_ties_only_among_maximum() {
        let mut a = agent(0.0, 5);
        let game = GameState::new();
        let state = game.key();
        let legal = game.legal_actions();

        for other in &legal {
            a.table.set(&state, other, -1.0);
        }
        a.table.set(&state, &action("e2e4"), 1.0);
        a.table.set(&state, &action("d2d4"), 1.0);

        let mut seen = HashSet::new();
        for _ in 0..100 {
            seen.insert(a.select_action(&state, &legal).unwrap());
        }
        let expected: HashSet<_> = [action("e2e4"), action("d2d4")].into_iter().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_full_exploration_ignores_values() {
        let mut a = agent(1.0, 9);
        let game = GameState::new();
        let state = game.key();
        let legal = game.legal_actions();
        a.table.set(&state, &action("e2e4"), 100.0);

        let picks: HashSet<_> = (0..200).filter_map(|_| a.select_action(&state, &legal)).collect();
        assert!(picks.len() > 5);
    }

    #[test]
    fn test_update_without_action_is_noop() {
        let mut a = agent(0.5, 2);
        let state = GameState::new().key();
        let next = after(&["e2e4"]).key();
        a.table.set(&state, &action("d2d4"), 0.4);

        let before = a.table().clone();
        a.update(&state, None, 42.0, &next).unwrap();
        assert_eq!(a.table(), &before);

        // Even an undecodable next state is never looked at
        a.update(&state, None, 1.0, &StateKey::from_raw("garbage")).unwrap();
        assert_eq!(a.table(), &before);
    }

    #[test]
    fn test_update_rule() {
        let mut a = agent(0.0, 4);
        let state = GameState::new().key();
        let e4 = action("e2e4");
        let next = after(&["e2e4"]).key();

        // All next-state values are zero: Q = 0.9 * 0 + 0.1 * (2 + 0)
        a.update(&state, Some(&e4), 2.0, &next).unwrap();
        assert!((a.value(&state, &e4) - 0.2).abs() < 1e-12);

        // With a best reply worth 3.0: Q = 0.9 * 0.2 + 0.1 * (1 + 0.9 * 3)
        a.table.set(&next, &action("e7e5"), 3.0);
        a.table.set(&next, &action("d7d5"), -1.0);
        a.update(&state, Some(&e4), 1.0, &next).unwrap();
        let expected = 0.9 * 0.2 + 0.1 * (1.0 + 0.9 * 3.0);
        assert!((a.value(&state, &e4) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_reads_leave_table_untouched() {
        let mut a = agent(0.0, 6);
        let game = GameState::new();
        let state = game.key();
        let legal = game.legal_actions();

        // Selection and value queries on an unseen state store nothing
        assert!(a.select_action(&state, &legal).is_some());
        assert_eq!(a.value(&state, &legal[0]), 0.0);
        assert!(a.table().is_empty());

        // An update writes only the (state, action) pair it was given
        let next = after(&["e2e4"]).key();
        a.update(&state, Some(&action("e2e4")), 1.0, &next).unwrap();
        assert_eq!(a.table().lookup(&state, &action("e2e4")), Some(0.1));
        assert_eq!(a.table().lookup(&state, &action("d2d4")), None);
        assert!(!a.table().contains_state(&next));
        assert_eq!(a.table().entry_count(), 1);
    }

    #[test]
    fn test_update_uses_only_legal_next_actions() {
        let mut a = agent(0.0, 4);
        let state = GameState::new().key();
        let e4 = action("e2e4");
        let next = after(&["e2e4"]).key();

        // A stale, non-legal entry at the next state must not feed the target
        a.table.set(&next, &action("e2e4"), 50.0);
        a.update(&state, Some(&e4), 0.0, &next).unwrap();
        assert_eq!(a.value(&state, &e4), 0.0);
    }

    #[test]
    fn test_update_terminal_next_state() {
        let mut a = agent(0.0, 4);
        let before = GameState::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let mut mated = before.clone();
        mated.apply_action(&action("a1a8")).unwrap();

        a.update(&before.key(), Some(&action("a1a8")), 100.0, &mated.key())
            .unwrap();
        assert!((a.value(&before.key(), &action("a1a8")) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_update_rejects_malformed_next_state() {
        let mut a = agent(0.0, 4);
        let state = GameState::new().key();
        let result = a.update(&state, Some(&action("e2e4")), 1.0, &StateKey::from_raw("x y z w"));
        assert!(matches!(result, Err(Error::MalformedState { .. })));
        assert!(a.table().is_empty());
    }

    #[test]
    fn test_decay_is_monotonic_and_floored() {
        let config = AgentConfig::default().with_exploration(1.0, 0.05, 0.9).with_seed(1);
        let mut a = TabularAgent::new(config).unwrap();

        let mut previous = a.epsilon();
        for _ in 0..200 {
            a.decay_exploration();
            assert!(a.epsilon() <= previous);
            assert!(a.epsilon() >= 0.05);
            previous = a.epsilon();
        }
        assert_eq!(a.epsilon(), 0.05);
    }

    #[test]
    fn test_single_decay_step() {
        let mut a = TabularAgent::new(AgentConfig::default().with_seed(1)).unwrap();
        a.decay_exploration();
        assert!((a.epsilon() - 0.9999).abs() < 1e-12);
    }

    #[test]
    fn test_set_epsilon_clamps() {
        let mut a = agent(0.5, 1);
        a.set_epsilon(2.0);
        assert_eq!(a.epsilon(), 1.0);
        a.set_epsilon(0.0);
        assert_eq!(a.epsilon(), 0.0);
    }

    #[test]
    fn test_seeded_agents_agree() {
        let game = GameState::new();
        let legal = game.legal_actions();
        let mut a = agent(0.5, 77);
        let mut b = agent(0.5, 77);
        for _ in 0..20 {
            assert_eq!(a.select_action(&game.key(), &legal), b.select_action(&game.key(), &legal));
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AgentConfig {
            discount_factor: 1.2,
            ..Default::default()
        };
        assert!(TabularAgent::new(config).is_err());
    }
}
