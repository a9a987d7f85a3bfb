//! Episodic training loop
//!
//! ## Architecture
//!
//! - Level 1: `train` / `Trainer::train_with_callback` (orchestration)
//! - Level 2: `Trainer::run_episode_from` (one game against the opponent)
//! - Level 3: agent and opponent half-moves
//! - Level 4: outcome bookkeeping

use serde::Serialize;
use tabchess_core::{
    color_name, ActionKey, Color, GameState, GameStatus, HeuristicOpponent, Result, RewardModel,
};

use crate::agent::TabularAgent;
use crate::config::TrainingConfig;

// ============================================================================
// OUTCOMES
// ============================================================================

/// How an episode ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodeOutcome {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    /// Move cap reached with the game still running
    MoveCap,
}

impl EpisodeOutcome {
    fn classify(game: &GameState) -> Self {
        match game.status() {
            GameStatus::Checkmate { winner } => EpisodeOutcome::Checkmate { winner },
            GameStatus::Stalemate => EpisodeOutcome::Stalemate,
            GameStatus::InsufficientMaterial => EpisodeOutcome::InsufficientMaterial,
            GameStatus::Ongoing => EpisodeOutcome::MoveCap,
        }
    }

    pub fn winner(&self) -> Option<Color> {
        match self {
            EpisodeOutcome::Checkmate { winner } => Some(*winner),
            _ => None,
        }
    }
}

/// Summary of one finished episode
#[derive(Clone, Debug)]
pub struct EpisodeSummary {
    pub outcome: EpisodeOutcome,
    /// Moves applied by either side
    pub plies: usize,
    /// Value-table updates made by the agent
    pub updates: usize,
    /// Sum of rewards the agent received
    pub total_reward: f64,
    /// Exploration rate after the end-of-episode decay
    pub epsilon: f64,
}

/// Aggregate statistics over a training run
#[derive(Clone, Debug, Default, Serialize)]
pub struct TrainingReport {
    pub episodes: usize,
    pub agent_wins: usize,
    pub opponent_wins: usize,
    pub draws: usize,
    pub move_cap: usize,
    pub avg_plies: f64,
    pub avg_reward: f64,
    pub total_updates: usize,
    pub final_epsilon: f64,
    pub states: usize,
    pub entries: usize,
}

impl TrainingReport {
    fn record(&mut self, summary: &EpisodeSummary, agent_color: Color) {
        let n = self.episodes as f64;
        self.avg_plies = (self.avg_plies * n + summary.plies as f64) / (n + 1.0);
        self.avg_reward = (self.avg_reward * n + summary.total_reward) / (n + 1.0);
        self.episodes += 1;
        self.total_updates += summary.updates;

        match summary.outcome {
            EpisodeOutcome::Checkmate { winner } if winner == agent_color => self.agent_wins += 1,
            EpisodeOutcome::Checkmate { .. } => self.opponent_wins += 1,
            EpisodeOutcome::Stalemate | EpisodeOutcome::InsufficientMaterial => self.draws += 1,
            EpisodeOutcome::MoveCap => self.move_cap += 1,
        }
    }
}

// ============================================================================
// TRAINER
// ============================================================================

/// Plays the agent against the heuristic opponent and applies learning updates
pub struct Trainer {
    config: TrainingConfig,
    reward: RewardModel,
    opponent: HeuristicOpponent,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let reward = RewardModel::new(config.agent_color).with_weights(config.reward_weights.clone());
        Ok(Self {
            config,
            reward,
            opponent: HeuristicOpponent::new(),
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run all configured episodes
    pub fn train(&self, agent: &mut TabularAgent) -> Result<TrainingReport> {
        self.train_with_callback(agent, |_, _, _| {})
    }

    /// Run all configured episodes, calling `callback(index, summary, agent)` after each
    pub fn train_with_callback<F>(
        &self,
        agent: &mut TabularAgent,
        mut callback: F,
    ) -> Result<TrainingReport>
    where
        F: FnMut(usize, &EpisodeSummary, &TabularAgent),
    {
        tracing::info!(
            "Training started: {} episodes, max_moves={}, agent plays {}",
            self.config.episodes,
            self.config.max_moves,
            color_name(self.config.agent_color)
        );

        let mut report = TrainingReport::default();
        let interval = self.config.report_interval.max(1);

        for episode in 0..self.config.episodes {
            let summary = self.run_episode(agent)?;
            report.record(&summary, self.config.agent_color);

            if episode % interval == 0 {
                tracing::info!(
                    "Episode {} complete (epsilon: {:.3})",
                    episode,
                    agent.epsilon()
                );
            }

            callback(episode, &summary, agent);
        }

        report.final_epsilon = agent.epsilon();
        report.states = agent.table().state_count();
        report.entries = agent.table().entry_count();

        tracing::info!(
            "Training finished: {} wins, {} losses, {} draws, {} capped; {} states learned",
            report.agent_wins,
            report.opponent_wins,
            report.draws,
            report.move_cap,
            report.states
        );

        Ok(report)
    }

    /// One episode from the standard starting position
    pub fn run_episode(&self, agent: &mut TabularAgent) -> Result<EpisodeSummary> {
        self.run_episode_from(agent, GameState::new())
    }

    /// One episode from `start`, ending on a terminal position, a side with no
    /// move, or the move cap. Exploration decays exactly once per call.
    pub fn run_episode_from(
        &self,
        agent: &mut TabularAgent,
        start: GameState,
    ) -> Result<EpisodeSummary> {
        let mut game = start;
        let mut state = game.key();
        let mut plies = 0;
        let mut updates = 0;
        let mut total_reward = 0.0;

        // Checkmate and stalemate surface as an empty legal set for the side to move
        while !game.is_insufficient_material() && plies < self.config.max_moves {
            if game.turn() == self.config.agent_color {
                let moves = game.legal_moves();
                let legal: Vec<ActionKey> = moves.iter().map(ActionKey::from_move).collect();

                let index = match agent.select_index(&state, &legal) {
                    Some(index) => index,
                    None => break,
                };

                game.apply(&moves[index])?;
                let reward = self.reward.score(&game);
                let next_state = game.key();
                agent.update(&state, Some(&legal[index]), reward, &next_state)?;

                state = next_state;
                updates += 1;
                total_reward += reward;
            } else {
                let mv = match self.opponent.best_move(&game) {
                    Some(mv) => mv,
                    None => break,
                };
                game.apply(&mv)?;
                state = game.key();
            }

            plies += 1;
        }

        agent.decay_exploration();

        let outcome = EpisodeOutcome::classify(&game);
        tracing::debug!("Episode ended: {:?} after {} plies", outcome, plies);

        Ok(EpisodeSummary {
            outcome,
            plies,
            updates,
            total_reward,
            epsilon: agent.epsilon(),
        })
    }
}

/// Build an agent from `config`, train it and hand it back with the run's report
pub fn train(config: TrainingConfig) -> Result<(TabularAgent, TrainingReport)> {
    let mut agent = TabularAgent::new(config.agent.clone())?;
    let trainer = Trainer::new(config)?;
    let report = trainer.train(&mut agent)?;
    Ok((agent, report))
}

// ============================================================================
// TESTS
// ============================================================================
