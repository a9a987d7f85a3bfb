//! Evaluation matches: trained policy vs heuristic opponent, no learning
//!
//! Level 2 - Phase-level implementation

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tabchess_core::{ActionKey, Color, GameState, GameStatus, HeuristicOpponent, Result};

use crate::agent::{policy_index, TabularAgent};
use crate::config::EvalConfig;
use crate::value_table::ValueTable;

/// Result of a single evaluation game, from the agent's side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

/// Outcome of one evaluation game
#[derive(Clone, Debug, Serialize)]
pub struct GameRecord {
    pub game_index: usize,
    pub result: GameResult,
    pub plies: usize,
    /// Moves in UCI notation
    pub moves: Vec<ActionKey>,
}

/// Aggregated evaluation results
#[derive(Clone, Debug, Default, Serialize)]
pub struct MatchResult {
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub games_played: usize,
    pub avg_plies: f64,
}

impl MatchResult {
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins as f64 / self.games_played as f64
        }
    }

    /// Wins = 1.0, Draws = 0.5, Losses = 0.0, averaged
    pub fn score(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            (self.wins as f64 + 0.5 * self.draws as f64) / self.games_played as f64
        }
    }

    fn from_records(records: &[GameRecord]) -> Self {
        let count = |r: GameResult| records.iter().filter(|g| g.result == r).count();
        let total_plies: usize = records.iter().map(|g| g.plies).sum();

        MatchResult {
            wins: count(GameResult::Win),
            losses: count(GameResult::Loss),
            draws: count(GameResult::Draw),
            games_played: records.len(),
            avg_plies: if records.is_empty() {
                0.0
            } else {
                total_plies as f64 / records.len() as f64
            },
        }
    }
}

/// Play `config.games` games between the agent's policy and the heuristic opponent
pub fn evaluate(agent: &TabularAgent, config: &EvalConfig) -> Result<(MatchResult, Vec<GameRecord>)> {
    config.validate()?;
    let table = agent.table();

    let records: Vec<GameRecord> = if config.parallel {
        (0..config.games)
            .into_par_iter()
            .map(|i| play_single_game(table, config, i))
            .collect::<Result<_>>()?
    } else {
        (0..config.games)
            .map(|i| play_single_game(table, config, i))
            .collect::<Result<_>>()?
    };

    let result = MatchResult::from_records(&records);
    tracing::info!(
        "Evaluation: {} wins, {} losses, {} draws over {} games",
        result.wins,
        result.losses,
        result.draws,
        result.games_played
    );

    Ok((result, records))
}

/// One game; draws include move-cap games
fn play_single_game(table: &ValueTable, config: &EvalConfig, game_index: usize) -> Result<GameRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(game_index as u64));
    let opponent = HeuristicOpponent::new();
    let mut game = GameState::new();
    let mut moves = Vec::new();

    while !game.is_terminal() && moves.len() < config.max_moves {
        let mv = if game.turn() == config.agent_color {
            let legal_moves = game.legal_moves();
            let legal: Vec<ActionKey> = legal_moves.iter().map(ActionKey::from_move).collect();
            match policy_index(table, &game.key(), &legal, config.epsilon, &mut rng) {
                Some(index) => legal_moves[index].clone(),
                None => break,
            }
        } else {
            match opponent.best_move(&game) {
                Some(mv) => mv,
                None => break,
            }
        };

        game.apply(&mv)?;
        moves.push(ActionKey::from_move(&mv));
    }

    Ok(GameRecord {
        game_index,
        result: result_for(game.status(), config.agent_color),
        plies: moves.len(),
        moves,
    })
}

fn result_for(status: GameStatus, agent_color: Color) -> GameResult {
    match status {
        GameStatus::Checkmate { winner } if winner == agent_color => GameResult::Win,
        GameStatus::Checkmate { .. } => GameResult::Loss,
        _ => GameResult::Draw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;

    fn fresh_agent() -> TabularAgent {
        TabularAgent::new(AgentConfig::default().with_seed(1)).unwrap()
    }

    #[test]
    fn test_evaluate_counts_games() {
        let config = EvalConfig {
            games: 4,
            max_moves: 12,
            ..Default::default()
        };
        let (result, records) = evaluate(&fresh_agent(), &config).unwrap();
        assert_eq!(result.games_played, 4);
        assert_eq!(records.len(), 4);
        assert_eq!(result.wins + result.losses + result.draws, 4);
        assert!(records.iter().all(|r| r.plies <= 12));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let agent = fresh_agent();
        let parallel = EvalConfig {
            games: 3,
            max_moves: 16,
            parallel: true,
            ..Default::default()
        };
        let sequential = EvalConfig {
            parallel: false,
            ..parallel.clone()
        };

        let (_, a) = evaluate(&agent, &parallel).unwrap();
        let (_, b) = evaluate(&agent, &sequential).unwrap();
        let moves_a: Vec<_> = a.iter().map(|r| r.moves.clone()).collect();
        let moves_b: Vec<_> = b.iter().map(|r| r.moves.clone()).collect();
        assert_eq!(moves_a, moves_b);
    }

    #[test]
    fn test_evaluation_does_not_learn() {
        let agent = fresh_agent();
        let before = agent.table().clone();
        let _ = evaluate(&agent, &EvalConfig::new(2)).unwrap();
        assert_eq!(agent.table(), &before);
    }

    #[test]
    fn test_match_result_rates() {
        let records = vec![
            GameRecord { game_index: 0, result: GameResult::Win, plies: 10, moves: vec![] },
            GameRecord { game_index: 1, result: GameResult::Draw, plies: 20, moves: vec![] },
            GameRecord { game_index: 2, result: GameResult::Loss, plies: 30, moves: vec![] },
            GameRecord { game_index: 3, result: GameResult::Win, plies: 40, moves: vec![] },
        ];
        let result = MatchResult::from_records(&records);
        assert_eq!(result.wins, 2);
        assert_eq!(result.draws, 1);
        assert_eq!(result.losses, 1);
        assert_eq!(result.win_rate(), 0.5);
        assert_eq!(result.score(), 0.625);
        assert_eq!(result.avg_plies, 25.0);

        assert_eq!(MatchResult::from_records(&[]).win_rate(), 0.0);
    }

    #[test]
    fn test_result_for() {
        let mate = GameStatus::Checkmate { winner: Color::Black };
        assert_eq!(result_for(mate, Color::Black), GameResult::Win);
        assert_eq!(result_for(mate, Color::White), GameResult::Loss);
        assert_eq!(result_for(GameStatus::Stalemate, Color::White), GameResult::Draw);
        assert_eq!(result_for(GameStatus::Ongoing, Color::White), GameResult::Draw);
    }
}
