//! Configuration types for training and evaluation

use tabchess_core::{Color, Error, Result, RewardWeights};

/// Default move cap per episode (plies)
pub const DEFAULT_MAX_MOVES: usize = 100;

/// Hyper-parameters of the tabular agent
#[derive(Clone, Debug, PartialEq)]
pub struct AgentConfig {
    /// Learning rate α
    pub learning_rate: f64,
    /// Discount factor γ
    pub discount_factor: f64,
    /// Initial exploration rate
    pub epsilon_start: f64,
    /// Floor for the exploration rate
    pub epsilon_min: f64,
    /// Multiplicative decay applied once per episode
    pub epsilon_decay: f64,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.9999,
            seed: None,
        }
    }
}

impl AgentConfig {
    /// Set exploration schedule
    pub fn with_exploration(mut self, start: f64, min: f64, decay: f64) -> Self {
        self.epsilon_start = start;
        self.epsilon_min = min;
        self.epsilon_decay = decay;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_unit("learning_rate", self.learning_rate)?;
        check_unit("discount_factor", self.discount_factor)?;
        check_unit("epsilon_start", self.epsilon_start)?;
        check_unit("epsilon_min", self.epsilon_min)?;

        if self.epsilon_min > self.epsilon_start {
            return Err(Error::invalid_config(format!(
                "epsilon_min ({}) exceeds epsilon_start ({})",
                self.epsilon_min, self.epsilon_start
            )));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(Error::invalid_config(format!(
                "epsilon_decay must be in (0, 1], got {}",
                self.epsilon_decay
            )));
        }
        Ok(())
    }
}

/// Training loop configuration
#[derive(Clone, Debug)]
pub struct TrainingConfig {
    /// Agent hyper-parameters
    pub agent: AgentConfig,
    /// Number of episodes to run
    pub episodes: usize,
    /// Maximum plies per episode
    pub max_moves: usize,
    /// Log progress every this many episodes
    pub report_interval: usize,
    /// Side played by the agent; the heuristic opponent takes the other
    pub agent_color: Color,
    /// Reward shaping weights
    pub reward_weights: RewardWeights,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            episodes: 1000,
            max_moves: DEFAULT_MAX_MOVES,
            report_interval: 100,
            agent_color: Color::White,
            reward_weights: RewardWeights::default(),
        }
    }
}

impl TrainingConfig {
    /// Create config for the given number of episodes
    pub fn new(episodes: usize) -> Self {
        Self {
            episodes,
            ..Default::default()
        }
    }

    /// Set agent hyper-parameters
    pub fn with_agent(mut self, agent: AgentConfig) -> Self {
        self.agent = agent;
        self
    }

    /// Set move cap
    pub fn with_max_moves(mut self, max_moves: usize) -> Self {
        self.max_moves = max_moves;
        self
    }

    /// Set the agent's side
    pub fn with_agent_color(mut self, color: Color) -> Self {
        self.agent_color = color;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        if self.max_moves == 0 {
            return Err(Error::invalid_config("max_moves must be at least 1"));
        }
        Ok(())
    }
}

/// Configuration for evaluation matches against the heuristic opponent
#[derive(Clone, Debug)]
pub struct EvalConfig {
    /// Number of games to play
    pub games: usize,
    /// Maximum plies per game
    pub max_moves: usize,
    /// Exploration rate used while evaluating (0.0 = greedy)
    pub epsilon: f64,
    /// Side played by the agent
    pub agent_color: Color,
    /// Whether to run games in parallel
    pub parallel: bool,
    /// Base seed; game `i` uses `seed + i`
    pub seed: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            games: 20,
            max_moves: DEFAULT_MAX_MOVES,
            epsilon: 0.0,
            agent_color: Color::White,
            parallel: true,
            seed: 42,
        }
    }
}

impl EvalConfig {
    /// Create config with specified number of games
    pub fn new(games: usize) -> Self {
        Self {
            games,
            ..Default::default()
        }
    }

    /// Set evaluation exploration rate
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_unit("epsilon", self.epsilon)?;
        if self.max_moves == 0 {
            return Err(Error::invalid_config("max_moves must be at least 1"));
        }
        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_config(format!(
            "{} must be in [0, 1], got {}",
            name, value
        )))
    }
}
