//! Gym, agent and tournament configuration.

use gomoku_board::{DEFAULT_BOARD_SIZE, DEFAULT_WIN_LENGTH};
use gomoku_core::{GomokuError, Result};
use gomoku_mcts::{EstimatorKind, SearchSettings};
use serde::{Deserialize, Serialize};

/// How one player searches.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub kind: EstimatorKind,

    /// Playouts before the first move of a game (and every move in matches).
    pub playouts: u32,

    /// PUCT exploration constant C.
    pub exploration: f32,

    /// Enables root noise and keeps the whole tree for sample extraction.
    pub training: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::self_play()
    }
}

impl AgentSettings {
    /// The self-play agent: neural search with root noise.
    pub fn self_play() -> Self {
        Self {
            kind: EstimatorKind::Neural,
            playouts: 100,
            exploration: 1.1,
            training: true,
        }
    }

    /// An agent for evaluation matches.
    pub fn evaluation(kind: EstimatorKind, playouts: u32) -> Self {
        Self {
            kind,
            playouts,
            exploration: 1.0,
            training: false,
        }
    }

    /// `base` with this agent's search parameters applied.
    pub fn search_settings(&self, base: &SearchSettings) -> SearchSettings {
        let mut settings = base.clone();
        settings.mcts.num_simulations = self.playouts;
        settings.mcts.exploration = self.exploration;
        settings.mcts.training = self.training;
        settings.mcts.prune_on_move = !self.training;
        if !self.training {
            settings.mcts.exploration_fraction = 0.0;
        }
        settings.rollout.num_simulations = self.playouts;
        settings
    }

    pub fn validate(&self) -> Result<()> {
        if self.playouts == 0 {
            return Err(GomokuError::InvalidConfig(
                "agent playouts must be at least 1".to_string(),
            ));
        }
        if !self.exploration.is_finite() || self.exploration <= 0.0 {
            return Err(GomokuError::InvalidConfig(format!(
                "agent exploration must be positive, got {}",
                self.exploration
            )));
        }
        Ok(())
    }
}

/// Gated evaluation of a freshly trained generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    /// Games against each baseline, first mover alternating. Must be even.
    pub games_per_baseline: usize,

    /// Minimum (wins + draws) / games needed for promotion.
    pub promotion_threshold: f32,

    /// Settings for both sides of every match.
    pub agent: AgentSettings,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            games_per_baseline: 4,
            promotion_threshold: 0.51,
            agent: AgentSettings::evaluation(EstimatorKind::Neural, 400),
        }
    }
}

impl TournamentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.games_per_baseline == 0 || self.games_per_baseline % 2 != 0 {
            return Err(GomokuError::InvalidConfig(format!(
                "games_per_baseline must be even and positive, got {}",
                self.games_per_baseline
            )));
        }
        if !(0.0..=1.0).contains(&self.promotion_threshold) {
            return Err(GomokuError::InvalidConfig(format!(
                "promotion_threshold must be in [0, 1], got {}",
                self.promotion_threshold
            )));
        }
        self.agent.validate()
    }
}

/// Self-play generation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GymConfig {
    pub board_size: usize,
    pub win_length: usize,

    /// Worker threads; 0 uses the available parallelism.
    pub workers: usize,

    /// Games started together between two stop checks.
    pub games_per_batch: usize,

    /// Stop once a generation has produced more samples than this.
    pub max_samples_per_generation: usize,

    /// Together with `min_games`, the normal stopping point.
    pub min_samples: usize,
    pub min_games: usize,

    /// Games per overfit-check interval.
    pub overfit_exit_interval: usize,

    /// Fewer new samples than this over one interval ends the generation.
    pub new_sample_threshold: usize,

    /// Buffer capacity; the oldest samples are evicted beyond it.
    pub max_buffer_samples: usize,

    /// Samples handed to the trainer per generation.
    pub training_sample_size: usize,

    /// Random playout budget for every move after the first.
    pub min_move_playouts: u32,
    pub max_move_playouts: u32,

    /// Keep the sample buffer and known positions between generations.
    pub carry_over_samples: bool,

    pub seed: u64,
    pub agent: AgentSettings,
    pub search: SearchSettings,

    /// `None` promotes every trained generation without evaluation.
    pub tournament: Option<TournamentConfig>,
}

impl Default for GymConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            win_length: DEFAULT_WIN_LENGTH,
            workers: 0,
            games_per_batch: 48,
            max_samples_per_generation: 200_000,
            min_samples: 1024,
            min_games: 200,
            overfit_exit_interval: 100,
            new_sample_threshold: 50,
            max_buffer_samples: 2_000_000,
            training_sample_size: 1024 * 20,
            min_move_playouts: 10,
            max_move_playouts: 100,
            carry_over_samples: true,
            seed: 42,
            agent: AgentSettings::self_play(),
            search: SearchSettings::default(),
            tournament: None,
        }
    }
}

impl GymConfig {
    pub fn with_tournament(mut self, tournament: TournamentConfig) -> Self {
        self.tournament = Some(tournament);
        self
    }

    /// Search settings with this gym's win length applied.
    pub fn search_settings(&self) -> SearchSettings {
        self.search.clone().with_win_length(self.win_length)
    }

    pub fn validate(&self) -> Result<()> {
        if self.games_per_batch == 0 {
            return Err(GomokuError::InvalidConfig(
                "games_per_batch must be at least 1".to_string(),
            ));
        }
        if self.overfit_exit_interval == 0 {
            return Err(GomokuError::InvalidConfig(
                "overfit_exit_interval must be at least 1".to_string(),
            ));
        }
        if self.training_sample_size == 0 {
            return Err(GomokuError::InvalidConfig(
                "training_sample_size must be at least 1".to_string(),
            ));
        }
        if self.min_move_playouts == 0 || self.min_move_playouts >= self.max_move_playouts {
            return Err(GomokuError::InvalidConfig(format!(
                "move playouts range {}..{} is empty",
                self.min_move_playouts, self.max_move_playouts
            )));
        }
        if self.agent.kind != EstimatorKind::Neural {
            return Err(GomokuError::InvalidConfig(format!(
                "self-play needs a sample-producing estimator, got {}",
                self.agent.kind
            )));
        }
        gomoku_board::Board::new(self.board_size)?;
        self.agent.validate()?;
        self.search_settings().validate()?;
        if let Some(tournament) = &self.tournament {
            tournament.validate()?;
        }
        Ok(())
    }
}
