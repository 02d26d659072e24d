//! The common move-estimator contract and a factory over its implementations.

use crate::{
    alphabeta::AlphaBetaEstimator,
    background::CancelToken,
    config::{AlphaBetaConfig, MctsConfig, RolloutConfig},
    evaluator::Evaluator,
    random::{self, RandomEstimator},
    rollout::RolloutEstimator,
    samples::TrainingSample,
    search::MctsEstimator,
};
use gomoku_board::{Board, Color, Move};
use gomoku_core::{GomokuError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A move chooser that can be driven one unit of work at a time.
///
/// Every implementation keeps its own copy of the game: the driver replays
/// each played move through `select_next`, calls `estimate_once` until
/// `is_ready`, then asks for `best_move`.
pub trait Estimator: Send {
    fn kind(&self) -> EstimatorKind;

    /// Reset to `board` with `to_move` to play, discarding any search state.
    fn init_from_state(&mut self, board: &Board, to_move: Color) -> Result<()>;

    /// Apply a move made by `color`. Returns `false` for an occupied or
    /// off-board cell, leaving the estimator unchanged.
    fn select_next(&mut self, x: i32, y: i32, color: Color) -> bool;

    /// Perform one unit of work (one simulation, one full search, ...).
    fn estimate_once(&mut self) -> Result<()>;

    /// Work units completed for the current position.
    fn playouts(&self) -> u32;

    fn is_ready(&self, playout_target: u32) -> bool {
        self.playouts() >= playout_target
    }

    /// Preferred move, or `Move::NONE` when there is nothing to choose.
    fn best_move(&mut self) -> Move;

    /// Estimated value of `mv` for the player to move.
    fn move_value(&self, _mv: Move) -> f32 {
        0.0
    }

    /// Samples collected for the game so far; hashes are deduplicated
    /// against `known`.
    fn training_samples(
        &self,
        _winner: Option<Color>,
        _known: &mut HashSet<u64>,
    ) -> Vec<TrainingSample> {
        Vec::new()
    }

    fn attach_cancel(&mut self, _token: CancelToken) {}

    /// The last search ran to completion rather than being cancelled.
    fn is_search_complete(&self) -> bool {
        false
    }

    /// Meant to be run on a [`crate::BackgroundSearch`] thread.
    fn supports_background(&self) -> bool {
        false
    }
}

impl<E: Estimator + ?Sized> Estimator for Box<E> {
    fn kind(&self) -> EstimatorKind {
        (**self).kind()
    }

    fn init_from_state(&mut self, board: &Board, to_move: Color) -> Result<()> {
        (**self).init_from_state(board, to_move)
    }

    fn select_next(&mut self, x: i32, y: i32, color: Color) -> bool {
        (**self).select_next(x, y, color)
    }

    fn estimate_once(&mut self) -> Result<()> {
        (**self).estimate_once()
    }

    fn playouts(&self) -> u32 {
        (**self).playouts()
    }

    fn is_ready(&self, playout_target: u32) -> bool {
        (**self).is_ready(playout_target)
    }

    fn best_move(&mut self) -> Move {
        (**self).best_move()
    }

    fn move_value(&self, mv: Move) -> f32 {
        (**self).move_value(mv)
    }

    fn training_samples(
        &self,
        winner: Option<Color>,
        known: &mut HashSet<u64>,
    ) -> Vec<TrainingSample> {
        (**self).training_samples(winner, known)
    }

    fn attach_cancel(&mut self, token: CancelToken) {
        (**self).attach_cancel(token)
    }

    fn is_search_complete(&self) -> bool {
        (**self).is_search_complete()
    }

    fn supports_background(&self) -> bool {
        (**self).supports_background()
    }
}

/// Which estimator to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    /// PUCT search guided by a policy/value evaluator.
    Neural,
    /// UCT search with random playouts.
    Rollout,
    /// Fixed-depth negamax over evaluator values.
    AlphaBeta,
    /// Uniform choice among nearby cells.
    Random,
}

impl EstimatorKind {
    pub const ALL: [EstimatorKind; 4] = [
        EstimatorKind::Neural,
        EstimatorKind::Rollout,
        EstimatorKind::AlphaBeta,
        EstimatorKind::Random,
    ];

    pub fn needs_evaluator(self) -> bool {
        matches!(self, EstimatorKind::Neural | EstimatorKind::AlphaBeta)
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EstimatorKind::Neural => "neural",
            EstimatorKind::Rollout => "rollout",
            EstimatorKind::AlphaBeta => "alphabeta",
            EstimatorKind::Random => "random",
        };
        f.write_str(name)
    }
}

impl FromStr for EstimatorKind {
    type Err = GomokuError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "neural" | "mcts" => Ok(EstimatorKind::Neural),
            "rollout" => Ok(EstimatorKind::Rollout),
            "alphabeta" | "alpha-beta" => Ok(EstimatorKind::AlphaBeta),
            "random" => Ok(EstimatorKind::Random),
            other => Err(GomokuError::InvalidConfig(format!(
                "unknown estimator kind: {other}"
            ))),
        }
    }
}

/// Per-kind search parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub mcts: MctsConfig,
    pub rollout: RolloutConfig,
    pub alpha_beta: AlphaBetaConfig,
    /// Neighbourhood radius for the random mover.
    pub random_radius: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            mcts: MctsConfig::default(),
            rollout: RolloutConfig::default(),
            alpha_beta: AlphaBetaConfig::default(),
            random_radius: random::DEFAULT_RADIUS,
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<()> {
        self.mcts.validate()?;
        self.rollout.validate()?;
        self.alpha_beta.validate()
    }

    /// Use `win_length` for every estimator.
    pub fn with_win_length(mut self, win_length: usize) -> Self {
        self.mcts.win_length = win_length;
        self.rollout.win_length = win_length;
        self.alpha_beta.win_length = win_length;
        self
    }
}

/// Build an estimator of `kind` positioned at `board`.
///
/// # Errors
/// `InvalidConfig` when the settings are invalid or the kind needs an
/// evaluator and none was given.
pub fn build_estimator(
    kind: EstimatorKind,
    settings: &SearchSettings,
    evaluator: Option<Arc<dyn Evaluator>>,
    board: &Board,
    to_move: Color,
    seed: u64,
) -> Result<Box<dyn Estimator>> {
    let rng = ChaCha8Rng::seed_from_u64(seed);
    let require = |evaluator: Option<Arc<dyn Evaluator>>| {
        evaluator.ok_or_else(|| {
            GomokuError::InvalidConfig(format!("{kind} estimator requires an evaluator"))
        })
    };

    let estimator: Box<dyn Estimator> = match kind {
        EstimatorKind::Neural => {
            settings.mcts.validate()?;
            Box::new(MctsEstimator::new(
                settings.mcts.clone(),
                require(evaluator)?,
                rng,
                board,
                to_move,
            ))
        }
        EstimatorKind::Rollout => {
            settings.rollout.validate()?;
            Box::new(RolloutEstimator::new(
                settings.rollout.clone(),
                rng,
                board,
                to_move,
            ))
        }
        EstimatorKind::AlphaBeta => {
            settings.alpha_beta.validate()?;
            Box::new(AlphaBetaEstimator::new(
                settings.alpha_beta.clone(),
                require(evaluator)?,
                board,
                to_move,
            ))
        }
        EstimatorKind::Random => Box::new(RandomEstimator::new(
            settings.random_radius,
            rng,
            board,
            to_move,
        )),
    };
    Ok(estimator)
}
