//! Inference contract consumed by the search strategies.
//!
//! Search code only sees `Evaluator`; the ONNX-backed implementation lives
//! in `gomoku-inference`, and `UniformEvaluator` stands in wherever no
//! model is available.

use gomoku_board::observation::{self, NUM_PLANES};
use gomoku_core::{GomokuError, Policy, Result};
use std::sync::Arc;

/// Evaluation result: prior policy + value estimate.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// Prior for each board cell (`y * N + x`), length N².
    pub policy: Vec<f32>,

    /// Value estimate from the perspective of the player to move, in [-1, 1].
    pub value: f32,
}

/// Position evaluator.
///
/// `observation` is the four-plane encoding from
/// [`gomoku_board::observation::encode`]. Must be deterministic for
/// identical input and safe to call from several games at once.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, observation: &[f32], board_size: usize) -> Result<Evaluation>;
}

impl<E: Evaluator + ?Sized> Evaluator for Arc<E> {
    fn evaluate(&self, observation: &[f32], board_size: usize) -> Result<Evaluation> {
        (**self).evaluate(observation, board_size)
    }
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, observation: &[f32], board_size: usize) -> Result<Evaluation> {
        (**self).evaluate(observation, board_size)
    }
}

/// Check an evaluation against the board it was produced for.
pub fn check_evaluation(evaluation: &Evaluation, board_size: usize) -> Result<()> {
    let cells = board_size * board_size;
    if evaluation.policy.len() != cells {
        return Err(GomokuError::Inference(format!(
            "policy has {} entries, expected {}",
            evaluation.policy.len(),
            cells
        )));
    }
    Ok(())
}

/// Uniform prior over empty cells and a fixed value.
#[derive(Clone, Debug, Default)]
pub struct UniformEvaluator {
    value: f32,
}

impl UniformEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always report `value` for the player to move.
    pub fn with_value(value: f32) -> Self {
        Self { value }
    }
}

impl Evaluator for UniformEvaluator {
    fn evaluate(&self, observation: &[f32], board_size: usize) -> Result<Evaluation> {
        let area = board_size * board_size;
        if observation.len() != observation::observation_size(board_size) {
            return Err(GomokuError::Inference(format!(
                "observation has {} floats, expected {}",
                observation.len(),
                NUM_PLANES * area
            )));
        }

        let own = &observation[..area];
        let opponent = &observation[area..2 * area];
        let empty: Vec<usize> = (0..area)
            .filter(|&i| own[i] == 0.0 && opponent[i] == 0.0)
            .collect();

        // A full board has no cell to spread over.
        let policy = Policy::uniform_over(&empty, area)
            .map(Policy::into_inner)
            .unwrap_or_else(|_| vec![0.0; area]);

        Ok(Evaluation {
            policy,
            value: self.value,
        })
    }
}
