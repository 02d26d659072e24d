//! Neural network evaluator implementing the search `Evaluator` trait.

use crate::cache::ModelCache;
use crate::session::{OnnxModel, Prediction};
use gomoku_core::{GomokuError, Result};
use gomoku_mcts::{Evaluation, Evaluator};
use std::path::Path;
use std::sync::Arc;

/// Evaluates positions with a shared ONNX model.
///
/// Cheap to clone; all clones share the model's session.
#[derive(Clone)]
pub struct NeuralEvaluator {
    model: Arc<OnnxModel>,
}

impl NeuralEvaluator {
    pub fn new(model: Arc<OnnxModel>) -> Self {
        Self { model }
    }

    /// Evaluator for the model at `path`, loading it through `cache`.
    pub fn from_cache(cache: &ModelCache, path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self::new(cache.load(path)?))
    }

    pub fn model(&self) -> &OnnxModel {
        &self.model
    }
}

impl Evaluator for NeuralEvaluator {
    fn evaluate(&self, observation: &[f32], board_size: usize) -> Result<Evaluation> {
        if board_size != self.model.board_size() {
            return Err(GomokuError::Inference(format!(
                "model {:?} is for {}x{} boards, got {}",
                self.model.path(),
                self.model.board_size(),
                self.model.board_size(),
                board_size
            )));
        }
        let prediction = self
            .model
            .predict(observation)
            .map_err(|e| GomokuError::Inference(format!("{e:#}")))?;
        Ok(to_evaluation(prediction))
    }
}

/// Clean up raw network output: non-finite or negative priors become zero.
fn to_evaluation(prediction: Prediction) -> Evaluation {
    let policy = prediction
        .policy
        .into_iter()
        .map(|p| if p.is_finite() && p > 0.0 { p } else { 0.0 })
        .collect();
    Evaluation {
        policy,
        value: prediction.value,
    }
}
