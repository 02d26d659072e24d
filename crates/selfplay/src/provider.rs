//! Where search gets its evaluator for a given generation.

use crate::generation::GenerationStore;
use gomoku_core::{GomokuError, Result};
use gomoku_inference::{ModelCache, NeuralEvaluator};
use gomoku_mcts::{Evaluator, UniformEvaluator};
use std::sync::Arc;

/// Supplies the evaluator for a model generation.
pub trait EvaluatorProvider: Send + Sync {
    fn evaluator(&self, generation: u32) -> Result<Arc<dyn Evaluator>>;

    /// Forget anything loaded for `generation`, so the next `evaluator`
    /// call reads its model again.
    fn release(&self, _generation: u32) -> Result<()> {
        Ok(())
    }
}

/// ONNX models from a generation store, shared through a model cache.
pub struct OnnxProvider {
    store: GenerationStore,
    cache: Arc<ModelCache>,
}

impl OnnxProvider {
    pub fn new(store: GenerationStore, cache: Arc<ModelCache>) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &GenerationStore {
        &self.store
    }
}

impl EvaluatorProvider for OnnxProvider {
    fn evaluator(&self, generation: u32) -> Result<Arc<dyn Evaluator>> {
        let path = self.store.model_path(generation);
        let evaluator =
            NeuralEvaluator::from_cache(&self.cache, &path).map_err(|e| GomokuError::ModelLoad {
                path: path.display().to_string(),
                reason: format!("{e:#}"),
            })?;
        Ok(Arc::new(evaluator))
    }

    fn release(&self, generation: u32) -> Result<()> {
        let path = self.store.model_path(generation);
        self.cache.unload(&path).map_err(|e| GomokuError::ModelLoad {
            path: path.display().to_string(),
            reason: format!("{e:#}"),
        })?;
        Ok(())
    }
}

/// The same untrained evaluator for every generation.
#[derive(Clone, Debug, Default)]
pub struct UniformProvider {
    evaluator: UniformEvaluator,
}

impl UniformProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvaluatorProvider for UniformProvider {
    fn evaluator(&self, _generation: u32) -> Result<Arc<dyn Evaluator>> {
        Ok(Arc::new(self.evaluator.clone()))
    }
}
