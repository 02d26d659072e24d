//! ONNX Runtime inference for the Gomoku engine.
//!
//! [`OnnxModel`] wraps one policy/value network, [`ModelCache`] shares
//! loaded networks between concurrent games, and [`NeuralEvaluator`]
//! adapts a model to the `gomoku_mcts::Evaluator` trait used by search.

mod cache;
mod evaluator;
mod session;

pub use cache::ModelCache;
pub use evaluator::NeuralEvaluator;
pub use session::{OnnxModel, Prediction, INPUT_NAME};
