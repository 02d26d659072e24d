//! Move estimation for Gomoku.
//!
//! This crate provides the search strategies used for self-play and
//! evaluation matches, all behind the [`Estimator`] trait:
//!
//! - **PUCT search** ([`MctsEstimator`]): arena tree guided by a policy/value
//!   [`Evaluator`], with Dirichlet noise near the root during training
//! - **Rollout search** ([`RolloutEstimator`]): UCT with parallel random playouts
//! - **Alpha-beta** ([`AlphaBetaEstimator`]): fixed-depth negamax over
//!   evaluator values, cancellable from another thread
//! - **Random** ([`RandomEstimator`]): uniform choice among nearby cells
//!
//! A finished PUCT tree is turned into symmetry-augmented training samples
//! by [`SampleExtractor`].
//!
//! # Example
//!
//! ```
//! use gomoku_board::{Board, Color};
//! use gomoku_mcts::{Estimator, MctsConfig, MctsEstimator, UniformEvaluator};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use std::sync::Arc;
//!
//! let board = Board::new(9).unwrap();
//! let mut mcts = MctsEstimator::new(
//!     MctsConfig::with_simulations(50),
//!     Arc::new(UniformEvaluator::new()),
//!     ChaCha8Rng::seed_from_u64(42),
//!     &board,
//!     Color::Black,
//! );
//!
//! let mv = mcts.search().unwrap();
//! assert_eq!((mv.x, mv.y), (4, 4));
//! assert!(mcts.playouts() >= 50);
//! ```

pub mod alphabeta;
pub mod background;
pub mod config;
pub mod estimator;
pub mod evaluator;
mod node;
pub mod random;
pub mod rollout;
pub mod samples;
pub mod search;
mod tree;

pub use alphabeta::AlphaBetaEstimator;
pub use background::{BackgroundSearch, CancelToken};
pub use config::{AlphaBetaConfig, MctsConfig, RolloutConfig};
pub use estimator::{build_estimator, Estimator, EstimatorKind, SearchSettings};
pub use evaluator::{Evaluation, Evaluator, UniformEvaluator};
pub use node::{Node, NodeId, NodeStats};
pub use random::RandomEstimator;
pub use rollout::RolloutEstimator;
pub use samples::{SampleExtractor, TrainingSample};
pub use search::MctsEstimator;
pub use tree::Tree;
