//! Self-play training loop for Gomoku.
//!
//! A [`Gym`] plays batches of games with the current model, keeps a
//! deduplicated buffer of symmetry-augmented samples, hands a shuffled
//! slice of it to a [`Trainer`] and, when a [`TournamentConfig`] is set,
//! promotes the new model only if it holds its own against the baselines.

pub mod config;
pub mod game;
pub mod generation;
pub mod gym;
pub mod policy;
pub mod provider;
pub mod tournament;
pub mod trainer;

pub use config::{AgentSettings, GymConfig, TournamentConfig};
pub use game::{play_match, play_self_play_game, MatchOutcome, Player, SelfPlayGame};
pub use generation::GenerationStore;
pub use gym::{GenerationReport, Gym};
pub use policy::{Decision, GenerationProgress, StopPolicy, StopReason};
pub use provider::{EvaluatorProvider, OnnxProvider, UniformProvider};
pub use tournament::{run_tournament, Arena, BaselineScore, TournamentResult};
pub use trainer::{CommandTrainer, Trainer};
