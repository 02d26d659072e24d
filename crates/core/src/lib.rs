//! Gomoku Core - common error and domain types
//!
//! Shared by the board, search, inference and self-play crates.
//!
//! # Types
//!
//! - [`GomokuError`] - Error enum used across the workspace
//! - [`Policy`] - Probability distribution over board cells (sums to 1.0)
//! - [`Value`] - Game value estimate in [-1, 1]

mod error;
mod types;

pub use error::{GomokuError, Result};
pub use types::{Policy, Value};
