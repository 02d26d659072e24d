//! Gomoku Board - grid state, candidate moves and terminal detection
//!
//! The board keeps a Zobrist hash that is updated incrementally on every
//! `set`/`undo`, the candidate generator tracks the empty cells near
//! existing stones, and the terminal detector classifies a position after
//! each placement.

mod board;
pub mod candidates;
mod color;
mod game;
mod moves;
pub mod observation;
mod symmetry;
pub mod terminal;
mod zobrist;

pub use board::Board;
pub use candidates::{CandidateMoves, CANDIDATE_SEED};
pub use color::{Cell, Color};
pub use game::Game;
pub use moves::Move;
pub use symmetry::Symmetry;
pub use terminal::GameResult;
pub use zobrist::ZobristKeys;

/// Standard board size.
pub const DEFAULT_BOARD_SIZE: usize = 15;

/// Standard run length needed to win.
pub const DEFAULT_WIN_LENGTH: usize = 5;
