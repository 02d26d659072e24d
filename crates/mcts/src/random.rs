//! Uniform random mover over nearby empty cells.

use crate::estimator::{Estimator, EstimatorKind};
use gomoku_board::{Board, CandidateMoves, Color, Move};
use gomoku_core::Result;
use rand::seq::SliceRandom;
use rand::Rng;

/// Candidate radius used when none is configured.
pub const DEFAULT_RADIUS: usize = 5;

/// Picks any candidate with equal probability. Needs no search.
pub struct RandomEstimator<R: Rng> {
    rng: R,
    board: Board,
    candidates: CandidateMoves,
    playouts: u32,
}

impl<R: Rng> RandomEstimator<R> {
    pub fn new(radius: usize, rng: R, board: &Board, _to_move: Color) -> Self {
        Self {
            rng,
            board: board.clone(),
            candidates: CandidateMoves::from_board(radius, board),
            playouts: 0,
        }
    }
}

impl<R: Rng + Send> Estimator for RandomEstimator<R> {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Random
    }

    fn init_from_state(&mut self, board: &Board, _to_move: Color) -> Result<()> {
        self.board = board.clone();
        self.candidates.init(board);
        self.playouts = 0;
        Ok(())
    }

    fn select_next(&mut self, x: i32, y: i32, color: Color) -> bool {
        if !self.board.try_place(x, y, color) {
            return false;
        }
        self.candidates.update(x, y, &self.board);
        self.playouts = 0;
        true
    }

    fn estimate_once(&mut self) -> Result<()> {
        self.playouts += 1;
        Ok(())
    }

    fn playouts(&self) -> u32 {
        self.playouts
    }

    fn is_ready(&self, _playout_target: u32) -> bool {
        true
    }

    fn best_move(&mut self) -> Move {
        let moves = self.candidates.moves();
        moves.choose(&mut self.rng).copied().unwrap_or(Move::NONE)
    }

    fn is_search_complete(&self) -> bool {
        true
    }
}
