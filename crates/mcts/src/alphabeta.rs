//! Fixed-depth negamax with alpha-beta pruning.
//!
//! Leaves are scored with the evaluator's value head only. Moves are made
//! and unmade on the estimator's own board and candidate set, so every
//! return path, cancellation included, must undo what it placed.

use crate::{
    background::CancelToken,
    config::AlphaBetaConfig,
    estimator::{Estimator, EstimatorKind},
    evaluator::Evaluator,
};
use gomoku_board::{observation, terminal, Board, CandidateMoves, Color, GameResult, Move};
use gomoku_core::{Result, Value};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Score of a win found with one ply of depth left. Wins found earlier in
/// the search are multiplied by the remaining depth.
pub const WIN_SCORE: f32 = 10.0;

pub struct AlphaBetaEstimator {
    config: AlphaBetaConfig,
    evaluator: Arc<dyn Evaluator>,
    board: Board,
    candidates: CandidateMoves,
    to_move: Color,
    cancel: CancelToken,
    scores: HashMap<Move, f32>,
    best: Move,
    complete: bool,
    searches: u32,
}

impl AlphaBetaEstimator {
    pub fn new(
        config: AlphaBetaConfig,
        evaluator: Arc<dyn Evaluator>,
        board: &Board,
        to_move: Color,
    ) -> Self {
        let candidates = CandidateMoves::from_board(config.candidate_radius, board);
        Self {
            config,
            evaluator,
            board: board.clone(),
            candidates,
            to_move,
            cancel: CancelToken::new(),
            scores: HashMap::new(),
            best: Move::NONE,
            complete: false,
            searches: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn candidates(&self) -> &CandidateMoves {
        &self.candidates
    }

    fn reset_search(&mut self) {
        self.scores.clear();
        self.best = Move::NONE;
        self.complete = false;
        self.searches = 0;
    }

    /// Score every root candidate. Leaves previous results untouched when
    /// cancelled part way.
    fn search_root(&mut self) -> Result<()> {
        let depth = self.config.depth.max(1);
        let color = self.to_move;
        let mut scores = HashMap::new();
        let mut best = Move::NONE;
        let mut alpha = f32::NEG_INFINITY;

        for mv in self.candidates.moves() {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            let Some(score) = self.score_move(mv, color, depth, alpha, f32::INFINITY)? else {
                return Ok(());
            };
            scores.insert(mv, score);
            if score > alpha {
                alpha = score;
                best = mv;
            }
        }

        debug!("alpha-beta depth {} best {} score {:.3}", depth, best, alpha);
        self.scores = scores;
        self.best = best;
        self.complete = true;
        self.searches += 1;
        Ok(())
    }

    /// Play `mv` for `color`, score it from `color`'s side and take it back.
    fn score_move(
        &mut self,
        mv: Move,
        color: Color,
        depth: usize,
        alpha: f32,
        beta: f32,
    ) -> Result<Option<f32>> {
        self.board.set(mv.x, mv.y, color);
        self.candidates.update(mv.x, mv.y, &self.board);

        let score = if terminal::check(&self.board, mv.x, mv.y, self.config.win_length, false)
            == GameResult::Win
        {
            Ok(Some(WIN_SCORE * depth as f32))
        } else {
            self.negamax(depth - 1, -beta, -alpha, color.opposite(), mv)
                .map(|v| v.map(|v| -v))
        };

        self.board.undo(mv.x, mv.y);
        self.candidates.remove(mv.x, mv.y, &self.board);
        score
    }

    /// Value for `to_move`, or `None` if cancelled.
    fn negamax(
        &mut self,
        depth: usize,
        mut alpha: f32,
        beta: f32,
        to_move: Color,
        last_move: Move,
    ) -> Result<Option<f32>> {
        if self.cancel.is_cancelled() {
            return Ok(None);
        }
        if depth == 0 {
            let input = observation::encode(&self.board, to_move, last_move);
            let evaluation = self.evaluator.evaluate(&input, self.board.size())?;
            return Ok(Some(Value::clamped(evaluation.value).get()));
        }
        if self.candidates.is_empty() {
            return Ok(Some(Value::DRAW.get()));
        }

        let mut best = f32::NEG_INFINITY;
        for mv in self.candidates.moves() {
            let Some(score) = self.score_move(mv, to_move, depth, alpha, beta)? else {
                return Ok(None);
            };
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }
        Ok(Some(best))
    }
}

impl Estimator for AlphaBetaEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::AlphaBeta
    }

    fn init_from_state(&mut self, board: &Board, to_move: Color) -> Result<()> {
        self.board = board.clone();
        self.candidates.init(board);
        self.to_move = to_move;
        self.reset_search();
        Ok(())
    }

    fn select_next(&mut self, x: i32, y: i32, color: Color) -> bool {
        if !self.board.try_place(x, y, color) {
            return false;
        }
        self.candidates.update(x, y, &self.board);
        self.to_move = color.opposite();
        self.reset_search();
        true
    }

    fn estimate_once(&mut self) -> Result<()> {
        self.search_root()
    }

    /// Completed searches for the current position.
    fn playouts(&self) -> u32 {
        self.searches
    }

    /// One completed search is enough whatever the playout target.
    fn is_ready(&self, _playout_target: u32) -> bool {
        self.complete
    }

    fn best_move(&mut self) -> Move {
        if !self.best.is_none() {
            return self.best;
        }
        self.candidates.iter().next().unwrap_or(Move::NONE)
    }

    fn move_value(&self, mv: Move) -> f32 {
        self.scores.get(&mv).copied().unwrap_or(0.0)
    }

    fn attach_cancel(&mut self, token: CancelToken) {
        self.cancel = token;
    }

    fn is_search_complete(&self) -> bool {
        self.complete
    }

    fn supports_background(&self) -> bool {
        true
    }
}
