//! Network-guided Monte Carlo Tree Search with PUCT selection.
//!
//! One simulation runs Select -> Expand/Evaluate -> Backpropagate from the
//! current node on a scratch copy of the board and candidate set. Node
//! statistics are kept from the perspective of the node's mover, so a
//! parent maximizes its children's mean values directly and the value sign
//! flips at every step of the backup.

use crate::{
    config::MctsConfig,
    estimator::{Estimator, EstimatorKind},
    evaluator::{check_evaluation, Evaluation, Evaluator},
    node::NodeId,
    samples::{SampleExtractor, TrainingSample},
    tree::Tree,
};
use gomoku_board::{observation, terminal, Board, CandidateMoves, Color, GameResult, Move};
use gomoku_core::{GomokuError, Result, Value};
use rand::Rng;
use rand_distr::{Dirichlet, Distribution};
use std::collections::HashSet;
use std::sync::Arc;

/// PUCT search over one game.
///
/// Owns the game's board, candidate set and tree; `select_next` advances
/// all three as moves are played.
pub struct MctsEstimator<R: Rng> {
    config: MctsConfig,
    evaluator: Arc<dyn Evaluator>,
    rng: R,
    board: Board,
    candidates: CandidateMoves,
    tree: Tree,
    current: NodeId,
    root_to_move: Color,
}

impl<R: Rng + Send> MctsEstimator<R> {
    /// Create an estimator positioned at `board` with `to_move` to play.
    pub fn new(
        config: MctsConfig,
        evaluator: Arc<dyn Evaluator>,
        rng: R,
        board: &Board,
        to_move: Color,
    ) -> Self {
        let candidates = CandidateMoves::from_board(config.candidate_radius, board);
        Self {
            config,
            evaluator,
            rng,
            board: board.clone(),
            candidates,
            tree: Tree::new(),
            current: NodeId::ROOT,
            root_to_move: to_move,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Run simulations until the current node has `num_simulations` visits,
    /// then return the best move.
    pub fn search(&mut self) -> Result<Move> {
        while self.playouts() < self.config.num_simulations {
            self.simulate()?;
        }
        Ok(self.best_move())
    }

    /// Run a single simulation: select -> expand -> backpropagate.
    fn simulate(&mut self) -> Result<()> {
        let mut scratch = self.board.clone();
        let mut candidates = self.candidates.clone();
        let mut node_id = self.current;
        let mut depth = 0;

        // SELECT
        loop {
            let node = self.tree.get(node_id);
            if node.terminal || node.is_leaf() {
                break;
            }
            let child_id = self.select_child(node_id, depth)?;
            let child = self.tree.get(child_id);
            if let Some(color) = child.color {
                scratch.set(child.mv.x, child.mv.y, color);
                candidates.update(child.mv.x, child.mv.y, &scratch);
            }
            node_id = child_id;
            depth += 1;
        }

        // EXPAND / EVALUATE
        let value = self.evaluate_leaf(node_id, &mut scratch, &candidates)?;

        // BACKPROPAGATE
        self.backpropagate(node_id, value);
        Ok(())
    }

    /// Value of the leaf for the player who made its move.
    fn evaluate_leaf(
        &mut self,
        node_id: NodeId,
        scratch: &mut Board,
        candidates: &CandidateMoves,
    ) -> Result<f32> {
        let node = self.tree.get(node_id);
        if node.terminal {
            return Ok(Value::WIN.get());
        }
        let last_move = node.mv;
        let moved = node.color.is_some();
        let to_move = node.to_move(self.root_to_move);

        if moved
            && terminal::check(scratch, last_move.x, last_move.y, self.config.win_length, false)
                == GameResult::Win
        {
            self.tree.get_mut(node_id).terminal = true;
            return Ok(Value::WIN.get());
        }
        if candidates.is_empty() {
            return Ok(Value::DRAW.get());
        }

        let input = observation::encode(scratch, to_move, last_move);
        let evaluation = self.evaluator.evaluate(&input, scratch.size())?;
        check_evaluation(&evaluation, scratch.size())?;

        self.expand(node_id, scratch, candidates, to_move, &evaluation);
        Ok(Value::clamped(evaluation.value).negate().get())
    }

    /// Add one child per candidate, pre-marking moves that win on the spot.
    fn expand(
        &mut self,
        node_id: NodeId,
        scratch: &mut Board,
        candidates: &CandidateMoves,
        to_move: Color,
        evaluation: &Evaluation,
    ) {
        let size = scratch.size();
        for mv in candidates.iter() {
            let prior = mv
                .index(size)
                .and_then(|idx| evaluation.policy.get(idx).copied())
                .unwrap_or(0.0);
            scratch.set(mv.x, mv.y, to_move);
            let wins = terminal::check(scratch, mv.x, mv.y, self.config.win_length, false)
                == GameResult::Win;
            scratch.undo(mv.x, mv.y);

            let child = self.tree.add_child(node_id, mv, to_move, prior);
            self.tree.get_mut(child).terminal = wins;
        }
    }

    /// Select a child using PUCT.
    ///
    /// UCB(a) = Q(a) + C * P(a) * sqrt(N_parent) / (1 + N_child)
    fn select_child(&mut self, node_id: NodeId, depth: usize) -> Result<NodeId> {
        let children = self.tree.get(node_id).children.clone();
        if let Some(&winning) = children.iter().find(|&&c| self.tree.get(c).terminal) {
            return Ok(winning);
        }

        let noise = if self.config.training
            && depth < self.config.noise_depth
            && self.config.exploration_fraction > 0.0
            && children.len() >= 2
        {
            Some(self.sample_noise(children.len())?)
        } else {
            None
        };

        let sqrt_parent = (self.tree.get(node_id).stats.visit_count as f32).sqrt();
        let eps = self.config.exploration_fraction;

        let mut best = Vec::new();
        let mut best_score = f32::NEG_INFINITY;
        for (i, &child_id) in children.iter().enumerate() {
            let stats = &self.tree.get(child_id).stats;
            let prior = match &noise {
                Some(noise) => (1.0 - eps) * stats.prior + eps * noise[i],
                None => stats.prior,
            };
            let score = stats.mean_value()
                + self.config.exploration * prior * sqrt_parent / (1.0 + stats.visit_count as f32);

            if score > best_score {
                best_score = score;
                best.clear();
                best.push(child_id);
            } else if score == best_score {
                best.push(child_id);
            }
        }

        match best.len() {
            0 => Err(GomokuError::NoLegalMoves),
            1 => Ok(best[0]),
            n => Ok(best[self.rng.gen_range(0..n)]),
        }
    }

    fn sample_noise(&mut self, len: usize) -> Result<Vec<f32>> {
        let alpha = vec![self.config.dirichlet_alpha; len];
        let dirichlet = Dirichlet::new(&alpha)
            .map_err(|e| GomokuError::InvalidConfig(format!("dirichlet noise: {e}")))?;
        Ok(dirichlet.sample(&mut self.rng))
    }

    /// Walk from the evaluated node to the root, flipping the sign per ply.
    fn backpropagate(&mut self, leaf: NodeId, leaf_value: f32) {
        let mut value = leaf_value;
        let mut id = Some(leaf);
        while let Some(node_id) = id {
            let node = self.tree.get_mut(node_id);
            node.stats.record(value);
            value = -value;
            id = node.parent;
        }
    }

    /// Preferred move at `node_id`.
    ///
    /// A terminal child wins outright; otherwise most visits, ties broken by
    /// mean value; with no visits at all, a uniformly random child.
    fn best_child(&mut self, node_id: NodeId) -> Option<NodeId> {
        let children = &self.tree.get(node_id).children;
        if children.is_empty() {
            return None;
        }
        if let Some(&winning) = children.iter().find(|&&c| self.tree.get(c).terminal) {
            return Some(winning);
        }

        let best = children.iter().copied().max_by(|&a, &b| {
            let (sa, sb) = (&self.tree.get(a).stats, &self.tree.get(b).stats);
            sa.visit_count
                .cmp(&sb.visit_count)
                .then(sa.mean_value().total_cmp(&sb.mean_value()))
        })?;

        if self.tree.get(best).stats.visit_count == 0 {
            let pick = self.rng.gen_range(0..children.len());
            return Some(children[pick]);
        }
        Some(best)
    }
}

impl<R: Rng + Send> Estimator for MctsEstimator<R> {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Neural
    }

    fn init_from_state(&mut self, board: &Board, to_move: Color) -> Result<()> {
        self.board = board.clone();
        self.candidates.init(board);
        self.tree.clear();
        self.current = NodeId::ROOT;
        self.root_to_move = to_move;
        Ok(())
    }

    fn select_next(&mut self, x: i32, y: i32, color: Color) -> bool {
        if !self.board.try_place(x, y, color) {
            return false;
        }
        self.candidates.update(x, y, &self.board);

        let mv = Move::new(x, y);
        let child = match self.tree.find_child(self.current, mv) {
            Some(child) => child,
            None => {
                let child = self.tree.add_child(self.current, mv, color, 0.0);
                self.tree.get_mut(child).terminal =
                    terminal::check(&self.board, x, y, self.config.win_length, false)
                        == GameResult::Win;
                child
            }
        };

        self.current = if self.config.prune_on_move {
            self.tree.retain_subtree(child)
        } else {
            child
        };
        true
    }

    fn estimate_once(&mut self) -> Result<()> {
        self.simulate()
    }

    fn playouts(&self) -> u32 {
        self.tree.get(self.current).stats.visit_count
    }

    fn best_move(&mut self) -> Move {
        self.best_child(self.current)
            .map(|id| self.tree.get(id).mv)
            .unwrap_or(Move::NONE)
    }

    fn move_value(&self, mv: Move) -> f32 {
        self.tree
            .find_child(self.current, mv)
            .map(|id| self.tree.get(id).stats.mean_value())
            .unwrap_or(0.0)
    }

    fn training_samples(
        &self,
        winner: Option<Color>,
        known: &mut HashSet<u64>,
    ) -> Vec<TrainingSample> {
        SampleExtractor::default().extract(
            &self.tree,
            self.current,
            &self.board,
            self.root_to_move,
            winner,
            known,
        )
    }
}
