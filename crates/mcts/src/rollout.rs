//! UCT search with random playouts instead of a network.
//!
//! Leaves are only expanded once they have been visited
//! `expansion_threshold` times; until then every simulation ends in a batch
//! of random playouts, run in parallel and averaged.

use crate::{
    config::RolloutConfig,
    estimator::{Estimator, EstimatorKind},
    node::NodeId,
    tree::Tree,
};
use gomoku_board::{terminal, Board, CandidateMoves, Color, GameResult, Move};
use gomoku_core::{GomokuError, Result, Value};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Score given to a child that has never been visited.
const UNVISITED_SCORE: f32 = 2.0;

pub struct RolloutEstimator<R: Rng> {
    config: RolloutConfig,
    rng: R,
    board: Board,
    candidates: CandidateMoves,
    tree: Tree,
    root_to_move: Color,
}

impl<R: Rng> RolloutEstimator<R> {
    pub fn new(config: RolloutConfig, rng: R, board: &Board, to_move: Color) -> Self {
        let candidates = CandidateMoves::from_board(config.candidate_radius, board);
        Self {
            config,
            rng,
            board: board.clone(),
            candidates,
            tree: Tree::new(),
            root_to_move: to_move,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Simulate until the root has `num_simulations` visits.
    pub fn search(&mut self) -> Result<Move> {
        while self.tree.root().stats.visit_count < self.config.num_simulations {
            self.simulate()?;
        }
        Ok(self.best_move_at_root())
    }

    fn simulate(&mut self) -> Result<()> {
        let mut scratch = self.board.clone();
        let mut candidates = self.candidates.clone();
        let mut node_id = NodeId::ROOT;

        loop {
            let node = self.tree.get(node_id);
            if node.terminal {
                break;
            }
            if node.is_leaf() {
                let expand = node_id == NodeId::ROOT
                    || node.stats.visit_count >= self.config.expansion_threshold;
                if !expand || candidates.is_empty() {
                    break;
                }
                self.expand(node_id, &mut scratch, &candidates);
            }
            let child_id = self.select_child(node_id)?;
            let child = self.tree.get(child_id);
            if let Some(color) = child.color {
                scratch.set(child.mv.x, child.mv.y, color);
                candidates.update(child.mv.x, child.mv.y, &scratch);
            }
            node_id = child_id;
        }

        let node = self.tree.get(node_id);
        let value = if node.terminal {
            Value::WIN.get()
        } else {
            let mover = node.to_move(self.root_to_move).opposite();
            self.playout_batch(&scratch, &candidates, mover)
        };

        let mut value = value;
        let mut id = Some(node_id);
        while let Some(current) = id {
            let node = self.tree.get_mut(current);
            node.stats.record(value);
            value = -value;
            id = node.parent;
        }
        Ok(())
    }

    fn expand(&mut self, node_id: NodeId, scratch: &mut Board, candidates: &CandidateMoves) {
        let to_move = self.tree.get(node_id).to_move(self.root_to_move);
        let prior = 1.0 / candidates.len().max(1) as f32;
        for mv in candidates.iter() {
            scratch.set(mv.x, mv.y, to_move);
            let wins = terminal::check(scratch, mv.x, mv.y, self.config.win_length, false)
                == GameResult::Win;
            scratch.undo(mv.x, mv.y);
            let child = self.tree.add_child(node_id, mv, to_move, prior);
            self.tree.get_mut(child).terminal = wins;
        }
    }

    /// UCT: Q + 2C * sqrt(2 ln N / n), a terminal child always first.
    fn select_child(&mut self, node_id: NodeId) -> Result<NodeId> {
        let node = self.tree.get(node_id);
        if let Some(&winning) = node.children.iter().find(|&&c| self.tree.get(c).terminal) {
            return Ok(winning);
        }

        let ln_parent = (node.stats.visit_count.max(1) as f32).ln();
        let c = self.config.exploration;
        let mut best = Vec::new();
        let mut best_score = f32::NEG_INFINITY;
        for &child_id in &node.children {
            let stats = &self.tree.get(child_id).stats;
            let score = if stats.visit_count == 0 {
                UNVISITED_SCORE
            } else {
                stats.mean_value()
                    + 2.0 * c * (2.0 * ln_parent / stats.visit_count as f32).sqrt()
            };
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

    /// Mean playout result for `mover`, the player who moved into this position.
    fn playout_batch(&mut self, board: &Board, candidates: &CandidateMoves, mover: Color) -> f32 {
        let count = self.config.rollouts_per_simulation.max(1);
        let seeds: Vec<u64> = (0..count).map(|_| self.rng.gen()).collect();
        let win_length = self.config.win_length;

        let total: f32 = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let winner = random_playout(board, candidates, mover.opposite(), win_length, &mut rng);
                match winner {
                    Some(color) if color == mover => Value::WIN.get(),
                    Some(_) => Value::LOSS.get(),
                    None => Value::DRAW.get(),
                }
            })
            .sum();
        total / count as f32
    }

    fn best_move_at_root(&mut self) -> Move {
        let children = &self.tree.root().children;
        if let Some(&winning) = children.iter().find(|&&c| self.tree.get(c).terminal) {
            return self.tree.get(winning).mv;
        }
        let best = children.iter().copied().max_by(|&a, &b| {
            let (sa, sb) = (&self.tree.get(a).stats, &self.tree.get(b).stats);
            sa.visit_count
                .cmp(&sb.visit_count)
                .then(sa.mean_value().total_cmp(&sb.mean_value()))
        });
        match best {
            Some(id) if self.tree.get(id).stats.visit_count > 0 => self.tree.get(id).mv,
            Some(_) => {
                let pick = self.rng.gen_range(0..children.len());
                self.tree.get(children[pick]).mv
            }
            None => Move::NONE,
        }
    }
}

/// Play uniformly random candidates until someone wins or none remain.
fn random_playout(
    board: &Board,
    candidates: &CandidateMoves,
    to_move: Color,
    win_length: usize,
    rng: &mut impl Rng,
) -> Option<Color> {
    let mut board = board.clone();
    let mut candidates = candidates.clone();
    let mut color = to_move;
    loop {
        let moves = candidates.moves();
        let mv = *moves.choose(rng)?;
        board.set(mv.x, mv.y, color);
        if terminal::check(&board, mv.x, mv.y, win_length, false) == GameResult::Win {
            return Some(color);
        }
        candidates.update(mv.x, mv.y, &board);
        color = color.opposite();
    }
}

impl<R: Rng + Send> Estimator for RolloutEstimator<R> {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Rollout
    }

    fn init_from_state(&mut self, board: &Board, to_move: Color) -> Result<()> {
        self.board = board.clone();
        self.candidates.init(board);
        self.tree.clear();
        self.root_to_move = to_move;
        Ok(())
    }

    fn select_next(&mut self, x: i32, y: i32, color: Color) -> bool {
        if !self.board.try_place(x, y, color) {
            return false;
        }
        self.candidates.update(x, y, &self.board);

        let mv = Move::new(x, y);
        match self.tree.find_child(NodeId::ROOT, mv) {
            Some(child) => {
                self.tree.retain_subtree(child);
            }
            None => self.tree.clear(),
        }
        self.root_to_move = color.opposite();
        true
    }

    fn estimate_once(&mut self) -> Result<()> {
        self.simulate()
    }

    fn playouts(&self) -> u32 {
        self.tree.root().stats.visit_count
    }

    fn best_move(&mut self) -> Move {
        self.best_move_at_root()
    }

    fn move_value(&self, mv: Move) -> f32 {
        self.tree
            .find_child(NodeId::ROOT, mv)
            .map(|id| self.tree.get(id).stats.mean_value())
            .unwrap_or(0.0)
    }
}
