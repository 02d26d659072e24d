//! Training sample extraction from a finished search tree.
//!
//! The extractor walks from the game's final node back toward the root,
//! undoing moves on a scratch board. Every position with searched children
//! yields a policy target (visit distribution) and a value target (game
//! outcome for the player to move), emitted under all eight board
//! symmetries. Each variant is deduplicated independently against a shared
//! set of Zobrist hashes.

use crate::node::{Node, NodeId};
use crate::tree::Tree;
use gomoku_board::{observation, Board, Color, Move, Symmetry};
use gomoku_core::{Policy, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One supervised example.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Four-plane observation for the player to move.
    pub input: Vec<f32>,

    /// Target distribution over board cells.
    pub policy: Vec<f32>,

    /// Game outcome for the player to move: +1 win, -1 loss, 0 draw.
    pub value: f32,

    /// Zobrist hash of the (transformed) position, used for deduplication.
    pub position_hash: u64,

    /// Transform that produced this sample from the searched position.
    pub symmetry: Symmetry,
}

/// Walks a tree and builds symmetry-augmented samples.
#[derive(Clone, Debug)]
pub struct SampleExtractor {
    /// Nodes shallower than this are not sampled. The default of 1 skips
    /// the root position.
    pub min_depth: usize,
}

impl Default for SampleExtractor {
    fn default() -> Self {
        Self { min_depth: 1 }
    }
}

impl SampleExtractor {
    pub fn with_min_depth(min_depth: usize) -> Self {
        Self { min_depth }
    }

    /// Extract samples for every ancestor of `current`.
    ///
    /// `board` must be the position at `current`; `root_to_move` is the side
    /// to move at the tree root. Hashes of emitted samples are inserted into
    /// `known`; variants whose hash is already there are skipped.
    pub fn extract(
        &self,
        tree: &Tree,
        current: NodeId,
        board: &Board,
        root_to_move: Color,
        winner: Option<Color>,
        known: &mut HashSet<u64>,
    ) -> Vec<TrainingSample> {
        let mut scratch = board.clone();
        let mut samples = Vec::new();
        let mut id = current;
        let mut depth = tree.depth(current);

        while depth >= self.min_depth {
            let node = tree.get(id);
            if let Some(policy) = policy_target(tree, node, board.size()) {
                let to_move = node.to_move(root_to_move);
                let value = outcome_value(winner, to_move);
                emit_variants(&scratch, to_move, node.mv, &policy, value, known, &mut samples);
            }

            let Some(parent) = node.parent else { break };
            if !node.mv.is_none() {
                scratch.undo(node.mv.x, node.mv.y);
            }
            id = parent;
            depth -= 1;
        }

        samples
    }
}

/// Outcome from `player`'s perspective.
pub fn outcome_value(winner: Option<Color>, player: Color) -> f32 {
    match winner {
        Some(color) if color == player => Value::WIN.get(),
        Some(_) => Value::LOSS.get(),
        None => Value::DRAW.get(),
    }
}

/// Normalized child weights over the board, `None` for an unsearched node.
///
/// A terminal child weighs 1.0, the most any visit share can reach; other
/// children weigh their share of the parent's visits, or their prior if
/// they were never visited.
fn policy_target(tree: &Tree, node: &Node, size: usize) -> Option<Vec<f32>> {
    if node.children.is_empty() {
        return None;
    }
    let parent_visits = node.stats.visit_count.max(1) as f32;
    let mut weights = vec![0.0f32; size * size];
    for &child_id in &node.children {
        let child = tree.get(child_id);
        let Some(idx) = child.mv.index(size) else { continue };
        weights[idx] = if child.terminal {
            1.0
        } else if child.stats.visit_count > 0 {
            child.stats.visit_count as f32 / parent_visits
        } else {
            child.stats.prior.max(0.0)
        };
    }
    Policy::from_unnormalized(weights).ok().map(Policy::into_inner)
}

fn emit_variants(
    board: &Board,
    to_move: Color,
    last_move: Move,
    policy: &[f32],
    value: f32,
    known: &mut HashSet<u64>,
    out: &mut Vec<TrainingSample>,
) {
    let size = board.size();
    for symmetry in Symmetry::ALL {
        let transformed = symmetry.transform_board(board);
        if !known.insert(transformed.hash()) {
            continue;
        }
        out.push(TrainingSample {
            input: observation::encode(&transformed, to_move, symmetry.apply_move(last_move, size)),
            policy: symmetry.transform_cells(policy, size),
            value,
            position_hash: transformed.hash(),
            symmetry,
        });
    }
}
