//! Incremental candidate-move generation.
//!
//! Candidates are the empty cells within Chebyshev radius R of any stone.
//! Placing a stone touches O(R²) cells; taking one back replays the
//! occupied history instead of scanning the whole board.

use crate::{Board, Move};
use std::collections::BTreeSet;

/// Multiplier for the `y * CANDIDATE_SEED + x` position encoding.
pub const CANDIDATE_SEED: i32 = 1000;

/// Ordered set of plausible next moves.
///
/// Invariant: never contains an occupied cell; on an empty board holds
/// exactly the center.
#[derive(Clone, Debug)]
pub struct CandidateMoves {
    radius: i32,
    positions: BTreeSet<i32>,
    history: Vec<Move>,
}

impl CandidateMoves {
    pub const MIN_RADIUS: usize = 1;
    pub const MAX_RADIUS: usize = 5;

    /// Empty generator; `radius` is clamped to `MIN_RADIUS..=MAX_RADIUS`.
    pub fn new(radius: usize) -> Self {
        Self {
            radius: radius.clamp(Self::MIN_RADIUS, Self::MAX_RADIUS) as i32,
            positions: BTreeSet::new(),
            history: Vec::new(),
        }
    }

    /// Build a generator already initialized from `board`.
    pub fn from_board(radius: usize, board: &Board) -> Self {
        let mut candidates = Self::new(radius);
        candidates.init(board);
        candidates
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.radius as usize
    }

    #[inline]
    pub const fn encode(x: i32, y: i32) -> i32 {
        y * CANDIDATE_SEED + x
    }

    #[inline]
    pub const fn decode(position: i32) -> Move {
        Move::new(position % CANDIDATE_SEED, position / CANDIDATE_SEED)
    }

    /// Rebuild from scratch with one scan of `board`.
    pub fn init(&mut self, board: &Board) {
        self.history = board.occupied().map(|(mv, _)| mv).collect();
        self.rebuild(board);
    }

    /// Account for a stone just placed at (x, y).
    pub fn update(&mut self, x: i32, y: i32, board: &Board) {
        self.positions.remove(&Self::encode(x, y));
        self.history.push(Move::new(x, y));
        self.expand(x, y, board);
    }

    /// Account for a stone just taken back from (x, y).
    pub fn remove(&mut self, x: i32, y: i32, board: &Board) {
        let mv = Move::new(x, y);
        if let Some(pos) = self.history.iter().rposition(|&m| m == mv) {
            self.history.remove(pos);
        }
        self.rebuild(board);
    }

    fn rebuild(&mut self, board: &Board) {
        self.positions.clear();
        if self.history.is_empty() {
            let center = board.center();
            self.positions.insert(Self::encode(center.x, center.y));
            return;
        }
        for i in 0..self.history.len() {
            let mv = self.history[i];
            self.expand(mv.x, mv.y, board);
        }
    }

    fn expand(&mut self, x: i32, y: i32, board: &Board) {
        for dy in -self.radius..=self.radius {
            for dx in -self.radius..=self.radius {
                let (cx, cy) = (x + dx, y + dy);
                if board.is_empty_cell(cx, cy) {
                    self.positions.insert(Self::encode(cx, cy));
                }
            }
        }
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.positions.contains(&Self::encode(x, y))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.positions.iter().map(|&p| Self::decode(p))
    }

    pub fn moves(&self) -> Vec<Move> {
        self.iter().collect()
    }

    /// Stones accounted for, in placement order.
    pub fn history(&self) -> &[Move] {
        &self.history
    }
}
