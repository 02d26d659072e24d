//! Grid state with an incrementally maintained Zobrist hash.

use crate::zobrist::ZobristKeys;
use crate::{Cell, Color, Move};
use gomoku_core::{GomokuError, Result};
use std::fmt;
use std::sync::Arc;

/// An N×N Gomoku board.
///
/// Invariant: `hash` is the XOR of the keys of all occupied cells. Setting
/// and undoing the same cell is its own inverse, so search descends with
/// `set`/`undo` pairs on a single scratch board.
#[derive(Clone, Debug)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Color>>,
    hash: u64,
    stones: usize,
    keys: Arc<ZobristKeys>,
}

impl Board {
    pub const MIN_SIZE: usize = 5;
    pub const MAX_SIZE: usize = 25;

    /// Create an empty board.
    ///
    /// # Errors
    /// Returns `GomokuError::InvalidBoardSize` outside `MIN_SIZE..=MAX_SIZE`.
    pub fn new(size: usize) -> Result<Self> {
        if !(Self::MIN_SIZE..=Self::MAX_SIZE).contains(&size) {
            return Err(GomokuError::InvalidBoardSize(size));
        }
        Ok(Self {
            size,
            cells: vec![None; size * size],
            hash: 0,
            stones: 0,
            keys: Arc::new(ZobristKeys::new(size)),
        })
    }

    /// Clear every cell and zero the hash.
    pub fn reset(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
        self.hash = 0;
        self.stones = 0;
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    pub fn stone_count(&self) -> usize {
        self.stones
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stones == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.stones == self.cells.len()
    }

    /// The center cell, seeded as the only candidate of an empty board.
    #[inline]
    pub fn center(&self) -> Move {
        let c = (self.size / 2) as i32;
        Move::new(c, c)
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        let n = self.size as i32;
        x >= 0 && y >= 0 && x < n && y < n
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.size + x as usize
    }

    /// Read a cell; `Cell::Outside` past the edge.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Cell {
        if !self.in_bounds(x, y) {
            return Cell::Outside;
        }
        match self.cells[self.index(x, y)] {
            Some(color) => Cell::Stone(color),
            None => Cell::Empty,
        }
    }

    /// Stone at a flat cell index.
    #[inline]
    pub fn stone_at(&self, index: usize) -> Option<Color> {
        self.cells[index]
    }

    #[inline]
    pub fn is_empty_cell(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_empty()
    }

    /// Place `color` at (x, y) and XOR in its key.
    ///
    /// The caller validates legality; use [`Board::try_place`] when the
    /// target may be occupied.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        debug_assert!(self.is_empty_cell(x, y), "set on non-empty cell ({x}, {y})");
        let idx = self.index(x, y);
        self.cells[idx] = Some(color);
        self.hash ^= self.keys.key(idx, color);
        self.stones += 1;
    }

    /// Clear (x, y), XOR-ing out the key of the stone that was there.
    #[inline]
    pub fn undo(&mut self, x: i32, y: i32) {
        debug_assert!(self.in_bounds(x, y), "undo outside the board ({x}, {y})");
        let idx = self.index(x, y);
        let Some(color) = self.cells[idx].take() else {
            debug_assert!(false, "undo on empty cell ({x}, {y})");
            return;
        };
        self.hash ^= self.keys.key(idx, color);
        self.stones -= 1;
    }

    /// Place a stone if (x, y) is an empty cell on the board.
    ///
    /// Returns `false` and leaves the board untouched otherwise.
    pub fn try_place(&mut self, x: i32, y: i32, color: Color) -> bool {
        if !self.is_empty_cell(x, y) {
            return false;
        }
        self.set(x, y, color);
        true
    }

    /// Overwrite this board with a deep copy of `other` (same size).
    pub fn copy_from(&mut self, other: &Board) {
        debug_assert_eq!(self.size, other.size);
        self.cells.copy_from_slice(&other.cells);
        self.hash = other.hash;
        self.stones = other.stones;
    }

    /// Occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (Move, Color)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            cell.map(|color| (Move::from_index(idx, self.size), color))
        })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.size as i32 {
            for x in 0..self.size as i32 {
                write!(f, "{}", self.get(x, y))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(15).unwrap();
        assert_eq!(board.hash(), 0);
        assert!(board.is_empty());
        assert_eq!(board.center(), Move::new(7, 7));
    }

    #[test]
    fn test_invalid_size() {
        assert!(Board::new(3).is_err());
        assert!(Board::new(26).is_err());
    }

    #[test]
    fn test_set_undo_restores_hash() {
        let mut board = Board::new(15).unwrap();
        board.set(3, 4, Color::Black);
        let before = board.hash();
        board.set(5, 5, Color::White);
        assert_ne!(board.hash(), before);
        board.undo(5, 5);
        assert_eq!(board.hash(), before);
        assert_eq!(board.get(5, 5), Cell::Empty);
    }

    #[test]
    fn test_hash_is_order_independent() {
        let mut a = Board::new(9).unwrap();
        let mut b = Board::new(9).unwrap();
        a.set(1, 1, Color::Black);
        a.set(2, 2, Color::White);
        b.set(2, 2, Color::White);
        b.set(1, 1, Color::Black);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_get_outside() {
        let board = Board::new(15).unwrap();
        assert_eq!(board.get(-1, 0), Cell::Outside);
        assert_eq!(board.get(0, 15), Cell::Outside);
    }

    #[test]
    fn test_try_place_occupied_is_noop() {
        let mut board = Board::new(15).unwrap();
        assert!(board.try_place(7, 7, Color::Black));
        let hash = board.hash();
        assert!(!board.try_place(7, 7, Color::White));
        assert!(!board.try_place(-1, 7, Color::White));
        assert_eq!(board.hash(), hash);
        assert_eq!(board.get(7, 7), Cell::Stone(Color::Black));
    }

    #[test]
    fn test_copy_is_deep() {
        let mut board = Board::new(15).unwrap();
        board.set(1, 2, Color::Black);
        let mut scratch = Board::new(15).unwrap();
        scratch.copy_from(&board);
        scratch.set(3, 3, Color::White);
        assert_eq!(board.get(3, 3), Cell::Empty);
        assert_eq!(scratch.get(1, 2), Cell::Stone(Color::Black));
        assert_ne!(scratch.hash(), board.hash());
    }
}
