use serde::{Deserialize, Serialize};
use std::fmt;

/// A board coordinate. Signed so that neighbourhood scans can step past
/// the edge and read [`crate::Cell::Outside`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Move {
    pub x: i32,
    pub y: i32,
}

impl Move {
    /// "No move", carried by the root of a search tree.
    pub const NONE: Move = Move { x: -1, y: -1 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.x == -1 && self.y == -1
    }

    /// Flat cell index `y * size + x`, or `None` when off the board.
    #[inline]
    pub fn index(self, size: usize) -> Option<usize> {
        let n = size as i32;
        if self.x < 0 || self.y < 0 || self.x >= n || self.y >= n {
            None
        } else {
            Some(self.y as usize * size + self.x as usize)
        }
    }

    #[inline]
    pub fn from_index(index: usize, size: usize) -> Self {
        Self::new((index % size) as i32, (index / size) as i32)
    }
}

impl Default for Move {
    fn default() -> Self {
        Move::NONE
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "({}, {})", self.x, self.y)
        }
    }
}
