//! The eight symmetries of the square board (dihedral group D4).

use crate::{Board, Move};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Symmetry {
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
    FlipHorizontal,
    FlipVertical,
    Transpose,
    AntiTranspose,
}

impl Symmetry {
    /// All transforms, identity first.
    pub const ALL: [Symmetry; 8] = [
        Symmetry::Identity,
        Symmetry::Rotate90,
        Symmetry::Rotate180,
        Symmetry::Rotate270,
        Symmetry::FlipHorizontal,
        Symmetry::FlipVertical,
        Symmetry::Transpose,
        Symmetry::AntiTranspose,
    ];

    /// Map a coordinate on a `size`×`size` board.
    #[inline]
    pub fn apply(self, x: i32, y: i32, size: usize) -> (i32, i32) {
        let m = size as i32 - 1;
        match self {
            Symmetry::Identity => (x, y),
            Symmetry::Rotate90 => (m - y, x),
            Symmetry::Rotate180 => (m - x, m - y),
            Symmetry::Rotate270 => (y, m - x),
            Symmetry::FlipHorizontal => (m - x, y),
            Symmetry::FlipVertical => (x, m - y),
            Symmetry::Transpose => (y, x),
            Symmetry::AntiTranspose => (m - y, m - x),
        }
    }

    /// Map a move; `Move::NONE` stays `NONE`.
    pub fn apply_move(self, mv: Move, size: usize) -> Move {
        if mv.is_none() {
            return mv;
        }
        let (x, y) = self.apply(mv.x, mv.y, size);
        Move::new(x, y)
    }

    /// The single transform equal to applying `self` and then `next`.
    pub fn then(self, next: Symmetry) -> Symmetry {
        const PROBE: usize = 3;
        Symmetry::ALL
            .into_iter()
            .find(|candidate| {
                (0..PROBE as i32).all(|y| {
                    (0..PROBE as i32).all(|x| {
                        let (ax, ay) = self.apply(x, y, PROBE);
                        next.apply(ax, ay, PROBE) == candidate.apply(x, y, PROBE)
                    })
                })
            })
            .unwrap_or(Symmetry::Identity)
    }

    pub fn inverse(self) -> Symmetry {
        match self {
            Symmetry::Rotate90 => Symmetry::Rotate270,
            Symmetry::Rotate270 => Symmetry::Rotate90,
            other => other,
        }
    }

    /// A new board with every stone moved by this transform. The hash is
    /// that of the transformed position.
    pub fn transform_board(self, board: &Board) -> Board {
        let mut out = board.clone();
        out.reset();
        for (mv, color) in board.occupied() {
            let (x, y) = self.apply(mv.x, mv.y, board.size());
            out.set(x, y, color);
        }
        out
    }

    /// Permute a per-cell vector (row-major, `size * size` entries).
    pub fn transform_cells<T: Copy + Default>(self, values: &[T], size: usize) -> Vec<T> {
        let mut out = vec![T::default(); values.len()];
        for (idx, &value) in values.iter().enumerate() {
            let mv = self.apply_move(Move::from_index(idx, size), size);
            out[mv.y as usize * size + mv.x as usize] = value;
        }
        out
    }
}
