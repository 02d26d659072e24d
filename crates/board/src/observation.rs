//! Network input encoding.
//!
//! Four N×N planes seen by the player to move, laid out flat as
//! `plane * N * N + y * N + x`.

use crate::{Board, Color, Move};

/// Number of planes in the observation tensor.
pub const NUM_PLANES: usize = 4;

/// Plane indices.
pub mod planes {
    pub const OWN: usize = 0;
    pub const OPPONENT: usize = 1;
    pub const LAST_MOVE: usize = 2;
    /// All ones when Black is to move, zeros otherwise.
    pub const SIDE_TO_MOVE: usize = 3;
}

/// Total number of floats for a board of `size`.
#[inline]
pub const fn observation_size(size: usize) -> usize {
    NUM_PLANES * size * size
}

/// Encode `board` for `to_move`, marking `last_move` (if any).
pub fn encode(board: &Board, to_move: Color, last_move: Move) -> Vec<f32> {
    let size = board.size();
    let area = size * size;
    let mut obs = vec![0.0f32; observation_size(size)];

    for (mv, color) in board.occupied() {
        let plane = if color == to_move { planes::OWN } else { planes::OPPONENT };
        obs[plane * area + mv.y as usize * size + mv.x as usize] = 1.0;
    }

    if let Some(idx) = last_move.index(size) {
        obs[planes::LAST_MOVE * area + idx] = 1.0;
    }

    if to_move == Color::Black {
        obs[planes::SIDE_TO_MOVE * area..].fill(1.0);
    }

    obs
}
