//! Win and tie detection after a placement.

use crate::{Board, Cell};
use serde::{Deserialize, Serialize};

/// Outcome of a game after the most recent move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GameResult {
    InProgress,
    Win,
    Tie,
}

impl GameResult {
    #[inline]
    pub const fn is_over(self) -> bool {
        !matches!(self, GameResult::InProgress)
    }
}

/// Horizontal, vertical, main diagonal, anti-diagonal.
const AXES: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Length of the longest same-colored run through (x, y) over the four axes.
///
/// Returns 0 when (x, y) holds no stone.
pub fn longest_run(board: &Board, x: i32, y: i32) -> usize {
    let target = board.get(x, y);
    if target.stone().is_none() {
        return 0;
    }
    AXES.iter()
        .map(|&(dx, dy)| {
            1 + run_length(board, x, y, dx, dy, target) + run_length(board, x, y, -dx, -dy, target)
        })
        .max()
        .unwrap_or(0)
}

fn run_length(board: &Board, x: i32, y: i32, dx: i32, dy: i32, target: Cell) -> usize {
    let mut count = 0;
    let (mut cx, mut cy) = (x + dx, y + dy);
    while board.get(cx, cy) == target {
        count += 1;
        cx += dx;
        cy += dy;
    }
    count
}

/// Classify the position after a stone was placed at (x, y).
///
/// `Win` when a run of at least `win_length` passes through the cell. With
/// `check_tie` set, `Tie` when no candidate move remains; every empty cell
/// of a non-empty board is reachable from some stone, so that is exactly a
/// full board.
pub fn check(board: &Board, x: i32, y: i32, win_length: usize, check_tie: bool) -> GameResult {
    if longest_run(board, x, y) >= win_length {
        GameResult::Win
    } else if check_tie && board.is_full() {
        GameResult::Tie
    } else {
        GameResult::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    #[test]
    fn test_vertical_five_wins() {
        let mut board = Board::new(15).unwrap();
        for y in 7..=11 {
            board.set(7, y, Color::Black);
        }
        assert_eq!(check(&board, 7, 11, 5, true), GameResult::Win);
        assert_eq!(longest_run(&board, 7, 9), 5);
    }

    #[test]
    fn test_four_is_not_enough() {
        let mut board = Board::new(15).unwrap();
        for x in 0..4 {
            board.set(x, 0, Color::White);
        }
        assert_eq!(check(&board, 3, 0, 5, true), GameResult::InProgress);
        assert_eq!(check(&board, 3, 0, 4, true), GameResult::Win);
    }

    #[test]
    fn test_run_broken_by_opponent() {
        let mut board = Board::new(15).unwrap();
        for i in 0..5 {
            let color = if i == 2 { Color::White } else { Color::Black };
            board.set(i, i, color);
        }
        assert_eq!(check(&board, 4, 4, 5, false), GameResult::InProgress);
    }

    #[test]
    fn test_anti_diagonal() {
        let mut board = Board::new(9).unwrap();
        for i in 0..5 {
            board.set(8 - i, i, Color::Black);
        }
        assert_eq!(check(&board, 6, 2, 5, false), GameResult::Win);
    }

    #[test]
    fn test_full_board_is_tie() {
        let mut board = Board::new(5).unwrap();
        // Stripes of two avoid any run of five on a 5x5 board.
        for y in 0..5 {
            for x in 0..5 {
                let color = if ((x / 2) + y) % 2 == 0 { Color::Black } else { Color::White };
                board.set(x, y, color);
            }
        }
        assert_eq!(check(&board, 4, 4, 5, true), GameResult::Tie);
        assert_eq!(check(&board, 4, 4, 5, false), GameResult::InProgress);
    }
}
