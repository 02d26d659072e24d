//! Turn order, legality and result tracking for one game.

use crate::terminal::{self, GameResult};
use crate::{Board, Color, Move};
use gomoku_core::Result;

/// A game in progress. Black moves first.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    to_move: Color,
    win_length: usize,
    result: GameResult,
    winner: Option<Color>,
    history: Vec<Move>,
}

impl Game {
    pub fn new(size: usize, win_length: usize) -> Result<Self> {
        Ok(Self {
            board: Board::new(size)?,
            to_move: Color::Black,
            win_length,
            result: GameResult::InProgress,
            winner: None,
            history: Vec::new(),
        })
    }

    /// Apply `mv` for the side to move.
    ///
    /// Returns `false` without changing anything when the game is over or
    /// the target is occupied or off the board.
    pub fn play(&mut self, mv: Move) -> bool {
        if self.result.is_over() || !self.board.try_place(mv.x, mv.y, self.to_move) {
            return false;
        }
        self.history.push(mv);
        self.result = terminal::check(&self.board, mv.x, mv.y, self.win_length, true);
        if self.result == GameResult::Win {
            self.winner = Some(self.to_move);
        }
        self.to_move = self.to_move.opposite();
        true
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn win_length(&self) -> usize {
        self.win_length
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn is_over(&self) -> bool {
        self.result.is_over()
    }

    /// The winning color, `None` while in progress or after a tie.
    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn last_move(&self) -> Move {
        self.history.last().copied().unwrap_or(Move::NONE)
    }
}
