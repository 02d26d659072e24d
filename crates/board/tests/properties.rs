//! Property-based tests for the board, candidate generator, terminal
//! detector and symmetries.

use gomoku_board::{terminal, Board, CandidateMoves, Cell, Color, GameResult, Move, Symmetry};
use proptest::prelude::*;
use std::collections::HashSet;

const SIZE: usize = 15;

// =============================================================================
// Strategies
// =============================================================================

fn arb_color() -> impl Strategy<Value = Color> {
    prop_oneof![Just(Color::Black), Just(Color::White)]
}

fn arb_cell() -> impl Strategy<Value = (i32, i32)> {
    (0..SIZE as i32, 0..SIZE as i32)
}

fn arb_symmetry() -> impl Strategy<Value = Symmetry> {
    (0usize..8).prop_map(|i| Symmetry::ALL[i])
}

/// A sequence of distinct cells played alternately, Black first.
fn arb_moves() -> impl Strategy<Value = Vec<Move>> {
    proptest::collection::vec(arb_cell(), 0..60).prop_map(|cells| {
        let mut seen = HashSet::new();
        cells
            .into_iter()
            .filter(|c| seen.insert(*c))
            .map(|(x, y)| Move::new(x, y))
            .collect()
    })
}

fn color_for_ply(ply: usize) -> Color {
    if ply % 2 == 0 {
        Color::Black
    } else {
        Color::White
    }
}

fn board_from(moves: &[Move]) -> Board {
    let mut board = Board::new(SIZE).unwrap();
    for (ply, mv) in moves.iter().enumerate() {
        board.set(mv.x, mv.y, color_for_ply(ply));
    }
    board
}

/// Longest run through (x, y) computed by brute force over whole lines.
fn brute_force_run(board: &Board, x: i32, y: i32) -> usize {
    let target = board.get(x, y);
    let mut best = 0;
    for (dx, dy) in [(1, 0), (0, 1), (1, 1), (1, -1)] {
        let mut run = 0;
        for k in -(SIZE as i32)..=(SIZE as i32) {
            if board.get(x + k * dx, y + k * dy) == target {
                run += 1;
                if k >= 0 {
                    best = best.max(run);
                }
            } else if k >= 0 {
                break;
            } else {
                run = 0;
            }
        }
    }
    best
}

// =============================================================================
// Board hashing
// =============================================================================

proptest! {
    #[test]
    fn prop_set_undo_restores_board(
        moves in arb_moves(),
        (x, y) in arb_cell(),
        color in arb_color()
    ) {
        let mut board = board_from(&moves);
        prop_assume!(board.is_empty_cell(x, y));
        let before = board.clone();

        board.set(x, y, color);
        board.undo(x, y);

        prop_assert_eq!(board.hash(), before.hash());
        prop_assert_eq!(board.stone_count(), before.stone_count());
        for yy in 0..SIZE as i32 {
            for xx in 0..SIZE as i32 {
                prop_assert_eq!(board.get(xx, yy), before.get(xx, yy));
            }
        }
    }

    #[test]
    fn prop_hash_depends_only_on_position(moves in arb_moves()) {
        let forward = board_from(&moves);
        let mut backward = Board::new(SIZE).unwrap();
        for (ply, mv) in moves.iter().enumerate().rev() {
            backward.set(mv.x, mv.y, color_for_ply(ply));
        }
        prop_assert_eq!(forward.hash(), backward.hash());
    }
}

// =============================================================================
// Candidate moves
// =============================================================================

proptest! {
    #[test]
    fn prop_candidates_never_occupied(
        moves in arb_moves(),
        radius in 1usize..=5,
        undo_count in 0usize..10
    ) {
        let mut board = Board::new(SIZE).unwrap();
        let mut candidates = CandidateMoves::from_board(radius, &board);
        for (ply, mv) in moves.iter().enumerate() {
            board.set(mv.x, mv.y, color_for_ply(ply));
            candidates.update(mv.x, mv.y, &board);
        }
        for mv in moves.iter().rev().take(undo_count) {
            board.undo(mv.x, mv.y);
            candidates.remove(mv.x, mv.y, &board);
        }

        for mv in candidates.iter() {
            prop_assert_eq!(board.get(mv.x, mv.y), Cell::Empty);
        }
        if board.is_empty() {
            prop_assert!(candidates.contains(7, 7));
        }
        // A removal rebuilds from history, which drops the seeded center.
        if undo_count > 0 {
            let fresh = CandidateMoves::from_board(radius, &board);
            prop_assert_eq!(candidates.moves(), fresh.moves());
        }
    }
}

// =============================================================================
// Terminal detection
// =============================================================================

proptest! {
    #[test]
    fn prop_win_iff_long_run(moves in arb_moves(), win_length in 4usize..=5) {
        prop_assume!(!moves.is_empty());
        let board = board_from(&moves);
        let last = *moves.last().unwrap();

        let expected = brute_force_run(&board, last.x, last.y);
        prop_assert_eq!(terminal::longest_run(&board, last.x, last.y), expected);

        let result = terminal::check(&board, last.x, last.y, win_length, true);
        if expected >= win_length {
            prop_assert_eq!(result, GameResult::Win);
        } else {
            prop_assert_eq!(result, GameResult::InProgress);
        }
    }
}

// =============================================================================
// Symmetries
// =============================================================================

proptest! {
    #[test]
    fn prop_symmetry_is_bijection(s in arb_symmetry()) {
        let mut images = HashSet::new();
        for y in 0..SIZE as i32 {
            for x in 0..SIZE as i32 {
                let (tx, ty) = s.apply(x, y, SIZE);
                prop_assert!(tx >= 0 && ty >= 0 && tx < SIZE as i32 && ty < SIZE as i32);
                images.insert((tx, ty));
            }
        }
        prop_assert_eq!(images.len(), SIZE * SIZE);
    }

    #[test]
    fn prop_composition_matches_single_transform(
        a in arb_symmetry(),
        b in arb_symmetry(),
        (x, y) in arb_cell()
    ) {
        let (ax, ay) = a.apply(x, y, SIZE);
        let twice = b.apply(ax, ay, SIZE);
        prop_assert_eq!(twice, a.then(b).apply(x, y, SIZE));
        if a.then(b) == Symmetry::Rotate180 {
            prop_assert_eq!(twice, (SIZE as i32 - 1 - x, SIZE as i32 - 1 - y));
        }
    }

    #[test]
    fn prop_transformed_board_preserves_stones(moves in arb_moves(), s in arb_symmetry()) {
        let board = board_from(&moves);
        let transformed = s.transform_board(&board);
        prop_assert_eq!(transformed.stone_count(), board.stone_count());
        let back = s.inverse().transform_board(&transformed);
        prop_assert_eq!(back.hash(), board.hash());
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_five_in_a_column_wins() {
    let mut board = Board::new(15).unwrap();
    let mut candidates = CandidateMoves::from_board(2, &board);
    let mut result = GameResult::InProgress;
    for y in 7..=11 {
        board.set(7, y, Color::Black);
        candidates.update(7, y, &board);
        result = terminal::check(&board, 7, y, 5, true);
    }
    assert_eq!(result, GameResult::Win);
    assert_eq!(terminal::check(&board, 7, 11, 5, true), GameResult::Win);
}
