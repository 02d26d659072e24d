//! Property-based tests for the search strategies and sample extraction.

use gomoku_board::{Board, CandidateMoves, Color, Game, Move};
use gomoku_mcts::{
    AlphaBetaConfig, AlphaBetaEstimator, Estimator, MctsConfig, MctsEstimator, NodeId,
    SampleExtractor, Tree, UniformEvaluator,
};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const SIZE: usize = 9;
const WIN_LENGTH: usize = 5;

// =============================================================================
// Strategies
// =============================================================================

fn arb_seed() -> impl Strategy<Value = u64> {
    any::<u64>()
}

fn arb_simulations() -> impl Strategy<Value = u32> {
    10u32..80
}

/// An unfinished game reached by random nearby moves.
fn arb_game() -> impl Strategy<Value = Game> {
    (0usize..12, arb_seed()).prop_map(|(plies, seed)| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut game = Game::new(SIZE, WIN_LENGTH).unwrap();
        let mut candidates = CandidateMoves::from_board(2, game.board());
        for _ in 0..plies {
            let moves = candidates.moves();
            let mv = moves[rng.gen_range(0..moves.len())];
            let mut next = game.clone();
            next.play(mv);
            if next.is_over() {
                break;
            }
            game = next;
            candidates.update(mv.x, mv.y, game.board());
        }
        game
    })
}

fn mcts_for(game: &Game, simulations: u32, seed: u64) -> MctsEstimator<ChaCha8Rng> {
    MctsEstimator::new(
        MctsConfig::with_simulations(simulations),
        Arc::new(UniformEvaluator::with_value(0.1)),
        ChaCha8Rng::seed_from_u64(seed),
        game.board(),
        game.to_move(),
    )
}

/// Every node reachable from the root, parents before children.
fn all_nodes(tree: &Tree) -> Vec<NodeId> {
    let mut order = vec![NodeId::ROOT];
    let mut i = 0;
    while i < order.len() {
        order.extend(tree.get(order[i]).children.iter().copied());
        i += 1;
    }
    order
}

// =============================================================================
// Backpropagation
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Each simulation adds exactly one visit to every node on a single
    /// path from the root and keeps every node's mean equal to sum / visits.
    #[test]
    fn prop_backprop_keeps_stats_consistent(
        seed in arb_seed(),
        simulations in arb_simulations(),
        game in arb_game()
    ) {
        let mut mcts = mcts_for(&game, simulations, seed);
        for n in 1..=simulations {
            let before: HashMap<NodeId, u32> = all_nodes(mcts.tree())
                .into_iter()
                .map(|id| (id, mcts.tree().get(id).stats.visit_count))
                .collect();
            mcts.estimate_once().unwrap();
            prop_assert_eq!(mcts.playouts(), n);

            let tree = mcts.tree();
            let mut visited = HashSet::new();
            for id in all_nodes(tree) {
                let old = before.get(&id).copied().unwrap_or(0);
                let now = tree.get(id).stats.visit_count;
                prop_assert!(now == old || now == old + 1, "visits jumped {} -> {}", old, now);
                if now == old + 1 {
                    visited.insert(id);
                }
            }

            prop_assert!(visited.contains(&NodeId::ROOT));
            let mut path_ends = 0;
            for &id in &visited {
                let node = tree.get(id);
                if id != NodeId::ROOT {
                    prop_assert!(node.parent.is_some_and(|p| visited.contains(&p)));
                }
                let next = node.children.iter().filter(|c| visited.contains(c)).count();
                prop_assert!(next <= 1);
                if next == 0 {
                    path_ends += 1;
                }
            }
            prop_assert_eq!(path_ends, 1);
        }

        let tree = mcts.tree();
        for id in all_nodes(tree) {
            let node = tree.get(id);
            let stats = &node.stats;
            if stats.visit_count > 0 {
                let mean = stats.value_sum / stats.visit_count as f32;
                prop_assert!((stats.mean_value() - mean).abs() < 1e-4);
                prop_assert!(stats.mean_value().abs() <= 1.0 + 1e-5);
            }
            let child_visits: u32 = node
                .children
                .iter()
                .map(|&c| tree.get(c).stats.visit_count)
                .sum();
            prop_assert!(child_visits <= stats.visit_count);
        }
    }

    /// Same seed, same position: same move and same visit distribution.
    #[test]
    fn prop_search_is_deterministic(
        seed in arb_seed(),
        simulations in arb_simulations(),
        game in arb_game()
    ) {
        let mut a = mcts_for(&game, simulations, seed);
        let mut b = mcts_for(&game, simulations, seed);
        prop_assert_eq!(a.search().unwrap(), b.search().unwrap());

        let visits = |m: &MctsEstimator<ChaCha8Rng>| -> Vec<(Move, u32)> {
            m.tree()
                .root()
                .children
                .iter()
                .map(|&c| (m.tree().get(c).mv, m.tree().get(c).stats.visit_count))
                .collect()
        };
        prop_assert_eq!(visits(&a), visits(&b));
    }

    /// The chosen move is always an empty cell of the searched position.
    #[test]
    fn prop_best_move_is_legal(
        seed in arb_seed(),
        simulations in arb_simulations(),
        game in arb_game()
    ) {
        let mut mcts = mcts_for(&game, simulations, seed);
        let mv = mcts.search().unwrap();
        prop_assert!(game.board().is_empty_cell(mv.x, mv.y), "{} is occupied", mv);
    }
}

// =============================================================================
// Terminal selection
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// With an open four on the board the side to move completes it.
    #[test]
    fn prop_winning_move_is_always_taken(
        seed in arb_seed(),
        simulations in 2u32..40,
        row in 0i32..SIZE as i32,
        start in 1i32..(SIZE as i32 - 4)
    ) {
        let mut board = Board::new(SIZE).unwrap();
        for x in start..start + 4 {
            board.set(x, row, Color::White);
        }
        let other_row = (row + 4) % SIZE as i32;
        for x in 0..3 {
            board.set(x * 3, other_row, Color::Black);
        }

        let mut mcts = MctsEstimator::new(
            MctsConfig::for_training(simulations),
            Arc::new(UniformEvaluator::new()),
            ChaCha8Rng::seed_from_u64(seed),
            &board,
            Color::White,
        );
        let mv = mcts.search().unwrap();
        prop_assert_eq!(mv.y, row);
        prop_assert!(mv.x == start - 1 || mv.x == start + 4, "got {}", mv);
    }
}

// =============================================================================
// Sample extraction
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Samples from a played-out game carry normalized policies, outcome
    /// values and distinct hashes.
    #[test]
    fn prop_samples_are_well_formed(seed in arb_seed(), plies in 2usize..8) {
        let board = Board::new(SIZE).unwrap();
        let mut mcts = MctsEstimator::new(
            MctsConfig::for_training(24),
            Arc::new(UniformEvaluator::new()),
            ChaCha8Rng::seed_from_u64(seed),
            &board,
            Color::Black,
        );
        let mut color = Color::Black;
        for _ in 0..plies {
            let mv = mcts.search().unwrap();
            prop_assert!(mcts.select_next(mv.x, mv.y, color));
            color = color.opposite();
        }

        let mut known = HashSet::new();
        let samples = mcts.training_samples(Some(Color::Black), &mut known);
        prop_assert!(!samples.is_empty());

        let hashes: HashSet<u64> = samples.iter().map(|s| s.position_hash).collect();
        prop_assert_eq!(hashes.len(), samples.len());
        for sample in &samples {
            let sum: f32 = sample.policy.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-4, "policy sums to {}", sum);
            prop_assert!(sample.value == 1.0 || sample.value == -1.0);
            prop_assert_eq!(sample.policy.len(), SIZE * SIZE);
            prop_assert_eq!(sample.input.len(), 4 * SIZE * SIZE);
        }

        // A second pass over the same tree adds nothing new.
        let extractor = SampleExtractor::default();
        let again = extractor.extract(
            mcts.tree(),
            mcts.current(),
            mcts.board(),
            Color::Black,
            Some(Color::Black),
            &mut known,
        );
        prop_assert!(again.is_empty());
    }
}

// =============================================================================
// Alpha-beta
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// A completed search leaves the board and candidate set as it found them.
    #[test]
    fn prop_alphabeta_restores_state(game in arb_game()) {
        let mut ab = AlphaBetaEstimator::new(
            AlphaBetaConfig::with_depth(2),
            Arc::new(UniformEvaluator::new()),
            game.board(),
            game.to_move(),
        );
        let hash = ab.board().hash();
        let candidates = ab.candidates().moves();

        ab.estimate_once().unwrap();
        prop_assert!(ab.is_search_complete());
        prop_assert_eq!(ab.board().hash(), hash);
        prop_assert_eq!(ab.candidates().moves(), candidates);

        let mv = ab.best_move();
        prop_assert!(game.board().is_empty_cell(mv.x, mv.y));
    }
}
