//! Drives complete games: self-play for samples and matches between agents.

use crate::config::{AgentSettings, GymConfig};
use gomoku_board::{Color, Game, GameResult};
use gomoku_core::{GomokuError, Result};
use gomoku_mcts::{build_estimator, BackgroundSearch, Estimator, EstimatorKind, Evaluator, SearchSettings};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// A finished self-play game. The estimator still holds the game's tree.
pub struct SelfPlayGame {
    pub estimator: Box<dyn Estimator>,
    pub result: GameResult,
    pub winner: Option<Color>,
    pub moves: usize,
}

/// Play one game where a single estimator chooses the moves of both sides.
///
/// The first move uses the agent's playouts; later moves draw a budget
/// from `min_move_playouts..max_move_playouts`.
pub fn play_self_play_game(
    config: &GymConfig,
    evaluator: Arc<dyn Evaluator>,
    seed: u64,
) -> Result<SelfPlayGame> {
    let mut game = Game::new(config.board_size, config.win_length)?;
    let settings = config.agent.search_settings(&config.search_settings());
    let mut estimator = build_estimator(
        config.agent.kind,
        &settings,
        Some(evaluator),
        game.board(),
        game.to_move(),
        seed,
    )?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    let mut playouts = config.agent.playouts;

    while !game.is_over() {
        while !estimator.is_ready(playouts) {
            estimator.estimate_once()?;
        }
        play_best(&mut game, &mut [&mut estimator])?;
        playouts = rng.gen_range(config.min_move_playouts..config.max_move_playouts);
    }

    debug!(
        "Self-play game (seed {}) ended after {} moves: {:?}",
        seed,
        game.history().len(),
        game.result()
    );
    Ok(SelfPlayGame {
        estimator,
        result: game.result(),
        winner: game.winner(),
        moves: game.history().len(),
    })
}

/// One side of a match.
#[derive(Clone)]
pub struct Player {
    pub kind: EstimatorKind,
    pub settings: SearchSettings,
    pub playouts: u32,
    pub evaluator: Option<Arc<dyn Evaluator>>,
}

impl Player {
    pub fn new(agent: &AgentSettings, base: &SearchSettings, evaluator: Option<Arc<dyn Evaluator>>) -> Self {
        Self {
            kind: agent.kind,
            settings: agent.search_settings(base),
            playouts: agent.playouts,
            evaluator,
        }
    }
}

/// Result of a match, from Black's first move to the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchOutcome {
    pub winner: Option<Color>,
    pub moves: usize,
}

/// Play `black` against `white`. Each side searches only on its own turn
/// and follows the opponent's moves in its own tree.
pub fn play_match(
    black: &Player,
    white: &Player,
    board_size: usize,
    win_length: usize,
    seed: u64,
) -> Result<MatchOutcome> {
    let mut game = Game::new(board_size, win_length)?;
    let mut slots = [
        Some(build_player(black, &game, seed)?),
        Some(build_player(white, &game, seed.wrapping_add(1))?),
    ];
    let targets = [black.playouts, white.playouts];

    while !game.is_over() {
        let side = game.to_move().index();
        let estimator = slots[side].take().ok_or(GomokuError::WorkerPanicked)?;
        slots[side] = Some(think(estimator, targets[side])?);

        let [Some(first), Some(second)] = &mut slots else {
            return Err(GomokuError::WorkerPanicked);
        };
        let mut order = [first, second];
        order.swap(0, side);
        play_best(&mut game, &mut order)?;
    }

    Ok(MatchOutcome {
        winner: game.winner(),
        moves: game.history().len(),
    })
}

fn build_player(player: &Player, game: &Game, seed: u64) -> Result<Box<dyn Estimator>> {
    build_estimator(
        player.kind,
        &player.settings,
        player.evaluator.clone(),
        game.board(),
        game.to_move(),
        seed,
    )
}

/// Search until the estimator is ready for `target` playouts.
fn think(mut estimator: Box<dyn Estimator>, target: u32) -> Result<Box<dyn Estimator>> {
    if estimator.supports_background() {
        return BackgroundSearch::start(estimator, target).wait();
    }
    while !estimator.is_ready(target) {
        estimator.estimate_once()?;
    }
    Ok(estimator)
}

/// Play the first estimator's best move and replay it into all of them.
fn play_best(game: &mut Game, estimators: &mut [&mut Box<dyn Estimator>]) -> Result<()> {
    let color = game.to_move();
    let mv = estimators[0].best_move();
    if mv.is_none() || !game.play(mv) {
        return Err(GomokuError::NoLegalMoves);
    }
    for estimator in estimators.iter_mut() {
        estimator.select_next(mv.x, mv.y, color);
    }
    Ok(())
}
