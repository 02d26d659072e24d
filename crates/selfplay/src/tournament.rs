//! Gated evaluation of a newly trained generation against baselines.

use crate::config::TournamentConfig;
use crate::game::{play_match, Player};
use crate::provider::EvaluatorProvider;
use gomoku_board::Color;
use gomoku_core::Result;
use gomoku_mcts::SearchSettings;
use log::{info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;

/// Candidate results against one baseline generation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BaselineScore {
    pub generation: u32,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    /// Games that ended in an error and were not counted.
    pub failed: usize,
}

impl BaselineScore {
    pub fn games(&self) -> usize {
        self.wins + self.losses + self.draws
    }

    /// (wins + draws) / games, or 0 with no finished games.
    pub fn score_rate(&self) -> f32 {
        match self.games() {
            0 => 0.0,
            games => (self.wins + self.draws) as f32 / games as f32,
        }
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Win,
    Loss,
    Draw,
}

#[derive(Clone, Debug, Serialize)]
pub struct TournamentResult {
    pub candidate: u32,
    pub scores: Vec<BaselineScore>,
    /// Combined (wins + draws) / games over every baseline.
    pub score_rate: f32,
    pub promoted: bool,
}

/// Board and search parameters shared by every match.
#[derive(Clone, Debug)]
pub struct Arena<'a> {
    pub board_size: usize,
    pub win_length: usize,
    pub search: &'a SearchSettings,
    pub seed: u64,
}

/// Play `candidate` against each baseline, alternating the first mover,
/// and decide promotion from the combined score.
pub fn run_tournament(
    pool: &ThreadPool,
    provider: &dyn EvaluatorProvider,
    config: &TournamentConfig,
    arena: &Arena,
    candidate: u32,
    baselines: &[u32],
) -> Result<TournamentResult> {
    let player = |generation: u32| -> Result<Player> {
        let evaluator = if config.agent.kind.needs_evaluator() {
            Some(provider.evaluator(generation)?)
        } else {
            None
        };
        Ok(Player::new(&config.agent, arena.search, evaluator))
    };

    let challenger = player(candidate)?;
    let opponents = baselines
        .iter()
        .map(|&generation| player(generation))
        .collect::<Result<Vec<_>>>()?;

    let jobs: Vec<(usize, usize)> = (0..baselines.len())
        .flat_map(|b| (0..config.games_per_baseline).map(move |g| (b, g)))
        .collect();

    let outcomes: Vec<(usize, Result<Outcome>)> = pool.install(|| {
        jobs.par_iter()
            .enumerate()
            .map(|(i, &(b, g))| {
                let candidate_color = if g % 2 == 0 { Color::Black } else { Color::White };
                let (black, white) = match candidate_color {
                    Color::Black => (&challenger, &opponents[b]),
                    Color::White => (&opponents[b], &challenger),
                };
                let seed = arena.seed.wrapping_add(i as u64 * 1000);
                let outcome = play_match(black, white, arena.board_size, arena.win_length, seed)
                    .map(|m| match m.winner {
                        Some(color) if color == candidate_color => Outcome::Win,
                        Some(_) => Outcome::Loss,
                        None => Outcome::Draw,
                    });
                (b, outcome)
            })
            .collect()
    });

    let mut scores: Vec<BaselineScore> = baselines
        .iter()
        .map(|&generation| BaselineScore {
            generation,
            ..BaselineScore::default()
        })
        .collect();
    for (b, outcome) in outcomes {
        match outcome {
            Ok(outcome) => scores[b].record(outcome),
            Err(e) => {
                warn!(
                    "Evaluation game against generation {} failed: {}",
                    scores[b].generation, e
                );
                scores[b].failed += 1;
            }
        }
    }

    let games: usize = scores.iter().map(BaselineScore::games).sum();
    let points: usize = scores.iter().map(|s| s.wins + s.draws).sum();
    let score_rate = if games == 0 { 0.0 } else { points as f32 / games as f32 };
    let promoted = games > 0 && score_rate >= config.promotion_threshold;

    for score in &scores {
        info!(
            "Generation {} vs {}: {} wins, {} losses, {} draws ({:.1}%)",
            candidate,
            score.generation,
            score.wins,
            score.losses,
            score.draws,
            score.score_rate() * 100.0
        );
    }
    info!(
        "Generation {} scored {:.1}% over {} games: {}",
        candidate,
        score_rate * 100.0,
        games,
        if promoted { "promoted" } else { "rejected" }
    );

    Ok(TournamentResult {
        candidate,
        scores,
        score_rate,
        promoted,
    })
}
