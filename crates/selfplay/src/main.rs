//! Gomoku self-play training and evaluation tool.
//!
//! `train` runs the self-play gym for a number of generations, handing each
//! generation's samples to an external training program. `match` plays two
//! estimators against each other and `generations` lists the models on disk.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gomoku_board::{Color, DEFAULT_BOARD_SIZE, DEFAULT_WIN_LENGTH};
use gomoku_inference::ModelCache;
use gomoku_mcts::{EstimatorKind, Evaluator, SearchSettings, UniformEvaluator};
use gomoku_selfplay::{
    play_match, AgentSettings, CommandTrainer, EvaluatorProvider, GenerationStore, Gym, GymConfig,
    OnnxProvider, Player, TournamentConfig, UniformProvider,
};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Gomoku self-play, training hand-off and evaluation.
#[derive(Parser)]
#[command(name = "gomoku-selfplay")]
#[command(about = "Train Gomoku models by self-play and evaluate them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run self-play generations and train a model after each.
    Train {
        /// Directory holding `{base}_{size}_{generation}.onnx` models.
        #[arg(short, long, default_value = "models")]
        models: PathBuf,

        /// Model base name.
        #[arg(long, default_value = "gomoku")]
        base_name: String,

        /// Training program, called with --source, --target and --data.
        #[arg(short, long)]
        trainer: PathBuf,

        /// Extra arguments passed to the training program first.
        #[arg(long = "trainer-arg")]
        trainer_args: Vec<String>,

        /// Generation to start from (default: latest on disk).
        #[arg(long)]
        start: Option<u32>,

        /// Number of generations to train.
        #[arg(short, long, default_value = "1")]
        generations: usize,

        #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
        board_size: usize,

        #[arg(long, default_value_t = DEFAULT_WIN_LENGTH)]
        win_length: usize,

        /// Self-play playouts for the first move of each game.
        #[arg(short, long, default_value = "100")]
        playouts: u32,

        /// Worker threads (0 = available parallelism).
        #[arg(short, long, default_value = "0")]
        workers: usize,

        /// Samples handed to the trainer per generation.
        #[arg(long, default_value = "20480")]
        training_samples: usize,

        /// Start every generation with an empty sample buffer.
        #[arg(long)]
        fresh_buffer: bool,

        /// Gate each new model with a tournament against the previous one.
        #[arg(long)]
        tournament: bool,

        /// Extra tournament baselines, by generation.
        #[arg(long = "baseline")]
        baselines: Vec<u32>,

        /// Tournament games per baseline (even).
        #[arg(long, default_value = "4")]
        games_per_baseline: usize,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Play one estimator against another.
    Match {
        /// Black's estimator: neural, rollout, alphabeta or random.
        #[arg(long, default_value = "neural")]
        black: EstimatorKind,

        /// White's estimator.
        #[arg(long, default_value = "rollout")]
        white: EstimatorKind,

        /// Black's model generation (neural and alphabeta only).
        #[arg(long)]
        black_generation: Option<u32>,

        /// White's model generation (neural and alphabeta only).
        #[arg(long)]
        white_generation: Option<u32>,

        /// Model directory. Without it, evaluators are untrained.
        #[arg(short, long)]
        models: Option<PathBuf>,

        #[arg(long, default_value = "gomoku")]
        base_name: String,

        /// Number of games; sides swap colors every game.
        #[arg(short, long, default_value = "10")]
        games: usize,

        /// Playouts per move for both sides.
        #[arg(short, long, default_value = "400")]
        playouts: u32,

        /// Alpha-beta search depth.
        #[arg(short, long, default_value = "3")]
        depth: usize,

        #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
        board_size: usize,

        #[arg(long, default_value_t = DEFAULT_WIN_LENGTH)]
        win_length: usize,

        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// List model generations on disk.
    Generations {
        #[arg(short, long, default_value = "models")]
        models: PathBuf,

        #[arg(long, default_value = "gomoku")]
        base_name: String,

        #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
        board_size: usize,
    },
}

/// Match results from the first-listed side's point of view.
#[derive(Default)]
struct MatchTally {
    first_wins: usize,
    second_wins: usize,
    draws: usize,
    total_moves: usize,
}

impl MatchTally {
    fn games(&self) -> usize {
        self.first_wins + self.second_wins + self.draws
    }

    fn percent(&self, count: usize) -> f32 {
        count as f32 / self.games().max(1) as f32 * 100.0
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            models,
            base_name,
            trainer,
            trainer_args,
            start,
            generations,
            board_size,
            win_length,
            playouts,
            workers,
            training_samples,
            fresh_buffer,
            tournament,
            baselines,
            games_per_baseline,
            seed,
        } => {
            let mut config = GymConfig {
                board_size,
                win_length,
                workers,
                training_sample_size: training_samples,
                carry_over_samples: !fresh_buffer,
                seed,
                ..GymConfig::default()
            };
            config.agent.playouts = playouts;
            if tournament {
                config = config.with_tournament(TournamentConfig {
                    games_per_baseline,
                    ..TournamentConfig::default()
                });
            }
            info!(
                "Gym configuration: {}",
                serde_json::to_string(&config).context("Failed to serialize configuration")?
            );

            let store = GenerationStore::new(&models, base_name, board_size);
            let start = match start {
                Some(start) => start,
                None => store
                    .latest()?
                    .with_context(|| format!("No models found in {:?}", models))?,
            };
            let provider = OnnxProvider::new(store.clone(), Arc::new(ModelCache::onnx(board_size)));
            let trainer = CommandTrainer::new(trainer, store.clone()).with_args(trainer_args);
            cmd_train(config, provider, trainer, store, start, generations, &baselines)
        }

        Commands::Match {
            black,
            white,
            black_generation,
            white_generation,
            models,
            base_name,
            games,
            playouts,
            depth,
            board_size,
            win_length,
            seed,
        } => {
            let provider: Box<dyn EvaluatorProvider> = match &models {
                Some(dir) => Box::new(OnnxProvider::new(
                    GenerationStore::new(dir, base_name, board_size),
                    Arc::new(ModelCache::onnx(board_size)),
                )),
                None => Box::new(UniformProvider::new()),
            };
            let mut search = SearchSettings::default().with_win_length(win_length);
            search.alpha_beta.depth = depth;
            info!(
                "Search settings: {}",
                serde_json::to_string(&search).context("Failed to serialize configuration")?
            );

            let first = player(provider.as_ref(), black, black_generation, playouts, &search)?;
            let second = player(provider.as_ref(), white, white_generation, playouts, &search)?;
            cmd_match(
                (black, &first),
                (white, &second),
                games,
                board_size,
                win_length,
                seed,
            )
        }

        Commands::Generations {
            models,
            base_name,
            board_size,
        } => {
            let store = GenerationStore::new(&models, base_name, board_size);
            let generations = store.list()?;
            if generations.is_empty() {
                println!("No generations in {:?}", models);
            }
            for generation in generations {
                println!("{:>4}  {}", generation, store.model_path(generation).display());
            }
            Ok(())
        }
    }
}

fn player(
    provider: &dyn EvaluatorProvider,
    kind: EstimatorKind,
    generation: Option<u32>,
    playouts: u32,
    search: &SearchSettings,
) -> Result<Player> {
    let evaluator: Option<Arc<dyn Evaluator>> = match (kind.needs_evaluator(), generation) {
        (false, _) => None,
        (true, Some(generation)) => Some(provider.evaluator(generation)?),
        (true, None) => Some(Arc::new(UniformEvaluator::new())),
    };
    let agent = AgentSettings::evaluation(kind, playouts);
    agent.validate()?;
    Ok(Player::new(&agent, search, evaluator))
}

fn cmd_train(
    config: GymConfig,
    provider: OnnxProvider,
    trainer: CommandTrainer,
    store: GenerationStore,
    start: u32,
    generations: usize,
    baselines: &[u32],
) -> Result<()> {
    let begin = Instant::now();
    let mut gym = Gym::new(config, provider, trainer, store)?;
    for &baseline in baselines {
        gym.add_baseline(baseline);
    }

    println!("Training {} generations from generation {}", generations, start);
    let reports = gym.train(start, generations)?;

    println!("\nCompleted in {:.2}s", begin.elapsed().as_secs_f64());
    for report in &reports {
        let verdict = match &report.tournament {
            Some(t) if report.promoted => format!("promoted ({:.1}%)", t.score_rate * 100.0),
            Some(t) => format!("rejected ({:.1}%)", t.score_rate * 100.0),
            None => "promoted".to_string(),
        };
        println!(
            "Generation {} -> {}: {} games, {} new samples, {} trained on, {}",
            report.source_generation,
            report.trained_generation,
            report.games_played,
            report.new_samples,
            report.training_samples,
            verdict
        );
    }
    if let Some(last) = reports.last() {
        println!("Current generation: {}", last.next_generation);
    }
    Ok(())
}

fn cmd_match(
    first: (EstimatorKind, &Player),
    second: (EstimatorKind, &Player),
    games: usize,
    board_size: usize,
    win_length: usize,
    seed: u64,
) -> Result<()> {
    if games == 0 {
        bail!("Need at least one game");
    }
    println!(
        "\nPlaying {} games: {} vs {} ({}x{}, {} in a row)",
        games, first.0, second.0, board_size, board_size, win_length
    );
    println!("================================================");

    let start = Instant::now();
    let mut tally = MatchTally::default();
    for i in 0..games {
        // Alternate colors for fairness
        let first_color = if i % 2 == 0 { Color::Black } else { Color::White };
        let (black, white) = match first_color {
            Color::Black => (first.1, second.1),
            Color::White => (second.1, first.1),
        };
        let game_seed = seed.wrapping_add(i as u64 * 1000);
        let outcome = play_match(black, white, board_size, win_length, game_seed)
            .with_context(|| format!("Game {} failed", i + 1))?;

        match outcome.winner {
            Some(color) if color == first_color => tally.first_wins += 1,
            Some(_) => tally.second_wins += 1,
            None => tally.draws += 1,
        }
        tally.total_moves += outcome.moves;

        if (i + 1) % 10 == 0 || i + 1 == games {
            println!(
                "Game {}/{}: {} {} - {} {} ({} draws)",
                i + 1,
                games,
                first.0,
                tally.first_wins,
                tally.second_wins,
                second.0,
                tally.draws
            );
        }
    }

    println!("\n================================================");
    println!("FINAL RESULTS ({:.2}s)", start.elapsed().as_secs_f64());
    println!("================================================");
    println!("{:<10} wins: {} ({:.1}%)", first.0, tally.first_wins, tally.percent(tally.first_wins));
    println!("{:<10} wins: {} ({:.1}%)", second.0, tally.second_wins, tally.percent(tally.second_wins));
    println!("Draws:           {} ({:.1}%)", tally.draws, tally.percent(tally.draws));
    println!(
        "Average game length: {:.1} moves",
        tally.total_moves as f64 / tally.games() as f64
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_match_arguments_parse_kinds() {
        let cli = Cli::try_parse_from([
            "gomoku-selfplay",
            "match",
            "--black",
            "alpha-beta",
            "--white",
            "random",
            "--games",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Match { black, white, games, .. } => {
                assert_eq!(black, EstimatorKind::AlphaBeta);
                assert_eq!(white, EstimatorKind::Random);
                assert_eq!(games, 2);
            }
            _ => panic!("expected match command"),
        }
    }

    #[test]
    fn test_short_match_runs() {
        let search = SearchSettings::default().with_win_length(4);
        let random = player(&UniformProvider::new(), EstimatorKind::Random, None, 1, &search).unwrap();
        let neural = player(&UniformProvider::new(), EstimatorKind::Neural, None, 16, &search).unwrap();
        cmd_match(
            (EstimatorKind::Neural, &neural),
            (EstimatorKind::Random, &random),
            2,
            7,
            4,
            5,
        )
        .unwrap();
    }
}
