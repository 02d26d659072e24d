//! The self-play gym: generate samples, train, evaluate, repeat.
//!
//! Each generation plays batches of self-play games on a worker pool with
//! the current model. Samples from every finished game are merged into a
//! shared buffer, deduplicated by position hash. Once the stop policy ends
//! the generation, a shuffled slice of the buffer is handed to the trainer
//! and the resulting model is optionally gated by a tournament.

use crate::config::GymConfig;
use crate::game::play_self_play_game;
use crate::generation::GenerationStore;
use crate::policy::{Decision, GenerationProgress, StopPolicy, StopReason};
use crate::provider::EvaluatorProvider;
use crate::tournament::{run_tournament, Arena, TournamentResult};
use crate::trainer::Trainer;
use anyhow::{ensure, Context, Result};
use gomoku_board::Symmetry;
use gomoku_mcts::{Evaluator, TrainingSample};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fs::{self, File};
use std::io::BufWriter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Sample buffer shared by the workers of a session.
#[derive(Default)]
struct SessionState {
    buffer: VecDeque<TrainingSample>,
    known: HashSet<u64>,
}

impl SessionState {
    /// Drop the oldest samples beyond `capacity`. Evicting an identity
    /// sample lets its position be collected again.
    fn trim(&mut self, capacity: usize) -> usize {
        let mut evicted = 0;
        while self.buffer.len() > capacity {
            let Some(sample) = self.buffer.pop_front() else {
                break;
            };
            if sample.symmetry == Symmetry::Identity {
                self.known.remove(&sample.position_hash);
            }
            evicted += 1;
        }
        evicted
    }

    /// Keep the samples whose hash is not known yet, returning how many.
    fn merge(&mut self, samples: Vec<TrainingSample>) -> usize {
        let before = self.buffer.len();
        for sample in samples {
            if self.known.insert(sample.position_hash) {
                self.buffer.push_back(sample);
            }
        }
        self.buffer.len() - before
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.known.clear();
    }
}

/// Summary of one generation, also written as JSON next to the models.
#[derive(Clone, Debug, Serialize)]
pub struct GenerationReport {
    pub source_generation: u32,
    pub trained_generation: u32,
    /// The generation the next round starts from.
    pub next_generation: u32,
    pub games_played: usize,
    pub new_samples: usize,
    pub buffer_samples: usize,
    pub training_samples: usize,
    pub stop_reason: StopReason,
    pub promoted: bool,
    pub tournament: Option<TournamentResult>,
    pub elapsed_secs: f64,
}

pub struct Gym<P: EvaluatorProvider, T: Trainer> {
    config: GymConfig,
    provider: P,
    trainer: T,
    store: GenerationStore,
    pool: ThreadPool,
    baselines: BTreeSet<u32>,
    state: Mutex<SessionState>,
    /// Calls to `train_generation` so far; retrying a generation reseeds.
    rounds: AtomicU64,
}

impl<P: EvaluatorProvider, T: Trainer> Gym<P, T> {
    pub fn new(config: GymConfig, provider: P, trainer: T, store: GenerationStore) -> Result<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("gomoku-gym-{i}"))
            .build()
            .context("Failed to build self-play worker pool")?;

        Ok(Self {
            config,
            provider,
            trainer,
            store,
            pool,
            baselines: BTreeSet::new(),
            state: Mutex::new(SessionState::default()),
            rounds: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &GymConfig {
        &self.config
    }

    /// Add a fixed opponent to every tournament.
    pub fn add_baseline(&mut self, generation: u32) {
        self.baselines.insert(generation);
    }

    pub fn remove_baseline(&mut self, generation: u32) -> bool {
        self.baselines.remove(&generation)
    }

    pub fn buffer_len(&self) -> usize {
        self.lock_state().buffer.len()
    }

    pub fn known_positions(&self) -> usize {
        self.lock_state().known.len()
    }

    /// Run `generations` rounds starting from `start`, following promoted
    /// models.
    pub fn train(&self, start: u32, generations: usize) -> Result<Vec<GenerationReport>> {
        let mut current = start;
        let mut reports = Vec::with_capacity(generations);
        for _ in 0..generations {
            let report = self.train_generation(current)?;
            current = report.next_generation;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Self-play with `generation`, train its successor and evaluate it.
    pub fn train_generation(&self, generation: u32) -> Result<GenerationReport> {
        let start = Instant::now();
        let round = self.rounds.fetch_add(1, Ordering::Relaxed);
        let evaluator = self.provider.evaluator(generation)?;
        if !self.config.carry_over_samples {
            self.lock_state().clear();
        }

        info!(
            "Generation {}: self-play on {} threads",
            generation,
            self.pool.current_num_threads()
        );
        let (progress, stop_reason) = self.collect_samples(generation, round, &evaluator)?;
        info!(
            "Generation {}: {} after {} games, {} new samples",
            generation, stop_reason, progress.games_played, progress.samples
        );

        let (samples, buffer_samples) = self.training_batch(generation);
        ensure!(
            !samples.is_empty(),
            "Generation {} produced no training samples",
            generation
        );
        let trained = self.trainer.train(generation, &samples)?;
        // A retrained candidate overwrites the model of a rejected one.
        self.provider.release(trained)?;
        info!(
            "Generation {}: trained generation {} on {} samples",
            generation,
            trained,
            samples.len()
        );

        let tournament = match &self.config.tournament {
            Some(tournament) => {
                let mut baselines = self.baselines.clone();
                baselines.insert(generation);
                let baselines: Vec<u32> = baselines.into_iter().collect();
                let search = self.config.search_settings();
                let arena = Arena {
                    board_size: self.config.board_size,
                    win_length: self.config.win_length,
                    search: &search,
                    seed: self
                        .config
                        .seed
                        .wrapping_add(u64::from(trained))
                        .wrapping_add(round << 48),
                };
                Some(run_tournament(
                    &self.pool,
                    &self.provider,
                    tournament,
                    &arena,
                    trained,
                    &baselines,
                )?)
            }
            None => None,
        };
        let promoted = tournament.as_ref().map_or(true, |t| t.promoted);
        if !promoted {
            info!("Generation {}: keeping generation {}", trained, generation);
            self.provider.release(trained)?;
        }

        let report = GenerationReport {
            source_generation: generation,
            trained_generation: trained,
            next_generation: if promoted { trained } else { generation },
            games_played: progress.games_played,
            new_samples: progress.samples,
            buffer_samples,
            training_samples: samples.len(),
            stop_reason,
            promoted,
            tournament,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        self.write_report(&report)?;
        Ok(report)
    }

    /// Play batches until the stop policy ends the generation.
    fn collect_samples(
        &self,
        generation: u32,
        round: u64,
        evaluator: &Arc<dyn Evaluator>,
    ) -> Result<(GenerationProgress, StopReason)> {
        let policy = StopPolicy::from_config(&self.config);
        let batch = self.config.games_per_batch;
        let base_seed = self
            .config
            .seed
            .wrapping_add(u64::from(generation) << 32)
            .wrapping_add(round << 48);
        let mut progress = GenerationProgress::default();

        loop {
            match policy.check(&progress) {
                Decision::Stop(reason) => return Ok((progress, reason)),
                Decision::ResetInterval => progress.reset_interval(),
                Decision::Continue => {}
            }

            let first = progress.games_played;
            let results: Vec<gomoku_core::Result<usize>> = self.pool.install(|| {
                (first..first + batch)
                    .into_par_iter()
                    .map(|i| -> gomoku_core::Result<usize> {
                        let seed = base_seed.wrapping_add(i as u64 * 1000);
                        let game = play_self_play_game(&self.config, evaluator.clone(), seed)?;
                        // Dedupe within the game here; only the merge takes the lock.
                        let mut seen = HashSet::new();
                        let samples = game.estimator.training_samples(game.winner, &mut seen);
                        Ok(self.lock_state().merge(samples))
                    })
                    .collect()
            });

            let mut new_samples = 0;
            for result in results {
                new_samples += result?;
            }
            progress.record_batch(batch, new_samples);
            debug!(
                "Generation {}: {} games, {} samples ({} new in this batch)",
                generation, progress.games_played, progress.samples, new_samples
            );
        }
    }

    /// Trim the buffer and draw a shuffled batch from it.
    fn training_batch(&self, generation: u32) -> (Vec<TrainingSample>, usize) {
        let mut state = self.lock_state();
        let evicted = state.trim(self.config.max_buffer_samples);
        if evicted > 0 {
            debug!("Evicted {} samples from the buffer", evicted);
        }

        let mut samples: Vec<TrainingSample> = state.buffer.iter().cloned().collect();
        let buffered = samples.len();
        drop(state);

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed ^ u64::from(generation));
        samples.shuffle(&mut rng);
        samples.truncate(self.config.training_sample_size);
        (samples, buffered)
    }

    fn write_report(&self, report: &GenerationReport) -> Result<()> {
        let path = self.store.report_path(report.source_generation);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        let file = File::create(&path).with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(BufWriter::new(file), report)
            .with_context(|| format!("Failed to write report {:?}", path))?;
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        // A worker that panicked mid-merge leaves at worst a partial batch.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentSettings, TournamentConfig};
    use crate::provider::UniformProvider;
    use gomoku_core::GomokuError;
    use gomoku_inference::ModelCache;
    use gomoku_mcts::{Evaluation, EstimatorKind, UniformEvaluator};

    /// Records each call and returns the next generation without a model.
    #[derive(Default)]
    struct RecordingTrainer {
        calls: Mutex<Vec<(u32, usize)>>,
    }

    impl Trainer for RecordingTrainer {
        fn train(&self, source: u32, samples: &[TrainingSample]) -> gomoku_core::Result<u32> {
            self.calls.lock().unwrap().push((source, samples.len()));
            Ok(source + 1)
        }
    }

    fn small_config() -> GymConfig {
        let mut config = GymConfig {
            board_size: 7,
            win_length: 4,
            workers: 2,
            games_per_batch: 4,
            min_samples: 10,
            min_games: 4,
            training_sample_size: 64,
            min_move_playouts: 4,
            max_move_playouts: 8,
            ..GymConfig::default()
        };
        config.agent.playouts = 8;
        config
    }

    fn scratch_store(name: &str) -> GenerationStore {
        let dir = std::env::temp_dir().join(format!("gomoku-gym-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        GenerationStore::new(dir, "gomoku", 7)
    }

    #[test]
    fn test_trim_releases_identity_hashes() {
        let sample = |hash: u64, symmetry: Symmetry| TrainingSample {
            input: Vec::new(),
            policy: Vec::new(),
            value: 0.0,
            position_hash: hash,
            symmetry,
        };
        let mut state = SessionState::default();
        state.buffer.push_back(sample(1, Symmetry::Identity));
        state.buffer.push_back(sample(1, Symmetry::Rotate90));
        state.buffer.push_back(sample(2, Symmetry::Identity));
        state.known.extend([1, 2]);

        assert_eq!(state.trim(1), 2);
        assert_eq!(state.buffer.len(), 1);
        assert!(!state.known.contains(&1));
        assert!(state.known.contains(&2));
    }

    #[test]
    fn test_generation_trains_successor() {
        let store = scratch_store("train");
        let gym = Gym::new(
            small_config(),
            UniformProvider::new(),
            RecordingTrainer::default(),
            store.clone(),
        )
        .unwrap();

        let report = gym.train_generation(0).unwrap();
        assert_eq!(report.trained_generation, 1);
        assert_eq!(report.next_generation, 1);
        assert!(report.promoted);
        assert!(report.tournament.is_none());
        assert!(report.games_played > 4);
        assert_eq!(report.games_played % 4, 0);
        assert!(report.training_samples <= 64);
        assert_eq!(gym.buffer_len(), report.buffer_samples);

        let calls = gym.trainer.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(0, report.training_samples)]);

        let written: serde_json::Value =
            serde_json::from_reader(File::open(store.report_path(0)).unwrap()).unwrap();
        assert_eq!(written["trained_generation"], 1);
        fs::remove_dir_all(store.dir()).unwrap();
    }

    #[test]
    fn test_carry_over_keeps_buffer() {
        let store = scratch_store("carry");
        let mut config = small_config();
        config.carry_over_samples = false;
        let gym = Gym::new(
            config,
            UniformProvider::new(),
            RecordingTrainer::default(),
            store.clone(),
        )
        .unwrap();

        let reports = gym.train(0, 2).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].source_generation, 1);
        // Without carry-over the buffer only holds the last generation.
        assert_eq!(gym.buffer_len(), reports[1].new_samples);
        fs::remove_dir_all(store.dir()).unwrap();
    }

    /// Generation 0 is the uniform evaluator; later generations are model
    /// files read through a cache. Their evaluators always fail, so every
    /// tournament game of a candidate is dropped and it is rejected.
    struct FileProvider {
        store: GenerationStore,
        cache: ModelCache<String>,
        evaluated: Mutex<Vec<String>>,
    }

    impl FileProvider {
        fn new(store: GenerationStore) -> Self {
            Self {
                store,
                cache: ModelCache::with_loader(|path| Ok(fs::read_to_string(path)?)),
                evaluated: Mutex::new(Vec::new()),
            }
        }
    }

    struct FailingEvaluator;

    impl Evaluator for FailingEvaluator {
        fn evaluate(&self, _observation: &[f32], _board_size: usize) -> gomoku_core::Result<Evaluation> {
            Err(GomokuError::Inference("untrained candidate".to_string()))
        }
    }

    impl EvaluatorProvider for FileProvider {
        fn evaluator(&self, generation: u32) -> gomoku_core::Result<Arc<dyn Evaluator>> {
            if generation == 0 {
                return Ok(Arc::new(UniformEvaluator::new()));
            }
            let path = self.store.model_path(generation);
            let model = self.cache.load(&path).map_err(|e| GomokuError::ModelLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            self.evaluated.lock().unwrap().push(model.to_string());
            Ok(Arc::new(FailingEvaluator))
        }

        fn release(&self, generation: u32) -> gomoku_core::Result<()> {
            self.cache
                .unload(self.store.model_path(generation))
                .map_err(|e| GomokuError::Training(e.to_string()))?;
            Ok(())
        }
    }

    /// Writes "attempt N" as the model of the next generation.
    struct FileTrainer {
        store: GenerationStore,
        attempts: AtomicU64,
    }

    impl Trainer for FileTrainer {
        fn train(&self, source: u32, _samples: &[TrainingSample]) -> gomoku_core::Result<u32> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let target = source + 1;
            fs::create_dir_all(self.store.dir())
                .and_then(|_| fs::write(self.store.model_path(target), format!("attempt {attempt}")))
                .map_err(|e| GomokuError::Training(e.to_string()))?;
            Ok(target)
        }
    }

    #[test]
    fn test_rejected_candidate_is_retrained_and_reloaded() {
        let store = scratch_store("gate");
        let tournament = TournamentConfig {
            games_per_baseline: 2,
            promotion_threshold: 0.5,
            agent: AgentSettings::evaluation(EstimatorKind::Neural, 4),
        };
        let trainer = FileTrainer {
            store: store.clone(),
            attempts: AtomicU64::new(0),
        };
        let mut gym = Gym::new(
            small_config().with_tournament(tournament),
            FileProvider::new(store.clone()),
            trainer,
            store.clone(),
        )
        .unwrap();
        gym.add_baseline(0);

        let first = gym.train_generation(0).unwrap();
        assert!(!first.promoted);
        assert_eq!(first.trained_generation, 1);
        assert_eq!(first.next_generation, 0);
        let result = first.tournament.as_ref().unwrap();
        assert_eq!(result.scores.len(), 1);
        assert_eq!(result.scores[0].generation, 0);
        assert_eq!(result.scores[0].games(), 0);
        assert_eq!(result.scores[0].failed, 2);

        let second = gym.train_generation(first.next_generation).unwrap();
        assert!(!second.promoted);
        assert_eq!(second.trained_generation, 1);
        // The second tournament saw the retrained model, not the cached one.
        assert_eq!(
            *gym.provider.evaluated.lock().unwrap(),
            vec!["attempt 1".to_string(), "attempt 2".to_string()]
        );
        assert!(!gym.provider.cache.contains(store.model_path(1)));

        assert!(gym.remove_baseline(0));
        fs::remove_dir_all(store.dir()).unwrap();
    }

    #[test]
    fn test_merge_skips_known_positions() {
        let sample = |hash: u64| TrainingSample {
            input: Vec::new(),
            policy: Vec::new(),
            value: 0.0,
            position_hash: hash,
            symmetry: Symmetry::Identity,
        };
        let mut state = SessionState::default();
        assert_eq!(state.merge(vec![sample(1), sample(2)]), 2);
        assert_eq!(state.merge(vec![sample(2), sample(3), sample(3)]), 1);
        assert_eq!(state.buffer.len(), 3);
        assert_eq!(state.known.len(), 3);
    }
}
