//! When a self-play generation stops collecting samples.

use crate::config::GymConfig;
use serde::Serialize;
use std::fmt;

/// Counters for the generation in progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GenerationProgress {
    pub games_played: usize,

    /// Samples produced this generation.
    pub samples: usize,

    /// Games since the last overfit check.
    pub interval_games: usize,

    /// New samples since the last overfit check.
    pub interval_new_samples: usize,
}

impl GenerationProgress {
    /// Account for one finished batch.
    pub fn record_batch(&mut self, games: usize, new_samples: usize) {
        self.games_played += games;
        self.interval_games += games;
        self.samples += new_samples;
        self.interval_new_samples += new_samples;
    }

    pub fn reset_interval(&mut self) {
        self.interval_games = 0;
        self.interval_new_samples = 0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// More samples than the per-generation cap.
    SampleCap,
    /// Minimum samples and minimum games both reached.
    TargetReached,
    /// Self-play mostly regenerates known positions.
    Overfit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StopReason::SampleCap => "sample cap reached",
            StopReason::TargetReached => "target games and samples reached",
            StopReason::Overfit => "too few new samples in the last interval",
        };
        f.write_str(reason)
    }
}

/// Outcome of one stop check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Continue,
    /// A full interval passed with enough new samples; start a new one.
    ResetInterval,
    Stop(StopReason),
}

/// Thresholds for ending a generation. Checked in order: sample cap,
/// target reached, overfit exit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StopPolicy {
    pub max_samples: usize,
    pub min_samples: usize,
    pub min_games: usize,
    pub overfit_exit_interval: usize,
    pub new_sample_threshold: usize,
}

impl StopPolicy {
    pub fn from_config(config: &GymConfig) -> Self {
        Self {
            max_samples: config.max_samples_per_generation,
            min_samples: config.min_samples,
            min_games: config.min_games,
            overfit_exit_interval: config.overfit_exit_interval,
            new_sample_threshold: config.new_sample_threshold,
        }
    }

    pub fn check(&self, progress: &GenerationProgress) -> Decision {
        if progress.samples > self.max_samples {
            return Decision::Stop(StopReason::SampleCap);
        }
        if progress.samples > self.min_samples && progress.games_played > self.min_games {
            return Decision::Stop(StopReason::TargetReached);
        }
        if progress.games_played > 0 && progress.interval_games >= self.overfit_exit_interval {
            if progress.interval_new_samples < self.new_sample_threshold {
                return Decision::Stop(StopReason::Overfit);
            }
            return Decision::ResetInterval;
        }
        Decision::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> StopPolicy {
        StopPolicy::from_config(&GymConfig::default())
    }

    fn progress(games: usize, samples: usize, interval_games: usize, interval_new: usize) -> GenerationProgress {
        GenerationProgress {
            games_played: games,
            samples,
            interval_games,
            interval_new_samples: interval_new,
        }
    }

    #[test]
    fn test_fresh_generation_continues() {
        assert_eq!(policy().check(&GenerationProgress::default()), Decision::Continue);
    }

    #[test]
    fn test_sample_cap() {
        let decision = policy().check(&progress(10, 200_001, 10, 200_001));
        assert_eq!(decision, Decision::Stop(StopReason::SampleCap));
    }

    #[test]
    fn test_target_needs_both_minimums() {
        let p = policy();
        assert_eq!(p.check(&progress(201, 1000, 50, 1000)), Decision::Continue);
        assert_eq!(p.check(&progress(150, 5000, 50, 5000)), Decision::Continue);
        assert_eq!(
            p.check(&progress(201, 1025, 50, 1025)),
            Decision::Stop(StopReason::TargetReached)
        );
    }

    #[test]
    fn test_overfit_exit_before_game_target() {
        // 100-game interval with only 30 new samples, well short of 200 games.
        let decision = policy().check(&progress(100, 400, 100, 30));
        assert_eq!(decision, Decision::Stop(StopReason::Overfit));
    }

    #[test]
    fn test_productive_interval_resets() {
        let mut p = progress(96, 600, 96, 600);
        assert_eq!(policy().check(&p), Decision::Continue);

        p.record_batch(48, 80);
        assert_eq!(p.interval_games, 144);
        assert_eq!(policy().check(&p), Decision::ResetInterval);
        p.reset_interval();
        assert_eq!(p.games_played, 144);
        assert_eq!(p.interval_new_samples, 0);
    }
}
