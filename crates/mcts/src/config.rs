//! Search configuration parameters.
//!
//! One config struct per search strategy. Defaults follow the values the
//! engine has been tuned with on a 15×15 board.

use gomoku_board::DEFAULT_WIN_LENGTH;
use gomoku_core::{GomokuError, Result};
use serde::{Deserialize, Serialize};

/// PUCT search configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Playouts at the current node before a move is chosen by `search`.
    pub num_simulations: u32,

    /// Exploration constant C in `Q + C * P * sqrt(N_parent) / (1 + N_child)`.
    pub exploration: f32,

    /// Dirichlet noise alpha.
    pub dirichlet_alpha: f32,

    /// Fraction of the prior replaced with Dirichlet noise.
    pub exploration_fraction: f32,

    /// Noise is applied while selecting at depths below this, counted from
    /// the current node (1 = its children only).
    pub noise_depth: usize,

    /// Chebyshev radius of the candidate generator.
    pub candidate_radius: usize,

    /// Stones in a row needed to win.
    pub win_length: usize,

    /// Self-play mode: enables root noise.
    pub training: bool,

    /// Drop every node outside the chosen subtree when a move is applied.
    /// Training needs the full history, so this stays off for self-play.
    pub prune_on_move: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: 400,
            exploration: 5.0,
            dirichlet_alpha: 0.15,
            exploration_fraction: 0.25,
            noise_depth: 1,
            candidate_radius: 2,
            win_length: DEFAULT_WIN_LENGTH,
            training: false,
            prune_on_move: false,
        }
    }
}

impl MctsConfig {
    /// Create a new config with the specified number of simulations.
    pub fn with_simulations(num_simulations: u32) -> Self {
        Self {
            num_simulations,
            ..Default::default()
        }
    }

    /// Self-play configuration with exploration noise.
    pub fn for_training(num_simulations: u32) -> Self {
        Self {
            num_simulations,
            training: true,
            ..Default::default()
        }
    }

    /// Evaluation configuration: no noise, subtree reuse only.
    pub fn for_evaluation(num_simulations: u32) -> Self {
        Self {
            num_simulations,
            training: false,
            exploration_fraction: 0.0,
            prune_on_move: true,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.exploration.is_finite() || self.exploration <= 0.0 {
            return Err(GomokuError::InvalidConfig(format!(
                "exploration must be positive, got {}",
                self.exploration
            )));
        }
        if !self.dirichlet_alpha.is_finite() || self.dirichlet_alpha <= 0.0 {
            return Err(GomokuError::InvalidConfig(format!(
                "dirichlet_alpha must be positive, got {}",
                self.dirichlet_alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.exploration_fraction) {
            return Err(GomokuError::InvalidConfig(format!(
                "exploration_fraction must be in [0, 1], got {}",
                self.exploration_fraction
            )));
        }
        validate_common(self.candidate_radius, self.win_length)
    }
}

/// Random-rollout MCTS configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    pub num_simulations: u32,

    /// Exploration constant C in `Q + 2C * sqrt(2 ln N / n)`.
    pub exploration: f32,

    /// Random playouts run in parallel for every simulation.
    pub rollouts_per_simulation: usize,

    /// Visits a leaf needs before it is expanded.
    pub expansion_threshold: u32,

    pub candidate_radius: usize,
    pub win_length: usize,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            num_simulations: 200,
            exploration: 1.0,
            rollouts_per_simulation: 12,
            expansion_threshold: 100,
            candidate_radius: 2,
            win_length: DEFAULT_WIN_LENGTH,
        }
    }
}

impl RolloutConfig {
    pub fn with_simulations(num_simulations: u32) -> Self {
        Self {
            num_simulations,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rollouts_per_simulation == 0 {
            return Err(GomokuError::InvalidConfig(
                "rollouts_per_simulation must be at least 1".to_string(),
            ));
        }
        validate_common(self.candidate_radius, self.win_length)
    }
}

/// Alpha-beta configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaBetaConfig {
    /// Plies searched before leaves are scored by the evaluator.
    pub depth: usize,
    pub candidate_radius: usize,
    pub win_length: usize,
}

impl Default for AlphaBetaConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            candidate_radius: 2,
            win_length: DEFAULT_WIN_LENGTH,
        }
    }
}

impl AlphaBetaConfig {
    pub fn with_depth(depth: usize) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(GomokuError::InvalidConfig(
                "alpha-beta depth must be at least 1".to_string(),
            ));
        }
        validate_common(self.candidate_radius, self.win_length)
    }
}

fn validate_common(candidate_radius: usize, win_length: usize) -> Result<()> {
    if !(1..=5).contains(&candidate_radius) {
        return Err(GomokuError::InvalidConfig(format!(
            "candidate_radius must be in 1..=5, got {}",
            candidate_radius
        )));
    }
    if win_length < 3 {
        return Err(GomokuError::InvalidConfig(format!(
            "win_length must be at least 3, got {}",
            win_length
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.num_simulations, 400);
        assert!((config.dirichlet_alpha - 0.15).abs() < 1e-6);
        assert!((config.exploration_fraction - 0.25).abs() < 1e-6);
        assert_eq!(config.noise_depth, 1);
        assert_eq!(config.win_length, 5);
        assert!(!config.training);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_training() {
        let config = MctsConfig::for_training(100);
        assert_eq!(config.num_simulations, 100);
        assert!(config.training);
        assert!(!config.prune_on_move);
    }

    #[test]
    fn test_for_evaluation() {
        let config = MctsConfig::for_evaluation(50);
        assert!(!config.training);
        assert_eq!(config.exploration_fraction, 0.0);
        assert!(config.prune_on_move);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MctsConfig::default();
        config.exploration = 0.0;
        assert!(config.validate().is_err());

        let mut config = MctsConfig::default();
        config.candidate_radius = 6;
        assert!(config.validate().is_err());

        assert!(AlphaBetaConfig::with_depth(0).validate().is_err());

        let mut rollout = RolloutConfig::default();
        rollout.rollouts_per_simulation = 0;
        assert!(rollout.validate().is_err());
    }
}
