//! Domain types with enforced invariants.
//!
//! - Policy: distribution over board cells summing to 1.0
//! - Value: game value in range [-1, 1]

use crate::{GomokuError, Result};

/// A probability distribution over board cells (`y * N + x`).
///
/// Invariant: all values are non-negative and sum to 1.0 (±1e-5).
///
/// # Example
/// ```
/// use gomoku_core::Policy;
///
/// let policy = Policy::from_unnormalized(vec![0.0, 3.0, 1.0]).unwrap();
/// assert!((policy[1] - 0.75).abs() < 1e-5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Policy(Vec<f32>);

impl Policy {
    /// Create a policy from non-negative weights, normalizing them to sum to 1.0.
    ///
    /// # Errors
    /// Returns an error if any weight is negative or all weights are zero.
    pub fn from_unnormalized(weights: Vec<f32>) -> Result<Self> {
        check_entries(&weights)?;

        let sum: f32 = weights.iter().sum();
        if sum <= 0.0 {
            return Err(GomokuError::InvalidPolicy(
                "cannot normalize: all weights are zero".to_string(),
            ));
        }

        Ok(Self(weights.into_iter().map(|w| w / sum).collect()))
    }

    /// Uniform distribution over `cells`, zero everywhere else.
    ///
    /// # Errors
    /// Returns an error if `cells` is empty or an index is out of range.
    pub fn uniform_over(cells: &[usize], len: usize) -> Result<Self> {
        if cells.is_empty() {
            return Err(GomokuError::InvalidPolicy(
                "cannot spread probability over zero cells".to_string(),
            ));
        }

        let mut probs = vec![0.0; len];
        let p = 1.0 / cells.len() as f32;
        for &cell in cells {
            let slot = probs.get_mut(cell).ok_or_else(|| {
                GomokuError::InvalidPolicy(format!("cell {} outside policy of {}", cell, len))
            })?;
            *slot = p;
        }
        Ok(Self(probs))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

fn check_entries(values: &[f32]) -> Result<()> {
    if values.is_empty() {
        return Err(GomokuError::InvalidPolicy(
            "policy cannot be empty".to_string(),
        ));
    }
    if values.iter().any(|&p| !p.is_finite() || p < 0.0) {
        return Err(GomokuError::InvalidPolicy(
            "policy contains negative or non-finite values".to_string(),
        ));
    }
    Ok(())
}

impl std::ops::Index<usize> for Policy {
    type Output = f32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// A game value estimate.
///
/// Invariant: value is in [-1, 1], where +1 means the player it is
/// expressed for wins and -1 means that player loses.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Value(f32);

impl Value {
    /// Value for a win.
    pub const WIN: Self = Self(1.0);

    /// Value for a loss.
    pub const LOSS: Self = Self(-1.0);

    /// Value for a draw or undetermined result.
    pub const DRAW: Self = Self(0.0);

    /// # Errors
    /// Returns `GomokuError::InvalidValue` if the value is outside [-1, 1].
    pub fn new(value: f32) -> Result<Self> {
        if !(-1.0..=1.0).contains(&value) {
            return Err(GomokuError::InvalidValue(format!(
                "value {} is outside range [-1, 1]",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Clamp a raw network output into [-1, 1]. NaN maps to a draw.
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            Self::DRAW
        } else {
            Self(value.clamp(-1.0, 1.0))
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// The same value seen by the opponent.
    pub fn negate(self) -> Self {
        Self(-self.0)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<Value> for f32 {
    fn from(v: Value) -> f32 {
        v.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_rejects_negative_and_empty() {
        assert!(Policy::from_unnormalized(vec![0.5, -0.2, 0.7]).is_err());
        assert!(Policy::from_unnormalized(vec![]).is_err());
        assert!(Policy::from_unnormalized(vec![f32::NAN, 1.0]).is_err());
    }

    #[test]
    fn test_policy_from_unnormalized() {
        let policy = Policy::from_unnormalized(vec![1.0, 2.0, 1.0]).unwrap();
        assert!((policy[0] - 0.25).abs() < 1e-5);
        assert!((policy[1] - 0.50).abs() < 1e-5);
        let sum: f32 = policy.into_inner().iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_policy_from_unnormalized_all_zero() {
        assert!(Policy::from_unnormalized(vec![0.0; 9]).is_err());
    }

    #[test]
    fn test_policy_uniform_over_cells() {
        let policy = Policy::uniform_over(&[0, 4, 8], 9).unwrap();
        assert_eq!(policy.len(), 9);
        assert!((policy[4] - 1.0 / 3.0).abs() < 1e-5);
        assert_eq!(policy[1], 0.0);
        assert!(Policy::uniform_over(&[9], 9).is_err());
        assert!(Policy::uniform_over(&[], 9).is_err());
    }

    #[test]
    fn test_value_range() {
        assert!(Value::new(1.0).is_ok());
        assert!(Value::new(-1.0).is_ok());
        assert!(Value::new(1.1).is_err());
        assert!(Value::new(f32::INFINITY).is_err());
    }

    #[test]
    fn test_value_clamped() {
        assert_eq!(Value::clamped(1.5).get(), 1.0);
        assert_eq!(Value::clamped(-1.5).get(), -1.0);
        assert_eq!(Value::clamped(f32::NAN), Value::DRAW);
    }

    #[test]
    fn test_value_negate() {
        assert_eq!(Value::WIN.negate(), Value::LOSS);
        assert_eq!(Value::new(0.25).unwrap().negate().get(), -0.25);
    }
}
