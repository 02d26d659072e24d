//! Zobrist keys for incremental position hashing.
//!
//! Keys come from a fixed-seed ChaCha stream per board size, so every board
//! of the same size in a process (and across runs) hashes identically.
//! Sample deduplication across games relies on this.

use crate::Color;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const KEY_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Per-(cell, color) random keys.
#[derive(Debug)]
pub struct ZobristKeys {
    keys: Vec<[u64; 2]>,
}

impl ZobristKeys {
    pub fn new(size: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(KEY_SEED ^ size as u64);
        let keys = (0..size * size)
            .map(|_| [rng.gen::<u64>(), rng.gen::<u64>()])
            .collect();
        Self { keys }
    }

    /// Key for `color` at the flat cell `index`.
    #[inline]
    pub fn key(&self, index: usize, color: Color) -> u64 {
        self.keys[index][color.index()]
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_deterministic() {
        let a = ZobristKeys::new(15);
        let b = ZobristKeys::new(15);
        for i in 0..a.len() {
            assert_eq!(a.key(i, Color::Black), b.key(i, Color::Black));
            assert_eq!(a.key(i, Color::White), b.key(i, Color::White));
        }
    }

    #[test]
    fn test_keys_are_distinct() {
        let keys = ZobristKeys::new(15);
        let mut seen = HashSet::new();
        for i in 0..keys.len() {
            for color in Color::ALL {
                assert!(seen.insert(keys.key(i, color)));
            }
        }
    }
}
