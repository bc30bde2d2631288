//! Injectable randomness.
//!
//! Every random decision in the game (encounter rolls, damage variance, accuracy,
//! capture and flee chances, AI choices) goes through [`RandomSource`], so a session
//! can run on a seeded generator and tests can script exact outcomes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(test)]
use std::collections::VecDeque;

pub trait RandomSource {
    /// Uniform value in `[0.0, 1.0)`. `reason` names the decision for tracing.
    fn next_unit(&mut self, reason: &str) -> f64;

    /// True with probability `p` (clamped to `[0, 1]`).
    fn chance(&mut self, p: f64, reason: &str) -> bool {
        self.next_unit(reason) < p.clamp(0.0, 1.0)
    }

    /// Uniform integer in `low..=high`. Returns `low` if the range is empty.
    fn range_inclusive(&mut self, low: u32, high: u32, reason: &str) -> u32 {
        if high <= low {
            return low;
        }
        let span = (high - low + 1) as f64;
        let offset = (self.next_unit(reason) * span) as u32;
        low + offset.min(high - low)
    }

    /// Uniform float in `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64, reason: &str) -> f64 {
        low + (high - low) * self.next_unit(reason)
    }

    /// Uniform index into a collection of `len` elements. `len` must be non-zero.
    fn pick_index(&mut self, len: usize, reason: &str) -> usize {
        self.range_inclusive(0, len.saturating_sub(1) as u32, reason) as usize
    }
}

/// Production source backed by a seedable `StdRng`.
#[derive(Debug, Clone)]
pub struct SeededRng {
    inner: StdRng,
}

impl SeededRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }
}

impl RandomSource for SeededRng {
    fn next_unit(&mut self, reason: &str) -> f64 {
        let value: f64 = self.inner.random();
        tracing::trace!(reason, value, "rng draw");
        value
    }
}

/// Test source that replays a fixed list of unit values.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    outcomes: VecDeque<f64>,
}

#[cfg(test)]
impl ScriptedRng {
    pub fn new(outcomes: Vec<f64>) -> Self {
        Self {
            outcomes: outcomes.into(),
        }
    }

    /// A long run of the same value, for tests that don't care about the draws.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value; 256])
    }

    pub fn remaining(&self) -> usize {
        self.outcomes.len()
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRng {
    fn next_unit(&mut self, reason: &str) -> f64 {
        match self.outcomes.pop_front() {
            Some(value) => {
                println!("[RNG] Consumed {} for: {}", value, reason);
                value
            }
            None => panic!(
                "ScriptedRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                reason
            ),
        }
    }
}
