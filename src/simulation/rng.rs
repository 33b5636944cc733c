//! Injectable randomness for the fill simulation.
//!
//! Every random decision a tick makes (vehicle pick, post-collection residual
//! fill, grinder wear, odor jitter) goes through [`RandomSource`], so tests and
//! replays can pin the outcome.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Lower bound of the fill level left behind after a collection
pub const RESIDUAL_FILL_MIN: f64 = 15.0;

/// Upper bound (exclusive) of the fill level left behind after a collection
pub const RESIDUAL_FILL_MAX: f64 = 25.0;

/// Seed used when the configuration does not provide one
pub const DEFAULT_SEED: u64 = 42;

pub trait RandomSource: Send {
    /// Uniform index in `0..len`; `len` is never zero.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Uniform fill level in `[RESIDUAL_FILL_MIN, RESIDUAL_FILL_MAX)`
    fn residual_fill(&mut self) -> f64;

    /// True with the given probability
    fn chance(&mut self, probability: f64) -> bool;

    /// Odor score jitter, `-1` or `+1`
    fn odor_jitter(&mut self) -> i32;
}

/// Seedable simulation RNG backed by `ChaCha8Rng`.
///
/// Identical seeds produce identical simulation output.
pub struct SimRng(ChaCha8Rng);

impl Default for SimRng {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(DEFAULT_SEED))
    }
}

impl SimRng {
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Seeded from OS entropy; runs are not reproducible
    pub fn from_entropy() -> Self {
        Self(ChaCha8Rng::from_entropy())
    }
}

impl RandomSource for SimRng {
    fn pick_index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }

    fn residual_fill(&mut self) -> f64 {
        self.0.gen_range(RESIDUAL_FILL_MIN..RESIDUAL_FILL_MAX)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.0.gen_bool(probability.clamp(0.0, 1.0))
    }

    fn odor_jitter(&mut self) -> i32 {
        if self.0.gen_bool(0.5) {
            1
        } else {
            -1
        }
    }
}

/// Fixed-outcome source for deterministic replays.
///
/// `jitter` may be pinned to `0`, which the live source never produces.
#[derive(Clone, Debug)]
pub struct PinnedRandom {
    pub index: usize,
    pub residual: f64,
    pub chance: bool,
    pub jitter: i32,
}

impl Default for PinnedRandom {
    fn default() -> Self {
        Self {
            index: 0,
            residual: 20.0,
            chance: false,
            jitter: 0,
        }
    }
}

impl RandomSource for PinnedRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        self.index.min(len.saturating_sub(1))
    }

    fn residual_fill(&mut self) -> f64 {
        self.residual
    }

    fn chance(&mut self, _probability: f64) -> bool {
        self.chance
    }

    fn odor_jitter(&mut self) -> i32 {
        self.jitter
    }
}
