//! Test RNGs: deterministic `DeterministicRng` implementations for tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use waitlist_core::rng::DeterministicRng;

/// A no-op RNG that always returns `min`. With the partial Fisher–Yates
/// sampler this selects the first `k` pool members in pool order.
#[derive(Debug)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }
}

/// An RNG that returns values from a predetermined sequence. Panics if the
/// sequence is exhausted. Used in tests that need a specific swap order.
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<u32>,
    index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given values.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, index: 0 }
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, _min: u32, _max: u32) -> u32 {
        let val = self.values[self.index];
        self.index += 1;
        val
    }
}

/// A seeded `StdRng`, for repeatable statistical tests.
#[derive(Debug)]
pub struct SeededRng(StdRng);

impl SeededRng {
    /// Create a new RNG from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl DeterministicRng for SeededRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        self.0.random_range(min..=max)
    }
}
