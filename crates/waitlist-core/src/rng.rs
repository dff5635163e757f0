//! Random number generator abstraction for fair, testable draws.
//!
//! In production, this wraps an OS-seeded cryptographic RNG. In tests, a
//! seeded or scripted implementation is injected.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a uniformly distributed `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;
}

/// Production RNG: `StdRng` (a ChaCha-based CSPRNG) seeded from the OS.
#[derive(Debug)]
pub struct SystemRng(StdRng);

impl SystemRng {
    /// Creates an RNG seeded from operating-system entropy.
    #[must_use]
    pub fn from_os_entropy() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl DeterministicRng for SystemRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        self.0.random_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_rng_stays_within_inclusive_bounds() {
        let mut rng = SystemRng::from_os_entropy();
        for _ in 0..1_000 {
            let value = rng.next_u32_range(3, 7);
            assert!((3..=7).contains(&value));
        }
    }

    #[test]
    fn test_system_rng_degenerate_range_returns_bound() {
        let mut rng = SystemRng::from_os_entropy();
        assert_eq!(rng.next_u32_range(4, 4), 4);
    }
}
