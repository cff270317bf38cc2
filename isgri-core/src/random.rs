//! Sources of uniform draws for the decorrelation steps.
//!
//! Each event consumes draws in a fixed order (law selection first when
//! gain-drift correction is on, then the LUT2 random plane), so a seeded
//! source reproduces a run exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A stream of uniform draws in `[0, 1)`.
pub trait RandomSource {
    /// Returns the next draw in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }
}

/// Pseudorandom source backed by `StdRng`.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Creates a reproducible source from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a source seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, wrapping around at the end.
///
/// Intended for tests that need to pin the random plane or the
/// law-selection dither.
#[derive(Debug, Clone)]
pub struct ReplayRandom {
    draws: Vec<f64>,
    position: usize,
}

impl ReplayRandom {
    /// Creates a replay source. An empty list replays `0.0`.
    #[must_use]
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, position: 0 }
    }

    /// Replays the same draw forever.
    #[must_use]
    pub fn constant(draw: f64) -> Self {
        Self::new(vec![draw])
    }

    /// Number of draws consumed so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.position
    }
}

impl RandomSource for ReplayRandom {
    fn next_uniform(&mut self) -> f64 {
        let draw = if self.draws.is_empty() {
            0.0
        } else {
            self.draws[self.position % self.draws.len()]
        };
        self.position += 1;
        draw
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        for _ in 0..100 {
            let x = a.next_uniform();
            assert!((0.0..1.0).contains(&x));
            assert_eq!(x.to_bits(), b.next_uniform().to_bits());
        }
    }

    #[test]
    fn test_replay_random_wraps() {
        let mut source = ReplayRandom::new(vec![0.1, 0.2]);
        assert_eq!(source.next_uniform(), 0.1);
        assert_eq!(source.next_uniform(), 0.2);
        assert_eq!(source.next_uniform(), 0.1);
        assert_eq!(source.consumed(), 3);
    }

    #[test]
    fn test_replay_random_empty() {
        let mut source = ReplayRandom::new(Vec::new());
        assert_eq!(source.next_uniform(), 0.0);
    }
}
