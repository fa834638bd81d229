//! Random Source
//!
//! Tools never reach for a global generator. The registry owns one
//! `RandomSource` and lends it to each handler call, so tests can swap in a
//! scripted source and production can be seeded for reproducible runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Capability handed to tool handlers for every random draw they make.
pub trait RandomSource: Send {
    /// Uniform integer in `low..=high`. Callers guarantee `low <= high`.
    fn between(&mut self, low: i64, high: i64) -> i64;

    /// Uniform index in `0..len`. Callers guarantee `len > 0`.
    fn index(&mut self, len: usize) -> usize;
}

/// `RandomSource` backed by a general-purpose `rand` generator.
pub struct RngSource<R> {
    rng: R,
}

impl RngSource<StdRng> {
    /// Generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Deterministic generator, identical seeds yield identical draws.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn between(&mut self, low: i64, high: i64) -> i64 {
        self.rng.gen_range(low..=high)
    }

    fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Build the process-wide source, seeded when a seed is configured.
pub fn from_seed(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::from_entropy()),
    }
}
