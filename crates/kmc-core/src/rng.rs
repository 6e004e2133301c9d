//! Deterministic RNG wrappers.
//!
//! # Determinism strategy
//!
//! The whole simulation draws from a single `SmallRng` seeded from one `u64`.
//! Two runs with the same seed and configuration therefore produce identical
//! event sequences, identical adjacency, and byte-identical dumps (the graph
//! containers all use a deterministic hasher).
//!
//! [`SharedRng`] wraps the generator in a mutex for the multi-threaded
//! driver; every draw is a short critical section.  Concurrent runs are not
//! reproducible (workers interleave), but they draw from one well-seeded
//! stream instead of racing on generator state.

use parking_lot::{Mutex, MutexGuard};
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Seeded simulation RNG.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn seed_from(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Weighted discrete draw: index `i` with probability `w[i] / Σ w`.
    ///
    /// Returns `None` when the weights cannot form a distribution (empty
    /// slice, a negative entry, or an all-zero sum) — the KMC sampler treats
    /// that as "no event possible", never as a panic.
    pub fn sample_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let dist = WeightedIndex::new(weights).ok()?;
        Some(dist.sample(&mut self.0))
    }

    /// Uniform draw from the open interval (0, 1).
    ///
    /// Never returns 0, so `-ln(u)` is always finite and positive — the
    /// exponential waiting-time draw stays strictly increasing.
    #[inline]
    pub fn unit_open(&mut self) -> f64 {
        self.0.gen_range(f64::MIN_POSITIVE..1.0)
    }
}

// ── SharedRng ─────────────────────────────────────────────────────────────────

/// [`SimRng`] behind a mutex, shared by every worker thread.
pub struct SharedRng(Mutex<SimRng>);

impl SharedRng {
    pub fn new(seed: u64) -> Self {
        SharedRng(Mutex::new(SimRng::seed_from(seed)))
    }

    /// Lock the generator for a multi-draw sequence.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, SimRng> {
        self.0.lock()
    }

    #[inline]
    pub fn gen_range<T, R>(&self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.lock().gen_range(range)
    }

    #[inline]
    pub fn gen_bool(&self, p: f64) -> bool {
        self.0.lock().gen_bool(p)
    }

    #[inline]
    pub fn sample_weighted(&self, weights: &[f64]) -> Option<usize> {
        self.0.lock().sample_weighted(weights)
    }

    #[inline]
    pub fn unit_open(&self) -> f64 {
        self.0.lock().unit_open()
    }
}
