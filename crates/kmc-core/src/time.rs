//! Simulated-time model.
//!
//! # Design
//!
//! The canonical time unit is the simulated **minute**, stored as an `f64`:
//! the Kinetic Monte Carlo clock advances by exponentially distributed real
//! increments, so an integer tick cannot represent it.  [`SimTime`] wraps the
//! value in an [`AtomicF64`] so every worker thread can read the clock and
//! apply increments without a lock.
//!
//! Agent cohorts and weight schedules are bucketed by a fixed 30-day month of
//! [`APPROX_MONTH`] = 30·24·60 = 43 200 minutes.

use std::fmt;
use std::sync::atomic::Ordering;

use crate::sync::AtomicF64;

/// Minutes per simulated month: 30 days, 24 hours, 60 minutes.
pub const APPROX_MONTH: f64 = 30.0 * 24.0 * 60.0;

/// Month bucket containing the given simulated minute.
#[inline]
pub fn month_of(minutes: f64) -> usize {
    (minutes / APPROX_MONTH) as usize
}

/// Number of whole months spanned by a run of `max_time` minutes.
///
/// Weight schedules are sized `months_spanning(max_time) + 1` so that every
/// month index a run can produce has an entry.
#[inline]
pub fn months_spanning(max_time: f64) -> usize {
    (max_time / APPROX_MONTH) as usize
}

// ── SimTime ───────────────────────────────────────────────────────────────────

/// The shared simulation clock, in simulated minutes.
///
/// Monotone: the engine only ever applies strictly positive increments via
/// [`SimTime::advance`].  Reads are lock-free.
#[derive(Debug, Default)]
pub struct SimTime(AtomicF64);

impl SimTime {
    pub fn new() -> Self {
        SimTime(AtomicF64::new(0.0))
    }

    /// Current simulated time in minutes.
    #[inline]
    pub fn minutes(&self) -> f64 {
        self.0.load(Ordering::Acquire)
    }

    /// Month bucket of the current time.
    #[inline]
    pub fn month(&self) -> usize {
        month_of(self.minutes())
    }

    /// Add `dt` minutes and return the new value.
    ///
    /// # Panics
    /// Debug-asserts that `dt` is positive and finite.
    #[inline]
    pub fn advance(&self, dt: f64) -> f64 {
        debug_assert!(dt > 0.0 && dt.is_finite(), "non-positive time step {dt}");
        self.0.fetch_add(dt, Ordering::AcqRel)
    }

    /// Rewind to zero.  Only meaningful while no workers are running.
    pub fn reset(&self) {
        self.0.store(0.0, Ordering::Release);
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} min (month {})", self.minutes(), self.month())
    }
}
