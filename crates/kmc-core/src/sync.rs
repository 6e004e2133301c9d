//! A minimal atomic `f64`, bit-cast over `AtomicU64`.
//!
//! The simulator keeps two floating-point quantities hot across threads: the
//! simulated clock and each action's sampling weight.  Neither needs more
//! than load/store/fetch-add, so a ten-line wrapper beats pulling a mutex
//! into every read path.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        AtomicF64(AtomicU64::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self, order: Ordering) -> f64 {
        f64::from_bits(self.0.load(order))
    }

    #[inline]
    pub fn store(&self, value: f64, order: Ordering) {
        self.0.store(value.to_bits(), order);
    }

    /// Add `delta` and return the *new* value.  Lock-free CAS loop.
    pub fn fetch_add(&self, delta: f64, order: Ordering) -> f64 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = f64::from_bits(current) + delta;
            match self.0.compare_exchange_weak(
                current,
                next.to_bits(),
                order,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }
}
