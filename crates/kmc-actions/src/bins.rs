//! The preferential-attachment bin structure.
//!
//! Followees are partitioned into bins by follower count; sampling a followee
//! is a weighted draw over `W[i] · |B[i]|` followed by a uniform pick inside
//! the chosen bin, so each connect costs O(1) bin maintenance instead of a
//! population scan.
//!
//! `kmax` is a monotone upper bound on the highest populated bin index; the
//! sampler only materializes weights up to `kmax`, which keeps early-run
//! draws cheap when agents cluster in the low bins.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use kmc_core::SharedRng;

/// One bin ladder: the partition, its static weights, and `kmax`.
///
/// Mutations (insert / promote) and sampling take the bin mutex; every
/// critical section is bounded by a few set operations.
pub struct PrefAttachment {
    bins: Mutex<Vec<FxHashSet<u32>>>,
    weights: Vec<f64>,
    kmax: AtomicUsize,
}

impl PrefAttachment {
    /// One bin per weight entry.  `weights` must be non-empty.
    pub fn new(weights: Vec<f64>) -> Self {
        assert!(!weights.is_empty(), "bin ladder needs at least one bin");
        let bins = weights.iter().map(|_| FxHashSet::default()).collect();
        PrefAttachment {
            bins: Mutex::new(bins),
            weights,
            kmax: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn n_bins(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn kmax(&self) -> usize {
        self.kmax.load(Ordering::Relaxed)
    }

    /// A new followee starts in `B[0]` (zero followers).
    pub fn insert_new(&self, id: u32) {
        self.bins.lock()[0].insert(id);
    }

    /// Move `id` to the bin for its new follower count.
    ///
    /// Fast path: with unit bin spacing the followee sits in `B[idx - 1]`
    /// (its count was just incremented by one).  When the spacing collapses
    /// several counts into one bin the fast path misses and we scan downward
    /// for the containing bin.
    pub fn promote(&self, id: u32, idx: usize) {
        let mut bins = self.bins.lock();
        let idx = idx.min(bins.len() - 1);

        if !(idx > 0 && bins[idx - 1].remove(&id)) {
            let mut at = idx;
            while !bins[at].contains(&id) && at > 0 {
                at -= 1;
            }
            let found = bins[at].remove(&id);
            debug_assert!(found, "followee missing from every bin");
        }
        bins[idx].insert(id);
        drop(bins);

        self.kmax.fetch_max(idx, Ordering::Relaxed);
    }

    /// Weighted draw of a bin over `W[i] · |B[i]|` for `i ∈ [0, kmax]`, then
    /// a uniform member of the chosen bin.  `None` when every reachable bin
    /// is empty.
    pub fn sample(&self, rng: &SharedRng) -> Option<u32> {
        let bins = self.bins.lock();
        let top = self.kmax.load(Ordering::Relaxed).min(bins.len() - 1);
        let weighted: Vec<f64> = self.weights[..=top]
            .iter()
            .zip(bins.iter())
            .map(|(w, b)| w * b.len() as f64)
            .collect();

        let mut rng = rng.lock();
        let idx = rng.sample_weighted(&weighted)?;
        let bin = &bins[idx];
        if bin.is_empty() {
            return None;
        }
        let k = rng.gen_range(0..bin.len());
        bin.iter().nth(k).copied()
    }

    /// Current population of every bin.
    pub fn bin_sizes(&self) -> Vec<usize> {
        self.bins.lock().iter().map(FxHashSet::len).collect()
    }

    /// Total membership across all bins.
    pub fn population(&self) -> usize {
        self.bins.lock().iter().map(FxHashSet::len).sum()
    }

    /// Bin index currently holding `id`, if any.
    pub fn find(&self, id: u32) -> Option<usize> {
        self.bins.lock().iter().position(|b| b.contains(&id))
    }

    /// Empty every bin and reset `kmax`.
    pub fn clear(&self) {
        for bin in self.bins.lock().iter_mut() {
            bin.clear();
        }
        self.kmax.store(0, Ordering::Relaxed);
    }
}
