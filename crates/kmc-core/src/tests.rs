//! Unit tests for kmc-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, TypeId};

    #[test]
    fn index_roundtrip() {
        let id = AgentId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(AgentId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering_follows_creation_order() {
        assert!(AgentId(0) < AgentId(1));
        assert!(TypeId(3) > TypeId(2));
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "AgentId(7)");
        assert_eq!(TypeId(1).to_string(), "TypeId(1)");
    }
}

#[cfg(test)]
mod time {
    use crate::{APPROX_MONTH, SimTime, month_of, months_spanning};

    #[test]
    fn month_constant() {
        assert_eq!(APPROX_MONTH, 43_200.0);
    }

    #[test]
    fn month_buckets() {
        assert_eq!(month_of(0.0), 0);
        assert_eq!(month_of(APPROX_MONTH - 1.0), 0);
        assert_eq!(month_of(APPROX_MONTH), 1);
        assert_eq!(month_of(2.5 * APPROX_MONTH), 2);
    }

    #[test]
    fn months_spanning_short_run() {
        // The default 1000-minute run never leaves month 0.
        assert_eq!(months_spanning(1000.0), 0);
        assert_eq!(months_spanning(3.0 * APPROX_MONTH), 3);
    }

    #[test]
    fn clock_advances_and_resets() {
        let t = SimTime::new();
        assert_eq!(t.minutes(), 0.0);
        t.advance(100.0);
        t.advance(0.5);
        assert!((t.minutes() - 100.5).abs() < 1e-12);
        assert_eq!(t.month(), 0);
        t.advance(APPROX_MONTH);
        assert_eq!(t.month(), 1);
        t.reset();
        assert_eq!(t.minutes(), 0.0);
    }
}

#[cfg(test)]
mod sync {
    use std::sync::atomic::Ordering;

    use crate::AtomicF64;

    #[test]
    fn load_store() {
        let a = AtomicF64::new(1.5);
        assert_eq!(a.load(Ordering::Relaxed), 1.5);
        a.store(-2.25, Ordering::Relaxed);
        assert_eq!(a.load(Ordering::Relaxed), -2.25);
    }

    #[test]
    fn fetch_add_returns_new_value() {
        let a = AtomicF64::new(1.0);
        assert_eq!(a.fetch_add(0.5, Ordering::AcqRel), 1.5);
        assert_eq!(a.load(Ordering::Relaxed), 1.5);
    }

    #[test]
    fn concurrent_adds_sum() {
        let a = std::sync::Arc::new(AtomicF64::new(0.0));
        std::thread::scope(|s| {
            for _ in 0..4 {
                let a = a.clone();
                s.spawn(move || {
                    for _ in 0..1000 {
                        a.fetch_add(1.0, Ordering::AcqRel);
                    }
                });
            }
        });
        assert_eq!(a.load(Ordering::Relaxed), 4000.0);
    }
}

#[cfg(test)]
mod rng {
    use crate::{SharedRng, SimRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = SimRng::seed_from(12345);
        let mut r2 = SimRng::seed_from(12345);
        for _ in 0..100 {
            let a: f64 = r1.gen_range(0.0..1.0);
            let b: f64 = r2.gen_range(0.0..1.0);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut r1 = SimRng::seed_from(1);
        let mut r2 = SimRng::seed_from(2);
        let a: u64 = r1.gen_range(0..u64::MAX);
        let b: u64 = r2.gen_range(0..u64::MAX);
        assert_ne!(a, b);
    }

    #[test]
    fn sample_weighted_respects_zero_entries() {
        let mut rng = SimRng::seed_from(7);
        let weights = [0.0, 3.0, 0.0];
        for _ in 0..100 {
            assert_eq!(rng.sample_weighted(&weights), Some(1));
        }
    }

    #[test]
    fn sample_weighted_rejects_degenerate_inputs() {
        let mut rng = SimRng::seed_from(7);
        assert_eq!(rng.sample_weighted(&[]), None);
        assert_eq!(rng.sample_weighted(&[0.0, 0.0]), None);
        assert_eq!(rng.sample_weighted(&[1.0, -1.0]), None);
    }

    #[test]
    fn unit_open_stays_in_open_interval() {
        let mut rng = SimRng::seed_from(0);
        for _ in 0..10_000 {
            let u = rng.unit_open();
            assert!(u > 0.0 && u < 1.0, "got {u}");
        }
    }

    #[test]
    fn shared_rng_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedRng>();
    }

    #[test]
    fn gen_bool_extremes() {
        let rng = SharedRng::new(0);
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }
}
