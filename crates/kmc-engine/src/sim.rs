//! The simulation driver: ownership, run loops, and output orchestration.

use std::io::{self, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use kmc_actions::ActionKind;
use kmc_config::Settings;
use kmc_core::{Contents, SharedRng};
use kmc_network::Network;
use kmc_output::{
    OutputResult, write_agent_type_info, write_categories_distro, write_dd_by_follow_model,
    write_degree_distributions, write_edge_list, write_gexf, write_graphml, write_main_stats,
};

use crate::engine::Engine;
use crate::error::SimResult;

// ── RunReport ─────────────────────────────────────────────────────────────────

/// What a finished run looked like.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    /// `finished` emissions (KMC steps).
    pub steps: u64,
    /// Graph-changing events.
    pub events: u64,
    /// Final simulated time in minutes.
    pub sim_minutes: f64,
    /// Wall-clock duration of the loop.
    pub elapsed: Duration,
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// Owns the whole world: settings, network, engine, RNG, and the contents
/// placeholder.  Actions and engine borrow these per call, so ownership stays
/// acyclic.
pub struct Simulation {
    settings: Settings,
    network: Network,
    engine: Engine,
    rng: SharedRng,
    #[allow(dead_code)]
    contents: Contents,
}

impl Simulation {
    /// Validate settings, build the world, and seed the initial population.
    pub fn new(settings: Settings, seed: u64) -> SimResult<Self> {
        settings.validate()?;
        let network = Network::new(&settings);
        let engine = Engine::new(&settings);
        let rng = SharedRng::new(seed);
        let sim = Simulation { settings, network, engine, rng, contents: Contents };
        sim.engine.post_init(&sim.network, &sim.rng);
        Ok(sim)
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn network(&self) -> &Network {
        &self.network
    }

    #[inline]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn wall_limit(&self) -> Duration {
        Duration::from_secs_f64(self.settings.analysis.max_real_time * 60.0)
    }

    // ── Single-threaded driver ────────────────────────────────────────────

    /// Run until the simulated-time or wall-clock bound.
    pub fn run(&self) -> RunReport {
        let start = Instant::now();
        let max_time = self.settings.analysis.max_time;
        let deadline = self.wall_limit();

        while self.engine.time_minutes() < max_time && start.elapsed() < deadline {
            if !self.engine.step(&self.network, &self.rng) {
                tracing::warn!("total event weight is zero; stopping run");
                break;
            }
        }
        self.report(start.elapsed())
    }

    // ── Multi-threaded driver ─────────────────────────────────────────────

    /// Run with `threads` workers (0 = available parallelism) draining a
    /// one-deep action pipeline: each worker either invokes the parked
    /// action or samples the next one and parks it.
    pub fn run_parallel(&self, threads: usize) -> RunReport {
        let workers = if threads == 0 {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            threads
        };
        let start = Instant::now();
        let pending: Mutex<Option<ActionKind>> = Mutex::new(None);
        let stalled = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for worker in 1..workers {
                let pending = &pending;
                let stalled = &stalled;
                scope.spawn(move || self.worker_loop(worker, pending, stalled, start));
            }
            self.worker_loop(0, &pending, &stalled, start);
        });
        self.report(start.elapsed())
    }

    fn worker_loop(
        &self,
        worker: usize,
        pending: &Mutex<Option<ActionKind>>,
        stalled: &AtomicBool,
        start: Instant,
    ) {
        let max_time = self.settings.analysis.max_time;
        let deadline = self.wall_limit();

        let result = catch_unwind(AssertUnwindSafe(|| {
            while self.engine.time_minutes() < max_time
                && start.elapsed() < deadline
                && !stalled.load(Ordering::Relaxed)
            {
                let parked = pending.lock().take();
                match parked {
                    Some(kind) => self.engine.invoke(kind, &self.network, &self.rng),
                    None => match self.engine.sample_action(&self.network, &self.rng) {
                        Some(kind) => *pending.lock() = Some(kind),
                        None => stalled.store(true, Ordering::Relaxed),
                    },
                }
            }
        }));

        if let Err(payload) = result {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".into());
            tracing::error!(worker, %reason, "worker thread panicked and exited");
        }
    }

    fn report(&self, elapsed: Duration) -> RunReport {
        RunReport {
            steps: self.engine.steps(),
            events: self.engine.events(),
            sim_minutes: self.engine.time_minutes(),
            elapsed,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Return the world to the empty initial state (`n_agents = 0`).
    pub fn reset(&self) {
        self.network.reset();
        self.engine.reset();
    }

    // ── Output ────────────────────────────────────────────────────────────

    /// The `out.dat` body: wall duration plus the engine and network
    /// summaries.
    pub fn write_report<W: Write>(&self, out: &mut W, elapsed: Duration) -> io::Result<()> {
        writeln!(out, "# Elapsed time: {} ms", elapsed.as_millis())?;
        self.engine.write_summary(out)?;
        self.network.write_summary(out)?;
        Ok(())
    }

    /// Run every enabled writer into `folder`.
    ///
    /// Creating the folder is the only fatal failure; individual writers log
    /// a warning and the rest still run.
    pub fn dump(&self, folder: &Path) -> OutputResult<()> {
        std::fs::create_dir_all(folder)?;
        let toggles = &self.settings.output;
        let net = &self.network;
        let follow = self.engine.follow();

        let soft = |artifact: &str, result: OutputResult<()>| {
            if let Err(error) = result {
                tracing::warn!(artifact, %error, "output writer failed");
            }
        };

        if toggles.visualize {
            soft("network.dat", write_edge_list(folder, net));
            soft("network.gexf", write_gexf(folder, net));
            soft("network.graphml", write_graphml(folder, net));
        }
        if toggles.main_statistics {
            soft("main_stats.dat", write_main_stats(folder, net, &follow.follow_stats()));
        }
        if toggles.categories_distro {
            soft(
                "Categories_Distro.dat",
                write_categories_distro(folder, &follow.bin_sizes()),
            );
        }
        if toggles.degree_distribution_by_follow_model {
            let n = net.size() as usize;
            soft(
                "dd_by_follow_model.dat",
                write_dd_by_follow_model(
                    folder,
                    net,
                    &follow.followee_method_counts(n),
                    &follow.follower_method_counts(n),
                ),
            );
        }
        if toggles.agent_stats {
            soft("agent type info", write_agent_type_info(folder, net));
        }
        if toggles.degree_distributions {
            soft(
                "degree distributions",
                write_degree_distributions(folder, net, self.engine.time().month()),
            );
        }
        Ok(())
    }
}
