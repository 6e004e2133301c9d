//! The KMC event-dispatch engine.
//!
//! Holds the closed action set, the simulated clock, and the step/event
//! counters.  One tick:
//!
//! 1. refresh every action's weight (intentionally not atomic across
//!    actions — the sampler only needs non-negative weights);
//! 2. weighted-sample one action and invoke it;
//! 3. route any agents it created to the follow action's bookkeeping;
//! 4. count `happened` emissions and advance the clock once per `finished`
//!    by an exponential (or fixed `1/Σw`) increment.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use kmc_actions::{ActionContext, ActionKind, ActionOutcome, AddAgentAction, FollowAction};
use kmc_config::Settings;
use kmc_core::{SharedRng, SimTime};
use kmc_network::Network;

// ── Engine ────────────────────────────────────────────────────────────────────

pub struct Engine {
    add_agent: AddAgentAction,
    follow: FollowAction,
    time: SimTime,
    /// `finished` emissions across all actions.
    steps: AtomicU64,
    /// `happened` emissions across all actions.
    events: AtomicU64,
    random_time_increment: bool,
}

impl Engine {
    pub fn new(settings: &Settings) -> Self {
        Engine {
            add_agent: AddAgentAction::new(settings),
            follow: FollowAction::new(settings),
            time: SimTime::new(),
            steps: AtomicU64::new(0),
            events: AtomicU64::new(0),
            random_time_increment: settings.analysis.use_random_time_increment,
        }
    }

    fn ctx<'a>(&'a self, net: &'a Network, rng: &'a SharedRng) -> ActionContext<'a> {
        ActionContext { net, rng, time: &self.time }
    }

    /// One-time work requiring the fully wired world: seed the initial
    /// population and run the follow action's reaction to each new agent
    /// (which, in barabasi mode, already performs follows and advances the
    /// clock).
    pub fn post_init(&self, net: &Network, rng: &SharedRng) {
        let ctx = self.ctx(net, rng);
        let seeded = self.add_agent.post_init(&ctx);
        let mut cascade = ActionOutcome::default();
        for &(id, ty) in &seeded.grown {
            cascade.merge(self.follow.on_agent_added(id, ty, &ctx));
        }
        self.apply_outcome(cascade, rng);
    }

    // ── Sampling ──────────────────────────────────────────────────────────

    /// Refresh weights and draw the next action.  `None` when the total
    /// weight is zero — the run cannot proceed.
    pub fn sample_action(&self, net: &Network, rng: &SharedRng) -> Option<ActionKind> {
        let ctx = self.ctx(net, rng);
        self.add_agent.update_weight(&ctx);
        self.follow.update_weight(&ctx);
        let weights = [self.add_agent.weight(), self.follow.weight()];
        rng.sample_weighted(&weights).map(|i| ActionKind::ALL[i])
    }

    /// Invoke one action and absorb its whole cascade.
    pub fn invoke(&self, kind: ActionKind, net: &Network, rng: &SharedRng) {
        let ctx = self.ctx(net, rng);
        let mut out = match kind {
            ActionKind::AddAgent => self.add_agent.invoke(&ctx),
            ActionKind::Follow => self.follow.invoke(&ctx),
        };
        let grown = std::mem::take(&mut out.grown);
        for (id, ty) in grown {
            out.merge(self.follow.on_agent_added(id, ty, &ctx));
        }
        self.apply_outcome(out, rng);
    }

    /// Sample + invoke.  `false` when sampling stalls on zero total weight.
    pub fn step(&self, net: &Network, rng: &SharedRng) -> bool {
        match self.sample_action(net, rng) {
            Some(kind) => {
                self.invoke(kind, net, rng);
                true
            }
            None => false,
        }
    }

    fn apply_outcome(&self, out: ActionOutcome, rng: &SharedRng) {
        self.events.fetch_add(out.happened, Ordering::Relaxed);
        for _ in 0..out.finished {
            self.step_time(rng);
        }
    }

    /// Advance the clock for one `finished` emission.
    ///
    /// KMC waiting time: exponential with rate `Σ w`, i.e. `-ln(u) / Σ w`
    /// for `u ∈ (0, 1)` — strictly positive.  With random increments off the
    /// step is the fixed expectation `1 / Σ w`.
    fn step_time(&self, rng: &SharedRng) {
        self.steps.fetch_add(1, Ordering::Relaxed);
        let total = self.add_agent.weight() + self.follow.weight();
        if total <= 0.0 {
            return;
        }
        let dt = if self.random_time_increment {
            -rng.unit_open().ln() / total
        } else {
            1.0 / total
        };
        self.time.advance(dt);
    }

    // ── Lifecycle & accessors ─────────────────────────────────────────────

    pub fn reset(&self) {
        self.time.reset();
        self.steps.store(0, Ordering::Relaxed);
        self.events.store(0, Ordering::Relaxed);
        self.add_agent.reset();
        self.follow.reset();
    }

    #[inline]
    pub fn time(&self) -> &SimTime {
        &self.time
    }

    #[inline]
    pub fn time_minutes(&self) -> f64 {
        self.time.minutes()
    }

    /// Total `finished` emissions.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    /// Total `happened` emissions (events that changed the graph).
    #[inline]
    pub fn events(&self) -> u64 {
        self.events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn add_agent(&self) -> &AddAgentAction {
        &self.add_agent
    }

    #[inline]
    pub fn follow(&self) -> &FollowAction {
        &self.follow
    }

    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "# Number of steps: {}", self.steps())?;
        writeln!(out, "# Simulation time: {} min", self.time_minutes())?;
        writeln!(out, "# Event rate: {}", self.events())?;
        self.add_agent.write_summary(out)?;
        self.follow.write_summary(out)?;
        Ok(())
    }
}
