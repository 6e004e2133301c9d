//! The add-agent action: grows the network by one agent of a sampled type.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use kmc_config::Settings;
use kmc_core::{AtomicF64, TypeId, months_spanning};

use crate::action::{ActionContext, ActionOutcome};

// ── AddAgentAction ────────────────────────────────────────────────────────────

/// Samples an agent type from the configured add weights and appends one
/// agent per invocation.  The sampling weight follows a precomputed monthly
/// schedule (constant, or linear in the month index).
pub struct AddAgentAction {
    /// Successful grows (monotone).
    rate: AtomicU64,
    weight: AtomicF64,
    /// `weight` per month index, precomputed for the whole run.
    monthly_weights: Vec<f64>,
    /// `weights.add` per agent type, in type order.
    add_weights: Vec<f64>,
    initial_agents: u32,
}

impl AddAgentAction {
    pub fn new(settings: &Settings) -> Self {
        let months = months_spanning(settings.analysis.max_time);
        let monthly_weights = settings.rates.add.monthly_weights(months);
        AddAgentAction {
            rate: AtomicU64::new(0),
            weight: AtomicF64::new(monthly_weights[0]),
            monthly_weights,
            add_weights: settings.agents.iter().map(|a| a.weights.add).collect(),
            initial_agents: settings.analysis.initial_agents,
        }
    }

    /// Seed the initial population.  Seeding precedes the event loop, so the
    /// outcome carries grown notifications but no `happened`/`finished`.
    pub fn post_init(&self, ctx: &ActionContext<'_>) -> ActionOutcome {
        let mut out = ActionOutcome::default();
        for _ in 0..self.initial_agents {
            let Some(t) = ctx.rng.sample_weighted(&self.add_weights) else {
                break;
            };
            let ty = TypeId(t as u16);
            match ctx.net.grow(ty) {
                Some(id) => {
                    self.rate.fetch_add(1, Ordering::Relaxed);
                    out.grown.push((id, ty));
                }
                None => break,
            }
        }
        out
    }

    pub fn reset(&self) {
        self.rate.store(0, Ordering::Relaxed);
        self.weight.store(self.monthly_weights[0], Ordering::Relaxed);
    }

    /// `weight := monthly_weights[month]`, clipped at the last precomputed
    /// entry.
    pub fn update_weight(&self, ctx: &ActionContext<'_>) {
        let m = ctx.time.month().min(self.monthly_weights.len() - 1);
        self.weight.store(self.monthly_weights[m], Ordering::Release);
    }

    /// Attempt one grow event.
    pub fn invoke(&self, ctx: &ActionContext<'_>) -> ActionOutcome {
        let mut out = ActionOutcome::default();
        if let Some(t) = ctx.rng.sample_weighted(&self.add_weights) {
            let ty = TypeId(t as u16);
            if let Some(id) = ctx.net.grow(ty) {
                self.rate.fetch_add(1, Ordering::Relaxed);
                out.happened += 1;
                out.grown.push((id, ty));
            }
        }
        out.finished += 1;
        out
    }

    #[inline]
    pub fn rate(&self) -> u64 {
        self.rate.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight.load(Ordering::Acquire)
    }

    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "# Add rate: {}", self.rate())?;
        writeln!(out, "# Add weight: {}", self.weight())?;
        Ok(())
    }
}
