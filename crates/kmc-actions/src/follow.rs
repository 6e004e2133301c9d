//! The follow action: selects a follower, selects a followee through the
//! configured model mixture, and connects them.
//!
//! Owns everything the follow process needs to stay O(1) per event:
//! the preferential-attachment bins (global and per-type), the per-month
//! cohort counts behind the weight convolution, the referral-rate table, and
//! the per-agent / per-model counters.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use kmc_config::{FollowModelKind, Settings};
use kmc_core::{APPROX_MONTH, AgentId, AtomicF64, TypeId, month_of, months_spanning};
use kmc_output::FollowStats;

use crate::action::{ActionContext, ActionOutcome, FollowMethod};
use crate::bins::PrefAttachment;

// ── Model selection ───────────────────────────────────────────────────────────

/// How `select_followee` picks a model slot per attempt.
enum ModelSelect {
    /// Always the same slot (0..5).
    Fixed(usize),
    /// The `twitter` composite: weighted draw over the five slots.
    Composite,
}

// ── Per-type state ────────────────────────────────────────────────────────────

/// Everything the follow action tracks per configured agent type.
struct TypeState {
    add_weight: f64,
    /// `weights.follow` — drives the agent and preferential-agent models.
    follow_weight: f64,
    followback_probability: f64,
    /// Follow-rate schedule by cohort age in months, sized for the whole run.
    monthly_weights: Vec<f64>,
    /// Agents of this type created in each month.  One slot per open month;
    /// extended under the month mutex as the clock crosses boundaries.
    per_month: RwLock<Vec<AtomicU32>>,
    /// Successful follows performed by agents of this type.
    follows: AtomicU64,
}

impl TypeState {
    /// Schedule entry for month `m`, clamped at the last precomputed value.
    #[inline]
    fn monthly_weight(&self, m: usize) -> f64 {
        self.monthly_weights[m.min(self.monthly_weights.len() - 1)]
    }
}

/// Per-agent follow counts over the 7-wide method space.
struct MethodCounts([AtomicU32; FollowMethod::COUNT]);

impl MethodCounts {
    fn new() -> Self {
        MethodCounts(std::array::from_fn(|_| AtomicU32::new(0)))
    }

    #[inline]
    fn bump(&self, method: FollowMethod) {
        self.0[method.index()].fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> [u64; FollowMethod::COUNT] {
        std::array::from_fn(|i| self.0[i].load(Ordering::Relaxed) as u64)
    }

    fn zero(&self) {
        for c in &self.0 {
            c.store(0, Ordering::Relaxed);
        }
    }
}

// ── FollowAction ──────────────────────────────────────────────────────────────

pub struct FollowAction {
    /// Successful follows (monotone).
    rate: AtomicU64,
    weight: AtomicF64,
    n_connections: AtomicU64,
    /// Follow attempts per method, including attempts that end in failure.
    model_attempts: [AtomicU64; FollowMethod::COUNT],

    selector: ModelSelect,
    model_weights: [f64; 5],
    zero_add_rate: bool,
    use_barabasi: bool,
    barabasi_connections: u32,
    use_followback: bool,

    /// Global preferential-attachment ladder; `None` unless the selected
    /// model mixture needs it.
    bins: Option<PrefAttachment>,
    /// Per-type ladders for the preferential-agent model; empty unless
    /// needed.
    type_bins: Vec<PrefAttachment>,

    /// Referral gate per follower age in months: `1 / (1 + age)`.
    monthly_referral_rate: Vec<f64>,

    // per-agent columns, preallocated to max_agents
    creation_time: Box<[AtomicF64]>,
    followee_methods: Box<[MethodCounts]>,
    follower_methods: Box<[MethodCounts]>,

    types: Vec<TypeState>,
    month_mutex: Mutex<()>,

    /// Where monthly degree-distribution snapshots go, when enabled.
    snapshot_dir: Option<PathBuf>,
}

impl FollowAction {
    pub fn new(settings: &Settings) -> Self {
        let analysis = &settings.analysis;
        let max_agents = analysis.max_agents as usize;
        let months = months_spanning(analysis.max_time);
        let model_weights = analysis.model_weights.as_array();

        let (selector, use_bins, use_type_bins) = match analysis.follow_model {
            FollowModelKind::Random => (ModelSelect::Fixed(0), false, false),
            FollowModelKind::TwitterSuggest => (ModelSelect::Fixed(1), true, false),
            FollowModelKind::Agent => (ModelSelect::Fixed(2), false, false),
            FollowModelKind::PreferentialAgent => (ModelSelect::Fixed(3), false, true),
            FollowModelKind::Hashtag => (ModelSelect::Fixed(4), false, false),
            FollowModelKind::Twitter => {
                (ModelSelect::Composite, model_weights[1] > 0.0, model_weights[3] > 0.0)
            }
        };

        let bin_weights = Self::build_bin_weights(settings);
        let bins = use_bins.then(|| PrefAttachment::new(bin_weights.clone()));
        let type_bins = if use_type_bins {
            settings
                .agents
                .iter()
                .map(|_| PrefAttachment::new(bin_weights.clone()))
                .collect()
        } else {
            Vec::new()
        };

        let types = settings
            .agents
            .iter()
            .map(|agent| TypeState {
                add_weight: agent.weights.add,
                follow_weight: agent.weights.follow,
                followback_probability: agent.followback_probability,
                monthly_weights: agent.rates.follow.monthly_weights(months),
                per_month: RwLock::new(vec![AtomicU32::new(0)]),
                follows: AtomicU64::new(0),
            })
            .collect();

        FollowAction {
            rate: AtomicU64::new(0),
            weight: AtomicF64::new(0.0),
            n_connections: AtomicU64::new(0),
            model_attempts: std::array::from_fn(|_| AtomicU64::new(0)),
            selector,
            model_weights,
            zero_add_rate: settings.zero_add_rate(),
            use_barabasi: analysis.use_barabasi,
            barabasi_connections: analysis.barabasi_connections,
            use_followback: analysis.use_followback,
            bins,
            type_bins,
            monthly_referral_rate: (0..=months).map(|m| 1.0 / (1 + m) as f64).collect(),
            creation_time: (0..max_agents).map(|_| AtomicF64::new(0.0)).collect(),
            followee_methods: (0..max_agents).map(|_| MethodCounts::new()).collect(),
            follower_methods: (0..max_agents).map(|_| MethodCounts::new()).collect(),
            types,
            month_mutex: Mutex::new(()),
            snapshot_dir: settings
                .output
                .degree_distributions
                .then(|| settings.output_folder.clone())
                .flatten(),
        }
    }

    /// Static bin weights for the configured geometry.
    ///
    /// Barabasi mode: one bin per follower count, weight `pow(count+1, exp)`
    /// (unnormalized).  Otherwise bins cover `min, min+inc, … ≤ max` with
    /// `pow(value, exp)` normalized over the range.
    fn build_bin_weights(settings: &Settings) -> Vec<f64> {
        let analysis = &settings.analysis;
        if analysis.use_barabasi {
            let n = (analysis.max_agents as usize).max(2) - 1;
            return (0..n)
                .map(|i| ((i + 1) as f64).powf(analysis.barabasi_exponent))
                .collect();
        }

        let ranks = &settings.follow_ranks.weights;
        let min = ranks.min as u64;
        let max = ranks.resolved_max(analysis.max_agents) as u64;
        let inc = ranks.resolved_increment();
        let mut weights: Vec<f64> = (min..=max)
            .step_by(inc as usize)
            .map(|v| (v as f64).powf(ranks.exponent))
            .collect();
        if weights.is_empty() {
            weights.push(1.0);
        }
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            for w in &mut weights {
                *w /= total;
            }
        }
        weights
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Clear every counter, bin, and cohort slot back to the empty-network
    /// state.
    pub fn reset(&self) {
        self.rate.store(0, Ordering::Relaxed);
        self.weight.store(0.0, Ordering::Relaxed);
        self.n_connections.store(0, Ordering::Relaxed);
        for c in &self.model_attempts {
            c.store(0, Ordering::Relaxed);
        }
        if let Some(bins) = &self.bins {
            bins.clear();
        }
        for bins in &self.type_bins {
            bins.clear();
        }
        for t in self.creation_time.iter() {
            t.store(0.0, Ordering::Relaxed);
        }
        for counts in self.followee_methods.iter().chain(self.follower_methods.iter()) {
            counts.zero();
        }
        for ts in &self.types {
            *ts.per_month.write() = vec![AtomicU32::new(0)];
            ts.follows.store(0, Ordering::Relaxed);
        }
    }

    // ── Weight ────────────────────────────────────────────────────────────

    /// Recompute the sampling weight.
    ///
    /// Stationary population: `Σ_t count(t) · schedule_t[month]`.  Growing
    /// population: the cohort-age convolution — each cohort contributes its
    /// size times the schedule entry for its age, so the newest cohort pairs
    /// with `schedule_t[0]`.
    pub fn update_weight(&self, ctx: &ActionContext<'_>) {
        let month = ctx.time.month();
        self.extend_months(month, ctx);

        let weight = if self.zero_add_rate {
            self.types
                .iter()
                .enumerate()
                .map(|(t, ts)| {
                    ctx.net.count(TypeId(t as u16)) as f64 * ts.monthly_weight(month)
                })
                .sum()
        } else {
            let mut w = 0.0;
            for ts in &self.types {
                let per_month = ts.per_month.read();
                for (cohort, count) in per_month.iter().enumerate() {
                    let age = month.saturating_sub(cohort);
                    w += count.load(Ordering::Relaxed) as f64 * ts.monthly_weight(age);
                }
            }
            w
        };
        self.weight.store(weight, Ordering::Release);
    }

    /// Open cohort slots up to `month` — "first crosser wins": check, lock,
    /// re-check, append.  Also writes the monthly degree-distribution
    /// snapshot when configured.
    fn extend_months(&self, month: usize, ctx: &ActionContext<'_>) {
        let need = month + 1;
        if self.types[0].per_month.read().len() >= need {
            return;
        }
        let _guard = self.month_mutex.lock();
        if self.types[0].per_month.read().len() >= need {
            return;
        }
        for ts in &self.types {
            let mut per_month = ts.per_month.write();
            while per_month.len() < need {
                per_month.push(AtomicU32::new(0));
            }
        }
        tracing::debug!(month, "opened monthly cohort slot");
        if let Some(dir) = &self.snapshot_dir
            && let Err(e) = kmc_output::write_degree_distributions(dir, ctx.net, month)
        {
            tracing::warn!(month, error = %e, "monthly degree-distribution snapshot failed");
        }
    }

    // ── Event handlers ────────────────────────────────────────────────────

    /// React to a newly created agent: creation time, cohort count, bin
    /// membership, and (in barabasi mode) the immediate connection burst.
    pub fn on_agent_added(
        &self,
        id: AgentId,
        ty: TypeId,
        ctx: &ActionContext<'_>,
    ) -> ActionOutcome {
        let mut out = ActionOutcome::default();
        let now = ctx.time.minutes();
        self.creation_time[id.index()].store(now, Ordering::Release);
        {
            let per_month = self.types[ty.index()].per_month.read();
            let m = month_of(now).min(per_month.len() - 1);
            per_month[m].fetch_add(1, Ordering::Relaxed);
        }
        if let Some(bins) = &self.bins {
            bins.insert_new(id.0);
        }
        if let Some(bins) = self.type_bins.get(ty.index()) {
            bins.insert_new(id.0);
        }

        if self.use_barabasi && id.0 >= 2 {
            for _ in 0..self.barabasi_connections {
                match self.select_followee(id, ctx) {
                    Some((followee, method)) => {
                        self.handle_follow(followee, id, method, ctx, &mut out);
                    }
                    None => {
                        out.finished += 1;
                        break;
                    }
                }
            }
        }
        out
    }

    /// React to a new edge: counters, bin promotion, and followback.
    fn on_connection_added(
        &self,
        followee: AgentId,
        follower: AgentId,
        ctx: &ActionContext<'_>,
        out: &mut ActionOutcome,
    ) {
        self.rate.fetch_add(1, Ordering::Relaxed);
        self.n_connections.fetch_add(1, Ordering::Relaxed);

        if let Some(bins) = &self.bins {
            let idx = if self.use_barabasi {
                ctx.net.followers_size(followee)
            } else {
                ctx.net.followers_size(followee) * bins.n_bins() / ctx.net.max_size() as usize
            };
            bins.promote(followee.0, idx);
        }
        if !self.type_bins.is_empty() {
            let ty = ctx.net.agent_type(followee);
            let bins = &self.type_bins[ty.index()];
            let idx =
                ctx.net.followers_size(followee) * bins.n_bins() / ctx.net.max_size() as usize;
            bins.promote(followee.0, idx);
        }

        if self.use_followback {
            let p = self.types[ctx.net.agent_type(followee).index()].followback_probability;
            if p > 0.0 && ctx.rng.gen_bool(p) {
                self.model_attempts[FollowMethod::Followback.index()]
                    .fetch_add(1, Ordering::Relaxed);
                // roles swap: the followee follows back.  The cascade stops
                // because a reciprocal duplicate connect returns false.
                self.handle_follow(follower, followee, FollowMethod::Followback, ctx, out);
            }
        }
    }

    // ── Invocation ────────────────────────────────────────────────────────

    pub fn invoke(&self, ctx: &ActionContext<'_>) -> ActionOutcome {
        let mut out = ActionOutcome::default();
        let Some(follower) = self.select_follower(ctx) else {
            out.finished += 1;
            return out;
        };
        let Some((followee, method)) = self.select_followee(follower, ctx) else {
            out.finished += 1;
            return out;
        };
        self.handle_follow(followee, follower, method, ctx, &mut out);
        out
    }

    /// Connect and account one follow attempt whose candidate pair is known.
    fn handle_follow(
        &self,
        followee: AgentId,
        follower: AgentId,
        method: FollowMethod,
        ctx: &ActionContext<'_>,
        out: &mut ActionOutcome,
    ) {
        if ctx.net.connect(followee, follower) {
            let follower_type = ctx.net.agent_type(follower);
            self.types[follower_type.index()].follows.fetch_add(1, Ordering::Relaxed);
            self.followee_methods[followee.index()].bump(method);
            self.follower_methods[follower.index()].bump(method);
            out.happened += 1;
            out.finished += 1;
            self.on_connection_added(followee, follower, ctx, out);
        } else {
            out.finished += 1;
        }
    }

    // ── Follower selection ────────────────────────────────────────────────

    /// Pick which agent performs the follow.
    ///
    /// Stationary population: type draw over `count(t)·add_weight[t]`, then
    /// uniform within the type.  Growing population: a `(type, month)` grid
    /// draw, then uniform within the sampled creation cohort (a contiguous
    /// roster window, since rosters are in creation order).
    fn select_follower(&self, ctx: &ActionContext<'_>) -> Option<AgentId> {
        if self.zero_add_rate {
            let weights: Vec<f64> = self
                .types
                .iter()
                .enumerate()
                .map(|(t, ts)| ctx.net.count(TypeId(t as u16)) as f64 * ts.add_weight)
                .collect();
            let t = ctx.rng.sample_weighted(&weights)?;
            let ty = TypeId(t as u16);
            let count = ctx.net.count(ty);
            if count == 0 {
                return None;
            }
            let k = ctx.rng.gen_range(0..count);
            Some(ctx.net.agent_by_type(ty, k))
        } else {
            let mut weights = Vec::new();
            let mut grid = Vec::new();
            for (t, ts) in self.types.iter().enumerate() {
                let slots = ts.per_month.read().len();
                for m in 0..slots {
                    weights.push(ts.monthly_weight(m) * ts.add_weight);
                    grid.push((t, m));
                }
            }
            let (t, m) = grid[ctx.rng.sample_weighted(&weights)?];
            let ty = TypeId(t as u16);
            if ctx.net.count(ty) == 0 {
                return None;
            }
            let per_month = self.types[t].per_month.read();
            let cohort = per_month[m].load(Ordering::Relaxed) as usize;
            if cohort == 0 {
                return None;
            }
            let start: usize = per_month[..m]
                .iter()
                .map(|c| c.load(Ordering::Relaxed) as usize)
                .sum();
            let k = start + ctx.rng.gen_range(0..cohort);
            // cohort counts are bumped after the roster push, so the window
            // never outruns the roster
            debug_assert!(k < ctx.net.count(ty));
            Some(ctx.net.agent_by_type(ty, k))
        }
    }

    // ── Followee selection ────────────────────────────────────────────────

    /// Run the configured model; a candidate equal to the follower is a
    /// failure.
    fn select_followee(
        &self,
        follower: AgentId,
        ctx: &ActionContext<'_>,
    ) -> Option<(AgentId, FollowMethod)> {
        let slot = match self.selector {
            ModelSelect::Fixed(slot) => slot,
            ModelSelect::Composite => ctx.rng.sample_weighted(&self.model_weights)?,
        };
        let candidate = self.run_model(slot, follower, ctx)?;
        if candidate == follower {
            return None;
        }
        Some((candidate, FollowMethod::of_model(slot)))
    }

    fn run_model(
        &self,
        slot: usize,
        follower: AgentId,
        ctx: &ActionContext<'_>,
    ) -> Option<AgentId> {
        match slot {
            0 => self.random_model(ctx),
            1 if self.use_barabasi => self.barabasi_model(ctx),
            1 => self.twitter_suggest_model(follower, ctx),
            2 => self.agent_model(ctx),
            3 => self.preferential_agent_model(ctx),
            4 => self.hashtag_model(),
            _ => unreachable!("model slot out of range"),
        }
    }

    fn bump_attempts(&self, method: FollowMethod) {
        self.model_attempts[method.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Model 0: uniform over the whole population.
    fn random_model(&self, ctx: &ActionContext<'_>) -> Option<AgentId> {
        self.bump_attempts(FollowMethod::Random);
        let n = ctx.net.size();
        if n == 0 {
            return None;
        }
        Some(AgentId(ctx.rng.gen_range(0..n)))
    }

    /// Model 1: referral-gated preferential attachment.  The gate passes
    /// with probability `1 / (1 + follower_age_months)`.
    fn twitter_suggest_model(
        &self,
        follower: AgentId,
        ctx: &ActionContext<'_>,
    ) -> Option<AgentId> {
        self.bump_attempts(FollowMethod::TwitterSuggest);
        let age = (ctx.time.minutes() - self.creation_time[follower.index()].load(Ordering::Acquire))
            / APPROX_MONTH;
        let referral =
            self.monthly_referral_rate[(age as usize).min(self.monthly_referral_rate.len() - 1)];
        if !ctx.rng.gen_bool(referral) {
            return None;
        }
        self.bins.as_ref()?.sample(ctx.rng).map(AgentId)
    }

    /// Model 1 variant: pure in-degree preferential attachment, no gate.
    fn barabasi_model(&self, ctx: &ActionContext<'_>) -> Option<AgentId> {
        self.bump_attempts(FollowMethod::TwitterSuggest);
        self.bins.as_ref()?.sample(ctx.rng).map(AgentId)
    }

    /// Model 2: type-weighted uniform.
    fn agent_model(&self, ctx: &ActionContext<'_>) -> Option<AgentId> {
        self.bump_attempts(FollowMethod::Agent);
        let weights: Vec<f64> = self.types.iter().map(|ts| ts.follow_weight).collect();
        let t = ctx.rng.sample_weighted(&weights)?;
        let ty = TypeId(t as u16);
        let count = ctx.net.count(ty);
        if count == 0 {
            return None;
        }
        let k = ctx.rng.gen_range(0..count);
        Some(ctx.net.agent_by_type(ty, k))
    }

    /// Model 3: per-type preferential attachment.
    fn preferential_agent_model(&self, ctx: &ActionContext<'_>) -> Option<AgentId> {
        self.bump_attempts(FollowMethod::PreferentialAgent);
        let weights: Vec<f64> = self.types.iter().map(|ts| ts.follow_weight).collect();
        let t = ctx.rng.sample_weighted(&weights)?;
        if ctx.net.count(TypeId(t as u16)) == 0 {
            return None;
        }
        self.type_bins.get(t)?.sample(ctx.rng).map(AgentId)
    }

    /// Model 4: stub — hashtag-driven follows are not modelled.
    fn hashtag_model(&self) -> Option<AgentId> {
        self.bump_attempts(FollowMethod::Hashtag);
        None
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn rate(&self) -> u64 {
        self.rate.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight.load(Ordering::Acquire)
    }

    #[inline]
    pub fn n_connections(&self) -> u64 {
        self.n_connections.load(Ordering::Relaxed)
    }

    pub fn kmax(&self) -> usize {
        self.bins.as_ref().map_or(0, PrefAttachment::kmax)
    }

    /// Per-bin populations of the global ladder; empty when bins are not
    /// wired.
    pub fn bin_sizes(&self) -> Vec<usize> {
        self.bins.as_ref().map_or_else(Vec::new, PrefAttachment::bin_sizes)
    }

    /// Global ladder accessor for invariant checks.
    pub fn global_bins(&self) -> Option<&PrefAttachment> {
        self.bins.as_ref()
    }

    /// Per-type ladder accessor for invariant checks.
    pub fn type_bin(&self, ty: TypeId) -> Option<&PrefAttachment> {
        self.type_bins.get(ty.index())
    }

    pub fn model_attempt_counts(&self) -> [u64; FollowMethod::COUNT] {
        std::array::from_fn(|i| self.model_attempts[i].load(Ordering::Relaxed))
    }

    /// Successful follows per follower type, in type order.
    pub fn follows_by_type(&self) -> Vec<u64> {
        self.types.iter().map(|ts| ts.follows.load(Ordering::Relaxed)).collect()
    }

    /// Cohort sizes per month for one type (oldest first).
    pub fn per_month_counts(&self, ty: TypeId) -> Vec<u32> {
        self.types[ty.index()]
            .per_month
            .read()
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect()
    }

    pub fn creation_minutes(&self, id: AgentId) -> f64 {
        self.creation_time[id.index()].load(Ordering::Acquire)
    }

    /// Per-agent method counts on the followee side, for the first `n`
    /// agents.
    pub fn followee_method_counts(&self, n: usize) -> Vec<[u64; FollowMethod::COUNT]> {
        self.followee_methods[..n].iter().map(MethodCounts::snapshot).collect()
    }

    /// Per-agent method counts on the follower side, for the first `n`
    /// agents.
    pub fn follower_method_counts(&self, n: usize) -> Vec<[u64; FollowMethod::COUNT]> {
        self.follower_methods[..n].iter().map(MethodCounts::snapshot).collect()
    }

    /// Counter snapshot for the statistics writers.
    pub fn follow_stats(&self) -> FollowStats {
        FollowStats {
            total_follows: self.rate(),
            model_attempts: self.model_attempt_counts(),
            per_type_follows: self.follows_by_type(),
            bin_sizes: self.bin_sizes(),
        }
    }

    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "# Follow rate: {}", self.rate())?;
        writeln!(out, "# Follow weight: {}", self.weight())?;
        writeln!(out, "# Number of Connections: {}", self.n_connections())?;
        if let Some(bins) = &self.bins {
            writeln!(out, "# Number of Bins: {}", bins.n_bins())?;
            writeln!(out, "# kmax: {}", bins.kmax())?;
            writeln!(out, "# Bins:")?;
            writeln!(out, "#   K        N")?;
            for (i, size) in bins.bin_sizes().iter().enumerate().take(bins.kmax() + 1) {
                writeln!(out, "{i:08} [{size:8}]")?;
            }
        }
        Ok(())
    }
}
