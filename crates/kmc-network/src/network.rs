//! The `Network` type.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use dashmap::DashSet;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxBuildHasher;

use kmc_config::Settings;
use kmc_core::{AgentId, TypeId};

/// Per-agent adjacency set.  `FxBuildHasher` keeps iteration order — and
/// therefore every seeded dump — deterministic.
pub type ConcurrentSet = DashSet<u32, FxBuildHasher>;

// ── Network ───────────────────────────────────────────────────────────────────

/// The directed multiagent graph.
///
/// All per-agent columns are preallocated to `max_agents`; only the first
/// `size()` entries are live.  Agent ids are assigned in creation order and
/// never reused; edges can be added and removed, agents cannot be removed.
pub struct Network {
    max_agents: u32,
    /// Live agent count.  Published with Release in `grow` so readers that
    /// Acquire-load it see every column write for ids below it.
    n_agents: AtomicU32,
    /// `followers[a]`: ids following agent `a` (in-edges).
    followers: Box<[ConcurrentSet]>,
    /// `followees[a]`: ids agent `a` follows (out-edges).
    followees: Box<[ConcurrentSet]>,
    agent_type: Box<[AtomicU16]>,
    /// Per-type agent ids in creation order.
    rosters: Vec<RwLock<Vec<u32>>>,
    type_names: Vec<String>,
    add_weights: Vec<f64>,
    grow_mutex: Mutex<()>,
    erase_mutex: Mutex<()>,
}

impl Network {
    /// Allocate an empty network for the configured capacity and agent types.
    pub fn new(settings: &Settings) -> Self {
        let max_agents = settings.analysis.max_agents;
        let empty_sets = |n: u32| {
            (0..n)
                .map(|_| ConcurrentSet::with_hasher(FxBuildHasher))
                .collect::<Vec<_>>()
                .into_boxed_slice()
        };
        Network {
            max_agents,
            n_agents: AtomicU32::new(0),
            followers: empty_sets(max_agents),
            followees: empty_sets(max_agents),
            agent_type: (0..max_agents)
                .map(|_| AtomicU16::new(0))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            rosters: settings.agents.iter().map(|_| RwLock::new(Vec::new())).collect(),
            type_names: settings.agents.iter().map(|a| a.name.clone()).collect(),
            add_weights: settings.agents.iter().map(|a| a.weights.add).collect(),
            grow_mutex: Mutex::new(()),
            erase_mutex: Mutex::new(()),
        }
    }

    // ── Growth ────────────────────────────────────────────────────────────

    /// Append one agent of the given type.  Returns its id, or `None` at
    /// capacity.
    pub fn grow(&self, ty: TypeId) -> Option<AgentId> {
        let _guard = self.grow_mutex.lock();
        let n = self.n_agents.load(Ordering::Relaxed);
        if n >= self.max_agents {
            return None;
        }
        self.agent_type[n as usize].store(ty.0, Ordering::Relaxed);
        self.rosters[ty.index()].write().push(n);
        self.n_agents.store(n + 1, Ordering::Release);
        Some(AgentId(n))
    }

    /// Append up to `n` agents of the given type; stops at capacity.
    /// Returns the ids actually created.
    pub fn grow_many(&self, n: u32, ty: TypeId) -> Vec<AgentId> {
        (0..n).map_while(|_| self.grow(ty)).collect()
    }

    #[inline]
    pub fn can_grow(&self) -> bool {
        self.size() < self.max_agents
    }

    // ── Edges ─────────────────────────────────────────────────────────────

    /// Add the directed edge `follower → followee`.
    ///
    /// Returns `false` if the edge already exists (or a racing call is
    /// creating it).  The dual-insert is the linearization point: only the
    /// call whose first insert succeeds completes the edge.
    ///
    /// # Panics
    /// Self-loops are a contract violation.
    pub fn connect(&self, followee: AgentId, follower: AgentId) -> bool {
        assert_ne!(followee, follower, "agent cannot be connected to itself");
        debug_assert!(followee.0 < self.size() && follower.0 < self.size());

        self.followers[followee.index()].insert(follower.0)
            && self.followees[follower.index()].insert(followee.0)
    }

    /// Remove the directed edge `follower → followee` in both mirrors.
    ///
    /// Returns whether the forward entry was actually removed.
    ///
    /// # Panics
    /// Self-loops are a contract violation.
    pub fn disconnect(&self, followee: AgentId, follower: AgentId) -> bool {
        assert_ne!(followee, follower, "agent cannot be disconnected from itself");
        debug_assert!(followee.0 < self.size() && follower.0 < self.size());

        let _guard = self.erase_mutex.lock();
        if self.followers[followee.index()].remove(&follower.0).is_some() {
            self.followees[follower.index()].remove(&followee.0);
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn have_connection(&self, followee: AgentId, follower: AgentId) -> bool {
        self.followers[followee.index()].contains(&follower.0)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Live agent count.
    #[inline]
    pub fn size(&self) -> u32 {
        self.n_agents.load(Ordering::Acquire)
    }

    #[inline]
    pub fn max_size(&self) -> u32 {
        self.max_agents
    }

    /// Number of configured agent types.
    #[inline]
    pub fn type_count(&self) -> usize {
        self.rosters.len()
    }

    #[inline]
    pub fn type_name(&self, ty: TypeId) -> &str {
        &self.type_names[ty.index()]
    }

    /// Configured `weights.add` per type, in type order.
    #[inline]
    pub fn add_weights(&self) -> &[f64] {
        &self.add_weights
    }

    #[inline]
    pub fn agent_type(&self, id: AgentId) -> TypeId {
        debug_assert!(id.0 < self.size());
        TypeId(self.agent_type[id.index()].load(Ordering::Relaxed))
    }

    /// Number of live agents of the given type.
    #[inline]
    pub fn count(&self, ty: TypeId) -> usize {
        self.rosters[ty.index()].read().len()
    }

    /// The `k`-th agent of the given type, in creation order.
    ///
    /// # Panics
    /// Out-of-range `k` is a contract violation.
    #[inline]
    pub fn agent_by_type(&self, ty: TypeId, k: usize) -> AgentId {
        AgentId(self.rosters[ty.index()].read()[k])
    }

    #[inline]
    pub fn followers_size(&self, id: AgentId) -> usize {
        self.followers[id.index()].len()
    }

    #[inline]
    pub fn followees_size(&self, id: AgentId) -> usize {
        self.followees[id.index()].len()
    }

    /// Sorted snapshot of the agents following `id`.
    pub fn follower_ids(&self, id: AgentId) -> Vec<u32> {
        let mut ids: Vec<u32> = self.followers[id.index()].iter().map(|r| *r).collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted snapshot of the agents `id` follows.
    pub fn followee_ids(&self, id: AgentId) -> Vec<u32> {
        let mut ids: Vec<u32> = self.followees[id.index()].iter().map(|r| *r).collect();
        ids.sort_unstable();
        ids
    }

    /// Total directed edge count.
    pub fn total_edges(&self) -> u64 {
        (0..self.size())
            .map(|i| self.followees[i as usize].len() as u64)
            .sum()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Clear every agent, edge, and roster.  Capacity and type definitions
    /// are retained.
    pub fn reset(&self) {
        let _guard = self.grow_mutex.lock();
        let n = self.n_agents.load(Ordering::Relaxed) as usize;
        for i in 0..n {
            self.followers[i].clear();
            self.followees[i].clear();
        }
        for roster in &self.rosters {
            roster.write().clear();
        }
        self.n_agents.store(0, Ordering::Release);
    }

    // ── Reporting ─────────────────────────────────────────────────────────

    /// Human-readable adjacency listing (the network section of `out.dat`).
    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let n = self.size();
        writeln!(out, "# Maximum Number of Agents: {}", self.max_agents)?;
        writeln!(out, "# Number of Agents: {n}")?;
        writeln!(out, "# Network:")?;
        for i in 0..n {
            let id = AgentId(i);
            writeln!(out, "{i:08}")?;
            let followers = self.follower_ids(id);
            write!(out, "{:7}<", followers.len())?;
            for f in followers {
                write!(out, " {f},")?;
            }
            writeln!(out)?;
            let followees = self.followee_ids(id);
            write!(out, "{:7}>", followees.len())?;
            for f in followees {
                write!(out, " {f},")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
