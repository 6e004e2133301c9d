//! Shared action plumbing: context, outcome, and the follow-method space.

use kmc_core::{AgentId, SharedRng, SimTime, TypeId};
use kmc_network::Network;

// ── ActionContext ─────────────────────────────────────────────────────────────

/// Collaborators an action reads during one invocation.
///
/// Actions hold no references to the world; the engine assembles a context
/// per call, which keeps ownership acyclic (the simulation owns network,
/// clock, and RNG; the engine owns the actions).
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    pub net: &'a Network,
    pub rng: &'a SharedRng,
    pub time: &'a SimTime,
}

// ── ActionOutcome ─────────────────────────────────────────────────────────────

/// Signal emissions accumulated over one invocation (including any cascade:
/// barabasi bursts and followbacks).
///
/// `finished` is incremented exactly once per attempt; `happened` once per
/// attempt that changed the graph.  The engine advances simulated time once
/// per `finished`.
#[derive(Debug, Default)]
pub struct ActionOutcome {
    pub happened: u64,
    pub finished: u64,
    /// Agents created during this invocation, for dispatch to observers
    /// (the follow action's bin / cohort bookkeeping).
    pub grown: Vec<(AgentId, TypeId)>,
}

impl ActionOutcome {
    /// Fold another outcome into this one.
    pub fn merge(&mut self, other: ActionOutcome) {
        self.happened += other.happened;
        self.finished += other.finished;
        self.grown.extend(other.grown);
    }
}

// ── ActionKind ────────────────────────────────────────────────────────────────

/// The closed set of event kinds the engine samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    AddAgent,
    Follow,
}

impl ActionKind {
    pub const ALL: [ActionKind; 2] = [ActionKind::AddAgent, ActionKind::Follow];
}

// ── FollowMethod ──────────────────────────────────────────────────────────────

/// The 7-wide follow-method space used for per-agent and per-model counters.
///
/// `Retweet` is reserved: no model in scope produces it, so its counters stay
/// zero, but the slot keeps output columns aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FollowMethod {
    Random = 0,
    TwitterSuggest = 1,
    Agent = 2,
    PreferentialAgent = 3,
    Hashtag = 4,
    Retweet = 5,
    Followback = 6,
}

impl FollowMethod {
    pub const COUNT: usize = 7;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Method attributed to a follow produced by model slot `model` (0..5).
    /// The barabasi variant shares slot 1 with twitter-suggest.
    pub fn of_model(model: usize) -> FollowMethod {
        match model {
            0 => FollowMethod::Random,
            1 => FollowMethod::TwitterSuggest,
            2 => FollowMethod::Agent,
            3 => FollowMethod::PreferentialAgent,
            4 => FollowMethod::Hashtag,
            _ => unreachable!("model slot out of range"),
        }
    }
}
