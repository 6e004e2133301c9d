//! `kmc-actions` — the event kinds of the KMC engine.
//!
//! Two concrete actions drive the simulation:
//!
//! - [`AddAgentAction`] grows the network by one agent of a sampled type,
//!   with a monthly weight schedule;
//! - [`FollowAction`] selects a follower and a followee (through one of
//!   several models) and connects them, maintaining the
//!   preferential-attachment bins, cohort counts, and per-method counters
//!   that keep every event O(1).
//!
//! Actions hold no references to the world; each call receives an
//! [`ActionContext`] and returns an [`ActionOutcome`] recording its
//! `happened`/`finished` emissions and any agents it created.

pub mod action;
pub mod add_agent;
pub mod bins;
pub mod follow;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use action::{ActionContext, ActionKind, ActionOutcome, FollowMethod};
pub use add_agent::AddAgentAction;
pub use bins::PrefAttachment;
pub use follow::FollowAction;
