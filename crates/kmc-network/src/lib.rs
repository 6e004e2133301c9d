//! `kmc-network` — the directed social-follow graph.
//!
//! A [`Network`] is a fixed-capacity population of agents plus two mirrored
//! adjacency columns: `followers[a]` (who follows `a`) and `followees[a]`
//! (whom `a` follows).  Every mutation keeps the mirror invariant
//! `b ∈ followers[a] ⇔ a ∈ followees[b]`.
//!
//! # Concurrency
//!
//! All operations take `&self`.  Adjacency sets are concurrent
//! (`DashSet` with a deterministic hasher); `grow` serializes the short
//! list-extension under one mutex; `connect` is allowed to race — the
//! dual-insert is the linearization point and losers observe "already
//! present" and report `false`.

pub mod network;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use network::{ConcurrentSet, Network};
