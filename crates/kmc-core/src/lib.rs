//! `kmc-core` — foundational types for the kmc follow-graph simulator.
//!
//! This crate is a dependency of every other `kmc-*` crate.  It intentionally
//! has no `kmc-*` dependencies and minimal external ones (only `rand` and
//! `parking_lot`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`ids`]      | `AgentId`, `TypeId`                                     |
//! | [`time`]     | `SimTime`, month arithmetic, `APPROX_MONTH`             |
//! | [`rng`]      | `SimRng` (seeded), `SharedRng` (cross-thread)           |
//! | [`sync`]     | `AtomicF64`                                             |
//! | [`contents`] | The zero-size `Contents` collaborator                   |

pub mod contents;
pub mod ids;
pub mod rng;
pub mod sync;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use contents::Contents;
pub use ids::{AgentId, TypeId};
pub use rng::{SharedRng, SimRng};
pub use sync::AtomicF64;
pub use time::{APPROX_MONTH, SimTime, month_of, months_spanning};
