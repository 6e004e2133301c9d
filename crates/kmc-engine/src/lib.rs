//! `kmc-engine` — KMC event dispatch and the simulation drivers.
//!
//! # Event loop
//!
//! ```text
//! while time < max_time && wall < max_real_time:
//!   ① update_weight on every action     (reads network + clock)
//!   ② weighted-sample one action        (w_k / Σ w)
//!   ③ invoke it                         (mutates the network)
//!   ④ dispatch grown agents to the follow action's bookkeeping
//!   ⑤ advance time once per finished    (exponential, rate Σ w)
//! ```
//!
//! The multi-threaded driver runs the same loop on N workers sharing a
//! one-deep action pipeline; see [`Simulation::run_parallel`].

pub mod engine;
pub mod error;
pub mod sim;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use engine::Engine;
pub use error::{SimError, SimResult};
pub use sim::{RunReport, Simulation};
