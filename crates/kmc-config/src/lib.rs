//! `kmc-config` — the typed settings tree for the kmc simulator.
//!
//! The original key/value hierarchy (`analysis.*`, `rates.add.*`,
//! `follow_ranks.weights.*`, repeated `agents` entries, `output.*`) maps onto
//! serde-derived structs with field-level defaults, loaded from TOML.  A
//! missing optional key takes its documented default; a missing required key
//! (an agent type without `name`) or a failed cross-field validation is a
//! [`ConfigError`].

pub mod agent_type;
pub mod error;
pub mod settings;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use agent_type::{
    AgentTypeSettings, FollowFunction, FollowSchedule, HashtagFollowOptions, TypeRates,
    TypeWeights,
};
pub use error::{ConfigError, ConfigResult};
pub use settings::{
    AddRate, Analysis, BinWeights, FollowModelKind, FollowRanks, ModelWeights, OutputToggles,
    RateFunction, Rates, Settings,
};
