//! The top-level settings tree.
//!
//! Loaded from a TOML file whose sections mirror the struct hierarchy:
//!
//! ```toml
//! [analysis]
//! max_agents     = 1000
//! max_time       = 1000.0
//! follow_model   = "twitter"
//!
//! [rates.add]
//! function = "constant"
//! value    = 1.0
//!
//! [follow_ranks.weights]
//! min = 1
//! max = 100
//!
//! [[agents]]
//! name = "Standard"
//! weights.add    = 100.0
//! weights.follow = 5.0
//! ```
//!
//! Every key has a documented default; only `agents[].name` is required.
//! Unknown keys are ignored.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::agent_type::AgentTypeSettings;
use crate::error::{ConfigError, ConfigResult};

// ── Settings ──────────────────────────────────────────────────────────────────

/// The whole configuration tree.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub analysis: Analysis,
    pub rates: Rates,
    pub follow_ranks: FollowRanks,
    /// Configured agent types, one `[[agents]]` entry each.  At least one is
    /// required; [`Settings::validate`] enforces it.
    pub agents: Vec<AgentTypeSettings>,
    pub output: OutputToggles,
    /// Destination directory for dump artifacts.  Supplied by the driver,
    /// not usually present in the file.
    pub output_folder: Option<PathBuf>,
}

impl Settings {
    /// Read and validate a TOML settings file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.agents.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[agents]] entry is required".into(),
            ));
        }
        if self.analysis.max_agents == 0 {
            return Err(ConfigError::Invalid("analysis.max_agents must be positive".into()));
        }
        if !(self.analysis.max_time > 0.0) {
            return Err(ConfigError::Invalid("analysis.max_time must be positive".into()));
        }
        let ranks = &self.follow_ranks.weights;
        if ranks.min == 0 || ranks.increment == 0 || ranks.bin_spacing == 0 {
            return Err(ConfigError::Invalid(
                "follow_ranks.weights.{min,increment,bin_spacing} must be positive".into(),
            ));
        }
        if let Some(max) = ranks.max
            && max < ranks.min
        {
            return Err(ConfigError::Invalid(
                "follow_ranks.weights.max must be >= min".into(),
            ));
        }
        for w in self.analysis.model_weights.as_array() {
            if !(w >= 0.0) {
                return Err(ConfigError::Invalid(
                    "analysis.model_weights entries must be non-negative".into(),
                ));
            }
        }
        for agent in &self.agents {
            agent.validate()?;
        }
        Ok(())
    }

    /// `true` when the configured agent-addition rate is zero, i.e. the
    /// population is stationary after the initial seeding.
    pub fn zero_add_rate(&self) -> bool {
        self.rates.add.value == 0.0 && self.rates.add.function == RateFunction::Constant
    }
}

// ── Analysis ──────────────────────────────────────────────────────────────────

/// The `analysis.*` section: run bounds and follow-model selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Analysis {
    /// Hard capacity of the network; agent ids live in `[0, max_agents)`.
    pub max_agents: u32,
    /// Simulated-minute bound on the run.
    pub max_time: f64,
    /// Wall-clock bound on the run, in minutes.
    pub max_real_time: f64,
    /// Agents seeded before the first event.
    pub initial_agents: u32,
    pub follow_model: FollowModelKind,
    /// Mixture weights for the `twitter` composite model.
    pub model_weights: ModelWeights,
    /// Replace the twitter-suggest slot with pure in-degree preferential
    /// attachment, and have every new agent follow immediately.
    pub use_barabasi: bool,
    /// Immediate follow attempts per newly created agent in barabasi mode.
    pub barabasi_connections: u32,
    /// Exponent on the bin value in the preferential-attachment weights.
    pub barabasi_exponent: f64,
    pub use_followback: bool,
    /// Exponential (KMC) waiting times when true; fixed `1/Σw` steps when
    /// false.
    pub use_random_time_increment: bool,
}

impl Default for Analysis {
    fn default() -> Self {
        Analysis {
            max_agents: 1000,
            max_time: 1000.0,
            max_real_time: 1.0,
            initial_agents: 0,
            follow_model: FollowModelKind::Twitter,
            model_weights: ModelWeights::default(),
            use_barabasi: false,
            barabasi_connections: 1,
            barabasi_exponent: 1.0,
            use_followback: false,
            use_random_time_increment: true,
        }
    }
}

/// Which followee-selection model drives the follow action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FollowModelKind {
    Random,
    TwitterSuggest,
    Agent,
    PreferentialAgent,
    Hashtag,
    /// The composite: sample one of the five models per attempt from
    /// [`ModelWeights`].
    #[default]
    Twitter,
}

/// Mixture weights for the composite model, indexed like the follow-method
/// space (0 = random .. 4 = hashtag).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelWeights {
    pub random: f64,
    pub twitter_suggest: f64,
    pub agent: f64,
    pub preferential_agent: f64,
    pub hashtag: f64,
}

impl Default for ModelWeights {
    fn default() -> Self {
        ModelWeights {
            random: 1.0,
            twitter_suggest: 1.0,
            agent: 1.0,
            preferential_agent: 1.0,
            hashtag: 1.0,
        }
    }
}

impl ModelWeights {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.random,
            self.twitter_suggest,
            self.agent,
            self.preferential_agent,
            self.hashtag,
        ]
    }
}

// ── Rates ─────────────────────────────────────────────────────────────────────

/// The `rates.*` section.  Only the add rate lives at the top level; per-type
/// follow rates are configured on each `[[agents]]` entry.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Rates {
    pub add: AddRate,
}

/// Monthly schedule shape shared by the add rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateFunction {
    #[default]
    Constant,
    Linear,
}

/// The agent-addition rate: constant, or linear in the month index.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AddRate {
    pub function: RateFunction,
    pub value: f64,
    pub y_intercept: f64,
    pub slope: f64,
}

impl Default for AddRate {
    fn default() -> Self {
        AddRate {
            function: RateFunction::Constant,
            value: 1.0,
            y_intercept: 0.001,
            slope: 0.001,
        }
    }
}

impl AddRate {
    /// Precompute the per-month weight table, one entry per month in
    /// `0..=months`.
    pub fn monthly_weights(&self, months: usize) -> Vec<f64> {
        match self.function {
            RateFunction::Constant => vec![self.value; months + 1],
            RateFunction::Linear => (0..=months)
                .map(|m| self.y_intercept + m as f64 * self.slope)
                .collect(),
        }
    }
}

// ── Follow ranks ──────────────────────────────────────────────────────────────

/// The `follow_ranks.*` section: geometry of the preferential-attachment
/// bins.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FollowRanks {
    pub weights: BinWeights,
}

/// Bin geometry: bins cover the values `min, min+inc, …` up to `max`, each
/// weighted `value^exponent` (normalized over the whole range).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BinWeights {
    /// Squares `increment` `bin_spacing - 1` times before laying out bins.
    pub bin_spacing: u32,
    pub min: u32,
    /// Defaults to `max_agents + 1` when absent.
    pub max: Option<u32>,
    pub increment: u32,
    pub exponent: f64,
}

impl Default for BinWeights {
    fn default() -> Self {
        BinWeights {
            bin_spacing: 1,
            min: 1,
            max: None,
            increment: 1,
            exponent: 1.0,
        }
    }
}

impl BinWeights {
    /// The configured upper bound, or the network-derived default.
    pub fn resolved_max(&self, max_agents: u32) -> u32 {
        self.max.unwrap_or(max_agents + 1)
    }

    /// The increment after applying the spacing rule.
    pub fn resolved_increment(&self) -> u64 {
        let mut inc = self.increment as u64;
        for _ in 1..self.bin_spacing {
            inc = inc.saturating_mul(inc);
        }
        inc.max(1)
    }
}

// ── Output toggles ────────────────────────────────────────────────────────────

/// The `output.*` section: which dump artifacts to produce.  All on by
/// default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputToggles {
    pub main_statistics: bool,
    pub categories_distro: bool,
    pub degree_distribution_by_follow_model: bool,
    pub agent_stats: bool,
    pub degree_distributions: bool,
    pub visualize: bool,
}

impl Default for OutputToggles {
    fn default() -> Self {
        OutputToggles {
            main_statistics: true,
            categories_distro: true,
            degree_distribution_by_follow_model: true,
            agent_stats: true,
            degree_distributions: true,
            visualize: true,
        }
    }
}
