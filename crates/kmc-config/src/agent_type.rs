//! Per-agent-type configuration (`[[agents]]` entries).

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Empirical per-minute follow rate observed for new accounts: a spike over
/// the first two months, then a long gradual tail.
const TWITTER_SPIKE_RATE: f64 = 7.44 * 8.298_429_200_320_164e-4;
const TWITTER_GRADUAL_RATE: f64 = 7.44 * 5.536_042_291_460_454_6e-5;

// ── AgentTypeSettings ─────────────────────────────────────────────────────────

/// One configured agent type.
///
/// `name` is the only required field anywhere in the settings tree.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentTypeSettings {
    pub name: String,
    #[serde(default)]
    pub weights: TypeWeights,
    /// Probability that a freshly gained follower is followed back.
    #[serde(default)]
    pub followback_probability: f64,
    #[serde(default)]
    pub rates: TypeRates,
    #[serde(default)]
    pub hashtag_follow_options: HashtagFollowOptions,
}

impl AgentTypeSettings {
    /// An agent type with the given name and all-default fields.  Handy for
    /// tests and programmatic setup.
    pub fn named(name: impl Into<String>) -> Self {
        AgentTypeSettings {
            name: name.into(),
            weights: TypeWeights::default(),
            followback_probability: 0.0,
            rates: TypeRates::default(),
            hashtag_follow_options: HashtagFollowOptions::default(),
        }
    }

    pub(crate) fn validate(&self) -> ConfigResult<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("agents.name must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.followback_probability) {
            return Err(ConfigError::Invalid(format!(
                "agents.followback_probability for '{}' must be in [0, 1]",
                self.name
            )));
        }
        if !(self.weights.add >= 0.0) || !(self.weights.follow >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "agents.weights for '{}' must be non-negative",
                self.name
            )));
        }
        Ok(())
    }
}

/// Sampling weights of an agent type: `add` drives which type a new agent
/// gets, `follow` drives the agent/preferential-agent followee models.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TypeWeights {
    pub add: f64,
    pub follow: f64,
}

impl Default for TypeWeights {
    fn default() -> Self {
        TypeWeights { add: 100.0, follow: 5.0 }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TypeRates {
    pub follow: FollowSchedule,
}

/// Shape of a per-type monthly follow-rate schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FollowFunction {
    #[default]
    Constant,
    Linear,
    /// The empirical new-account profile.
    TwitterFollow,
    /// The empirical profile at one quarter amplitude.
    QuarterTwitterFollow,
}

/// Per-type follow-rate schedule (`agents.rates.follow`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FollowSchedule {
    pub function: FollowFunction,
    pub value: f64,
    pub y_intercept: f64,
    pub slope: f64,
}

impl Default for FollowSchedule {
    fn default() -> Self {
        FollowSchedule {
            function: FollowFunction::Constant,
            value: 1.0,
            y_intercept: 0.001,
            slope: 0.001,
        }
    }
}

impl FollowSchedule {
    /// Precompute the per-month weight table, one entry per month in
    /// `0..=months`.
    ///
    /// The index is the *age* of a cohort in months, not absolute time: entry
    /// 0 applies to agents in their creation month.
    pub fn monthly_weights(&self, months: usize) -> Vec<f64> {
        match self.function {
            FollowFunction::Constant => vec![self.value; months + 1],
            FollowFunction::Linear => (0..=months)
                .map(|m| self.y_intercept + m as f64 * self.slope)
                .collect(),
            FollowFunction::TwitterFollow => Self::spike_profile(months, 1.0),
            FollowFunction::QuarterTwitterFollow => Self::spike_profile(months, 0.25),
        }
    }

    fn spike_profile(months: usize, amplitude: f64) -> Vec<f64> {
        (0..=months)
            .map(|m| {
                if m < 2 {
                    amplitude * TWITTER_SPIKE_RATE
                } else {
                    amplitude * TWITTER_GRADUAL_RATE
                }
            })
            .collect()
    }
}

/// Hashtag-model preferences.  Read and stored so configurations carry them,
/// unused while the hashtag model remains a stub.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(default)]
pub struct HashtagFollowOptions {
    pub care_about_region: bool,
    pub care_about_ideology: bool,
}
