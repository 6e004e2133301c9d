//! Plain snapshot views handed to the writers.
//!
//! The writers only depend on the network and these value types, so any
//! component can produce statistics without a dependency cycle.

/// Counter snapshot of the follow action, taken after a run.
#[derive(Debug, Clone, Default)]
pub struct FollowStats {
    /// Successful follows (monotone event rate).
    pub total_follows: u64,
    /// Follow attempts per method, indexed by the 7-wide method space
    /// (random, twitter-suggest/barabasi, agent, preferential-agent, hashtag,
    /// retweet, followback).
    pub model_attempts: [u64; 7],
    /// Successful follows per follower agent type, in type order.
    pub per_type_follows: Vec<u64>,
    /// Population of each preferential-attachment bin, when bins are wired.
    pub bin_sizes: Vec<usize>,
}

/// Display labels for the seven follow methods, in index order.
pub const METHOD_LABELS: [&str; 7] = [
    "Random",
    "Twitter_Suggest",
    "Agent",
    "Preferential_Agent",
    "Hashtag",
    "Retweet",
    "Followback",
];
