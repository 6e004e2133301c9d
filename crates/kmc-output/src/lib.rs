//! `kmc-output` — `.dat` statistics writers and graph serializers.
//!
//! Writers take the [`Network`](kmc_network::Network) plus plain snapshot
//! views ([`FollowStats`], per-agent method-count slices), so any component
//! can produce output without a dependency cycle.  Every writer creates its
//! file from scratch; callers decide which writers run and treat individual
//! failures as non-fatal.

pub mod degree;
pub mod error;
pub mod graph;
pub mod stats;
pub mod views;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use degree::write_degree_distributions;
pub use error::{OutputError, OutputResult};
pub use graph::{read_edge_list, write_edge_list, write_gexf, write_graphml};
pub use stats::{
    write_agent_type_info, write_categories_distro, write_dd_by_follow_model, write_main_stats,
};
pub use views::{FollowStats, METHOD_LABELS};
