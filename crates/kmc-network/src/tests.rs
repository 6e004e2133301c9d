//! Unit tests for the follow graph.

use kmc_config::{AgentTypeSettings, Settings};
use kmc_core::{AgentId, TypeId};

use crate::Network;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn settings(max_agents: u32, types: &[&str]) -> Settings {
    let mut s = Settings::default();
    s.analysis.max_agents = max_agents;
    s.agents = types.iter().map(|n| AgentTypeSettings::named(*n)).collect();
    s
}

fn network(max_agents: u32) -> Network {
    Network::new(&settings(max_agents, &["Standard"]))
}

#[cfg(test)]
mod growth {
    use super::*;

    #[test]
    fn grow_assigns_ids_in_creation_order() {
        let net = network(3);
        assert_eq!(net.grow(TypeId(0)), Some(AgentId(0)));
        assert_eq!(net.grow(TypeId(0)), Some(AgentId(1)));
        assert_eq!(net.grow(TypeId(0)), Some(AgentId(2)));
        assert_eq!(net.size(), 3);
    }

    #[test]
    fn grow_stops_at_capacity_without_side_effects() {
        let net = network(2);
        net.grow_many(2, TypeId(0));
        assert_eq!(net.grow(TypeId(0)), None);
        assert_eq!(net.size(), 2);
        assert_eq!(net.count(TypeId(0)), 2);
        assert!(!net.can_grow());
    }

    #[test]
    fn grow_many_reports_partial_success() {
        let net = network(5);
        net.grow(TypeId(0));
        let ids = net.grow_many(10, TypeId(0));
        assert_eq!(ids.len(), 4);
        assert_eq!(ids.first(), Some(&AgentId(1)));
        assert_eq!(net.size(), 5);
    }

    #[test]
    fn rosters_partition_the_population() {
        let net = Network::new(&settings(10, &["A", "B"]));
        net.grow(TypeId(0));
        net.grow(TypeId(1));
        net.grow(TypeId(0));
        assert_eq!(net.count(TypeId(0)), 2);
        assert_eq!(net.count(TypeId(1)), 1);
        assert_eq!(net.agent_by_type(TypeId(0), 0), AgentId(0));
        assert_eq!(net.agent_by_type(TypeId(0), 1), AgentId(2));
        assert_eq!(net.agent_by_type(TypeId(1), 0), AgentId(1));
        assert_eq!(net.agent_type(AgentId(1)), TypeId(1));
        assert_eq!(net.type_name(TypeId(1)), "B");
    }
}

#[cfg(test)]
mod edges {
    use super::*;

    #[test]
    fn connect_then_disconnect_restores_the_empty_graph() {
        let net = network(2);
        net.grow_many(2, TypeId(0));

        assert!(!net.have_connection(AgentId(0), AgentId(1)));
        assert!(!net.have_connection(AgentId(1), AgentId(0)));

        assert!(net.connect(AgentId(0), AgentId(1)));
        assert!(net.have_connection(AgentId(0), AgentId(1)));
        assert!(!net.have_connection(AgentId(1), AgentId(0)));

        assert!(net.connect(AgentId(1), AgentId(0)));
        assert!(net.have_connection(AgentId(1), AgentId(0)));

        assert!(net.disconnect(AgentId(0), AgentId(1)));
        assert!(!net.have_connection(AgentId(0), AgentId(1)));
        assert!(net.have_connection(AgentId(1), AgentId(0)));

        assert!(net.disconnect(AgentId(1), AgentId(0)));
        assert_eq!(net.total_edges(), 0);
    }

    #[test]
    fn duplicate_connect_returns_false() {
        let net = network(2);
        net.grow_many(2, TypeId(0));
        assert!(net.connect(AgentId(0), AgentId(1)));
        assert!(!net.connect(AgentId(0), AgentId(1)));
        assert_eq!(net.followers_size(AgentId(0)), 1);
        assert_eq!(net.followees_size(AgentId(1)), 1);
    }

    #[test]
    fn disconnect_missing_edge_returns_false() {
        let net = network(2);
        net.grow_many(2, TypeId(0));
        assert!(!net.disconnect(AgentId(0), AgentId(1)));
    }

    #[test]
    #[should_panic]
    fn self_loop_connect_is_a_contract_violation() {
        let net = network(2);
        net.grow_many(2, TypeId(0));
        net.connect(AgentId(1), AgentId(1));
    }

    #[test]
    fn adjacency_mirrors_stay_symmetric() {
        let net = network(10);
        net.grow_many(10, TypeId(0));
        // connect i -> (i + k) % 10 for a few offsets
        for k in 1..4u32 {
            for i in 0..10u32 {
                let fe = AgentId((i + k) % 10);
                net.connect(fe, AgentId(i));
            }
        }
        for i in 0..10u32 {
            let id = AgentId(i);
            for f in net.follower_ids(id) {
                assert!(net.followee_ids(AgentId(f)).contains(&i));
            }
            for f in net.followee_ids(id) {
                assert!(net.follower_ids(AgentId(f)).contains(&i));
            }
        }
        // total in-degree equals total out-degree
        let in_sum: usize = (0..10).map(|i| net.followers_size(AgentId(i))).sum();
        let out_sum: usize = (0..10).map(|i| net.followees_size(AgentId(i))).sum();
        assert_eq!(in_sum, out_sum);
        assert_eq!(net.total_edges(), 30);
    }
}

#[cfg(test)]
mod lifecycle {
    use super::*;

    #[test]
    fn reset_restores_the_initial_state() {
        let net = network(5);
        net.grow_many(5, TypeId(0));
        net.connect(AgentId(0), AgentId(1));
        net.connect(AgentId(2), AgentId(3));

        net.reset();
        assert_eq!(net.size(), 0);
        assert_eq!(net.count(TypeId(0)), 0);
        assert_eq!(net.total_edges(), 0);
        assert!(net.can_grow());

        // the network is fully usable again
        assert_eq!(net.grow(TypeId(0)), Some(AgentId(0)));
    }

    #[test]
    fn summary_lists_every_agent() {
        let net = network(3);
        net.grow_many(3, TypeId(0));
        net.connect(AgentId(0), AgentId(1));
        let mut buf = Vec::new();
        net.write_summary(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("# Number of Agents: 3"));
        assert!(text.contains("00000000"));
        assert!(text.contains("00000002"));
    }
}

#[cfg(test)]
mod concurrency {
    use super::*;

    #[test]
    fn racing_connects_create_each_edge_once() {
        let net = network(100);
        net.grow_many(100, TypeId(0));

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for i in 0..100u32 {
                        for k in 1..5u32 {
                            let fe = AgentId((i + k) % 100);
                            net.connect(fe, AgentId(i));
                        }
                    }
                });
            }
        });

        // every edge exists exactly once and the mirrors agree
        assert_eq!(net.total_edges(), 400);
        for i in 0..100u32 {
            let id = AgentId(i);
            assert_eq!(net.followees_size(id), 4);
            for f in net.followee_ids(id) {
                assert!(net.follower_ids(AgentId(f)).contains(&i));
            }
        }
    }

    #[test]
    fn concurrent_grows_respect_capacity() {
        let net = network(64);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..16 {
                        net.grow(TypeId(0));
                    }
                });
            }
        });
        assert_eq!(net.size(), 64);
        assert_eq!(net.count(TypeId(0)), 64);
        // roster ids are exactly 0..64 in creation order
        let ids: Vec<u32> = (0..64).map(|k| net.agent_by_type(TypeId(0), k).0).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
