//! Unit tests for the KMC actions.

use kmc_config::{AgentTypeSettings, FollowModelKind, Settings};
use kmc_core::{AgentId, SharedRng, SimTime, TypeId};
use kmc_network::Network;

use crate::{ActionContext, AddAgentAction, FollowAction, FollowMethod};

// ── Helpers ───────────────────────────────────────────────────────────────────

struct World {
    net: Network,
    rng: SharedRng,
    time: SimTime,
}

impl World {
    fn new(settings: &Settings, seed: u64) -> Self {
        World {
            net: Network::new(settings),
            rng: SharedRng::new(seed),
            time: SimTime::new(),
        }
    }

    fn ctx(&self) -> ActionContext<'_> {
        ActionContext { net: &self.net, rng: &self.rng, time: &self.time }
    }

    /// Grow `n` agents of type 0 and run the follow action's grown handler,
    /// the way the engine dispatches agent creation.
    fn seed(&self, follow: &FollowAction, n: u32) {
        for _ in 0..n {
            let id = self.net.grow(TypeId(0)).unwrap();
            follow.on_agent_added(id, TypeId(0), &self.ctx());
        }
    }
}

fn base_settings(max_agents: u32, model: FollowModelKind) -> Settings {
    let mut s = Settings::default();
    s.analysis.max_agents = max_agents;
    s.analysis.follow_model = model;
    s.agents = vec![AgentTypeSettings::named("Standard")];
    s
}

#[cfg(test)]
mod bins {
    use crate::PrefAttachment;
    use kmc_core::SharedRng;

    #[test]
    fn new_members_start_in_bin_zero() {
        let bins = PrefAttachment::new(vec![1.0; 10]);
        bins.insert_new(3);
        bins.insert_new(7);
        assert_eq!(bins.find(3), Some(0));
        assert_eq!(bins.population(), 2);
        assert_eq!(bins.kmax(), 0);
    }

    #[test]
    fn promote_fast_path_moves_one_bin_up() {
        let bins = PrefAttachment::new(vec![1.0; 10]);
        bins.insert_new(5);
        bins.promote(5, 1);
        assert_eq!(bins.find(5), Some(1));
        bins.promote(5, 2);
        assert_eq!(bins.find(5), Some(2));
        assert_eq!(bins.kmax(), 2);
        assert_eq!(bins.population(), 1);
    }

    #[test]
    fn promote_downshift_finds_the_member_when_spacing_skips() {
        let bins = PrefAttachment::new(vec![1.0; 10]);
        bins.insert_new(5);
        // coarse spacing: the follower count jumped several bins at once
        bins.promote(5, 4);
        assert_eq!(bins.find(5), Some(4));
        assert_eq!(bins.kmax(), 4);
    }

    #[test]
    fn promote_clamps_to_the_last_bin() {
        let bins = PrefAttachment::new(vec![1.0; 3]);
        bins.insert_new(1);
        bins.promote(1, 99);
        assert_eq!(bins.find(1), Some(2));
    }

    #[test]
    fn kmax_is_monotone() {
        let bins = PrefAttachment::new(vec![1.0; 10]);
        bins.insert_new(1);
        bins.insert_new(2);
        bins.promote(1, 5);
        // a later promotion to a lower index must not lower kmax
        bins.promote(2, 1);
        assert_eq!(bins.kmax(), 5);
    }

    #[test]
    fn sample_from_empty_ladder_fails() {
        let bins = PrefAttachment::new(vec![1.0; 4]);
        let rng = SharedRng::new(1);
        assert_eq!(bins.sample(&rng), None);
    }

    #[test]
    fn sample_returns_only_members() {
        let bins = PrefAttachment::new(vec![1.0; 4]);
        let rng = SharedRng::new(1);
        bins.insert_new(11);
        bins.insert_new(22);
        bins.promote(22, 1);
        for _ in 0..50 {
            let got = bins.sample(&rng).unwrap();
            assert!(got == 11 || got == 22);
        }
    }

    #[test]
    fn clear_restores_the_empty_ladder() {
        let bins = PrefAttachment::new(vec![1.0; 4]);
        bins.insert_new(1);
        bins.promote(1, 2);
        bins.clear();
        assert_eq!(bins.population(), 0);
        assert_eq!(bins.kmax(), 0);
    }
}

#[cfg(test)]
mod add_agent {
    use super::*;

    #[test]
    fn post_init_seeds_the_initial_population() {
        let mut s = base_settings(100, FollowModelKind::Random);
        s.analysis.initial_agents = 10;
        let world = World::new(&s, 42);
        let action = AddAgentAction::new(&s);

        let out = action.post_init(&world.ctx());
        assert_eq!(world.net.size(), 10);
        assert_eq!(out.grown.len(), 10);
        assert_eq!(out.finished, 0, "seeding must not advance the clock");
        assert_eq!(action.rate(), 10);
    }

    #[test]
    fn invoke_grows_one_agent_and_reports_the_event() {
        let s = base_settings(10, FollowModelKind::Random);
        let world = World::new(&s, 42);
        let action = AddAgentAction::new(&s);

        let out = action.invoke(&world.ctx());
        assert_eq!(out.happened, 1);
        assert_eq!(out.finished, 1);
        assert_eq!(out.grown, vec![(AgentId(0), TypeId(0))]);
        assert_eq!(world.net.size(), 1);
    }

    #[test]
    fn invoke_at_capacity_finishes_without_happening() {
        let s = base_settings(1, FollowModelKind::Random);
        let world = World::new(&s, 42);
        let action = AddAgentAction::new(&s);
        action.invoke(&world.ctx());

        let out = action.invoke(&world.ctx());
        assert_eq!(out.happened, 0);
        assert_eq!(out.finished, 1);
        assert!(out.grown.is_empty());
        assert_eq!(world.net.size(), 1);
        assert_eq!(action.rate(), 1);
    }

    #[test]
    fn constant_weight_ignores_the_month() {
        let mut s = base_settings(10, FollowModelKind::Random);
        s.analysis.max_time = 3.0 * kmc_core::APPROX_MONTH;
        s.rates.add.value = 2.5;
        let world = World::new(&s, 42);
        let action = AddAgentAction::new(&s);

        action.update_weight(&world.ctx());
        assert_eq!(action.weight(), 2.5);
        world.time.advance(2.0 * kmc_core::APPROX_MONTH);
        action.update_weight(&world.ctx());
        assert_eq!(action.weight(), 2.5);
    }

    #[test]
    fn linear_weight_follows_the_month_and_clips() {
        let mut s = base_settings(10, FollowModelKind::Random);
        s.analysis.max_time = 2.0 * kmc_core::APPROX_MONTH;
        s.rates.add.function = kmc_config::RateFunction::Linear;
        s.rates.add.y_intercept = 1.0;
        s.rates.add.slope = 0.5;
        let world = World::new(&s, 42);
        let action = AddAgentAction::new(&s);

        action.update_weight(&world.ctx());
        assert_eq!(action.weight(), 1.0);
        world.time.advance(kmc_core::APPROX_MONTH);
        action.update_weight(&world.ctx());
        assert_eq!(action.weight(), 1.5);
        // beyond the precomputed schedule the last entry sticks
        world.time.advance(10.0 * kmc_core::APPROX_MONTH);
        action.update_weight(&world.ctx());
        assert_eq!(action.weight(), 2.0);
    }
}

#[cfg(test)]
mod follow_random {
    use super::*;

    #[test]
    fn invoke_connects_or_finishes_quietly() {
        let s = base_settings(10, FollowModelKind::Random);
        let world = World::new(&s, 7);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 10);

        let mut happened = 0;
        let mut finished = 0;
        for _ in 0..200 {
            let out = follow.invoke(&world.ctx());
            happened += out.happened;
            finished += out.finished;
        }
        assert_eq!(finished, 200, "every attempt finishes exactly once");
        assert_eq!(happened, follow.rate());
        assert_eq!(happened, world.net.total_edges());
        assert!(happened > 0, "200 random attempts on 10 agents must land some edges");
    }

    #[test]
    fn no_self_loops_ever_connect() {
        let s = base_settings(3, FollowModelKind::Random);
        let world = World::new(&s, 3);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 3);
        for _ in 0..300 {
            follow.invoke(&world.ctx());
        }
        for i in 0..3u32 {
            assert!(!world.net.follower_ids(AgentId(i)).contains(&i));
        }
    }

    #[test]
    fn empty_network_attempt_just_finishes() {
        let s = base_settings(10, FollowModelKind::Random);
        let world = World::new(&s, 7);
        let follow = FollowAction::new(&s);
        let out = follow.invoke(&world.ctx());
        assert_eq!(out.happened, 0);
        assert_eq!(out.finished, 1);
    }
}

#[cfg(test)]
mod follow_suggest {
    use super::*;

    fn suggest_settings(max_agents: u32) -> Settings {
        let mut s = base_settings(max_agents, FollowModelKind::TwitterSuggest);
        s.follow_ranks.weights.max = Some(max_agents);
        s
    }

    #[test]
    fn bins_partition_the_population() {
        let s = suggest_settings(50);
        let world = World::new(&s, 11);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 50);

        for _ in 0..500 {
            follow.invoke(&world.ctx());
        }

        let bins = follow.global_bins().unwrap();
        assert_eq!(bins.population(), 50, "every agent sits in exactly one bin");
        let sizes = follow.bin_sizes();
        let highest_populated = sizes.iter().rposition(|&s| s > 0).unwrap();
        assert!(follow.kmax() >= highest_populated);
    }

    #[test]
    fn followed_agents_migrate_to_higher_bins() {
        let s = suggest_settings(50);
        let world = World::new(&s, 13);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 50);

        for _ in 0..500 {
            follow.invoke(&world.ctx());
        }

        let bins = follow.global_bins().unwrap();
        for i in 0..50u32 {
            let id = AgentId(i);
            let in_degree = world.net.followers_size(id);
            if in_degree > 0 {
                let expected = in_degree * bins.n_bins() / world.net.max_size() as usize;
                assert_eq!(bins.find(i), Some(expected.min(bins.n_bins() - 1)));
            }
        }
    }

    #[test]
    fn referral_gate_is_open_in_the_creation_month() {
        // age 0 → referral probability 1, so attempts reduce to pure
        // preferential attachment and must succeed on a seeded network
        let s = suggest_settings(20);
        let world = World::new(&s, 17);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 20);

        let mut happened = 0;
        for _ in 0..100 {
            happened += follow.invoke(&world.ctx()).happened;
        }
        assert!(happened > 0);
    }
}

#[cfg(test)]
mod follow_models {
    use super::*;

    #[test]
    fn hashtag_model_always_fails() {
        let s = base_settings(10, FollowModelKind::Hashtag);
        let world = World::new(&s, 5);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 10);

        for _ in 0..50 {
            let out = follow.invoke(&world.ctx());
            assert_eq!(out.happened, 0);
            assert_eq!(out.finished, 1);
        }
        assert_eq!(world.net.total_edges(), 0);
        assert_eq!(follow.model_attempt_counts()[FollowMethod::Hashtag.index()], 50);
    }

    #[test]
    fn agent_model_respects_type_follow_weights() {
        let mut s = base_settings(40, FollowModelKind::Agent);
        s.agents = vec![AgentTypeSettings::named("A"), AgentTypeSettings::named("B")];
        // only type B is ever a followee
        s.agents[0].weights.follow = 0.0;
        s.agents[1].weights.follow = 1.0;
        let world = World::new(&s, 23);
        let follow = FollowAction::new(&s);
        for i in 0..40u32 {
            let ty = TypeId((i % 2) as u16);
            let id = world.net.grow(ty).unwrap();
            follow.on_agent_added(id, ty, &world.ctx());
        }

        for _ in 0..400 {
            follow.invoke(&world.ctx());
        }
        for i in 0..40u32 {
            for followee in world.net.followee_ids(AgentId(i)) {
                assert_eq!(world.net.agent_type(AgentId(followee)), TypeId(1));
            }
        }
        assert!(world.net.total_edges() > 0);
    }

    #[test]
    fn preferential_agent_model_uses_per_type_bins() {
        let mut s = base_settings(30, FollowModelKind::PreferentialAgent);
        s.agents = vec![AgentTypeSettings::named("A"), AgentTypeSettings::named("B")];
        let world = World::new(&s, 29);
        let follow = FollowAction::new(&s);
        for i in 0..30u32 {
            let ty = TypeId((i % 2) as u16);
            let id = world.net.grow(ty).unwrap();
            follow.on_agent_added(id, ty, &world.ctx());
        }

        for _ in 0..300 {
            follow.invoke(&world.ctx());
        }

        // per-type ladders partition each roster
        assert_eq!(follow.type_bin(TypeId(0)).unwrap().population(), 15);
        assert_eq!(follow.type_bin(TypeId(1)).unwrap().population(), 15);
        assert!(world.net.total_edges() > 0);
    }

    #[test]
    fn composite_skips_zero_weight_models() {
        let mut s = base_settings(20, FollowModelKind::Twitter);
        s.analysis.model_weights.random = 0.0;
        s.analysis.model_weights.twitter_suggest = 0.0;
        s.analysis.model_weights.agent = 1.0;
        s.analysis.model_weights.preferential_agent = 0.0;
        s.analysis.model_weights.hashtag = 0.0;
        let world = World::new(&s, 31);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 20);

        for _ in 0..100 {
            follow.invoke(&world.ctx());
        }
        let attempts = follow.model_attempt_counts();
        assert_eq!(attempts[FollowMethod::Random.index()], 0);
        assert_eq!(attempts[FollowMethod::TwitterSuggest.index()], 0);
        assert_eq!(attempts[FollowMethod::Agent.index()], 100);
        assert_eq!(attempts[FollowMethod::Hashtag.index()], 0);
    }
}

#[cfg(test)]
mod followback {
    use super::*;

    #[test]
    fn certain_followback_reciprocates_every_edge() {
        let mut s = base_settings(20, FollowModelKind::Random);
        s.analysis.use_followback = true;
        s.agents[0].followback_probability = 1.0;
        let world = World::new(&s, 37);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 20);

        for _ in 0..300 {
            follow.invoke(&world.ctx());
        }

        for i in 0..20u32 {
            let id = AgentId(i);
            for followee in world.net.followee_ids(id) {
                assert!(
                    world.net.have_connection(id, AgentId(followee)),
                    "edge {i}->{followee} lacks its reciprocal"
                );
            }
        }
        let followbacks = follow.model_attempt_counts()[FollowMethod::Followback.index()];
        assert!(followbacks > 0);
    }

    #[test]
    fn zero_probability_never_follows_back() {
        let mut s = base_settings(20, FollowModelKind::Random);
        s.analysis.use_followback = true;
        s.agents[0].followback_probability = 0.0;
        let world = World::new(&s, 41);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 20);

        for _ in 0..200 {
            follow.invoke(&world.ctx());
        }
        assert_eq!(follow.model_attempt_counts()[FollowMethod::Followback.index()], 0);
    }
}

#[cfg(test)]
mod barabasi {
    use super::*;

    fn barabasi_settings() -> Settings {
        let mut s = base_settings(30, FollowModelKind::TwitterSuggest);
        s.analysis.use_barabasi = true;
        s.analysis.barabasi_connections = 2;
        s
    }

    #[test]
    fn new_agents_burst_connect_immediately() {
        let s = barabasi_settings();
        let world = World::new(&s, 43);
        let follow = FollowAction::new(&s);

        let mut happened = 0;
        let mut finished = 0;
        for _ in 0..30 {
            let id = world.net.grow(TypeId(0)).unwrap();
            let out = follow.on_agent_added(id, TypeId(0), &world.ctx());
            happened += out.happened;
            finished += out.finished;
        }
        // agents 0 and 1 are exempt; later agents attempt two follows each
        assert!(happened > 0, "burst must create edges");
        assert_eq!(happened, world.net.total_edges());
        assert!(finished >= happened);
    }

    #[test]
    fn bin_index_is_pure_in_degree() {
        let s = barabasi_settings();
        let world = World::new(&s, 47);
        let follow = FollowAction::new(&s);
        for _ in 0..30 {
            let id = world.net.grow(TypeId(0)).unwrap();
            follow.on_agent_added(id, TypeId(0), &world.ctx());
        }
        let bins = follow.global_bins().unwrap();
        for i in 0..30u32 {
            let in_degree = world.net.followers_size(AgentId(i));
            let expected = in_degree.min(bins.n_bins() - 1);
            assert_eq!(bins.find(i), Some(expected));
        }
    }
}

#[cfg(test)]
mod weight_and_cohorts {
    use super::*;

    #[test]
    fn stationary_weight_is_population_times_schedule() {
        let mut s = base_settings(25, FollowModelKind::Random);
        s.rates.add.value = 0.0;
        s.agents[0].rates.follow.value = 0.5;
        let world = World::new(&s, 53);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 25);

        follow.update_weight(&world.ctx());
        assert!((follow.weight() - 25.0 * 0.5).abs() < 1e-12);
    }

    #[test]
    fn growing_weight_convolves_cohorts_with_age() {
        let mut s = base_settings(100, FollowModelKind::Random);
        s.analysis.max_time = 3.0 * kmc_core::APPROX_MONTH;
        s.agents[0].rates.follow.function = kmc_config::FollowFunction::Linear;
        s.agents[0].rates.follow.y_intercept = 1.0;
        s.agents[0].rates.follow.slope = 1.0; // age m → weight 1 + m
        let world = World::new(&s, 59);
        let follow = FollowAction::new(&s);

        // 10 agents in month 0
        world.seed(&follow, 10);
        // cross into month 1, open the slot, add 5 more
        world.time.advance(kmc_core::APPROX_MONTH + 1.0);
        follow.update_weight(&world.ctx());
        world.seed(&follow, 5);
        follow.update_weight(&world.ctx());

        assert_eq!(follow.per_month_counts(TypeId(0)), vec![10, 5]);
        // month-0 cohort is 1 month old (weight 2), month-1 cohort is new
        // (weight 1): 10·2 + 5·1
        assert!((follow.weight() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn cohort_counts_sum_to_the_roster() {
        let s = base_settings(40, FollowModelKind::Random);
        let world = World::new(&s, 61);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 12);
        world.time.advance(kmc_core::APPROX_MONTH + 1.0);
        follow.update_weight(&world.ctx());
        world.seed(&follow, 8);

        let total: u32 = follow.per_month_counts(TypeId(0)).iter().sum();
        assert_eq!(total as usize, world.net.count(TypeId(0)));
    }

    #[test]
    fn creation_times_are_recorded() {
        let s = base_settings(10, FollowModelKind::Random);
        let world = World::new(&s, 67);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 1);
        world.time.advance(123.0);
        world.seed(&follow, 1);
        assert_eq!(follow.creation_minutes(AgentId(0)), 0.0);
        assert_eq!(follow.creation_minutes(AgentId(1)), 123.0);
    }
}

#[cfg(test)]
mod reset {
    use super::*;

    #[test]
    fn reset_restores_the_empty_state() {
        let s = base_settings(20, FollowModelKind::TwitterSuggest);
        let world = World::new(&s, 71);
        let follow = FollowAction::new(&s);
        world.seed(&follow, 20);
        for _ in 0..200 {
            follow.invoke(&world.ctx());
        }
        assert!(follow.rate() > 0);

        follow.reset();
        assert_eq!(follow.rate(), 0);
        assert_eq!(follow.weight(), 0.0);
        assert_eq!(follow.n_connections(), 0);
        assert_eq!(follow.kmax(), 0);
        assert_eq!(follow.global_bins().unwrap().population(), 0);
        assert_eq!(follow.per_month_counts(TypeId(0)), vec![0]);
        assert_eq!(follow.model_attempt_counts(), [0; 7]);
    }
}
