//! Property-based tests for scheduling and standings
//!
//! Schedules must give every participant a fair share of matches, and
//! standings built match by match must agree with a full rebuild.

use std::collections::HashSet;

use podium::{
    EventConfig, FixedRandomizer, MatchScores, MatchState, Tournament,
    schedule::round_robin,
    tournament::{MatchId, TeamId},
};
use proptest::prelude::*;

proptest! {
    /// Every participant plays `rounds` or `rounds + 1` matches
    #[test]
    fn test_appearances_within_one_of_rounds(n in 2usize..20, rounds in 1u32..10) {
        let participants: Vec<TeamId> = (1..=n as TeamId).collect();
        let schedule = round_robin(&participants, rounds);

        for &team in &participants {
            let appearances = schedule.appearances(team);
            prop_assert!(appearances >= rounds as usize, "team {} plays {}", team, appearances);
            prop_assert!(appearances <= rounds as usize + 1, "team {} plays {}", team, appearances);
        }
    }

    /// No participant appears twice in a round, and nobody plays themselves
    #[test]
    fn test_rounds_have_distinct_participants(n in 2usize..20, rounds in 1u32..10) {
        let participants: Vec<TeamId> = (1..=n as TeamId).collect();
        let schedule = round_robin(&participants, rounds);

        prop_assert_eq!(schedule.rounds.len(), rounds as usize);
        for round in &schedule.rounds {
            prop_assert_eq!(round.len(), n / 2);
            let mut seen = HashSet::new();
            for &(a, b) in round {
                prop_assert_ne!(a, b);
                prop_assert!(seen.insert(a));
                prop_assert!(seen.insert(b));
            }
        }
        for &(a, b) in &schedule.supplementary {
            prop_assert_ne!(a, b);
        }
    }

    /// Standings updated after each result equal a full rebuild
    #[test]
    fn test_incremental_standings_match_recompute(
        n in 4usize..8,
        rounds in 1u32..4,
        scores in prop::collection::vec((0u32..6, 0u32..6), 64),
    ) {
        let mut tournament = Tournament::new(1, "Proptest");
        for i in 0..n {
            tournament.register_team(format!("Team {i}")).unwrap();
        }
        let event_id = tournament
            .add_event(EventConfig::head_to_head("Cornhole", rounds))
            .unwrap();
        tournament.start().unwrap();

        let mut rng = FixedRandomizer::new(true);
        tournament.start_event(event_id, &mut rng).unwrap();

        let pending: Vec<MatchId> = tournament
            .event_matches(event_id)
            .filter(|m| !m.is_bracket() && m.state == MatchState::Scheduled)
            .map(|m| m.id)
            .collect();
        for (match_id, (a, b)) in pending.into_iter().zip(scores.iter().cycle()) {
            tournament.start_match(match_id).unwrap();
            let result = MatchScores::HeadToHead {
                team_1: f64::from(*a),
                team_2: f64::from(*b),
            };
            tournament.end_match(match_id, result, &mut rng).unwrap();
        }

        let incremental = tournament.event(event_id).unwrap().ordered_standings();
        let rebuilt = tournament.recompute_standings(event_id, &mut rng).unwrap();
        prop_assert_eq!(incremental, rebuilt);
    }
}
