//! Event lifecycle: match creation, completion detection and finalization.

use chrono::Utc;

use super::models::{EventKind, EventStatus};
use crate::competition::{CompetitionKind, Match, MatchState};
use crate::errors::{EngineError, EngineResult};
use crate::randomizer::Randomizer;
use crate::schedule;
use crate::standings::{QUALIFICATION_CUTOFF, Standing, place_with_cutoff};
use crate::tournament::models::{EventId, MatchId, TeamId, Tournament, TournamentStatus};
use crate::tournament::notifier::Notice;

/// Participants a head-to-head event needs to fill its bracket
pub const MIN_HEAD_TO_HEAD_PARTICIPANTS: usize = 4;

impl Tournament {
    /// Create every match and standing for an event and mark it active.
    ///
    /// Head-to-head events shuffle participants, schedule the round robin
    /// and build the bracket skeleton. Individual and team events get
    /// `competitions_per_team` matches per participant. Returns the ids of
    /// the created matches.
    pub fn start_event(
        &mut self,
        event_id: EventId,
        randomizer: &mut dyn Randomizer,
    ) -> EngineResult<Vec<MatchId>> {
        if self.status != TournamentStatus::Active {
            return Err(EngineError::transition(
                "tournament",
                self.id,
                "start an event in",
                self.status,
            ));
        }
        let event = self.event(event_id)?;
        if event.status != EventStatus::NotStarted {
            return Err(EngineError::transition("event", event_id, "start", event.status));
        }
        let kind = event.config.kind;
        let mut participants = self.team_ids();

        let mut created = Vec::new();
        let mut standings = Vec::with_capacity(participants.len());
        let mut bracket = None;
        let mut schedule_warning = None;

        match kind {
            EventKind::HeadToHead { rounds } => {
                if participants.len() < MIN_HEAD_TO_HEAD_PARTICIPANTS {
                    return Err(EngineError::InsufficientParticipants {
                        needed: MIN_HEAD_TO_HEAD_PARTICIPANTS,
                        current: participants.len(),
                    });
                }
                randomizer.shuffle(&mut participants);
                let plan = schedule::round_robin(&participants, rounds);
                if let Err(e) = plan.check_feasible() {
                    log::warn!("Event {event_id}: {e}; opponents will repeat");
                    schedule_warning = Some(e.to_string());
                }

                for (a, b) in plan.pairings() {
                    let id = self.allocate_id();
                    self.matches.insert(
                        id,
                        Match::new(id, event_id, CompetitionKind::HeadToHead, Some(a), Some(b)),
                    );
                    created.push(id);
                }
                standings.extend(participants.iter().map(|&t| Standing::head_to_head(event_id, t)));

                let skeleton = self.create_bracket(event_id);
                created.extend(skeleton.nodes());
                bracket = Some(skeleton);
            }
            EventKind::Individual {
                competitions_per_team,
            }
            | EventKind::Team {
                competitions_per_team,
            } => {
                if participants.is_empty() {
                    return Err(EngineError::InsufficientParticipants {
                        needed: 1,
                        current: 0,
                    });
                }
                for &team in &participants {
                    for _ in 0..competitions_per_team {
                        let id = self.allocate_id();
                        self.matches.insert(
                            id,
                            Match::new(id, event_id, kind.competition_kind(), Some(team), None),
                        );
                        created.push(id);
                    }
                }
                standings.extend(participants.iter().map(|&t| Standing::scored(event_id, t)));
            }
        }

        let event = self.event_mut(event_id)?;
        event.standings = standings.into_iter().map(|s| (s.team_id, s)).collect();
        event.bracket = bracket;
        event.schedule_warning = schedule_warning;
        event.status = EventStatus::Active;
        event.started_at = Some(Utc::now());
        log::info!(
            "Event {} ({}) started with {} participants and {} matches",
            event_id,
            event.config.name,
            participants.len(),
            created.len()
        );

        self.check_event_progress(event_id, randomizer)?;
        Ok(created)
    }

    /// Completion detection, run after every match completes or is
    /// withdrawn.
    pub(crate) fn check_event_progress(
        &mut self,
        event_id: EventId,
        randomizer: &mut dyn Randomizer,
    ) -> EngineResult<()> {
        let event = self.event(event_id)?;
        if !event.is_active() {
            return Ok(());
        }
        let head_to_head = event.is_head_to_head();
        let round_robin_complete = event.round_robin_complete;
        let outstanding = self
            .event_matches(event_id)
            .any(|m| !m.is_bracket() && m.is_outstanding());
        if outstanding {
            return Ok(());
        }

        if !head_to_head {
            self.finalize_event(event_id)?;
            return Ok(());
        }
        if round_robin_complete {
            return Ok(());
        }

        self.event_mut(event_id)?.round_robin_complete = true;
        self.rank_event(event_id, randomizer)?;
        let seeds = self.seed_bracket(event_id)?;
        log::info!("Event {event_id} round robin complete, bracket seeded with {seeds:?}");
        self.push_notice(Notice::BracketActivated {
            tournament_id: self.id,
            event_id,
        });
        Ok(())
    }

    /// Freeze an event's standings and roll them into the overall ranking.
    ///
    /// Head-to-head events need a final bracket: its four placements lead
    /// and everyone else keeps their round-robin rank, with ties below the
    /// cutoff sharing points. Scored events need every match settled.
    pub fn finalize_event(&mut self, event_id: EventId) -> EngineResult<Vec<Standing>> {
        let event = self.event(event_id)?;
        if !event.is_active() {
            return Err(EngineError::transition("event", event_id, "finalize", event.status));
        }

        if event.is_head_to_head() {
            if !self.is_bracket_final(event_id)? {
                return Err(EngineError::blocked(
                    "event",
                    event_id,
                    "finalize",
                    "awaiting its bracket",
                ));
            }
            let placed = self.bracket_placements(event_id)?;
            let event = self.event_mut(event_id)?;
            let mut order: Vec<Standing> = placed
                .iter()
                .filter_map(|team| event.standings.get(team).cloned())
                .collect();
            order.extend(
                event
                    .ordered_standings()
                    .into_iter()
                    .filter(|s| !placed.contains(&s.team_id)),
            );
            let placements = place_with_cutoff(order.len(), &order, QUALIFICATION_CUTOFF, |a, b| {
                a.win_rate() == b.win_rate()
            });
            for (standing, placement) in order.iter().zip(placements) {
                if let Some(entry) = event.standings.get_mut(&standing.team_id) {
                    entry.rank = placement.rank;
                    entry.points = placement.points;
                }
            }
            if let Some(bracket) = event.bracket.as_mut() {
                bracket.is_active = false;
                bracket.is_complete = true;
            }
        } else if self.event_matches(event_id).any(Match::is_outstanding) {
            return Err(EngineError::blocked(
                "event",
                event_id,
                "finalize",
                "awaiting results",
            ));
        }

        let event = self.event_mut(event_id)?;
        for standing in event.standings.values_mut() {
            standing.is_final = true;
        }
        event.status = EventStatus::Complete;
        event.ended_at = Some(Utc::now());
        let final_standings = event.ordered_standings();
        log::info!("Event {} ({}) finalized", event_id, event.config.name);

        self.roll_event_into_overall(event_id)?;
        self.push_notice(Notice::EventFinalized {
            tournament_id: self.id,
            event_id,
        });
        Ok(final_standings)
    }

    /// Share of an event's live matches that are complete, from 0 to 100.
    /// Withdrawn matches do not count.
    pub fn percent_complete(&self, event_id: EventId) -> EngineResult<f64> {
        let event = self.event(event_id)?;
        let (mut total, mut done) = (0usize, 0usize);
        for m in self.event_matches(event_id) {
            if m.state == MatchState::Cancelled {
                continue;
            }
            total += 1;
            if m.is_complete() {
                done += 1;
            }
        }
        if total == 0 {
            return Ok(if event.is_complete() { 100.0 } else { 0.0 });
        }
        Ok(done as f64 * 100.0 / total as f64)
    }

    /// Whether the event can take another active match
    pub fn is_event_available(&self, event_id: EventId) -> EngineResult<bool> {
        let event = self.event(event_id)?;
        if !event.is_active() {
            return Ok(false);
        }
        Ok(match event.config.active_limit {
            Some(limit) => self.active_matches(event_id)?.len() < limit as usize,
            None => true,
        })
    }

    /// Matches that could start right now
    fn startable(&self, m: &Match) -> bool {
        if m.state != MatchState::Scheduled {
            return false;
        }
        if m.is_bracket() {
            let bracket_open = self
                .events
                .get(&m.event_id)
                .and_then(|e| e.bracket)
                .is_some_and(|b| b.is_active);
            if !bracket_open || m.team_1.is_none() || m.team_2.is_none() {
                return false;
            }
        }
        m.participants()
            .all(|t| self.teams.get(&t).is_some_and(|team| team.is_available))
    }

    /// Startable matches in an event involving `team`
    pub fn available_matches(&self, event_id: EventId, team: TeamId) -> EngineResult<Vec<MatchId>> {
        if !self.is_event_available(event_id)? {
            return Ok(Vec::new());
        }
        Ok(self
            .event_matches(event_id)
            .filter(|m| m.involves(team) && self.startable(m))
            .map(|m| m.id)
            .collect())
    }

    /// The first startable match for `team`, in schedule order
    pub fn next_match(&self, event_id: EventId, team: TeamId) -> EngineResult<Option<MatchId>> {
        Ok(self.available_matches(event_id, team)?.into_iter().next())
    }

    pub fn active_matches(&self, event_id: EventId) -> EngineResult<Vec<MatchId>> {
        self.event(event_id)?;
        Ok(self
            .event_matches(event_id)
            .filter(|m| m.is_active())
            .map(|m| m.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::competition::MatchScores;
    use crate::event::EventConfig;
    use crate::randomizer::FixedRandomizer;

    fn tournament(teams: usize) -> Tournament {
        let mut tournament = Tournament::new(1, "Orchestrator");
        for i in 0..teams {
            tournament.register_team(format!("Team {i}")).unwrap();
        }
        tournament
    }

    #[test]
    fn test_event_requires_active_tournament() {
        let mut t = tournament(4);
        let event_id = t.add_event(EventConfig::head_to_head("Cornhole", 1)).unwrap();
        let err = t
            .start_event(event_id, &mut FixedRandomizer::new(true))
            .unwrap_err();
        assert!(err.is_invalid_transition());
    }

    #[test]
    fn test_head_to_head_needs_four_participants() {
        let mut t = tournament(3);
        let event_id = t.add_event(EventConfig::head_to_head("Cornhole", 1)).unwrap();
        t.start().unwrap();
        assert_eq!(
            t.start_event(event_id, &mut FixedRandomizer::new(true)),
            Err(EngineError::InsufficientParticipants {
                needed: 4,
                current: 3
            })
        );
        assert_eq!(t.event(event_id).unwrap().status, EventStatus::NotStarted);
    }

    #[test]
    fn test_start_creates_matches_standings_and_bracket() {
        let mut t = tournament(6);
        let event_id = t.add_event(EventConfig::head_to_head("Cornhole", 3)).unwrap();
        t.start().unwrap();
        let created = t
            .start_event(event_id, &mut FixedRandomizer::new(true))
            .unwrap();

        let event = t.event(event_id).unwrap();
        assert!(event.is_active());
        assert_eq!(event.standings.len(), 6);
        let bracket = event.bracket.unwrap();
        assert!(!bracket.is_active);
        assert_eq!(created.len(), 9 + 4);
        assert!(t.event_matches(event_id).all(|m| m.state == MatchState::Scheduled));

        assert!(t
            .start_event(event_id, &mut FixedRandomizer::new(true))
            .unwrap_err()
            .is_invalid_transition());
    }

    #[test]
    fn test_repeated_opponents_recorded_on_event() {
        let mut t = tournament(4);
        let repeating = t.add_event(EventConfig::head_to_head("Cornhole", 5)).unwrap();
        let distinct = t.add_event(EventConfig::head_to_head("Bocce", 3)).unwrap();
        t.start().unwrap();
        let created = t
            .start_event(repeating, &mut FixedRandomizer::new(true))
            .unwrap();
        t.start_event(distinct, &mut FixedRandomizer::new(true)).unwrap();

        assert_eq!(created.len(), 10 + 4);
        let warning = t.event(repeating).unwrap().schedule_warning.clone().unwrap();
        assert_eq!(
            warning,
            EngineError::SchedulingInfeasible {
                participants: 4,
                rounds: 5,
                max_rounds: 3,
            }
            .to_string()
        );
        assert_eq!(t.event(distinct).unwrap().schedule_warning, None);
    }

    #[test]
    fn test_scored_event_creates_per_team_matches() {
        let mut t = tournament(3);
        let event_id = t.add_event(EventConfig::individual("Free Throws", 2)).unwrap();
        t.start().unwrap();
        let created = t
            .start_event(event_id, &mut FixedRandomizer::new(true))
            .unwrap();
        assert_eq!(created.len(), 6);
        assert!(t.event_matches(event_id).all(|m| m.team_2.is_none()));
        assert!(t.event(event_id).unwrap().bracket.is_none());
    }

    #[test]
    fn test_progress_queries() {
        let mut t = tournament(2);
        let event_id = t.add_event(EventConfig::team("Darts", 2).with_active_limit(1)).unwrap();
        t.start().unwrap();
        t.start_event(event_id, &mut FixedRandomizer::new(true)).unwrap();
        let team = t.team_ids()[0];

        assert_eq!(t.percent_complete(event_id).unwrap(), 0.0);
        let next = t.next_match(event_id, team).unwrap().unwrap();
        assert_eq!(t.available_matches(event_id, team).unwrap().len(), 2);

        t.start_match(next).unwrap();
        assert_eq!(t.active_matches(event_id).unwrap(), vec![next]);
        assert!(!t.is_event_available(event_id).unwrap());
        assert!(t.available_matches(event_id, team).unwrap().is_empty());

        t.end_match(next, MatchScores::Team { score: 12.0 }, &mut FixedRandomizer::new(true))
            .unwrap();
        assert_eq!(t.percent_complete(event_id).unwrap(), 25.0);
        assert!(t.is_event_available(event_id).unwrap());
    }

    #[test]
    fn test_scored_event_finalizes_when_all_matches_settle() {
        let mut t = tournament(2);
        let event_id = t.add_event(EventConfig::team("Darts", 1)).unwrap();
        t.start().unwrap();
        let ids = t.start_event(event_id, &mut FixedRandomizer::new(true)).unwrap();
        let mut rng = FixedRandomizer::new(true);

        assert!(t.finalize_event(event_id).unwrap_err().is_invalid_transition());

        t.start_match(ids[0]).unwrap();
        t.end_match(ids[0], MatchScores::Team { score: 30.0 }, &mut rng).unwrap();
        t.cancel_match(ids[1], &mut rng).unwrap();

        let event = t.event(event_id).unwrap();
        assert!(event.is_complete());
        assert!(event.standings.values().all(|s| s.is_final));
        assert_eq!(t.percent_complete(event_id).unwrap(), 100.0);
        assert_eq!(
            t.drain_notices(),
            vec![Notice::EventFinalized {
                tournament_id: 1,
                event_id
            }]
        );
    }
}
