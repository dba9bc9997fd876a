//! Tournament arena: participants, events, matches and overall standings
//! referenced by stable ids.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::notifier::Notice;
use crate::competition::Match;
use crate::errors::{EngineError, EngineResult};
use crate::event::{Event, EventConfig};

/// Tournament ID type
pub type TournamentId = i64;
/// Participant ID type
pub type TeamId = i64;
/// Event ID type
pub type EventId = i64;
/// Match ID type
pub type MatchId = i64;

/// Tournament lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    /// Accepting teams and events
    Registering,
    /// Events in progress
    Active,
    /// Closed
    Complete,
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentStatus::Registering => write!(f, "registering"),
            TournamentStatus::Active => write!(f, "active"),
            TournamentStatus::Complete => write!(f, "complete"),
        }
    }
}

/// Participant registered with a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    /// Cleared while the team is locked by a live match
    pub is_available: bool,
    /// Head-to-head wins across every event
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

/// Cumulative cross-event ranking entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStanding {
    pub team_id: TeamId,
    pub rank: u32,
    pub total_points: f64,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    /// Events finished in first place
    pub event_wins: u32,
    /// Events finished in the top three
    pub event_podiums: u32,
}

impl OverallStanding {
    pub(crate) fn new(team_id: TeamId) -> Self {
        Self {
            team_id,
            rank: 1,
            total_points: 0.0,
            wins: 0,
            losses: 0,
            ties: 0,
            event_wins: 0,
            event_podiums: 0,
        }
    }
}

/// A tournament and every record it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub uuid: Uuid,
    pub name: String,
    pub status: TournamentStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub teams: BTreeMap<TeamId, Team>,
    pub events: BTreeMap<EventId, Event>,
    pub matches: BTreeMap<MatchId, Match>,
    pub overall: BTreeMap<TeamId, OverallStanding>,
    pub(crate) next_record_id: i64,
    pub(crate) completion_counter: u64,
    #[serde(skip)]
    pub(crate) notices: Vec<Notice>,
}

impl Tournament {
    pub fn new(id: TournamentId, name: impl Into<String>) -> Self {
        Self {
            id,
            uuid: Uuid::new_v4(),
            name: name.into(),
            status: TournamentStatus::Registering,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            teams: BTreeMap::new(),
            events: BTreeMap::new(),
            matches: BTreeMap::new(),
            overall: BTreeMap::new(),
            next_record_id: 1,
            completion_counter: 0,
            notices: Vec::new(),
        }
    }

    pub(crate) fn allocate_id(&mut self) -> i64 {
        let id = self.next_record_id;
        self.next_record_id += 1;
        id
    }

    pub(crate) fn next_completion_seq(&mut self) -> u64 {
        self.completion_counter += 1;
        self.completion_counter
    }

    /// Register a participant; only while registration is open
    pub fn register_team(&mut self, name: impl Into<String>) -> EngineResult<TeamId> {
        if self.status != TournamentStatus::Registering {
            return Err(EngineError::transition(
                "tournament",
                self.id,
                "register a team in",
                self.status,
            ));
        }
        let id = self.allocate_id();
        self.teams.insert(
            id,
            Team {
                id,
                name: name.into(),
                is_available: true,
                wins: 0,
                losses: 0,
                ties: 0,
            },
        );
        Ok(id)
    }

    /// Add an event; it starts later through `start_event`
    pub fn add_event(&mut self, config: EventConfig) -> EngineResult<EventId> {
        if self.status == TournamentStatus::Complete {
            return Err(EngineError::transition(
                "tournament",
                self.id,
                "add an event to",
                self.status,
            ));
        }
        let id = self.allocate_id();
        self.events.insert(id, Event::new(id, config));
        Ok(id)
    }

    /// Participants in registration order
    pub fn team_ids(&self) -> Vec<TeamId> {
        self.teams.keys().copied().collect()
    }

    pub fn team(&self, id: TeamId) -> EngineResult<&Team> {
        self.teams.get(&id).ok_or(EngineError::not_found("team", id))
    }

    pub(crate) fn team_mut(&mut self, id: TeamId) -> EngineResult<&mut Team> {
        self.teams.get_mut(&id).ok_or(EngineError::not_found("team", id))
    }

    pub fn event(&self, id: EventId) -> EngineResult<&Event> {
        self.events.get(&id).ok_or(EngineError::not_found("event", id))
    }

    pub(crate) fn event_mut(&mut self, id: EventId) -> EngineResult<&mut Event> {
        self.events.get_mut(&id).ok_or(EngineError::not_found("event", id))
    }

    pub fn match_record(&self, id: MatchId) -> EngineResult<&Match> {
        self.matches.get(&id).ok_or(EngineError::not_found("match", id))
    }

    pub(crate) fn match_mut(&mut self, id: MatchId) -> EngineResult<&mut Match> {
        self.matches.get_mut(&id).ok_or(EngineError::not_found("match", id))
    }

    /// Every match belonging to an event, in creation order
    pub fn event_matches(&self, event_id: EventId) -> impl Iterator<Item = &Match> {
        self.matches.values().filter(move |m| m.event_id == event_id)
    }

    /// Overall standings ordered by rank, then team id
    pub fn overall_rankings(&self) -> Vec<OverallStanding> {
        let mut rankings: Vec<OverallStanding> = self.overall.values().cloned().collect();
        rankings.sort_by_key(|r| (r.rank, r.team_id));
        rankings
    }

    pub(crate) fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Take queued notifications; the manager publishes them after commit
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_teams_in_order() {
        let mut tournament = Tournament::new(1, "Summer Games");
        let a = tournament.register_team("Aces").unwrap();
        let b = tournament.register_team("Bombers").unwrap();

        assert_eq!(tournament.team_ids(), vec![a, b]);
        assert!(tournament.team(a).unwrap().is_available);
        assert_eq!(
            tournament.team(99),
            Err(EngineError::NotFound {
                entity: "team",
                id: 99
            })
        );
    }

    #[test]
    fn test_registration_closes_once_started() {
        let mut tournament = Tournament::new(1, "Summer Games");
        tournament.status = TournamentStatus::Active;
        assert!(tournament.register_team("Late").unwrap_err().is_invalid_transition());
    }

    #[test]
    fn test_ids_are_unique_across_record_types() {
        let mut tournament = Tournament::new(1, "Summer Games");
        let team = tournament.register_team("Aces").unwrap();
        let event = tournament.add_event(EventConfig::team("Darts", 1)).unwrap();
        assert_ne!(team, event);
    }

    #[test]
    fn test_notices_are_skipped_by_serde() {
        let mut tournament = Tournament::new(3, "Winter Games");
        tournament.push_notice(Notice::TournamentFinalized { tournament_id: 3 });

        let json = serde_json::to_string(&tournament).unwrap();
        let restored: Tournament = serde_json::from_str(&json).unwrap();
        assert!(restored.notices.is_empty());
        assert_eq!(tournament.drain_notices().len(), 1);
    }
}
