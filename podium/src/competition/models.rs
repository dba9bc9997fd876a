//! Match records shared by every event kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tournament::models::{EventId, MatchId, TeamId};

/// Match lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    /// Created, waiting to be played
    Scheduled,
    /// In progress; participants are locked
    Active,
    /// Result recorded
    Complete,
    /// Withdrawn before it was ever played
    Cancelled,
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchState::Scheduled => write!(f, "scheduled"),
            MatchState::Active => write!(f, "active"),
            MatchState::Complete => write!(f, "complete"),
            MatchState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// What kind of contest a match is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionKind {
    /// Two teams play each other
    HeadToHead,
    /// Both players of one team post an individual score
    Individual,
    /// One team posts a single team score
    Team,
}

/// Scores reported when a match ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchScores {
    HeadToHead { team_1: f64, team_2: f64 },
    Individual { player_1: f64, player_2: f64 },
    Team { score: f64 },
}

impl MatchScores {
    pub fn kind(&self) -> CompetitionKind {
        match self {
            MatchScores::HeadToHead { .. } => CompetitionKind::HeadToHead,
            MatchScores::Individual { .. } => CompetitionKind::Individual,
            MatchScores::Team { .. } => CompetitionKind::Team,
        }
    }

    /// Raw values in reporting order, used for validation
    pub fn values(&self) -> Vec<f64> {
        match *self {
            MatchScores::HeadToHead { team_1, team_2 } => vec![team_1, team_2],
            MatchScores::Individual { player_1, player_2 } => vec![player_1, player_2],
            MatchScores::Team { score } => vec![score],
        }
    }

    /// Combined team score for scored events
    pub fn team_score(&self) -> Option<f64> {
        match *self {
            MatchScores::HeadToHead { .. } => None,
            MatchScores::Individual { player_1, player_2 } => Some(player_1 + player_2),
            MatchScores::Team { score } => Some(score),
        }
    }

    /// Per-competition average used for ranking scored events
    pub fn average_score(&self) -> Option<f64> {
        match *self {
            MatchScores::HeadToHead { .. } => None,
            MatchScores::Individual { player_1, player_2 } => Some((player_1 + player_2) / 2.0),
            MatchScores::Team { score } => Some(score),
        }
    }
}

/// Position of a node inside the 4-seed bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketRole {
    /// Seed 1 vs seed 4, the championship's left child
    UpperSemifinal,
    /// Seed 3 vs seed 2, the championship's right child
    LowerSemifinal,
    Championship,
    Consolation,
}

impl BracketRole {
    pub fn is_semifinal(self) -> bool {
        matches!(self, BracketRole::UpperSemifinal | BracketRole::LowerSemifinal)
    }
}

/// Bracket wiring carried by a bracket node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketLink {
    pub role: BracketRole,
    /// Node receiving this match's winner
    pub winner_node: Option<MatchId>,
    /// Node receiving this match's loser
    pub loser_node: Option<MatchId>,
    /// Left child (feeds `team_1`)
    pub left: Option<MatchId>,
    /// Right child (feeds `team_2`)
    pub right: Option<MatchId>,
    pub team_1_seed: Option<u32>,
    pub team_2_seed: Option<u32>,
}

/// One scheduled contest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub uuid: Uuid,
    pub event_id: EventId,
    pub kind: CompetitionKind,
    /// First side; the only side for individual and team matches
    pub team_1: Option<TeamId>,
    /// Second side; `None` for one-sided matches and unseeded bracket nodes
    pub team_2: Option<TeamId>,
    pub state: MatchState,
    pub scores: Option<MatchScores>,
    pub winner: Option<TeamId>,
    pub loser: Option<TeamId>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Order in which this match completed within the tournament
    pub completion_seq: Option<u64>,
    /// Present on bracket nodes only
    pub bracket: Option<BracketLink>,
}

impl Match {
    pub(crate) fn new(
        id: MatchId,
        event_id: EventId,
        kind: CompetitionKind,
        team_1: Option<TeamId>,
        team_2: Option<TeamId>,
    ) -> Self {
        Self {
            id,
            uuid: Uuid::new_v4(),
            event_id,
            kind,
            team_1,
            team_2,
            state: MatchState::Scheduled,
            scores: None,
            winner: None,
            loser: None,
            started_at: None,
            ended_at: None,
            completion_seq: None,
            bracket: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == MatchState::Complete
    }

    pub fn is_active(&self) -> bool {
        self.state == MatchState::Active
    }

    pub fn is_bracket(&self) -> bool {
        self.bracket.is_some()
    }

    /// Whether this match still blocks its phase from completing
    pub fn is_outstanding(&self) -> bool {
        matches!(self.state, MatchState::Scheduled | MatchState::Active)
    }

    /// Participants locked while this match is live
    pub fn participants(&self) -> impl Iterator<Item = TeamId> {
        self.team_1.into_iter().chain(self.team_2)
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.team_1 == Some(team) || self.team_2 == Some(team)
    }

    /// Opponent of `team` in a head-to-head match
    pub fn opponent_of(&self, team: TeamId) -> Option<TeamId> {
        if self.team_1 == Some(team) {
            self.team_2
        } else if self.team_2 == Some(team) {
            self.team_1
        } else {
            None
        }
    }

    /// `(score_for, score_against)` from `team`'s point of view
    pub fn scores_for(&self, team: TeamId) -> Option<(f64, f64)> {
        match self.scores? {
            MatchScores::HeadToHead { team_1, team_2 } if self.team_1 == Some(team) => {
                Some((team_1, team_2))
            }
            MatchScores::HeadToHead { team_1, team_2 } if self.team_2 == Some(team) => {
                Some((team_2, team_1))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn played(team_1: f64, team_2: f64) -> Match {
        let mut m = Match::new(1, 1, CompetitionKind::HeadToHead, Some(10), Some(20));
        m.scores = Some(MatchScores::HeadToHead { team_1, team_2 });
        m.state = MatchState::Complete;
        m
    }

    #[test]
    fn test_perspective_scores() {
        let m = played(21.0, 15.0);
        assert_eq!(m.scores_for(10), Some((21.0, 15.0)));
        assert_eq!(m.scores_for(20), Some((15.0, 21.0)));
        assert_eq!(m.scores_for(30), None);
        assert_eq!(m.opponent_of(20), Some(10));
    }

    #[test]
    fn test_individual_scores_combine() {
        let scores = MatchScores::Individual {
            player_1: 8.0,
            player_2: 5.0,
        };
        assert_eq!(scores.team_score(), Some(13.0));
        assert_eq!(scores.average_score(), Some(6.5));
        assert_eq!(scores.kind(), CompetitionKind::Individual);
    }

    #[test]
    fn test_outstanding_states() {
        let mut m = Match::new(1, 1, CompetitionKind::Team, Some(1), None);
        assert!(m.is_outstanding());
        m.state = MatchState::Cancelled;
        assert!(!m.is_outstanding());
        assert_eq!(m.participants().collect::<Vec<_>>(), vec![1]);
    }
}
