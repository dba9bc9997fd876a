//! Event configuration and records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bracket::Bracket;
use crate::competition::{CompetitionKind, MatchScores};
use crate::errors::{EngineError, EngineResult};
use crate::standings::Standing;
use crate::tournament::models::{EventId, TeamId};

/// How scores are entered for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "places", rename_all = "snake_case")]
pub enum ScoreType {
    /// 0 or 1
    Binary,
    /// Whole numbers
    Integer,
    /// Fixed number of decimal places (1 to 4)
    Decimal(u8),
    /// Unrestricted floating point
    Float,
}

impl ScoreType {
    /// Decimal places kept, `None` when unrestricted
    pub fn decimal_places(self) -> Option<u8> {
        match self {
            ScoreType::Binary | ScoreType::Integer => Some(0),
            ScoreType::Decimal(places) => Some(places.clamp(1, 4)),
            ScoreType::Float => None,
        }
    }

    /// Validate and round a raw score
    pub fn normalize(self, raw: f64) -> EngineResult<f64> {
        if !raw.is_finite() {
            return Err(EngineError::InvalidScore(format!("{raw} is not a finite number")));
        }
        match self {
            ScoreType::Binary if raw != 0.0 && raw != 1.0 => Err(EngineError::InvalidScore(
                format!("{raw} is not a binary score"),
            )),
            ScoreType::Integer if raw.fract() != 0.0 => Err(EngineError::InvalidScore(format!(
                "{raw} is not a whole number"
            ))),
            ScoreType::Decimal(_) => {
                let factor = 10f64.powi(i32::from(self.decimal_places().unwrap_or(0)));
                Ok((raw * factor).round() / factor)
            }
            _ => Ok(raw),
        }
    }
}

/// Event format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Round robin followed by a 4-seed bracket
    HeadToHead { rounds: u32 },
    /// Each team plays `competitions_per_team` two-player competitions
    Individual { competitions_per_team: u32 },
    /// Each team posts `competitions_per_team` team scores
    Team { competitions_per_team: u32 },
}

impl EventKind {
    pub fn competition_kind(self) -> CompetitionKind {
        match self {
            EventKind::HeadToHead { .. } => CompetitionKind::HeadToHead,
            EventKind::Individual { .. } => CompetitionKind::Individual,
            EventKind::Team { .. } => CompetitionKind::Team,
        }
    }

    pub fn is_head_to_head(self) -> bool {
        matches!(self, EventKind::HeadToHead { .. })
    }
}

/// Event configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    pub name: String,
    pub kind: EventKind,
    pub score_type: ScoreType,
    /// Direction of victory for every score comparison
    pub higher_score_wins: bool,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    /// Cap on concurrently active matches
    pub active_limit: Option<u32>,
}

impl EventConfig {
    /// Head-to-head event with integer scores, high score wins
    pub fn head_to_head(name: impl Into<String>, rounds: u32) -> Self {
        Self::with_kind(name, EventKind::HeadToHead { rounds })
    }

    /// Individual event with integer scores, high score wins
    pub fn individual(name: impl Into<String>, competitions_per_team: u32) -> Self {
        Self::with_kind(name, EventKind::Individual { competitions_per_team })
    }

    /// Team-scored event with integer scores, high score wins
    pub fn team(name: impl Into<String>, competitions_per_team: u32) -> Self {
        Self::with_kind(name, EventKind::Team { competitions_per_team })
    }

    fn with_kind(name: impl Into<String>, kind: EventKind) -> Self {
        Self {
            name: name.into(),
            kind,
            score_type: ScoreType::Integer,
            higher_score_wins: true,
            min_score: Some(0.0),
            max_score: None,
            active_limit: None,
        }
    }

    pub fn with_score_type(mut self, score_type: ScoreType) -> Self {
        self.score_type = score_type;
        self
    }

    /// Lower scores win (golf, timed events)
    pub fn lower_score_wins(mut self) -> Self {
        self.higher_score_wins = false;
        self
    }

    pub fn with_bounds(mut self, min_score: Option<f64>, max_score: Option<f64>) -> Self {
        self.min_score = min_score;
        self.max_score = max_score;
        self
    }

    pub fn with_active_limit(mut self, limit: u32) -> Self {
        self.active_limit = Some(limit);
        self
    }

    fn normalize_value(&self, raw: f64) -> EngineResult<f64> {
        let value = self.score_type.normalize(raw)?;
        if let Some(min) = self.min_score.filter(|&min| value < min) {
            return Err(EngineError::InvalidScore(format!("{value} is below the minimum of {min}")));
        }
        if let Some(max) = self.max_score.filter(|&max| value > max) {
            return Err(EngineError::InvalidScore(format!("{value} is above the maximum of {max}")));
        }
        Ok(value)
    }

    /// Check the score shape against the event kind and normalize every value
    pub fn normalize_scores(&self, scores: MatchScores) -> EngineResult<MatchScores> {
        if scores.kind() != self.kind.competition_kind() {
            return Err(EngineError::InvalidScore(format!(
                "{:?} scores reported for a {:?} event",
                scores.kind(),
                self.kind.competition_kind()
            )));
        }
        Ok(match scores {
            MatchScores::HeadToHead { team_1, team_2 } => MatchScores::HeadToHead {
                team_1: self.normalize_value(team_1)?,
                team_2: self.normalize_value(team_2)?,
            },
            MatchScores::Individual { player_1, player_2 } => MatchScores::Individual {
                player_1: self.normalize_value(player_1)?,
                player_2: self.normalize_value(player_2)?,
            },
            MatchScores::Team { score } => MatchScores::Team {
                score: self.normalize_value(score)?,
            },
        })
    }

    /// Whether `score` beats `other` under this event's direction
    pub fn beats(&self, score: f64, other: f64) -> bool {
        (score > other) == self.higher_score_wins
    }
}

/// Event lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    NotStarted,
    Active,
    Complete,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::NotStarted => write!(f, "not started"),
            EventStatus::Active => write!(f, "active"),
            EventStatus::Complete => write!(f, "complete"),
        }
    }
}

/// One scored activity within a tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub uuid: Uuid,
    pub config: EventConfig,
    pub status: EventStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Head-to-head events only
    pub round_robin_complete: bool,
    /// Set when the round robin asks for more rounds than distinct
    /// opponents allow, so some pairings repeat
    #[serde(default)]
    pub schedule_warning: Option<String>,
    pub standings: BTreeMap<TeamId, Standing>,
    /// Head-to-head events only
    pub bracket: Option<Bracket>,
}

impl Event {
    pub(crate) fn new(id: EventId, config: EventConfig) -> Self {
        Self {
            id,
            uuid: Uuid::new_v4(),
            config,
            status: EventStatus::NotStarted,
            started_at: None,
            ended_at: None,
            round_robin_complete: false,
            schedule_warning: None,
            standings: BTreeMap::new(),
            bracket: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == EventStatus::Active
    }

    pub fn is_complete(&self) -> bool {
        self.status == EventStatus::Complete
    }

    pub fn is_head_to_head(&self) -> bool {
        self.config.kind.is_head_to_head()
    }

    /// Standings ordered by rank, then team id
    pub fn ordered_standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self.standings.values().cloned().collect();
        standings.sort_by_key(|s| (s.rank, s.team_id));
        standings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_type_normalization() {
        assert_eq!(ScoreType::Binary.normalize(1.0), Ok(1.0));
        assert!(ScoreType::Binary.normalize(2.0).is_err());
        assert_eq!(ScoreType::Integer.normalize(12.0), Ok(12.0));
        assert!(ScoreType::Integer.normalize(12.5).is_err());
        assert_eq!(ScoreType::Decimal(2).normalize(1.23456), Ok(1.23));
        assert_eq!(ScoreType::Float.normalize(1.23456), Ok(1.23456));
        assert!(ScoreType::Float.normalize(f64::NAN).is_err());
    }

    #[test]
    fn test_decimal_places_are_clamped() {
        assert_eq!(ScoreType::Decimal(9).decimal_places(), Some(4));
        assert_eq!(ScoreType::Decimal(0).decimal_places(), Some(1));
        assert_eq!(ScoreType::Float.decimal_places(), None);
    }

    #[test]
    fn test_bounds_and_shape() {
        let config = EventConfig::head_to_head("Cornhole", 3).with_bounds(Some(0.0), Some(21.0));

        assert!(config
            .normalize_scores(MatchScores::HeadToHead {
                team_1: 21.0,
                team_2: 14.0
            })
            .is_ok());
        assert!(config
            .normalize_scores(MatchScores::HeadToHead {
                team_1: 22.0,
                team_2: 14.0
            })
            .is_err());
        assert!(config
            .normalize_scores(MatchScores::HeadToHead {
                team_1: -1.0,
                team_2: 14.0
            })
            .is_err());
        assert!(config.normalize_scores(MatchScores::Team { score: 3.0 }).is_err());
    }

    #[test]
    fn test_direction() {
        let high = EventConfig::team("Darts", 1);
        assert!(high.beats(10.0, 5.0));

        let low = EventConfig::team("Mini Golf", 1).lower_score_wins();
        assert!(low.beats(31.0, 35.0));
        assert!(!low.beats(35.0, 31.0));
    }
}
