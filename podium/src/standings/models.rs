//! Per-event standing records.

use serde::{Deserialize, Serialize};

use crate::tournament::models::{EventId, TeamId};

/// Win/loss aggregates for head-to-head events
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub win_rate: f64,
    pub score_for: f64,
    pub score_against: f64,
    /// Combined wins of every opponent faced
    pub sos_wins: u32,
    /// Combined losses of every opponent faced
    pub sos_losses: u32,
    /// Combined ties of every opponent faced
    pub sos_ties: u32,
}

impl HeadToHeadRecord {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// `(wins + ties / 2) / games`, zero before any game is played
    pub fn compute_win_rate(&self) -> f64 {
        weighted_rate(self.wins, self.losses, self.ties)
    }

    /// Score for minus score against
    pub fn margin(&self) -> f64 {
        self.score_for - self.score_against
    }

    /// Opponents' combined win rate
    pub fn sos_ratio(&self) -> f64 {
        weighted_rate(self.sos_wins, self.sos_losses, self.sos_ties)
    }

    /// Fold one decided or tied result into the record
    pub(crate) fn record(&mut self, score_for: f64, score_against: f64, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
        self.score_for += score_for;
        self.score_against += score_against;
        self.win_rate = self.compute_win_rate();
    }

    pub(crate) fn clear_sos(&mut self) {
        self.sos_wins = 0;
        self.sos_losses = 0;
        self.sos_ties = 0;
    }
}

fn weighted_rate(wins: u32, losses: u32, ties: u32) -> f64 {
    let games = wins + losses + ties;
    if games == 0 {
        0.0
    } else {
        (f64::from(wins) + 0.5 * f64::from(ties)) / f64::from(games)
    }
}

/// Result of one match from a participant's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Win,
    Loss,
    Tie,
}

/// Score aggregates for individual and team-scored events
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Completed competitions counted
    pub competitions: u32,
    pub total_score: f64,
    /// Mean per-competition score; `None` until a competition completes
    pub average_score: Option<f64>,
    /// Individual events only
    pub player_1_total: Option<f64>,
    /// Individual events only
    pub player_2_total: Option<f64>,
}

/// Event-type-specific aggregates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StandingRecord {
    HeadToHead(HeadToHeadRecord),
    Scored(ScoredRecord),
}

/// One participant's position within one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub event_id: EventId,
    pub team_id: TeamId,
    pub rank: u32,
    pub points: f64,
    /// Set once the event is finalized; frozen afterwards
    pub is_final: bool,
    pub record: StandingRecord,
}

impl Standing {
    pub(crate) fn head_to_head(event_id: EventId, team_id: TeamId) -> Self {
        Self {
            event_id,
            team_id,
            rank: 1,
            points: 0.0,
            is_final: false,
            record: StandingRecord::HeadToHead(HeadToHeadRecord::default()),
        }
    }

    pub(crate) fn scored(event_id: EventId, team_id: TeamId) -> Self {
        Self {
            event_id,
            team_id,
            rank: 1,
            points: 0.0,
            is_final: false,
            record: StandingRecord::Scored(ScoredRecord::default()),
        }
    }

    pub fn head_to_head_record(&self) -> Option<&HeadToHeadRecord> {
        match &self.record {
            StandingRecord::HeadToHead(record) => Some(record),
            StandingRecord::Scored(_) => None,
        }
    }

    pub(crate) fn head_to_head_record_mut(&mut self) -> Option<&mut HeadToHeadRecord> {
        match &mut self.record {
            StandingRecord::HeadToHead(record) => Some(record),
            StandingRecord::Scored(_) => None,
        }
    }

    pub fn scored_record(&self) -> Option<&ScoredRecord> {
        match &self.record {
            StandingRecord::Scored(record) => Some(record),
            StandingRecord::HeadToHead(_) => None,
        }
    }

    /// Win rate for head-to-head standings, zero otherwise
    pub fn win_rate(&self) -> f64 {
        self.head_to_head_record().map_or(0.0, |r| r.win_rate)
    }
}
