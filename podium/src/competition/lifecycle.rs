//! Match transitions: start, cancel, end and the administrative override.

use chrono::Utc;

use super::models::{MatchScores, MatchState};
use crate::errors::{EngineError, EngineResult};
use crate::randomizer::Randomizer;
use crate::standings::Standing;
use crate::tournament::models::{MatchId, TeamId, Tournament};

/// How aggregates are derived after a result is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    /// Fold the new result into the affected records
    Incremental,
    /// Rebuild the affected records from every completed match
    FullRecompute,
}

impl Tournament {
    /// Start a scheduled match and lock its participants.
    pub fn start_match(&mut self, match_id: MatchId) -> EngineResult<()> {
        let m = self.match_record(match_id)?;
        if m.state != MatchState::Scheduled {
            return Err(EngineError::transition("match", match_id, "start", m.state));
        }

        let event = self.event(m.event_id)?;
        if !event.is_active() {
            return Err(EngineError::transition(
                "event",
                event.id,
                "start a match in",
                event.status,
            ));
        }
        if m.is_bracket() {
            if !event.bracket.is_some_and(|b| b.is_active) {
                return Err(EngineError::BracketInactive(event.id));
            }
            if m.team_1.is_none() || m.team_2.is_none() {
                return Err(EngineError::IncompleteSeed(match_id));
            }
        }
        if let Some(limit) = event.config.active_limit {
            let active = self.event_matches(event.id).filter(|m| m.is_active()).count();
            if active >= limit as usize {
                return Err(EngineError::EventUnavailable(event.id));
            }
        }

        let teams: Vec<TeamId> = m.participants().collect();
        for &team in &teams {
            if !self.team(team)?.is_available {
                return Err(EngineError::Unavailable(team));
            }
        }

        for &team in &teams {
            self.team_mut(team)?.is_available = false;
        }
        let m = self.match_mut(match_id)?;
        m.state = MatchState::Active;
        m.started_at = Some(Utc::now());
        Ok(())
    }

    /// Cancel a match that has not completed.
    ///
    /// An active match goes back to `Scheduled` and can be restarted; a
    /// scheduled round-robin or scored match is withdrawn. Bracket nodes can
    /// only be cancelled while active.
    pub fn cancel_match(&mut self, match_id: MatchId, randomizer: &mut dyn Randomizer) -> EngineResult<()> {
        let m = self.match_record(match_id)?;
        let (event_id, state, is_bracket) = (m.event_id, m.state, m.is_bracket());
        match state {
            MatchState::Active => {
                self.release_participants(match_id)?;
                let m = self.match_mut(match_id)?;
                m.state = MatchState::Scheduled;
                m.started_at = None;
                log::debug!("Match {match_id} cancelled, back to scheduled");
                Ok(())
            }
            MatchState::Scheduled if !is_bracket => {
                self.match_mut(match_id)?.state = MatchState::Cancelled;
                log::debug!("Match {match_id} withdrawn");
                self.check_event_progress(event_id, randomizer)
            }
            state => Err(EngineError::transition("match", match_id, "cancel", state)),
        }
    }

    /// End an active match with its scores and refresh the event.
    ///
    /// Returns the event's standings after the refresh.
    pub fn end_match(
        &mut self,
        match_id: MatchId,
        scores: MatchScores,
        randomizer: &mut dyn Randomizer,
    ) -> EngineResult<Vec<Standing>> {
        let m = self.match_record(match_id)?;
        if m.state != MatchState::Active {
            return Err(EngineError::transition("match", match_id, "end", m.state));
        }
        let event_id = m.event_id;

        self.record_result(match_id, scores)?;
        self.release_participants(match_id)?;
        self.settle(match_id, Settlement::Incremental, randomizer)?;
        Ok(self.event(event_id)?.ordered_standings())
    }

    /// Record or overwrite a result and rebuild the affected standings from
    /// scratch.
    ///
    /// Works on scheduled, active and already complete round-robin or
    /// scored matches. Bracket results cannot be overwritten once recorded.
    pub fn admin_end_match(
        &mut self,
        match_id: MatchId,
        scores: MatchScores,
        randomizer: &mut dyn Randomizer,
    ) -> EngineResult<Vec<Standing>> {
        let m = self.match_record(match_id)?;
        let event = self.event(m.event_id)?;
        let event_id = event.id;
        if event.is_complete() {
            return Err(EngineError::transition(
                "event",
                event_id,
                "override a result in",
                event.status,
            ));
        }
        if m.state == MatchState::Cancelled || (m.is_bracket() && m.is_complete()) {
            return Err(EngineError::transition("match", match_id, "override", m.state));
        }
        if m.is_bracket() {
            if !event.bracket.is_some_and(|b| b.is_active) {
                return Err(EngineError::BracketInactive(event_id));
            }
            if m.team_1.is_none() || m.team_2.is_none() {
                return Err(EngineError::IncompleteSeed(match_id));
            }
        }
        let was_active = m.is_active();

        self.record_result(match_id, scores)?;
        if was_active {
            self.release_participants(match_id)?;
        }
        log::info!("Result of match {match_id} overridden, recomputing event {event_id}");
        self.settle(match_id, Settlement::FullRecompute, randomizer)?;
        Ok(self.event(event_id)?.ordered_standings())
    }

    /// Validate scores, decide the winner and mark the match complete.
    /// Nothing is written when validation fails.
    fn record_result(&mut self, match_id: MatchId, scores: MatchScores) -> EngineResult<()> {
        let m = self.match_record(match_id)?;
        let config = &self.event(m.event_id)?.config;
        let scores = config.normalize_scores(scores)?;

        let (winner, loser) = match scores {
            MatchScores::HeadToHead { team_1, team_2 } => {
                let (Some(first), Some(second)) = (m.team_1, m.team_2) else {
                    return Err(EngineError::IncompleteSeed(match_id));
                };
                if team_1 == team_2 {
                    if m.is_bracket() {
                        return Err(EngineError::TiedScoreNotAllowed(match_id));
                    }
                    (None, None)
                } else if config.beats(team_1, team_2) {
                    (Some(first), Some(second))
                } else {
                    (Some(second), Some(first))
                }
            }
            MatchScores::Individual { .. } | MatchScores::Team { .. } => (None, None),
        };

        let existing_seq = m.completion_seq;
        let seq = match existing_seq {
            Some(seq) => seq,
            None => self.next_completion_seq(),
        };
        let m = self.match_mut(match_id)?;
        m.scores = Some(scores);
        m.winner = winner;
        m.loser = loser;
        m.state = MatchState::Complete;
        m.ended_at = Some(Utc::now());
        m.completion_seq = Some(seq);
        Ok(())
    }

    fn release_participants(&mut self, match_id: MatchId) -> EngineResult<()> {
        let teams: Vec<TeamId> = self.match_record(match_id)?.participants().collect();
        for team in teams {
            self.team_mut(team)?.is_available = true;
        }
        Ok(())
    }

    /// Credit a head-to-head result to both teams' cumulative records
    fn credit_teams(&mut self, match_id: MatchId) -> EngineResult<()> {
        let m = self.match_record(match_id)?;
        let (Some(first), Some(second)) = (m.team_1, m.team_2) else {
            return Ok(());
        };
        match (m.winner, m.loser) {
            (Some(winner), Some(loser)) => {
                self.team_mut(winner)?.wins += 1;
                self.team_mut(loser)?.losses += 1;
            }
            _ => {
                self.team_mut(first)?.ties += 1;
                self.team_mut(second)?.ties += 1;
            }
        }
        Ok(())
    }

    /// Recount every team's cumulative record from completed head-to-head
    /// matches
    pub(crate) fn recount_team_records(&mut self) -> EngineResult<()> {
        for team in self.teams.values_mut() {
            team.wins = 0;
            team.losses = 0;
            team.ties = 0;
        }
        let played: Vec<MatchId> = self
            .matches
            .values()
            .filter(|m| m.is_complete() && matches!(m.scores, Some(MatchScores::HeadToHead { .. })))
            .map(|m| m.id)
            .collect();
        for match_id in played {
            self.credit_teams(match_id)?;
        }
        Ok(())
    }

    /// Propagate a recorded result through standings, bracket and event
    fn settle(
        &mut self,
        match_id: MatchId,
        settlement: Settlement,
        randomizer: &mut dyn Randomizer,
    ) -> EngineResult<()> {
        let m = self.match_record(match_id)?;
        let event_id = m.event_id;
        let is_head_to_head = matches!(m.scores, Some(MatchScores::HeadToHead { .. }));
        let is_bracket = m.is_bracket();
        let teams: Vec<TeamId> = m.participants().collect();

        match settlement {
            Settlement::Incremental if is_head_to_head => self.credit_teams(match_id)?,
            Settlement::Incremental => {}
            Settlement::FullRecompute => self.recount_team_records()?,
        }

        if is_bracket {
            self.advance_bracket(match_id)?;
            return Ok(());
        }

        match settlement {
            Settlement::Incremental if is_head_to_head => self.apply_head_to_head_result(match_id)?,
            _ => {
                for team in teams {
                    self.recompute_record(event_id, team)?;
                }
            }
        }
        self.rank_event(event_id, randomizer)?;
        if settlement == Settlement::FullRecompute {
            self.reseed_unplayed_bracket(event_id)?;
        }
        self.check_event_progress(event_id, randomizer)
    }
}
