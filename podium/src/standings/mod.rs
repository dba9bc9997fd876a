//! Per-event standings: aggregates, ranking and point allocation.
//!
//! Aggregates are always a pure function of an event's completed
//! round-robin or scored matches. The incremental path folds one new result
//! into two records; the repair path rebuilds a record from every completed
//! match. Both fold matches in completion order so their values agree
//! exactly.

pub mod models;
pub mod points;
pub mod tie_breaker;

pub use models::{HeadToHeadRecord, ScoredRecord, Standing, StandingRecord};
pub use points::{PODIUM_BONUS, Placement, place_groups, place_with_cutoff, points_for_position};
pub use tie_breaker::{CASCADE, Contender, HeadToHeadLedger, TieBreak};

use std::collections::HashMap;

use models::Outcome;

use crate::competition::{Match, MatchScores};
use crate::errors::{EngineError, EngineResult};
use crate::randomizer::Randomizer;
use crate::tournament::models::{EventId, MatchId, TeamId, Tournament};

/// Positions ranked individually before ties start sharing points
pub const QUALIFICATION_CUTOFF: usize = 4;

fn outcome_for(m: &Match, team: TeamId) -> Outcome {
    if m.winner == Some(team) {
        Outcome::Win
    } else if m.loser == Some(team) {
        Outcome::Loss
    } else {
        Outcome::Tie
    }
}

impl Tournament {
    /// Completed matches that feed standings aggregates, in completion order.
    /// Bracket matches never count.
    fn standing_matches(&self, event_id: EventId) -> Vec<&Match> {
        let mut matches: Vec<&Match> = self
            .event_matches(event_id)
            .filter(|m| m.is_complete() && !m.is_bracket())
            .collect();
        matches.sort_by_key(|m| m.completion_seq);
        matches
    }

    fn standing_mut(&mut self, event_id: EventId, team: TeamId) -> EngineResult<&mut Standing> {
        self.event_mut(event_id)?
            .standings
            .get_mut(&team)
            .ok_or(EngineError::not_found("standing", team))
    }

    /// Fold one newly completed round-robin match into both records
    pub(crate) fn apply_head_to_head_result(&mut self, match_id: MatchId) -> EngineResult<()> {
        let m = self.match_record(match_id)?.clone();
        for team in m.participants() {
            let (score_for, score_against) = m
                .scores_for(team)
                .ok_or_else(|| EngineError::InvalidScore(format!("match {match_id} has no scores")))?;
            let outcome = outcome_for(&m, team);
            self.standing_mut(m.event_id, team)?
                .head_to_head_record_mut()
                .ok_or(EngineError::not_found("head-to-head standing", team))?
                .record(score_for, score_against, outcome);
        }
        Ok(())
    }

    /// Rebuild one participant's aggregates from every completed match.
    ///
    /// Strength of schedule is left for `update_strength_of_schedule`.
    pub(crate) fn recompute_record(&mut self, event_id: EventId, team: TeamId) -> EngineResult<()> {
        if !self.event(event_id)?.is_head_to_head() {
            return self.refresh_scored_record(event_id, team);
        }

        let mut record = HeadToHeadRecord::default();
        for m in self.standing_matches(event_id) {
            if let Some((score_for, score_against)) = m.scores_for(team) {
                record.record(score_for, score_against, outcome_for(m, team));
            }
        }

        let current = self
            .standing_mut(event_id, team)?
            .head_to_head_record_mut()
            .ok_or(EngineError::not_found("head-to-head standing", team))?;
        record.sos_wins = current.sos_wins;
        record.sos_losses = current.sos_losses;
        record.sos_ties = current.sos_ties;
        *current = record;
        Ok(())
    }

    /// Rebuild a scored record; scored aggregates are cheap enough that the
    /// incremental path uses this too
    pub(crate) fn refresh_scored_record(&mut self, event_id: EventId, team: TeamId) -> EngineResult<()> {
        let mut record = ScoredRecord::default();
        let mut average_sum = 0.0;
        for m in self.standing_matches(event_id) {
            if m.team_1 != Some(team) {
                continue;
            }
            let Some(scores) = m.scores else { continue };
            record.competitions += 1;
            record.total_score += scores.team_score().unwrap_or(0.0);
            average_sum += scores.average_score().unwrap_or(0.0);
            if let MatchScores::Individual { player_1, player_2 } = scores {
                *record.player_1_total.get_or_insert(0.0) += player_1;
                *record.player_2_total.get_or_insert(0.0) += player_2;
            }
        }
        if record.competitions > 0 {
            record.average_score = Some(average_sum / f64::from(record.competitions));
        }

        let standing = self.standing_mut(event_id, team)?;
        standing.record = StandingRecord::Scored(record);
        Ok(())
    }

    /// Recompute strength of schedule for every head-to-head standing
    fn update_strength_of_schedule(&mut self, event_id: EventId) -> EngineResult<()> {
        let event = self.event(event_id)?;
        let records: HashMap<TeamId, HeadToHeadRecord> = event
            .standings
            .values()
            .filter_map(|s| s.head_to_head_record().map(|r| (s.team_id, *r)))
            .collect();

        let mut sos: HashMap<TeamId, (u32, u32, u32)> = HashMap::new();
        for m in self.standing_matches(event_id) {
            for team in m.participants() {
                let Some(opponent) = m.opponent_of(team).and_then(|o| records.get(&o)) else {
                    continue;
                };
                let entry = sos.entry(team).or_default();
                entry.0 += opponent.wins;
                entry.1 += opponent.losses;
                entry.2 += opponent.ties;
            }
        }

        for standing in self.event_mut(event_id)?.standings.values_mut() {
            let team_id = standing.team_id;
            if let Some(record) = standing.head_to_head_record_mut() {
                record.clear_sos();
                if let Some(&(wins, losses, ties)) = sos.get(&team_id) {
                    record.sos_wins = wins;
                    record.sos_losses = losses;
                    record.sos_ties = ties;
                }
            }
        }
        Ok(())
    }

    /// Re-rank an event from its current aggregates. Finalized events are
    /// left untouched.
    pub(crate) fn rank_event(&mut self, event_id: EventId, randomizer: &mut dyn Randomizer) -> EngineResult<()> {
        let event = self.event(event_id)?;
        if event.is_complete() {
            return Ok(());
        }
        if event.is_head_to_head() {
            self.rank_head_to_head(event_id, randomizer)
        } else {
            self.rank_scored(event_id)
        }
    }

    fn rank_head_to_head(&mut self, event_id: EventId, randomizer: &mut dyn Randomizer) -> EngineResult<()> {
        self.update_strength_of_schedule(event_id)?;

        let ledger = HeadToHeadLedger::from_matches(self.standing_matches(event_id));
        let event = self.event_mut(event_id)?;
        let contenders: Vec<Contender> = event
            .standings
            .values()
            .filter_map(|s| {
                s.head_to_head_record().map(|record| Contender {
                    team_id: s.team_id,
                    record: *record,
                })
            })
            .collect();

        let ranked = tie_breaker::rank_contenders(contenders, &ledger, randomizer);
        let placements = place_with_cutoff(ranked.len(), &ranked, QUALIFICATION_CUTOFF, |a, b| {
            a.record.win_rate == b.record.win_rate
        });

        for (contender, placement) in ranked.iter().zip(placements) {
            if let Some(standing) = event.standings.get_mut(&contender.team_id) {
                standing.rank = placement.rank;
                standing.points = placement.points;
            }
        }
        Ok(())
    }

    fn rank_scored(&mut self, event_id: EventId) -> EngineResult<()> {
        let event = self.event_mut(event_id)?;
        let higher_wins = event.config.higher_score_wins;

        let mut entries: Vec<(TeamId, Option<f64>)> = event
            .standings
            .values()
            .map(|s| (s.team_id, s.scored_record().and_then(|r| r.average_score)))
            .collect();
        // Teams without a result sort last regardless of direction
        entries.sort_by(|(_, a), (_, b)| match (a, b) {
            (Some(a), Some(b)) if higher_wins => b.total_cmp(a),
            (Some(a), Some(b)) => a.total_cmp(b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        let mut groups: Vec<Vec<TeamId>> = Vec::new();
        let mut last: Option<Option<f64>> = None;
        for (team, average) in entries {
            match groups.last_mut() {
                Some(group) if last == Some(average) => group.push(team),
                _ => groups.push(vec![team]),
            }
            last = Some(average);
        }

        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        let placements = place_groups(event.standings.len(), &sizes);
        for (group, placement) in groups.iter().zip(placements) {
            for team in group {
                if let Some(standing) = event.standings.get_mut(team) {
                    standing.rank = placement.rank;
                    standing.points = placement.points;
                }
            }
        }
        Ok(())
    }

    /// Rebuild every standing of an event from its completed matches and
    /// re-rank. A finalized event returns its frozen standings unchanged.
    pub fn recompute_standings(
        &mut self,
        event_id: EventId,
        randomizer: &mut dyn Randomizer,
    ) -> EngineResult<Vec<Standing>> {
        let event = self.event(event_id)?;
        if event.is_complete() {
            return Ok(event.ordered_standings());
        }
        let teams: Vec<TeamId> = event.standings.keys().copied().collect();
        for team in teams {
            self.recompute_record(event_id, team)?;
        }
        self.rank_event(event_id, randomizer)?;
        log::debug!("Recomputed standings for event {event_id}");
        Ok(self.event(event_id)?.ordered_standings())
    }
}
