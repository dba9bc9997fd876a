//! Cross-event overall ranking.
//!
//! Overall standings accumulate points, head-to-head results and podium
//! counters from every finalized event. Ranks group equal point totals:
//! members of a group share a rank and the next group starts after the
//! whole block.

use std::collections::BTreeMap;

use chrono::Utc;

use super::models::{EventId, OverallStanding, Tournament, TournamentStatus};
use super::notifier::Notice;
use crate::errors::{EngineError, EngineResult};
use crate::standings::Standing;

/// Add one finalized event standing to an overall standing
fn accumulate(overall: &mut OverallStanding, standing: &Standing) {
    overall.total_points += standing.points;
    if let Some(record) = standing.head_to_head_record() {
        overall.wins += record.wins;
        overall.losses += record.losses;
        overall.ties += record.ties;
    }
    if standing.rank == 1 {
        overall.event_wins += 1;
    }
    if standing.rank <= 3 {
        overall.event_podiums += 1;
    }
}

impl Tournament {
    /// Open the tournament and create one overall standing per participant
    pub fn start(&mut self) -> EngineResult<()> {
        if self.status != TournamentStatus::Registering {
            return Err(EngineError::transition("tournament", self.id, "start", self.status));
        }
        self.overall = self
            .teams
            .keys()
            .map(|&team| (team, OverallStanding::new(team)))
            .collect();
        self.status = TournamentStatus::Active;
        self.started_at = Some(Utc::now());
        log::info!("Tournament {} started with {} teams", self.id, self.teams.len());
        Ok(())
    }

    /// Close the tournament. Standings are left as they are.
    pub fn end(&mut self) -> EngineResult<()> {
        if self.status != TournamentStatus::Active {
            return Err(EngineError::transition("tournament", self.id, "end", self.status));
        }
        self.status = TournamentStatus::Complete;
        self.ended_at = Some(Utc::now());
        self.push_notice(Notice::TournamentFinalized {
            tournament_id: self.id,
        });
        Ok(())
    }

    pub(crate) fn roll_event_into_overall(&mut self, event_id: EventId) -> EngineResult<()> {
        let standings = self.event(event_id)?.ordered_standings();
        for standing in &standings {
            let overall = self
                .overall
                .entry(standing.team_id)
                .or_insert_with(|| OverallStanding::new(standing.team_id));
            accumulate(overall, standing);
        }
        self.rollup();
        Ok(())
    }

    /// Re-rank overall standings by total points and return them in rank
    /// order.
    pub fn rollup(&mut self) -> Vec<OverallStanding> {
        let mut order: Vec<_> = self
            .overall
            .values()
            .map(|o| (o.team_id, o.total_points))
            .collect();
        order.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut rank = 1;
        let mut i = 0;
        while i < order.len() {
            let points = order[i].1;
            let block = order[i..].iter().take_while(|(_, p)| *p == points).count();
            for (team, _) in &order[i..i + block] {
                if let Some(overall) = self.overall.get_mut(team) {
                    overall.rank = rank;
                }
            }
            rank += block as u32;
            i += block;
        }

        log::debug!("Tournament {} rankings rolled up", self.id);
        self.overall_rankings()
    }

    /// Rebuild every overall standing from finalized event standings and
    /// re-rank.
    pub fn force_full_rankings_update(&mut self) -> Vec<OverallStanding> {
        let mut rebuilt: BTreeMap<_, _> = self
            .teams
            .keys()
            .map(|&team| (team, OverallStanding::new(team)))
            .collect();
        for event in self.events.values().filter(|e| e.is_complete()) {
            for standing in event.standings.values().filter(|s| s.is_final) {
                let overall = rebuilt
                    .entry(standing.team_id)
                    .or_insert_with(|| OverallStanding::new(standing.team_id));
                accumulate(overall, standing);
            }
        }
        self.overall = rebuilt;
        log::info!("Tournament {} overall standings rebuilt", self.id);
        self.rollup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_totals(totals: &[f64]) -> Tournament {
        let mut tournament = Tournament::new(1, "Aggregate");
        for i in 0..totals.len() {
            tournament.register_team(format!("Team {i}")).unwrap();
        }
        tournament.start().unwrap();
        for (overall, &points) in tournament.overall.values_mut().zip(totals) {
            overall.total_points = points;
        }
        tournament
    }

    #[test]
    fn test_ties_share_rank_and_advance_by_block() {
        let mut tournament = with_totals(&[10.0, 25.0, 10.0, 30.0, 10.0, 2.0]);
        let ranks: Vec<(u32, f64)> = tournament
            .rollup()
            .iter()
            .map(|o| (o.rank, o.total_points))
            .collect();
        assert_eq!(
            ranks,
            vec![(1, 30.0), (2, 25.0), (3, 10.0), (3, 10.0), (3, 10.0), (6, 2.0)]
        );
    }

    #[test]
    fn test_start_creates_overall_standings_once() {
        let mut tournament = with_totals(&[0.0, 0.0]);
        assert_eq!(tournament.overall.len(), 2);
        assert!(tournament.overall.values().all(|o| o.rank == 1));
        assert!(tournament.start().unwrap_err().is_invalid_transition());
    }

    #[test]
    fn test_end_is_terminal() {
        let mut tournament = with_totals(&[5.0]);
        tournament.end().unwrap();
        assert_eq!(tournament.status, TournamentStatus::Complete);
        assert!(tournament.ended_at.is_some());
        assert_eq!(tournament.overall.values().next().unwrap().total_points, 5.0);
        assert!(tournament.end().is_err());
        assert_eq!(
            tournament.drain_notices(),
            vec![Notice::TournamentFinalized { tournament_id: 1 }]
        );
    }

    #[test]
    fn test_accumulate_counts_podiums() {
        let mut overall = OverallStanding::new(1);
        let mut standing = Standing::head_to_head(9, 1);
        standing.rank = 1;
        standing.points = 12.0;
        accumulate(&mut overall, &standing);
        standing.rank = 3;
        standing.points = 7.0;
        accumulate(&mut overall, &standing);

        assert_eq!(overall.total_points, 19.0);
        assert_eq!(overall.event_wins, 1);
        assert_eq!(overall.event_podiums, 2);
    }
}
