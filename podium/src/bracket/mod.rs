//! Post round-robin playoff for head-to-head events.
//!
//! The top four seeds play two semifinals (1 vs 4 and 3 vs 2). The upper
//! semifinal fills the first slot of each final match and the lower one the
//! second slot, so the championship always lists the upper winner first.

pub mod models;

pub use models::Bracket;

use crate::competition::{BracketLink, BracketRole, CompetitionKind, Match, MatchState};
use crate::errors::{EngineError, EngineResult};
use crate::tournament::models::{EventId, MatchId, TeamId, Tournament};

/// Slot a semifinal feeds in the next matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    First,
    Second,
}

impl Tournament {
    /// Create the four unseeded bracket nodes for an event
    pub(crate) fn create_bracket(&mut self, event_id: EventId) -> Bracket {
        let upper = self.allocate_id();
        let lower = self.allocate_id();
        let championship = self.allocate_id();
        let consolation = self.allocate_id();

        let semifinal = |role| BracketLink {
            role,
            winner_node: Some(championship),
            loser_node: Some(consolation),
            left: None,
            right: None,
            team_1_seed: None,
            team_2_seed: None,
        };
        let final_match = |role| BracketLink {
            role,
            winner_node: None,
            loser_node: None,
            left: Some(upper),
            right: Some(lower),
            team_1_seed: None,
            team_2_seed: None,
        };

        for (id, link) in [
            (upper, semifinal(BracketRole::UpperSemifinal)),
            (lower, semifinal(BracketRole::LowerSemifinal)),
            (championship, final_match(BracketRole::Championship)),
            (consolation, final_match(BracketRole::Consolation)),
        ] {
            let mut node = Match::new(id, event_id, CompetitionKind::HeadToHead, None, None);
            node.bracket = Some(link);
            self.matches.insert(id, node);
        }

        Bracket {
            upper_semifinal: upper,
            lower_semifinal: lower,
            championship,
            consolation,
            is_active: false,
            is_complete: false,
        }
    }

    fn bracket_of(&self, event_id: EventId) -> EngineResult<Bracket> {
        self.event(event_id)?
            .bracket
            .ok_or(EngineError::not_found("bracket", event_id))
    }

    /// Seed the top four standings into the semifinals and open the bracket.
    ///
    /// Allowed once the round robin is complete and while neither semifinal
    /// has started.
    pub fn seed_bracket(&mut self, event_id: EventId) -> EngineResult<[TeamId; 4]> {
        let event = self.event(event_id)?;
        let mut bracket = self.bracket_of(event_id)?;
        if !event.is_active() || !event.round_robin_complete {
            return Err(EngineError::transition(
                "event",
                event_id,
                "seed the bracket of",
                event.status,
            ));
        }

        let ordered = event.ordered_standings();
        if ordered.len() < 4 {
            return Err(EngineError::InsufficientParticipants {
                needed: 4,
                current: ordered.len(),
            });
        }
        let seeds = [
            ordered[0].team_id,
            ordered[1].team_id,
            ordered[2].team_id,
            ordered[3].team_id,
        ];

        for id in bracket.semifinals() {
            let node = self.match_record(id)?;
            if node.state != MatchState::Scheduled {
                return Err(EngineError::transition("match", id, "seed", node.state));
            }
        }

        self.place_seeds(bracket.upper_semifinal, (seeds[0], 1), (seeds[3], 4))?;
        self.place_seeds(bracket.lower_semifinal, (seeds[2], 3), (seeds[1], 2))?;

        bracket.is_active = true;
        self.event_mut(event_id)?.bracket = Some(bracket);
        log::debug!("Event {event_id} bracket seeded with {seeds:?}");
        Ok(seeds)
    }

    /// Re-seed an open bracket whose semifinals have not started yet.
    ///
    /// Returns whether the seeds were replaced.
    pub(crate) fn reseed_unplayed_bracket(&mut self, event_id: EventId) -> EngineResult<bool> {
        let event = self.event(event_id)?;
        let Some(bracket) = event.bracket else {
            return Ok(false);
        };
        if !bracket.is_active || !event.round_robin_complete {
            return Ok(false);
        }
        for id in bracket.semifinals() {
            if self.match_record(id)?.state != MatchState::Scheduled {
                return Ok(false);
            }
        }
        let seeds = self.seed_bracket(event_id)?;
        log::info!("Event {event_id} bracket re-seeded with {seeds:?} after a result override");
        Ok(true)
    }

    fn place_seeds(
        &mut self,
        match_id: MatchId,
        (team_1, seed_1): (TeamId, u32),
        (team_2, seed_2): (TeamId, u32),
    ) -> EngineResult<()> {
        let node = self.match_mut(match_id)?;
        node.team_1 = Some(team_1);
        node.team_2 = Some(team_2);
        if let Some(link) = node.bracket.as_mut() {
            link.team_1_seed = Some(seed_1);
            link.team_2_seed = Some(seed_2);
        }
        Ok(())
    }

    fn fill_slot(
        &mut self,
        match_id: MatchId,
        slot: Slot,
        team: TeamId,
        seed: Option<u32>,
    ) -> EngineResult<()> {
        let node = self.match_mut(match_id)?;
        if node.state != MatchState::Scheduled {
            return Err(EngineError::transition("match", match_id, "fill", node.state));
        }
        match slot {
            Slot::First => node.team_1 = Some(team),
            Slot::Second => node.team_2 = Some(team),
        }
        if let Some(link) = node.bracket.as_mut() {
            match slot {
                Slot::First => link.team_1_seed = seed,
                Slot::Second => link.team_2_seed = seed,
            }
        }
        Ok(())
    }

    /// Propagate a completed bracket match.
    ///
    /// Semifinal winners move into the championship and losers into the
    /// consolation match. When both final matches are complete the bracket
    /// closes and the event is finalized. Returns whether that happened.
    pub fn advance_bracket(&mut self, match_id: MatchId) -> EngineResult<bool> {
        let node = self.match_record(match_id)?;
        let link = node
            .bracket
            .ok_or(EngineError::not_found("bracket match", match_id))?;
        if !node.is_complete() {
            return Err(EngineError::transition("match", match_id, "advance", node.state));
        }
        let (Some(winner), Some(loser)) = (node.winner, node.loser) else {
            return Err(EngineError::TiedScoreNotAllowed(match_id));
        };
        let event_id = node.event_id;

        if link.role.is_semifinal() {
            let seed_of = |team: TeamId| {
                if node.team_1 == Some(team) {
                    link.team_1_seed
                } else {
                    link.team_2_seed
                }
            };
            let (winner_seed, loser_seed) = (seed_of(winner), seed_of(loser));
            let slot = match link.role {
                BracketRole::UpperSemifinal => Slot::First,
                _ => Slot::Second,
            };
            if let Some(next) = link.winner_node {
                self.fill_slot(next, slot, winner, winner_seed)?;
            }
            if let Some(next) = link.loser_node {
                self.fill_slot(next, slot, loser, loser_seed)?;
            }
            log::debug!("Bracket match {match_id}: team {winner} advances, team {loser} drops to consolation");
        }

        if !self.is_bracket_final(event_id)? {
            return Ok(false);
        }

        self.finalize_event(event_id)?;
        Ok(true)
    }

    /// Whether the championship and consolation matches are both complete
    pub fn is_bracket_final(&self, event_id: EventId) -> EngineResult<bool> {
        let bracket = self.bracket_of(event_id)?;
        Ok(self.match_record(bracket.championship)?.is_complete()
            && self.match_record(bracket.consolation)?.is_complete())
    }

    /// Champion, runner-up, third and fourth place
    pub fn bracket_placements(&self, event_id: EventId) -> EngineResult<[TeamId; 4]> {
        let bracket = self.bracket_of(event_id)?;
        let championship = self.match_record(bracket.championship)?;
        let consolation = self.match_record(bracket.consolation)?;
        match (
            championship.winner,
            championship.loser,
            consolation.winner,
            consolation.loser,
        ) {
            (Some(first), Some(second), Some(third), Some(fourth))
                if championship.is_complete() && consolation.is_complete() =>
            {
                Ok([first, second, third, fourth])
            }
            _ => Err(EngineError::blocked(
                "event",
                event_id,
                "place the bracket of",
                "still playing",
            )),
        }
    }
}
