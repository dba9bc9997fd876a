//! Round-robin pairing generation for head-to-head events.
//!
//! Each round splits the current order into a top half and a reversed bottom
//! half and pairs them index by index. With an odd participant count the last
//! participant of the round sits out as a leftover. Between rounds the order
//! rotates by moving the last participant to the front. Leftovers are paired
//! two at a time once all rounds are generated.

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::tournament::models::TeamId;

/// Unordered pairing of two participants
pub type Pairing = (TeamId, TeamId);

/// Generated head-to-head schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Number of participants scheduled
    pub participants: usize,
    /// Rounds requested
    pub requested_rounds: u32,
    /// Pairings by round
    pub rounds: Vec<Vec<Pairing>>,
    /// Extra pairings built from the participants who sat out a round
    pub supplementary: Vec<Pairing>,
}

impl Schedule {
    fn empty(participants: usize, requested_rounds: u32) -> Self {
        Self {
            participants,
            requested_rounds,
            rounds: Vec::new(),
            supplementary: Vec::new(),
        }
    }

    /// All pairings, round by round, followed by the supplementary ones
    pub fn pairings(&self) -> impl Iterator<Item = Pairing> + '_ {
        self.rounds
            .iter()
            .flatten()
            .chain(self.supplementary.iter())
            .copied()
    }

    /// Total number of matches this schedule creates
    pub fn len(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum::<usize>() + self.supplementary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many pairings a participant appears in
    pub fn appearances(&self, team: TeamId) -> usize {
        self.pairings()
            .filter(|&(a, b)| a == team || b == team)
            .count()
    }

    /// Flags schedules whose rounds exceed the distinct pairing space.
    ///
    /// Such a schedule is still usable; callers decide whether to proceed.
    pub fn check_feasible(&self) -> EngineResult<()> {
        let max_rounds = max_distinct_rounds(self.participants);
        if self.requested_rounds > max_rounds {
            return Err(EngineError::SchedulingInfeasible {
                participants: self.participants,
                rounds: self.requested_rounds,
                max_rounds,
            });
        }
        Ok(())
    }
}

/// Rounds that can be played before an opponent must repeat
pub fn max_distinct_rounds(participants: usize) -> u32 {
    participants.saturating_sub(1) as u32
}

/// Generate a round-robin schedule over `participants` (in the given order).
///
/// Every participant appears in `rounds` pairings, or `rounds + 1` when an
/// odd number of leftovers has to be closed out against the first
/// participant.
pub fn round_robin(participants: &[TeamId], rounds: u32) -> Schedule {
    let n = participants.len();
    if n < 2 || rounds == 0 {
        return Schedule::empty(n, rounds);
    }

    let per_round = n / 2;
    let mut order = participants.to_vec();
    let mut leftovers = Vec::new();
    let mut schedule = Schedule::empty(n, rounds);

    for _ in 0..rounds {
        let top = &order[..per_round];
        let bottom = order[per_round..per_round * 2].iter().rev();
        schedule
            .rounds
            .push(top.iter().copied().zip(bottom.copied()).collect());

        if n % 2 == 1 {
            leftovers.push(order[n - 1]);
        }

        order.rotate_right(1);
    }

    for chunk in leftovers.chunks(2) {
        match *chunk {
            [a, b] => schedule.supplementary.push((a, b)),
            [dangling] => {
                let anchor = if participants[0] == dangling {
                    participants[1]
                } else {
                    participants[0]
                };
                schedule.supplementary.push((dangling, anchor));
            }
            _ => {}
        }
    }

    schedule
}
