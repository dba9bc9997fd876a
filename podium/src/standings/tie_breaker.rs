//! Head-to-head ranking comparator.
//!
//! Standings are pre-sorted by win rate and then merge-sorted with a pairwise
//! comparator that walks the cascade below until one criterion
//! discriminates. The comparison is pairwise, so three-way ties resolved by
//! head-to-head results are not guaranteed to be transitive.

use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};

use crate::competition::Match;
use crate::randomizer::Randomizer;
use crate::standings::models::HeadToHeadRecord;
use crate::tournament::models::TeamId;

/// Ranking criteria in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    WinRate,
    /// Wins in matches between exactly the two compared teams
    HeadToHead,
    TotalWins,
    /// Score for minus score against
    VictoryMargin,
    /// Opponents' combined win rate
    StrengthOfSchedule,
    /// Opponents' combined wins
    StrengthOfScheduleWins,
    /// Last resort
    CoinFlip,
}

/// Full cascade, evaluated top to bottom
pub const CASCADE: [TieBreak; 7] = [
    TieBreak::WinRate,
    TieBreak::HeadToHead,
    TieBreak::TotalWins,
    TieBreak::VictoryMargin,
    TieBreak::StrengthOfSchedule,
    TieBreak::StrengthOfScheduleWins,
    TieBreak::CoinFlip,
];

/// One team's entry in a head-to-head ranking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contender {
    pub team_id: TeamId,
    pub record: HeadToHeadRecord,
}

/// Wins recorded between pairs of teams in completed matches
#[derive(Debug, Clone, Default)]
pub struct HeadToHeadLedger {
    wins: HashMap<(TeamId, TeamId), u32>,
}

impl HeadToHeadLedger {
    /// Build the ledger from completed, decided matches
    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a Match>) -> Self {
        let mut wins = HashMap::new();
        for m in matches.into_iter().filter(|m| m.is_complete()) {
            if let (Some(winner), Some(loser)) = (m.winner, m.loser) {
                *wins.entry((winner, loser)).or_insert(0) += 1;
            }
        }
        Self { wins }
    }

    /// Times `team` beat `opponent`
    pub fn wins_against(&self, team: TeamId, opponent: TeamId) -> u32 {
        self.wins.get(&(team, opponent)).copied().unwrap_or(0)
    }
}

impl TieBreak {
    /// Compare two contenders; `Greater` means `a` ranks above `b`.
    /// The coin flip never discriminates here.
    pub fn compare(self, a: &Contender, b: &Contender, ledger: &HeadToHeadLedger) -> Ordering {
        let (ra, rb) = (&a.record, &b.record);
        match self {
            TieBreak::WinRate => ra.win_rate.total_cmp(&rb.win_rate),
            TieBreak::HeadToHead => ledger
                .wins_against(a.team_id, b.team_id)
                .cmp(&ledger.wins_against(b.team_id, a.team_id)),
            TieBreak::TotalWins => ra.wins.cmp(&rb.wins),
            TieBreak::VictoryMargin => ra.margin().total_cmp(&rb.margin()),
            TieBreak::StrengthOfSchedule => ra.sos_ratio().total_cmp(&rb.sos_ratio()),
            TieBreak::StrengthOfScheduleWins => ra.sos_wins.cmp(&rb.sos_wins),
            TieBreak::CoinFlip => Ordering::Equal,
        }
    }
}

/// Walk the deterministic part of the cascade
pub fn deterministic_order(a: &Contender, b: &Contender, ledger: &HeadToHeadLedger) -> Ordering {
    CASCADE
        .iter()
        .map(|criterion| criterion.compare(a, b, ledger))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// The criterion that separated `a` from `b`
pub fn deciding_criterion(a: &Contender, b: &Contender, ledger: &HeadToHeadLedger) -> TieBreak {
    CASCADE
        .iter()
        .copied()
        .find(|criterion| criterion.compare(a, b, ledger).is_ne())
        .unwrap_or(TieBreak::CoinFlip)
}

/// Whether `a` ranks above `b`, flipping a coin when everything else is equal
pub fn is_above(
    a: &Contender,
    b: &Contender,
    ledger: &HeadToHeadLedger,
    randomizer: &mut dyn Randomizer,
) -> bool {
    match deterministic_order(a, b, ledger) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => randomizer.coin_flip(),
    }
}

/// Top-down merge sort driven by a pairwise "ranks above" predicate.
/// Keeps the left element whenever the predicate holds.
pub fn merge_sort_by<T: Clone>(items: &[T], above: &mut impl FnMut(&T, &T) -> bool) -> Vec<T> {
    if items.len() <= 1 {
        return items.to_vec();
    }

    let mid = items.len() / 2;
    let left = merge_sort_by(&items[..mid], above);
    let right = merge_sort_by(&items[mid..], above);

    let mut merged = Vec::with_capacity(items.len());
    let (mut l, mut r) = (0, 0);
    while l < left.len() && r < right.len() {
        if above(&left[l], &right[r]) {
            merged.push(left[l].clone());
            l += 1;
        } else {
            merged.push(right[r].clone());
            r += 1;
        }
    }
    merged.extend_from_slice(&left[l..]);
    merged.extend_from_slice(&right[r..]);
    merged
}

/// Order contenders by the full cascade
pub fn rank_contenders(
    mut contenders: Vec<Contender>,
    ledger: &HeadToHeadLedger,
    randomizer: &mut dyn Randomizer,
) -> Vec<Contender> {
    contenders.sort_by(|a, b| b.record.win_rate.total_cmp(&a.record.win_rate));
    merge_sort_by(&contenders, &mut |a, b| is_above(a, b, ledger, randomizer))
}
