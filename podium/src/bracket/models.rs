//! Bracket record.

use serde::{Deserialize, Serialize};

use crate::tournament::models::MatchId;

/// Four-node single-elimination bracket owned by a head-to-head event.
///
/// The semifinals feed both final matches: winners meet in the championship,
/// losers in the consolation match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    /// Seed 1 vs seed 4
    pub upper_semifinal: MatchId,
    /// Seed 3 vs seed 2
    pub lower_semifinal: MatchId,
    pub championship: MatchId,
    pub consolation: MatchId,
    /// Matches may start only while this is set
    pub is_active: bool,
    pub is_complete: bool,
}

impl Bracket {
    /// Every node, semifinals first
    pub fn nodes(&self) -> [MatchId; 4] {
        [
            self.upper_semifinal,
            self.lower_semifinal,
            self.championship,
            self.consolation,
        ]
    }

    pub fn semifinals(&self) -> [MatchId; 2] {
        [self.upper_semifinal, self.lower_semifinal]
    }

    pub fn contains(&self, match_id: MatchId) -> bool {
        self.nodes().contains(&match_id)
    }
}
