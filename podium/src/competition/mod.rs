//! Single-match state machine shared by every event kind.

mod lifecycle;
pub mod models;

pub use models::{BracketLink, BracketRole, CompetitionKind, Match, MatchScores, MatchState};
