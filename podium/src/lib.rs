//! # Podium
//!
//! A multi-event tournament engine. Teams register into a tournament,
//! compete across events, and earn points toward an overall ranking.
//!
//! Events come in two kinds:
//!
//! - **Head-to-head**: a round-robin phase ranked by win rate and a tie-break
//!   cascade, followed by a four-team bracket that decides the podium
//! - **Individual/team**: every participant posts scores, and the event is
//!   ranked by average score
//!
//! ## Core Modules
//!
//! - [`tournament`]: The tournament aggregate, overall ranking and the async manager
//! - [`event`]: Event configuration and orchestration
//! - [`competition`]: Match lifecycle (start, cancel, end, admin corrections)
//! - [`standings`]: Per-event records, ranking and placement points
//! - [`bracket`]: Seeding and advancement of the four-team bracket
//! - [`schedule`]: Round-robin pairing generation
//! - [`db`]: PostgreSQL and in-memory persistence
//!
//! ## Example
//!
//! ```
//! use podium::{EventConfig, FixedRandomizer, Tournament};
//!
//! let mut tournament = Tournament::new(1, "Summer League");
//! for name in ["Aces", "Bombers", "Comets", "Dragons"] {
//!     tournament.register_team(name).unwrap();
//! }
//! let event = tournament.add_event(EventConfig::head_to_head("Cornhole", 1)).unwrap();
//! tournament.start().unwrap();
//!
//! let mut rng = FixedRandomizer::new(true);
//! let matches = tournament.start_event(event, &mut rng).unwrap();
//! // Two round-robin pairings plus the four bracket nodes
//! assert_eq!(matches.len(), 6);
//! ```

pub mod bracket;
pub mod competition;
pub mod config;
pub mod db;
pub mod errors;
pub mod event;
pub mod randomizer;
pub mod schedule;
pub mod standings;
pub mod tournament;

pub use bracket::Bracket;
pub use competition::{Match, MatchScores, MatchState};
pub use config::{ConfigError, EngineConfig};
pub use errors::{EngineError, EngineResult};
pub use event::{Event, EventConfig, EventKind, EventStatus, ScoreType};
pub use randomizer::{FixedRandomizer, Randomizer, SeededRandomizer};
pub use standings::Standing;
pub use tournament::{
    OverallStanding, Tournament, TournamentError, TournamentManager, TournamentResult,
};
