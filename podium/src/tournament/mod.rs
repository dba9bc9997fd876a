//! Tournament aggregate, overall ranking and the async manager.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use podium::config::EngineConfig;
//! use podium::db::InMemoryRepository;
//! use podium::tournament::TournamentManager;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::new(Arc::new(InMemoryRepository::new()), EngineConfig::default());
//!
//!     let id = manager.create_tournament("Summer League").await?;
//!     for name in ["Aces", "Bombers", "Comets", "Dragons"] {
//!         manager.register_team(id, name).await?;
//!     }
//!     let event = manager.add_head_to_head_event(id, "Cornhole").await?;
//!     manager.start_tournament(id).await?;
//!     let matches = manager.start_event(id, event).await?;
//!     println!("Scheduled {} matches", matches.len());
//!
//!     Ok(())
//! }
//! ```

mod aggregator;
pub mod manager;
pub mod models;
pub mod notifier;

pub use manager::{TournamentError, TournamentManager, TournamentResult};
pub use models::{
    EventId, MatchId, OverallStanding, Team, TeamId, Tournament, TournamentId, TournamentStatus,
};
pub use notifier::{FinalizationNotifier, LogNotifier, Notice};
