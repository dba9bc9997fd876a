//! Finalization notifications.

use serde::{Deserialize, Serialize};

use super::models::{EventId, TournamentId};

/// Something worth telling the outside world about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    /// Round robin finished and the bracket was seeded
    BracketActivated {
        tournament_id: TournamentId,
        event_id: EventId,
    },
    /// Event standings are final
    EventFinalized {
        tournament_id: TournamentId,
        event_id: EventId,
    },
    /// Tournament closed
    TournamentFinalized { tournament_id: TournamentId },
}

/// Sink for notices, invoked only after the change that raised them has been
/// committed.
pub trait FinalizationNotifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Notifier that writes each notice to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl FinalizationNotifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice {
            Notice::BracketActivated {
                tournament_id,
                event_id,
            } => log::info!("Tournament {tournament_id}: bracket for event {event_id} is live"),
            Notice::EventFinalized {
                tournament_id,
                event_id,
            } => log::info!("Tournament {tournament_id}: event {event_id} finalized"),
            Notice::TournamentFinalized { tournament_id } => {
                log::info!("Tournament {tournament_id} finalized")
            }
        }
    }
}
