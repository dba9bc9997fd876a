//! Engine error types.

use thiserror::Error;

use crate::tournament::models::{EventId, MatchId, TeamId};

/// Errors raised by the tournament engine.
///
/// Every variant is a local, recoverable condition; none of them leave the
/// tournament in a partially updated state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Lifecycle transition not legal from the current state
    #[error("Cannot {action} {entity} {id} while it is {state}")]
    InvalidTransition {
        entity: &'static str,
        id: i64,
        action: &'static str,
        state: String,
    },

    /// Participant is locked by another live match
    #[error("Team {0} is not currently available")]
    Unavailable(TeamId),

    /// Bracket matches cannot start before the round robin completes
    #[error("Bracket for event {0} is not active yet")]
    BracketInactive(EventId),

    /// Bracket matches must be decisive
    #[error("Bracket match {0} cannot end in a tie")]
    TiedScoreNotAllowed(MatchId),

    /// Bracket match started before both sides were seeded
    #[error("Bracket match {0} is missing a participant")]
    IncompleteSeed(MatchId),

    /// Requested rounds exceed the distinct pairings available
    #[error("{rounds} rounds requested but {participants} participants only allow {max_rounds} without repeats")]
    SchedulingInfeasible {
        participants: usize,
        rounds: u32,
        max_rounds: u32,
    },

    /// Score rejected by the event's scoring rules
    #[error("Invalid score: {0}")]
    InvalidScore(String),

    /// Record does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Not enough participants to run an event
    #[error("Insufficient participants: need {needed}, have {current}")]
    InsufficientParticipants { needed: usize, current: usize },

    /// Event has reached its concurrent match limit or is closed
    #[error("Event {0} is not accepting new matches")]
    EventUnavailable(EventId),
}

impl EngineError {
    pub(crate) fn transition(
        entity: &'static str,
        id: i64,
        action: &'static str,
        state: impl std::fmt::Display,
    ) -> Self {
        EngineError::InvalidTransition {
            entity,
            id,
            action,
            state: state.to_string(),
        }
    }

    /// Transition blocked by a condition rather than a named state
    pub(crate) fn blocked(entity: &'static str, id: i64, action: &'static str, condition: &str) -> Self {
        EngineError::InvalidTransition {
            entity,
            id,
            action,
            state: condition.to_string(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        EngineError::NotFound { entity, id }
    }

    /// Whether this error belongs to the invalid-transition family
    /// (illegal lifecycle step, unavailable participant, inactive bracket).
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidTransition { .. }
                | EngineError::Unavailable(_)
                | EngineError::BracketInactive(_)
        )
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_message() {
        let err = EngineError::transition("match", 7, "end", crate::competition::MatchState::Complete);
        assert_eq!(err.to_string(), "Cannot end match 7 while it is complete");
        assert!(err.is_invalid_transition());
    }

    #[test]
    fn test_transition_message_for_multiword_status() {
        let err = EngineError::transition("event", 4, "finalize", crate::event::EventStatus::NotStarted);
        assert_eq!(err.to_string(), "Cannot finalize event 4 while it is not started");
    }

    #[test]
    fn test_invalid_transition_family() {
        assert!(EngineError::Unavailable(3).is_invalid_transition());
        assert!(EngineError::BracketInactive(1).is_invalid_transition());
        assert!(!EngineError::TiedScoreNotAllowed(2).is_invalid_transition());
        assert!(!EngineError::IncompleteSeed(2).is_invalid_transition());
    }
}
