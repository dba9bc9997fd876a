//! Events: configuration, lifecycle and progress queries.

pub mod models;
mod orchestrator;

pub use models::{Event, EventConfig, EventKind, EventStatus, ScoreType};
pub use orchestrator::MIN_HEAD_TO_HEAD_PARTICIPANTS;
