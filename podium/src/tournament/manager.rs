//! Tournament manager: the async facade applications drive.
//!
//! Every mutation of a tournament runs under that tournament's lock. The
//! operation is staged on a copy, the copy is saved through the repository,
//! and only then does it replace the visible state and are its notices
//! published. A failed save leaves the previous state untouched.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use super::models::{EventId, MatchId, OverallStanding, TeamId, Tournament, TournamentId};
use super::notifier::{FinalizationNotifier, LogNotifier};
use crate::competition::MatchScores;
use crate::config::EngineConfig;
use crate::db::repository::{RepositoryError, TournamentRepository, TournamentSummary};
use crate::errors::{EngineError, EngineResult};
use crate::event::EventConfig;
use crate::randomizer::Randomizer;
use crate::standings::Standing;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl TournamentError {
    /// Message safe to show to callers; storage details stay in the logs
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::NotFound(_) | TournamentError::Engine(_) => self.to_string(),
            TournamentError::Repository(_) => "Tournament storage is unavailable".to_string(),
        }
    }

    /// The engine error behind this failure, if any
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            TournamentError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

pub type TournamentResult<T> = Result<T, TournamentError>;

/// Tournament manager
pub struct TournamentManager {
    repository: Arc<dyn TournamentRepository>,
    notifier: Arc<dyn FinalizationNotifier>,
    randomizer: Mutex<Box<dyn Randomizer>>,
    config: EngineConfig,
    tournaments: RwLock<HashMap<TournamentId, Arc<Mutex<Tournament>>>>,
}

impl TournamentManager {
    /// Create a manager that logs notices and randomizes per `config`
    pub fn new(repository: Arc<dyn TournamentRepository>, config: EngineConfig) -> Self {
        let randomizer = Box::new(config.randomizer());
        Self::with_parts(repository, Arc::new(LogNotifier), randomizer, config)
    }

    pub fn with_parts(
        repository: Arc<dyn TournamentRepository>,
        notifier: Arc<dyn FinalizationNotifier>,
        randomizer: Box<dyn Randomizer>,
        config: EngineConfig,
    ) -> Self {
        Self {
            repository,
            notifier,
            randomizer: Mutex::new(randomizer),
            config,
            tournaments: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn slot(&self, id: TournamentId) -> TournamentResult<Arc<Mutex<Tournament>>> {
        if let Some(slot) = self.tournaments.read().await.get(&id) {
            return Ok(Arc::clone(slot));
        }

        let loaded = self
            .repository
            .load_tournament(id)
            .await?
            .ok_or(TournamentError::NotFound(id))?;
        let mut tournaments = self.tournaments.write().await;
        let slot = tournaments
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(loaded)));
        Ok(Arc::clone(slot))
    }

    /// Run `op` against a staged copy, commit it, then publish it
    async fn mutate<T, F>(&self, id: TournamentId, op: F) -> TournamentResult<T>
    where
        F: FnOnce(&mut Tournament, &mut dyn Randomizer) -> EngineResult<T> + Send,
    {
        let slot = self.slot(id).await?;
        let mut current = slot.lock().await;

        let mut staged = current.clone();
        let value = {
            let mut randomizer = self.randomizer.lock().await;
            op(&mut staged, &mut **randomizer)?
        };

        if let Err(e) = self.repository.save_tournament(&staged).await {
            log::error!("Failed to save tournament {id}: {e}");
            return Err(e.into());
        }

        let notices = staged.drain_notices();
        *current = staged;
        drop(current);

        for notice in &notices {
            self.notifier.notify(notice);
        }
        Ok(value)
    }

    async fn read<T>(&self, id: TournamentId, op: impl FnOnce(&Tournament) -> T) -> TournamentResult<T> {
        let slot = self.slot(id).await?;
        let current = slot.lock().await;
        Ok(op(&current))
    }

    /// Create and store an empty tournament
    pub async fn create_tournament(&self, name: impl Into<String>) -> TournamentResult<TournamentId> {
        let id = self.repository.next_tournament_id().await?;
        let tournament = Tournament::new(id, name);
        self.repository.save_tournament(&tournament).await?;
        self.tournaments
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(tournament)));
        log::info!("Created tournament {id}");
        Ok(id)
    }

    pub async fn list_tournaments(&self) -> TournamentResult<Vec<TournamentSummary>> {
        Ok(self.repository.list_tournaments().await?)
    }

    /// Copy of the tournament's current state
    pub async fn snapshot(&self, id: TournamentId) -> TournamentResult<Tournament> {
        self.read(id, Tournament::clone).await
    }

    pub async fn register_team(&self, id: TournamentId, name: impl Into<String>) -> TournamentResult<TeamId> {
        let name = name.into();
        self.mutate(id, move |t, _| t.register_team(name)).await
    }

    pub async fn add_event(&self, id: TournamentId, config: EventConfig) -> TournamentResult<EventId> {
        self.mutate(id, move |t, _| t.add_event(config)).await
    }

    /// Add a head-to-head event using the configured default rounds
    pub async fn add_head_to_head_event(
        &self,
        id: TournamentId,
        name: impl Into<String>,
    ) -> TournamentResult<EventId> {
        let config = self.config.head_to_head_event(name);
        self.add_event(id, config).await
    }

    pub async fn start_tournament(&self, id: TournamentId) -> TournamentResult<()> {
        self.mutate(id, |t, _| t.start()).await
    }

    pub async fn end_tournament(&self, id: TournamentId) -> TournamentResult<()> {
        self.mutate(id, |t, _| t.end()).await
    }

    pub async fn start_event(&self, id: TournamentId, event_id: EventId) -> TournamentResult<Vec<MatchId>> {
        self.mutate(id, move |t, rng| t.start_event(event_id, rng)).await
    }

    pub async fn start_match(&self, id: TournamentId, match_id: MatchId) -> TournamentResult<()> {
        self.mutate(id, move |t, _| t.start_match(match_id)).await
    }

    pub async fn cancel_match(&self, id: TournamentId, match_id: MatchId) -> TournamentResult<()> {
        self.mutate(id, move |t, rng| t.cancel_match(match_id, rng)).await
    }

    pub async fn end_match(
        &self,
        id: TournamentId,
        match_id: MatchId,
        scores: MatchScores,
    ) -> TournamentResult<Vec<Standing>> {
        self.mutate(id, move |t, rng| t.end_match(match_id, scores, rng))
            .await
    }

    pub async fn admin_end_match(
        &self,
        id: TournamentId,
        match_id: MatchId,
        scores: MatchScores,
    ) -> TournamentResult<Vec<Standing>> {
        self.mutate(id, move |t, rng| t.admin_end_match(match_id, scores, rng))
            .await
    }

    pub async fn recompute_standings(
        &self,
        id: TournamentId,
        event_id: EventId,
    ) -> TournamentResult<Vec<Standing>> {
        self.mutate(id, move |t, rng| t.recompute_standings(event_id, rng))
            .await
    }

    pub async fn seed_bracket(&self, id: TournamentId, event_id: EventId) -> TournamentResult<[TeamId; 4]> {
        self.mutate(id, move |t, _| t.seed_bracket(event_id)).await
    }

    /// End an active bracket match and propagate its result. Returns whether
    /// the bracket, and with it the event, is now final.
    pub async fn advance_bracket(
        &self,
        id: TournamentId,
        match_id: MatchId,
        scores: MatchScores,
    ) -> TournamentResult<bool> {
        self.mutate(id, move |t, rng| {
            let event_id = t.match_record(match_id)?.event_id;
            if !t.match_record(match_id)?.is_bracket() {
                return Err(EngineError::NotFound {
                    entity: "bracket match",
                    id: match_id,
                });
            }
            t.end_match(match_id, scores, rng)?;
            t.is_bracket_final(event_id)
        })
        .await
    }

    pub async fn is_bracket_final(&self, id: TournamentId, event_id: EventId) -> TournamentResult<bool> {
        Ok(self.read(id, |t| t.is_bracket_final(event_id)).await??)
    }

    pub async fn finalize_event(&self, id: TournamentId, event_id: EventId) -> TournamentResult<Vec<Standing>> {
        self.mutate(id, move |t, _| t.finalize_event(event_id)).await
    }

    pub async fn rollup_tournament(&self, id: TournamentId) -> TournamentResult<Vec<OverallStanding>> {
        self.mutate(id, |t, _| Ok(t.rollup())).await
    }

    pub async fn force_full_rankings_update(
        &self,
        id: TournamentId,
    ) -> TournamentResult<Vec<OverallStanding>> {
        self.mutate(id, |t, _| Ok(t.force_full_rankings_update()))
            .await
    }

    pub async fn event_standings(&self, id: TournamentId, event_id: EventId) -> TournamentResult<Vec<Standing>> {
        Ok(self
            .read(id, |t| t.event(event_id).map(|e| e.ordered_standings()))
            .await??)
    }

    pub async fn overall_rankings(&self, id: TournamentId) -> TournamentResult<Vec<OverallStanding>> {
        self.read(id, Tournament::overall_rankings).await
    }
}
