//! Persistence boundary for tournaments.
//!
//! A tournament is saved as a unit: its header and every team, event,
//! match and standing record are written together or not at all.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::competition::Match;
use crate::event::Event;
use crate::standings::Standing;
use crate::tournament::models::{OverallStanding, Team, Tournament, TournamentId, TournamentStatus};

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Listing entry for a stored tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub id: TournamentId,
    pub uuid: Uuid,
    pub name: String,
    pub status: TournamentStatus,
}

impl From<&Tournament> for TournamentSummary {
    fn from(t: &Tournament) -> Self {
        Self {
            id: t.id,
            uuid: t.uuid,
            name: t.name.clone(),
            status: t.status,
        }
    }
}

/// Trait for tournament storage
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Reserve an id for a new tournament
    async fn next_tournament_id(&self) -> RepositoryResult<TournamentId>;

    /// Load a tournament with all of its records
    async fn load_tournament(&self, id: TournamentId) -> RepositoryResult<Option<Tournament>>;

    /// Atomically replace every stored record of a tournament
    async fn save_tournament(&self, tournament: &Tournament) -> RepositoryResult<()>;

    /// Stored tournaments ordered by id
    async fn list_tournaments(&self) -> RepositoryResult<Vec<TournamentSummary>>;
}

/// In-process repository for tests and simulations
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tournaments: RwLock<HashMap<TournamentId, Tournament>>,
    next_id: AtomicI64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TournamentRepository for InMemoryRepository {
    async fn next_tournament_id(&self) -> RepositoryResult<TournamentId> {
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn load_tournament(&self, id: TournamentId) -> RepositoryResult<Option<Tournament>> {
        Ok(self.tournaments.read().await.get(&id).cloned())
    }

    async fn save_tournament(&self, tournament: &Tournament) -> RepositoryResult<()> {
        let mut stored = tournament.clone();
        stored.drain_notices();
        self.tournaments.write().await.insert(tournament.id, stored);
        Ok(())
    }

    async fn list_tournaments(&self) -> RepositoryResult<Vec<TournamentSummary>> {
        let tournaments = self.tournaments.read().await;
        let mut summaries: Vec<TournamentSummary> =
            tournaments.values().map(TournamentSummary::from).collect();
        summaries.sort_by_key(|s| s.id);
        Ok(summaries)
    }
}

/// Scalar tournament fields stored on the header row
#[derive(Debug, Serialize, Deserialize)]
struct TournamentHeader {
    id: TournamentId,
    uuid: Uuid,
    name: String,
    status: TournamentStatus,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    next_record_id: i64,
    completion_counter: u64,
}

/// PostgreSQL implementation of `TournamentRepository`.
///
/// Records are stored as JSONB payloads, one row per record.
pub struct PgTournamentRepository {
    pool: PgPool,
}

impl PgTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn next_tournament_id(&self) -> RepositoryResult<TournamentId> {
        let row = sqlx::query("SELECT nextval('tournament_id_seq') AS id")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("id"))
    }

    async fn load_tournament(&self, id: TournamentId) -> RepositoryResult<Option<Tournament>> {
        let Some(row) = sqlx::query("SELECT header FROM tournaments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let header: TournamentHeader = serde_json::from_value(row.get("header"))?;

        let mut tournament = Tournament::new(header.id, header.name);
        tournament.uuid = header.uuid;
        tournament.status = header.status;
        tournament.created_at = header.created_at;
        tournament.started_at = header.started_at;
        tournament.ended_at = header.ended_at;
        tournament.next_record_id = header.next_record_id;
        tournament.completion_counter = header.completion_counter;

        let rows = sqlx::query(
            "SELECT payload FROM tournament_teams WHERE tournament_id = $1 ORDER BY team_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            let team: Team = serde_json::from_value(row.get("payload"))?;
            tournament.teams.insert(team.id, team);
        }

        let rows = sqlx::query(
            "SELECT payload FROM tournament_events WHERE tournament_id = $1 ORDER BY event_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            let event: Event = serde_json::from_value(row.get("payload"))?;
            tournament.events.insert(event.id, event);
        }

        let rows = sqlx::query(
            "SELECT payload FROM event_standings WHERE tournament_id = $1 ORDER BY event_id, team_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            let standing: Standing = serde_json::from_value(row.get("payload"))?;
            if let Some(event) = tournament.events.get_mut(&standing.event_id) {
                event.standings.insert(standing.team_id, standing);
            }
        }

        let rows = sqlx::query(
            "SELECT payload FROM tournament_matches WHERE tournament_id = $1 ORDER BY match_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            let m: Match = serde_json::from_value(row.get("payload"))?;
            tournament.matches.insert(m.id, m);
        }

        let rows = sqlx::query(
            "SELECT payload FROM overall_standings WHERE tournament_id = $1 ORDER BY team_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        let overall: BTreeMap<_, _> = rows
            .into_iter()
            .map(|row| {
                serde_json::from_value::<OverallStanding>(row.get("payload")).map(|o| (o.team_id, o))
            })
            .collect::<Result<_, _>>()?;
        tournament.overall = overall;

        Ok(Some(tournament))
    }

    async fn save_tournament(&self, tournament: &Tournament) -> RepositoryResult<()> {
        let header = TournamentHeader {
            id: tournament.id,
            uuid: tournament.uuid,
            name: tournament.name.clone(),
            status: tournament.status,
            created_at: tournament.created_at,
            started_at: tournament.started_at,
            ended_at: tournament.ended_at,
            next_record_id: tournament.next_record_id,
            completion_counter: tournament.completion_counter,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tournaments (id, uuid, name, status, header, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, status = EXCLUDED.status,
                header = EXCLUDED.header, updated_at = NOW()
            "#,
        )
        .bind(tournament.id)
        .bind(tournament.uuid)
        .bind(&tournament.name)
        .bind(tournament.status.to_string())
        .bind(serde_json::to_value(&header)?)
        .execute(&mut *tx)
        .await?;

        for table in [
            "tournament_teams",
            "tournament_events",
            "event_standings",
            "tournament_matches",
            "overall_standings",
        ] {
            sqlx::query(&format!("DELETE FROM {table} WHERE tournament_id = $1"))
                .bind(tournament.id)
                .execute(&mut *tx)
                .await?;
        }

        for team in tournament.teams.values() {
            sqlx::query(
                "INSERT INTO tournament_teams (tournament_id, team_id, payload) VALUES ($1, $2, $3)",
            )
            .bind(tournament.id)
            .bind(team.id)
            .bind(serde_json::to_value(team)?)
            .execute(&mut *tx)
            .await?;
        }

        for event in tournament.events.values() {
            let mut stored = event.clone();
            let standings = std::mem::take(&mut stored.standings);
            sqlx::query(
                "INSERT INTO tournament_events (tournament_id, event_id, uuid, payload) VALUES ($1, $2, $3, $4)",
            )
            .bind(tournament.id)
            .bind(event.id)
            .bind(event.uuid)
            .bind(serde_json::to_value(&stored)?)
            .execute(&mut *tx)
            .await?;

            for standing in standings.values() {
                sqlx::query(
                    r#"
                    INSERT INTO event_standings (tournament_id, event_id, team_id, is_final, payload)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(tournament.id)
                .bind(standing.event_id)
                .bind(standing.team_id)
                .bind(standing.is_final)
                .bind(serde_json::to_value(standing)?)
                .execute(&mut *tx)
                .await?;
            }
        }

        for m in tournament.matches.values() {
            sqlx::query(
                r#"
                INSERT INTO tournament_matches (tournament_id, match_id, event_id, uuid, state, payload)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(tournament.id)
            .bind(m.id)
            .bind(m.event_id)
            .bind(m.uuid)
            .bind(m.state.to_string())
            .bind(serde_json::to_value(m)?)
            .execute(&mut *tx)
            .await?;
        }

        for overall in tournament.overall.values() {
            sqlx::query(
                "INSERT INTO overall_standings (tournament_id, team_id, payload) VALUES ($1, $2, $3)",
            )
            .bind(tournament.id)
            .bind(overall.team_id)
            .bind(serde_json::to_value(overall)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_tournaments(&self) -> RepositoryResult<Vec<TournamentSummary>> {
        let rows = sqlx::query("SELECT header FROM tournaments ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                let header: TournamentHeader = serde_json::from_value(row.get("header"))?;
                Ok(TournamentSummary {
                    id: header.id,
                    uuid: header.uuid,
                    name: header.name,
                    status: header.status,
                })
            })
            .collect()
    }
}
