//! Integration tests for the async tournament manager
//!
//! Covers commit-then-publish behaviour: a failed save must leave the
//! visible tournament untouched and must not emit notices.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use podium::{
    EngineConfig, EngineError, EventConfig, FixedRandomizer, MatchScores, MatchState,
    TournamentError, TournamentManager,
    db::{InMemoryRepository, RepositoryError, RepositoryResult, TournamentRepository, TournamentSummary},
    tournament::{FinalizationNotifier, Notice, Tournament, TournamentId},
};

/// Repository whose saves can be switched off
#[derive(Default)]
struct FlakyRepository {
    inner: InMemoryRepository,
    failing: AtomicBool,
}

#[async_trait]
impl TournamentRepository for FlakyRepository {
    async fn next_tournament_id(&self) -> RepositoryResult<TournamentId> {
        self.inner.next_tournament_id().await
    }

    async fn load_tournament(&self, id: TournamentId) -> RepositoryResult<Option<Tournament>> {
        self.inner.load_tournament(id).await
    }

    async fn save_tournament(&self, tournament: &Tournament) -> RepositoryResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("disk full".to_string()));
        }
        self.inner.save_tournament(tournament).await
    }

    async fn list_tournaments(&self) -> RepositoryResult<Vec<TournamentSummary>> {
        self.inner.list_tournaments().await
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    fn received(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl FinalizationNotifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(*notice);
    }
}

fn manager_with(
    repository: Arc<dyn TournamentRepository>,
) -> (TournamentManager, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let manager = TournamentManager::with_parts(
        repository,
        notifier.clone(),
        Box::new(FixedRandomizer::new(true)),
        EngineConfig::default(),
    );
    (manager, notifier)
}

#[tokio::test]
async fn test_failed_save_leaves_state_and_sends_nothing() {
    let repository = Arc::new(FlakyRepository::default());
    let (manager, notifier) = manager_with(repository.clone());

    let id = manager.create_tournament("Flaky").await.unwrap();
    let team = manager.register_team(id, "Aces").await.unwrap();
    let event = manager
        .add_event(id, EventConfig::team("Trivia", 1))
        .await
        .unwrap();
    manager.start_tournament(id).await.unwrap();
    let matches = manager.start_event(id, event).await.unwrap();
    manager.start_match(id, matches[0]).await.unwrap();

    let before = manager.snapshot(id).await.unwrap();
    repository.failing.store(true, Ordering::SeqCst);

    let err = manager
        .end_match(id, matches[0], MatchScores::Team { score: 20.0 })
        .await
        .unwrap_err();
    assert!(matches!(err, TournamentError::Repository(_)));
    assert_eq!(err.client_message(), "Tournament storage is unavailable");

    let after = manager.snapshot(id).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(after.match_record(matches[0]).unwrap().state, MatchState::Active);
    assert!(!after.team(team).unwrap().is_available);
    assert!(notifier.received().is_empty());

    repository.failing.store(false, Ordering::SeqCst);
    manager
        .end_match(id, matches[0], MatchScores::Team { score: 20.0 })
        .await
        .unwrap();

    assert_eq!(
        notifier.received(),
        vec![Notice::EventFinalized {
            tournament_id: id,
            event_id: event
        }]
    );
    let stored = repository.load_tournament(id).await.unwrap().unwrap();
    assert!(stored.event(event).unwrap().is_complete());
}

#[tokio::test]
async fn test_engine_errors_pass_through() {
    let (manager, notifier) = manager_with(Arc::new(InMemoryRepository::new()));

    let id = manager.create_tournament("Errors").await.unwrap();
    for name in ["Aces", "Bombers"] {
        manager.register_team(id, name).await.unwrap();
    }
    let event = manager.add_head_to_head_event(id, "Cornhole").await.unwrap();
    manager.start_tournament(id).await.unwrap();

    let err = manager.start_event(id, event).await.unwrap_err();
    assert_eq!(
        err.engine_error(),
        Some(&EngineError::InsufficientParticipants {
            needed: 4,
            current: 2
        })
    );

    let missing = manager.snapshot(99).await.unwrap_err();
    assert!(matches!(missing, TournamentError::NotFound(99)));
    assert!(notifier.received().is_empty());
}

#[tokio::test]
async fn test_full_tournament_through_manager() {
    let repository = Arc::new(InMemoryRepository::new());
    let (manager, notifier) = manager_with(repository.clone());

    let id = manager.create_tournament("League Night").await.unwrap();
    for name in ["Aces", "Bombers", "Comets", "Dragons"] {
        manager.register_team(id, name).await.unwrap();
    }
    let cornhole = manager
        .add_event(id, EventConfig::head_to_head("Cornhole", 1))
        .await
        .unwrap();
    manager.start_tournament(id).await.unwrap();

    let matches = manager.start_event(id, cornhole).await.unwrap();
    let snapshot = manager.snapshot(id).await.unwrap();
    let round_robin: Vec<_> = matches
        .iter()
        .copied()
        .filter(|m| !snapshot.match_record(*m).unwrap().is_bracket())
        .collect();

    for match_id in round_robin {
        manager.start_match(id, match_id).await.unwrap();
        let standings = manager
            .end_match(
                id,
                match_id,
                MatchScores::HeadToHead {
                    team_1: 21.0,
                    team_2: 15.0,
                },
            )
            .await
            .unwrap();
        assert_eq!(standings.len(), 4);
    }

    let bracket = manager
        .snapshot(id)
        .await
        .unwrap()
        .event(cornhole)
        .unwrap()
        .bracket
        .unwrap();
    assert!(bracket.is_active);

    let decisive = MatchScores::HeadToHead {
        team_1: 21.0,
        team_2: 19.0,
    };
    for node in [
        bracket.upper_semifinal,
        bracket.lower_semifinal,
        bracket.championship,
    ] {
        manager.start_match(id, node).await.unwrap();
        assert!(!manager.advance_bracket(id, node, decisive).await.unwrap());
    }
    manager.start_match(id, bracket.consolation).await.unwrap();
    assert!(
        manager
            .advance_bracket(id, bracket.consolation, decisive)
            .await
            .unwrap()
    );
    assert!(manager.is_bracket_final(id, cornhole).await.unwrap());

    let standings = manager.event_standings(id, cornhole).await.unwrap();
    assert!(standings.iter().all(|s| s.is_final));
    assert_eq!(standings.iter().filter(|s| s.rank == 1).count(), 1);

    manager.end_tournament(id).await.unwrap();

    let overall = manager.overall_rankings(id).await.unwrap();
    assert_eq!(overall.len(), 4);
    assert_eq!(overall[0].total_points, 8.0);
    assert_eq!(manager.force_full_rankings_update(id).await.unwrap(), overall);

    assert_eq!(
        notifier.received(),
        vec![
            Notice::BracketActivated {
                tournament_id: id,
                event_id: cornhole
            },
            Notice::EventFinalized {
                tournament_id: id,
                event_id: cornhole
            },
            Notice::TournamentFinalized { tournament_id: id },
        ]
    );

    let listed = manager.list_tournaments().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}
